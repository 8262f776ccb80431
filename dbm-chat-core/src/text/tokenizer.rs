/// Characters removed from every token by [`CommonPreprocessor`].
const STRIPPED_PUNCTUATION: &[char] = &['.', ':', ',', '"', '\'', '(', ')', '[', ']', '|', '/', '?', '!', ';'];

/// Normalizes a single token.
pub trait TokenPreProcess {
	fn pre_process(&self, token: &str) -> String;
}

/// Strips digits and common punctuation, then lowercases.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommonPreprocessor;

impl TokenPreProcess for CommonPreprocessor {
	fn pre_process(&self, token: &str) -> String {
		token
			.chars()
			.filter(|c| !c.is_ascii_digit() && !STRIPPED_PUNCTUATION.contains(c))
			.flat_map(char::to_lowercase)
			.collect()
	}
}

/// Whitespace tokenizer with an optional token pre-processor.
///
/// Tokens that become empty after pre-processing are dropped.
#[derive(Debug, Clone, Default)]
pub struct DefaultTokenizer<P = CommonPreprocessor> {
	pre_processor: Option<P>,
}

impl DefaultTokenizer<CommonPreprocessor> {
	/// Tokenizer using the [`CommonPreprocessor`].
	pub fn common() -> Self {
		Self { pre_processor: Some(CommonPreprocessor) }
	}
}

impl<P: TokenPreProcess> DefaultTokenizer<P> {
	pub fn with_pre_processor(pre_processor: P) -> Self {
		Self { pre_processor: Some(pre_processor) }
	}

	pub fn tokenize(&self, sentence: &str) -> Vec<String> {
		sentence
			.split_whitespace()
			.map(|token| match &self.pre_processor {
				Some(p) => p.pre_process(token),
				None => token.to_owned(),
			})
			.filter(|token| !token.is_empty())
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_punctuation_and_digits_then_lowercases() {
		let tokenizer = DefaultTokenizer::common();
		assert_eq!(
			tokenizer.tokenize("Hello, World! It's 2024 (really)"),
			vec!["hello", "world", "its", "really"]
		);
	}

	#[test]
	fn tokens_emptied_by_preprocessing_are_dropped() {
		let tokenizer = DefaultTokenizer::common();
		assert_eq!(tokenizer.tokenize("... 123 ?! ok"), vec!["ok"]);
	}

	#[test]
	fn hangul_passes_through() {
		let tokenizer = DefaultTokenizer::common();
		assert_eq!(tokenizer.tokenize("안녕하세요, 반가워요!"), vec!["안녕하세요", "반가워요"]);
	}

	#[test]
	fn raw_tokenizer_keeps_tokens_verbatim() {
		let tokenizer: DefaultTokenizer<CommonPreprocessor> = DefaultTokenizer::default();
		assert_eq!(tokenizer.tokenize("A, b"), vec!["A,", "b"]);
	}

	struct Uppercase;

	impl TokenPreProcess for Uppercase {
		fn pre_process(&self, token: &str) -> String {
			token.to_uppercase()
		}
	}

	#[test]
	fn custom_pre_processor_is_applied() {
		let tokenizer = DefaultTokenizer::with_pre_processor(Uppercase);
		assert_eq!(tokenizer.tokenize("good  morning"), vec!["GOOD", "MORNING"]);
	}
}
