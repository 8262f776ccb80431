use std::path::Path;

use csv::ReaderBuilder;

use crate::error::{ChatError, Result};
use crate::io::read_encoded;

/// Minimum number of columns in a chat transcript row.
const COLUMNS: usize = 3;

/// One row of a chat transcript CSV: `index, text, label`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRecord {
	pub index: String,
	pub text: String,
	pub label: String,
}

/// Reads every data row of a transcript CSV decoded with `encoding`.
///
/// The first row is a header and is skipped. Extra columns are ignored.
///
/// # Errors
/// - I/O or decoding setup failures
/// - `MalformedRecord` for a row with fewer than three columns
pub fn read_labeled_records<P: AsRef<Path>>(path: P, encoding: &str) -> Result<Vec<LabeledRecord>> {
	let text = read_encoded(path, encoding)?;
	parse_records(&text)
}

/// Parses transcript CSV text (header row included).
pub fn parse_records(text: &str) -> Result<Vec<LabeledRecord>> {
	let mut reader = ReaderBuilder::new()
		.has_headers(true)
		.flexible(true)
		.from_reader(text.as_bytes());

	let mut records = Vec::new();
	for row in reader.records() {
		let row = row?;
		if row.len() < COLUMNS {
			return Err(ChatError::MalformedRecord {
				line: row.position().map(|p| p.line()).unwrap_or_default(),
				expected: COLUMNS,
				found: row.len(),
			});
		}
		records.push(LabeledRecord {
			index: row[0].to_owned(),
			text: row[1].to_owned(),
			label: row[2].to_owned(),
		});
	}
	Ok(records)
}
