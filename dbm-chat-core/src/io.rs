use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;

use crate::error::{ChatError, Result};

/// Reads a UTF-8 text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> Result<Vec<String>> {
	let path = filename.as_ref();
	let mut contents = String::new();
	File::open(path)
		.and_then(|mut file| file.read_to_string(&mut contents))
		.map_err(|e| ChatError::io(path, e))?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Looks up an encoding from its WHATWG label (`"utf-8"`, `"euc-kr"`, ...).
pub fn resolve_encoding(label: &str) -> Result<&'static Encoding> {
	Encoding::for_label(label.trim().as_bytes())
		.ok_or_else(|| ChatError::UnknownEncoding(label.to_owned()))
}

/// Reads a whole file and decodes it with the encoding named by `label`.
///
/// Malformed byte sequences are replaced by U+FFFD; a warning is logged
/// when that happens so a wrong encoding choice does not go unnoticed.
pub fn read_encoded<P: AsRef<Path>>(filename: P, label: &str) -> Result<String> {
	let path = filename.as_ref();
	let encoding = resolve_encoding(label)?;
	let bytes = fs::read(path).map_err(|e| ChatError::io(path, e))?;

	let (text, _, had_errors) = encoding.decode(&bytes);
	if had_errors {
		log::warn!(
			"{} contains byte sequences that are invalid in {}; they were replaced",
			path.display(),
			encoding.name()
		);
	}
	Ok(text.into_owned())
}

/// Writes `lines` to `path`, one per line, replacing any previous contents.
pub fn write_lines<P, S>(path: P, lines: &[S]) -> Result<()>
where
	P: AsRef<Path>,
	S: AsRef<str>,
{
	let path = path.as_ref();
	let file = File::create(path).map_err(|e| ChatError::io(path, e))?;
	let mut writer = BufWriter::new(file);
	for line in lines {
		writer
			.write_all(line.as_ref().as_bytes())
			.and_then(|_| writer.write_all(b"\n"))
			.map_err(|e| ChatError::io(path, e))?;
	}
	writer.flush().map_err(|e| ChatError::io(path, e))
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/input.txt` + `"bin"` → `data/input.bin`
pub fn build_output_path<P: AsRef<Path>>(input_path: P, output_extension: &str) -> Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path.file_stem().ok_or_else(|| {
		ChatError::InvalidInput(format!("{} has no filename", input_path.display()))
	})?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

/// Returns the directory `name` located next to `input_path`.
///
/// Example:
/// `data/chat.csv` + `"labels"` → `data/labels`
pub fn sibling_dir<P: AsRef<Path>>(input_path: P, name: &str) -> PathBuf {
	let parent = input_path
		.as_ref()
		.parent()
		.filter(|p| !p.as_os_str().is_empty())
		.unwrap_or_else(|| Path::new("."));
	parent.join(name)
}

/// Extracts the base filename without extension.
///
/// Examples:
/// - `"./data/model.txt"` → `"model"`
/// - `"model.txt"` → `"model"`
pub fn get_filename<P: AsRef<Path>>(input_path: P) -> Result<String> {
	let path = input_path.as_ref();
	let stem = path
		.file_stem()
		.ok_or_else(|| ChatError::InvalidInput(format!("{} has no filename", path.display())))?;

	Ok(stem.to_string_lossy().to_string())
}

/// Lists all files with a given extension in a directory.
///
/// Returns file names only (no paths), sorted.
pub fn list_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<String>> {
	let dir = dir.as_ref();
	let mut files = Vec::new();

	for entry in fs::read_dir(dir).map_err(|e| ChatError::io(dir, e))? {
		let path = entry.map_err(|e| ChatError::io(dir, e))?.path();

		if path.is_file() && path.extension() == Some(std::ffi::OsStr::new(extension)) {
			if let Some(name) = path.file_name() {
				files.push(name.to_string_lossy().to_string());
			}
		}
	}

	files.sort();
	Ok(files)
}

/// Lists the sub-directories of `dir`, sorted by name.
pub fn list_dirs<P: AsRef<Path>>(dir: P) -> Result<Vec<String>> {
	let dir = dir.as_ref();
	let mut dirs = Vec::new();

	for entry in fs::read_dir(dir).map_err(|e| ChatError::io(dir, e))? {
		let path = entry.map_err(|e| ChatError::io(dir, e))?.path();
		if path.is_dir() {
			if let Some(name) = path.file_name() {
				dirs.push(name.to_string_lossy().to_string());
			}
		}
	}

	dirs.sort();
	Ok(dirs)
}
