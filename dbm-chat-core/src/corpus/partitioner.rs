use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::{LABEL_FILE_NAME, PartitionConfig};
use crate::corpus::record::{LabeledRecord, read_labeled_records};
use crate::error::{ChatError, Result};
use crate::io::{sibling_dir, write_lines};

/// All the texts sharing one label, in the order they were read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelGroup {
	pub label: String,
	pub lines: Vec<String>,
}

/// A label file that was fully written.
#[derive(Debug, Clone)]
pub struct WrittenLabel {
	pub label: String,
	pub lines: usize,
	pub path: PathBuf,
}

/// A label whose file could not be written.
#[derive(Debug, Clone)]
pub struct FailedLabel {
	pub label: String,
	pub reason: String,
}

/// Outcome of one partitioning run.
#[derive(Debug, Clone)]
pub struct PartitionReport {
	pub labels_dir: PathBuf,
	pub written: Vec<WrittenLabel>,
	pub failed: Vec<FailedLabel>,
}

impl PartitionReport {
	pub fn is_complete(&self) -> bool {
		self.failed.is_empty()
	}
}

/// Splits a labeled transcript CSV into one corpus file per label.
///
/// `chat.csv` with labels `0` and `1` produces:
///
/// ```text
/// labels/0/data.txt
/// labels/1/data.txt
/// ```
///
/// next to the CSV. Label files are replaced wholesale on every run.
/// Labels are compared byte for byte; `"a"` and `"A "` are two labels.
#[derive(Debug, Clone)]
pub struct LabelPartitioner {
	labels_dir_name: String,
	encoding: String,
}

impl LabelPartitioner {
	pub fn new(config: &PartitionConfig) -> Self {
		Self {
			labels_dir_name: config.labels_dir_name.clone(),
			encoding: config.encoding.clone(),
		}
	}

	/// Folder receiving the label sub-folders for `csv`.
	pub fn labels_dir<P: AsRef<Path>>(&self, csv: P) -> PathBuf {
		sibling_dir(csv, &self.labels_dir_name)
	}

	/// Reads `csv` and writes its label corpus.
	///
	/// # Errors
	/// Fails when the CSV cannot be read or parsed, or when the labels folder
	/// cannot be created. Failures on individual labels do not fail the call;
	/// they are logged and listed in the returned report.
	pub fn partition<P: AsRef<Path>>(&self, csv: P) -> Result<PartitionReport> {
		let csv = csv.as_ref();
		let records = read_labeled_records(csv, &self.encoding)?;
		log::info!("Read {} records from {}", records.len(), csv.display());

		let labels_dir = self.labels_dir(csv);
		fs::create_dir_all(&labels_dir).map_err(|e| ChatError::io(&labels_dir, e))?;

		Ok(self.write_groups(group_by_label(&records), labels_dir))
	}

	/// Writes every group below `labels_dir` (which must exist).
	fn write_groups(&self, groups: Vec<LabelGroup>, labels_dir: PathBuf) -> PartitionReport {
		let mut report = PartitionReport {
			labels_dir,
			written: Vec::new(),
			failed: Vec::new(),
		};

		for group in groups {
			match write_group(&report.labels_dir, &group) {
				Ok(path) => {
					log::debug!("Wrote {} lines for label {:?}", group.lines.len(), group.label);
					report.written.push(WrittenLabel {
						label: group.label,
						lines: group.lines.len(),
						path,
					});
				}
				Err(e) => {
					log::error!("Failed to write label {:?}: {e}", group.label);
					report.failed.push(FailedLabel {
						label: group.label,
						reason: e.to_string(),
					});
				}
			}
		}

		report
	}
}

/// Groups record texts by exact label, keeping first-seen order for both
/// the labels and the texts inside each label.
pub fn group_by_label(records: &[LabeledRecord]) -> Vec<LabelGroup> {
	let mut groups: Vec<LabelGroup> = Vec::new();
	let mut positions: HashMap<&str, usize> = HashMap::new();

	for record in records {
		match positions.get(record.label.as_str()) {
			Some(&i) => groups[i].lines.push(single_line(&record.text)),
			None => {
				positions.insert(&record.label, groups.len());
				groups.push(LabelGroup {
					label: record.label.clone(),
					lines: vec![single_line(&record.text)],
				});
			}
		}
	}

	groups
}

/// Joins the lines of a quoted multi-line text with spaces, so every record
/// stays one line of its label file.
fn single_line(text: &str) -> String {
	if text.contains(['\n', '\r']) {
		text.lines().map(str::trim_end).collect::<Vec<_>>().join(" ")
	} else {
		text.to_owned()
	}
}

/// A label is used verbatim as a folder name, so it must be one plain
/// path component.
fn is_safe_label(label: &str) -> bool {
	!label.is_empty() && label != "." && label != ".." && !label.contains(['/', '\\', '\0'])
}

fn write_group(labels_dir: &Path, group: &LabelGroup) -> Result<PathBuf> {
	if !is_safe_label(&group.label) {
		return Err(ChatError::InvalidInput(format!(
			"label {:?} cannot be used as a folder name",
			group.label
		)));
	}

	let folder = labels_dir.join(&group.label);
	fs::create_dir_all(&folder).map_err(|e| ChatError::io(&folder, e))?;

	let path = folder.join(LABEL_FILE_NAME);
	write_lines(&path, &group.lines)?;
	Ok(path)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn record(text: &str, label: &str) -> LabeledRecord {
		LabeledRecord { index: String::new(), text: text.into(), label: label.into() }
	}

	#[test]
	fn grouping_keeps_first_seen_order() {
		let records = vec![record("a", "1"), record("b", "0"), record("c", "1"), record("d", "0")];
		let groups = group_by_label(&records);
		assert_eq!(groups, vec![
			LabelGroup { label: "1".into(), lines: vec!["a".into(), "c".into()] },
			LabelGroup { label: "0".into(), lines: vec!["b".into(), "d".into()] },
		]);
	}

	#[test]
	fn multi_line_texts_become_one_line() {
		let records = vec![record("first\nsecond", "0"), record("a\r\nb", "0")];
		assert_eq!(group_by_label(&records)[0].lines, vec!["first second".to_owned(), "a b".to_owned()]);
	}

	#[test]
	fn labels_are_not_normalized() {
		let records = vec![record("a", "yes"), record("b", "Yes"), record("c", "yes ")];
		assert_eq!(group_by_label(&records).len(), 3);
	}

	#[test]
	fn unsafe_labels_are_detected() {
		assert!(is_safe_label("greeting"));
		assert!(is_safe_label("인사"));
		assert!(!is_safe_label(""));
		assert!(!is_safe_label(".."));
		assert!(!is_safe_label("a/b"));
	}
}
