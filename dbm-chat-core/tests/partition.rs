use std::fs;
use std::path::Path;

use dbm_chat_core::config::PartitionConfig;
use dbm_chat_core::corpus::label_iterator::LabelAwareSentenceIterator;
use dbm_chat_core::corpus::partitioner::LabelPartitioner;
use dbm_chat_core::io::{list_dirs, read_file};

fn utf8_partitioner() -> LabelPartitioner {
	LabelPartitioner::new(&PartitionConfig {
		encoding: "utf-8".to_owned(),
		..PartitionConfig::default()
	})
}

fn label_file(dir: &Path, label: &str) -> Vec<String> {
	read_file(dir.join("labels").join(label).join("data.txt")).unwrap()
}

#[test]
fn one_file_per_label_in_row_order() {
	let dir = tempfile::tempdir().unwrap();
	let csv = dir.path().join("chat.csv");
	fs::write(&csv, "id,text,label\n1,hi,0\n2,bye,1\n3,yo,0\n4,hey,2\n").unwrap();

	let report = utf8_partitioner().partition(&csv).unwrap();
	assert!(report.is_complete());
	assert_eq!(report.written.len(), 3);
	assert_eq!(list_dirs(dir.path().join("labels")).unwrap(), ["0", "1", "2"]);
	assert_eq!(label_file(dir.path(), "0"), ["hi", "yo"]);
	assert_eq!(label_file(dir.path(), "1"), ["bye"]);
	assert_eq!(label_file(dir.path(), "2"), ["hey"]);
}

#[test]
fn rerun_replaces_instead_of_appending() {
	let dir = tempfile::tempdir().unwrap();
	let csv = dir.path().join("chat.csv");
	fs::write(&csv, "id,text,label\n1,hi,0\n2,bye,1\n").unwrap();

	let partitioner = utf8_partitioner();
	partitioner.partition(&csv).unwrap();
	partitioner.partition(&csv).unwrap();

	assert_eq!(label_file(dir.path(), "0"), ["hi"]);
	assert_eq!(label_file(dir.path(), "1"), ["bye"]);
}

#[test]
fn euc_kr_transcripts_are_decoded() {
	let dir = tempfile::tempdir().unwrap();
	let csv = dir.path().join("chat.csv");
	let (bytes, _, _) = encoding_rs::EUC_KR.encode("id,text,label\n1,안녕하세요,0\n2,잘 가,1\n");
	fs::write(&csv, &bytes).unwrap();

	let report = LabelPartitioner::new(&PartitionConfig::default()).partition(&csv).unwrap();
	assert!(report.is_complete());
	assert_eq!(label_file(dir.path(), "0"), ["안녕하세요"]);
	assert_eq!(label_file(dir.path(), "1"), ["잘 가"]);
}

#[test]
fn unsafe_labels_are_reported_not_written() {
	let dir = tempfile::tempdir().unwrap();
	let csv = dir.path().join("chat.csv");
	fs::write(&csv, "id,text,label\n1,hi,0\n2,escape,../x\n").unwrap();

	let report = utf8_partitioner().partition(&csv).unwrap();
	assert!(!report.is_complete());
	assert_eq!(report.failed.len(), 1);
	assert_eq!(report.failed[0].label, "../x");
	assert_eq!(label_file(dir.path(), "0"), ["hi"]);
}

#[test]
fn partitioned_corpus_is_walked_back_by_label() {
	let dir = tempfile::tempdir().unwrap();
	let csv = dir.path().join("chat.csv");
	fs::write(&csv, "id,text,label\n1,b text,b\n2,a text,a\n").unwrap();

	let report = utf8_partitioner().partition(&csv).unwrap();
	let sentences = LabelAwareSentenceIterator::from_dir(&report.labels_dir).unwrap();
	assert_eq!(sentences.labels(), ["a", "b"]);
	let texts: Vec<String> = sentences.map(|s| format!("{}:{}", s.label, s.text)).collect();
	assert_eq!(texts, ["a:a text", "b:b text"]);
}

#[test]
fn quoted_multi_line_text_stays_one_sentence() {
	let dir = tempfile::tempdir().unwrap();
	let csv = dir.path().join("chat.csv");
	fs::write(&csv, "id,text,label\n1,\"see\nyou\",0\n2,bye,0\n").unwrap();

	utf8_partitioner().partition(&csv).unwrap();
	assert_eq!(label_file(dir.path(), "0"), ["see you", "bye"]);
}
