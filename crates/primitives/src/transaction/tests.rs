use proptest::prelude::*;

use super::*;

fn apply(text: &str, changes: Vec<Change>) -> Result<String, TransactionError> {
	let mut doc = Rope::from(text);
	let tx = Transaction::change(doc.slice(..), changes)?;
	tx.apply(&mut doc);
	Ok(doc.to_string())
}

#[test]
fn test_changeset_apply() {
	let mut doc = Rope::from("hello");
	let mut cs = ChangeSet::default();
	cs.insert("aa".into());
	cs.delete(2);
	cs.retain(3);
	cs.apply(&mut doc);
	assert_eq!(doc.to_string(), "aallo");
	assert_eq!(cs.len(), 5);
	assert_eq!(cs.len_after(), 5);
}

#[test]
fn test_transaction_replace() {
	let out = apply("000001231123Line1", vec![Change::replace(6, 12, "000000")]).unwrap();
	assert_eq!(out, "000001000000Line1");
}

#[test]
fn test_transaction_insert_at_line_start() {
	let out = apply("a\nb", vec![Change::insert(2, "000002261016")]).unwrap();
	assert_eq!(out, "a\n000002261016b");
}

#[test]
fn test_transaction_unsorted_changes() {
	let out = apply("abcdef", vec![Change::replace(4, 5, "E"), Change::delete(0, 1)]).unwrap();
	assert_eq!(out, "bcdEf");
}

#[test]
fn test_transaction_same_point_inserts_keep_order() {
	let out = apply("x", vec![Change::insert(0, "a"), Change::insert(0, "b")]).unwrap();
	assert_eq!(out, "abx");
}

#[test]
fn test_transaction_rejects_overlap() {
	let err = apply("abcdef", vec![Change::delete(0, 3), Change::delete(2, 4)]).unwrap_err();
	assert_eq!(err, TransactionError::Overlapping { at: 2 });
}

#[test]
fn test_transaction_rejects_out_of_bounds() {
	let err = apply("abc", vec![Change::delete(1, 9)]).unwrap_err();
	assert_eq!(err, TransactionError::OutOfBounds { end: 9, len: 3 });
}

#[test]
fn test_transaction_rejects_inverted() {
	let err = apply("abc", vec![Change::delete(2, 1)]).unwrap_err();
	assert_eq!(err, TransactionError::InvertedRange { start: 2, end: 1 });
}

#[test]
fn test_empty_transaction_is_identity() {
	let doc = Rope::from("abc");
	let tx = Transaction::change(doc.slice(..), Vec::new()).unwrap();
	assert!(tx.is_identity());
	assert_eq!(tx.operations(), &[Operation::Retain(3)]);
}

proptest! {
	#[test]
	fn prop_transaction_matches_back_to_front_application(
		text in "[a-z\n]{0,40}",
		raw in proptest::collection::vec((0usize..40, 0usize..4, "[A-Z]{0,3}"), 0..6),
	) {
		let len = text.chars().count();
		let mut changes: Vec<Change> = Vec::new();
		let mut cursor = 0;
		let mut sorted = raw.clone();
		sorted.sort_by_key(|(start, _, _)| *start);
		for (start, width, replacement) in sorted {
			let start = start.max(cursor);
			if start > len {
				break;
			}
			let end = (start + width).min(len);
			changes.push(Change::replace(start, end, replacement));
			cursor = end;
		}

		let mut expected: Vec<char> = text.chars().collect();
		for change in changes.iter().rev() {
			let replacement: Vec<char> = change.replacement.clone().unwrap_or_default().chars().collect();
			expected.splice(change.start..change.end, replacement);
		}
		let expected: String = expected.into_iter().collect();

		prop_assert_eq!(apply(&text, changes).unwrap(), expected);
	}
}
