use seqline_primitives::{LinePos, LineRange, Rope};

use super::CorrectionKind::{InsertPrefix, RefreshDate};
use super::*;

fn change(start: (usize, usize), end: (usize, usize), text: &str, replaced_len: usize) -> TextChange {
	TextChange {
		range: LineRange::new(LinePos::new(start.0, start.1), LinePos::new(end.0, end.1)),
		inserted_text: text.to_string(),
		replaced_len,
	}
}

fn insert(line: usize, character: usize, text: &str) -> TextChange {
	change((line, character), (line, character), text, 0)
}

fn run(post: &str, changes: &[TextChange]) -> Vec<(usize, CorrectionKind)> {
	let doc = Rope::from(post);
	classify(doc.slice(..), changes)
		.corrections
		.into_iter()
		.map(|c| (c.line, c.kind))
		.collect()
}

#[test]
fn test_enter_at_end_of_prefixed_line() {
	let post = "000001231123abc\n";
	let changes = [insert(0, 15, "\n")];
	assert_eq!(run(post, &changes), vec![(1, InsertPrefix)]);
}

#[test]
fn test_enter_with_indentation_and_crlf() {
	let post = "000001231123abc\r\n  ";
	let changes = [insert(0, 15, "\r\n  ")];
	let doc = Rope::from(post);
	assert!(is_bare_line_break(&changes[0], doc.slice(..), 0));
	assert_eq!(run(post, &changes), vec![(1, InsertPrefix)]);
}

#[test]
fn test_enter_mid_line_refreshes_split_line() {
	let post = "000001231123abc\ndef";
	let changes = [insert(0, 15, "\n")];
	let doc = Rope::from(post);
	assert!(!is_bare_line_break(&changes[0], doc.slice(..), 0));
	assert_eq!(run(post, &changes), vec![(0, RefreshDate), (1, InsertPrefix)]);
}

#[test]
fn test_typing_in_prefixed_line_refreshes_date() {
	let changes = [insert(0, 15, "x")];
	assert_eq!(run("000001231123abcx", &changes), vec![(0, RefreshDate)]);
}

#[test]
fn test_typing_in_plain_line_inserts_prefix() {
	let changes = [insert(1, 3, "x")];
	assert_eq!(run("000001231123a\nabcx", &changes), vec![(1, InsertPrefix)]);
}

#[test]
fn test_blank_touched_line_is_ignored() {
	let changes = [insert(0, 0, " ")];
	assert!(run(" ", &changes).is_empty());
}

#[test]
fn test_paste_of_prefixed_lines_is_not_reprefixed() {
	let post = "000001231123a\n000002231124b\n000003231125c";
	let changes = [insert(0, 13, "\n000002231124b\n000003231125c")];
	assert_eq!(run(post, &changes), vec![(0, RefreshDate)]);
}

#[test]
fn test_paste_of_plain_lines_prefixes_each() {
	let post = "000001231123a\nfoo\n\nbar";
	let changes = [insert(0, 13, "\nfoo\n\nbar")];
	assert_eq!(
		run(post, &changes),
		vec![(0, RefreshDate), (1, InsertPrefix), (2, InsertPrefix), (3, InsertPrefix)]
	);
}

#[test]
fn test_enter_at_line_start_moves_prefixed_line() {
	let post = "\n000001231123abc";
	let changes = [insert(0, 0, "\n")];
	assert!(run(post, &changes).is_empty());
}

#[test]
fn test_joining_lines_refreshes_merged_line() {
	// "000001231123ab\n000002231124cd" with the line break removed.
	let post = "000001231123ab000002231124cd";
	let changes = [change((0, 14), (1, 0), "", 1)];
	assert_eq!(run(post, &changes), vec![(0, RefreshDate)]);
}

#[test]
fn test_whole_line_deletion_touches_nothing() {
	let post = "000001231123a\n000003231125c";
	let changes = [change((1, 0), (2, 0), "", 14)];
	assert!(is_whole_line_deletion(&changes[0]));
	let doc = Rope::from(post);
	let classification = classify(doc.slice(..), &changes);
	assert!(classification.corrections.is_empty());
	assert_eq!(
		classification.shifts,
		vec![LineShift {
			start: 1,
			end: 2,
			inserted_breaks: 0,
			carries_start: false,
		}]
	);
}

#[test]
fn test_multiple_changes_use_shifted_coordinates() {
	let post = "new\n000001231123a\n000002231124by";
	let changes = [insert(1, 13, "y"), insert(0, 0, "new\n")];
	let doc = Rope::from(post);
	let classification = classify(doc.slice(..), &changes);
	assert_eq!(
		classification
			.corrections
			.iter()
			.map(|c| (c.line, c.kind))
			.collect::<Vec<_>>(),
		vec![(0, InsertPrefix), (2, RefreshDate)]
	);
	assert_eq!(
		classification.shifts,
		vec![
			LineShift {
				start: 0,
				end: 0,
				inserted_breaks: 1,
				carries_start: true,
			},
			LineShift {
				start: 2,
				end: 2,
				inserted_breaks: 0,
				carries_start: false,
			},
		]
	);
}

#[test]
fn test_lines_missing_from_post_text_are_skipped() {
	let changes = [insert(5, 0, "x")];
	assert!(run("short", &changes).is_empty());
}

#[test]
fn test_classifier_never_sets_sequence_override() {
	let doc = Rope::from("abc\ndef");
	let classification = classify(doc.slice(..), &[insert(0, 3, "\ndef")]);
	assert!(classification.corrections.iter().all(|c| c.sequence_override.is_none()));
}

#[test]
fn test_remap_line_insertion() {
	let shift = LineShift {
		start: 3,
		end: 3,
		inserted_breaks: 2,
		carries_start: false,
	};
	assert_eq!(remap_line(1, &shift), Some(1));
	assert_eq!(remap_line(3, &shift), Some(3));
	assert_eq!(remap_line(4, &shift), Some(6));
	assert!(!shift.is_neutral());
}

#[test]
fn test_remap_line_insertion_at_column_zero() {
	let doc = Rope::from("zzz\n000001231123ax\n000002231123b");
	let classification = classify(doc.slice(..), &[insert(0, 0, "zzz\n")]);
	let shift = classification.shifts[0];
	assert!(shift.carries_start);
	// The former line 0 moved below the inserted line.
	assert_eq!(remap_line(0, &shift), Some(1));
	assert_eq!(remap_line(1, &shift), Some(2));

	let mid_line = classify(doc.slice(..), &[insert(0, 2, "z\n")]).shifts[0];
	assert!(!mid_line.carries_start);
	assert_eq!(remap_line(0, &mid_line), Some(0));
}

#[test]
fn test_remap_line_deletion() {
	let shift = LineShift {
		start: 2,
		end: 5,
		inserted_breaks: 1,
		carries_start: false,
	};
	assert_eq!(remap_line(2, &shift), Some(2));
	assert_eq!(remap_line(3, &shift), Some(3));
	assert_eq!(remap_line(4, &shift), None);
	assert_eq!(remap_line(5, &shift), None);
	assert_eq!(remap_line(6, &shift), Some(4));
}

#[test]
fn test_neutral_shift() {
	let shift = LineShift {
		start: 4,
		end: 4,
		inserted_breaks: 0,
		carries_start: false,
	};
	assert!(shift.is_neutral());
	assert_eq!(remap_line(9, &shift), Some(9));
}
