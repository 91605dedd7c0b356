//! Edit planning.
//!
//! Pending corrections are re-validated against a fresh snapshot right before
//! a commit: a line may have been deleted, shortened, or already corrected
//! since it was classified. Only corrections that still change something
//! become edits. Every edit of a plan targets the pre-edit text, so the
//! whole plan is applied as one transaction.

use chrono::NaiveDate;
use seqline_primitives::{Change, LinePos, LineRange, RopeSlice, Transaction, line_text, pos_to_char};

use crate::classify::{CorrectionKind, PendingCorrection};
use crate::codec::{self, DATE_FIELD, ZERO_DATE};
use crate::config::NewLineDate;
use crate::error::HostError;
use crate::host::TextEdit;

/// Edits produced for one commit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditPlan {
	/// Edits in descending line order.
	pub edits: Vec<TextEdit>,
	/// Corrections that re-validated to a no-op.
	pub skipped: usize,
}

impl EditPlan {
	/// Returns true if the plan changes nothing.
	pub fn is_empty(&self) -> bool {
		self.edits.is_empty()
	}
}

/// Re-validates corrections against `text` and builds the edits.
///
/// `RefreshDate` rewrites columns 6..12 of a still-prefixed line whose date
/// differs from `today`. `InsertPrefix` inserts a prefix at column 0 of a
/// line that still lacks one, using the line's position (or the correction's
/// override) as sequence and `policy` for the date.
pub fn plan_edits(
	text: RopeSlice,
	corrections: &[PendingCorrection],
	today: NaiveDate,
	policy: NewLineDate,
) -> EditPlan {
	let mut ordered = corrections.to_vec();
	ordered.sort_by(|a, b| b.line.cmp(&a.line));
	ordered.dedup_by_key(|c| c.line);

	let today_field = codec::format_date(today);
	let mut plan = EditPlan::default();

	for correction in ordered {
		let Some(content) = line_text(text, correction.line) else {
			plan.skipped += 1;
			continue;
		};
		let edit = match correction.kind {
			CorrectionKind::RefreshDate => match codec::date_field(&content) {
				Some(field) if field != today_field => Some(TextEdit::new(
					LineRange::on_line(correction.line, DATE_FIELD.start, DATE_FIELD.end),
					today_field.clone(),
				)),
				_ => None,
			},
			CorrectionKind::InsertPrefix if codec::has_prefix(&content) => None,
			CorrectionKind::InsertPrefix => {
				let sequence = correction
					.sequence_override
					.unwrap_or_else(|| codec::sequence_for(correction.line));
				let mut prefix = codec::format_sequence_value(sequence);
				match policy {
					NewLineDate::Today => prefix.push_str(&today_field),
					NewLineDate::Zero => prefix.push_str(ZERO_DATE),
				}
				Some(TextEdit::new(LineRange::on_line(correction.line, 0, 0), prefix))
			}
		};
		match edit {
			Some(edit) => plan.edits.push(edit),
			None => plan.skipped += 1,
		}
	}
	plan
}

/// Converts edits in line/character coordinates into a transaction.
///
/// # Errors
///
/// Returns [`HostError::InvalidRange`] when an edit addresses text that does
/// not exist, and [`HostError::Transaction`] when edits overlap.
pub fn to_transaction(text: RopeSlice, edits: &[TextEdit]) -> Result<Transaction, HostError> {
	let mut changes = Vec::with_capacity(edits.len());
	for edit in edits {
		let start = resolve(text, edit.range.start)?;
		let end = resolve(text, edit.range.end)?;
		changes.push(Change::replace(start, end, edit.new_text.clone()));
	}
	Ok(Transaction::change(text, changes)?)
}

fn resolve(text: RopeSlice, pos: LinePos) -> Result<usize, HostError> {
	pos_to_char(text, pos).ok_or(HostError::InvalidRange {
		line: pos.line,
		character: pos.character,
	})
}

#[cfg(test)]
mod tests {
	use seqline_primitives::Rope;

	use super::*;

	fn today() -> NaiveDate {
		NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
	}

	fn commit(text: &str, corrections: &[PendingCorrection], policy: NewLineDate) -> (String, EditPlan) {
		let mut doc = Rope::from(text);
		let plan = plan_edits(doc.slice(..), corrections, today(), policy);
		let tx = to_transaction(doc.slice(..), &plan.edits).unwrap();
		tx.apply(&mut doc);
		(doc.to_string(), plan)
	}

	fn refresh(line: usize) -> PendingCorrection {
		PendingCorrection::new(line, CorrectionKind::RefreshDate)
	}

	fn insert(line: usize) -> PendingCorrection {
		PendingCorrection::new(line, CorrectionKind::InsertPrefix)
	}

	#[test]
	fn test_refresh_date_rewrites_only_date_field() {
		let (out, plan) = commit("000007231123abc", &[refresh(0)], NewLineDate::Today);
		assert_eq!(out, "000007261016abc");
		assert_eq!(plan.edits[0].range, LineRange::on_line(0, 6, 12));
	}

	#[test]
	fn test_insert_prefix_uses_position() {
		let (out, _) = commit("000001231123a\n\nplain", &[insert(1), insert(2)], NewLineDate::Today);
		assert_eq!(out, "000001231123a\n000002261016\n000003261016plain");
	}

	#[test]
	fn test_zero_date_policy() {
		let (out, _) = commit("a\nb", &[insert(1)], NewLineDate::Zero);
		assert_eq!(out, "a\n000002000000b");
	}

	#[test]
	fn test_sequence_override() {
		let correction = PendingCorrection {
			sequence_override: Some(42),
			..insert(0)
		};
		let (out, _) = commit("x", &[correction], NewLineDate::Today);
		assert_eq!(out, "000042261016x");
	}

	#[test]
	fn test_stale_corrections_are_skipped() {
		let text = "000001261016fresh\nshort\n000003231123old";
		let corrections = [refresh(0), refresh(1), insert(2), refresh(9)];
		let (out, plan) = commit(text, &corrections, NewLineDate::Today);
		assert_eq!(out, text);
		assert!(plan.is_empty());
		assert_eq!(plan.skipped, 4);
	}

	#[test]
	fn test_edits_are_descending() {
		let doc = Rope::from("000001231123a\nb\n000003231123c");
		let plan = plan_edits(doc.slice(..), &[refresh(0), insert(1), refresh(2)], today(), NewLineDate::Today);
		let lines: Vec<_> = plan.edits.iter().map(|e| e.range.start.line).collect();
		assert_eq!(lines, vec![2, 1, 0]);
	}

	#[test]
	fn test_second_pass_is_a_no_op() {
		let corrections = [refresh(0), insert(1)];
		let (once, _) = commit("000001231123a\nb", &corrections, NewLineDate::Today);
		let (twice, plan) = commit(&once, &corrections, NewLineDate::Today);
		assert_eq!(once, twice);
		assert!(plan.is_empty());
	}

	#[test]
	fn test_to_transaction_spans_line_break() {
		let doc = Rope::from("ab\ncd");
		let edit = TextEdit::new(LineRange::new(LinePos::new(0, 2), LinePos::new(1, 0)), "");
		let mut out = doc.clone();
		to_transaction(doc.slice(..), &[edit]).unwrap().apply(&mut out);
		assert_eq!(out.to_string(), "abcd");
	}

	#[test]
	fn test_to_transaction_rejects_missing_line() {
		let doc = Rope::from("ab");
		let edit = TextEdit::new(LineRange::on_line(3, 0, 0), "x");
		assert!(matches!(
			to_transaction(doc.slice(..), &[edit]),
			Err(HostError::InvalidRange { line: 3, character: 0 })
		));
	}
}
