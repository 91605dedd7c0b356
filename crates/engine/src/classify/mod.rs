//! Change classification.
//!
//! Turns the changes of one notification batch into pending corrections,
//! evaluated against the post-change text. For a change replacing lines
//! `s..=e` with text containing `k` line breaks, the first
//! `min(e - s, k) + 1` post-change lines starting at `s` are *touched*
//! and the remaining `k - min(e - s, k)` are *created*:
//!
//! | line    | prefixed      | unprefixed     | blank          |
//! |---------|---------------|----------------|----------------|
//! | touched | `RefreshDate` | `InsertPrefix` | -              |
//! | created | -             | `InsertPrefix` | `InsertPrefix` |
//!
//! A created line that already carries a prefix came from pasted content and
//! is left alone.

use std::collections::BTreeMap;

use seqline_primitives::{RopeSlice, line_text};
use seqline_primitives::rope::line_break_count;

use crate::codec::{has_prefix, is_blank};
use crate::host::TextChange;

#[cfg(test)]
mod tests;

/// What a queued correction does to its line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CorrectionKind {
	/// Rewrite the date field of an existing prefix.
	RefreshDate,
	/// Insert a new prefix at column 0.
	InsertPrefix,
}

/// A correction queued for one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingCorrection {
	/// Zero-based line in the coordinates of the latest known document state.
	pub line: usize,
	/// Correction to perform.
	pub kind: CorrectionKind,
	/// Sequence to write instead of the line's position.
	pub sequence_override: Option<u32>,
}

impl PendingCorrection {
	/// Creates a correction without a sequence override.
	pub const fn new(line: usize, kind: CorrectionKind) -> Self {
		Self {
			line,
			kind,
			sequence_override: None,
		}
	}
}

/// Line-count change caused by one text change.
///
/// `start` and `end` are the first and last replaced lines in the
/// coordinates left by the preceding shifts of the same batch, so a batch's
/// shifts are applied in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineShift {
	/// First replaced line.
	pub start: usize,
	/// Last replaced line.
	pub end: usize,
	/// Line breaks in the inserted text.
	pub inserted_breaks: usize,
	/// Nothing was replaced and the text went in at column 0, so the whole
	/// former start line now sits below the inserted text.
	pub carries_start: bool,
}

impl LineShift {
	/// Returns true if the change neither adds nor removes lines.
	pub fn is_neutral(&self) -> bool {
		self.end - self.start == self.inserted_breaks
	}
}

/// Maps a line index across a shift.
///
/// Returns `None` when the line was removed by the change.
pub fn remap_line(line: usize, shift: &LineShift) -> Option<usize> {
	if line < shift.start || (line == shift.start && !shift.carries_start) {
		return Some(line);
	}
	if line > shift.end || shift.carries_start {
		return Some(line - (shift.end - shift.start) + shift.inserted_breaks);
	}
	(line - shift.start <= shift.inserted_breaks).then_some(line)
}

/// Result of classifying one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
	/// Line shifts, in application order.
	pub shifts: Vec<LineShift>,
	/// Corrections in ascending line order, at most one per line.
	pub corrections: Vec<PendingCorrection>,
}

/// Returns true if `change` is a plain Enter at the end of a line.
///
/// Holds when nothing was replaced, the inserted text is a single line break
/// followed by optional indentation, and the created line holds exactly that
/// indentation. Enter pressed mid-line fails the last check because the
/// created line carries the text that followed the cursor. An autocomplete
/// or paste that happens to insert `"\n    "` at the end of a line is
/// indistinguishable and is treated the same way.
pub fn is_bare_line_break(change: &TextChange, text: RopeSlice, post_line: usize) -> bool {
	if change.replaced_len != 0 || !change.range.is_empty() {
		return false;
	}
	let Some(indent) = change
		.inserted_text
		.strip_prefix("\r\n")
		.or_else(|| change.inserted_text.strip_prefix('\n'))
	else {
		return false;
	};
	if !indent.chars().all(|c| c == ' ' || c == '\t') {
		return false;
	}
	line_text(text, post_line + 1).is_some_and(|created| created == indent)
}

/// Returns true if `change` removes whole lines and nothing else.
///
/// The range runs from column 0 of one line to column 0 of a later line, so
/// the line that ends up at the start position is an untouched former
/// successor.
pub fn is_whole_line_deletion(change: &TextChange) -> bool {
	let range = change.range;
	change.inserted_text.is_empty()
		&& range.start.character == 0
		&& range.end.character == 0
		&& range.end.line > range.start.line
}

/// Classifies a batch of changes against the post-change text.
///
/// Changes are in pre-change coordinates and must not overlap; they may be
/// given in any order.
pub fn classify(text: RopeSlice, changes: &[TextChange]) -> Classification {
	let mut ordered: Vec<&TextChange> = changes.iter().collect();
	ordered.sort_by_key(|change| change.range.start);

	let mut shifts = Vec::with_capacity(ordered.len());
	let mut queued: BTreeMap<usize, CorrectionKind> = BTreeMap::new();
	let mut added: usize = 0;
	let mut removed: usize = 0;

	for change in ordered {
		let start = change.range.start.line;
		let end = change.range.end.line.max(start);
		let breaks = line_break_count(&change.inserted_text);

		// Earlier changes in the batch moved this one by `added - removed`.
		let Some(post_start) = (start + added).checked_sub(removed) else {
			continue;
		};
		let post_end = post_start + (end - start);
		shifts.push(LineShift {
			start: post_start,
			end: post_end,
			inserted_breaks: breaks,
			carries_start: change.range.is_empty() && change.range.start.character == 0,
		});

		let kept = (end - start).min(breaks);
		let skip_touched =
			is_whole_line_deletion(change) || (breaks == 1 && is_bare_line_break(change, text, post_start));
		if !skip_touched {
			for line in post_start..=post_start + kept {
				if let Some(kind) = touched(text, line) {
					queued.insert(line, kind);
				}
			}
		}
		for line in post_start + kept + 1..=post_start + breaks {
			if let Some(kind) = created(text, line) {
				queued.insert(line, kind);
			}
		}

		added += breaks;
		removed += end - start;
	}

	Classification {
		shifts,
		corrections: queued
			.into_iter()
			.map(|(line, kind)| PendingCorrection::new(line, kind))
			.collect(),
	}
}

fn touched(text: RopeSlice, line: usize) -> Option<CorrectionKind> {
	let content = line_text(text, line)?;
	if has_prefix(&content) {
		Some(CorrectionKind::RefreshDate)
	} else if is_blank(&content) {
		None
	} else {
		Some(CorrectionKind::InsertPrefix)
	}
}

fn created(text: RopeSlice, line: usize) -> Option<CorrectionKind> {
	let content = line_text(text, line)?;
	(!has_prefix(&content)).then_some(CorrectionKind::InsertPrefix)
}
