//! User commands over selections.
//!
//! Each command is planned against a snapshot: the planners here are pure
//! and return clipboard text or edits, which [`crate::SyncEngine::execute`]
//! submits to the host in one transaction.

use std::collections::BTreeSet;
use std::fmt;

use chrono::NaiveDate;
use seqline_primitives::rope::line_len;
use seqline_primitives::{LinePos, LineRange, RopeSlice, Selection, line_count, line_text};

use crate::codec::{self, DATE_FIELD, PREFIX_LEN, ZERO_DATE};
use crate::host::TextEdit;


/// A user-invokable command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
	/// Copy the selection to the clipboard without prefixes.
	CopyWithoutPrefix,
	/// Delete every line touched by the selection.
	DeleteSelectedLines,
	/// Insert a zero-dated prefix on selected lines lacking one.
	ForceInsertPrefix,
	/// Zero the date field of selected prefixed lines.
	SetDateToZero,
	/// Renumber every prefixed line and repair invalid dates.
	Resync,
}

impl Command {
	/// Returns the command identifier.
	pub fn name(self) -> &'static str {
		match self {
			Self::CopyWithoutPrefix => "copy-without-prefix",
			Self::DeleteSelectedLines => "delete-selected-lines",
			Self::ForceInsertPrefix => "force-insert-prefix",
			Self::SetDateToZero => "set-date-to-zero",
			Self::Resync => "resync",
		}
	}

	/// Returns the title shown in action menus.
	pub fn title(self) -> &'static str {
		match self {
			Self::CopyWithoutPrefix => "Copy Selected Lines",
			Self::DeleteSelectedLines => "Delete Selected Lines",
			Self::ForceInsertPrefix => "Insert Number Prefix",
			Self::SetDateToZero => "Set Date to Zero",
			Self::Resync => "Resynchronize Prefixes",
		}
	}
}

impl fmt::Display for Command {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}

/// Completion message of a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
	/// Message shown to the user.
	pub message: String,
}

impl CommandOutcome {
	pub(crate) fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// Edits planned by a line command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineEdits {
	/// Edits in descending line order.
	pub edits: Vec<TextEdit>,
	/// Lines the command affected.
	pub lines: usize,
	/// Affected lines that carried a prefix.
	pub prefixed: usize,
}

/// Message reported after copying.
pub const COPY_MESSAGE: &str = "Copied text (excluding prefix numbers)";

fn plural(count: usize) -> &'static str {
	if count == 1 { "" } else { "s" }
}

/// Builds the completion message of a command.
pub fn outcome_message(command: Command, planned: &LineEdits) -> String {
	let n = planned.lines;
	match command {
		Command::CopyWithoutPrefix => COPY_MESSAGE.to_string(),
		Command::DeleteSelectedLines if planned.prefixed > 0 => {
			format!("Deleted {n} line{} ({} with number prefix)", plural(n), planned.prefixed)
		}
		Command::DeleteSelectedLines => format!("Deleted {n} line{}", plural(n)),
		Command::ForceInsertPrefix => format!("Inserted prefix on {n} line{}", plural(n)),
		Command::SetDateToZero => format!("Set date to zero on {n} line{}", plural(n)),
		Command::Resync => format!("Resynchronized {n} line{}", plural(n)),
	}
}

fn selected_lines(text: RopeSlice, selection: &Selection) -> BTreeSet<usize> {
	let total = line_count(text);
	selection
		.iter()
		.flat_map(|range| range.lines())
		.filter(|line| *line < total)
		.collect()
}

fn chars(content: &str, from: usize, to: usize) -> String {
	content.chars().skip(from).take(to.saturating_sub(from)).collect()
}

/// Returns the selected text with prefixes removed.
///
/// On prefixed lines the copied columns start no earlier than the end of the
/// prefix. An empty primary range copies its whole line and nothing else;
/// otherwise empty ranges contribute nothing. Ranges are joined with line
/// breaks.
pub fn copy_without_prefix(text: RopeSlice, selection: &Selection) -> String {
	let primary = selection.primary();
	if primary.is_empty() {
		let content = line_text(text, primary.head.line).unwrap_or_default();
		return codec::strip_prefix(&content).to_string();
	}

	let mut pieces = Vec::with_capacity(selection.len());
	for range in selection.iter().filter(|range| !range.is_empty()) {
		let (start, end) = (range.start(), range.end());
		let mut lines = Vec::new();
		for line in start.line..=end.line {
			let Some(content) = line_text(text, line) else {
				break;
			};
			let mut from = if line == start.line { start.character } else { 0 };
			let to = if line == end.line {
				end.character
			} else {
				content.chars().count()
			};
			if codec::has_prefix(&content) {
				from = from.max(PREFIX_LEN);
			}
			lines.push(chars(&content, from, to));
		}
		pieces.push(lines.join("\n"));
	}
	pieces.join("\n")
}

/// Plans the deletion of every line touched by the selection.
///
/// Contiguous lines are removed as one range including their trailing line
/// break. A run that reaches the last line takes the preceding line break
/// instead, so no empty line is left behind.
pub fn delete_selected_lines(text: RopeSlice, selection: &Selection) -> LineEdits {
	let lines = selected_lines(text, selection);
	let total = line_count(text);

	let mut runs: Vec<(usize, usize)> = Vec::new();
	for &line in &lines {
		match runs.last_mut() {
			Some((_, last)) if *last + 1 == line => *last = line,
			_ => runs.push((line, line)),
		}
	}

	let mut edits = Vec::with_capacity(runs.len());
	for &(first, last) in runs.iter().rev() {
		let range = if last + 1 < total {
			LineRange::new(LinePos::new(first, 0), LinePos::new(last + 1, 0))
		} else if first > 0 {
			let prev_len = line_len(text, first - 1).unwrap_or(0);
			let last_len = line_len(text, last).unwrap_or(0);
			LineRange::new(LinePos::new(first - 1, prev_len), LinePos::new(last, last_len))
		} else {
			let last_len = line_len(text, last).unwrap_or(0);
			LineRange::new(LinePos::new(0, 0), LinePos::new(last, last_len))
		};
		edits.push(TextEdit::new(range, ""));
	}

	let prefixed = lines
		.iter()
		.filter(|&&line| line_text(text, line).is_some_and(|content| codec::has_prefix(&content)))
		.count();
	LineEdits {
		edits,
		lines: lines.len(),
		prefixed,
	}
}

/// Plans a zero-dated prefix for every selected line lacking one.
///
/// Blank lines are left alone.
pub fn force_insert_prefix(text: RopeSlice, selection: &Selection) -> LineEdits {
	let mut planned = LineEdits::default();
	for line in selected_lines(text, selection).into_iter().rev() {
		let Some(content) = line_text(text, line) else {
			continue;
		};
		if codec::has_prefix(&content) || codec::is_blank(&content) {
			continue;
		}
		planned.edits.push(TextEdit::new(
			LineRange::on_line(line, 0, 0),
			codec::build_prefix(line, None),
		));
		planned.lines += 1;
	}
	planned
}

/// Plans zeroing the date field of every selected prefixed line.
pub fn set_date_to_zero(text: RopeSlice, selection: &Selection) -> LineEdits {
	let mut planned = LineEdits::default();
	for line in selected_lines(text, selection).into_iter().rev() {
		let Some(content) = line_text(text, line) else {
			continue;
		};
		let Some(field) = codec::date_field(&content) else {
			continue;
		};
		planned.lines += 1;
		planned.prefixed += 1;
		if field != ZERO_DATE {
			planned.edits.push(TextEdit::new(
				LineRange::on_line(line, DATE_FIELD.start, DATE_FIELD.end),
				ZERO_DATE,
			));
		}
	}
	planned
}

/// Plans renumbering of the whole document.
///
/// Every prefixed line gets the sequence of its position. Date fields that
/// are not a calendar date (including the zero date) become `today`; valid
/// dates are kept. Lines without a prefix are untouched.
pub fn resync(text: RopeSlice, today: NaiveDate) -> LineEdits {
	let mut planned = LineEdits::default();
	for line in (0..line_count(text)).rev() {
		let Some(content) = line_text(text, line) else {
			continue;
		};
		let Some(prefix) = codec::parse_prefix(&content) else {
			continue;
		};
		planned.prefixed += 1;
		let expected = codec::build_prefix(line, Some(prefix.date.unwrap_or(today)));
		if content[..PREFIX_LEN] != expected {
			planned.edits.push(TextEdit::new(LineRange::on_line(line, 0, PREFIX_LEN), expected));
			planned.lines += 1;
		}
	}
	planned
}

/// Moves multi-line selection starts out of the prefix columns.
///
/// A range spanning several lines whose start sits inside the prefix of a
/// prefixed line is narrowed to start at the first content column, keeping
/// its orientation. Returns `None` when no range moved.
pub fn guard_selection(text: RopeSlice, selection: &Selection) -> Option<Selection> {
	let mut moved = false;
	let guarded = selection.map(|range| {
		let start = range.start();
		if range.is_single_line() || start.character >= PREFIX_LEN {
			return *range;
		}
		let prefixed = line_text(text, start.line).is_some_and(|content| codec::has_prefix(&content));
		if !prefixed {
			return *range;
		}
		moved = true;
		range.with_bounds(LinePos::new(start.line, PREFIX_LEN), range.end())
	});
	moved.then_some(guarded)
}

/// Returns the commands offered for a selection.
///
/// A non-empty primary range touching at least one prefixed line offers
/// copying and deleting.
pub fn available_actions(text: RopeSlice, selection: &Selection) -> Vec<Command> {
	let primary = selection.primary();
	if primary.is_empty() {
		return Vec::new();
	}
	let touches_prefix = primary
		.lines()
		.any(|line| line_text(text, line).is_some_and(|content| codec::has_prefix(&content)));
	if touches_prefix {
		vec![Command::CopyWithoutPrefix, Command::DeleteSelectedLines]
	} else {
		Vec::new()
	}
}
