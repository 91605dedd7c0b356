//! File-level operations behind the subcommands. Each takes the file text
//! and returns what the subcommand prints or writes.

use std::collections::HashMap;

use chrono::NaiveDate;
use seqline_engine::annotate::compute_annotations;
use seqline_engine::apply::to_transaction;
use seqline_engine::codec::{self, PREFIX_LEN, ZERO_DATE};
use seqline_engine::commands::{self, Command, LineEdits};
use seqline_engine::scope::ScopeSnapshot;
use seqline_engine::{Config, HostError, TextEdit};
use seqline_primitives::{LineRange, Rope, line_count, line_text};
use url::Url;

/// Width of the gutter label column.
const GUTTER_WIDTH: usize = 6;

/// Renders each line as `label | text`, the label being the date field of
/// prefixed lines.
pub fn annotate(text: &str) -> String {
	let doc = Rope::from(text);
	let slice = doc.slice(..);
	let labels: HashMap<usize, String> = compute_annotations(slice, &[])
		.into_iter()
		.map(|annotation| (annotation.line, annotation.label))
		.collect();

	let mut out = String::with_capacity(text.len());
	for line in 0..line_count(slice) {
		let Some(content) = line_text(slice, line) else {
			continue;
		};
		let label = labels.get(&line).map_or("", String::as_str);
		out.push_str(&format!(
			"{label:>width$} | {}\n",
			codec::strip_prefix(&content),
			width = GUTTER_WIDTH
		));
	}
	out
}

/// Removes the prefix of every prefixed line, keeping line endings.
///
/// # Errors
///
/// Fails only if the planned edits do not fit the text, which would be a bug.
pub fn strip(text: &str) -> Result<String, HostError> {
	let doc = Rope::from(text);
	let slice = doc.slice(..);
	let edits: Vec<TextEdit> = (0..line_count(slice))
		.filter(|&line| line_text(slice, line).is_some_and(|content| codec::has_prefix(&content)))
		.map(|line| TextEdit::new(LineRange::on_line(line, 0, PREFIX_LEN), ""))
		.collect();
	rewrite(doc, &edits)
}

/// Runs the explicit resync and returns the new text with its plan.
///
/// # Errors
///
/// Fails only if the planned edits do not fit the text.
pub fn resync(text: &str, today: NaiveDate) -> Result<(String, LineEdits), HostError> {
	let doc = Rope::from(text);
	let planned = commands::resync(doc.slice(..), today);
	let out = rewrite(doc, &planned.edits)?;
	Ok((out, planned))
}

/// Completion line printed after a resync.
pub fn resync_message(planned: &LineEdits) -> String {
	commands::outcome_message(Command::Resync, planned)
}

fn rewrite(mut doc: Rope, edits: &[TextEdit]) -> Result<String, HostError> {
	if !edits.is_empty() {
		let tx = to_transaction(doc.slice(..), edits)?;
		tx.apply(&mut doc);
	}
	Ok(doc.to_string())
}

/// Findings of `check`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
	/// Whether the engine would act on the file.
	pub eligible: bool,
	/// Number of prefixed lines.
	pub prefixed: usize,
	/// Non-blank lines without a prefix.
	pub unprefixed: usize,
	/// Lines carrying the zero date, 0-based.
	pub zero_dates: Vec<usize>,
	/// Lines whose date field is not a calendar date, with the raw field.
	pub invalid_dates: Vec<(usize, String)>,
}

impl CheckReport {
	/// Returns true when every prefixed line carries a valid or zero date.
	pub fn is_clean(&self) -> bool {
		self.invalid_dates.is_empty()
	}

	/// Renders the report for a file.
	pub fn render(&self, name: &str) -> String {
		let mut out = format!(
			"{name}: {} ({} prefixed, {} unprefixed, {} zero-dated)\n",
			if self.eligible { "eligible" } else { "not eligible" },
			self.prefixed,
			self.unprefixed,
			self.zero_dates.len(),
		);
		for (line, field) in &self.invalid_dates {
			out.push_str(&format!("{name}:{}: invalid date field {field}\n", line + 1));
		}
		out
	}
}

/// Inspects a file's eligibility and date fields.
pub fn check(text: &str, uri: &Url, config: &Config) -> CheckReport {
	let doc = Rope::from(text);
	let slice = doc.slice(..);
	let mut report = CheckReport {
		eligible: ScopeSnapshot::new(config, 0).evaluate(uri),
		prefixed: 0,
		unprefixed: 0,
		zero_dates: Vec::new(),
		invalid_dates: Vec::new(),
	};

	for line in 0..line_count(slice) {
		let Some(content) = line_text(slice, line) else {
			continue;
		};
		let Some(field) = codec::date_field(&content) else {
			if !codec::is_blank(&content) {
				report.unprefixed += 1;
			}
			continue;
		};
		report.prefixed += 1;
		if field == ZERO_DATE {
			report.zero_dates.push(line);
		} else if codec::parse_date(field).is_none() {
			report.invalid_dates.push((line, field.to_string()));
		}
	}
	report
}
