//! Prefix detection, parsing and formatting.
//!
//! A prefix is the first [`PREFIX_LEN`] characters of a line when they are
//! all ASCII digits: a 6-digit sequence followed by a 6-digit `YYMMDD` date.
//! Dates are read with the century fixed at 2000 and checked against real
//! month lengths, so `230229` is rejected while `240229` is accepted.
//!
//! Sequences are clamped at [`MAX_SEQUENCE`]: every line past the
//! 999,999th formats to the same sequence value.

use std::ops::Range;

use chrono::{Datelike, NaiveDate};


/// Length of a prefix in characters.
pub const PREFIX_LEN: usize = 12;

/// Width of the sequence field.
pub const SEQUENCE_LEN: usize = 6;

/// Column range of the date field inside a prefix.
pub const DATE_FIELD: Range<usize> = SEQUENCE_LEN..PREFIX_LEN;

/// Largest representable sequence.
pub const MAX_SEQUENCE: u32 = 999_999;

/// Date field written when no date is recorded.
pub const ZERO_DATE: &str = "000000";

/// A parsed prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prefix {
	/// The 6-digit sequence number.
	pub sequence: u32,
	/// The date field, or `None` when the digits do not form a calendar date.
	pub date: Option<NaiveDate>,
}

/// Returns true if `text` starts with a well-formed prefix.
#[inline]
pub fn has_prefix(text: &str) -> bool {
	text.as_bytes()
		.get(..PREFIX_LEN)
		.is_some_and(|head| head.iter().all(u8::is_ascii_digit))
}

/// Parses the prefix of `text`.
pub fn parse_prefix(text: &str) -> Option<Prefix> {
	if !has_prefix(text) {
		return None;
	}
	Some(Prefix {
		sequence: parse_sequence(&text[..SEQUENCE_LEN])?,
		date: parse_date(&text[DATE_FIELD]),
	})
}

/// Parses a 6-digit sequence field.
pub fn parse_sequence(digits: &str) -> Option<u32> {
	if digits.len() != SEQUENCE_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	digits.parse().ok()
}

/// Parses a 6-digit `YYMMDD` date field.
///
/// Returns `None` for anything that is not six digits naming a real day
/// between 2000-01-01 and 2099-12-31, including the zero date.
pub fn parse_date(digits: &str) -> Option<NaiveDate> {
	let bytes = digits.as_bytes();
	if bytes.len() != 6 || !bytes.iter().all(u8::is_ascii_digit) {
		return None;
	}
	let pair = |i: usize| u32::from(bytes[i] - b'0') * 10 + u32::from(bytes[i + 1] - b'0');
	let year = 2000 + i32::try_from(pair(0)).ok()?;
	NaiveDate::from_ymd_opt(year, pair(2), pair(4))
}

/// Formats a date as a 6-digit `YYMMDD` field.
pub fn format_date(date: NaiveDate) -> String {
	format!("{:02}{:02}{:02}", date.year().rem_euclid(100), date.month(), date.day())
}

/// Returns the sequence assigned to a zero-based line position.
#[inline]
pub fn sequence_for(line_index: usize) -> u32 {
	u32::try_from(line_index.saturating_add(1)).map_or(MAX_SEQUENCE, |seq| seq.min(MAX_SEQUENCE))
}

/// Formats the sequence field for a zero-based line position.
pub fn format_sequence(line_index: usize) -> String {
	format_sequence_value(sequence_for(line_index))
}

/// Formats an explicit sequence value, clamped to [`MAX_SEQUENCE`].
pub fn format_sequence_value(sequence: u32) -> String {
	format!("{:06}", sequence.min(MAX_SEQUENCE))
}

/// Builds the 12-character prefix for a line position.
///
/// A `None` date writes [`ZERO_DATE`].
pub fn build_prefix(line_index: usize, date: Option<NaiveDate>) -> String {
	let mut prefix = format_sequence(line_index);
	match date {
		Some(date) => prefix.push_str(&format_date(date)),
		None => prefix.push_str(ZERO_DATE),
	}
	prefix
}

/// Returns the raw date field of a prefixed line.
pub fn date_field(text: &str) -> Option<&str> {
	has_prefix(text).then(|| &text[DATE_FIELD])
}

/// Returns `text` without its prefix, or unchanged when it has none.
pub fn strip_prefix(text: &str) -> &str {
	if has_prefix(text) { &text[PREFIX_LEN..] } else { text }
}

/// Returns true for empty and whitespace-only lines, which prefix logic ignores.
#[inline]
pub fn is_blank(text: &str) -> bool {
	text.trim().is_empty()
}
