//! Rope utilities and extensions.
//!
//! Line breaks follow ropey's definition (LF, CRLF, lone CR and the unicode
//! separators), so line counts computed here always agree with
//! [`ropey::Rope::len_lines`].

use std::borrow::Cow;

use ropey::RopeSlice;

use crate::range::{CharIdx, CharLen, LinePos};

/// Returns the number of lines, including the empty line after a trailing newline.
#[inline]
pub fn line_count(text: RopeSlice) -> usize {
	text.len_lines()
}

/// Returns the number of line breaks in `text`.
pub fn line_break_count(text: &str) -> usize {
	RopeSlice::from(text).len_lines() - 1
}

/// Returns the length of a line in chars, excluding its line ending.
pub fn line_len(text: RopeSlice, line: usize) -> Option<CharLen> {
	if line >= text.len_lines() {
		return None;
	}
	let slice = text.line(line);
	Some(slice.len_chars() - line_ending_len(slice))
}

/// Returns the text of a line without its line ending.
pub fn line_text(text: RopeSlice<'_>, line: usize) -> Option<Cow<'_, str>> {
	let len = line_len(text, line)?;
	Some(text.line(line).slice(..len).into())
}

/// Converts a line/character position to a char index.
///
/// Returns `None` when the line does not exist or the character offset lies
/// past the end of the line's content.
pub fn pos_to_char(text: RopeSlice, pos: LinePos) -> Option<CharIdx> {
	let len = line_len(text, pos.line)?;
	if pos.character > len {
		return None;
	}
	Some(text.line_to_char(pos.line) + pos.character)
}

fn line_ending_len(line: RopeSlice) -> CharLen {
	let len = line.len_chars();
	if len == 0 {
		return 0;
	}
	match line.char(len - 1) {
		'\n' if len >= 2 && line.char(len - 2) == '\r' => 2,
		'\n' | '\r' | '\u{000B}' | '\u{000C}' | '\u{0085}' | '\u{2028}' | '\u{2029}' => 1,
		_ => 0,
	}
}

#[cfg(test)]
mod tests {
	use ropey::Rope;

	use super::*;

	#[test]
	fn test_no_trailing_newline() {
		let text = Rope::from("hello\nworld");
		assert_eq!(line_count(text.slice(..)), 2);
		assert_eq!(line_text(text.slice(..), 1).as_deref(), Some("world"));
	}

	#[test]
	fn test_trailing_newline() {
		let text = Rope::from("hello\nworld\n");
		assert_eq!(line_count(text.slice(..)), 3);
		assert_eq!(line_text(text.slice(..), 2).as_deref(), Some(""));
	}

	#[test]
	fn test_crlf_is_stripped() {
		let text = Rope::from("000001231123abc\r\nnext");
		assert_eq!(line_text(text.slice(..), 0).as_deref(), Some("000001231123abc"));
		assert_eq!(line_len(text.slice(..), 0), Some(15));
	}

	#[test]
	fn test_missing_line() {
		let text = Rope::from("one");
		assert_eq!(line_text(text.slice(..), 1), None);
		assert_eq!(line_len(text.slice(..), 1), None);
	}

	#[test]
	fn test_pos_to_char() {
		let text = Rope::from("ab\ncdef\n");
		assert_eq!(pos_to_char(text.slice(..), LinePos::new(1, 2)), Some(5));
		assert_eq!(pos_to_char(text.slice(..), LinePos::new(1, 4)), Some(7));
		assert_eq!(pos_to_char(text.slice(..), LinePos::new(1, 5)), None);
		assert_eq!(pos_to_char(text.slice(..), LinePos::new(2, 0)), Some(8));
	}

	#[test]
	fn test_line_break_count() {
		assert_eq!(line_break_count(""), 0);
		assert_eq!(line_break_count("abc"), 0);
		assert_eq!(line_break_count("\n"), 1);
		assert_eq!(line_break_count("a\r\nb\nc"), 2);
	}
}
