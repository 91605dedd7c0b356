/// A position in the text, measured in characters (not bytes).
pub type CharIdx = usize;

/// A length or count in the text, measured in characters (not bytes).
///
/// This is distinct from CharIdx to avoid accidentally passing an index
/// where a length is expected or vice versa.
pub type CharLen = usize;

/// A position in line/character coordinates.
///
/// Both components are zero-based. `character` counts chars, not bytes or
/// UTF-16 code units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct LinePos {
	/// Zero-based line index.
	pub line: usize,
	/// Zero-based character offset in the line.
	pub character: usize,
}

impl LinePos {
	/// Creates a new position.
	pub const fn new(line: usize, character: usize) -> Self {
		Self { line, character }
	}
}

/// A range between two line/character positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct LineRange {
	/// Start position (inclusive).
	pub start: LinePos,
	/// End position (exclusive).
	pub end: LinePos,
}

impl LineRange {
	/// Creates a new range.
	pub const fn new(start: LinePos, end: LinePos) -> Self {
		Self { start, end }
	}

	/// Creates a zero-length range at a position.
	pub const fn point(pos: LinePos) -> Self {
		Self { start: pos, end: pos }
	}

	/// Creates a range on a single line covering `[from, to)`.
	pub const fn on_line(line: usize, from: usize, to: usize) -> Self {
		Self {
			start: LinePos::new(line, from),
			end: LinePos::new(line, to),
		}
	}

	/// Returns true if start equals end.
	pub fn is_empty(&self) -> bool {
		self.start == self.end
	}

	/// Returns true if both ends lie on the same line.
	pub fn is_single_line(&self) -> bool {
		self.start.line == self.end.line
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_positions_order_by_line_then_character() {
		assert!(LinePos::new(0, 40) < LinePos::new(1, 0));
		assert!(LinePos::new(2, 3) < LinePos::new(2, 4));
	}

	#[test]
	fn test_on_line_range() {
		let range = LineRange::on_line(3, 6, 12);
		assert!(range.is_single_line());
		assert!(!range.is_empty());
		assert_eq!(range.start, LinePos::new(3, 6));
		assert_eq!(range.end, LinePos::new(3, 12));
	}

	#[test]
	fn test_point_range_is_empty() {
		assert!(LineRange::point(LinePos::new(4, 2)).is_empty());
	}
}
