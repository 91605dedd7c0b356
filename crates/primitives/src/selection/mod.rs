use std::ops::RangeInclusive;

use smallvec::{SmallVec, smallvec};

use crate::range::{LinePos, LineRange};

#[cfg(test)]
mod tests;

/// A selection range defined by anchor and head positions.
///
/// The anchor is the fixed end, and the head moves during selection extension.
/// A range whose head lies before its anchor is reversed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
	/// The fixed end of the range.
	pub anchor: LinePos,
	/// The moving end of the range (cursor position).
	pub head: LinePos,
}

impl Range {
	/// Creates a new range from anchor to head.
	pub fn new(anchor: LinePos, head: LinePos) -> Self {
		Self { anchor, head }
	}

	/// Creates a zero-width range (cursor) at the given position.
	pub fn point(pos: LinePos) -> Self {
		Self::new(pos, pos)
	}

	/// Returns the earlier of anchor and head.
	#[inline]
	pub fn start(&self) -> LinePos {
		self.anchor.min(self.head)
	}

	/// Returns the later of anchor and head.
	#[inline]
	pub fn end(&self) -> LinePos {
		self.anchor.max(self.head)
	}

	/// Returns true if anchor equals head (zero-width cursor).
	#[inline]
	pub fn is_empty(&self) -> bool {
		self.anchor == self.head
	}

	/// Returns true if the head lies before the anchor.
	#[inline]
	pub fn is_reversed(&self) -> bool {
		self.head < self.anchor
	}

	/// Returns true if both ends lie on the same line.
	#[inline]
	pub fn is_single_line(&self) -> bool {
		self.anchor.line == self.head.line
	}

	/// Returns every line index this range touches.
	pub fn lines(&self) -> RangeInclusive<usize> {
		self.start().line..=self.end().line
	}

	/// Returns this range as an ordered [`LineRange`].
	pub fn to_line_range(&self) -> LineRange {
		LineRange::new(self.start(), self.end())
	}

	/// Returns a range covering `start..end` with this range's orientation.
	pub fn with_bounds(&self, start: LinePos, end: LinePos) -> Self {
		if self.is_reversed() {
			Self::new(end, start)
		} else {
			Self::new(start, end)
		}
	}
}

/// A set of ranges with a designated primary.
///
/// A selection always contains at least one range. Ranges keep the order in
/// which the host reported them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
	/// The collection of selection ranges (always non-empty).
	ranges: SmallVec<[Range; 1]>,
	/// Index of the primary range within `ranges`.
	primary_index: usize,
}

impl Selection {
	/// Creates a selection with `primary` first, followed by `others`.
	pub fn new(primary: Range, others: impl IntoIterator<Item = Range>) -> Self {
		let mut ranges: SmallVec<[Range; 1]> = smallvec![primary];
		ranges.extend(others);
		Self { ranges, primary_index: 0 }
	}

	/// Creates a single-range selection.
	pub fn single(anchor: LinePos, head: LinePos) -> Self {
		Self {
			ranges: smallvec![Range::new(anchor, head)],
			primary_index: 0,
		}
	}

	/// Creates a point selection (zero-width cursor).
	pub fn point(pos: LinePos) -> Self {
		Self::single(pos, pos)
	}

	/// Creates a selection from a vector of ranges.
	///
	/// Returns `None` if `ranges` is empty or `primary_index` is out of bounds.
	pub fn from_vec(ranges: Vec<Range>, primary_index: usize) -> Option<Self> {
		if primary_index >= ranges.len() {
			return None;
		}
		Some(Self {
			ranges: ranges.into_iter().collect(),
			primary_index,
		})
	}

	/// Returns the primary range.
	pub fn primary(&self) -> Range {
		self.ranges[self.primary_index]
	}

	/// Returns the index of the primary range.
	pub fn primary_index(&self) -> usize {
		self.primary_index
	}

	/// Returns all ranges as a slice.
	pub fn ranges(&self) -> &[Range] {
		&self.ranges
	}

	/// Returns the number of ranges in this selection.
	#[allow(clippy::len_without_is_empty, reason = "Selection is never empty by design")]
	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	/// Iterates over all ranges.
	pub fn iter(&self) -> impl Iterator<Item = &Range> {
		self.ranges.iter()
	}

	/// Returns a new selection with every range mapped through `f`.
	///
	/// The primary index is preserved.
	pub fn map<F>(&self, f: F) -> Self
	where
		F: FnMut(&Range) -> Range,
	{
		Self {
			ranges: self.ranges.iter().map(f).collect(),
			primary_index: self.primary_index,
		}
	}
}
