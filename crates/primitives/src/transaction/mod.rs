//! Atomic multi-edit transactions.
//!
//! A [`Transaction`] is built from a set of [`Change`]s against one document
//! state. Construction validates the whole set up front (bounds, ordering,
//! overlap), so applying a transaction either performs every change or, if
//! construction failed, none of them.

mod changeset;
mod types;

pub use changeset::ChangeSet;
pub use types::{Change, Insertion, Operation, Tendril};

use crate::range::CharIdx;
use crate::{Rope, RopeSlice};

#[cfg(test)]
mod tests;

/// Reasons a set of changes cannot form a transaction.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransactionError {
	/// A change ends before it starts.
	#[error("change range {start}..{end} is inverted")]
	InvertedRange {
		/// Start of the offending change.
		start: CharIdx,
		/// End of the offending change.
		end: CharIdx,
	},
	/// A change reaches past the end of the document.
	#[error("change end {end} exceeds document length {len}")]
	OutOfBounds {
		/// End of the offending change.
		end: CharIdx,
		/// Document length in chars.
		len: usize,
	},
	/// Two changes target intersecting regions.
	#[error("overlapping changes at {at}")]
	Overlapping {
		/// Start of the second overlapping change.
		at: CharIdx,
	},
}

/// A validated set of changes ready to apply to a document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transaction {
	changes: ChangeSet,
}

impl Transaction {
	/// Builds a transaction from changes expressed against `doc`.
	///
	/// Changes may be given in any order; they are sorted by position. Two
	/// insertions at the same position keep their relative order.
	///
	/// # Errors
	///
	/// Returns [`TransactionError`] if any change is inverted, out of bounds,
	/// or overlaps another.
	pub fn change(doc: RopeSlice, changes: impl IntoIterator<Item = Change>) -> Result<Self, TransactionError> {
		let len = doc.len_chars();
		let mut changes: Vec<Change> = changes.into_iter().collect();
		changes.sort_by_key(|c| (c.start, c.end));

		let mut set = ChangeSet::default();
		let mut pos = 0;
		for change in changes {
			if change.start > change.end {
				return Err(TransactionError::InvertedRange {
					start: change.start,
					end: change.end,
				});
			}
			if change.end > len {
				return Err(TransactionError::OutOfBounds { end: change.end, len });
			}
			if change.start < pos {
				return Err(TransactionError::Overlapping { at: change.start });
			}

			set.retain(change.start - pos);
			if let Some(text) = change.replacement {
				set.insert(text);
			}
			set.delete(change.end - change.start);
			pos = change.end;
		}
		set.retain(len - pos);

		Ok(Self { changes: set })
	}

	/// Returns the underlying changeset.
	pub fn changes(&self) -> &ChangeSet {
		&self.changes
	}

	/// Returns the operations of the underlying changeset.
	pub fn operations(&self) -> &[Operation] {
		self.changes.changes()
	}

	/// Returns true if applying this transaction changes nothing.
	pub fn is_identity(&self) -> bool {
		self.changes.is_identity()
	}

	/// Applies this transaction to a document.
	pub fn apply(&self, doc: &mut Rope) {
		self.changes.apply(doc);
	}
}
