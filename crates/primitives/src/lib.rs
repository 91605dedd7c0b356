//! Core types for line-oriented text editing: positions, selections, and transactions.

/// Line/character positions and ranges.
pub mod range;
/// Rope utilities and extensions.
pub mod rope;
/// Selection types for single and multi-cursor editing.
pub mod selection;
/// Atomic multi-edit transactions.
pub mod transaction;

pub use range::{CharIdx, CharLen, LinePos, LineRange};
pub use rope::{line_count, line_text, pos_to_char};
pub use ropey::{Rope, RopeSlice};
pub use selection::{Range, Selection};
pub use transaction::{Change, ChangeSet, Transaction, TransactionError};
