//! Host collaborator seams.
//!
//! The engine never owns document text. It reads snapshots from a
//! [`BufferHost`], writes through the host's atomic multi-edit primitive,
//! and pushes gutter labels to an [`AnnotationSink`]. Change notifications
//! arrive as [`ChangeBatch`]es.

use std::fmt;
use std::ops::Range;

use async_trait::async_trait;
use seqline_primitives::{LineRange, Rope};
use url::Url;

use crate::error::HostError;

/// Identifies an open document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(pub u64);

impl fmt::Display for DocumentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "doc#{}", self.0)
	}
}

/// Identity of an open document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentInfo {
	/// Document id.
	pub id: DocumentId,
	/// Document URI. Untitled buffers use the `untitled` scheme with their
	/// assigned name as the path.
	pub uri: Url,
}

impl DocumentInfo {
	/// Creates a document identity.
	pub fn new(id: DocumentId, uri: Url) -> Self {
		Self { id, uri }
	}
}

/// A read-only view of a document at one version.
#[derive(Debug, Clone)]
pub struct BufferSnapshot {
	/// Document text.
	pub text: Rope,
	/// Host version the text corresponds to.
	pub version: u64,
}

/// A single range replacement in line/character coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextEdit {
	/// Range to replace, in pre-edit coordinates.
	pub range: LineRange,
	/// Replacement text.
	pub new_text: String,
}

impl TextEdit {
	/// Creates an edit replacing `range` with `new_text`.
	pub fn new(range: LineRange, new_text: impl Into<String>) -> Self {
		Self {
			range,
			new_text: new_text.into(),
		}
	}
}

/// A set of edits applied as one atomic transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DocumentEdit {
	/// Version the edits were computed against. When set, a host whose
	/// document has moved on must reject the whole edit.
	pub version: Option<u64>,
	/// Non-overlapping edits, all in the same pre-edit coordinates.
	pub edits: Vec<TextEdit>,
}

/// One change within a notification batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextChange {
	/// Replaced range in pre-change coordinates.
	pub range: LineRange,
	/// Inserted text.
	pub inserted_text: String,
	/// Number of replaced characters.
	pub replaced_len: usize,
}

/// All changes of one document mutation, delivered after the fact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeBatch {
	/// Mutated document.
	pub doc: DocumentId,
	/// Document version after the mutation.
	pub version: u64,
	/// Changes of the mutation, each in pre-change coordinates.
	pub changes: Vec<TextChange>,
	/// Document text right after the mutation, when the host keeps it.
	///
	/// Later mutations may already have landed by the time the batch is
	/// handled; this is the text its changes are classified against.
	pub text: Option<Rope>,
}

/// A gutter label for one prefixed line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Annotation {
	/// Zero-based line.
	pub line: usize,
	/// Text shown in the gutter: the 6-digit date field.
	pub label: String,
	/// Columns the viewer hides from the text flow.
	pub concealed: Range<usize>,
}

/// Buffer access and atomic edits.
#[async_trait]
pub trait BufferHost: Send + Sync {
	/// Returns the current text and version of a document.
	async fn snapshot(&self, doc: DocumentId) -> Option<BufferSnapshot>;

	/// Applies every edit or none of them.
	async fn apply(&self, doc: DocumentId, edit: DocumentEdit) -> Result<(), HostError>;
}

/// Receives annotation sets.
#[async_trait]
pub trait AnnotationSink: Send + Sync {
	/// Replaces the whole annotation set of a document.
	async fn set(&self, doc: DocumentId, annotations: Vec<Annotation>) -> Result<(), HostError>;

	/// Removes every annotation of a document.
	async fn clear(&self, doc: DocumentId);
}

/// System clipboard.
pub trait Clipboard: Send + Sync {
	/// Replaces the clipboard contents.
	fn write_text(&self, text: &str) -> Result<(), HostError>;
}
