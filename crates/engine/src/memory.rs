//! In-process host over ropes.
//!
//! [`MemoryHost`] implements every host seam. Each mutation, whether a user
//! edit made through the helpers or an engine transaction, bumps the document
//! version and is appended to a change feed as a [`ChangeBatch`], the way an
//! editor reports its own edits back to listeners.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use seqline_primitives::{LinePos, LineRange, Rope, pos_to_char};

use crate::apply::to_transaction;
use crate::error::HostError;
use crate::host::{
	Annotation, AnnotationSink, BufferHost, BufferSnapshot, ChangeBatch, Clipboard, DocumentEdit, DocumentId,
	TextChange, TextEdit,
};

#[derive(Debug)]
struct MemoryDoc {
	text: Rope,
	version: u64,
}

#[derive(Debug, Default)]
struct Inner {
	docs: HashMap<DocumentId, MemoryDoc>,
	feed: Vec<ChangeBatch>,
	fail_applies: Vec<String>,
	apply_count: usize,
	annotations: HashMap<DocumentId, Vec<Annotation>>,
	annotation_sets: HashMap<DocumentId, usize>,
	fail_annotations: bool,
	clipboard: Option<String>,
}

/// In-memory implementation of [`BufferHost`], [`AnnotationSink`] and
/// [`Clipboard`].
#[derive(Debug, Default)]
pub struct MemoryHost {
	inner: Mutex<Inner>,
}

impl MemoryHost {
	/// Creates an empty host.
	pub fn new() -> Self {
		Self::default()
	}

	/// Opens a document at version 1.
	pub fn open(&self, doc: DocumentId, text: &str) {
		self.inner.lock().docs.insert(
			doc,
			MemoryDoc {
				text: Rope::from(text),
				version: 1,
			},
		);
	}

	/// Closes a document, dropping its text and annotations.
	pub fn close(&self, doc: DocumentId) {
		let mut inner = self.inner.lock();
		inner.docs.remove(&doc);
		inner.annotations.remove(&doc);
	}

	/// Returns the current text of a document.
	pub fn text(&self, doc: DocumentId) -> Option<String> {
		self.inner.lock().docs.get(&doc).map(|d| d.text.to_string())
	}

	/// Returns the current version of a document.
	pub fn version(&self, doc: DocumentId) -> Option<u64> {
		self.inner.lock().docs.get(&doc).map(|d| d.version)
	}

	/// Performs a user edit and returns its change notification.
	///
	/// # Errors
	///
	/// Fails like [`BufferHost::apply`] for unknown documents and invalid
	/// ranges.
	pub fn edit(&self, doc: DocumentId, edits: Vec<TextEdit>) -> Result<ChangeBatch, HostError> {
		let mut inner = self.inner.lock();
		inner.mutate(doc, &edits)
	}

	/// Inserts `text` at a position, as if typed.
	///
	/// # Errors
	///
	/// Fails for unknown documents and positions outside the text.
	pub fn type_text(&self, doc: DocumentId, at: LinePos, text: &str) -> Result<ChangeBatch, HostError> {
		self.edit(doc, vec![TextEdit::new(LineRange::point(at), text)])
	}

	/// Drains the change feed.
	pub fn take_changes(&self) -> Vec<ChangeBatch> {
		std::mem::take(&mut self.inner.lock().feed)
	}

	/// Makes the next transaction fail with `reason`.
	pub fn fail_next_apply(&self, reason: impl Into<String>) {
		self.inner.lock().fail_applies.push(reason.into());
	}

	/// Returns the number of transactions applied through [`BufferHost::apply`].
	pub fn apply_count(&self) -> usize {
		self.inner.lock().apply_count
	}

	/// Returns the current annotation set of a document.
	pub fn annotations(&self, doc: DocumentId) -> Option<Vec<Annotation>> {
		self.inner.lock().annotations.get(&doc).cloned()
	}

	/// Returns how many times the annotation set of a document was replaced.
	pub fn annotation_sets(&self, doc: DocumentId) -> usize {
		self.inner.lock().annotation_sets.get(&doc).copied().unwrap_or(0)
	}

	/// Makes every [`AnnotationSink::set`] call fail while `fail` is true.
	pub fn fail_annotations(&self, fail: bool) {
		self.inner.lock().fail_annotations = fail;
	}

	/// Returns the clipboard contents.
	pub fn clipboard(&self) -> Option<String> {
		self.inner.lock().clipboard.clone()
	}
}

impl Inner {
	fn mutate(&mut self, doc: DocumentId, edits: &[TextEdit]) -> Result<ChangeBatch, HostError> {
		let state = self.docs.get_mut(&doc).ok_or(HostError::UnknownDocument(doc))?;
		let tx = to_transaction(state.text.slice(..), edits)?;

		let mut changes = Vec::with_capacity(edits.len());
		for edit in edits {
			let slice = state.text.slice(..);
			let replaced_len = match (pos_to_char(slice, edit.range.start), pos_to_char(slice, edit.range.end)) {
				(Some(start), Some(end)) => end - start,
				_ => 0,
			};
			changes.push(TextChange {
				range: edit.range,
				inserted_text: edit.new_text.clone(),
				replaced_len,
			});
		}

		tx.apply(&mut state.text);
		state.version += 1;
		let batch = ChangeBatch {
			doc,
			version: state.version,
			changes,
			text: Some(state.text.clone()),
		};
		self.feed.push(batch.clone());
		Ok(batch)
	}
}

#[async_trait]
impl BufferHost for MemoryHost {
	async fn snapshot(&self, doc: DocumentId) -> Option<BufferSnapshot> {
		self.inner.lock().docs.get(&doc).map(|d| BufferSnapshot {
			text: d.text.clone(),
			version: d.version,
		})
	}

	async fn apply(&self, doc: DocumentId, edit: DocumentEdit) -> Result<(), HostError> {
		let mut inner = self.inner.lock();
		let actual = inner.docs.get(&doc).ok_or(HostError::UnknownDocument(doc))?.version;
		if let Some(expected) = edit.version
			&& expected != actual
		{
			return Err(HostError::VersionMismatch { doc, expected, actual });
		}
		if !inner.fail_applies.is_empty() {
			let reason = inner.fail_applies.remove(0);
			return Err(HostError::Rejected(reason));
		}
		inner.mutate(doc, &edit.edits)?;
		inner.apply_count += 1;
		Ok(())
	}
}

#[async_trait]
impl AnnotationSink for MemoryHost {
	async fn set(&self, doc: DocumentId, annotations: Vec<Annotation>) -> Result<(), HostError> {
		let mut inner = self.inner.lock();
		if inner.fail_annotations {
			return Err(HostError::Annotation("annotation sink unavailable".into()));
		}
		*inner.annotation_sets.entry(doc).or_default() += 1;
		inner.annotations.insert(doc, annotations);
		Ok(())
	}

	async fn clear(&self, doc: DocumentId) {
		self.inner.lock().annotations.remove(&doc);
	}
}

impl Clipboard for MemoryHost {
	fn write_text(&self, text: &str) -> Result<(), HostError> {
		self.inner.lock().clipboard = Some(text.to_string());
		Ok(())
	}
}
