use std::io;
use std::path::PathBuf;

use seqline_primitives::TransactionError;

use crate::host::DocumentId;

/// Possible errors.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
	/// Configuration could not be loaded.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A host collaborator reported a failure.
	#[error(transparent)]
	Host(#[from] HostError),
	/// A user command failed.
	#[error(transparent)]
	Command(#[from] CommandError),
}

/// Failures reported by host collaborators.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
	/// The host has no buffer for the document.
	#[error("unknown document {0}")]
	UnknownDocument(DocumentId),
	/// The document moved on since the edit was computed. The whole edit is
	/// rejected.
	#[error("stale edit for {doc}: computed against version {expected}, document is at {actual}")]
	VersionMismatch {
		/// Target document.
		doc: DocumentId,
		/// Version the edit was computed against.
		expected: u64,
		/// Current document version.
		actual: u64,
	},
	/// An edit range does not address existing text.
	#[error("edit range {line}:{character} is outside the document")]
	InvalidRange {
		/// Line of the offending position.
		line: usize,
		/// Character of the offending position.
		character: usize,
	},
	/// The edits do not form a valid transaction.
	#[error(transparent)]
	Transaction(#[from] TransactionError),
	/// The host refused the transaction.
	#[error("edit rejected by host: {0}")]
	Rejected(String),
	/// The clipboard could not be written.
	#[error("clipboard unavailable: {0}")]
	Clipboard(String),
	/// Annotations could not be applied.
	#[error("annotation update failed: {0}")]
	Annotation(String),
}

/// Configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// The configuration file could not be read.
	#[error("failed to read {path}: {source}")]
	Read {
		/// Path that was read.
		path: PathBuf,
		/// Underlying I/O error.
		source: io::Error,
	},
	/// The configuration file is not valid TOML for [`crate::Config`].
	#[error("invalid configuration: {0}")]
	Parse(#[from] toml::de::Error),
}

/// User command failures.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
	/// The command targets a document the engine does not track.
	#[error("document {0} is not open")]
	NotOpen(DocumentId),
	/// The host has no snapshot for an open document.
	#[error("document {0} has no buffer")]
	NoBuffer(DocumentId),
	/// The host rejected the command's edit or clipboard write.
	#[error(transparent)]
	Host(#[from] HostError),
}
