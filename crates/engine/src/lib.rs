//! Sequence/date prefix synchronization for line-numbered source buffers.
//!
//! Lines of in-scope documents start with a 12-digit prefix: a 6-digit
//! sequence number followed by a 6-digit `YYMMDD` date stamp. This crate keeps
//! those prefixes correct while a host editor mutates the buffer, and computes
//! the gutter annotations a viewer shows in place of the raw digits.
//!
//! The pipeline, leaves first:
//!
//! - [`codec`]: detect, parse and format prefixes.
//! - [`scope`]: decide whether a document is in scope at all.
//! - [`classify`]: turn a batch of text changes into pending corrections.
//! - [`sync`]: per-document coalescing queue and single in-flight commit.
//! - [`apply`]: re-validate corrections and build one atomic edit.
//!
//! [`SyncEngine`] ties these together as a single-threaded reactor over the
//! host collaborators defined in [`host`]. User commands live in
//! [`commands`]; [`memory::MemoryHost`] is an in-process host used by tests and
//! tooling.

pub mod annotate;
pub mod apply;
pub mod classify;
pub mod codec;
pub mod commands;
pub mod config;
mod engine;
mod error;
pub mod host;
pub mod memory;
pub mod scope;
pub mod sync;

pub use config::{Config, NewLineDate};
pub use engine::{CommandReply, DateSource, EngineEvent, SyncEngine, TickStats, system_today};
pub use error::{CommandError, ConfigError, Error, HostError};
pub use host::{
	Annotation, AnnotationSink, BufferHost, BufferSnapshot, ChangeBatch, Clipboard, DocumentEdit, DocumentId,
	DocumentInfo, TextChange, TextEdit,
};

/// A convenient type alias for `Result` with `E` = [`enum@crate::Error`].
pub type Result<T, E = Error> = std::result::Result<T, E>;
