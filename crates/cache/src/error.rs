//! Error types for materialization and resolution.
//!
//! [`CacheError`] is internal detail: the resolver logs it and then decides,
//! from whether the re-open succeeds, what the caller sees. [`ResolveError`]
//! is what leaves the crate.

use std::io;
use std::path::PathBuf;

use archive::ArchiveError;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;
pub type ResolveResult<T> = Result<T, ResolveError>;

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum CacheError {
    /// Reading the source stream failed part way through.
    #[error("source stream for {name} broke: {source}")]
    Source {
        name: String,
        #[source]
        source: io::Error,
    },

    /// Creating, writing, syncing or renaming the local file failed.
    #[error("cannot write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ResolveError {
    #[error("document key must not be empty")]
    EmptyKey,

    /// Neither the cache nor the archive could produce the document.
    #[error("document {key} not found")]
    DocumentNotFound { key: String },

    /// The archive could not be consulted (connect, login or transfer failure).
    #[error("archive unavailable while resolving {key}: {source}")]
    ArchiveUnavailable {
        key: String,
        #[source]
        source: ArchiveError,
    },

    /// The blocking resolution task panicked or was cancelled.
    #[error("resolution task failed: {0}")]
    Task(String),
}

impl ResolveError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ResolveError::DocumentNotFound { .. })
    }
}
