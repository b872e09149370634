//! Docvault Remote Archive
//!
//! The archive is the source of truth for documents that are not yet in the
//! local cache. This crate knows how to reach it and how to hand back the
//! bytes of one named blob, nothing more.
//!
//! ## What we do here
//!
//! - **Open one session per retrieval** - connect with a bounded timeout,
//!   authenticate, switch to binary mode, `RETR` the blob.
//! - **Hand back a plain reader** - [`RemoteArchive::retrieve`] returns a
//!   `Box<dyn Read + Send>` that owns the session. Drain it, drop it, and the
//!   data channel is finalized and `QUIT` is sent.
//! - **Classify failures** - connect, auth, not-found and transfer failures
//!   are distinct [`ArchiveError`] variants so callers can tell "absent" from
//!   "unreachable".
//!
//! [`FtpArchive`] talks to a real FTP server; [`MemoryArchive`] keeps blobs in
//! process and is what the tests use.
//!
//! ## Example
//!
//! ```
//! use std::io::Read;
//! use archive::{MemoryArchive, RemoteArchive};
//!
//! let archive = MemoryArchive::new();
//! archive.insert("cert-42.pdf", b"%PDF-1.7".to_vec());
//!
//! let mut blob = archive.retrieve("cert-42.pdf").unwrap();
//! let mut bytes = Vec::new();
//! blob.read_to_end(&mut bytes).unwrap();
//! assert_eq!(bytes, b"%PDF-1.7");
//! assert_eq!(archive.retrievals(), 1);
//! ```

use std::io::Read;

mod config;
mod error;
mod ftp;
mod memory;

pub use crate::config::ArchiveConfig;
pub use crate::error::{ArchiveError, ArchiveResult};
pub use crate::ftp::FtpArchive;
pub use crate::memory::{Fault, MemoryArchive};

/// Byte stream of one remote blob. Owns the transfer session; dropping it closes the session.
pub type BlobReader = Box<dyn Read + Send>;

/// A remote store that can hand back named, immutable blobs.
///
/// Implementations block the calling thread; async callers should run them on
/// a blocking pool.
pub trait RemoteArchive: Send + Sync {
    /// Open a stream positioned at the first byte of `blob_name`.
    fn retrieve(&self, blob_name: &str) -> ArchiveResult<BlobReader>;

    /// Human-readable location used in log lines.
    fn describe(&self) -> String;
}
