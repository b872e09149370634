//! Docvault Cache
//!
//! The local cache directory is a flat folder of `<key><ext>` files. A file
//! exists under its final name only once it is complete; this crate is the
//! only writer.
//!
//! ## What we do here
//!
//! - **Materialize** - [`materialize`] copies a byte stream into a temp file
//!   next to the destination, syncs it, and renames it into place. Readers see
//!   no file or the whole file, never a prefix.
//! - **Resolve** - [`DocumentResolver`] serves a key from the cache when it is
//!   there and otherwise pulls it from the [`RemoteArchive`](archive::RemoteArchive),
//!   promotes it, and re-opens it.
//!
//! There is no per-key lock. Two concurrent misses for the same key both
//! fetch and both rename; archive blobs are immutable, so the last rename
//! publishes the same bytes as the first.
//!
//! ## Example
//!
//! ```
//! use std::sync::Arc;
//! use archive::MemoryArchive;
//! use cache::{DocumentKey, DocumentKind, DocumentResolver, Origin};
//!
//! let dir = tempfile::tempdir().unwrap();
//! let archive = Arc::new(MemoryArchive::new());
//! archive.insert("cert-7.pdf", b"%PDF-1.7 cert".to_vec());
//!
//! let resolver = DocumentResolver::new(dir.path(), archive.clone());
//! let key = DocumentKey::new("cert-7").unwrap();
//!
//! let first = resolver.resolve_blocking(&key, DocumentKind::Attestation).unwrap();
//! assert_eq!(first.origin, Origin::Archive);
//!
//! let second = resolver.resolve_blocking(&key, DocumentKind::Attestation).unwrap();
//! assert_eq!(second.origin, Origin::Cache);
//! assert_eq!(archive.retrievals(), 1);
//! ```

mod error;
mod materialize;
mod resolver;
mod types;

pub use crate::error::{CacheError, CacheResult, ResolveError, ResolveResult};
pub use crate::materialize::{materialize, Materialized};
pub use crate::resolver::{DocumentResolver, Origin, ResolvedDocument};
pub use crate::types::{DocumentKey, DocumentKind};
