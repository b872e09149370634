//! Workspace umbrella crate for docvault.
//!
//! Re-exports the archive client, the cache (materializer and resolver) and
//! the barcode renderer so embedders and the cross-crate tests can work from
//! one import. The HTTP surface lives in the `docvault-server` crate.

pub use archive::{
    ArchiveConfig, ArchiveError, ArchiveResult, BlobReader, Fault, FtpArchive, MemoryArchive,
    RemoteArchive,
};
pub use barcode::{BarcodeError, BarcodeResult, LABEL_SIZE, encode, rasterize, render_png};
pub use cache::{
    CacheError, CacheResult, DocumentKey, DocumentKind, DocumentResolver, Materialized, Origin,
    ResolveError, ResolveResult, ResolvedDocument, materialize,
};

use std::path::PathBuf;
use std::sync::Arc;

/// Resolver over `cache_dir` backed by the FTP archive in `config`.
pub fn ftp_resolver(cache_dir: impl Into<PathBuf>, config: ArchiveConfig) -> DocumentResolver {
    DocumentResolver::new(cache_dir, Arc::new(FtpArchive::new(config)))
}
