use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use archive::{ArchiveError, RemoteArchive};
use tracing::{debug, info, info_span, warn, Span};

use crate::error::{CacheError, ResolveError, ResolveResult};
use crate::materialize::materialize;
use crate::types::{DocumentKey, DocumentKind};

/// Where a resolved document came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Already present in the cache directory; the archive was not contacted.
    Cache,
    /// Fetched from the archive and promoted into the cache by this call.
    Archive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedDocument {
    pub path: PathBuf,
    pub origin: Origin,
}

/// Cache-first document lookup with archive fallback.
///
/// Cloning is cheap; clones share the archive client.
#[derive(Clone)]
pub struct DocumentResolver {
    cache_dir: PathBuf,
    archive: Arc<dyn RemoteArchive>,
}

impl DocumentResolver {
    pub fn new(cache_dir: impl Into<PathBuf>, archive: Arc<dyn RemoteArchive>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            archive,
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Canonical cache path for `key`.
    pub fn cache_path(&self, key: &DocumentKey, kind: DocumentKind) -> PathBuf {
        self.cache_dir.join(kind.file_name(key))
    }

    /// Resolve on the tokio blocking pool.
    ///
    /// The blocking task is not tied to the returned future: if the caller
    /// goes away (client disconnect, response timeout) the fetch and
    /// promotion still run to completion and the cache is still filled.
    pub async fn resolve(
        &self,
        key: DocumentKey,
        kind: DocumentKind,
    ) -> ResolveResult<ResolvedDocument> {
        let resolver = self.clone();
        let parent = Span::current();
        tokio::task::spawn_blocking(move || parent.in_scope(|| resolver.resolve_blocking(&key, kind)))
            .await
            .map_err(|err| ResolveError::Task(err.to_string()))?
    }

    /// Local lookup, then archive fetch, promotion and re-open on a miss.
    ///
    /// No retries: one failed fetch fails this call.
    pub fn resolve_blocking(
        &self,
        key: &DocumentKey,
        kind: DocumentKind,
    ) -> ResolveResult<ResolvedDocument> {
        let file_name = kind.file_name(key);
        let path = self.cache_path(key, kind);
        let span = info_span!("resolve", key = %key, file = %file_name);
        let _guard = span.enter();

        match File::open(&path) {
            Ok(_) => {
                debug!("cache_hit");
                return Ok(ResolvedDocument {
                    path,
                    origin: Origin::Cache,
                });
            }
            Err(err) => info!(error = %err, archive = %self.archive.describe(), "cache_miss"),
        }

        let start = Instant::now();
        let mut blob = self.archive.retrieve(&file_name).map_err(|err| {
            if err.is_not_found() {
                info!(stage = err.stage(), "archive_not_found");
                ResolveError::DocumentNotFound {
                    key: key.to_string(),
                }
            } else {
                warn!(stage = err.stage(), error = %err, "archive_unavailable");
                ResolveError::ArchiveUnavailable {
                    key: key.to_string(),
                    source: err,
                }
            }
        })?;

        let outcome = materialize(&self.cache_dir, &file_name, &mut blob);
        // Close the archive session before touching the cache again.
        drop(blob);

        let broken_transfer = match outcome {
            Ok(done) => {
                info!(
                    bytes = done.bytes,
                    elapsed_ms = start.elapsed().as_millis() as u64,
                    "document_promoted"
                );
                None
            }
            Err(CacheError::Source { source, .. }) => {
                warn!(stage = "transfer", error = %source, "promotion_failed");
                Some(ArchiveError::Transfer {
                    blob: file_name.clone(),
                    reason: source.to_string(),
                })
            }
            Err(err) => {
                warn!(stage = "materialize", error = %err, "promotion_failed");
                None
            }
        };

        // A concurrent request may have published the file even if we failed.
        match File::open(&path) {
            Ok(_) => Ok(ResolvedDocument {
                path,
                origin: Origin::Archive,
            }),
            Err(err) => {
                warn!(stage = "reopen", error = %err, "reopen_failed");
                Err(match broken_transfer {
                    Some(source) => ResolveError::ArchiveUnavailable {
                        key: key.to_string(),
                        source,
                    },
                    None => ResolveError::DocumentNotFound {
                        key: key.to_string(),
                    },
                })
            }
        }
    }
}

impl std::fmt::Debug for DocumentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentResolver")
            .field("cache_dir", &self.cache_dir)
            .field("archive", &self.archive.describe())
            .finish()
    }
}
