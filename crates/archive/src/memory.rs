use std::collections::HashMap;
use std::io::{self, Read};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::thread;
use std::time::Duration;

use tracing::debug;

use crate::{ArchiveError, ArchiveResult, BlobReader, RemoteArchive};

/// Failure modes a [`MemoryArchive`] can be told to simulate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Every retrieval fails at the connect stage.
    Unreachable,
    /// Every retrieval fails at the login stage.
    RejectLogin,
    /// The stream breaks after this many bytes.
    BreakAfter(usize),
}

#[derive(Debug, Default)]
struct Settings {
    fault: Option<Fault>,
    chunk_delay: Option<Duration>,
}

/// In-process archive of immutable blobs.
///
/// Counts every retrieval attempt, which is what the cache tests assert on.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    blobs: RwLock<HashMap<String, Arc<[u8]>>>,
    settings: RwLock<Settings>,
    retrievals: AtomicUsize,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `bytes` under `name`, replacing any earlier blob.
    pub fn insert(&self, name: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        let bytes: Vec<u8> = bytes.into();
        if let Ok(mut blobs) = self.blobs.write() {
            blobs.insert(name.into(), Arc::from(bytes));
        }
    }

    pub fn set_fault(&self, fault: Option<Fault>) {
        if let Ok(mut settings) = self.settings.write() {
            settings.fault = fault;
        }
    }

    /// Sleep this long before every 4 KiB chunk, to stretch transfers out in tests.
    pub fn set_chunk_delay(&self, delay: Option<Duration>) {
        if let Ok(mut settings) = self.settings.write() {
            settings.chunk_delay = delay;
        }
    }

    /// Number of `retrieve` calls so far, successful or not.
    pub fn retrievals(&self) -> usize {
        self.retrievals.load(Ordering::SeqCst)
    }

    fn settings(&self) -> (Option<Fault>, Option<Duration>) {
        self.settings
            .read()
            .map(|s| (s.fault, s.chunk_delay))
            .unwrap_or((None, None))
    }
}

impl RemoteArchive for MemoryArchive {
    fn retrieve(&self, blob_name: &str) -> ArchiveResult<BlobReader> {
        self.retrievals.fetch_add(1, Ordering::SeqCst);
        let (fault, chunk_delay) = self.settings();

        match fault {
            Some(Fault::Unreachable) => {
                return Err(ArchiveError::Connect {
                    endpoint: self.describe(),
                    reason: "connection refused".to_string(),
                });
            }
            Some(Fault::RejectLogin) => {
                return Err(ArchiveError::Auth {
                    endpoint: self.describe(),
                    user: "memory".to_string(),
                    reason: "530 login incorrect".to_string(),
                });
            }
            _ => {}
        }

        let bytes = self
            .blobs
            .read()
            .ok()
            .and_then(|blobs| blobs.get(blob_name).cloned())
            .ok_or_else(|| ArchiveError::NotFound {
                blob: blob_name.to_string(),
            })?;

        debug!(blob = blob_name, len = bytes.len(), "memory_archive_retrieve");
        let break_after = match fault {
            Some(Fault::BreakAfter(limit)) => Some(limit),
            _ => None,
        };
        Ok(Box::new(MemoryBlob {
            bytes,
            pos: 0,
            break_after,
            chunk_delay,
        }))
    }

    fn describe(&self) -> String {
        "memory://archive".to_string()
    }
}

const CHUNK: usize = 4096;

struct MemoryBlob {
    bytes: Arc<[u8]>,
    pos: usize,
    break_after: Option<usize>,
    chunk_delay: Option<Duration>,
}

impl Read for MemoryBlob {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if let Some(limit) = self.break_after {
            if self.pos >= limit {
                return Err(io::Error::new(
                    io::ErrorKind::ConnectionReset,
                    "simulated transfer failure",
                ));
            }
        }
        if self.pos >= self.bytes.len() {
            return Ok(0);
        }
        if let Some(delay) = self.chunk_delay {
            thread::sleep(delay);
        }

        let mut end = (self.pos + CHUNK.min(buf.len())).min(self.bytes.len());
        if let Some(limit) = self.break_after {
            end = end.min(limit.max(self.pos + 1));
        }
        let n = end - self.pos;
        buf[..n].copy_from_slice(&self.bytes[self.pos..end]);
        self.pos = end;
        Ok(n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(mut reader: BlobReader) -> io::Result<Vec<u8>> {
        let mut out = Vec::new();
        reader.read_to_end(&mut out)?;
        Ok(out)
    }

    #[test]
    fn serves_stored_blob_in_chunks() {
        let archive = MemoryArchive::new();
        let payload: Vec<u8> = (0..10_000u32).map(|i| (i % 251) as u8).collect();
        archive.insert("big.pdf", payload.clone());

        let bytes = drain(archive.retrieve("big.pdf").unwrap()).unwrap();
        assert_eq!(bytes, payload);
        assert_eq!(archive.retrievals(), 1);
    }

    #[test]
    fn missing_blob_is_not_found() {
        let archive = MemoryArchive::new();
        let err = archive.retrieve("ghost.pdf").err().unwrap();
        assert!(err.is_not_found());
        assert_eq!(archive.retrievals(), 1);
    }

    #[test]
    fn unreachable_fault_fails_at_connect() {
        let archive = MemoryArchive::new();
        archive.insert("cert.pdf", b"pdf".to_vec());
        archive.set_fault(Some(Fault::Unreachable));

        let err = archive.retrieve("cert.pdf").err().unwrap();
        assert_eq!(err.stage(), "connect");
    }

    #[test]
    fn break_after_interrupts_stream() {
        let archive = MemoryArchive::new();
        archive.insert("cert.pdf", vec![7u8; 9000]);
        archive.set_fault(Some(Fault::BreakAfter(5000)));

        let err = drain(archive.retrieve("cert.pdf").unwrap()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::ConnectionReset);
    }
}
