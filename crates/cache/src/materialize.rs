use std::fs::File;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{CacheError, CacheResult};

const COPY_BUF: usize = 64 * 1024;

/// A file published under its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Materialized {
    pub path: PathBuf,
    pub bytes: u64,
}

/// Write `source` to `cache_dir/final_name` via temp-file-then-rename.
///
/// The temp file lives in `cache_dir` itself so the rename never crosses a
/// filesystem. On any failure the temp file is removed and the final name is
/// left untouched. Concurrent calls for the same name each write their own
/// temp file; the last rename wins.
pub fn materialize(
    cache_dir: &Path,
    final_name: &str,
    source: &mut dyn Read,
) -> CacheResult<Materialized> {
    let final_path = cache_dir.join(final_name);
    let write_err = |source: io::Error| CacheError::Write {
        path: final_path.clone(),
        source,
    };

    let mut tmp = tempfile::Builder::new()
        .prefix(&format!(".{final_name}."))
        .suffix(".part")
        .tempfile_in(cache_dir)
        .map_err(write_err)?;
    debug!(temp = %tmp.path().display(), target = %final_path.display(), "materialize_start");

    let bytes = copy_stream(source, tmp.as_file_mut(), final_name, &final_path)?;
    tmp.as_file().sync_all().map_err(write_err)?;

    tmp.persist(&final_path)
        .map_err(|err| write_err(err.error))?;
    debug!(target = %final_path.display(), bytes, "materialize_published");

    Ok(Materialized {
        path: final_path,
        bytes,
    })
}

/// `io::copy`, except read and write failures are reported differently.
fn copy_stream(
    source: &mut dyn Read,
    sink: &mut File,
    name: &str,
    final_path: &Path,
) -> CacheResult<u64> {
    let mut buf = vec![0u8; COPY_BUF];
    let mut total = 0u64;
    loop {
        let n = match source.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(CacheError::Source {
                    name: name.to_string(),
                    source,
                })
            }
        };
        sink.write_all(&buf[..n]).map_err(|source| CacheError::Write {
            path: final_path.to_path_buf(),
            source,
        })?;
        total += n as u64;
    }
    Ok(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Cursor;

    struct BrokenReader {
        served: bool,
    }

    impl Read for BrokenReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.served {
                return Err(io::Error::new(io::ErrorKind::ConnectionReset, "peer went away"));
            }
            self.served = true;
            buf[..4].copy_from_slice(b"%PDF");
            Ok(4)
        }
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn publishes_complete_file() {
        let dir = tempfile::tempdir().unwrap();
        let payload = vec![42u8; 200_000];

        let out = materialize(dir.path(), "cert.pdf", &mut Cursor::new(payload.clone())).unwrap();

        assert_eq!(out.path, dir.path().join("cert.pdf"));
        assert_eq!(out.bytes, payload.len() as u64);
        assert_eq!(fs::read(&out.path).unwrap(), payload);
        assert_eq!(leftovers(dir.path()), vec!["cert.pdf".to_string()]);
    }

    #[test]
    fn broken_source_leaves_no_file_behind() {
        let dir = tempfile::tempdir().unwrap();

        let err = materialize(dir.path(), "cert.pdf", &mut BrokenReader { served: false })
            .unwrap_err();

        assert!(matches!(err, CacheError::Source { .. }), "unexpected: {err}");
        assert!(!dir.path().join("cert.pdf").exists());
        assert!(leftovers(dir.path()).is_empty());
    }

    #[test]
    fn missing_directory_is_write_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("does-not-exist");

        let err = materialize(&gone, "cert.pdf", &mut Cursor::new(b"pdf".to_vec())).unwrap_err();
        assert!(matches!(err, CacheError::Write { .. }), "unexpected: {err}");
    }

    #[test]
    fn second_write_replaces_first() {
        let dir = tempfile::tempdir().unwrap();
        materialize(dir.path(), "label.png", &mut Cursor::new(b"one".to_vec())).unwrap();
        materialize(dir.path(), "label.png", &mut Cursor::new(b"two".to_vec())).unwrap();

        assert_eq!(fs::read(dir.path().join("label.png")).unwrap(), b"two");
        assert_eq!(leftovers(dir.path()).len(), 1);
    }
}
