//! Error propagation through the resolver: absent documents, unreachable
//! archives, broken transfers and local write failures.

use std::fs;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::{Duration, Instant};

use docvault::{
    ArchiveConfig, ArchiveError, DocumentKey, DocumentKind, DocumentResolver, Fault,
    MemoryArchive, ResolveError, ftp_resolver,
};

fn key(raw: &str) -> DocumentKey {
    DocumentKey::new(raw).unwrap()
}

#[test]
fn ghost_key_is_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Arc::new(MemoryArchive::new());
    let resolver = DocumentResolver::new(dir.path(), archive.clone());

    let err = resolver
        .resolve_blocking(&key("ghost"), DocumentKind::Attestation)
        .unwrap_err();

    assert!(matches!(err, ResolveError::DocumentNotFound { ref key } if key == "ghost"));
    assert_eq!(archive.retrievals(), 1);
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn refused_ftp_connection_completes_within_timeout() {
    let dir = tempfile::tempdir().unwrap();
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };
    let config = ArchiveConfig::new("127.0.0.1")
        .with_port(port)
        .with_connect_timeout(Duration::from_secs(2));
    let resolver = ftp_resolver(dir.path(), config);

    let start = Instant::now();
    let err = resolver
        .resolve_blocking(&key("cert"), DocumentKind::Attestation)
        .unwrap_err();

    assert!(start.elapsed() < Duration::from_secs(3));
    match err {
        ResolveError::ArchiveUnavailable { source, .. } => {
            assert!(matches!(source, ArchiveError::Connect { .. }), "{source}");
        }
        other => panic!("unexpected: {other}"),
    }
}

#[test]
fn unresolvable_host_is_unavailable() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = ftp_resolver(dir.path(), ArchiveConfig::new("host.invalid"));

    let err = resolver
        .resolve_blocking(&key("cert"), DocumentKind::Attestation)
        .unwrap_err();
    assert!(matches!(err, ResolveError::ArchiveUnavailable { .. }), "{err}");
}

#[test]
fn transfer_failure_leaves_cache_clean_and_retry_succeeds() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Arc::new(MemoryArchive::new());
    archive.insert("flaky.pdf", vec![9u8; 50_000]);
    archive.set_fault(Some(Fault::BreakAfter(10_000)));
    let resolver = DocumentResolver::new(dir.path(), archive.clone());

    let err = resolver
        .resolve_blocking(&key("flaky"), DocumentKind::Attestation)
        .unwrap_err();
    assert!(matches!(err, ResolveError::ArchiveUnavailable { .. }), "{err}");
    assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 0);

    // No built-in retry; a fresh request after the archive recovers works.
    archive.set_fault(None);
    let doc = resolver
        .resolve_blocking(&key("flaky"), DocumentKind::Attestation)
        .unwrap();
    assert_eq!(fs::read(doc.path).unwrap().len(), 50_000);
    assert_eq!(archive.retrievals(), 2);
}

#[test]
fn local_write_failure_is_reported_as_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Arc::new(MemoryArchive::new());
    archive.insert("cert.pdf", b"%PDF".to_vec());
    let resolver = DocumentResolver::new(dir.path().join("unmounted"), archive);

    let err = resolver
        .resolve_blocking(&key("cert"), DocumentKind::Attestation)
        .unwrap_err();
    assert!(err.is_not_found(), "{err}");
}

#[test]
fn empty_key_never_reaches_resolver() {
    assert!(matches!(DocumentKey::new(""), Err(ResolveError::EmptyKey)));
}
