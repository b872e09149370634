//! Determinism tests: barcode output and re-resolution are pure functions
//! of their inputs.

use std::fs;
use std::sync::Arc;

use docvault::{
    DocumentKey, DocumentKind, DocumentResolver, LABEL_SIZE, MemoryArchive, Origin, encode,
    rasterize, render_png,
};

#[test]
fn barcode_png_is_bit_identical() {
    let first = render_png("S-2024-0042").unwrap();
    let second = render_png("S-2024-0042").unwrap();
    assert_eq!(first, second);
}

#[test]
fn barcode_raster_is_fixed_size() {
    let modules = encode("S-1").unwrap();
    let raster = rasterize(&modules, LABEL_SIZE, LABEL_SIZE).unwrap();
    assert_eq!(raster.dimensions(), (200, 200));

    // Every row is the same: a linear barcode has no vertical structure.
    let top: Vec<u8> = (0..LABEL_SIZE).map(|x| raster.get_pixel(x, 0)[0]).collect();
    let bottom: Vec<u8> = (0..LABEL_SIZE)
        .map(|x| raster.get_pixel(x, LABEL_SIZE - 1)[0])
        .collect();
    assert_eq!(top, bottom);
}

#[test]
fn different_keys_give_different_labels() {
    assert_ne!(render_png("S-1").unwrap(), render_png("S-2").unwrap());
}

#[test]
fn re_resolution_is_byte_identical_without_second_fetch() {
    let dir = tempfile::tempdir().unwrap();
    let archive = Arc::new(MemoryArchive::new());
    archive.insert("cert-9.pdf", b"%PDF-1.7 immutable".to_vec());
    let resolver = DocumentResolver::new(dir.path(), archive.clone());
    let key = DocumentKey::new("cert-9").unwrap();

    let first = resolver
        .resolve_blocking(&key, DocumentKind::Attestation)
        .unwrap();
    let first_bytes = fs::read(&first.path).unwrap();

    let second = resolver
        .resolve_blocking(&key, DocumentKind::Attestation)
        .unwrap();
    let second_bytes = fs::read(&second.path).unwrap();

    assert_eq!(first.origin, Origin::Archive);
    assert_eq!(second.origin, Origin::Cache);
    assert_eq!(first_bytes, second_bytes);
    assert_eq!(archive.retrievals(), 1);
}
