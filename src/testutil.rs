//! Fixtures shared by the module tests.

use std::fs;
use std::path::Path;

use little_exif::exif_tag::ExifTag;
use little_exif::metadata::Metadata;

/// Minimal valid JPEG with no EXIF data (SOI + APP0 JFIF + EOI).
pub fn minimal_jpeg() -> Vec<u8> {
    vec![
        0xFF, 0xD8, // SOI
        0xFF, 0xE0, // APP0 marker
        0x00, 0x10, // Length: 16
        0x4A, 0x46, 0x49, 0x46, 0x00, // "JFIF\0"
        0x01, 0x01, // Version 1.1
        0x00, // Aspect ratio units: none
        0x00, 0x01, // X density: 1
        0x00, 0x01, // Y density: 1
        0x00, 0x00, // No thumbnail
        0xFF, 0xD9, // EOI
    ]
}

pub fn jpeg_without_exif(path: &Path) {
    fs::write(path, minimal_jpeg()).unwrap();
}

/// Write a minimal JPEG carrying the given EXIF tags.
pub fn jpeg_with_exif(path: &Path, tags: Vec<ExifTag>) {
    fs::write(path, minimal_jpeg()).unwrap();
    let mut meta = Metadata::new();
    for tag in tags {
        meta.set_tag(tag);
    }
    meta.write_to_file(path).unwrap();
}
