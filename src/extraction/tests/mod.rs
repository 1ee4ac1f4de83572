use crate::error::{Error, ExtractionError};
use crate::extraction::shared::{
    collect_extracted_files, sanitize_entry_path, validate_extracted_paths,
};
use crate::extraction::*;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Create a valid ZIP archive containing the given files
fn create_zip_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut writer = ::zip::ZipWriter::new(file);
    let options =
        ::zip::write::FileOptions::default().compression_method(::zip::CompressionMethod::Stored);
    for (name, content) in files {
        writer.start_file(*name, options).unwrap();
        std::io::Write::write_all(&mut writer, content).unwrap();
    }
    writer.finish().unwrap();
}

/// Create a valid TAR archive containing the given files
fn create_tar_archive(archive_path: &Path, files: &[(&str, &[u8])]) {
    let file = std::fs::File::create(archive_path).unwrap();
    let mut builder = ::tar::Builder::new(file);
    for (name, content) in files {
        let mut header = ::tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, *content).unwrap();
    }
    builder.finish().unwrap();
}

/// Create a valid 7z archive from a source directory using sevenz_rust
fn create_7z_archive(archive_path: &Path, source_dir: &Path) {
    sevenz_rust::compress_to_path(source_dir, archive_path).unwrap();
}

fn assert_extraction_failed(result: crate::error::Result<Vec<PathBuf>>, expected_archive: &Path) {
    match result {
        Err(Error::Extraction(ExtractionError::Failed { archive, reason })) => {
            assert_eq!(archive, expected_archive);
            assert!(!reason.is_empty(), "reason should describe what went wrong");
        }
        other => panic!("expected ExtractionFailed, got: {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Dispatcher
// ---------------------------------------------------------------------------

#[tokio::test]
async fn extract_archive_rejects_unknown_suffix() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("data.bin");
    std::fs::write(&archive, b"whatever").unwrap();

    let result = extract_archive(&archive, &temp_dir.path().join("out")).await;
    match result {
        Err(Error::Extraction(ExtractionError::UnsupportedFormat { archive: a })) => {
            assert_eq!(a, archive);
        }
        other => panic!("expected UnsupportedFormat, got: {other:?}"),
    }
}

#[tokio::test]
async fn extract_archive_suffix_match_is_case_sensitive() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("UPPER.ZIP");
    create_zip_archive(&archive, &[("a.txt", b"a")]);

    let result = extract_archive(&archive, &temp_dir.path().join("out")).await;
    assert!(matches!(
        result,
        Err(Error::Extraction(ExtractionError::UnsupportedFormat { .. }))
    ));
}

#[tokio::test]
async fn extract_archive_dispatches_zip() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("archive.zip");
    create_zip_archive(&archive, &[("somestuff.txt", b"some stuff\n")]);

    let dest = temp_dir.path().join("out");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(files, vec![dest.join("somestuff.txt")]);
    assert_eq!(
        std::fs::read_to_string(dest.join("somestuff.txt")).unwrap(),
        "some stuff\n"
    );
}

#[tokio::test]
async fn extract_archive_dispatches_tar() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("archive.tar");
    create_tar_archive(&archive, &[("dir/inner.txt", b"inner")]);

    let dest = temp_dir.path().join("out");
    let files = extract_archive(&archive, &dest).await.unwrap();

    assert_eq!(files, vec![dest.join("dir").join("inner.txt")]);
}

#[tokio::test]
async fn format_decoder_implements_archive_decoder() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("archive.zip");
    create_zip_archive(&archive, &[("x.txt", b"x")]);

    let decoder: std::sync::Arc<dyn ArchiveDecoder> = std::sync::Arc::new(FormatDecoder);
    let dest = temp_dir.path().join("out");
    let files = decoder.decode(&archive, &dest).await.unwrap();
    assert_eq!(files.len(), 1);
}

// ---------------------------------------------------------------------------
// ZIP
// ---------------------------------------------------------------------------

#[test]
fn zip_try_extract_extracts_nested_tree() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("multi.zip");
    create_zip_archive(
        &archive,
        &[
            ("a", b"alpha"),
            ("b/c", b"gamma"),
            ("b/d/e.txt", b"epsilon"),
        ],
    );

    let dest = temp_dir.path().join("out");
    let mut files = ZipExtractor::try_extract(&archive, &dest).unwrap();
    files.sort();

    assert_eq!(
        files,
        vec![
            dest.join("a"),
            dest.join("b").join("c"),
            dest.join("b").join("d").join("e.txt"),
        ]
    );
    assert_eq!(std::fs::read(dest.join("b").join("c")).unwrap(), b"gamma");
}

#[test]
fn zip_try_extract_creates_missing_destination() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("a.zip");
    create_zip_archive(&archive, &[("f", b"1")]);

    let dest = temp_dir.path().join("deep").join("er").join("out");
    ZipExtractor::try_extract(&archive, &dest).unwrap();
    assert!(dest.join("f").is_file());
}

#[test]
fn zip_try_extract_skips_traversal_entries() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("evil.zip");
    create_zip_archive(&archive, &[("../escape.txt", b"bad"), ("ok.txt", b"good")]);

    let dest = temp_dir.path().join("out");
    let files = ZipExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("ok.txt")]);
    assert!(!temp_dir.path().join("escape.txt").exists());
}

#[test]
fn zip_try_extract_nonexistent_archive_returns_io_error() {
    let temp_dir = TempDir::new().unwrap();
    let result = ZipExtractor::try_extract(
        Path::new("/no/such/archive.zip"),
        &temp_dir.path().join("out"),
    );
    assert!(matches!(result, Err(Error::Io(_))), "got {result:?}");
}

#[test]
fn zip_try_extract_corrupt_archive_returns_extraction_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("corrupt.zip");
    std::fs::write(&archive, b"PK but not really a zip").unwrap();

    let result = ZipExtractor::try_extract(&archive, &temp_dir.path().join("out"));
    assert_extraction_failed(result, &archive);
}

// ---------------------------------------------------------------------------
// TAR
// ---------------------------------------------------------------------------

#[test]
fn tar_try_extract_preserves_content() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("bundle.tar");
    create_tar_archive(
        &archive,
        &[("readme.md", b"# hi"), ("bin/data.bin", b"\x00\x01\x02")],
    );

    let dest = temp_dir.path().join("out");
    let mut files = TarExtractor::try_extract(&archive, &dest).unwrap();
    files.sort();

    assert_eq!(
        files,
        vec![dest.join("bin").join("data.bin"), dest.join("readme.md")]
    );
    assert_eq!(
        std::fs::read(dest.join("bin").join("data.bin")).unwrap(),
        b"\x00\x01\x02"
    );
}

#[test]
fn tar_try_extract_corrupt_archive_returns_extraction_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("corrupt.tar");
    // A full 512-byte block of garbage: the header checksum cannot match
    std::fs::write(&archive, vec![0x41u8; 512]).unwrap();

    let result = TarExtractor::try_extract(&archive, &temp_dir.path().join("out"));
    assert_extraction_failed(result, &archive);
}

// ---------------------------------------------------------------------------
// RAR
// ---------------------------------------------------------------------------

/// Single stored entry `somestuff.txt` containing "some stuff\n"
const SOMESTUFF_RAR: &[u8] = include_bytes!("fixtures/somestuff.rar");

#[test]
fn rar_try_extract_extracts_real_archive() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("somestuff.rar");
    std::fs::write(&archive, SOMESTUFF_RAR).unwrap();

    let dest = temp_dir.path().join("out");
    let files = RarExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("somestuff.txt")]);
    assert_eq!(
        std::fs::read(dest.join("somestuff.txt")).unwrap(),
        b"some stuff\n"
    );
}

#[tokio::test]
async fn format_decoder_dispatches_rar() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("somestuff.rar");
    std::fs::write(&archive, SOMESTUFF_RAR).unwrap();

    let dest = temp_dir.path().join("out");
    let files = FormatDecoder.decode(&archive, &dest).await.unwrap();

    assert_eq!(files, vec![dest.join("somestuff.txt")]);
}

#[test]
fn rar_try_extract_corrupt_archive_returns_extraction_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("corrupt.rar");
    std::fs::write(&archive, b"Rar! but definitely not a rar archive").unwrap();

    let result = RarExtractor::try_extract(&archive, &temp_dir.path().join("out"));
    assert_extraction_failed(result, &archive);
}

#[test]
fn rar_try_extract_missing_archive_fails() {
    let temp_dir = TempDir::new().unwrap();
    let result = RarExtractor::try_extract(
        Path::new("/no/such/archive.rar"),
        &temp_dir.path().join("out"),
    );
    assert!(result.is_err());
}

// ---------------------------------------------------------------------------
// 7z
// ---------------------------------------------------------------------------

#[test]
fn sevenz_try_extract_extracts_real_archive() {
    let temp_dir = TempDir::new().unwrap();

    let src_dir = temp_dir.path().join("source");
    std::fs::create_dir_all(&src_dir).unwrap();
    std::fs::write(src_dir.join("hello.txt"), b"Hello, world!").unwrap();
    std::fs::write(src_dir.join("data.bin"), b"\x00\x01\x02\x03").unwrap();

    let archive_path = temp_dir.path().join("test.7z");
    create_7z_archive(&archive_path, &src_dir);

    let dest = temp_dir.path().join("out");
    let files = SevenZipExtractor::try_extract(&archive_path, &dest).unwrap();

    assert_eq!(files.len(), 2, "should extract exactly 2 files");
    let hello_file = files.iter().find(|p| p.ends_with("hello.txt")).unwrap();
    assert_eq!(std::fs::read_to_string(hello_file).unwrap(), "Hello, world!");
}

#[test]
fn sevenz_try_extract_corrupt_archive_returns_extraction_failed() {
    let temp_dir = TempDir::new().unwrap();
    let archive_path = temp_dir.path().join("corrupt.7z");
    std::fs::write(&archive_path, b"this is not a valid 7z archive").unwrap();

    let result = SevenZipExtractor::try_extract(&archive_path, &temp_dir.path().join("out"));
    assert_extraction_failed(result, &archive_path);
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

#[test]
fn sanitize_entry_path_strips_traversal_and_root() {
    assert_eq!(sanitize_entry_path(Path::new("../../etc/passwd")), None);
    assert_eq!(sanitize_entry_path(Path::new("a/../../b")), None);
    assert_eq!(
        sanitize_entry_path(Path::new("/abs/file")),
        Some(PathBuf::from("abs/file"))
    );
    assert_eq!(
        sanitize_entry_path(Path::new("./a/./b")),
        Some(PathBuf::from("a/b"))
    );
    assert_eq!(sanitize_entry_path(Path::new("..")), None);
}

#[test]
fn sanitize_entry_path_resolves_inner_parent_dirs() {
    assert_eq!(
        sanitize_entry_path(Path::new("a/../b.txt")),
        Some(PathBuf::from("b.txt"))
    );
    assert_eq!(
        sanitize_entry_path(Path::new("a/b/../../c/d")),
        Some(PathBuf::from("c/d"))
    );
    assert_eq!(sanitize_entry_path(Path::new("a/..")), None);
}

#[test]
fn zip_try_extract_resolves_inner_parent_dir() {
    let temp_dir = TempDir::new().unwrap();
    let archive = temp_dir.path().join("dotdot.zip");
    create_zip_archive(&archive, &[("a/../b.txt", b"resolved")]);

    let dest = temp_dir.path().join("out");
    let files = ZipExtractor::try_extract(&archive, &dest).unwrap();

    assert_eq!(files, vec![dest.join("b.txt")]);
    assert_eq!(std::fs::read(dest.join("b.txt")).unwrap(), b"resolved");
    assert!(!dest.join("a").join("b.txt").exists());
}

#[test]
fn collect_extracted_files_returns_only_files_in_name_order() {
    let temp_dir = TempDir::new().unwrap();
    let sub = temp_dir.path().join("subdir");
    std::fs::create_dir_all(&sub).unwrap();
    std::fs::write(temp_dir.path().join("b.txt"), b"b").unwrap();
    std::fs::write(temp_dir.path().join("a.txt"), b"a").unwrap();
    std::fs::write(sub.join("nested.txt"), b"nested").unwrap();

    let files = collect_extracted_files(temp_dir.path()).unwrap();
    assert_eq!(
        files,
        vec![
            temp_dir.path().join("a.txt"),
            temp_dir.path().join("b.txt"),
            sub.join("nested.txt"),
        ]
    );
}

#[test]
fn validate_extracted_paths_accepts_normal_files() {
    let temp_dir = TempDir::new().unwrap();
    let sub = temp_dir.path().join("subdir");
    std::fs::create_dir_all(&sub).unwrap();
    std::fs::write(sub.join("file.txt"), b"data").unwrap();

    validate_extracted_paths(Path::new("a.7z"), temp_dir.path()).unwrap();
}

#[cfg(unix)]
#[test]
fn validate_extracted_paths_rejects_symlink_traversal() {
    let temp_dir = TempDir::new().unwrap();
    let outside = TempDir::new().unwrap();
    let outside_file = outside.path().join("secret.txt");
    std::fs::write(&outside_file, b"secret").unwrap();
    std::os::unix::fs::symlink(&outside_file, temp_dir.path().join("escape_link")).unwrap();

    match validate_extracted_paths(Path::new("a.7z"), temp_dir.path()) {
        Err(Error::Extraction(ExtractionError::Failed { reason, .. })) => {
            assert!(reason.contains("path traversal"), "got: {reason}");
        }
        other => panic!("expected ExtractionFailed, got: {other:?}"),
    }
}
