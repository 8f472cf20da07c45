//! Packaging pipeline orchestration (SPEC_FULL.md §4.1). Grounded on
//! `dasdremote/dasdremote/torrent_package.py`'s `TorrentPackage.create_package()`
//! from the original source: normalize -> archive -> split -> emit drafts.

use std::path::Path;

use crate::archive::{create_archive, normalize_source_permissions};
use crate::error::FsOpsResult;
use crate::split::{effective_chunk_size, split_archive, PackageFileDraft, DEFAULT_IO_BLOCK_SIZE};

/// Tunables governing how a completed torrent is packaged into chunk files.
#[derive(Debug, Clone, Copy)]
pub struct PackageOptions {
    /// Minimum chunk size in bytes, below which chunking never subdivides further.
    pub min_chunk_size: u64,
    /// Maximum number of package files a single torrent may emit.
    pub max_package_files: u32,
    /// Read/write block size used while streaming the archive into chunks.
    pub io_block_size: usize,
}

impl PackageOptions {
    /// Build options with the default IO block size.
    #[must_use]
    pub const fn new(min_chunk_size: u64, max_package_files: u32) -> Self {
        Self {
            min_chunk_size,
            max_package_files,
            io_block_size: DEFAULT_IO_BLOCK_SIZE,
        }
    }
}

/// Package `source` (a completed torrent's file or directory) into
/// size-bounded chunk files under `output_dir`, named `<basename>.tar.%04d`.
///
/// Steps, in order (§4.1):
/// 1. Normalize permissions on the source tree (`0775` dirs, `0664` files).
/// 2. Tar the source into a single archive rooted at its basename.
/// 3. Compute the effective chunk size from the archive's total size.
/// 4. Split the archive into chunks, hashing each chunk in the same pass
///    that writes it, then delete the transient archive.
pub fn create_package(
    source: &Path,
    output_dir: &Path,
    options: PackageOptions,
) -> FsOpsResult<Vec<PackageFileDraft>> {
    normalize_source_permissions(source)?;
    let (archive_path, archive_size) = create_archive(source, output_dir)?;
    tracing::debug!(archive = %archive_path.display(), archive_size, "archived torrent source");

    let basename = archive_path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string();

    let chunk_size = effective_chunk_size(archive_size, options.min_chunk_size, options.max_package_files);

    let drafts = split_archive(
        &archive_path,
        output_dir,
        &basename,
        chunk_size,
        options.max_package_files,
        options.io_block_size,
    )?;
    tracing::info!(basename, chunk_count = drafts.len(), chunk_size, "packaged torrent into chunks");
    Ok(drafts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn packages_a_directory_into_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("MyTorrent");
        fs::create_dir_all(&source).unwrap();
        fs::write(source.join("a.bin"), vec![5_u8; 30_000]).unwrap();
        fs::write(source.join("b.bin"), vec![6_u8; 30_000]).unwrap();

        let output_dir = dir.path().join("out");
        fs::create_dir_all(&output_dir).unwrap();

        let options = PackageOptions::new(10 * 1024, 1000);
        let drafts = create_package(&source, &output_dir, options).unwrap();

        assert!(!drafts.is_empty());
        for draft in &drafts {
            let path = output_dir.join(&draft.filename);
            let bytes = fs::read(&path).unwrap();
            assert_eq!(bytes.len() as u64, draft.filesize);
            assert_eq!(crate::hash::sha256_hex(&bytes), draft.sha256);
        }
    }

    #[test]
    fn missing_source_propagates_error() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("nope");
        let options = PackageOptions::new(10 * 1024, 1000);
        assert!(create_package(&source, dir.path(), options).is_err());
    }
}
