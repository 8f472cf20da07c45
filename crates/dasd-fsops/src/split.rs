//! Chunk-size computation and the split/join pair (SPEC_FULL.md §4.1, §9).
//!
//! The chunk-sizing formula has two divergent conventions in the source
//! material; this implementation divides by `max_files - 1`, the
//! convention that reproduces the exact boundary numbers documented in
//! SPEC_FULL.md §8 (see the boundary tests below).

use std::fs::{self, File};
use std::io::{self, Read, Write as _};
use std::path::{Path, PathBuf};

use crate::error::{FsOpsError, FsOpsResult};
use crate::hash::HashingWriter;

/// Default read/write block size used while streaming the archive.
pub const DEFAULT_IO_BLOCK_SIZE: usize = 16 * 1024;

/// One emitted package file: its name (relative to the torrent's package
/// files directory), size, and SHA-256, all computed in the same pass that
/// wrote it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageFileDraft {
    /// Chunk filename, e.g. `MyTorrent.tar.0000`.
    pub filename: String,
    /// Chunk size in bytes.
    pub filesize: u64,
    /// Lowercase hex SHA-256 of the chunk's bytes.
    pub sha256: String,
}

/// Compute the effective chunk size for an archive of `archive_size` bytes
/// given a minimum chunk size and a maximum chunk count.
///
/// `chunk = min_size` unless `archive_size / min_size > max_files`, in
/// which case `chunk = archive_size / (max_files - 1)` (integer division).
/// `max_files` must be `>= 2`; an archive of size `0` yields a chunk size
/// of `0`, which callers must treat as "emit nothing" rather than a
/// division-by-zero loop (see §9).
#[must_use]
pub fn effective_chunk_size(archive_size: u64, min_size: u64, max_files: u32) -> u64 {
    if min_size == 0 || max_files < 2 {
        return min_size;
    }
    if archive_size / min_size > u64::from(max_files) {
        archive_size / u64::from(max_files - 1)
    } else {
        min_size
    }
}

/// Split `archive_path` into `chunk_size`-byte files named
/// `<basename>.tar.%04d` under `output_dir`, deleting the archive
/// afterward. Returns the drafts in emission order (ascending index, which
/// is also filename order).
pub fn split_archive(
    archive_path: &Path,
    output_dir: &Path,
    basename: &str,
    chunk_size: u64,
    max_package_files: u32,
    io_block_size: usize,
) -> FsOpsResult<Vec<PackageFileDraft>> {
    if chunk_size == 0 {
        fs::remove_file(archive_path).map_err(|err| FsOpsError::io("remove archive", archive_path, err))?;
        return Ok(Vec::new());
    }

    let mut input =
        File::open(archive_path).map_err(|err| FsOpsError::io("open archive", archive_path, err))?;
    let mut drafts = Vec::new();
    let mut part_num: u32 = 0;
    let mut read_buf = vec![0_u8; io_block_size];

    'parts: loop {
        if part_num >= max_package_files {
            return Err(FsOpsError::TooManyChunks { max_package_files });
        }

        let chunk_filename = format!("{basename}.tar.{part_num:04}");
        let chunk_path = output_dir.join(&chunk_filename);
        let out_file = File::create(&chunk_path)
            .map_err(|err| FsOpsError::io("create chunk", &chunk_path, err))?;
        let mut writer = HashingWriter::new(out_file);

        let mut remaining = chunk_size;
        let mut wrote_any = false;
        while remaining > 0 {
            let want = remaining.min(read_buf.len() as u64) as usize;
            let read = input
                .read(&mut read_buf[..want])
                .map_err(|err| FsOpsError::io("read archive", archive_path, err))?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&read_buf[..read])
                .map_err(|err| FsOpsError::io("write chunk", &chunk_path, err))?;
            remaining -= read as u64;
            wrote_any = true;
        }

        let (_file, sha256) = writer.finish();
        let filesize = chunk_size - remaining;

        if !wrote_any || filesize == 0 {
            fs::remove_file(&chunk_path)
                .map_err(|err| FsOpsError::io("remove empty chunk", &chunk_path, err))?;
            break 'parts;
        }

        drafts.push(PackageFileDraft {
            filename: chunk_filename,
            filesize,
            sha256,
        });
        part_num += 1;

        if filesize < chunk_size {
            // Short read means we hit EOF mid-chunk; this was the last chunk.
            break 'parts;
        }
    }

    drop(input);
    fs::remove_file(archive_path).map_err(|err| FsOpsError::io("remove archive", archive_path, err))?;
    Ok(drafts)
}

/// Join `filenames` (already sorted ascending by the caller, per §5
/// "chunks must be joined in ascending filename order") from `source_dir`
/// into `output_path`, in order.
pub fn join_files(output_path: &Path, source_dir: &Path, filenames: &[String]) -> FsOpsResult<()> {
    let mut output =
        File::create(output_path).map_err(|err| FsOpsError::io("create joined archive", output_path, err))?;
    for filename in filenames {
        let part_path = source_dir.join(filename);
        let mut part =
            File::open(&part_path).map_err(|err| FsOpsError::io("open chunk", &part_path, err))?;
        io::copy(&mut part, &mut output)
            .map_err(|err| FsOpsError::io("append chunk", output_path, err))?;
    }
    Ok(())
}

#[must_use]
pub(crate) fn sorted_filenames(mut filenames: Vec<String>) -> Vec<String> {
    filenames.sort();
    filenames
}

/// Convenience path helper: `<output_dir>/<basename>.tar`.
#[must_use]
pub fn archive_path_for(output_dir: &Path, basename: &str) -> PathBuf {
    output_dir.join(format!("{basename}.tar"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_boundary_examples() {
        const MB: u64 = 1024 * 1024;
        const GB: u64 = 1024 * MB;
        const KB: u64 = 1024;

        assert_eq!(effective_chunk_size(123 * MB, 10 * MB, 1000), 10 * MB);
        assert_eq!(effective_chunk_size(270 * GB, 10 * MB, 1000), 290_200_492);
        assert_eq!(
            effective_chunk_size(12 * GB + 34 * MB + 56 * KB, 10 * MB, 1000),
            12_933_544
        );
    }

    #[test]
    fn zero_size_archive_yields_zero_chunk_size() {
        assert_eq!(effective_chunk_size(0, 10 * 1024 * 1024, 1000), 0);
    }

    #[test]
    fn split_123kb_with_min_10kb_leaves_3kb_tail() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("t.tar");
        let total = 123 * 1024_usize;
        fs::write(&archive_path, vec![7_u8; total]).unwrap();

        let chunk = effective_chunk_size(total as u64, 10 * 1024, 1000);
        let drafts =
            split_archive(&archive_path, dir.path(), "t", chunk, 1000, DEFAULT_IO_BLOCK_SIZE).unwrap();

        assert_eq!(drafts.len(), 13);
        assert_eq!(drafts.last().unwrap().filesize, 3 * 1024);
        assert!(!archive_path.exists());
    }

    #[test]
    fn split_with_max_5_on_exact_multiple_yields_five_equal_chunks() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("t.tar");
        let total: u64 = 157_440;
        fs::write(&archive_path, vec![1_u8; total as usize]).unwrap();

        let chunk = effective_chunk_size(total, 10 * 1024, 5);
        assert_eq!(chunk, 31_488);
        let drafts = split_archive(&archive_path, dir.path(), "t", chunk, 5, DEFAULT_IO_BLOCK_SIZE).unwrap();
        assert_eq!(drafts.len(), 5);
        assert!(drafts.iter().all(|d| d.filesize == 31_488));
    }

    #[test]
    fn split_with_max_6_yields_five_chunks_plus_short_tail() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("t.tar");
        let total: u64 = 125_952;
        fs::write(&archive_path, vec![2_u8; total as usize]).unwrap();

        let chunk = effective_chunk_size(total, 10 * 1024, 6);
        assert_eq!(chunk, 25_190);
        let drafts = split_archive(&archive_path, dir.path(), "t", chunk, 6, DEFAULT_IO_BLOCK_SIZE).unwrap();
        assert_eq!(drafts.len(), 6);
        assert_eq!(drafts[0].filesize, 25_190);
        assert_eq!(drafts[5].filesize, 2);
    }

    #[test]
    fn zero_chunk_size_emits_nothing_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("empty.tar");
        fs::write(&archive_path, []).unwrap();

        let drafts = split_archive(&archive_path, dir.path(), "empty", 0, 1000, DEFAULT_IO_BLOCK_SIZE).unwrap();
        assert!(drafts.is_empty());
        assert!(!archive_path.exists());
    }

    #[test]
    fn split_join_round_trips_bytes_and_hash() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("t.tar");
        let original: Vec<u8> = (0..50_000_u32).map(|i| (i % 251) as u8).collect();
        fs::write(&archive_path, &original).unwrap();
        let original_sha = crate::hash::sha256_hex(&original);

        let chunk = effective_chunk_size(original.len() as u64, 4096, 1000);
        let drafts =
            split_archive(&archive_path, dir.path(), "t", chunk, 1000, DEFAULT_IO_BLOCK_SIZE).unwrap();

        let filenames = sorted_filenames(drafts.iter().map(|d| d.filename.clone()).collect());
        let joined_path = dir.path().join("joined.tar");
        join_files(&joined_path, dir.path(), &filenames).unwrap();

        let joined = fs::read(&joined_path).unwrap();
        assert_eq!(joined, original);
        assert_eq!(crate::hash::sha256_hex(&joined), original_sha);
    }

    #[test]
    fn too_many_chunks_aborts_with_error() {
        let dir = tempfile::tempdir().unwrap();
        let archive_path = dir.path().join("t.tar");
        fs::write(&archive_path, vec![9_u8; 10_000]).unwrap();

        let err = split_archive(&archive_path, dir.path(), "t", 1, 5, DEFAULT_IO_BLOCK_SIZE).unwrap_err();
        assert!(matches!(err, FsOpsError::TooManyChunks { max_package_files: 5 }));
    }
}
