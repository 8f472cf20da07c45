//! Archive creation (SPEC_FULL.md §4.1 steps 1-2): permission normalization
//! followed by a single tar archive rooted at the source's basename.

use std::fs::{self, File};
use std::os::unix::fs::PermissionsExt as _;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

const DIR_MODE: u32 = 0o775;
const FILE_MODE: u32 = 0o664;

/// Recursively set directory entries to `0775` and file entries to `0664`,
/// including the source root itself.
pub fn normalize_source_permissions(source: &Path) -> FsOpsResult<()> {
    let metadata =
        fs::metadata(source).map_err(|err| FsOpsError::io("stat", source, err))?;
    set_mode(source, if metadata.is_dir() { DIR_MODE } else { FILE_MODE })?;

    if !metadata.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(source).min_depth(1) {
        let entry = entry.map_err(|err| FsOpsError::walkdir("normalize permissions", source, err))?;
        let mode = if entry.file_type().is_dir() {
            DIR_MODE
        } else {
            FILE_MODE
        };
        set_mode(entry.path(), mode)?;
    }
    Ok(())
}

fn set_mode(path: &Path, mode: u32) -> FsOpsResult<()> {
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
        .map_err(|err| FsOpsError::io("chmod", path, err))
}

/// Create `<output_dir>/<basename>.tar` containing `source` stored under
/// its own basename (relative paths only, matching §4.1 step 2). Returns
/// the archive path and its total byte size.
pub fn create_archive(source: &Path, output_dir: &Path) -> FsOpsResult<(PathBuf, u64)> {
    if !source.exists() {
        return Err(FsOpsError::TorrentDoesNotExist {
            path: source.to_path_buf(),
        });
    }

    let basename = source
        .file_name()
        .ok_or_else(|| FsOpsError::InvalidPathSpec {
            reason: "source path has no basename".to_string(),
        })?;
    let archive_path = output_dir.join(basename).with_extension("tar");

    let file = File::create(&archive_path)
        .map_err(|err| FsOpsError::io("create archive", &archive_path, err))?;
    let mut builder = tar::Builder::new(file);

    let metadata =
        fs::metadata(source).map_err(|err| FsOpsError::io("stat", source, err))?;
    if metadata.is_dir() {
        builder
            .append_dir_all(basename, source)
            .map_err(|err| FsOpsError::archive("append directory", source, err))?;
    } else {
        let mut input =
            File::open(source).map_err(|err| FsOpsError::io("open source", source, err))?;
        builder
            .append_file(basename, &mut input)
            .map_err(|err| FsOpsError::archive("append file", source, err))?;
    }
    builder
        .into_inner()
        .map_err(|err| FsOpsError::archive("finish archive", &archive_path, err))?;

    let archive_size = fs::metadata(&archive_path)
        .map_err(|err| FsOpsError::io("stat archive", &archive_path, err))?
        .len();

    Ok((archive_path, archive_size))
}

/// Unpack `archive_path` (a joined chunk archive) into `output_dir`,
/// preserving the relative paths stored by [`create_archive`].
pub fn extract_archive(archive_path: &Path, output_dir: &Path) -> FsOpsResult<()> {
    let file = File::open(archive_path).map_err(|err| FsOpsError::io("open archive", archive_path, err))?;
    let mut archive = tar::Archive::new(file);
    archive
        .unpack(output_dir)
        .map_err(|err| FsOpsError::archive("unpack", archive_path, err))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn round_trips_a_directory_through_extract() {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = dir.path().join("MyTorrent");
        fs::create_dir_all(&source_dir).unwrap();
        fs::write(source_dir.join("a.txt"), b"hello").unwrap();

        let (archive_path, _size) = create_archive(&source_dir, dir.path()).unwrap();
        let output_dir = dir.path().join("out");
        fs::create_dir_all(&output_dir).unwrap();
        extract_archive(&archive_path, &output_dir).unwrap();

        assert_eq!(fs::read(output_dir.join("MyTorrent/a.txt")).unwrap(), b"hello");
    }

    #[test]
    fn missing_source_is_torrent_does_not_exist() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        let err = create_archive(&missing, dir.path()).unwrap_err();
        assert!(matches!(err, FsOpsError::TorrentDoesNotExist { .. }));
    }

    #[test]
    fn archives_a_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("File1.bin");
        let mut f = File::create(&source).unwrap();
        f.write_all(&vec![0_u8; 1024]).unwrap();
        drop(f);

        let (archive_path, size) = create_archive(&source, dir.path()).unwrap();
        assert!(archive_path.ends_with("File1.bin.tar"));
        assert!(size > 1024, "tar adds header overhead");
    }

    #[test]
    fn archives_a_directory_tree_under_its_basename() {
        let dir = tempfile::tempdir().unwrap();
        let source_dir = dir.path().join("MyTorrent");
        fs::create_dir_all(source_dir.join("sub")).unwrap();
        fs::write(source_dir.join("a.txt"), b"hello").unwrap();
        fs::write(source_dir.join("sub/b.txt"), b"world").unwrap();

        let (archive_path, _size) = create_archive(&source_dir, dir.path()).unwrap();
        let file = File::open(&archive_path).unwrap();
        let mut archive = tar::Archive::new(file);
        let names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|entry| entry.unwrap().path().unwrap().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with("MyTorrent/")));
        assert!(!names.iter().any(|n| n.starts_with('/')));
    }
}
