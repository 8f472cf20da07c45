//! Path manager (SPEC_FULL.md §4.4): deterministic path layout plus
//! ownership/mode enforcement, grounded on
//! `daserver/dasdaemon/managers/path_manager.py` from the original source.

use std::path::{Path, PathBuf};

use nix::unistd::{Gid, Uid};

use crate::error::{FsOpsError, FsOpsResult};
use crate::permissions::{chownmod_recursive, gid_for_group, mkdir_chownmod, uid_for_user};

/// A parsed `path,owner,group,dmode,fmode` config line.
#[derive(Debug, Clone)]
pub struct PathSpec {
    /// Base directory for this logical path.
    pub path: PathBuf,
    /// Owning user name.
    pub owner: String,
    /// Owning group name.
    pub group: String,
    /// Octal mode applied to directories.
    pub dmode: u32,
    /// Octal mode applied to files.
    pub fmode: u32,
}

impl PathSpec {
    /// Parse a single config line of the form `path,owner,group,dmode,fmode`
    /// where `dmode`/`fmode` are octal (e.g. `0775`).
    pub fn parse(line: &str) -> FsOpsResult<Self> {
        let parts: Vec<&str> = line.split(',').map(str::trim).collect();
        let [path, owner, group, dmode, fmode] = parts.as_slice() else {
            return Err(FsOpsError::InvalidPathSpec {
                reason: format!("expected 5 comma-separated fields, got {}", parts.len()),
            });
        };
        let parse_mode = |field: &str, raw: &str| -> FsOpsResult<u32> {
            u32::from_str_radix(raw, 8).map_err(|_| FsOpsError::InvalidPathSpec {
                reason: format!("{field} is not a valid octal mode: {raw}"),
            })
        };
        Ok(Self {
            path: PathBuf::from(*path),
            owner: (*owner).to_string(),
            group: (*group).to_string(),
            dmode: parse_mode("dmode", dmode)?,
            fmode: parse_mode("fmode", fmode)?,
        })
    }

    fn uid(&self) -> FsOpsResult<Uid> {
        uid_for_user(&self.owner)
    }

    fn gid(&self) -> FsOpsResult<Gid> {
        gid_for_group(&self.group)
    }
}

/// Deterministic path layout for a producer or consumer host, backed by
/// three `PathSpec`s: the package files base, the unsorted extraction
/// base, and (producer-only) any additional bases the caller wires in.
#[derive(Debug, Clone)]
pub struct PathManager {
    /// Directory holding in-flight and completed chunk files, per torrent.
    pub package_files: PathSpec,
    /// Directory holding extracted, unsorted output, per torrent.
    pub unsorted: PathSpec,
}

impl PathManager {
    /// Construct a path manager from its two required specs.
    #[must_use]
    pub const fn new(package_files: PathSpec, unsorted: PathSpec) -> Self {
        Self {
            package_files,
            unsorted,
        }
    }

    /// `<package_files_base>/<torrent_name>/`
    #[must_use]
    pub fn package_files_dir(&self, torrent_name: &str) -> PathBuf {
        self.package_files.path.join(torrent_name)
    }

    /// Ensure the torrent's package files directory exists with the
    /// configured ownership/mode.
    pub fn create_package_files_dir(&self, torrent_name: &str) -> FsOpsResult<PathBuf> {
        let dir = self.package_files_dir(torrent_name);
        mkdir_chownmod(
            &dir,
            Some(self.package_files.uid()?),
            Some(self.package_files.gid()?),
            self.package_files.dmode,
        )?;
        Ok(dir)
    }

    /// `<package_files_base>/<torrent_name>/<torrent_name>.tar.NNNN`
    #[must_use]
    pub fn package_file_path(&self, torrent_name: &str, filename: &str) -> PathBuf {
        self.package_files_dir(torrent_name).join(filename)
    }

    /// `<package_files_base>/<torrent_name>/<torrent_name>.tar`
    #[must_use]
    pub fn package_archive_path(&self, torrent_name: &str) -> PathBuf {
        self.package_files_dir(torrent_name)
            .join(format!("{torrent_name}.tar"))
    }

    /// `<unsorted_base>/<torrent_name>/`
    #[must_use]
    pub fn package_output_dir(&self, torrent_name: &str) -> PathBuf {
        self.unsorted.path.join(torrent_name)
    }

    /// Ensure the torrent's extraction output directory exists with the
    /// configured ownership/mode.
    pub fn create_package_output_dir(&self, torrent_name: &str) -> FsOpsResult<PathBuf> {
        let dir = self.package_output_dir(torrent_name);
        mkdir_chownmod(
            &dir,
            Some(self.unsorted.uid()?),
            Some(self.unsorted.gid()?),
            self.unsorted.dmode,
        )?;
        Ok(dir)
    }

    /// Recursively normalize ownership/mode of the extracted output tree.
    pub fn chownmod_package_output_dir(&self, torrent_name: &str) -> FsOpsResult<()> {
        let dir = self.package_output_dir(torrent_name);
        chownmod_recursive(
            &dir,
            Some(self.unsorted.uid()?),
            Some(self.unsorted.gid()?),
            self.unsorted.dmode,
            self.unsorted.fmode,
        )
    }

    /// Remove the torrent's package files directory (chunks + transient
    /// archive) entirely.
    pub fn remove_package_files_dir(&self, torrent_name: &str) -> FsOpsResult<()> {
        let dir = self.package_files_dir(torrent_name);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|err| FsOpsError::io("remove", &dir, err))?;
        }
        Ok(())
    }
}

/// Return the sorted chunk filenames present on disk for a torrent,
/// ascending by filename (SPEC_FULL.md §5: chunks join in filename order).
pub fn list_chunk_filenames(dir: &Path, basename: &str) -> FsOpsResult<Vec<String>> {
    let prefix = format!("{basename}.tar.");
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|err| FsOpsError::io("read_dir", dir, err))? {
        let entry = entry.map_err(|err| FsOpsError::io("read_dir entry", dir, err))?;
        if let Some(name) = entry.file_name().to_str() {
            if name.starts_with(&prefix) {
                names.push(name.to_string());
            }
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_valid_path_spec_line() {
        let spec = PathSpec::parse("/var/dasd/packages,dasd,dasd,0775,0664").unwrap();
        assert_eq!(spec.path, PathBuf::from("/var/dasd/packages"));
        assert_eq!(spec.dmode, 0o775);
        assert_eq!(spec.fmode, 0o664);
    }

    #[test]
    fn rejects_malformed_line() {
        assert!(PathSpec::parse("too,few,fields").is_err());
        assert!(PathSpec::parse("/p,u,g,bad,0664").is_err());
    }

    #[test]
    fn layout_matches_spec_paths() {
        let spec = PathSpec {
            path: PathBuf::from("/base"),
            owner: "u".into(),
            group: "g".into(),
            dmode: 0o775,
            fmode: 0o664,
        };
        let pm = PathManager::new(spec.clone(), spec);
        assert_eq!(
            pm.package_files_dir("MyTorrent"),
            PathBuf::from("/base/MyTorrent")
        );
        assert_eq!(
            pm.package_archive_path("MyTorrent"),
            PathBuf::from("/base/MyTorrent/MyTorrent.tar")
        );
    }

    #[test]
    fn lists_chunk_filenames_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["t.tar.0002", "t.tar.0000", "t.tar.0001"] {
            std::fs::write(dir.path().join(name), []).unwrap();
        }
        std::fs::write(dir.path().join("unrelated.txt"), []).unwrap();
        let names = list_chunk_filenames(dir.path(), "t").unwrap();
        assert_eq!(names, vec!["t.tar.0000", "t.tar.0001", "t.tar.0002"]);
    }
}
