//! Ownership and mode enforcement (SPEC_FULL.md §4.4). Grounded on
//! `daserver/dasdaemon/utils/fs.py`'s `mkdir_chownmod`/`chownmod` from the
//! original source, reimplemented with `nix` syscalls instead of `os.chown`.

use std::fs;
use std::os::unix::fs::PermissionsExt as _;
use std::path::Path;

use nix::unistd::{Gid, Group, Uid, User, chown};
use walkdir::WalkDir;

use crate::error::{FsOpsError, FsOpsResult};

/// Resolve a username to a UID via `nix`'s passwd lookup.
pub fn uid_for_user(user: &str) -> FsOpsResult<Uid> {
    User::from_name(user)
        .map_err(|source| FsOpsError::UserLookup {
            user: user.to_string(),
            source,
        })?
        .map(|u| u.uid)
        .ok_or_else(|| FsOpsError::InvalidPathSpec {
            reason: format!("unknown user: {user}"),
        })
}

/// Resolve a group name to a GID via `nix`'s group lookup.
pub fn gid_for_group(group: &str) -> FsOpsResult<Gid> {
    Group::from_name(group)
        .map_err(|source| FsOpsError::GroupLookup {
            group: group.to_string(),
            source,
        })?
        .map(|g| g.gid)
        .ok_or_else(|| FsOpsError::InvalidPathSpec {
            reason: format!("unknown group: {group}"),
        })
}

/// Create `dirpath` (and parents) if missing, then apply ownership and mode.
pub fn mkdir_chownmod(dirpath: &Path, uid: Option<Uid>, gid: Option<Gid>, mode: u32) -> FsOpsResult<()> {
    fs::create_dir_all(dirpath).map_err(|err| FsOpsError::io("mkdir -p", dirpath, err))?;
    chown(dirpath, uid, gid).map_err(|source| FsOpsError::Nix {
        operation: "chown",
        path: dirpath.to_path_buf(),
        source,
    })?;
    fs::set_permissions(dirpath, fs::Permissions::from_mode(mode))
        .map_err(|err| FsOpsError::io("chmod", dirpath, err))
}

/// Recursively apply ownership and mode to a directory's contents:
/// `dmode` to directories, `fmode` to files.
pub fn chownmod_recursive(
    dirpath: &Path,
    uid: Option<Uid>,
    gid: Option<Gid>,
    dmode: u32,
    fmode: u32,
) -> FsOpsResult<()> {
    for entry in WalkDir::new(dirpath) {
        let entry = entry.map_err(|err| FsOpsError::walkdir("chownmod", dirpath, err))?;
        let path = entry.path();
        chown(path, uid, gid).map_err(|source| FsOpsError::Nix {
            operation: "chown",
            path: path.to_path_buf(),
            source,
        })?;
        let mode = if entry.file_type().is_dir() { dmode } else { fmode };
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .map_err(|err| FsOpsError::io("chmod", path, err))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mkdir_chownmod_creates_and_sets_mode() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a/b/c");
        mkdir_chownmod(&target, None, None, 0o750).unwrap();
        let mode = fs::metadata(&target).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o750);
    }

    #[test]
    fn chownmod_recursive_applies_distinct_modes() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("root");
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("file.txt"), b"x").unwrap();
        fs::write(root.join("sub/other.txt"), b"y").unwrap();

        chownmod_recursive(&root, None, None, 0o775, 0o664).unwrap();

        let dir_mode = fs::metadata(root.join("sub")).unwrap().permissions().mode() & 0o777;
        let file_mode = fs::metadata(root.join("file.txt")).unwrap().permissions().mode() & 0o777;
        assert_eq!(dir_mode, 0o775);
        assert_eq!(file_mode, 0o664);
    }

    #[test]
    fn unknown_user_is_reported_as_invalid_path_spec() {
        let err = uid_for_user("no-such-user-dasd-test").unwrap_err();
        assert!(matches!(err, FsOpsError::InvalidPathSpec { .. }));
    }
}
