// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem port used for every configuration read and write.
//!
//! The configuration subsystem never touches `std::fs` directly, so tests
//! can inject failures and the host can swap in a different backing store.

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

/// Filesystem operations required by the configuration subsystem.
pub trait ConfigFs {
    /// Read a whole file as UTF-8 text.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Replace `path` with `contents`.
    ///
    /// Implementations must fully materialise the new contents before the
    /// destination is touched: a failure leaves the previous file intact.
    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()>;

    /// Copy `from` to `to`, overwriting `to`.
    fn copy(&self, from: &Path, to: &Path) -> io::Result<()>;

    /// Delete a file.
    fn remove_file(&self, path: &Path) -> io::Result<()>;

    /// List the entries of a directory (full paths, unordered).
    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>>;

    /// Whether `path` is an existing directory.
    fn is_dir(&self, path: &Path) -> bool;

    /// Whether `path` exists.
    fn exists(&self, path: &Path) -> bool;
}

/// [`ConfigFs`] backed by the local disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl ConfigFs for LocalFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        // Write through symlinks: the link stays, its target is replaced.
        let target = if path.exists() {
            std::fs::canonicalize(path)?
        } else {
            path.to_path_buf()
        };
        let dir = match target.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        // Temp file in the destination directory so the final rename never
        // crosses a filesystem boundary.
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(contents.as_bytes())?;
        if let Ok(existing) = std::fs::metadata(&target) {
            tmp.as_file().set_permissions(existing.permissions())?;
        }
        tmp.as_file().sync_all()?;
        tmp.persist(&target).map_err(|e| e.error)?;

        debug!(path = %target.display(), bytes = contents.len(), "file replaced");
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        std::fs::copy(from, to).map(|_| ())
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        std::fs::remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            entries.push(entry?.path());
        }
        Ok(entries)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_atomic_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printer.cfg");
        std::fs::write(&path, "[old]\n").unwrap();

        LocalFs.write_atomic(&path, "[new]\n").unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[new]\n");
        // No stray temp files left behind.
        assert_eq!(LocalFs.list_dir(dir.path()).unwrap().len(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("printer.cfg");
        std::fs::write(&path, "[old]\n").unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o644)).unwrap();

        LocalFs.write_atomic(&path, "[new]\n").unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn write_atomic_follows_symlink() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("real")).unwrap();
        let real = dir.path().join("real").join("printer.cfg");
        let link = dir.path().join("printer.cfg");
        std::fs::write(&real, "[old]\n").unwrap();
        std::os::unix::fs::symlink(&real, &link).unwrap();

        LocalFs.write_atomic(&link, "[new]\n").unwrap();

        assert!(std::fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(std::fs::read_to_string(&real).unwrap(), "[new]\n");
        assert_eq!(LocalFs.list_dir(&dir.path().join("real")).unwrap().len(), 1);
    }

    #[test]
    fn write_atomic_into_missing_directory_fails_cleanly() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("printer.cfg");
        assert!(LocalFs.write_atomic(&path, "x").is_err());
        assert!(!LocalFs.exists(&path));
    }

    #[test]
    fn list_dir_returns_full_paths() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.cfg"), "").unwrap();
        std::fs::create_dir(dir.path().join("sub")).unwrap();

        let mut entries = LocalFs.list_dir(dir.path()).unwrap();
        entries.sort();
        assert_eq!(entries, vec![dir.path().join("a.cfg"), dir.path().join("sub")]);
        assert!(LocalFs.is_dir(&dir.path().join("sub")));
        assert!(!LocalFs.is_dir(&dir.path().join("a.cfg")));
    }

    #[test]
    fn copy_and_remove_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let src = dir.path().join("printer.cfg");
        let dst = dir.path().join("printer-backup.cfg");
        std::fs::write(&src, "[printer]\n").unwrap();

        LocalFs.copy(&src, &dst).unwrap();
        assert_eq!(LocalFs.read_to_string(&dst).unwrap(), "[printer]\n");

        LocalFs.remove_file(&dst).unwrap();
        assert!(!LocalFs.exists(&dst));
    }
}
