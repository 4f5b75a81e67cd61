// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Filesystem port that fails selected operations.
//!
//! Everything else is delegated to [`LocalFs`], so a test can run against a
//! real temp directory and break exactly one step of a save.

use std::cell::RefCell;
use std::io;
use std::path::{Path, PathBuf};

use printhost_core::{ConfigFs, LocalFs};

/// Operations of [`ConfigFs`] that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FsOp {
    Read,
    WriteAtomic,
    Copy,
    Remove,
    ListDir,
}

/// [`LocalFs`] with failure injection and a log of writes.
#[derive(Debug, Default)]
pub struct FailingFs {
    failing: RefCell<Vec<FsOp>>,
    writes: RefCell<Vec<PathBuf>>,
}

impl FailingFs {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `op` fail from now on.
    pub fn fail(&self, op: FsOp) {
        self.failing.borrow_mut().push(op);
    }

    /// Let `op` succeed again.
    pub fn heal(&self, op: FsOp) {
        self.failing.borrow_mut().retain(|o| *o != op);
    }

    /// Paths passed to `write_atomic`, successful or not.
    pub fn writes(&self) -> Vec<PathBuf> {
        self.writes.borrow().clone()
    }

    fn check(&self, op: FsOp, path: &Path) -> io::Result<()> {
        if self.failing.borrow().contains(&op) {
            tracing::debug!(?op, path = %path.display(), "injected filesystem failure");
            return Err(io::Error::other(format!("injected {op:?} failure")));
        }
        Ok(())
    }
}

impl ConfigFs for FailingFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.check(FsOp::Read, path)?;
        LocalFs.read_to_string(path)
    }

    fn write_atomic(&self, path: &Path, contents: &str) -> io::Result<()> {
        self.writes.borrow_mut().push(path.to_path_buf());
        self.check(FsOp::WriteAtomic, path)?;
        LocalFs.write_atomic(path, contents)
    }

    fn copy(&self, from: &Path, to: &Path) -> io::Result<()> {
        self.check(FsOp::Copy, to)?;
        LocalFs.copy(from, to)
    }

    fn remove_file(&self, path: &Path) -> io::Result<()> {
        self.check(FsOp::Remove, path)?;
        LocalFs.remove_file(path)
    }

    fn list_dir(&self, dir: &Path) -> io::Result<Vec<PathBuf>> {
        self.check(FsOp::ListDir, dir)?;
        LocalFs.list_dir(dir)
    }

    fn is_dir(&self, path: &Path) -> bool {
        LocalFs.is_dir(path)
    }

    fn exists(&self, path: &Path) -> bool {
        LocalFs.exists(path)
    }
}
