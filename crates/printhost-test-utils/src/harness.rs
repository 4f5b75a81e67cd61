// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness: a temp config directory with a wired-up manager.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use printhost_config::{BackupPolicy, ConfigManager, MigrationTable};
use printhost_core::{ConfigFs, PrintHostError};

use crate::mock_fs::FailingFs;
use crate::mock_restart::RecordingRestart;

/// Builder for [`ConfigHarness`].
pub struct ConfigHarnessBuilder {
    main: String,
    files: Vec<(PathBuf, String)>,
    base_config: Option<String>,
    pause_resume_base: Option<String>,
    backup: BackupPolicy,
    allow_includes: bool,
    migrations: Option<MigrationTable>,
}

impl ConfigHarnessBuilder {
    fn new() -> Self {
        Self {
            main: String::new(),
            files: Vec::new(),
            base_config: None,
            pause_resume_base: None,
            backup: BackupPolicy {
                enabled: false,
                retention: 5,
            },
            allow_includes: true,
            migrations: None,
        }
    }

    /// Contents of `printer.cfg`.
    pub fn with_main(mut self, text: &str) -> Self {
        self.main = text.to_string();
        self
    }

    /// An extra file, relative to the config directory.
    pub fn with_file(mut self, rel: impl Into<PathBuf>, text: &str) -> Self {
        self.files.push((rel.into(), text.to_string()));
        self
    }

    /// Write `printer_base.cfg` and point the manager at it.
    pub fn with_base_config(mut self, text: &str) -> Self {
        self.base_config = Some(text.to_string());
        self
    }

    /// Write `shipped/pause_resume_base.cfg` and point the manager at it.
    pub fn with_pause_resume_base(mut self, text: &str) -> Self {
        self.pause_resume_base = Some(text.to_string());
        self
    }

    /// Backups are off unless enabled here.
    pub fn with_backup(mut self, policy: BackupPolicy) -> Self {
        self.backup = policy;
        self
    }

    pub fn with_includes(mut self, allow: bool) -> Self {
        self.allow_includes = allow;
        self
    }

    pub fn with_migrations(mut self, table: MigrationTable) -> Self {
        self.migrations = Some(table);
        self
    }

    pub fn build(self) -> Result<ConfigHarness, PrintHostError> {
        let temp_dir = tempfile::TempDir::new().map_err(|source| PrintHostError::Io {
            path: std::env::temp_dir(),
            source,
        })?;
        let dir = temp_dir.path().to_path_buf();

        let main_path = dir.join("printer.cfg");
        write(&main_path, &self.main)?;
        for (rel, text) in &self.files {
            let path = dir.join(rel);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|source| PrintHostError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
            write(&path, text)?;
        }

        let fs = Rc::new(FailingFs::new());
        let restart = Rc::new(RecordingRestart::new());
        let mut manager = ConfigManager::new(main_path.clone(), fs.clone(), restart.clone())
            .with_includes(self.allow_includes)
            .with_backup(self.backup);
        if let Some(base) = &self.base_config {
            let base_path = dir.join("printer_base.cfg");
            write(&base_path, base)?;
            manager = manager.with_base_config(base_path);
        }
        if let Some(reference) = &self.pause_resume_base {
            let shipped = dir.join("shipped");
            std::fs::create_dir_all(&shipped).map_err(|source| PrintHostError::Io {
                path: shipped.clone(),
                source,
            })?;
            let reference_path = shipped.join("pause_resume_base.cfg");
            write(&reference_path, reference)?;
            manager = manager.with_pause_resume_base(reference_path);
        }
        if let Some(table) = self.migrations {
            manager = manager.with_migrations(table);
        }

        Ok(ConfigHarness {
            manager,
            fs,
            restart,
            main_path,
            dir,
            _temp_dir: temp_dir,
        })
    }
}

/// A temp config directory and a manager over it.
pub struct ConfigHarness {
    /// Manager for `printer.cfg` in the temp directory.
    pub manager: ConfigManager,
    /// Filesystem port shared with the manager.
    pub fs: Rc<FailingFs>,
    /// Restart sink shared with the manager.
    pub restart: Rc<RecordingRestart>,
    main_path: PathBuf,
    dir: PathBuf,
    _temp_dir: tempfile::TempDir,
}

impl ConfigHarness {
    pub fn builder() -> ConfigHarnessBuilder {
        ConfigHarnessBuilder::new()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    /// Current on-disk text of `printer.cfg`.
    pub fn main_text(&self) -> String {
        self.read(&self.main_path)
    }

    /// Current on-disk text of a file in the config directory, or an empty
    /// string when it cannot be read.
    pub fn read(&self, rel: impl AsRef<Path>) -> String {
        self.fs
            .read_to_string(&self.dir.join(rel))
            .unwrap_or_default()
    }

    /// Replace `printer.cfg` behind the manager's back.
    pub fn overwrite_main(&self, text: &str) -> Result<(), PrintHostError> {
        write(&self.main_path, text)
    }
}

fn write(path: &Path, text: &str) -> Result<(), PrintHostError> {
    std::fs::write(path, text).map_err(|source| PrintHostError::Io {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_lays_out_files() {
        let harness = ConfigHarness::builder()
            .with_main("[printer]\n[include macros/*.cfg]\n")
            .with_file("macros/start.cfg", "[gcode_macro START]\ngcode: G28\n")
            .build()
            .unwrap();

        let read = harness.manager.read_main_config().unwrap();
        assert!(read.has_section("gcode_macro START"));
        assert!(harness.main_text().starts_with("[printer]"));
    }

    #[test]
    fn base_config_is_written() {
        let harness = ConfigHarness::builder()
            .with_main("[printer]\n")
            .with_base_config("[printer]\n")
            .build()
            .unwrap();
        assert_eq!(harness.read("printer_base.cfg"), "[printer]\n");
    }
}
