// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Serialize a document back to text and commit it to disk.
//!
//! The whole file is rendered in memory first; the destination is only
//! touched through [`ConfigFs::write_atomic`], so a failed save never leaves
//! a half-written config behind.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use printhost_core::ConfigFs;
use regex::Regex;
use tracing::{info, warn};

use crate::comments::{CommentMap, escape_value};
use crate::diagnostic::ConfigError;
use crate::document::{ConfigOption, Document};

const BACKUP_STAMP: &str = "%Y%m%d_%H%M%S";

/// Render `document` with its trivia and the save-time comment map.
pub fn render(document: &Document, comments: &CommentMap) -> String {
    let mut out = String::new();

    for line in comments.before_sections() {
        out.push_str(line);
        out.push('\n');
    }

    for section in document.sections() {
        out.push_str(&format!("[{}]\n", section.name()));
        for line in comments.get(section.name()) {
            out.push_str(line);
            out.push('\n');
        }
        for option in section.options() {
            render_option(&mut out, option);
        }
        for line in &section.trailing_comments {
            out.push_str(line);
            out.push('\n');
        }
        out.push('\n');
    }

    out
}

fn render_option(out: &mut String, option: &ConfigOption) {
    for line in &option.comments.leading {
        out.push_str(line);
        out.push('\n');
    }

    let mut lines = option.value().split('\n');
    let first = escape_value(lines.next().unwrap_or_default());
    let mut head = format!("{}: {first}", option.name()).trim_end().to_string();
    if let Some(inline) = &option.comments.inline {
        head.push(' ');
        head.push_str(inline);
    }
    out.push_str(&head);
    out.push('\n');

    let interleaved = &option.comments.interleaved;
    let mut emitted = 1;
    for line in lines {
        for (_, comment) in interleaved.iter().filter(|(at, _)| *at == emitted) {
            out.push_str(comment);
            out.push('\n');
        }
        if !line.is_empty() {
            out.push('\t');
            out.push_str(&escape_value(line));
        }
        out.push('\n');
        emitted += 1;
    }
    for (_, comment) in interleaved.iter().filter(|(at, _)| *at >= emitted) {
        out.push_str(comment);
        out.push('\n');
    }
}

/// Backup behaviour of a save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackupPolicy {
    pub enabled: bool,
    pub retention: usize,
}

impl Default for BackupPolicy {
    fn default() -> Self {
        Self {
            enabled: true,
            retention: 5,
        }
    }
}

/// Replaces a config file, optionally keeping timestamped backups.
pub struct AtomicWriter<'a> {
    fs: &'a dyn ConfigFs,
    backup: BackupPolicy,
}

impl<'a> AtomicWriter<'a> {
    pub fn new(fs: &'a dyn ConfigFs, backup: BackupPolicy) -> Self {
        Self { fs, backup }
    }

    /// Write `contents` to `path`. Returns the backup file, if one was made.
    ///
    /// A failed backup copy aborts the save. Rotation failures are only
    /// logged.
    pub fn commit(
        &self,
        path: &Path,
        contents: &str,
        now: NaiveDateTime,
    ) -> Result<Option<PathBuf>, ConfigError> {
        let backup = if self.backup.enabled && self.fs.exists(path) {
            let name = backup_path(path, now);
            info!(path = %path.display(), backup = %name.display(), "SAVE_CONFIG");
            self.fs
                .copy(path, &name)
                .map_err(|source| ConfigError::WriteFailure {
                    path: name.clone(),
                    source,
                })?;
            Some(name)
        } else {
            info!(path = %path.display(), "SAVE_CONFIG");
            None
        };

        self.fs
            .write_atomic(path, contents)
            .map_err(|source| ConfigError::WriteFailure {
                path: path.to_path_buf(),
                source,
            })?;

        if backup.is_some() {
            self.rotate(path);
        }
        Ok(backup)
    }

    /// Delete the oldest backups beyond the retention count.
    fn rotate(&self, path: &Path) {
        let dir = parent_dir(path);
        let Some(pattern) = backup_pattern(path) else {
            return;
        };
        let entries = match self.fs.list_dir(dir) {
            Ok(entries) => entries,
            Err(err) => {
                warn!(dir = %dir.display(), error = %err, "unable to list backups");
                return;
            }
        };

        let mut backups: Vec<PathBuf> = entries
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| pattern.is_match(n))
            })
            .collect();
        backups.sort();

        let excess = backups.len().saturating_sub(self.backup.retention);
        for old in backups.into_iter().take(excess) {
            if let Err(err) = self.fs.remove_file(&old) {
                warn!(backup = %old.display(), error = %err, "unable to remove old backup");
            }
        }
    }
}

/// `<stem>-YYYYMMDD_HHMMSS.cfg` next to `path`.
pub fn backup_path(path: &Path, now: NaiveDateTime) -> PathBuf {
    let stamp = now.format(BACKUP_STAMP);
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let backup = match name.strip_suffix(".cfg") {
        Some(stem) => format!("{stem}-{stamp}.cfg"),
        None => format!("{name}-{stamp}"),
    };
    path.with_file_name(backup)
}

/// Backups of `path` currently on disk, oldest first.
pub fn list_backups(fs: &dyn ConfigFs, path: &Path) -> Vec<PathBuf> {
    let Some(pattern) = backup_pattern(path) else {
        return Vec::new();
    };
    let mut found: Vec<PathBuf> = fs
        .list_dir(parent_dir(path))
        .unwrap_or_default()
        .into_iter()
        .filter(|p| {
            p.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| pattern.is_match(n))
        })
        .collect();
    found.sort();
    found
}

fn backup_pattern(path: &Path) -> Option<Regex> {
    let name = path.file_name()?.to_str()?;
    let re = match name.strip_suffix(".cfg") {
        Some(stem) => format!(r"^{}-\d{{8}}_\d{{6}}\.cfg$", regex::escape(stem)),
        None => format!(r"^{}-\d{{8}}_\d{{6}}$", regex::escape(name)),
    };
    Regex::new(&re).ok()
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    }
}
