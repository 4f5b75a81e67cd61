// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The configuration manager: reads the main config, accumulates pending
//! changes from host objects, and runs SAVE_CONFIG.
//!
//! Constructed once per process. Every mutation of pending state goes
//! through its methods; a save either replaces the file and drains the
//! pending set, or fails and leaves it untouched for a retry.

use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::Local;
use printhost_core::{ConfigFs, RestartKind, RestartSink, StatusProvider};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::autosave::{AutosaveSplitter, strip_duplicates};
use crate::comments::CommentMap;
use crate::deprecation::DeprecationLedger;
use crate::diagnostic::{ConfigError, suggest_key};
use crate::document::{Document, names_match};
use crate::merge::merge;
use crate::migration::{MigrationTable, default_migrations};
use crate::model::HostSettings;
use crate::parser::{DocumentParser, ParseOptions, read_config_file};
use crate::pending::PendingChangeSet;
use crate::section::ConfigRead;
use crate::status::{ConfigStatus, project};
use crate::writer::{AtomicWriter, BackupPolicy, render};

const PAUSE_RESUME_FILE: &str = "pause_resume.cfg";
const RESUME_MACRO: &str = "gcode_macro RESUME";

/// Flags of one save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOptions {
    pub restart: bool,
    pub backup: bool,
    pub migrate: bool,
    /// Write this file instead of the main config.
    pub target: Option<PathBuf>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            restart: true,
            backup: true,
            migrate: false,
            target: None,
        }
    }
}

/// What a successful save did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveOutcome {
    pub path: PathBuf,
    pub backup: Option<PathBuf>,
    pub restart_requested: bool,
    pub migrated: bool,
}

/// A batch of changes, optionally saved at once.
#[derive(Debug, Clone, Default)]
pub struct UpdateRequest {
    /// Sections to set; an empty option list only ensures the section exists.
    pub set: Vec<(String, Vec<(String, String)>)>,
    pub remove: Vec<String>,
    pub save_immediately: bool,
    pub restart: bool,
    pub backup: bool,
    pub target: Option<PathBuf>,
}

/// Owner of all configuration state for the process.
pub struct ConfigManager {
    fs: Rc<dyn ConfigFs>,
    restart: Rc<dyn RestartSink>,
    main_path: PathBuf,
    allow_includes: bool,
    backup: BackupPolicy,
    base_config: Option<PathBuf>,
    pause_resume_base: Option<PathBuf>,
    migrations: MigrationTable,
    ledger: Rc<DeprecationLedger>,
    pending: PendingChangeSet,
    has_unsaved: bool,
    status: ConfigStatus,
}

impl ConfigManager {
    pub fn new(main_path: impl Into<PathBuf>, fs: Rc<dyn ConfigFs>, restart: Rc<dyn RestartSink>) -> Self {
        Self {
            fs,
            restart,
            main_path: main_path.into(),
            allow_includes: true,
            backup: BackupPolicy::default(),
            base_config: None,
            pause_resume_base: None,
            migrations: default_migrations(),
            ledger: Rc::new(DeprecationLedger::new()),
            pending: PendingChangeSet::new(),
            has_unsaved: false,
            status: ConfigStatus::default(),
        }
    }

    /// Manager configured from host settings.
    pub fn from_settings(settings: &HostSettings, fs: Rc<dyn ConfigFs>, restart: Rc<dyn RestartSink>) -> Self {
        let mut manager = Self::new(settings.printer.config_path.clone(), fs, restart)
            .with_includes(settings.printer.allow_includes)
            .with_backup(BackupPolicy {
                enabled: settings.backup.enabled,
                retention: settings.backup.retention,
            });
        manager.base_config = settings.printer.base_config.clone();
        manager.pause_resume_base = settings.printer.pause_resume_base.clone();
        manager
    }

    pub fn with_includes(mut self, allow: bool) -> Self {
        self.allow_includes = allow;
        self
    }

    pub fn with_backup(mut self, policy: BackupPolicy) -> Self {
        self.backup = policy;
        self
    }

    pub fn with_base_config(mut self, path: impl Into<PathBuf>) -> Self {
        self.base_config = Some(path.into());
        self
    }

    /// Reference file holding the shipped `gcode_macro RESUME`.
    pub fn with_pause_resume_base(mut self, path: impl Into<PathBuf>) -> Self {
        self.pause_resume_base = Some(path.into());
        self
    }

    pub fn with_migrations(mut self, table: MigrationTable) -> Self {
        self.migrations = table;
        self
    }

    pub fn main_path(&self) -> &Path {
        &self.main_path
    }

    pub fn pending(&self) -> &PendingChangeSet {
        &self.pending
    }

    pub fn has_unsaved_changes(&self) -> bool {
        self.has_unsaved
    }

    pub fn deprecations(&self) -> Rc<DeprecationLedger> {
        Rc::clone(&self.ledger)
    }

    pub fn migrations(&self) -> &MigrationTable {
        &self.migrations
    }

    /// Read a single file into a document.
    pub fn read_config(&self, path: &Path, allow_includes: bool) -> Result<Document, ConfigError> {
        let parser = DocumentParser::new(
            self.fs.as_ref(),
            ParseOptions {
                allow_includes,
                keep_comments: false,
            },
        );
        Ok(parser.parse_file(path)?.document)
    }

    /// Read the main config: the regular body (with includes) overlaid by
    /// the autosave block, whose options the body already defines are
    /// dropped.
    pub fn read_main_config(&self) -> Result<ConfigRead, ConfigError> {
        let (regular, autosave) = self.read_main_parts(self.allow_includes)?;
        let mut effective = regular;
        effective.overlay(&autosave);
        debug!(
            path = %self.main_path.display(),
            sections = effective.len(),
            autosave_sections = autosave.len(),
            "read main config"
        );
        Ok(ConfigRead::new(effective, autosave, self.ledger.clone()))
    }

    fn read_main_parts(&self, allow_includes: bool) -> Result<(Document, Document), ConfigError> {
        let text = read_config_file(self.fs.as_ref(), &self.main_path)?;
        let split = AutosaveSplitter::split(&text);
        let parser = DocumentParser::new(
            self.fs.as_ref(),
            ParseOptions {
                allow_includes,
                keep_comments: false,
            },
        );
        let regular = parser.parse(&split.regular, &self.main_path)?.document;
        let autosave = parser.parse(&split.autosave, &self.main_path)?.document;
        let autosave = strip_duplicates(&autosave, &regular);
        Ok((regular, autosave))
    }

    /// Reject sections and options no host object consulted.
    ///
    /// `registered` names host objects that may own a section without
    /// reading any option from it. Options from the autosave block count
    /// as consulted. On success the status snapshot is rebuilt.
    pub fn check_unused_options(&mut self, read: &ConfigRead, registered: &[&str]) -> Result<(), ConfigError> {
        let mut access = read.access().clone();
        for section in read.autosave().sections() {
            for option in section.option_names() {
                access.record(section.name(), option, serde_json::Value::from(1));
            }
        }

        let mut known_sections: Vec<String> = access.by_section().keys().cloned().collect();
        known_sections.extend(registered.iter().map(|s| s.to_lowercase()));

        for section in read.document().sections() {
            let name = section.name().to_lowercase();
            let is_registered = registered.iter().any(|r| names_match(r, &name));
            if !access.section_accessed(&name) && !is_registered {
                let candidates: Vec<&str> = known_sections.iter().map(String::as_str).collect();
                return Err(ConfigError::UnknownSection {
                    suggestion: suggest_key(&name, &candidates),
                    section: name,
                });
            }
            for option in section.option_names() {
                let option = option.to_lowercase();
                if !access.contains(&name, &option) {
                    let valid: Vec<&str> = access.options(&name).collect();
                    return Err(ConfigError::UnknownOption {
                        suggestion: suggest_key(&option, &valid),
                        valid_keys: valid.join(", "),
                        section: name,
                        option,
                    });
                }
            }
        }

        self.status = project(read, &self.ledger);
        Ok(())
    }

    /// Queue `section.option = value`.
    pub fn set_option<V: Serialize + ?Sized>(&mut self, section: &str, option: &str, value: &V) {
        self.pending.set_option(section, option, value);
        self.has_unsaved = true;
    }

    /// Make sure `section` exists after the next save.
    pub fn ensure_section(&mut self, section: &str) {
        self.pending.ensure_section(section);
        self.has_unsaved = true;
    }

    /// Queue removal of `section`.
    ///
    /// A section that only exists as pending writes is simply discarded.
    /// Otherwise the main file is re-read and the section is marked for
    /// removal if it is really there.
    pub fn remove_section(&mut self, section: &str) -> Result<(), ConfigError> {
        if self.pending.discard_section(section) {
            return Ok(());
        }
        let (regular, autosave) = self.read_main_parts(false)?;
        if regular.has_section(section) || autosave.has_section(section) {
            self.pending.mark_removed(section);
            self.has_unsaved = true;
        }
        Ok(())
    }

    /// Queue a batch of changes and optionally save them.
    pub fn update_config(&mut self, request: UpdateRequest) -> Result<Option<SaveOutcome>, ConfigError> {
        for (section, options) in &request.set {
            if options.is_empty() {
                self.ensure_section(section);
            }
            for (option, value) in options {
                self.set_option(section, option, value.as_str());
            }
        }
        for section in &request.remove {
            self.remove_section(section)?;
        }
        if !request.save_immediately {
            return Ok(None);
        }
        self.save_config(SaveOptions {
            restart: request.restart,
            backup: request.backup,
            migrate: false,
            target: request.target,
        })
        .map(Some)
    }

    /// SAVE_CONFIG.
    ///
    /// Re-reads the target file, merges pending changes (and migrations
    /// when asked), keeps the autosave block minus what the change set
    /// superseded, and replaces the file. Pending state is cleared only on
    /// success.
    pub fn save_config(&mut self, opts: SaveOptions) -> Result<SaveOutcome, ConfigError> {
        if self.pending.is_empty() && !opts.migrate {
            return Err(ConfigError::NoChangesToSave);
        }
        let target = opts.target.clone().unwrap_or_else(|| self.main_path.clone());

        let (regular, comments, autosave) = self.read_for_save(&target).map_err(|source| {
            error!(path = %target.display(), error = %source, "unable to parse existing config on SAVE_CONFIG");
            ConfigError::ExistingConfigUnparsable {
                source: Box::new(source),
            }
        })?;

        let migrations = opts.migrate.then_some(&self.migrations);
        let merged = merge(&regular, &self.pending, migrations);
        if self.pending.is_empty() && merged.values() == regular.values() {
            return Err(ConfigError::NoChangesToSave);
        }

        let mut kept_autosave = strip_duplicates(&autosave, &merged);
        for section in self.pending.removed() {
            kept_autosave.remove_section(section);
        }

        let mut contents = render(&merged, &comments);
        let block = AutosaveSplitter::render(&kept_autosave);
        if !block.is_empty() {
            contents.truncate(contents.trim_end().len());
            contents.push('\n');
            contents.push_str(&block);
        }

        let writer = AtomicWriter::new(
            self.fs.as_ref(),
            BackupPolicy {
                enabled: opts.backup && self.backup.enabled,
                retention: self.backup.retention,
            },
        );
        let backup = writer.commit(&target, &contents, Local::now().naive_local())?;

        self.pending.clear();
        self.has_unsaved = false;

        let restart_requested = opts.restart && self.request_restart();
        Ok(SaveOutcome {
            path: target,
            backup,
            restart_requested,
            migrated: opts.migrate,
        })
    }

    fn read_for_save(&self, target: &Path) -> Result<(Document, CommentMap, Document), ConfigError> {
        let text = read_config_file(self.fs.as_ref(), target)?;
        let split = AutosaveSplitter::split(&text);
        let parser = DocumentParser::new(
            self.fs.as_ref(),
            ParseOptions {
                allow_includes: false,
                keep_comments: true,
            },
        );
        let parsed = parser.parse(&split.regular, target)?;
        let autosave = parser.parse(&split.autosave, target)?.document;
        Ok((parsed.document, parsed.comments, autosave))
    }

    fn request_restart(&self) -> bool {
        match self.restart.request_restart(RestartKind::Restart) {
            Ok(()) => {
                info!(kind = %RestartKind::Restart, "restart requested after SAVE_CONFIG");
                true
            }
            Err(err) => {
                error!(error = %err, "restart request failed after SAVE_CONFIG");
                false
            }
        }
    }

    /// Bring the user config in line with the base config and the
    /// migration table, saving with a restart when anything changed.
    ///
    /// The RESUME macro is synced first (see
    /// [`sync_pause_resume`](Self::sync_pause_resume)). Returns the main
    /// config save if one ran, else the pause/resume save.
    pub fn reconcile(&mut self, read: &ConfigRead) -> Result<Option<SaveOutcome>, ConfigError> {
        let resume = self.sync_pause_resume()?;

        if let Some(base_path) = self.base_config.clone() {
            let base = self.read_config(&base_path, false)?;
            for section in base.sections() {
                if read.has_section(section.name()) || section.name().starts_with("include ") {
                    continue;
                }
                info!(section = %section.name(), "adding section missing from base config");
                self.ensure_section(section.name());
                for option in section.options() {
                    self.set_option(section.name(), option.name(), option.value());
                }
            }
        }

        let deprecated: Vec<String> = self
            .migrations
            .deprecated_sections()
            .filter(|s| read.has_section(s))
            .map(str::to_string)
            .collect();
        for section in &deprecated {
            info!(section = %section, "removing deprecated section");
            self.remove_section(section)?;
        }

        let stale = self.main_schema_stale()?;
        if self.pending.is_empty() && !stale {
            return Ok(resume);
        }
        self.save_config(SaveOptions {
            restart: true,
            backup: true,
            migrate: stale,
            target: None,
        })
        .map(Some)
    }

    /// Whether a migrating save would change the main file.
    ///
    /// Only the main file's own body counts: options that live in included
    /// files or in the autosave block are never rewritten by a save.
    pub fn main_schema_stale(&self) -> Result<bool, ConfigError> {
        let (regular, _) = self.read_main_parts(false)?;
        Ok(self.migrations.is_stale(&regular))
    }

    /// Restore `gcode_macro RESUME` in `pause_resume.cfg` next to the main
    /// config from the shipped reference, saving with a restart when the
    /// two differ.
    ///
    /// Skipped when no reference is configured, when the reference has no
    /// RESUME macro, or when other changes are already pending.
    pub fn sync_pause_resume(&mut self) -> Result<Option<SaveOutcome>, ConfigError> {
        let Some(base_path) = self.pause_resume_base.clone() else {
            return Ok(None);
        };
        let base = self.read_config(&base_path, false)?;
        let Some(wanted) = base.get(RESUME_MACRO, "gcode") else {
            warn!(path = %base_path.display(), "pause/resume reference has no RESUME gcode");
            return Ok(None);
        };
        let wanted = wanted.to_string();

        let target = self.main_path.with_file_name(PAUSE_RESUME_FILE);
        if !self.fs.exists(&target) {
            warn!(path = %target.display(), "pause/resume config not found");
            return Ok(None);
        }
        let current = self.read_config(&target, false)?;
        if current.get(RESUME_MACRO, "gcode") == Some(wanted.as_str()) {
            return Ok(None);
        }
        if !self.pending.is_empty() {
            warn!(path = %target.display(), "pending changes, not restoring RESUME macro");
            return Ok(None);
        }

        info!(path = %target.display(), "restoring RESUME macro from reference");
        self.update_config(UpdateRequest {
            set: vec![(RESUME_MACRO.to_string(), vec![("gcode".to_string(), wanted)])],
            save_immediately: true,
            restart: true,
            backup: true,
            target: Some(target),
            ..UpdateRequest::default()
        })
    }

    /// Human-readable dump of the effective configuration, also logged.
    pub fn log_config(&self, read: &ConfigRead) -> String {
        let body = render(read.document(), &CommentMap::new());
        let dump = [
            "===== Config file =====",
            body.trim(),
            "=======================",
        ]
        .join("\n");
        info!("{dump}");
        dump
    }

    /// Current status, including pending state.
    pub fn snapshot(&self) -> ConfigStatus {
        let mut status = self.status.clone();
        status.save_config_pending = self.has_unsaved;
        status.save_config_pending_items = serde_json::to_value(&self.pending)
            .unwrap_or_else(|_| serde_json::Value::Object(Default::default()));
        status
    }
}

impl StatusProvider for ConfigManager {
    fn name(&self) -> &str {
        "configfile"
    }

    fn get_status(&self) -> serde_json::Value {
        serde_json::to_value(self.snapshot()).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Get;
    use printhost_core::{LocalFs, PrintHostError};
    use std::cell::RefCell;

    #[derive(Default)]
    struct Restarts(RefCell<Vec<RestartKind>>);

    impl RestartSink for Restarts {
        fn request_restart(&self, kind: RestartKind) -> Result<(), PrintHostError> {
            self.0.borrow_mut().push(kind);
            Ok(())
        }
    }

    fn manager(dir: &Path, text: &str) -> (ConfigManager, Rc<Restarts>) {
        let path = dir.join("printer.cfg");
        std::fs::write(&path, text).unwrap();
        let restarts = Rc::new(Restarts::default());
        let manager = ConfigManager::new(path, Rc::new(LocalFs), restarts.clone());
        (manager, restarts)
    }

    #[test]
    fn empty_save_is_refused_and_file_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let text = "[printer]\nkinematics: corexy # keep\n";
        let (mut manager, restarts) = manager(dir.path(), text);

        let err = manager.save_config(SaveOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::NoChangesToSave));
        assert_eq!(std::fs::read_to_string(manager.main_path()).unwrap(), text);
        assert!(restarts.0.borrow().is_empty());
    }

    #[test]
    fn save_clears_pending_and_requests_restart() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, restarts) = manager(dir.path(), "[printer]\nkinematics: corexy\n");
        manager.set_option("bltouch", "z_offset", &1.5);
        assert!(manager.has_unsaved_changes());

        let outcome = manager.save_config(SaveOptions::default()).unwrap();
        assert!(outcome.restart_requested);
        assert!(outcome.backup.is_some());
        assert!(manager.pending().is_empty());
        assert!(!manager.has_unsaved_changes());
        assert_eq!(restarts.0.borrow().as_slice(), &[RestartKind::Restart]);

        let read = manager.read_main_config().unwrap();
        assert_eq!(read.document().get("bltouch", "z_offset"), Some("1.5"));
    }

    #[test]
    fn failed_save_keeps_pending() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path(), "[printer]\n");
        manager.set_option("fan", "pin", "PA1");
        std::fs::remove_file(manager.main_path()).unwrap();

        let err = manager.save_config(SaveOptions::default()).unwrap_err();
        assert!(matches!(err, ConfigError::ExistingConfigUnparsable { .. }));
        assert!(manager.pending().has_section("fan"));
        assert!(manager.has_unsaved_changes());
    }

    #[test]
    fn autosave_overlay_and_preservation() {
        let dir = tempfile::tempdir().unwrap();
        let text = format!(
            "[bltouch]\nz_offset: 2.0\n{}#*# [bltouch]\n#*# z_offset = 1.0\n#*# speed = 5\n#*#\n#*# [bed_mesh]\n#*# version = 1\n",
            crate::autosave::AUTOSAVE_HEADER
        );
        let (mut manager, _) = manager(dir.path(), &text);

        let read = manager.read_main_config().unwrap();
        assert_eq!(read.document().get("bltouch", "z_offset"), Some("2.0"));
        assert_eq!(read.document().get("bltouch", "speed"), Some("5"));
        assert_eq!(read.autosave().get("bltouch", "z_offset"), None);

        manager.set_option("bltouch", "speed", &10);
        manager.remove_section("bed_mesh").unwrap();
        manager
            .save_config(SaveOptions {
                restart: false,
                backup: false,
                ..SaveOptions::default()
            })
            .unwrap();

        let written = std::fs::read_to_string(manager.main_path()).unwrap();
        assert!(!written.contains("bed_mesh"));
        assert!(!written.contains("#*# speed"));
        let read = manager.read_main_config().unwrap();
        assert_eq!(read.document().get("bltouch", "speed"), Some("10"));
        assert_eq!(read.document().get("bltouch", "z_offset"), Some("2.0"));
    }

    #[test]
    fn remove_section_of_pending_only_section() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path(), "[printer]\n");
        manager.set_option("neopixel", "pin", "PB0");
        manager.remove_section("neopixel").unwrap();
        assert!(manager.pending().is_empty());

        manager.remove_section("not_on_disk").unwrap();
        assert!(manager.pending().is_empty());
    }

    #[test]
    fn check_unused_options_reports_unknown_names() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) =
            manager(dir.path(), "[printer]\nmax_velocity: 300\nmax_velocty: 3\n[fam]\npin: PA1\n");

        let read = manager.read_main_config().unwrap();
        read.section("printer").get::<f64>("max_velocity", Get::required()).unwrap();
        let err = manager.check_unused_options(&read, &["fam"]).unwrap_err();
        match err {
            ConfigError::UnknownOption { option, suggestion, .. } => {
                assert_eq!(option, "max_velocty");
                assert_eq!(suggestion.as_deref(), Some("max_velocity"));
            }
            other => panic!("unexpected error: {other}"),
        }

        read.section("printer").get::<i64>("max_velocty", Get::required()).unwrap();
        let err = manager.check_unused_options(&read, &[]).unwrap_err();
        assert!(matches!(err, ConfigError::UnknownSection { ref section, .. } if section == "fam"));
    }

    #[test]
    fn snapshot_reflects_pending_state() {
        let dir = tempfile::tempdir().unwrap();
        let (mut manager, _) = manager(dir.path(), "[printer]\nkinematics: corexy\n");
        let read = manager.read_main_config().unwrap();
        read.section("printer").get_str("kinematics").unwrap();
        manager.check_unused_options(&read, &[]).unwrap();

        manager.set_option("printer", "max_velocity", &250);
        let status = manager.get_status();
        assert_eq!(status["config"]["printer"]["kinematics"], "corexy");
        assert_eq!(status["settings"]["printer"]["kinematics"], "corexy");
        assert_eq!(status["save_config_pending"], true);
        assert_eq!(status["save_config_pending_items"]["printer"]["max_velocity"], "250");
    }

    #[test]
    fn reconcile_with_base_config_and_migrations() {
        let dir = tempfile::tempdir().unwrap();
        let base = dir.path().join("printer_base.cfg");
        std::fs::write(&base, "[printer]\nkinematics: corexy\n[safe_z_home]\nz_hop: 10\n[include macros.cfg]\n").unwrap();
        let (manager, restarts) =
            manager(dir.path(), "[printer]\nmax_accel_to_decel: 500\n[wifi_mode]\nssid: x\n");
        let mut manager = manager.with_base_config(&base);

        let read = manager.read_main_config().unwrap();
        let outcome = manager.reconcile(&read).unwrap().expect("changes should be saved");
        assert!(outcome.migrated);
        assert_eq!(restarts.0.borrow().len(), 1);

        let doc = manager.read_main_config().unwrap();
        let doc = doc.document();
        assert_eq!(doc.get("safe_z_home", "z_hop"), Some("10"));
        assert!(!doc.has_section("wifi_mode"));
        assert!(!doc.has_section("include macros.cfg"));
        assert!(!doc.has_option("printer", "max_accel_to_decel"));
        assert_eq!(doc.get("printer", "minimum_cruise_ratio"), Some("0.5"));

        let read = manager.read_main_config().unwrap();
        assert_eq!(manager.reconcile(&read).unwrap(), None);
    }

    #[test]
    fn log_config_frames_the_dump() {
        let dir = tempfile::tempdir().unwrap();
        let (manager, _) = manager(dir.path(), "[printer]\nkinematics: corexy\n");
        let read = manager.read_main_config().unwrap();
        let dump = manager.log_config(&read);
        assert_eq!(
            dump,
            "===== Config file =====\n[printer]\nkinematics: corexy\n======================="
        );
    }
}
