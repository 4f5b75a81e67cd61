// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Printer configuration subsystem.
//!
//! Parses the INI-like printer configuration (with includes and an
//! autosave trailer), hands host objects typed, access-tracked section
//! views, accumulates runtime changes, and rewrites the file on
//! SAVE_CONFIG with comments and backups preserved.
//!
//! Also loads the host settings of the tool itself from TOML via Figment.
//!
//! # Usage
//!
//! ```no_run
//! use std::rc::Rc;
//! use printhost_config::{ConfigManager, Get};
//! # use printhost_core::{LocalFs, PrintHostError, RestartKind, RestartSink};
//! # struct NoRestart;
//! # impl RestartSink for NoRestart {
//! #     fn request_restart(&self, _: RestartKind) -> Result<(), PrintHostError> { Ok(()) }
//! # }
//!
//! let manager = ConfigManager::new("printer.cfg", Rc::new(LocalFs), Rc::new(NoRestart));
//! let read = manager.read_main_config().expect("config errors");
//! let velocity = read
//!     .section("printer")
//!     .get_float("max_velocity", Get::default_value(300.0).above(0.0))
//!     .expect("invalid max_velocity");
//! println!("max_velocity: {velocity}");
//! ```

pub mod access;
pub mod autosave;
pub mod command;
pub mod comments;
pub mod deprecation;
pub mod diagnostic;
pub mod document;
pub mod include;
pub mod loader;
pub mod manager;
pub mod merge;
pub mod migration;
pub mod model;
pub mod parser;
pub mod pending;
pub mod section;
pub mod status;
pub mod validation;
pub mod value;
pub mod writer;

pub use access::AccessRecord;
pub use autosave::{AUTOSAVE_HEADER, AutosaveSplitter, SplitConfig};
pub use command::SaveConfigCommand;
pub use comments::CommentMap;
pub use deprecation::{DeprecationLedger, DeprecationSink, DeprecationWarning};
pub use diagnostic::{ConfigError, RangeBound, render_errors};
pub use document::{ConfigOption, Document, Section};
pub use loader::{load_settings, load_settings_from_path, load_settings_from_str};
pub use manager::{ConfigManager, SaveOptions, SaveOutcome, UpdateRequest};
pub use merge::merge;
pub use migration::{MigrationRule, MigrationTable, default_migrations};
pub use model::HostSettings;
pub use parser::{DocumentParser, ParseOptions, ParsedConfig, parse_text};
pub use pending::PendingChangeSet;
pub use section::{ConfigRead, SectionView};
pub use status::ConfigStatus;
pub use value::{ChoiceKey, Choices, ConfigValue, Get, ListSpec, ListValue};
pub use writer::{AtomicWriter, BackupPolicy};

/// Load host settings from every layer and validate them.
///
/// Figment failures become diagnostics with key suggestions and source
/// spans; validation failures are collected, not fail-fast.
pub fn load_and_validate() -> Result<HostSettings, Vec<ConfigError>> {
    match loader::load_settings() {
        Ok(settings) => {
            validation::validate_settings(&settings)?;
            Ok(settings)
        }
        Err(err) => {
            let toml_sources = collect_toml_sources();
            Err(diagnostic::figment_to_config_errors(err, &toml_sources))
        }
    }
}

/// Load host settings from one TOML string and validate them.
pub fn load_and_validate_str(toml_content: &str) -> Result<HostSettings, Vec<ConfigError>> {
    match loader::load_settings_from_str(toml_content) {
        Ok(settings) => {
            validation::validate_settings(&settings)?;
            Ok(settings)
        }
        Err(err) => {
            let sources = vec![("<inline>".to_string(), toml_content.to_string())];
            Err(diagnostic::figment_to_config_errors(err, &sources))
        }
    }
}

/// Settings file contents for error span resolution.
fn collect_toml_sources() -> Vec<(String, String)> {
    let mut sources = Vec::new();

    if let Ok(content) = std::fs::read_to_string(loader::LOCAL_SETTINGS) {
        let path = std::env::current_dir()
            .map(|d| d.join(loader::LOCAL_SETTINGS).display().to_string())
            .unwrap_or_else(|_| loader::LOCAL_SETTINGS.to_string());
        sources.push((path, content));
    }

    let user = loader::user_settings_path();
    if let Ok(content) = std::fs::read_to_string(&user) {
        sources.push((user.display().to_string(), content));
    }

    if let Ok(content) = std::fs::read_to_string(loader::SYSTEM_SETTINGS) {
        sources.push((loader::SYSTEM_SETTINGS.to_string(), content));
    }

    sources
}
