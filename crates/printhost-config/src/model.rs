// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host settings: how the tool itself is configured.
//!
//! These are separate from the printer configuration document. All structs
//! use `#[serde(deny_unknown_fields)]` so a typo in `printhost.toml` is
//! reported with a suggestion instead of being ignored.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Top-level host settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct HostSettings {
    /// Where the printer configuration lives.
    #[serde(default)]
    pub printer: PrinterSettings,

    /// Backup behaviour for SAVE_CONFIG.
    #[serde(default)]
    pub backup: BackupSettings,

    /// Logging settings.
    #[serde(default)]
    pub log: LogSettings,
}

/// Printer configuration file location.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PrinterSettings {
    /// Main printer configuration file.
    #[serde(default = "default_config_path")]
    pub config_path: PathBuf,

    /// Reference configuration whose sections must exist in the user's file.
    #[serde(default)]
    pub base_config: Option<PathBuf>,

    /// Reference file for the RESUME macro kept in `pause_resume.cfg`.
    #[serde(default)]
    pub pause_resume_base: Option<PathBuf>,

    /// Honour `[include ...]` directives.
    #[serde(default = "default_true")]
    pub allow_includes: bool,
}

impl Default for PrinterSettings {
    fn default() -> Self {
        Self {
            config_path: default_config_path(),
            base_config: None,
            pause_resume_base: None,
            allow_includes: true,
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("printer_data/config/printer.cfg")
}

fn default_true() -> bool {
    true
}

/// Backup rotation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackupSettings {
    /// Copy the current file aside before overwriting it.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Number of timestamped backups kept next to the config file.
    #[serde(default = "default_retention")]
    pub retention: usize,
}

impl Default for BackupSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            retention: default_retention(),
        }
    }
}

fn default_retention() -> usize {
    5
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LogSettings {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let settings = HostSettings::default();
        assert!(settings.printer.config_path.ends_with("printer_data/config/printer.cfg"));
        assert!(settings.printer.base_config.is_none());
        assert!(settings.printer.pause_resume_base.is_none());
        assert!(settings.printer.allow_includes);
        assert!(settings.backup.enabled);
        assert_eq!(settings.backup.retention, 5);
        assert_eq!(settings.log.level, "info");
    }

    #[test]
    fn reference_files_parse() {
        let settings: HostSettings = toml::from_str(
            "[printer]\nbase_config = \"/opt/printhost/printer_base.cfg\"\npause_resume_base = \"/opt/printhost/pause_resume_base.cfg\"\n",
        )
        .unwrap();
        assert_eq!(
            settings.printer.pause_resume_base.as_deref(),
            Some(std::path::Path::new("/opt/printhost/pause_resume_base.cfg"))
        );
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = toml::from_str::<HostSettings>("[backup]\nretentoin = 3\n").unwrap_err();
        assert!(err.to_string().contains("retentoin"));
    }
}
