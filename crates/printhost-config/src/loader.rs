// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host settings loader using Figment for layered merging.
//!
//! `./printhost.toml` > `<config_dir>/printhost/printhost.toml` >
//! `/etc/printhost/printhost.toml`, with `PRINTHOST_` environment overrides
//! on top.

#![allow(clippy::result_large_err)] // figment::Error is external

use std::path::{Path, PathBuf};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::HostSettings;

pub(crate) const SYSTEM_SETTINGS: &str = "/etc/printhost/printhost.toml";
pub(crate) const LOCAL_SETTINGS: &str = "printhost.toml";

/// Per-user settings file under the platform config directory.
pub(crate) fn user_settings_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("printhost/printhost.toml"))
        .unwrap_or_default()
}

/// Load host settings from every layer.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/printhost/printhost.toml`
/// 3. `<config_dir>/printhost/printhost.toml`
/// 4. `./printhost.toml`
/// 5. `PRINTHOST_*` environment variables
pub fn load_settings() -> Result<HostSettings, figment::Error> {
    build_figment().extract()
}

/// Load host settings from a TOML string only.
pub fn load_settings_from_str(toml_content: &str) -> Result<HostSettings, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HostSettings::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load host settings from one file with environment overrides.
pub fn load_settings_from_path(path: &Path) -> Result<HostSettings, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(HostSettings::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// The full layered Figment, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(HostSettings::default()))
        .merge(Toml::file(SYSTEM_SETTINGS))
        .merge(Toml::file(user_settings_path()))
        .merge(Toml::file(LOCAL_SETTINGS))
        .merge(env_provider())
}

/// Environment provider mapping `PRINTHOST_<SECTION>_<KEY>` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because keys such as
/// `config_path` contain underscores themselves.
fn env_provider() -> Env {
    Env::prefixed("PRINTHOST_").map(|key| {
        key.as_str()
            .replacen("printer_", "printer.", 1)
            .replacen("backup_", "backup.", 1)
            .replacen("log_", "log.", 1)
            .into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn string_overrides_defaults() {
        let settings = load_settings_from_str(
            "[printer]\nconfig_path = \"/tmp/p.cfg\"\n[backup]\nretention = 2\n",
        )
        .unwrap();
        assert_eq!(settings.printer.config_path, PathBuf::from("/tmp/p.cfg"));
        assert_eq!(settings.backup.retention, 2);
        assert!(settings.backup.enabled);
    }

    #[test]
    fn env_maps_to_sections() {
        figment::Jail::expect_with(|jail| {
            jail.create_file("settings.toml", "[backup]\nretention = 2\n")?;
            jail.set_env("PRINTHOST_BACKUP_RETENTION", "9");
            jail.set_env("PRINTHOST_PRINTER_CONFIG_PATH", "/srv/printer.cfg");
            jail.set_env("PRINTHOST_LOG_LEVEL", "debug");

            let settings = load_settings_from_path(Path::new("settings.toml"))?;
            assert_eq!(settings.backup.retention, 9);
            assert_eq!(settings.printer.config_path, PathBuf::from("/srv/printer.cfg"));
            assert_eq!(settings.log.level, "debug");
            Ok(())
        });
    }
}
