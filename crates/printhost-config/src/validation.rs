// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for host settings.

use crate::diagnostic::ConfigError;
use crate::model::HostSettings;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Validate extracted host settings.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_settings(settings: &HostSettings) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if settings.printer.config_path.as_os_str().is_empty() {
        errors.push(ConfigError::Validation {
            message: "printer.config_path must not be empty".to_string(),
        });
    }

    if let Some(base) = &settings.printer.base_config
        && base.as_os_str().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "printer.base_config must not be empty when set".to_string(),
        });
    }

    if let Some(base) = &settings.printer.pause_resume_base
        && base.as_os_str().is_empty()
    {
        errors.push(ConfigError::Validation {
            message: "printer.pause_resume_base must not be empty when set".to_string(),
        });
    }

    if settings.backup.retention < 1 {
        errors.push(ConfigError::Validation {
            message: format!(
                "backup.retention must be at least 1, got {}",
                settings.backup.retention
            ),
        });
    }

    if !LOG_LEVELS.contains(&settings.log.level.as_str()) {
        errors.push(ConfigError::Validation {
            message: format!(
                "log.level must be one of {}, got `{}`",
                LOG_LEVELS.join(", "),
                settings.log.level
            ),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
