// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The `SAVE_CONFIG` command surface.

use printhost_core::PrintHostError;

use crate::manager::{ConfigManager, SaveOptions, SaveOutcome};
use crate::value::parse_bool;

/// Parsed `SAVE_CONFIG` parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SaveConfigCommand {
    pub restart: bool,
    pub backup: bool,
    pub migrate: bool,
}

impl Default for SaveConfigCommand {
    fn default() -> Self {
        Self {
            restart: true,
            backup: true,
            migrate: false,
        }
    }
}

impl SaveConfigCommand {
    /// Build from command parameters.
    ///
    /// `NO_RESTART`, `NO_BACKUP` and `MIGRATE` are recognised
    /// case-insensitively. A bare key or a truthy value turns the flag on.
    /// Other parameters are ignored.
    pub fn from_params<K, V>(params: impl IntoIterator<Item = (K, V)>) -> Result<Self, PrintHostError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut cmd = Self::default();
        for (key, value) in params {
            let key = key.as_ref().to_ascii_uppercase();
            let value = value.as_ref();
            match key.as_str() {
                "NO_RESTART" => cmd.restart = !flag(&key, value)?,
                "NO_BACKUP" => cmd.backup = !flag(&key, value)?,
                "MIGRATE" => cmd.migrate = flag(&key, value)?,
                _ => {}
            }
        }
        Ok(cmd)
    }

    /// Run the save. Any refusal is a user-facing command error.
    pub fn execute(&self, manager: &mut ConfigManager) -> Result<SaveOutcome, PrintHostError> {
        manager
            .save_config(SaveOptions {
                restart: self.restart,
                backup: self.backup,
                migrate: self.migrate,
                target: None,
            })
            .map_err(|err| PrintHostError::Command(capitalize(&err.to_string())))
    }
}

fn flag(key: &str, value: &str) -> Result<bool, PrintHostError> {
    if value.trim().is_empty() {
        return Ok(true);
    }
    parse_bool(value).ok_or_else(|| {
        PrintHostError::Command(format!("Invalid value '{}' for parameter {key}", value.trim()))
    })
}

fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
