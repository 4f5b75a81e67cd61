// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `printhost save-config` command implementation.
//!
//! Queues the requested removals and assignments, then runs SAVE_CONFIG
//! with the given flags.

use printhost_config::{ConfigManager, SaveConfigCommand, SaveOutcome, UpdateRequest};
use printhost_core::PrintHostError;

/// Arguments of `save-config`.
#[derive(Debug, Clone, Default)]
pub struct SaveArgs {
    pub no_restart: bool,
    pub no_backup: bool,
    pub migrate: bool,
    pub set: Vec<String>,
    pub remove_section: Vec<String>,
}

/// Split `SECTION/OPTION=VALUE`. The section is everything before the last
/// `/` of the key, so section names with spaces work unquoted by the shell.
pub fn parse_assignment(raw: &str) -> Result<(String, String, String), PrintHostError> {
    let invalid = || PrintHostError::Command(format!("Expected SECTION/OPTION=VALUE, got '{raw}'"));

    let (key, value) = raw.split_once('=').ok_or_else(invalid)?;
    let (section, option) = key.rsplit_once('/').ok_or_else(invalid)?;
    let (section, option) = (section.trim(), option.trim());
    if section.is_empty() || option.is_empty() {
        return Err(invalid());
    }
    Ok((section.to_string(), option.to_string(), value.trim().to_string()))
}

/// Run `save-config` against `manager`.
///
/// Removals are queued before assignments. An assignment into a section
/// queued for removal cancels the removal.
pub fn run_save_config(manager: &mut ConfigManager, args: &SaveArgs) -> Result<SaveOutcome, PrintHostError> {
    let mut set: Vec<(String, Vec<(String, String)>)> = Vec::new();
    for raw in &args.set {
        let (section, option, value) = parse_assignment(raw)?;
        match set.iter_mut().find(|(name, _)| *name == section) {
            Some((_, options)) => options.push((option, value)),
            None => set.push((section, vec![(option, value)])),
        }
    }

    for section in &args.remove_section {
        manager.remove_section(section)?;
    }
    manager.update_config(UpdateRequest {
        set,
        ..UpdateRequest::default()
    })?;

    SaveConfigCommand {
        restart: !args.no_restart,
        backup: !args.no_backup,
        migrate: args.migrate,
    }
    .execute(manager)
}

pub fn print_outcome(outcome: &SaveOutcome) {
    println!("printhost: saved {}", outcome.path.display());
    if let Some(backup) = &outcome.backup {
        println!("printhost: previous version kept as {}", backup.display());
    }
    if outcome.migrated {
        println!("printhost: obsolete options migrated");
    }
}
