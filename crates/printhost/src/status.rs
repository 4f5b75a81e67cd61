// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `printhost status` command implementation.
//!
//! Reads the config file and shows the status snapshot: raw values,
//! deprecation warnings and pending state. `--json` prints the snapshot
//! as-is for scripting.

use std::io::IsTerminal;

use printhost_config::ConfigManager;
use printhost_config::status::{ConfigStatus, project};
use printhost_core::PrintHostError;

/// Counts shown by the human-readable report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSummary {
    pub path: String,
    pub sections: usize,
    pub options: usize,
    pub autosave_sections: usize,
    pub pending: bool,
    pub warnings: Vec<String>,
}

/// Read the main config and build the snapshot plus its summary.
pub fn collect_status(manager: &ConfigManager) -> Result<(ConfigStatus, StatusSummary), PrintHostError> {
    let read = manager.read_main_config()?;
    let snapshot = manager.snapshot();
    let status = ConfigStatus {
        save_config_pending: snapshot.save_config_pending,
        save_config_pending_items: snapshot.save_config_pending_items,
        ..project(&read, &manager.deprecations())
    };

    let summary = StatusSummary {
        path: manager.main_path().display().to_string(),
        sections: status.config.len(),
        options: status.config.values().map(|options| options.len()).sum(),
        autosave_sections: read.autosave().len(),
        pending: status.save_config_pending,
        warnings: status.warnings.iter().map(|w| w.message.clone()).collect(),
    };
    Ok((status, summary))
}

/// Run the `printhost status` command.
pub fn run_status(manager: &ConfigManager, json: bool, plain: bool) -> Result<(), PrintHostError> {
    let (status, summary) = collect_status(manager)?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&status).unwrap_or_else(|_| "{}".to_string())
        );
    } else {
        let use_color = !plain && std::io::stdout().is_terminal();
        print_summary(&summary, use_color);
    }
    Ok(())
}

fn print_summary(summary: &StatusSummary, use_color: bool) {
    println!();
    println!("  printhost status");
    println!("  {}", "-".repeat(35));
    println!("    File:     {}", summary.path);
    println!(
        "    Config:   {} sections, {} options ({} from autosave)",
        summary.sections, summary.options, summary.autosave_sections
    );

    let pending = if summary.pending { "unsaved changes" } else { "none" };
    if use_color {
        use colored::Colorize;
        let pending = if summary.pending {
            pending.yellow().to_string()
        } else {
            pending.green().to_string()
        };
        println!("    Pending:  {pending}");
        for warning in &summary.warnings {
            println!("    {} {}", "!".yellow(), warning.yellow());
        }
    } else {
        println!("    Pending:  {pending}");
        for warning in &summary.warnings {
            println!("    [WARN] {warning}");
        }
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use printhost_config::AUTOSAVE_HEADER;
    use printhost_test_utils::ConfigHarness;

    #[test]
    fn summary_counts_autosave_sections() {
        let main = format!(
            "[printer]\nkinematics: corexy\nmax_velocity: 300\n{AUTOSAVE_HEADER}#*# [bltouch]\n#*# z_offset = 1.25\n"
        );
        let harness = ConfigHarness::builder().with_main(&main).build().unwrap();

        let (status, summary) = collect_status(&harness.manager).unwrap();
        assert_eq!(summary.sections, 2);
        assert_eq!(summary.options, 3);
        assert_eq!(summary.autosave_sections, 1);
        assert!(!summary.pending);
        assert_eq!(status.config["bltouch"]["z_offset"], "1.25");
    }

    #[test]
    fn pending_changes_show_in_snapshot() {
        let mut harness = ConfigHarness::builder().with_main("[printer]\n").build().unwrap();
        harness.manager.set_option("printer", "max_velocity", &250);

        let (status, summary) = collect_status(&harness.manager).unwrap();
        assert!(summary.pending);
        assert_eq!(status.save_config_pending_items["printer"]["max_velocity"], "250");

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["save_config_pending"], true);
    }

    #[test]
    fn unreadable_config_is_an_error() {
        let harness = ConfigHarness::builder()
            .with_main("[printer]\n[include missing.cfg]\n")
            .build()
            .unwrap();
        assert!(collect_status(&harness.manager).is_err());
    }
}
