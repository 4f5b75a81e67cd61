// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `printhost check` command implementation.
//!
//! Runs diagnostic checks against the printer config file: readability,
//! autosave integrity, include resolution, parse, schema freshness and
//! backups.

use std::io::IsTerminal;
use std::path::Path;
use std::time::{Duration, Instant};

use printhost_config::writer::list_backups;
use printhost_config::{AutosaveSplitter, ConfigManager, HostSettings, parse_text};
use printhost_core::{ConfigFs, PrintHostError};

/// Status of a diagnostic check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckStatus {
    /// Check passed successfully.
    Pass,
    /// Check passed with a warning.
    Warn,
    /// Check failed.
    Fail,
}

/// Result of a single diagnostic check.
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub duration: Duration,
}

impl CheckResult {
    fn new(name: &str, status: CheckStatus, message: impl Into<String>, start: Instant) -> Self {
        Self {
            name: name.to_string(),
            status,
            message: message.into(),
            duration: start.elapsed(),
        }
    }
}

/// Run every check, in report order.
pub fn run_checks(fs: &dyn ConfigFs, manager: &ConfigManager, settings: &HostSettings) -> Vec<CheckResult> {
    let path = manager.main_path();
    let start = Instant::now();
    let text = match fs.read_to_string(path) {
        Ok(text) => text,
        Err(err) => {
            return vec![CheckResult::new(
                "Config file",
                CheckStatus::Fail,
                format!("unreadable: {} ({err})", path.display()),
                start,
            )];
        }
    };
    let mut results = vec![CheckResult::new(
        "Config file",
        CheckStatus::Pass,
        format!("{} ({} lines)", path.display(), text.lines().count()),
        start,
    )];

    results.push(check_autosave(&text));
    results.push(check_includes(manager, &text, settings.printer.allow_includes));
    results.push(check_parse_and_schema(manager));
    results.push(check_backups(fs, path, settings));
    results
}

fn check_autosave(text: &str) -> CheckResult {
    let start = Instant::now();
    match AutosaveSplitter::try_split(text) {
        Ok(split) => match parse_text(&split.autosave) {
            Ok(doc) if doc.is_empty() => CheckResult::new("Autosave", CheckStatus::Pass, "no saved block", start),
            Ok(doc) => CheckResult::new("Autosave", CheckStatus::Pass, format!("{} sections", doc.len()), start),
            Err(err) => CheckResult::new("Autosave", CheckStatus::Fail, err.to_string(), start),
        },
        Err(err) => CheckResult::new(
            "Autosave",
            CheckStatus::Warn,
            format!("{err}; the block will be ignored"),
            start,
        ),
    }
}

fn check_includes(manager: &ConfigManager, text: &str, allow_includes: bool) -> CheckResult {
    let start = Instant::now();
    let regular = AutosaveSplitter::split(text).regular;
    let directives = match parse_text(&regular) {
        Ok(doc) => doc.section_names().filter(|name| name.starts_with("include ")).count(),
        Err(err) => return CheckResult::new("Includes", CheckStatus::Fail, err.to_string(), start),
    };

    if directives == 0 {
        return CheckResult::new("Includes", CheckStatus::Pass, "none", start);
    }
    if !allow_includes {
        return CheckResult::new(
            "Includes",
            CheckStatus::Warn,
            format!("{directives} directive(s) ignored, includes are disabled"),
            start,
        );
    }
    match manager.read_config(manager.main_path(), true) {
        Ok(_) => CheckResult::new("Includes", CheckStatus::Pass, format!("{directives} resolved"), start),
        Err(err) => CheckResult::new("Includes", CheckStatus::Fail, err.to_string(), start),
    }
}

fn check_parse_and_schema(manager: &ConfigManager) -> CheckResult {
    let start = Instant::now();
    let read = match manager.read_main_config() {
        Ok(read) => read,
        Err(err) => return CheckResult::new("Schema", CheckStatus::Fail, err.to_string(), start),
    };

    let migrations = manager.migrations();
    let deprecated: Vec<&str> = migrations
        .deprecated_sections()
        .filter(|section| read.has_section(section))
        .collect();
    if !deprecated.is_empty() {
        return CheckResult::new(
            "Schema",
            CheckStatus::Warn,
            format!("deprecated sections: {}", deprecated.join(", ")),
            start,
        );
    }
    match manager.main_schema_stale() {
        Ok(true) => {
            return CheckResult::new(
                "Schema",
                CheckStatus::Warn,
                "obsolete options, run `printhost save-config --migrate`",
                start,
            );
        }
        Ok(false) if migrations.is_stale(read.document()) => {
            return CheckResult::new(
                "Schema",
                CheckStatus::Warn,
                "obsolete options in included files, edit them by hand",
                start,
            );
        }
        Ok(false) => {}
        Err(err) => return CheckResult::new("Schema", CheckStatus::Fail, err.to_string(), start),
    }
    CheckResult::new(
        "Schema",
        CheckStatus::Pass,
        format!("{} sections, up to date", read.document().len()),
        start,
    )
}

fn check_backups(fs: &dyn ConfigFs, path: &Path, settings: &HostSettings) -> CheckResult {
    let start = Instant::now();
    if !settings.backup.enabled {
        return CheckResult::new("Backups", CheckStatus::Warn, "disabled", start);
    }
    let found = list_backups(fs, path).len();
    let retention = settings.backup.retention;
    if found > retention {
        CheckResult::new(
            "Backups",
            CheckStatus::Warn,
            format!("{found} kept, {} over retention", found - retention),
            start,
        )
    } else {
        CheckResult::new("Backups", CheckStatus::Pass, format!("{found} of {retention} kept"), start)
    }
}

/// Run the `printhost check` command.
///
/// Fails when any check fails, so scripts can use the exit code.
pub fn run_check(
    fs: &dyn ConfigFs,
    manager: &ConfigManager,
    settings: &HostSettings,
    plain: bool,
) -> Result<(), PrintHostError> {
    let use_color = !plain && std::io::stdout().is_terminal();
    let results = run_checks(fs, manager, settings);

    println!();
    println!("  printhost check");
    println!("  {}", "-".repeat(50));
    for result in &results {
        println!("{}", format_line(result, use_color));
    }
    println!();

    let fail_count = results.iter().filter(|r| r.status == CheckStatus::Fail).count();
    let warn_count = results.iter().filter(|r| r.status == CheckStatus::Warn).count();
    if fail_count > 0 || warn_count > 0 {
        let issues = fail_count + warn_count;
        let issue_word = if issues == 1 { "issue" } else { "issues" };
        println!("  {issues} {issue_word} found.");
    } else {
        println!("  All checks passed.");
    }
    println!();

    if fail_count > 0 {
        return Err(PrintHostError::Config(format!("{fail_count} check(s) failed")));
    }
    Ok(())
}

fn format_line(result: &CheckResult, use_color: bool) -> String {
    let duration_ms = result.duration.as_millis();
    if use_color {
        use colored::Colorize;
        let (symbol, message) = match result.status {
            CheckStatus::Pass => ("✓".green(), result.message.normal()),
            CheckStatus::Warn => ("!".yellow(), result.message.yellow()),
            CheckStatus::Fail => ("✗".red(), result.message.red()),
        };
        format!("    {symbol} {:<12} {message} ({duration_ms}ms)", result.name)
    } else {
        let tag = match result.status {
            CheckStatus::Pass => "[OK]  ",
            CheckStatus::Warn => "[WARN]",
            CheckStatus::Fail => "[FAIL]",
        };
        format!("    {tag} {:<12} {} ({duration_ms}ms)", result.name, result.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use printhost_config::{AUTOSAVE_HEADER, BackupPolicy};
    use printhost_test_utils::ConfigHarness;

    fn settings() -> HostSettings {
        HostSettings::default()
    }

    fn statuses(results: &[CheckResult]) -> Vec<(&str, CheckStatus)> {
        results.iter().map(|r| (r.name.as_str(), r.status.clone())).collect()
    }

    #[test]
    fn healthy_config_passes_everything() {
        let harness = ConfigHarness::builder()
            .with_main("[printer]\nminimum_cruise_ratio: 0.5\n[include macros.cfg]\n")
            .with_file("macros.cfg", "[gcode_macro START]\ngcode: G28\n")
            .with_backup(BackupPolicy {
                enabled: true,
                retention: 5,
            })
            .build()
            .unwrap();

        let results = run_checks(harness.fs.as_ref(), &harness.manager, &settings());
        assert!(
            results.iter().all(|r| r.status == CheckStatus::Pass),
            "{:?}",
            statuses(&results)
        );
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn missing_file_fails_fast() {
        let harness = ConfigHarness::builder().with_main("").build().unwrap();
        std::fs::remove_file(harness.main_path()).unwrap();

        let results = run_checks(harness.fs.as_ref(), &harness.manager, &settings());
        assert_eq!(statuses(&results), vec![("Config file", CheckStatus::Fail)]);
    }

    #[test]
    fn corrupt_autosave_warns() {
        let main = format!("[printer]\n{AUTOSAVE_HEADER}#*# [bltouch]\nz_offset = 1.0\n");
        let harness = ConfigHarness::builder().with_main(&main).build().unwrap();

        let result = check_autosave(&harness.main_text());
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("modifications after header"));
    }

    #[test]
    fn unresolved_include_fails() {
        let harness = ConfigHarness::builder()
            .with_main("[printer]\n[include missing/*.cfg]\n[include gone.cfg]\n")
            .build()
            .unwrap();

        let result = check_includes(&harness.manager, &harness.main_text(), true);
        assert_eq!(result.status, CheckStatus::Fail);

        let result = check_includes(&harness.manager, &harness.main_text(), false);
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.starts_with("2 directive(s)"));
    }

    #[test]
    fn obsolete_options_and_sections_warn() {
        let harness = ConfigHarness::builder()
            .with_main("[printer]\nmax_accel_to_decel: 500\n")
            .build()
            .unwrap();
        let result = check_parse_and_schema(&harness.manager);
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(result.message.contains("--migrate"));

        let harness = ConfigHarness::builder()
            .with_main("[include hw.cfg]\n")
            .with_file("hw.cfg", "[printer]\nmax_accel_to_decel: 500\n")
            .build()
            .unwrap();
        let result = check_parse_and_schema(&harness.manager);
        assert_eq!(result.status, CheckStatus::Warn);
        assert!(!result.message.contains("--migrate"));

        let harness = ConfigHarness::builder()
            .with_main("[printer]\n[motor_checker]\n")
            .build()
            .unwrap();
        let result = check_parse_and_schema(&harness.manager);
        assert_eq!(result.message, "deprecated sections: motor_checker");
    }

    #[test]
    fn disabled_backups_warn() {
        let harness = ConfigHarness::builder().with_main("[printer]\n").build().unwrap();
        let mut settings = settings();
        settings.backup.enabled = false;

        let result = check_backups(harness.fs.as_ref(), harness.main_path(), &settings);
        assert_eq!(result.status, CheckStatus::Warn);
    }

    #[test]
    fn plain_lines_have_tags() {
        let result = CheckResult {
            name: "Backups".to_string(),
            status: CheckStatus::Fail,
            message: "x".to_string(),
            duration: Duration::from_millis(3),
        };
        assert_eq!(format_line(&result, false), "    [FAIL] Backups      x (3ms)");
    }
}
