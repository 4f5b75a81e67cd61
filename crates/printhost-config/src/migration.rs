// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Declarative schema migrations applied by a migrating save.

use crate::document::{Document, names_match};

/// What changed in one section's schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationRule {
    pub section: String,
    /// Obsolete options to drop.
    pub remove: Vec<String>,
    /// New options and their defaults.
    pub add: Vec<(String, String)>,
    /// When this option is already present the user has customized the
    /// section and additions are skipped.
    pub sentinel: Option<String>,
}

impl MigrationRule {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            remove: Vec::new(),
            add: Vec::new(),
            sentinel: None,
        }
    }

    pub fn remove(mut self, option: impl Into<String>) -> Self {
        self.remove.push(option.into());
        self
    }

    pub fn add(mut self, option: impl Into<String>, default: impl Into<String>) -> Self {
        self.add.push((option.into(), default.into()));
        self
    }

    pub fn sentinel(mut self, option: impl Into<String>) -> Self {
        self.sentinel = Some(option.into());
        self
    }

    /// Whether `doc` still uses the old schema for this section.
    fn is_stale(&self, doc: &Document) -> bool {
        let Some(section) = doc.section(&self.section) else {
            return false;
        };
        let has_removed = self.remove.iter().any(|o| section.has_option(o));
        let customized = self
            .sentinel
            .as_deref()
            .is_some_and(|s| section.has_option(s));
        let missing_added = !customized && self.add.iter().any(|(o, _)| !section.has_option(o));
        has_removed || missing_added
    }

    /// Apply the rule to `doc` in place. Sections absent from `doc` are left
    /// alone.
    fn apply(&self, doc: &mut Document) {
        let Some(section) = doc.section_mut(&self.section) else {
            return;
        };
        for option in &self.remove {
            section.remove(option);
        }
        let customized = self
            .sentinel
            .as_deref()
            .is_some_and(|s| section.has_option(s));
        if customized {
            return;
        }
        for (option, default) in &self.add {
            if !section.has_option(option) {
                section.set(option, default.as_str());
            }
        }
    }
}

/// Every known schema change plus the sections that no longer exist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationTable {
    rules: Vec<MigrationRule>,
    deprecated_sections: Vec<String>,
}

impl MigrationTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn rule(mut self, rule: MigrationRule) -> Self {
        self.rules.push(rule);
        self
    }

    pub fn deprecated_section(mut self, section: impl Into<String>) -> Self {
        self.deprecated_sections.push(section.into());
        self
    }

    pub fn rules(&self) -> &[MigrationRule] {
        &self.rules
    }

    pub fn deprecated_sections(&self) -> impl Iterator<Item = &str> {
        self.deprecated_sections.iter().map(String::as_str)
    }

    pub fn is_deprecated_section(&self, name: &str) -> bool {
        self.deprecated_sections.iter().any(|s| names_match(s, name))
    }

    /// Whether any rule would change `doc`.
    pub fn is_stale(&self, doc: &Document) -> bool {
        self.rules.iter().any(|r| r.is_stale(doc))
    }

    pub fn apply(&self, doc: &mut Document) {
        for rule in &self.rules {
            rule.apply(doc);
        }
    }
}

/// The schema changes shipped with this release.
pub fn default_migrations() -> MigrationTable {
    MigrationTable::new()
        .rule(
            MigrationRule::new("printer")
                .remove("max_accel_to_decel")
                .add("minimum_cruise_ratio", "0.5")
                .sentinel("minimum_cruise_ratio"),
        )
        .deprecated_section("motor_checker")
        .deprecated_section("wifi_mode")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_text;

    #[test]
    fn default_printer_rule() {
        let mut doc = parse_text("[printer]\nmax_accel_to_decel: 500\nmax_velocity: 300\n").unwrap();
        let table = default_migrations();
        assert!(table.is_stale(&doc));

        table.apply(&mut doc);
        assert!(!doc.has_option("printer", "max_accel_to_decel"));
        assert_eq!(doc.get("printer", "minimum_cruise_ratio"), Some("0.5"));
        assert_eq!(doc.get("printer", "max_velocity"), Some("300"));
        assert!(!table.is_stale(&doc));
    }

    #[test]
    fn sentinel_keeps_user_value() {
        let mut doc =
            parse_text("[printer]\nmax_accel_to_decel: 500\nminimum_cruise_ratio: 0.2\n").unwrap();
        default_migrations().apply(&mut doc);
        assert_eq!(doc.get("printer", "minimum_cruise_ratio"), Some("0.2"));
        assert!(!doc.has_option("printer", "max_accel_to_decel"));
    }

    #[test]
    fn additions_skipped_when_customized() {
        let rule = MigrationRule::new("bltouch")
            .add("samples", "3")
            .add("speed", "5")
            .sentinel("samples_tolerance");
        let mut doc = parse_text("[bltouch]\nsamples_tolerance: 0.01\n").unwrap();
        let table = MigrationTable::new().rule(rule);
        assert!(!table.is_stale(&doc));
        table.apply(&mut doc);
        assert!(!doc.has_option("bltouch", "samples"));
    }

    #[test]
    fn absent_section_is_untouched() {
        let mut doc = parse_text("[fan]\npin: PA1\n").unwrap();
        let table = default_migrations();
        assert!(!table.is_stale(&doc));
        table.apply(&mut doc);
        assert!(!doc.has_section("printer"));
    }

    #[test]
    fn deprecated_sections() {
        let table = default_migrations();
        assert!(table.is_deprecated_section("Wifi_Mode"));
        assert_eq!(table.deprecated_sections().collect::<Vec<_>>(), vec!["motor_checker", "wifi_mode"]);
    }
}
