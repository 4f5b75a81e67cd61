// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Which options a configuration read actually consulted.

use std::collections::BTreeMap;

use serde_json::Value;

/// Last validated value (or default) per lowercased `(section, option)`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccessRecord {
    sections: BTreeMap<String, BTreeMap<String, Value>>,
}

impl AccessRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, section: &str, option: &str, value: Value) {
        self.sections
            .entry(section.to_lowercase())
            .or_default()
            .insert(option.to_lowercase(), value);
    }

    pub fn contains(&self, section: &str, option: &str) -> bool {
        self.sections
            .get(&section.to_lowercase())
            .is_some_and(|opts| opts.contains_key(&option.to_lowercase()))
    }

    /// Whether any option of `section` was consulted.
    pub fn section_accessed(&self, section: &str) -> bool {
        self.sections.contains_key(&section.to_lowercase())
    }

    pub fn get(&self, section: &str, option: &str) -> Option<&Value> {
        self.sections
            .get(&section.to_lowercase())
            .and_then(|opts| opts.get(&option.to_lowercase()))
    }

    /// Options consulted in one section, in lexical order.
    pub fn options(&self, section: &str) -> impl Iterator<Item = &str> {
        self.sections
            .get(&section.to_lowercase())
            .into_iter()
            .flat_map(|opts| opts.keys().map(String::as_str))
    }

    /// Everything recorded, grouped by section.
    pub fn by_section(&self) -> &BTreeMap<String, BTreeMap<String, Value>> {
        &self.sections
    }

    pub fn len(&self) -> usize {
        self.sections.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}
