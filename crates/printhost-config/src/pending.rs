// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Option writes and section removals that have not been saved yet.

use serde::Serialize;
use serde::ser::SerializeMap;
use tracing::error;

use crate::document::names_match;

/// Pending writes for one section, in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingSection {
    name: String,
    options: Vec<(String, String)>,
}

impl PendingSection {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> impl Iterator<Item = (&str, &str)> {
        self.options.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn set(&mut self, option: &str, value: String) {
        match self.options.iter_mut().find(|(k, _)| names_match(k, option)) {
            Some((_, existing)) => *existing = value,
            None => self.options.push((option.to_string(), value)),
        }
    }
}

/// Accumulated changes, drained by a successful save.
///
/// A section is never both pending removal and carrying pending writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingChangeSet {
    sections: Vec<PendingSection>,
    removed: Vec<String>,
}

impl PendingChangeSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Nothing to write.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty() && self.removed.is_empty()
    }

    pub fn sections(&self) -> impl Iterator<Item = &PendingSection> {
        self.sections.iter()
    }

    pub fn section(&self, name: &str) -> Option<&PendingSection> {
        self.sections.iter().find(|s| names_match(&s.name, name))
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    pub fn removed(&self) -> impl Iterator<Item = &str> {
        self.removed.iter().map(String::as_str)
    }

    pub fn is_removed(&self, name: &str) -> bool {
        self.removed.iter().any(|s| names_match(s, name))
    }

    /// Ensure `section` will exist after the save.
    pub fn ensure_section(&mut self, section: &str) {
        self.unmark_removed(section);
        self.entry(section);
    }

    /// Queue `section.option = value`.
    ///
    /// The value is stored in canonical string form. A value that cannot be
    /// converted is logged and stored as an empty string so it cannot block
    /// the rest of a batch.
    pub fn set_option<V: Serialize + ?Sized>(&mut self, section: &str, option: &str, value: &V) {
        let text = match canonical_string(value) {
            Ok(text) => text,
            Err(err) => {
                error!(section, option, error = %err, "can't convert value to string");
                String::new()
            }
        };
        self.unmark_removed(section);
        self.entry(section).set(option, text);
    }

    /// Drop every pending write for `section`. Returns whether there were any.
    pub fn discard_section(&mut self, section: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| !names_match(&s.name, section));
        self.sections.len() != before
    }

    /// Mark an on-disk section for deletion.
    pub fn mark_removed(&mut self, section: &str) {
        if !self.is_removed(section) {
            self.removed.push(section.to_string());
        }
    }

    /// Forget everything (after a successful save).
    pub fn clear(&mut self) {
        self.sections.clear();
        self.removed.clear();
    }

    fn unmark_removed(&mut self, section: &str) {
        self.removed.retain(|s| !names_match(s, section));
    }

    fn entry(&mut self, section: &str) -> &mut PendingSection {
        let idx = match self.sections.iter().position(|s| names_match(&s.name, section)) {
            Some(idx) => idx,
            None => {
                self.sections.push(PendingSection {
                    name: section.to_string(),
                    options: Vec::new(),
                });
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }
}

/// Serializes as `{section: {option: value}}`, the status
/// `save_config_pending_items` shape.
impl Serialize for PendingChangeSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        struct Options<'a>(&'a [(String, String)]);

        impl Serialize for Options<'_> {
            fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                let mut map = serializer.serialize_map(Some(self.0.len()))?;
                for (k, v) in self.0 {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }

        let mut map = serializer.serialize_map(Some(self.sections.len()))?;
        for section in &self.sections {
            map.serialize_entry(&section.name, &Options(&section.options))?;
        }
        map.end()
    }
}

/// Plain text for strings, JSON text for everything else.
fn canonical_string<V: Serialize + ?Sized>(value: &V) -> Result<String, serde_json::Error> {
    Ok(match serde_json::to_value(value)? {
        serde_json::Value::String(s) => s,
        serde_json::Value::Bool(true) => "True".to_string(),
        serde_json::Value::Bool(false) => "False".to_string(),
        other => other.to_string(),
    })
}
