// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deprecation reporting.
//!
//! Host objects flag stale options through their section view; the view
//! forwards to a [`DeprecationSink`]. The [`DeprecationLedger`] keeps one
//! message per `(section, option, value)` for the status snapshot.

use std::cell::RefCell;
use std::collections::BTreeMap;

use serde::Serialize;

/// Receives deprecation notices from section views.
pub trait DeprecationSink {
    fn deprecate(&self, section: &str, option: &str, value: Option<&str>, message: &str);
}

/// Kind of deprecation surfaced in the status snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    DeprecatedOption,
    DeprecatedValue,
}

/// One entry of the status `warnings` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeprecationWarning {
    #[serde(rename = "type")]
    pub kind: WarningKind,
    pub message: String,
    pub section: String,
    pub option: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

type LedgerKey = (String, String, Option<String>);

/// In-memory deprecation ledger, shared by every view of a read.
#[derive(Debug, Default)]
pub struct DeprecationLedger {
    entries: RefCell<BTreeMap<LedgerKey, String>>,
}

impl DeprecationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Entries in `(section, option, value)` order.
    pub fn warnings(&self) -> Vec<DeprecationWarning> {
        self.entries
            .borrow()
            .iter()
            .map(|((section, option, value), message)| DeprecationWarning {
                kind: if value.is_some() {
                    WarningKind::DeprecatedValue
                } else {
                    WarningKind::DeprecatedOption
                },
                message: message.clone(),
                section: section.clone(),
                option: option.clone(),
                value: value.clone(),
            })
            .collect()
    }
}

impl DeprecationSink for DeprecationLedger {
    fn deprecate(&self, section: &str, option: &str, value: Option<&str>, message: &str) {
        self.entries.borrow_mut().insert(
            (
                section.to_string(),
                option.to_string(),
                value.map(str::to_string),
            ),
            message.to_string(),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_key_keeps_latest_message() {
        let ledger = DeprecationLedger::new();
        ledger.deprecate("fan", "pin", None, "first");
        ledger.deprecate("fan", "pin", None, "second");
        ledger.deprecate("fan", "mode", Some("legacy"), "value");

        let warnings = ledger.warnings();
        assert_eq!(warnings.len(), 2);
        assert_eq!(warnings[0].kind, WarningKind::DeprecatedValue);
        assert_eq!(warnings[1].message, "second");
    }

    #[test]
    fn warning_serializes_like_status_entry() {
        let ledger = DeprecationLedger::new();
        ledger.deprecate("fan", "pin", None, "Option 'pin' in section 'fan' is deprecated.");
        let json = serde_json::to_value(&ledger.warnings()[0]).unwrap();
        assert_eq!(json["type"], "deprecated_option");
        assert_eq!(json["section"], "fan");
        assert!(json.get("value").is_none());
    }
}
