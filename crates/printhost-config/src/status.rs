// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Introspection snapshot of the configuration state.

use std::collections::BTreeMap;

use serde::Serialize;
use serde_json::Value;

use crate::deprecation::{DeprecationLedger, DeprecationWarning};
use crate::section::ConfigRead;
use crate::value::Get;

/// What `status` reports about the configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConfigStatus {
    /// Every option of every section, as raw text.
    pub config: BTreeMap<String, BTreeMap<String, String>>,
    /// Validated values of every consulted option, grouped by section.
    pub settings: BTreeMap<String, BTreeMap<String, Value>>,
    /// One entry per recorded deprecation.
    pub warnings: Vec<DeprecationWarning>,
    pub save_config_pending: bool,
    pub save_config_pending_items: Value,
}

/// Build the read-derived part of the snapshot.
///
/// Raw values are fetched with untracked reads so that inspection never
/// changes the access record.
pub fn project(read: &ConfigRead, ledger: &DeprecationLedger) -> ConfigStatus {
    let mut config = BTreeMap::new();
    for view in read.prefix_sections("") {
        let mut options = BTreeMap::new();
        for option in view.prefix_options("") {
            if let Ok(value) = view.get::<String>(&option, Get::required().untracked()) {
                options.insert(option, value);
            }
        }
        config.insert(view.name().to_string(), options);
    }

    ConfigStatus {
        config,
        settings: read.access().by_section().clone(),
        warnings: ledger.warnings(),
        save_config_pending: false,
        save_config_pending_items: Value::Object(Default::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Document;
    use crate::parser::parse_text;
    use serde_json::json;
    use std::rc::Rc;

    #[test]
    fn projection_does_not_touch_access_record() {
        let ledger = Rc::new(DeprecationLedger::new());
        let doc = parse_text("[printer]\nkinematics: corexy\nmax_velocity: 300\n").unwrap();
        let read = ConfigRead::new(doc, Document::new(), ledger.clone());
        read.section("printer")
            .get::<f64>("max_velocity", Get::required())
            .unwrap();
        read.section("printer").deprecate("kinematics", Some("corexy"));

        let status = project(&read, &ledger);
        assert_eq!(status.config["printer"]["kinematics"], "corexy");
        assert_eq!(status.settings["printer"]["max_velocity"], json!(300.0));
        assert!(!status.settings["printer"].contains_key("kinematics"));
        assert_eq!(status.warnings.len(), 1);
        assert_eq!(read.access().len(), 1);

        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["warnings"][0]["type"], "deprecated_value");
        assert_eq!(json["save_config_pending"], false);
    }
}
