// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Combine the on-disk document with pending changes.

use tracing::debug;

use crate::document::{ConfigOption, Document};
use crate::migration::MigrationTable;
use crate::pending::PendingChangeSet;

/// Produce the document a save will write.
///
/// Steps run in a fixed order:
/// 1. remove every section marked for removal,
/// 2. create pending sections missing on disk,
/// 3. write every pending option, in insertion order,
/// 4. apply `migrations`, when given.
///
/// Comment trivia on untouched options is kept. A rewritten option keeps its
/// leading comments but loses its inline and interleaved ones, which
/// described the old value.
pub fn merge(
    on_disk: &Document,
    pending: &PendingChangeSet,
    migrations: Option<&MigrationTable>,
) -> Document {
    let mut doc = on_disk.clone();

    for section in pending.removed() {
        if doc.remove_section(section) {
            debug!(section, "removed section");
        }
    }

    for section in pending.sections() {
        doc.ensure_section(section.name());
    }

    for section in pending.sections() {
        let target = doc.ensure_section(section.name());
        for (option, value) in section.options() {
            let mut replacement = ConfigOption::new(option, value);
            if let Some(existing) = target.entry(option) {
                if existing.value() == value {
                    continue;
                }
                replacement.comments.leading = existing.comments.leading.clone();
            }
            target.upsert(replacement);
        }
    }

    if let Some(table) = migrations {
        table.apply(&mut doc);
    }

    doc
}
