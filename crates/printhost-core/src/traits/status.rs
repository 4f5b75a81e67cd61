// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Status introspection convention shared by every host object.

/// A host object that exposes its state to diagnostics front-ends.
pub trait StatusProvider {
    /// Object name used as the key in aggregated status queries.
    fn name(&self) -> &str;

    /// Current status as a JSON value. Must not mutate state.
    fn get_status(&self) -> serde_json::Value;
}
