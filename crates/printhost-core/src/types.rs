// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used by the collaborator ports.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Kind of restart the host runtime is asked to perform after a save.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RestartKind {
    /// Reload the host software and re-read the configuration.
    Restart,
    /// Reset attached microcontrollers as well.
    FirmwareRestart,
}
