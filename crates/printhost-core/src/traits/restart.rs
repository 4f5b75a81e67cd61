// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Restart request port.

use crate::error::PrintHostError;
use crate::types::RestartKind;

/// Receives restart requests issued after a successful save.
///
/// The scheduler that actually tears down and rebuilds the host objects is
/// external; this port only records the intent.
pub trait RestartSink {
    /// Ask the host runtime to restart once the current command returns.
    fn request_restart(&self, kind: RestartKind) -> Result<(), PrintHostError>;
}
