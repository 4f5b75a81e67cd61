// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use printhost_core::{PrintHostError, RestartKind, RestartSink};
use tracing::info;

/// Restart sink for the command line.
///
/// There is no host process inside the CLI, so a request is logged and the
/// user is told to restart the host.
pub struct NoticeRestart;

impl RestartSink for NoticeRestart {
    fn request_restart(&self, kind: RestartKind) -> Result<(), PrintHostError> {
        info!(%kind, "restart requested");
        eprintln!("printhost: {kind} required for the new configuration to take effect");
        Ok(())
    }
}
