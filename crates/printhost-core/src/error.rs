// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types shared across the printhost crates.

use std::path::PathBuf;

use thiserror::Error;

/// The primary error type surfaced by printhost entry points.
#[derive(Debug, Error)]
pub enum PrintHostError {
    /// Configuration errors (unparsable file, invalid option, refused save).
    #[error("configuration error: {0}")]
    Config(String),

    /// Filesystem errors outside of a configuration read or save.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// A user-facing command was refused. Nothing was changed on disk.
    #[error("{0}")]
    Command(String),

    /// The restart sink could not accept a restart request.
    #[error("restart request failed: {0}")]
    Restart(String),

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}
