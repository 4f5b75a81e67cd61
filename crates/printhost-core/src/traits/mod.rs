// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator ports injected into the configuration subsystem.
//!
//! Each component receives only the ports it needs at construction instead
//! of looking collaborators up through a process-wide registry.

pub mod fs;
pub mod restart;
pub mod status;

pub use fs::{ConfigFs, LocalFs};
pub use restart::RestartSink;
pub use status::StatusProvider;
