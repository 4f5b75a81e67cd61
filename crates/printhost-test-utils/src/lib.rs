// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for printhost integration tests.
//!
//! # Components
//!
//! - [`ConfigHarness`] - temp config directory with a ready [`ConfigManager`](printhost_config::ConfigManager)
//! - [`RecordingRestart`] - restart sink that records requests
//! - [`FailingFs`] - filesystem that fails chosen operations

pub mod harness;
pub mod mock_fs;
pub mod mock_restart;

pub use harness::{ConfigHarness, ConfigHarnessBuilder};
pub use mock_fs::{FailingFs, FsOp};
pub use mock_restart::RecordingRestart;
