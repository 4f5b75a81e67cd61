// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Restart sink that records every request.

use std::cell::{Cell, RefCell};

use printhost_core::{PrintHostError, RestartKind, RestartSink};

/// Captures restart requests for assertions. Can be told to refuse them.
#[derive(Debug, Default)]
pub struct RecordingRestart {
    requests: RefCell<Vec<RestartKind>>,
    refuse: Cell<bool>,
}

impl RecordingRestart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following request fail.
    pub fn refuse(&self) {
        self.refuse.set(true);
    }

    pub fn requests(&self) -> Vec<RestartKind> {
        self.requests.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.requests.borrow().len()
    }
}

impl RestartSink for RecordingRestart {
    fn request_restart(&self, kind: RestartKind) -> Result<(), PrintHostError> {
        if self.refuse.get() {
            return Err(PrintHostError::Restart(format!("{kind} refused by test sink")));
        }
        self.requests.borrow_mut().push(kind);
        Ok(())
    }
}
