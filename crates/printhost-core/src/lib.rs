// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the printhost configuration layer.
//!
//! This crate provides the shared error type and the collaborator ports
//! (filesystem, restart sink, status provider) that the configuration
//! subsystem receives by injection.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PrintHostError;
pub use traits::{ConfigFs, LocalFs, RestartSink, StatusProvider};
pub use types::RestartKind;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn print_host_error_has_all_variants() {
        let _config = PrintHostError::Config("test".into());
        let _io = PrintHostError::Io {
            path: "printer.cfg".into(),
            source: std::io::Error::other("test"),
        };
        let _command = PrintHostError::Command("test".into());
        let _restart = PrintHostError::Restart("test".into());
        let _internal = PrintHostError::Internal("test".into());
    }

    #[test]
    fn command_error_displays_message_verbatim() {
        let err = PrintHostError::Command("No data changed".into());
        assert_eq!(err.to_string(), "No data changed");
    }

    #[test]
    fn restart_kind_display_round_trip() {
        use std::str::FromStr;

        for kind in [RestartKind::Restart, RestartKind::FirmwareRestart] {
            let s = kind.to_string();
            assert_eq!(RestartKind::from_str(&s).expect("should parse back"), kind);
        }
        assert_eq!(RestartKind::FirmwareRestart.to_string(), "firmware_restart");
    }

    #[test]
    fn restart_kind_serialization() {
        let json = serde_json::to_string(&RestartKind::Restart).expect("should serialize");
        assert_eq!(json, "\"restart\"");
    }

    #[test]
    fn all_ports_are_exported() {
        fn _assert_fs<T: ConfigFs>() {}
        fn _assert_restart<T: RestartSink>() {}
        fn _assert_status<T: StatusProvider>() {}
        _assert_fs::<LocalFs>();
    }
}
