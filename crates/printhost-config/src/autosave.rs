// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The machine-generated block at the end of the main config file.
//!
//! Everything after [`AUTOSAVE_HEADER`] must be prefixed with `#*# `. Any
//! deviation means a human (or a broken tool) edited the block, and the
//! whole block is dropped rather than guessed at.

use tracing::warn;

use crate::comments::escape_value;
use crate::diagnostic::ConfigError;
use crate::document::Document;

/// Banner that opens the autosave block.
pub const AUTOSAVE_HEADER: &str = "\n#*# <---------------------- SAVE_CONFIG ---------------------->\n#*# DO NOT EDIT THIS BLOCK OR BELOW. The contents are auto-generated.\n#*#\n";

const MARKER: &str = "#*#";
const MARKER_PREFIX: &str = "#*# ";

/// Regular text and embedded autosave text of one config file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SplitConfig {
    pub regular: String,
    pub autosave: String,
}

/// Separates the autosave block from user-authored content.
pub struct AutosaveSplitter;

impl AutosaveSplitter {
    /// Split `full` into regular and autosave text, falling back to
    /// `(full, "")` with a warning when the block is corrupt.
    pub fn split(full: &str) -> SplitConfig {
        match Self::try_split(full) {
            Ok(split) => split,
            Err(err) => {
                warn!(error = %err, "ignoring autosave block");
                SplitConfig {
                    regular: full.to_string(),
                    autosave: String::new(),
                }
            }
        }
    }

    /// Like [`split`](Self::split) but reports corruption as
    /// [`ConfigError::CorruptAutosave`].
    pub fn try_split(full: &str) -> Result<SplitConfig, ConfigError> {
        let (regular, raw_block) = match full.find(AUTOSAVE_HEADER) {
            Some(pos) => (&full[..pos], full[pos + AUTOSAVE_HEADER.len()..].trim()),
            None => (full, ""),
        };

        if regular.contains("\n#*# ") {
            return Err(ConfigError::CorruptAutosave {
                reason: "autosave state corrupted".to_string(),
            });
        }

        let mut out = vec![String::new()];
        if !raw_block.is_empty() {
            for line in raw_block.split('\n') {
                if !line.starts_with(MARKER) || (line.len() >= 4 && !line.starts_with(MARKER_PREFIX)) {
                    return Err(ConfigError::CorruptAutosave {
                        reason: "modifications after header".to_string(),
                    });
                }
                out.push(line.get(4..).unwrap_or_default().to_string());
            }
        }
        out.push(String::new());

        Ok(SplitConfig {
            regular: regular.to_string(),
            autosave: out.join("\n"),
        })
    }

    /// Render `document` as a complete autosave block, banner included.
    /// An empty document renders as nothing.
    pub fn render(document: &Document) -> String {
        if document.is_empty() {
            return String::new();
        }

        let mut lines = Vec::new();
        for section in document.sections() {
            lines.push(format!("[{}]", section.name()));
            for option in section.options() {
                let mut value_lines = option.value().split('\n');
                let first = value_lines.next().unwrap_or_default();
                lines.push(format!("{} = {}", option.name(), escape_value(first)).trim_end().to_string());
                for cont in value_lines {
                    lines.push(format!("\t{}", escape_value(cont)));
                }
            }
            lines.push(String::new());
        }
        while lines.last().is_some_and(String::is_empty) {
            lines.pop();
        }

        let mut out = String::from(AUTOSAVE_HEADER);
        for line in lines {
            if line.is_empty() {
                out.push_str(MARKER);
            } else {
                out.push_str(MARKER_PREFIX);
                out.push_str(&line);
            }
            out.push('\n');
        }
        out
    }
}

/// Drop options from `autosave` that `regular` already defines, along with
/// sections left empty by that.
pub fn strip_duplicates(autosave: &Document, regular: &Document) -> Document {
    let mut out = Document::new();
    for section in autosave.sections() {
        let kept: Vec<_> = section
            .options()
            .filter(|o| !regular.has_option(section.name(), o.name()))
            .collect();
        if kept.is_empty() && !section.is_empty() {
            continue;
        }
        let target = out.ensure_section(section.name());
        for option in kept {
            target.set(option.name(), option.value());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_text;
    use tracing_test::traced_test;

    const BODY: &str = "[printer]\nkinematics: corexy\n";

    #[test]
    fn no_banner_means_no_autosave() {
        let split = AutosaveSplitter::split(BODY);
        assert_eq!(split.regular, BODY);
        assert_eq!(split.autosave, "\n");
    }

    #[test]
    fn block_is_stripped_of_markers() {
        let full = format!("{BODY}{AUTOSAVE_HEADER}#*# [bltouch]\n#*# z_offset = 1.25\n#*#\n#*# [fan]\n#*# max_power = 0.5\n");
        let split = AutosaveSplitter::try_split(&full).unwrap();
        assert_eq!(split.regular, BODY);

        let doc = parse_text(&split.autosave).unwrap();
        assert_eq!(doc.get("bltouch", "z_offset"), Some("1.25"));
        assert_eq!(doc.get("fan", "max_power"), Some("0.5"));
    }

    #[test]
    fn missing_prefix_discards_block() {
        let full = format!("{BODY}{AUTOSAVE_HEADER}#*# [bltouch]\nz_offset = 1.25\n");
        let split = AutosaveSplitter::split(&full);
        assert_eq!(split.regular, full);
        assert_eq!(split.autosave, "");
    }

    #[test]
    #[traced_test]
    fn corrupt_block_logs_warning() {
        let full = format!("{BODY}{AUTOSAVE_HEADER}#*# [bltouch]\nedited by hand\n");
        let _ = AutosaveSplitter::split(&full);
        assert!(logs_contain("ignoring autosave block"));
        assert!(logs_contain("modifications after header"));
    }

    #[test]
    fn marker_without_space_is_corrupt() {
        let full = format!("{BODY}{AUTOSAVE_HEADER}#*#[bltouch]\n");
        let err = AutosaveSplitter::try_split(&full).unwrap_err();
        assert!(matches!(err, ConfigError::CorruptAutosave { .. }));
    }

    #[test]
    fn marker_in_regular_text_is_corrupt() {
        let full = format!("{BODY}#*# [bltouch]\n");
        let split = AutosaveSplitter::split(&full);
        assert_eq!(split.regular, full);
        assert!(split.autosave.is_empty());
    }

    #[test]
    fn render_then_split_recovers_values() {
        let mut doc = Document::new();
        doc.set("bltouch", "z_offset", "1.25");
        doc.set("bed_mesh default", "points", "\n0, 0\n1, 1");
        doc.set("led", "color", "#ff0000");

        let full = format!("{BODY}{}", AutosaveSplitter::render(&doc));
        let split = AutosaveSplitter::try_split(&full).unwrap();
        let back = parse_text(&split.autosave).unwrap();
        assert_eq!(back.values(), doc.values());
    }

    #[test]
    fn strip_duplicates_prefers_regular() {
        let regular = parse_text("[bltouch]\nz_offset: 2.0\n").unwrap();
        let autosave = parse_text("[bltouch]\nz_offset = 1.0\nspeed = 5\n[fan]\nmax_power = 0.5\n[extra]\n").unwrap();

        let stripped = strip_duplicates(&autosave, &regular);
        assert_eq!(stripped.get("bltouch", "z_offset"), None);
        assert_eq!(stripped.get("bltouch", "speed"), Some("5"));
        assert_eq!(stripped.get("fan", "max_power"), Some("0.5"));
        assert!(stripped.has_section("extra"));
    }
}
