// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Comment lexing and the comment map carried through a save.
//!
//! `#` starts a comment anywhere on a line. `;` starts a comment at the
//! start of a line or after whitespace. A backslash before either character
//! makes it literal, which is also how the writer protects values that
//! contain them.

use crate::document::names_match;

/// Pseudo-key for the comment block above the first section.
pub const BEFORE_SECTIONS: &str = "before_sections";

/// Split a raw line into its content (escapes resolved) and its comment.
///
/// The returned comment includes the comment character.
pub fn split_comment(line: &str) -> (String, Option<&str>) {
    let mut content = String::with_capacity(line.len());
    let mut prev_ws = true;
    let mut chars = line.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        match c {
            '\\' if matches!(chars.peek(), Some((_, '#' | ';'))) => {
                if let Some((_, escaped)) = chars.next() {
                    content.push(escaped);
                }
                prev_ws = false;
            }
            '#' => return (content, Some(&line[idx..])),
            ';' if prev_ws => return (content, Some(&line[idx..])),
            _ => {
                content.push(c);
                prev_ws = c.is_whitespace();
            }
        }
    }

    (content, None)
}

/// Protect comment characters inside a value so a re-read yields the same
/// text.
pub fn escape_value(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if c == '#' || c == ';' {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Comment lines that must be re-emitted at fixed positions on the next
/// write: the block above the first section, and the block between each
/// section header and its first option.
///
/// Rebuilt from the on-disk file on every save; never persisted on its own.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentMap {
    before_sections: Vec<String>,
    sections: Vec<(String, Vec<String>)>,
}

impl CommentMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.before_sections.is_empty() && self.sections.is_empty()
    }

    pub fn before_sections(&self) -> &[String] {
        &self.before_sections
    }

    pub fn push_before_sections(&mut self, line: impl Into<String>) {
        self.before_sections.push(line.into());
    }

    /// Comments recorded for a section header, or for [`BEFORE_SECTIONS`].
    pub fn get(&self, key: &str) -> &[String] {
        if key == BEFORE_SECTIONS {
            return &self.before_sections;
        }
        self.sections
            .iter()
            .find(|(name, _)| names_match(name, key))
            .map(|(_, lines)| lines.as_slice())
            .unwrap_or(&[])
    }

    pub fn push_section(&mut self, section: &str, line: impl Into<String>) {
        match self.sections.iter_mut().find(|(name, _)| names_match(name, section)) {
            Some((_, lines)) => lines.push(line.into()),
            None => self.sections.push((section.to_string(), vec![line.into()])),
        }
    }
}
