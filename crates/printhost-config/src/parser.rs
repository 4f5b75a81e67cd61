// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Config text to [`Document`] parsing.
//!
//! Lines between `[include ...]` directives are buffered and parsed as one
//! chunk, so overrides inside included files apply in the same linear order
//! as repeated options inside a single file. Every chunk starts outside of
//! any section, exactly like a fresh file.
//!
//! With comment preservation enabled the parser also returns a
//! [`CommentMap`] and attaches per-option trivia to the document; the
//! startup read leaves it off.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use printhost_core::ConfigFs;
use tracing::debug;

use crate::comments::{CommentMap, split_comment};
use crate::diagnostic::ConfigError;
use crate::document::{ConfigOption, Document};
use crate::include::{normalize, resolve_include};

/// Parser settings.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Treat `[include <glob>]` headers as directives.
    pub allow_includes: bool,
    /// Keep comments as structured trivia.
    pub keep_comments: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            allow_includes: true,
            keep_comments: false,
        }
    }
}

/// Reads configuration text (and the files it includes) into a [`Document`].
pub struct DocumentParser<'a> {
    fs: &'a dyn ConfigFs,
    options: ParseOptions,
}

/// Output of a comment-preserving parse.
#[derive(Debug, Clone, Default)]
pub struct ParsedConfig {
    pub document: Document,
    pub comments: CommentMap,
}

struct Line<'t> {
    number: usize,
    raw: &'t str,
}

impl<'a> DocumentParser<'a> {
    pub fn new(fs: &'a dyn ConfigFs, options: ParseOptions) -> Self {
        Self { fs, options }
    }

    /// Read and parse a file from the injected filesystem.
    pub fn parse_file(&self, path: &Path) -> Result<ParsedConfig, ConfigError> {
        let text = read_config_file(self.fs, path)?;
        self.parse(&text, path)
    }

    /// Parse `text` as if it were the contents of `source`.
    ///
    /// Any error aborts the whole read; no partial document is returned.
    pub fn parse(&self, text: &str, source: &Path) -> Result<ParsedConfig, ConfigError> {
        let mut out = ParsedConfig::default();
        let mut visited = HashSet::new();
        self.parse_into(text, source, &mut out, &mut visited)?;
        Ok(out)
    }

    fn parse_into(
        &self,
        text: &str,
        source: &Path,
        out: &mut ParsedConfig,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<(), ConfigError> {
        let key = normalize(source);
        if visited.contains(&key) {
            return Err(ConfigError::RecursiveInclude {
                path: source.to_path_buf(),
            });
        }
        visited.insert(key.clone());

        let result = self.parse_lines(text, source, out, visited);
        visited.remove(&key);
        result
    }

    fn parse_lines(
        &self,
        text: &str,
        source: &Path,
        out: &mut ParsedConfig,
        visited: &mut HashSet<PathBuf>,
    ) -> Result<(), ConfigError> {
        let mut buffer: Vec<Line<'_>> = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            if self.options.allow_includes
                && let Some(spec) = include_spec(raw)
            {
                self.parse_chunk(&buffer, source, out)?;
                buffer.clear();

                let files = resolve_include(self.fs, source, &spec)?;
                debug!(source = %source.display(), pattern = %spec, count = files.len(), "resolved include");
                for file in files {
                    let data = read_config_file(self.fs, &file)?;
                    self.parse_into(&data, &file, out, visited)?;
                }
                continue;
            }
            buffer.push(Line {
                number: idx + 1,
                raw,
            });
        }

        self.parse_chunk(&buffer, source, out)
    }

    fn parse_chunk(
        &self,
        lines: &[Line<'_>],
        source: &Path,
        out: &mut ParsedConfig,
    ) -> Result<(), ConfigError> {
        let keep = self.options.keep_comments;
        let doc = &mut out.document;
        let comments = &mut out.comments;

        let mut section: Option<String> = None;
        let mut in_header_region = false;
        // (option name, indent of the option line, number of value lines)
        let mut current: Option<(String, usize, usize)> = None;
        let mut blank_run = 0usize;
        let mut pending: Vec<String> = Vec::new();

        for line in lines {
            let (content, comment) = split_comment(line.raw);
            let trimmed = content.trim();

            if trimmed.is_empty() {
                if doc.is_empty() && section.is_none() {
                    if keep {
                        comments.push_before_sections(line.raw.trim_end());
                    }
                    continue;
                }
                match comment {
                    Some(_) if keep && in_header_region => {
                        if let Some(name) = &section {
                            comments.push_section(name, line.raw.trim_end());
                        }
                    }
                    Some(_) if keep => pending.push(line.raw.trim_end().to_string()),
                    Some(_) => {}
                    None => {
                        if current.is_some() {
                            blank_run += 1;
                        }
                    }
                }
                continue;
            }

            let indent = line.raw.len() - line.raw.trim_start().len();

            // Continuation of a multi-line value.
            if let Some((name, opt_indent, value_lines)) = current.as_mut()
                && indent > *opt_indent
                && let Some(sect) = section.as_deref()
                && let Some(entry) = doc.section_mut(sect).and_then(|s| s.entry_mut(name))
            {
                let mut value = entry.value().to_string();
                for _ in 0..blank_run {
                    value.push('\n');
                }
                *value_lines += blank_run;
                blank_run = 0;
                for comment_line in pending.drain(..) {
                    entry.comments.interleaved.push((*value_lines, comment_line));
                }
                value.push('\n');
                value.push_str(trimmed);
                *value_lines += 1;
                entry.set_value(value);
                continue;
            }
            current = None;
            blank_run = 0;

            if let Some(header) = section_header(trimmed) {
                if header.is_empty() {
                    return Err(parse_error(source, line, "empty section header"));
                }
                if let Some(prev) = section.as_deref()
                    && let Some(prev_section) = doc.section_mut(prev)
                {
                    prev_section.trailing_comments.append(&mut pending);
                }
                pending.clear();

                doc.ensure_section(header);
                section = Some(header.to_string());
                in_header_region = true;
                if keep && let Some(c) = comment {
                    comments.push_section(header, c.trim_end());
                }
                continue;
            }

            let Some(sect) = section.as_deref() else {
                return Err(parse_error(source, line, "option outside of any section"));
            };
            let Some((name, value)) = split_option(trimmed) else {
                return Err(parse_error(
                    source,
                    line,
                    &format!("expected `key: value`, found `{trimmed}`"),
                ));
            };
            if name.is_empty() {
                return Err(parse_error(source, line, "option name is empty"));
            }

            let mut option = ConfigOption::new(name, value);
            if keep {
                option.comments.leading = std::mem::take(&mut pending);
                option.comments.inline = comment.map(|c| c.trim_end().to_string());
            }
            doc.ensure_section(sect).upsert(option);
            in_header_region = false;
            current = Some((name.to_string(), indent, 1));
        }

        if !pending.is_empty() {
            match section.as_deref().and_then(|s| doc.section_mut(s)) {
                Some(last) => last.trailing_comments.append(&mut pending),
                None => {
                    for line in pending {
                        comments.push_before_sections(line);
                    }
                }
            }
        }

        Ok(())
    }
}

/// Read a config file, normalising line endings.
pub fn read_config_file(fs: &dyn ConfigFs, path: &Path) -> Result<String, ConfigError> {
    fs.read_to_string(path)
        .map(|data| data.replace("\r\n", "\n"))
        .map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
}

/// Parse a self-contained document (no includes, no comments).
pub fn parse_text(text: &str) -> Result<Document, ConfigError> {
    let fs = printhost_core::LocalFs;
    let parser = DocumentParser::new(
        &fs,
        ParseOptions {
            allow_includes: false,
            keep_comments: false,
        },
    );
    Ok(parser.parse(text, Path::new("<inline>"))?.document)
}

fn section_header(trimmed: &str) -> Option<&str> {
    trimmed
        .strip_prefix('[')
        .and_then(|rest| rest.strip_suffix(']'))
        .map(str::trim)
}

fn include_spec(raw: &str) -> Option<String> {
    if raw.starts_with(char::is_whitespace) {
        return None;
    }
    let (content, _) = split_comment(raw);
    let header = section_header(content.trim())?;
    header.strip_prefix("include ").map(|spec| spec.trim().to_string())
}

/// Split `key: value` / `key = value` on the first delimiter.
fn split_option(line: &str) -> Option<(&str, &str)> {
    let idx = line.find([':', '='])?;
    Some((line[..idx].trim(), line[idx + 1..].trim()))
}

fn parse_error(source: &Path, line: &Line<'_>, message: &str) -> ConfigError {
    ConfigError::Parse {
        path: source.to_path_buf(),
        line: line.number,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comments::BEFORE_SECTIONS;
    use printhost_core::LocalFs;

    fn parse(text: &str) -> Document {
        parse_text(text).expect("text should parse")
    }

    fn parse_keep(text: &str) -> ParsedConfig {
        DocumentParser::new(
            &LocalFs,
            ParseOptions {
                allow_includes: false,
                keep_comments: true,
            },
        )
        .parse(text, Path::new("printer.cfg"))
        .expect("text should parse")
    }

    #[test]
    fn basic_sections_and_options() {
        let doc = parse("[printer]\nkinematics: cartesian\nmax_velocity = 300\n\n[fan]\npin: PA8\n");
        assert_eq!(doc.get("printer", "kinematics"), Some("cartesian"));
        assert_eq!(doc.get("printer", "max_velocity"), Some("300"));
        assert_eq!(doc.get("fan", "pin"), Some("PA8"));
    }

    #[test]
    fn inline_comments_are_stripped() {
        let doc = parse("[fan]\npin: PA8 # part cooling\nmax_power: 0.8 ; limited\n");
        assert_eq!(doc.get("fan", "pin"), Some("PA8"));
        assert_eq!(doc.get("fan", "max_power"), Some("0.8"));
    }

    #[test]
    fn last_writer_wins_and_sections_merge() {
        let doc = parse("[printer]\nx: 1\n[fan]\npin: PA1\n[printer]\nx: 2\ny: 3\n");
        assert_eq!(doc.len(), 2);
        assert_eq!(doc.get("printer", "x"), Some("2"));
        assert_eq!(doc.get("printer", "y"), Some("3"));
    }

    #[test]
    fn multiline_values() {
        let doc = parse(
            "[gcode_macro START]\ngcode:\n  G28\n\n  G1 Z10\n    # inner comment\n  M117 go\n\n[fan]\npin: PA1\n",
        );
        assert_eq!(
            doc.get("gcode_macro START", "gcode"),
            Some("\nG28\n\nG1 Z10\nM117 go")
        );
        assert_eq!(doc.get("fan", "pin"), Some("PA1"));
    }

    #[test]
    fn option_before_section_is_parse_error() {
        let err = parse_text("pin: PA1\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 1, .. }));
    }

    #[test]
    fn malformed_option_line_is_parse_error() {
        let err = parse_text("[fan]\njust words\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 2, .. }));
    }

    #[test]
    fn include_lines_are_plain_sections_when_disabled() {
        let doc = parse("[include other.cfg]\n");
        assert!(doc.has_section("include other.cfg"));
    }

    #[test]
    fn includes_override_in_order() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.cfg"), "[printer]\nx: 2\n").unwrap();
        let main = dir.path().join("printer.cfg");
        std::fs::write(&main, "[printer]\nx: 1\ny: 1\n[include b.cfg]\n[fan]\npin: PA1\n").unwrap();

        let parsed = DocumentParser::new(&LocalFs, ParseOptions::default())
            .parse_file(&main)
            .unwrap();
        assert_eq!(parsed.document.get("printer", "x"), Some("2"));
        assert_eq!(parsed.document.get("printer", "y"), Some("1"));
        assert!(!parsed.document.has_section("include b.cfg"));
    }

    #[test]
    fn chunk_after_include_needs_its_own_header() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("b.cfg"), "[fan]\npin: PA1\n").unwrap();
        let main = dir.path().join("printer.cfg");
        std::fs::write(&main, "[printer]\nx: 1\n[include b.cfg]\ny: 2\n").unwrap();

        let err = DocumentParser::new(&LocalFs, ParseOptions::default())
            .parse_file(&main)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Parse { line: 4, .. }));
    }

    #[test]
    fn recursive_include_is_detected() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.cfg"), "[include printer.cfg]\n").unwrap();
        let main = dir.path().join("printer.cfg");
        std::fs::write(&main, "[include a.cfg]\n").unwrap();

        let err = DocumentParser::new(&LocalFs, ParseOptions::default())
            .parse_file(&main)
            .unwrap_err();
        assert!(matches!(err, ConfigError::RecursiveInclude { .. }));
    }

    #[test]
    fn sibling_includes_of_same_file_are_allowed() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("common.cfg"), "[common]\nv: 1\n").unwrap();
        std::fs::write(dir.path().join("a.cfg"), "[include common.cfg]\n").unwrap();
        std::fs::write(dir.path().join("b.cfg"), "[include common.cfg]\n").unwrap();
        let main = dir.path().join("printer.cfg");
        std::fs::write(&main, "[include a.cfg]\n[include b.cfg]\n").unwrap();

        let parsed = DocumentParser::new(&LocalFs, ParseOptions::default())
            .parse_file(&main)
            .unwrap();
        assert_eq!(parsed.document.get("common", "v"), Some("1"));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = DocumentParser::new(&LocalFs, ParseOptions::default())
            .parse_file(&dir.path().join("missing.cfg"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn comment_trivia_is_captured() {
        let parsed = parse_keep(
            "# top\n\n[printer]\n# about printer\nkinematics: corexy # fast\n# before vel\nmax_velocity: 300\n# tail\n[fan]\npin: PA1\n",
        );
        assert_eq!(
            parsed.comments.get(BEFORE_SECTIONS),
            &["# top".to_string(), String::new()]
        );
        assert_eq!(parsed.comments.get("printer"), &["# about printer".to_string()]);

        let printer = parsed.document.section("printer").unwrap();
        let kin = printer.entry("kinematics").unwrap();
        assert_eq!(kin.value(), "corexy");
        assert_eq!(kin.comments.inline.as_deref(), Some("# fast"));
        assert_eq!(
            printer.entry("max_velocity").unwrap().comments.leading,
            vec!["# before vel".to_string()]
        );
        assert_eq!(printer.trailing_comments, vec!["# tail".to_string()]);
    }

    #[test]
    fn interleaved_comments_in_multiline_value() {
        let parsed = parse_keep("[gcode_macro M]\ngcode:\n  G28\n  # home first\n  G1 Z5\n");
        let entry = parsed
            .document
            .section("gcode_macro M")
            .unwrap()
            .entry("gcode")
            .unwrap();
        assert_eq!(entry.value(), "\nG28\nG1 Z5");
        assert_eq!(entry.comments.interleaved, vec![(2, "  # home first".to_string())]);
    }

    #[test]
    fn escaped_hash_survives_parse() {
        let doc = parse("[led]\ncolor: \\#00ff00\n");
        assert_eq!(doc.get("led", "color"), Some("#00ff00"));
    }
}
