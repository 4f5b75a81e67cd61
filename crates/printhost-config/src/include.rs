// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `[include <glob>]` resolution.
//!
//! Patterns are resolved relative to the including file's directory. Each
//! path component with wildcard characters (`*`, `?`, `[...]`) is translated
//! to an anchored regex and matched against directory listings from the
//! injected filesystem; plain components are joined as-is.

use std::path::{Component, Path, PathBuf};

use printhost_core::ConfigFs;
use regex::Regex;

use crate::diagnostic::ConfigError;

/// Whether a pattern contains glob wildcard characters.
pub fn has_magic(pattern: &str) -> bool {
    pattern.contains(['*', '?', '['])
}

/// Expand an include pattern written in `source`, sorted lexicographically.
///
/// An empty match set is an error unless the pattern contains wildcards.
pub fn resolve_include(
    fs: &dyn ConfigFs,
    source: &Path,
    spec: &str,
) -> Result<Vec<PathBuf>, ConfigError> {
    let dirname = source.parent().unwrap_or_else(|| Path::new(""));
    let pattern = dirname.join(spec.trim());
    let pattern_str = pattern.to_string_lossy().into_owned();

    let mut matches = expand(fs, &pattern)?;
    if matches.is_empty() && !has_magic(&pattern_str) {
        return Err(ConfigError::IncludeNotFound {
            pattern: pattern_str,
        });
    }
    matches.sort();
    Ok(matches)
}

fn expand(fs: &dyn ConfigFs, pattern: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let mut candidates = vec![PathBuf::new()];

    for component in pattern.components() {
        let part = component.as_os_str().to_string_lossy();
        let magic = matches!(component, Component::Normal(_)) && has_magic(&part);

        if !magic {
            for candidate in &mut candidates {
                candidate.push(component.as_os_str());
            }
            continue;
        }

        let re = glob_to_regex(&part)?;
        let mut next = Vec::new();
        for candidate in &candidates {
            let dir = if candidate.as_os_str().is_empty() {
                Path::new(".")
            } else {
                candidate.as_path()
            };
            if !fs.is_dir(dir) {
                continue;
            }
            let Ok(entries) = fs.list_dir(dir) else {
                continue;
            };
            for entry in entries {
                let Some(name) = entry.file_name().map(|n| n.to_string_lossy().into_owned())
                else {
                    continue;
                };
                // Hidden entries only match patterns that ask for them.
                if name.starts_with('.') && !part.starts_with('.') {
                    continue;
                }
                if re.is_match(&name) {
                    next.push(candidate.join(&name));
                }
            }
        }
        candidates = next;
        if candidates.is_empty() {
            break;
        }
    }

    Ok(candidates.into_iter().filter(|p| fs.exists(p)).collect())
}

/// Translate one glob path component into an anchored regex.
fn glob_to_regex(part: &str) -> Result<Regex, ConfigError> {
    let mut re = String::from("^");
    let mut chars = part.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            '[' => {
                let mut class = String::new();
                let mut closed = false;
                if chars.peek() == Some(&'!') {
                    chars.next();
                    class.push('^');
                }
                for inner in chars.by_ref() {
                    if inner == ']' && !class.is_empty() && class != "^" {
                        closed = true;
                        break;
                    }
                    if inner == '\\' || inner == '[' || inner == ']' {
                        class.push('\\');
                    }
                    class.push(inner);
                }
                if closed {
                    re.push('[');
                    re.push_str(&class);
                    re.push(']');
                } else {
                    // Unterminated class: match the bracket literally.
                    re.push_str(&regex::escape("["));
                    re.push_str(&regex::escape(class.trim_start_matches('^')));
                }
            }
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');

    Regex::new(&re).map_err(|e| ConfigError::IncludeNotFound {
        pattern: format!("{part} ({e})"),
    })
}

/// Lexically normalise a path for the recursion guard (no symlink
/// resolution, `..` folded).
pub fn normalize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    let mut out = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::ParentDir => {
                out.pop();
            }
            Component::CurDir => {}
            other => out.push(other.as_os_str()),
        }
    }
    out
}
