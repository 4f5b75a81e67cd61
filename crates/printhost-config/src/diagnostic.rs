// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration errors with rich diagnostics and fuzzy match suggestions.
//!
//! Every failure mode of the configuration subsystem is a [`ConfigError`]
//! variant. Unknown sections and options carry "did you mean?" suggestions
//! computed with Jaro-Winkler similarity; host-settings errors coming out of
//! Figment are converted with source spans where they can be located.

#![allow(unused_assignments)] // miette's Diagnostic derive generates code triggering this lint

use std::path::PathBuf;

use miette::{Diagnostic, NamedSource, SourceSpan};
use printhost_core::PrintHostError;
use thiserror::Error;

/// Minimum Jaro-Winkler similarity score to suggest a correction.
const SUGGESTION_THRESHOLD: f64 = 0.75;

/// Which numeric bound an option value violated.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeBound {
    /// Value is below the inclusive minimum.
    Minimum(String),
    /// Value is above the inclusive maximum.
    Maximum(String),
    /// Value is not strictly above the bound.
    Above(String),
    /// Value is not strictly below the bound.
    Below(String),
}

impl std::fmt::Display for RangeBound {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Minimum(v) => write!(f, "have minimum of {v}"),
            Self::Maximum(v) => write!(f, "have maximum of {v}"),
            Self::Above(v) => write!(f, "be above {v}"),
            Self::Below(v) => write!(f, "be below {v}"),
        }
    }
}

/// A configuration error with rich diagnostic information.
#[derive(Debug, Error, Diagnostic)]
pub enum ConfigError {
    /// A configuration file could not be read.
    #[error("unable to open config file {}", path.display())]
    #[diagnostic(code(printhost::config::io))]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// Malformed section or option line.
    #[error("{}:{line}: {message}", path.display())]
    #[diagnostic(
        code(printhost::config::parse),
        help("sections look like `[name]`, options like `key: value` or `key = value`")
    )]
    Parse {
        /// File being parsed.
        path: PathBuf,
        /// 1-based line number within the file.
        line: usize,
        /// What was wrong with the line.
        message: String,
    },

    /// A file includes itself, directly or through other includes.
    #[error("recursive include of config file '{}'", path.display())]
    #[diagnostic(code(printhost::config::recursive_include))]
    RecursiveInclude {
        /// The file that was re-entered.
        path: PathBuf,
    },

    /// A non-wildcard include pattern matched nothing.
    #[error("include file '{pattern}' does not exist")]
    #[diagnostic(
        code(printhost::config::include_not_found),
        help("use a wildcard pattern if the include is optional")
    )]
    IncludeNotFound {
        /// The resolved include pattern.
        pattern: String,
    },

    /// A required option is absent and no default was declared.
    #[error("option '{option}' in section '{section}' must be specified")]
    #[diagnostic(
        code(printhost::config::missing_option),
        help("add `{option}: <value>` to the [{section}] section")
    )]
    MissingOption {
        /// Section that was consulted.
        section: String,
        /// Option that was missing.
        option: String,
    },

    /// A present option failed type conversion.
    #[error("unable to parse option '{option}' in section '{section}'")]
    #[diagnostic(code(printhost::config::invalid_value))]
    InvalidValue {
        /// Section that was consulted.
        section: String,
        /// Option that failed.
        option: String,
        /// The raw text that failed to convert.
        value: String,
        /// Underlying conversion failure.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A numeric option is outside its declared bounds.
    #[error("option '{option}' in section '{section}' must {bound}")]
    #[diagnostic(code(printhost::config::range))]
    Range {
        /// Section that was consulted.
        section: String,
        /// Option that failed.
        option: String,
        /// The violated bound.
        bound: RangeBound,
    },

    /// A choice option holds an unknown selector.
    #[error("choice '{choice}' for option '{option}' in section '{section}' is not a valid choice")]
    #[diagnostic(code(printhost::config::invalid_choice), help("valid choices: {valid}"))]
    InvalidChoice {
        /// Section that was consulted.
        section: String,
        /// Option that failed.
        option: String,
        /// The selector found in the file.
        choice: String,
        /// Comma separated valid selectors.
        valid: String,
    },

    /// A list option has the wrong number of elements.
    #[error("option '{option}' in section '{section}' must have {expected} elements")]
    #[diagnostic(code(printhost::config::element_count), help("found {found} elements"))]
    WrongElementCount {
        /// Section that was consulted.
        section: String,
        /// Option that failed.
        option: String,
        /// Declared element count.
        expected: usize,
        /// Elements actually present.
        found: usize,
    },

    /// The autosave trailer failed its integrity check. Never fatal to a read.
    #[error("can't read autosave from config file - {reason}")]
    #[diagnostic(code(printhost::config::corrupt_autosave), severity(Warning))]
    CorruptAutosave {
        /// Which integrity rule was broken.
        reason: String,
    },

    /// A section was never consulted by any host object.
    #[error("section '{section}' is not a valid config section")]
    #[diagnostic(
        code(printhost::config::unknown_section),
        help("{}", format_suggestion_help(suggestion.as_deref(), None))
    )]
    UnknownSection {
        /// Offending section name (lowercased).
        section: String,
        /// Closest known section, if any.
        suggestion: Option<String>,
    },

    /// An option was never consulted by its section's object.
    #[error("option '{option}' is not valid in section '{section}'")]
    #[diagnostic(
        code(printhost::config::unknown_option),
        help("{}", format_suggestion_help(suggestion.as_deref(), Some(valid_keys.as_str())))
    )]
    UnknownOption {
        /// Section holding the option (lowercased).
        section: String,
        /// Offending option name (lowercased).
        option: String,
        /// Closest known option, if any.
        suggestion: Option<String>,
        /// Options that were consulted in this section.
        valid_keys: String,
    },

    /// SAVE_CONFIG with nothing pending.
    #[error("no data changed")]
    #[diagnostic(code(printhost::config::no_changes))]
    NoChangesToSave,

    /// The on-disk file could not be re-read right before a save.
    #[error("unable to parse existing config on SAVE_CONFIG")]
    #[diagnostic(code(printhost::config::existing_unparsable))]
    ExistingConfigUnparsable {
        /// Why the re-read failed.
        #[source]
        source: Box<ConfigError>,
    },

    /// The destination file (or its backup) could not be written.
    #[error("unable to write config file {} during SAVE_CONFIG", path.display())]
    #[diagnostic(
        code(printhost::config::write_failure),
        help("pending changes were kept; retry once the problem is fixed")
    )]
    WriteFailure {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O failure.
        source: std::io::Error,
    },

    /// An unknown key was found in the host settings file.
    #[error("unknown settings key `{key}`")]
    #[diagnostic(
        code(printhost::settings::unknown_key),
        help("{}", format_suggestion_help(suggestion.as_deref(), Some(valid_keys.as_str())))
    )]
    UnknownKey {
        /// The unrecognized key name.
        key: String,
        /// Suggested correction via fuzzy matching, if any.
        suggestion: Option<String>,
        /// List of valid keys for the section.
        valid_keys: String,
        /// Source span for the offending key.
        #[label("this key is not recognized")]
        span: Option<SourceSpan>,
        /// The source file content for context display.
        #[source_code]
        src: Option<NamedSource<String>>,
    },

    /// A host settings value has the wrong type.
    #[error("invalid type for settings key `{key}`: {detail}")]
    #[diagnostic(code(printhost::settings::invalid_type), help("expected {expected}"))]
    InvalidType {
        /// The key with the wrong type.
        key: String,
        /// Description of the type mismatch.
        detail: String,
        /// What type was expected.
        expected: String,
    },

    /// A host settings value failed semantic validation.
    #[error("validation error: {message}")]
    #[diagnostic(code(printhost::settings::validation))]
    Validation {
        /// Description of the validation failure.
        message: String,
    },

    /// Catch-all for other settings errors.
    #[error("settings error: {0}")]
    #[diagnostic(code(printhost::settings::other))]
    Other(String),
}

impl From<ConfigError> for PrintHostError {
    fn from(err: ConfigError) -> Self {
        PrintHostError::Config(err.to_string())
    }
}

/// Format the help message for unknown key/section/option errors.
fn format_suggestion_help(suggestion: Option<&str>, valid_keys: Option<&str>) -> String {
    match (suggestion, valid_keys) {
        (Some(s), Some(keys)) => format!("did you mean `{s}`? Valid keys: {keys}"),
        (Some(s), None) => format!("did you mean `{s}`?"),
        (None, Some(keys)) if !keys.is_empty() => format!("valid keys: {keys}"),
        _ => "remove it or check the spelling".to_string(),
    }
}

/// Convert a `figment::Error` from host settings loading into diagnostics.
pub fn figment_to_config_errors(
    err: figment::Error,
    toml_sources: &[(String, String)],
) -> Vec<ConfigError> {
    use figment::error::Kind;

    let mut errors = Vec::new();

    for error in err {
        let config_error = match &error.kind {
            Kind::UnknownField(field, expected) => {
                let valid_keys: Vec<&str> = expected.to_vec();
                let suggestion = suggest_key(field, &valid_keys);
                let (span, src) = find_source_span(&error, field, toml_sources);

                ConfigError::UnknownKey {
                    key: field.clone(),
                    suggestion,
                    valid_keys: valid_keys.join(", "),
                    span,
                    src,
                }
            }
            Kind::MissingField(field) => ConfigError::Validation {
                message: format!("missing required settings key `{field}`"),
            },
            Kind::InvalidType(actual, expected) => ConfigError::InvalidType {
                key: error.path.join("."),
                detail: format!("found {actual}, expected {expected}"),
                expected: expected.to_string(),
            },
            _ => ConfigError::Other(format!("{error}")),
        };

        errors.push(config_error);
    }

    errors
}

/// Find source span for a settings error in the TOML source files.
fn find_source_span(
    error: &figment::error::Error,
    field: &str,
    toml_sources: &[(String, String)],
) -> (Option<SourceSpan>, Option<NamedSource<String>>) {
    let source_path = error
        .metadata
        .as_ref()
        .and_then(|m| m.source.as_ref())
        .and_then(|s| match s {
            figment::Source::File(path) => Some(path.display().to_string()),
            _ => None,
        });

    let source = source_path.as_ref().and_then(|path| {
        toml_sources
            .iter()
            .find(|(p, _)| p == path)
            .map(|(p, content)| (p.as_str(), content.as_str()))
    });

    if let Some((path, content)) = source
        && let Some(offset) = find_key_offset(content, &error.path, field)
    {
        let span = SourceSpan::new(offset.into(), field.len());
        let named = NamedSource::new(path, content.to_string());
        return (Some(span), Some(named));
    }

    (None, None)
}

/// Find the byte offset of a key in TOML content, relative to a section path.
pub fn find_key_offset(content: &str, path: &[String], field: &str) -> Option<usize> {
    let search_start = match path.first() {
        None => 0,
        Some(section) => {
            let header = format!("[{section}]");
            content.find(&header).map(|pos| pos + header.len())?
        }
    };

    let remaining = &content[search_start..];
    let mut byte_offset = 0;
    for line in remaining.split_inclusive('\n') {
        let trimmed = line.trim_start();
        if let Some(after) = trimmed.strip_prefix(field)
            && (after.starts_with(' ') || after.starts_with('=') || after.starts_with('\t'))
        {
            let field_start_in_line = line.len() - trimmed.len();
            return Some(search_start + byte_offset + field_start_in_line);
        }
        byte_offset += line.len();
    }

    None
}

/// Suggest a similar name using Jaro-Winkler string similarity.
///
/// Returns the best match above the similarity threshold, or `None` if
/// nothing is close enough.
pub fn suggest_key(unknown: &str, valid_keys: &[&str]) -> Option<String> {
    let mut best_score = SUGGESTION_THRESHOLD;
    let mut best_match = None;

    for &key in valid_keys {
        let score = strsim::jaro_winkler(unknown, key);
        if score > best_score {
            best_score = score;
            best_match = Some(key.to_string());
        }
    }

    best_match
}

/// Render a list of `ConfigError`s to stderr using miette's graphical handler.
pub fn render_errors(errors: &[ConfigError]) {
    use miette::GraphicalReportHandler;

    let handler = GraphicalReportHandler::new();
    for error in errors {
        let mut buf = String::new();
        let diagnostic: &dyn Diagnostic = error;
        if handler.render_report(&mut buf, diagnostic).is_ok() {
            eprint!("{buf}");
        } else {
            eprintln!("Error: {error}");
        }
    }
}
