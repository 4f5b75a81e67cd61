// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversions from raw option text to typed values, and the option bags
//! passed to the typed getters.

use std::fmt;

use serde::Serialize;

/// Boxed conversion failure.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// A type an option value can be read as.
///
/// A `parse_value` failure that is itself a
/// [`ConfigError`](crate::ConfigError) is passed to the caller unchanged;
/// anything else is wrapped in `ConfigError::InvalidValue`.
pub trait ConfigValue: Sized + Clone + PartialOrd + fmt::Display + Serialize {
    fn parse_value(raw: &str) -> Result<Self, BoxError>;
}

impl ConfigValue for String {
    fn parse_value(raw: &str) -> Result<Self, BoxError> {
        Ok(raw.to_string())
    }
}

impl ConfigValue for i64 {
    fn parse_value(raw: &str) -> Result<Self, BoxError> {
        Ok(raw.trim().parse()?)
    }
}

impl ConfigValue for f64 {
    fn parse_value(raw: &str) -> Result<Self, BoxError> {
        Ok(raw.trim().parse()?)
    }
}

impl ConfigValue for bool {
    fn parse_value(raw: &str) -> Result<Self, BoxError> {
        parse_bool(raw).ok_or_else(|| format!("not a boolean: '{}'", raw.trim()).into())
    }
}

/// `1/yes/true/on` and `0/no/false/off`, case-insensitive.
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

/// Options for a single typed read.
///
/// ```
/// use printhost_config::Get;
///
/// let opts = Get::default_value(0.5).minval(0.0).maxval(1.0);
/// # let _ = opts;
/// ```
#[derive(Debug, Clone)]
pub struct Get<T> {
    pub(crate) default: Option<T>,
    pub(crate) minval: Option<T>,
    pub(crate) maxval: Option<T>,
    pub(crate) above: Option<T>,
    pub(crate) below: Option<T>,
    pub(crate) track: bool,
}

impl<T> Default for Get<T> {
    fn default() -> Self {
        Self {
            default: None,
            minval: None,
            maxval: None,
            above: None,
            below: None,
            track: true,
        }
    }
}

impl<T> Get<T> {
    /// The option must be present.
    pub fn required() -> Self {
        Self::default()
    }

    /// Fall back to `value` when the option is absent.
    pub fn default_value(value: T) -> Self {
        Self {
            default: Some(value),
            ..Self::default()
        }
    }

    /// Inclusive lower bound.
    pub fn minval(mut self, v: T) -> Self {
        self.minval = Some(v);
        self
    }

    /// Inclusive upper bound.
    pub fn maxval(mut self, v: T) -> Self {
        self.maxval = Some(v);
        self
    }

    /// Strict lower bound.
    pub fn above(mut self, v: T) -> Self {
        self.above = Some(v);
        self
    }

    /// Strict upper bound.
    pub fn below(mut self, v: T) -> Self {
        self.below = Some(v);
        self
    }

    /// Do not record this read in the access record.
    pub fn untracked(mut self) -> Self {
        self.track = false;
        self
    }
}

/// Lookup key of a choice table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceKey {
    Int(i64),
    Str(String),
}

impl fmt::Display for ChoiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(v) => write!(f, "{v}"),
            Self::Str(v) => f.write_str(v),
        }
    }
}

impl From<i64> for ChoiceKey {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<&str> for ChoiceKey {
    fn from(v: &str) -> Self {
        Self::Str(v.to_string())
    }
}

impl From<String> for ChoiceKey {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

/// Valid selectors of a choice option and what each resolves to.
#[derive(Debug, Clone)]
pub struct Choices<V> {
    entries: Vec<(ChoiceKey, V)>,
}

impl<V> Default for Choices<V> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
        }
    }
}

impl<V> Choices<V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<ChoiceKey>, value: V) -> Self {
        self.entries.push((key.into(), value));
        self
    }

    /// Selectors are parsed as integers only when every key is an integer.
    pub(crate) fn integer_keys(&self) -> bool {
        !self.entries.is_empty() && self.entries.iter().all(|(k, _)| matches!(k, ChoiceKey::Int(_)))
    }

    pub(crate) fn lookup(&self, key: &ChoiceKey) -> Option<&V> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub(crate) fn describe(&self) -> String {
        self.entries
            .iter()
            .map(|(k, _)| k.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl Choices<String> {
    /// Identity table over a plain set of strings.
    pub fn set<'a>(keys: impl IntoIterator<Item = &'a str>) -> Self {
        keys.into_iter()
            .fold(Self::new(), |c, k| c.with(k, k.to_string()))
    }
}

impl Choices<i64> {
    /// Identity table over a plain set of integers.
    pub fn int_set(keys: impl IntoIterator<Item = i64>) -> Self {
        keys.into_iter().fold(Self::new(), |c, k| c.with(k, k))
    }
}

/// A possibly nested list read from one option.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ListValue<T> {
    Items(Vec<T>),
    Nested(Vec<ListValue<T>>),
}

impl<T> ListValue<T> {
    /// The flat items, if this is a single-level list.
    pub fn into_items(self) -> Option<Vec<T>> {
        match self {
            Self::Items(items) => Some(items),
            Self::Nested(_) => None,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::Items(items) => items.len(),
            Self::Nested(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Options for a list read.
#[derive(Debug, Clone)]
pub struct ListSpec<T> {
    pub(crate) separators: Vec<char>,
    pub(crate) count: Option<usize>,
    pub(crate) default: Option<ListValue<T>>,
    pub(crate) track: bool,
}

impl<T> Default for ListSpec<T> {
    fn default() -> Self {
        Self {
            separators: vec![','],
            count: None,
            default: None,
            track: true,
        }
    }
}

impl<T> ListSpec<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Separators from the outermost level inwards, e.g. `['\n', ',']`.
    pub fn separators(mut self, seps: impl IntoIterator<Item = char>) -> Self {
        self.separators = seps.into_iter().collect();
        self
    }

    /// Every innermost list must have exactly `count` elements.
    pub fn count(mut self, count: usize) -> Self {
        self.count = Some(count);
        self
    }

    pub fn default_value(mut self, value: ListValue<T>) -> Self {
        self.default = Some(value);
        self
    }

    pub fn untracked(mut self) -> Self {
        self.track = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn booleans() {
        for raw in ["1", "yes", "TRUE", " on "] {
            assert_eq!(parse_bool(raw), Some(true));
        }
        for raw in ["0", "No", "false", "OFF"] {
            assert_eq!(parse_bool(raw), Some(false));
        }
        assert!(bool::parse_value("maybe").is_err());
    }

    #[test]
    fn numbers_tolerate_surrounding_whitespace() {
        assert_eq!(i64::parse_value(" 42 ").unwrap(), 42);
        assert_eq!(f64::parse_value("0.25").unwrap(), 0.25);
        assert!(i64::parse_value("4.2").is_err());
    }

    #[test]
    fn choice_tables() {
        let modes = Choices::set(["cartesian", "corexy"]);
        assert!(!modes.integer_keys());
        assert_eq!(modes.lookup(&"corexy".into()), Some(&"corexy".to_string()));

        let mixed = Choices::new().with(1, "one").with("two", "two");
        assert!(!mixed.integer_keys());

        let ints = Choices::int_set([1, 2, 4]);
        assert!(ints.integer_keys());
        assert_eq!(ints.describe(), "1, 2, 4");
    }

    #[test]
    fn nested_list_serializes_as_arrays() {
        let list = ListValue::Nested(vec![
            ListValue::Items(vec![1, 2]),
            ListValue::Items(vec![3, 4]),
        ]);
        assert_eq!(serde_json::to_value(&list).unwrap(), serde_json::json!([[1, 2], [3, 4]]));
    }
}
