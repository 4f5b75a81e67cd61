// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One configuration read and the typed, access-tracking views over its
//! sections.
//!
//! A [`ConfigRead`] owns the effective document of a single read together
//! with its access record. Host objects receive a [`SectionView`] borrowed
//! from it, so a view can never outlive the document it reads.

use std::cell::{Ref, RefCell};
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;

use crate::access::AccessRecord;
use crate::deprecation::DeprecationSink;
use crate::diagnostic::{ConfigError, RangeBound};
use crate::document::{Document, Section};
use crate::value::{ChoiceKey, Choices, ConfigValue, Get, ListSpec, ListValue};

/// The result of reading the configuration once.
pub struct ConfigRead {
    document: Document,
    autosave: Document,
    access: RefCell<AccessRecord>,
    deprecations: Rc<dyn DeprecationSink>,
}

impl ConfigRead {
    /// `document` is the effective configuration; `autosave` holds the
    /// options that came from the autosave block.
    pub fn new(document: Document, autosave: Document, deprecations: Rc<dyn DeprecationSink>) -> Self {
        Self {
            document,
            autosave,
            access: RefCell::new(AccessRecord::new()),
            deprecations,
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn autosave(&self) -> &Document {
        &self.autosave
    }

    pub fn access(&self) -> Ref<'_, AccessRecord> {
        self.access.borrow()
    }

    /// View over a section. The section does not have to exist.
    pub fn section(&self, name: &str) -> SectionView<'_> {
        SectionView {
            read: self,
            name: name.to_string(),
        }
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.document.has_section(name)
    }

    /// Views over every section whose name starts with `prefix`.
    pub fn prefix_sections(&self, prefix: &str) -> Vec<SectionView<'_>> {
        let prefix = prefix.to_lowercase();
        self.document
            .section_names()
            .filter(|name| name.to_lowercase().starts_with(&prefix))
            .map(|name| self.section(name))
            .collect()
    }

    fn record(&self, section: &str, option: &str, value: Value) {
        self.access.borrow_mut().record(section, option, value);
    }
}

/// Read-only, typed accessor over one section of a [`ConfigRead`].
pub struct SectionView<'r> {
    read: &'r ConfigRead,
    name: String,
}

impl<'r> SectionView<'r> {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Sibling view over another section of the same read.
    pub fn section(&self, other: &str) -> SectionView<'r> {
        self.read.section(other)
    }

    pub fn has_section(&self, other: &str) -> bool {
        self.read.has_section(other)
    }

    pub fn prefix_sections(&self, prefix: &str) -> Vec<SectionView<'r>> {
        self.read.prefix_sections(prefix)
    }

    /// Option names present in this section.
    pub fn options(&self) -> Vec<String> {
        self.backing()
            .map(|s| s.option_names().map(str::to_string).collect())
            .unwrap_or_default()
    }

    pub fn prefix_options(&self, prefix: &str) -> Vec<String> {
        let prefix = prefix.to_lowercase();
        self.options()
            .into_iter()
            .filter(|o| o.to_lowercase().starts_with(&prefix))
            .collect()
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.raw(option).is_some()
    }

    /// Read `option` as `T`, honouring the default and bounds in `opts`.
    pub fn get<T: ConfigValue>(&self, option: &str, opts: Get<T>) -> Result<T, ConfigError> {
        let Some(raw) = self.raw(option) else {
            return match opts.default {
                Some(default) => {
                    if opts.track {
                        self.note(option, &default);
                    }
                    Ok(default)
                }
                None => Err(self.missing(option)),
            };
        };

        let value = self.convert::<T>(option, raw)?;
        self.check_bounds(option, &value, &opts)?;
        if opts.track {
            self.note(option, &value);
        }
        Ok(value)
    }

    /// Read `option` if present. Absent options are not recorded.
    pub fn get_optional<T: ConfigValue>(
        &self,
        option: &str,
        opts: Get<T>,
    ) -> Result<Option<T>, ConfigError> {
        if !self.has_option(option) {
            return Ok(None);
        }
        self.get(option, opts).map(Some)
    }

    pub fn get_str(&self, option: &str) -> Result<String, ConfigError> {
        self.get(option, Get::required())
    }

    pub fn get_int(&self, option: &str, opts: Get<i64>) -> Result<i64, ConfigError> {
        self.get(option, opts)
    }

    pub fn get_float(&self, option: &str, opts: Get<f64>) -> Result<f64, ConfigError> {
        self.get(option, opts)
    }

    pub fn get_bool(&self, option: &str, opts: Get<bool>) -> Result<bool, ConfigError> {
        self.get(option, opts)
    }

    /// Resolve a selector through `choices`.
    ///
    /// When every key is an integer the selector is read as an integer,
    /// otherwise as a string. The selector (not the resolved value) is what
    /// gets recorded.
    pub fn get_choice<V: Clone>(
        &self,
        option: &str,
        choices: &Choices<V>,
        default: Option<&str>,
    ) -> Result<V, ConfigError> {
        let key = if choices.integer_keys() {
            let opts = match default {
                Some(d) => Get::default_value(
                    i64::parse_value(d).map_err(|source| self.invalid(option, d, source))?,
                ),
                None => Get::required(),
            };
            ChoiceKey::Int(self.get::<i64>(option, opts)?)
        } else {
            let opts = match default {
                Some(d) => Get::default_value(d.to_string()),
                None => Get::required(),
            };
            ChoiceKey::Str(self.get::<String>(option, opts)?)
        };

        choices
            .lookup(&key)
            .cloned()
            .ok_or_else(|| ConfigError::InvalidChoice {
                section: self.name.clone(),
                option: option.to_string(),
                choice: key.to_string(),
                valid: choices.describe(),
            })
    }

    /// Split `option` on the separators of `spec`, outermost first.
    pub fn get_list<T: ConfigValue>(
        &self,
        option: &str,
        spec: ListSpec<T>,
    ) -> Result<ListValue<T>, ConfigError> {
        let Some(raw) = self.raw(option) else {
            return match spec.default {
                Some(default) => {
                    if spec.track {
                        self.note(option, &default);
                    }
                    Ok(default)
                }
                None => Err(self.missing(option)),
            };
        };

        let value = self.split_list::<T>(option, raw, &spec.separators, spec.count)?;
        if spec.track {
            self.note(option, &value);
        }
        Ok(value)
    }

    /// Single-level list convenience over [`get_list`](Self::get_list).
    pub fn get_flat_list<T: ConfigValue>(
        &self,
        option: &str,
        sep: char,
        count: Option<usize>,
    ) -> Result<Vec<T>, ConfigError> {
        let mut spec = ListSpec::new().separators([sep]);
        if let Some(count) = count {
            spec = spec.count(count);
        }
        Ok(self.get_list(option, spec)?.into_items().unwrap_or_default())
    }

    /// Flag `option` (or one of its values) as deprecated. No-op when the
    /// option is absent.
    pub fn deprecate(&self, option: &str, value: Option<&str>) {
        if !self.has_option(option) {
            return;
        }
        let message = match value {
            None => format!("Option '{option}' in section '{}' is deprecated.", self.name),
            Some(v) => format!(
                "Value '{v}' in option '{option}' in section '{}' is deprecated.",
                self.name
            ),
        };
        self.read
            .deprecations
            .deprecate(&self.name, option, value, &message);
    }

    fn backing(&self) -> Option<&'r Section> {
        self.read.document.section(&self.name)
    }

    fn raw(&self, option: &str) -> Option<&'r str> {
        self.backing().and_then(|s| s.get(option))
    }

    fn note<S: Serialize>(&self, option: &str, value: &S) {
        let json = serde_json::to_value(value).unwrap_or(Value::Null);
        self.read.record(&self.name, option, json);
    }

    fn convert<T: ConfigValue>(&self, option: &str, raw: &str) -> Result<T, ConfigError> {
        T::parse_value(raw).map_err(|source| self.invalid(option, raw, source))
    }

    fn invalid(
        &self,
        option: &str,
        raw: &str,
        source: crate::value::BoxError,
    ) -> ConfigError {
        match source.downcast::<ConfigError>() {
            Ok(domain) => *domain,
            Err(source) => ConfigError::InvalidValue {
                section: self.name.clone(),
                option: option.to_string(),
                value: raw.to_string(),
                source,
            },
        }
    }

    fn missing(&self, option: &str) -> ConfigError {
        ConfigError::MissingOption {
            section: self.name.clone(),
            option: option.to_string(),
        }
    }

    fn check_bounds<T: ConfigValue>(
        &self,
        option: &str,
        value: &T,
        opts: &Get<T>,
    ) -> Result<(), ConfigError> {
        let violated = if let Some(min) = &opts.minval
            && value < min
        {
            Some(RangeBound::Minimum(min.to_string()))
        } else if let Some(max) = &opts.maxval
            && value > max
        {
            Some(RangeBound::Maximum(max.to_string()))
        } else if let Some(above) = &opts.above
            && value <= above
        {
            Some(RangeBound::Above(above.to_string()))
        } else if let Some(below) = &opts.below
            && value >= below
        {
            Some(RangeBound::Below(below.to_string()))
        } else {
            None
        };

        match violated {
            Some(bound) => Err(ConfigError::Range {
                section: self.name.clone(),
                option: option.to_string(),
                bound,
            }),
            None => Ok(()),
        }
    }

    fn split_list<T: ConfigValue>(
        &self,
        option: &str,
        raw: &str,
        seps: &[char],
        count: Option<usize>,
    ) -> Result<ListValue<T>, ConfigError> {
        if raw.trim().is_empty() {
            if seps.len() <= 1
                && let Some(expected) = count
                && expected != 0
            {
                return Err(ConfigError::WrongElementCount {
                    section: self.name.clone(),
                    option: option.to_string(),
                    expected,
                    found: 0,
                });
            }
            return Ok(ListValue::Items(Vec::new()));
        }
        match seps {
            [] => Ok(ListValue::Items(vec![self.convert(option, raw.trim())?])),
            [sep] => {
                let items = raw
                    .split(*sep)
                    .map(|part| self.convert(option, part.trim()))
                    .collect::<Result<Vec<T>, _>>()?;
                if let Some(expected) = count
                    && items.len() != expected
                {
                    return Err(ConfigError::WrongElementCount {
                        section: self.name.clone(),
                        option: option.to_string(),
                        expected,
                        found: items.len(),
                    });
                }
                Ok(ListValue::Items(items))
            }
            [outer, inner @ ..] => {
                let rows = raw
                    .split(*outer)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| self.split_list(option, part, inner, count))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(ListValue::Nested(rows))
            }
        }
    }
}
