// SPDX-FileCopyrightText: 2026 Printhost Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory configuration document.
//!
//! A [`Document`] is an ordered list of sections, each an ordered list of
//! options. Section and option names compare case-insensitively but keep the
//! spelling they were first stored with. Comment trivia captured by a
//! save-time parse rides along on sections and options so the writer can put
//! it back where it came from.

/// Compare two names the way every lookup in this crate does.
pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.chars()
        .flat_map(char::to_lowercase)
        .eq(b.chars().flat_map(char::to_lowercase))
}

/// Comments attached to a single option.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OptionComments {
    /// Full-line comments directly above the option line.
    pub leading: Vec<String>,
    /// Comment text after the value on the option line itself.
    pub inline: Option<String>,
    /// Comment lines inside a multi-line value, keyed by the number of value
    /// lines that precede them.
    pub interleaved: Vec<(usize, String)>,
}

impl OptionComments {
    pub fn is_empty(&self) -> bool {
        self.leading.is_empty() && self.inline.is_none() && self.interleaved.is_empty()
    }
}

/// One `key: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigOption {
    name: String,
    value: String,
    pub comments: OptionComments,
}

impl ConfigOption {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            comments: OptionComments::default(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
    }
}

/// A named group of options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Section {
    name: String,
    options: Vec<ConfigOption>,
    /// Comment lines after the last option of the section.
    pub trailing_comments: Vec<String>,
}

impl Section {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            options: Vec::new(),
            trailing_comments: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn options(&self) -> impl Iterator<Item = &ConfigOption> {
        self.options.iter()
    }

    pub fn option_names(&self) -> impl Iterator<Item = &str> {
        self.options.iter().map(|o| o.name.as_str())
    }

    pub fn len(&self) -> usize {
        self.options.len()
    }

    pub fn is_empty(&self) -> bool {
        self.options.is_empty()
    }

    pub fn entry(&self, option: &str) -> Option<&ConfigOption> {
        self.options.iter().find(|o| names_match(&o.name, option))
    }

    pub fn entry_mut(&mut self, option: &str) -> Option<&mut ConfigOption> {
        self.options.iter_mut().find(|o| names_match(&o.name, option))
    }

    pub fn get(&self, option: &str) -> Option<&str> {
        self.entry(option).map(ConfigOption::value)
    }

    pub fn has_option(&self, option: &str) -> bool {
        self.entry(option).is_some()
    }

    /// Set an option value. An existing option keeps its position, spelling
    /// and comments; a new one is appended.
    pub fn set(&mut self, option: &str, value: impl Into<String>) {
        match self.entry_mut(option) {
            Some(existing) => existing.value = value.into(),
            None => self.options.push(ConfigOption::new(option, value)),
        }
    }

    /// Insert or replace a whole option, comments included.
    pub fn upsert(&mut self, option: ConfigOption) {
        match self.options.iter().position(|o| names_match(&o.name, &option.name)) {
            Some(idx) => {
                let existing = &mut self.options[idx];
                existing.value = option.value;
                existing.comments = option.comments;
            }
            None => self.options.push(option),
        }
    }

    pub fn remove(&mut self, option: &str) -> bool {
        let before = self.options.len();
        self.options.retain(|o| !names_match(&o.name, option));
        self.options.len() != before
    }
}

/// Ordered mapping of section name to ordered options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    sections: Vec<Section>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn sections(&self) -> impl Iterator<Item = &Section> {
        self.sections.iter()
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.iter().map(Section::name)
    }

    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| names_match(&s.name, name))
    }

    pub fn section_mut(&mut self, name: &str) -> Option<&mut Section> {
        self.sections.iter_mut().find(|s| names_match(&s.name, name))
    }

    pub fn has_section(&self, name: &str) -> bool {
        self.section(name).is_some()
    }

    /// Return the named section, appending an empty one if it is missing.
    pub fn ensure_section(&mut self, name: &str) -> &mut Section {
        let idx = match self.sections.iter().position(|s| names_match(&s.name, name)) {
            Some(idx) => idx,
            None => {
                self.sections.push(Section::new(name));
                self.sections.len() - 1
            }
        };
        &mut self.sections[idx]
    }

    pub fn remove_section(&mut self, name: &str) -> bool {
        let before = self.sections.len();
        self.sections.retain(|s| !names_match(&s.name, name));
        self.sections.len() != before
    }

    pub fn get(&self, section: &str, option: &str) -> Option<&str> {
        self.section(section).and_then(|s| s.get(option))
    }

    pub fn has_option(&self, section: &str, option: &str) -> bool {
        self.get(section, option).is_some()
    }

    /// Set `section.option`, creating the section when needed.
    pub fn set(&mut self, section: &str, option: &str, value: impl Into<String>) {
        self.ensure_section(section).set(option, value);
    }

    pub fn remove_option(&mut self, section: &str, option: &str) -> bool {
        self.section_mut(section).is_some_and(|s| s.remove(option))
    }

    /// Apply every option of `other` on top of this document, in order.
    pub fn overlay(&mut self, other: &Document) {
        for section in other.sections() {
            let target = self.ensure_section(section.name());
            for option in section.options() {
                target.set(option.name(), option.value());
            }
        }
    }

    /// Section/option/value triples with comments stripped, for
    /// value-for-value comparisons.
    pub fn values(&self) -> Vec<(String, Vec<(String, String)>)> {
        self.sections
            .iter()
            .map(|s| {
                let opts = s
                    .options
                    .iter()
                    .map(|o| (o.name.clone(), o.value.clone()))
                    .collect();
                (s.name.clone(), opts)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_insensitive_but_storage_preserves_case() {
        let mut doc = Document::new();
        doc.set("Printer", "Max_Velocity", "300");

        assert_eq!(doc.get("printer", "max_velocity"), Some("300"));
        assert_eq!(doc.section_names().collect::<Vec<_>>(), vec!["Printer"]);
        assert_eq!(
            doc.section("PRINTER").unwrap().option_names().collect::<Vec<_>>(),
            vec!["Max_Velocity"]
        );
    }

    #[test]
    fn set_overwrites_in_place() {
        let mut doc = Document::new();
        doc.set("printer", "a", "1");
        doc.set("printer", "b", "2");
        doc.set("printer", "A", "3");

        let values = doc.values();
        assert_eq!(
            values[0].1,
            vec![("a".to_string(), "3".to_string()), ("b".to_string(), "2".to_string())]
        );
    }

    #[test]
    fn ensure_section_never_duplicates() {
        let mut doc = Document::new();
        doc.ensure_section("fan");
        doc.ensure_section("FAN");
        assert_eq!(doc.len(), 1);
    }

    #[test]
    fn remove_section_and_option() {
        let mut doc = Document::new();
        doc.set("fan", "pin", "PA1");
        doc.set("bltouch", "pin", "PB2");

        assert!(doc.remove_option("fan", "PIN"));
        assert!(!doc.remove_option("fan", "pin"));
        assert!(doc.remove_section("BLTouch"));
        assert!(!doc.has_section("bltouch"));
        assert!(doc.has_section("fan"));
    }

    #[test]
    fn overlay_applies_later_values() {
        let mut base = Document::new();
        base.set("printer", "kinematics", "cartesian");
        base.set("printer", "max_velocity", "200");

        let mut over = Document::new();
        over.set("printer", "max_velocity", "300");
        over.set("extruder", "step_pin", "PA3");

        base.overlay(&over);
        assert_eq!(base.get("printer", "max_velocity"), Some("300"));
        assert_eq!(base.get("printer", "kinematics"), Some("cartesian"));
        assert_eq!(base.get("extruder", "step_pin"), Some("PA3"));
    }

    #[test]
    fn upsert_replaces_comments() {
        let mut section = Section::new("fan");
        let mut opt = ConfigOption::new("pin", "PA1");
        opt.comments.inline = Some("# old".into());
        section.upsert(opt);

        section.upsert(ConfigOption::new("PIN", "PA2"));
        let entry = section.entry("pin").unwrap();
        assert_eq!(entry.value(), "PA2");
        assert!(entry.comments.is_empty());
        assert_eq!(entry.name(), "pin");
    }

    #[test]
    fn names_match_handles_unicode_case() {
        assert!(names_match("Düse", "DÜSE"));
        assert!(!names_match("fan", "fans"));
    }
}
