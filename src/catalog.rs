//! Translation catalog with plural-indexed entries.
//!
//! # Invariants
//!
//! 1. **Missing is a value**: lookups for unknown keys return `None`; the
//!    [`Locale`](crate::Locale) layer turns that into the key itself.
//!
//! 2. **Plural selection terminates at `other`**: a category without its own
//!    form uses the `other` form, which every plural entry has.
//!
//! 3. **Interpolation is single pass**: `{name}` tokens are replaced once;
//!    substituted values are never scanned again.

use crate::plural::PluralCategory;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// A single catalog entry: either a simple string or plural forms.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringEntry {
    /// A simple, non-pluralized string.
    Simple(String),
    /// Plural forms keyed by CLDR category.
    Plural(PluralForms),
}

impl StringEntry {
    /// The form shown when no count is involved
    pub fn default_form(&self) -> &str {
        match self {
            StringEntry::Simple(s) => s,
            StringEntry::Plural(forms) => &forms.other,
        }
    }

    /// The form for a plural category; simple entries ignore the category
    pub fn form(&self, category: PluralCategory) -> &str {
        match self {
            StringEntry::Simple(s) => s,
            StringEntry::Plural(forms) => forms.select(category),
        }
    }
}

/// Plural form strings keyed by category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PluralForms {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub two: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub few: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub many: Option<String>,
    pub other: String,
}

impl PluralForms {
    /// Select the form for `category`, falling back to `other`.
    pub fn select(&self, category: PluralCategory) -> &str {
        let form = match category {
            PluralCategory::Zero => self.zero.as_deref(),
            PluralCategory::One => self.one.as_deref(),
            PluralCategory::Two => self.two.as_deref(),
            PluralCategory::Few => self.few.as_deref(),
            PluralCategory::Many => self.many.as_deref(),
            PluralCategory::Other => None,
        };
        form.unwrap_or(&self.other)
    }
}

/// Translation strings for a single locale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationCatalog {
    entries: HashMap<String, StringEntry>,
}

impl TranslationCatalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a simple string.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries
            .insert(key.into(), StringEntry::Simple(value.into()));
    }

    /// Insert plural forms.
    pub fn insert_plural(&mut self, key: impl Into<String>, forms: PluralForms) {
        self.entries.insert(key.into(), StringEntry::Plural(forms));
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&StringEntry> {
        self.entries.get(key)
    }

    /// Look up the count-free form of a key.
    pub fn lookup(&self, key: &str) -> Option<&str> {
        self.get(key).map(StringEntry::default_form)
    }

    /// Look up the form of a key for a plural category.
    pub fn lookup_plural(&self, key: &str, category: PluralCategory) -> Option<&str> {
        self.get(key).map(|entry| entry.form(category))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All keys, sorted for deterministic output.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        keys.sort_unstable();
        keys
    }
}

impl From<HashMap<String, StringEntry>> for TranslationCatalog {
    fn from(entries: HashMap<String, StringEntry>) -> Self {
        Self { entries }
    }
}

/// Single-pass `{name}` interpolation. Unmatched tokens left as-is.
pub fn interpolate(template: &str, args: &[(&str, &str)]) -> String {
    let mut result = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        result.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        match after.find('}') {
            Some(close) => {
                let token = &after[..close];
                match args.iter().find(|(name, _)| *name == token) {
                    Some((_, value)) => result.push_str(value),
                    None => {
                        result.push('{');
                        result.push_str(token);
                        result.push('}');
                    }
                }
                rest = &after[close + 1..];
            }
            None => {
                // Unclosed brace: emit the remainder as-is
                result.push_str(&rest[open..]);
                rest = "";
            }
        }
    }

    result.push_str(rest);
    result
}
