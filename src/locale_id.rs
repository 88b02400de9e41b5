//! Locale identifiers
//!
//! Accepts BCP 47 style (`en-US`) and POSIX style (`en_US.UTF-8`) spellings
//! and canonicalizes them so that every cache and fallback lookup is
//! case-insensitive.

use crate::error::{LocaleError, LocaleResult};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

static SUBTAGS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[a-z]{2,3}(-[a-z]{4})?(-([a-z]{2}|[0-9]{3}))?(-[a-z0-9]{4,8})*$")
        .expect("locale identifier pattern is valid")
});

/// Canonical locale identifier (e.g. `en`, `en-US`, `sr-Latn-RS`)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocaleId(String);

impl LocaleId {
    /// Identifier of the embedded root locale
    pub const ROOT: &'static str = "root";

    /// Parse and canonicalize a locale name
    pub fn parse(name: &str) -> LocaleResult<Self> {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case(Self::ROOT) {
            return Ok(Self::root());
        }

        // Drop POSIX codeset and modifier: `de_DE.UTF-8@euro`
        let base = trimmed
            .split(['.', '@'])
            .next()
            .unwrap_or_default()
            .replace('_', "-");

        if !SUBTAGS.is_match(&base) {
            return Err(LocaleError::InvalidLocaleId(name.to_string()));
        }

        let canonical = base
            .split('-')
            .enumerate()
            .map(|(index, subtag)| canonical_subtag(index, subtag))
            .collect::<Vec<_>>()
            .join("-");

        Ok(Self(canonical))
    }

    /// The embedded root locale
    pub fn root() -> Self {
        Self(Self::ROOT.to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == Self::ROOT
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Primary language subtag
    pub fn language(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }

    /// Region subtag if present
    pub fn region(&self) -> Option<&str> {
        self.0
            .split('-')
            .skip(1)
            .find(|s| s.len() == 2 || (s.len() == 3 && s.chars().all(|c| c.is_ascii_digit())))
    }

    /// Identifier with the last subtag removed, `None` for a bare language
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        self.0
            .rsplit_once('-')
            .map(|(parent, _)| Self(parent.to_string()))
    }

    /// This identifier followed by each of its parents
    pub fn ancestry(&self) -> Vec<Self> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(Self::parent) {
            chain.push(parent);
        }
        chain
    }

    /// POSIX spelling used by system locale directories (`en_US`)
    pub fn posix_name(&self) -> String {
        self.0.replace('-', "_")
    }
}

fn canonical_subtag(index: usize, subtag: &str) -> String {
    match (index, subtag.len()) {
        (0, _) => subtag.to_ascii_lowercase(),
        (_, 4) if subtag.chars().all(|c| c.is_ascii_alphabetic()) => {
            let mut chars = subtag.chars();
            match chars.next() {
                Some(first) => {
                    first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase()
                }
                None => String::new(),
            }
        }
        (_, 2) => subtag.to_ascii_uppercase(),
        _ => subtag.to_ascii_lowercase(),
    }
}

impl fmt::Display for LocaleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for LocaleId {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for LocaleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_forms() {
        assert_eq!(LocaleId::parse("EN_us").unwrap().as_str(), "en-US");
        assert_eq!(LocaleId::parse("fr").unwrap().as_str(), "fr");
        assert_eq!(
            LocaleId::parse("sr_latn_rs").unwrap().as_str(),
            "sr-Latn-RS"
        );
        assert_eq!(LocaleId::parse("es-419").unwrap().as_str(), "es-419");
    }

    #[test]
    fn test_posix_suffixes_are_stripped() {
        assert_eq!(LocaleId::parse("de_DE.UTF-8").unwrap().as_str(), "de-DE");
        assert_eq!(LocaleId::parse("de_DE@euro").unwrap().as_str(), "de-DE");
    }

    #[test]
    fn test_case_insensitive_equality() {
        assert_eq!(
            LocaleId::parse("pt-br").unwrap(),
            LocaleId::parse("PT_BR").unwrap()
        );
    }

    #[test]
    fn test_invalid_identifiers() {
        for name in ["", "e", "english-language", "en--US", "../etc", "en US"] {
            assert!(
                matches!(LocaleId::parse(name), Err(LocaleError::InvalidLocaleId(_))),
                "{name:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_ancestry() {
        let id = LocaleId::parse("sr-Latn-RS").unwrap();
        let chain: Vec<String> = id.ancestry().iter().map(|l| l.to_string()).collect();
        assert_eq!(chain, vec!["sr-Latn-RS", "sr-Latn", "sr"]);
        assert_eq!(LocaleId::parse("fr").unwrap().parent(), None);
    }

    #[test]
    fn test_language_and_region() {
        let id = LocaleId::parse("zh_Hant_TW").unwrap();
        assert_eq!(id.language(), "zh");
        assert_eq!(id.region(), Some("TW"));
        assert_eq!(LocaleId::parse("de").unwrap().region(), None);
    }

    #[test]
    fn test_root() {
        let root = LocaleId::parse("ROOT").unwrap();
        assert!(root.is_root());
        assert_eq!(root.parent(), None);
        assert_eq!(LocaleId::parse("en-US").unwrap().posix_name(), "en_US");
    }
}
