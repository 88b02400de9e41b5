//! Loaded locale data and the caller-facing [`Locale`] handle
//!
//! [`LocaleData`] is built once per id and never mutated. A [`Locale`]
//! pairs it with the fallback chain that was resolved when it was loaded,
//! so translation lookups walk own data, parents, the configured fallback
//! and finally the embedded root.

use crate::catalog::{interpolate, TranslationCatalog};
use crate::collation::CollationTable;
use crate::data_format::RawLocale;
use crate::decimal::Decimal;
use crate::error::{DataError, DataResult, LocaleResult};
use crate::format::Formatters;
use crate::locale_id::LocaleId;
use crate::plural::{PluralCategory, PluralOperands, PluralRuleSet};
use std::cmp::Ordering;
use std::fmt::Display;
use std::sync::Arc;

/// Validated, immutable data of one locale
#[derive(Debug)]
pub struct LocaleData {
    id: LocaleId,
    catalog: TranslationCatalog,
    plural_rules: PluralRuleSet,
    collation: CollationTable,
    formatters: Formatters,
}

impl LocaleData {
    /// Validate a raw bundle
    pub fn from_raw(id: LocaleId, raw: RawLocale) -> DataResult<Self> {
        let format = raw.format;

        let plural_rules = match format.plural_rules.as_deref() {
            Some(rules) => PluralRuleSet::from_data(rules, id.language())?,
            None => PluralRuleSet::for_language(id.language()),
        };

        let collation = match (format.collate.sort_order.as_str(), &format.collate.rules) {
            ("unicode", None) => CollationTable::unicode(),
            ("unicode", Some(rules)) | ("tailored", Some(rules)) => {
                CollationTable::from_rules(rules)?
            }
            ("tailored", None) => {
                return Err(DataError::InvalidField {
                    field: "LC_COLLATE.rules",
                    reason: "tailored sort order requires rules".to_string(),
                })
            }
            (other, _) => {
                return Err(DataError::InvalidField {
                    field: "LC_COLLATE.sort_order",
                    reason: format!("unknown sort order {other:?}"),
                })
            }
        };

        let formatters = Formatters::from_data(&format)?;

        Ok(Self {
            id,
            catalog: TranslationCatalog::from(raw.strings),
            plural_rules,
            collation,
            formatters,
        })
    }

    /// The embedded root locale: no strings, `other`-only plurals,
    /// code point collation, ISO dates
    pub fn root() -> Self {
        Self {
            id: LocaleId::root(),
            catalog: TranslationCatalog::new(),
            plural_rules: PluralRuleSet::for_language(LocaleId::ROOT),
            collation: CollationTable::unicode(),
            formatters: Formatters::root(),
        }
    }

    pub fn id(&self) -> &LocaleId {
        &self.id
    }

    pub fn catalog(&self) -> &TranslationCatalog {
        &self.catalog
    }

    pub fn plural_rules(&self) -> &PluralRuleSet {
        &self.plural_rules
    }

    pub fn collation(&self) -> &CollationTable {
        &self.collation
    }

    pub fn formatters(&self) -> &Formatters {
        &self.formatters
    }
}

/// Handle to a loaded locale
///
/// Cloning is cheap. A handle stays valid after its manager is dropped or
/// its cache entry is evicted.
#[derive(Debug, Clone)]
pub struct Locale {
    data: Arc<LocaleData>,
    fallbacks: Vec<Arc<LocaleData>>,
}

impl Locale {
    pub(crate) fn new(data: Arc<LocaleData>, fallbacks: Vec<Arc<LocaleData>>) -> Self {
        Self { data, fallbacks }
    }

    /// Handle for the embedded root locale alone
    pub fn root(root: Arc<LocaleData>) -> Self {
        Self::new(root, Vec::new())
    }

    pub fn id(&self) -> &LocaleId {
        &self.data.id
    }

    /// Canonical name, e.g. `en-US`
    pub fn name(&self) -> &str {
        self.data.id.as_str()
    }

    pub fn data(&self) -> &Arc<LocaleData> {
        &self.data
    }

    /// Ids consulted after this locale's own data, in order
    pub fn fallback_chain(&self) -> Vec<&LocaleId> {
        self.fallbacks.iter().map(|data| &data.id).collect()
    }

    fn chain(&self) -> impl Iterator<Item = &LocaleData> {
        std::iter::once(self.data.as_ref()).chain(self.fallbacks.iter().map(Arc::as_ref))
    }

    /// Translation for `key`, or `key` itself when no locale in the chain has it
    pub fn translate<'a>(&'a self, key: &'a str) -> &'a str {
        self.chain()
            .find_map(|data| data.catalog.lookup(key))
            .unwrap_or(key)
    }

    /// Translate and substitute `{name}` placeholders
    pub fn translate_with(&self, key: &str, args: &[(&str, &str)]) -> String {
        interpolate(self.translate(key), args)
    }

    pub fn plural_category(&self, n: impl Into<PluralOperands>) -> PluralCategory {
        self.data.plural_rules.select(n)
    }

    /// Form of `key` for `n`
    ///
    /// The rules of the locale that supplies the entry pick the category.
    pub fn plural_word<'a>(&'a self, key: &'a str, n: impl Into<PluralOperands>) -> &'a str {
        let operands = n.into();
        self.chain()
            .find_map(|data| {
                data.catalog
                    .get(key)
                    .map(|entry| entry.form(data.plural_rules.select(operands)))
            })
            .unwrap_or(key)
    }

    /// `true` unless `n` selects the `one` category
    pub fn plural(&self, n: impl Into<PluralOperands>) -> bool {
        self.plural_category(n) != PluralCategory::One
    }

    /// Plural form of `key` with `{count}` and `args` substituted
    pub fn format_plural<N>(&self, key: &str, count: N, args: &[(&str, &str)]) -> String
    where
        N: Into<PluralOperands> + Display,
    {
        let count_text = count.to_string();
        let mut all_args = Vec::with_capacity(args.len() + 1);
        all_args.push(("count", count_text.as_str()));
        all_args.extend_from_slice(args);
        interpolate(self.plural_word(key, count), &all_args)
    }

    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.data.collation.compare(a, b)
    }

    pub fn sort<S: AsRef<str>>(&self, items: &mut [S]) {
        self.data.collation.sort(items);
    }

    pub fn sort_key(&self, s: &str) -> Vec<u64> {
        self.data.collation.sort_key(s)
    }

    pub fn format_date(&self, year: i32, month: u32, day: u32) -> LocaleResult<String> {
        self.data.formatters.date.format(year, month, day)
    }

    pub fn format_money(&self, amount: f64) -> String {
        self.data.formatters.money.format(amount)
    }

    /// Money from a decimal string such as `"-1234.505"`
    pub fn format_money_decimal(&self, amount: &str) -> LocaleResult<String> {
        let decimal = Decimal::parse(amount)?;
        Ok(self.data.formatters.money.format_decimal(&decimal))
    }

    pub fn format_numeric(&self, number: f64) -> String {
        self.data.formatters.number.format(number)
    }

    /// Number from a decimal string, keeping every digit it carries
    pub fn format_numeric_decimal(&self, number: &str) -> LocaleResult<String> {
        let decimal = Decimal::parse(number)?;
        Ok(self.data.formatters.number.format_decimal(&decimal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{PluralForms, StringEntry};
    use crate::data_format::DataFormat;
    use crate::error::LocaleError;
    use crate::loader::tests::EN_FORMAT;
    use std::collections::HashMap;

    fn data(name: &str, strings: &[(&str, StringEntry)], rules: Option<&str>) -> Arc<LocaleData> {
        let mut format: DataFormat = serde_json::from_str(EN_FORMAT).unwrap();
        format.plural_rules = rules.map(str::to_string);
        let strings: HashMap<String, StringEntry> = strings
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect();
        let raw = RawLocale { format, strings };
        Arc::new(LocaleData::from_raw(LocaleId::parse(name).unwrap(), raw).unwrap())
    }

    fn simple(s: &str) -> StringEntry {
        StringEntry::Simple(s.to_string())
    }

    fn files() -> StringEntry {
        StringEntry::Plural(PluralForms {
            one: Some("{count} file".into()),
            other: "{count} files".into(),
            ..Default::default()
        })
    }

    #[test]
    fn test_translate_walks_chain() {
        let en = data("en", &[("hello", simple("Hello")), ("bye", simple("Bye"))], None);
        let en_gb = data("en-GB", &[("hello", simple("Hello, mate"))], None);
        let locale = Locale::new(en_gb, vec![en, Arc::new(LocaleData::root())]);

        assert_eq!(locale.translate("hello"), "Hello, mate");
        assert_eq!(locale.translate("bye"), "Bye");
        assert_eq!(locale.translate("missing.key"), "missing.key");
        assert_eq!(locale.fallback_chain().len(), 2);
    }

    #[test]
    fn test_translate_with_args() {
        let en = data("en", &[("welcome", simple("Welcome, {name}!"))], None);
        let locale = Locale::new(en, Vec::new());
        assert_eq!(
            locale.translate_with("welcome", &[("name", "Ana")]),
            "Welcome, Ana!"
        );
    }

    #[test]
    fn test_plural_words_use_category() {
        let en = data("en", &[("files", files())], None);
        let locale = Locale::new(en, Vec::new());
        assert_eq!(locale.plural_word("files", 1), "{count} file");
        assert_eq!(locale.plural_word("files", 2), "{count} files");
        assert_eq!(locale.plural_word("files", 0), "{count} files");
        assert_eq!(locale.format_plural("files", 1, &[]), "1 file");
        assert_eq!(locale.format_plural("files", 5, &[]), "5 files");
        assert!(!locale.plural(1));
        assert!(locale.plural(2));
        assert_eq!(locale.plural_word("absent", 3), "absent");
    }

    #[test]
    fn test_other_only_locale_forms_coincide() {
        let ja = data("ja", &[("files", files())], None);
        let locale = Locale::new(ja, Vec::new());
        assert_eq!(locale.plural_word("files", 1), locale.plural_word("files", 2));
        assert_eq!(locale.plural_category(1), PluralCategory::Other);
    }

    #[test]
    fn test_fallback_entry_uses_its_own_rules() {
        // Own rules: everything is `one`; the entry lives in English data
        let odd = data("xx", &[], Some("one: i = 0..1000"));
        let en = data("en", &[("files", files())], None);
        let locale = Locale::new(odd, vec![en]);
        assert_eq!(locale.plural_word("files", 2), "{count} files");
    }

    #[test]
    fn test_decimal_inputs() {
        let en = data("en", &[], None);
        let locale = Locale::new(en, Vec::new());
        assert_eq!(locale.format_money(1234.5), "$1,234.50");
        assert_eq!(locale.format_money_decimal("-1234.505").unwrap(), "-$1,234.51");
        assert_eq!(
            locale.format_numeric_decimal("1234567.000").unwrap(),
            "1,234,567.000"
        );
        assert!(matches!(
            locale.format_numeric_decimal("12abc"),
            Err(LocaleError::InvalidNumber(_))
        ));
    }

    #[test]
    fn test_date_and_collation_delegate() {
        let en = data("en", &[], None);
        let locale = Locale::new(en, Vec::new());
        assert_eq!(locale.format_date(2024, 2, 29).unwrap(), "February 29, 2024");
        assert!(locale.format_date(2023, 2, 29).is_err());
        assert_eq!(locale.compare("a", "b"), Ordering::Less);
        assert_eq!(locale.compare("b", "b"), Ordering::Equal);
        let mut words = vec!["pear", "apple", "fig"];
        locale.sort(&mut words);
        assert_eq!(words, vec!["apple", "fig", "pear"]);
    }

    #[test]
    fn test_gettext_plural_rules_are_accepted() {
        let en = data("en", &[("files", files())], Some("n != 1"));
        let locale = Locale::new(en, Vec::new());
        assert_eq!(locale.plural_category(1), PluralCategory::One);
        assert_eq!(locale.format_plural("files", 3, &[]), "3 files");
        assert!(!locale.plural(1));
        assert!(locale.plural(0));
    }

    #[test]
    fn test_invalid_bundles_are_rejected() {
        let mut format: DataFormat = serde_json::from_str(EN_FORMAT).unwrap();
        format.collate.sort_order = "tailored".to_string();
        let raw = RawLocale {
            format: format.clone(),
            strings: HashMap::new(),
        };
        assert!(LocaleData::from_raw(LocaleId::parse("en").unwrap(), raw).is_err());

        format.collate.sort_order = "unicode".to_string();
        format.plural_rules = Some("some: n = 1".to_string());
        let raw = RawLocale {
            format,
            strings: HashMap::new(),
        };
        assert!(matches!(
            LocaleData::from_raw(LocaleId::parse("en").unwrap(), raw),
            Err(DataError::PluralRules(_))
        ));
    }

    #[test]
    fn test_root_data() {
        let root = Locale::root(Arc::new(LocaleData::root()));
        assert!(root.id().is_root());
        assert_eq!(root.format_date(2024, 3, 7).unwrap(), "2024-03-07");
        assert_eq!(root.plural_category(1), PluralCategory::Other);
        assert_eq!(root.translate("x"), "x");
    }
}
