//! Serialized shape of a locale bundle
//!
//! `data_format.json` carries the POSIX-style categories (`LC_TIME`,
//! `LC_NUMERIC`, `LC_MONETARY`, `LC_COLLATE`) plus the plural rule
//! string. `locale.toml` and `strings.json` carry the translations. These structs are the
//! parsed-but-unvalidated form handed to the core by a [`LocaleLoader`].
//!
//! [`LocaleLoader`]: crate::loader::LocaleLoader

use crate::catalog::StringEntry;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Raw contents of `data_format.json`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFormat {
    #[serde(rename = "LC_TIME")]
    pub time: TimeData,

    #[serde(rename = "LC_NUMERIC")]
    pub numeric: NumericData,

    #[serde(rename = "LC_MONETARY")]
    pub monetary: MonetaryData,

    #[serde(rename = "LC_COLLATE", default)]
    pub collate: CollateData,

    /// CLDR rules or a gettext expression; the language preset is used when absent
    #[serde(rename = "PLURAL_RULES", default)]
    pub plural_rules: Option<String>,
}

/// Calendar names and the date pattern
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeData {
    /// Weekday names, Sunday first
    pub days: Vec<String>,

    /// Month names, January first
    pub months: Vec<String>,

    #[serde(default)]
    pub abbr_days: Option<Vec<String>>,

    #[serde(default)]
    pub abbr_months: Option<Vec<String>>,

    /// strftime-style pattern (`%d.%m.%Y`)
    pub date_fmt: String,
}

/// Plain number separators
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NumericData {
    pub decimal_point: String,
    pub thousands_sep: String,
    #[serde(default)]
    pub grouping: Vec<i16>,
}

/// Currency formatting
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonetaryData {
    pub currency_symbol: String,
    pub int_curr_symbol: String,
    pub mon_decimal_point: String,
    pub mon_thousands_sep: String,

    /// Falls back to `LC_NUMERIC.grouping` when absent
    #[serde(default)]
    pub mon_grouping: Option<Vec<i16>>,

    #[serde(default)]
    pub positive_sign: String,

    #[serde(default = "default_negative_sign")]
    pub negative_sign: String,

    pub frac_digits: u8,

    /// Symbol before the amount
    #[serde(default = "default_true")]
    pub cs_precedes: bool,

    /// Space between symbol and amount
    #[serde(default)]
    pub sep_by_space: bool,

    #[serde(default)]
    pub negative_format: NegativeFormat,
}

/// How negative money amounts are written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NegativeFormat {
    /// `-$1.00`
    #[default]
    Minus,
    /// `($1.00)`
    Parentheses,
}

/// Collation settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollateData {
    /// `unicode` for raw code point order, `tailored` to apply `rules`
    #[serde(default = "default_sort_order")]
    pub sort_order: String,

    /// Tailoring in `&a < b << c <<< d` syntax
    #[serde(default)]
    pub rules: Option<String>,
}

impl Default for CollateData {
    fn default() -> Self {
        Self {
            sort_order: default_sort_order(),
            rules: None,
        }
    }
}

/// Everything a loader hands to the core for one locale
#[derive(Debug, Clone)]
pub struct RawLocale {
    pub format: DataFormat,
    pub strings: HashMap<String, StringEntry>,
}

fn default_true() -> bool {
    true
}

fn default_negative_sign() -> String {
    "-".to_string()
}

fn default_sort_order() -> String {
    "unicode".to_string()
}
