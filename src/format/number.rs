//! Number and money formatting
//!
//! Grouping follows POSIX `grouping` semantics: each entry is the size of
//! the next group counting from the decimal point, the last entry repeats,
//! `0` repeats the previous size, and a negative value or a value of 127
//! or more ends grouping.

use crate::data_format::{MonetaryData, NegativeFormat, NumericData};
use crate::decimal::Decimal;
use crate::error::{DataError, DataResult};

/// Upper bound for `frac_digits`
const MAX_FRAC_DIGITS: u8 = 8;

/// Plain number renderer
#[derive(Debug, Clone)]
pub struct NumberFormatter {
    decimal_point: String,
    thousands_sep: String,
    grouping: Vec<i16>,
}

impl NumberFormatter {
    pub fn from_data(data: &NumericData) -> DataResult<Self> {
        if data.decimal_point.is_empty() {
            return Err(DataError::InvalidField {
                field: "LC_NUMERIC.decimal_point",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(Self {
            decimal_point: data.decimal_point.clone(),
            thousands_sep: data.thousands_sep.clone(),
            grouping: data.grouping.clone(),
        })
    }

    /// `.` decimal point, `,` every three digits
    pub fn root() -> Self {
        Self {
            decimal_point: ".".to_string(),
            thousands_sep: ",".to_string(),
            grouping: vec![3],
        }
    }

    /// Render a float using its shortest round-trip digits
    pub fn format(&self, number: f64) -> String {
        match Decimal::from_f64(number) {
            Some(decimal) => self.format_decimal(&decimal),
            None => non_finite(number).to_string(),
        }
    }

    /// Render an exact decimal, keeping every fraction digit it carries
    pub fn format_decimal(&self, number: &Decimal) -> String {
        let mut out = String::new();
        if number.is_negative() {
            out.push('-');
        }
        out.push_str(&render_digits(
            number,
            &self.grouping,
            &self.thousands_sep,
            &self.decimal_point,
        ));
        out
    }
}

/// Currency renderer
#[derive(Debug, Clone)]
pub struct MoneyFormatter {
    symbol: String,
    decimal_point: String,
    thousands_sep: String,
    grouping: Vec<i16>,
    positive_sign: String,
    negative_sign: String,
    frac_digits: u8,
    cs_precedes: bool,
    sep_by_space: bool,
    negative_format: NegativeFormat,
}

impl MoneyFormatter {
    pub fn from_data(data: &MonetaryData, numeric: &NumericData) -> DataResult<Self> {
        if data.frac_digits > MAX_FRAC_DIGITS {
            return Err(DataError::InvalidField {
                field: "LC_MONETARY.frac_digits",
                reason: format!("{} exceeds {MAX_FRAC_DIGITS}", data.frac_digits),
            });
        }
        if data.frac_digits > 0 && data.mon_decimal_point.is_empty() {
            return Err(DataError::InvalidField {
                field: "LC_MONETARY.mon_decimal_point",
                reason: "must not be empty when frac_digits > 0".to_string(),
            });
        }

        let symbol = if data.currency_symbol.is_empty() {
            data.int_curr_symbol.trim().to_string()
        } else {
            data.currency_symbol.clone()
        };

        Ok(Self {
            symbol,
            decimal_point: data.mon_decimal_point.clone(),
            thousands_sep: data.mon_thousands_sep.clone(),
            grouping: data
                .mon_grouping
                .clone()
                .unwrap_or_else(|| numeric.grouping.clone()),
            positive_sign: data.positive_sign.clone(),
            negative_sign: data.negative_sign.clone(),
            frac_digits: data.frac_digits,
            cs_precedes: data.cs_precedes,
            sep_by_space: data.sep_by_space,
            negative_format: data.negative_format,
        })
    }

    /// Generic currency sign `¤`, two fraction digits
    pub fn root() -> Self {
        Self {
            symbol: "¤".to_string(),
            decimal_point: ".".to_string(),
            thousands_sep: ",".to_string(),
            grouping: vec![3],
            positive_sign: String::new(),
            negative_sign: "-".to_string(),
            frac_digits: 2,
            cs_precedes: true,
            sep_by_space: false,
            negative_format: NegativeFormat::Minus,
        }
    }

    pub fn frac_digits(&self) -> u8 {
        self.frac_digits
    }

    pub fn format(&self, amount: f64) -> String {
        match Decimal::from_f64(amount) {
            Some(decimal) => self.format_decimal(&decimal),
            None => {
                let body = non_finite(amount).trim_start_matches('-');
                self.place(body, amount.is_sign_negative() && !amount.is_nan())
            }
        }
    }

    /// Round half away from zero to the currency's fraction digits and render
    pub fn format_decimal(&self, amount: &Decimal) -> String {
        let rounded = amount.round(usize::from(self.frac_digits));
        let body = render_digits(
            &rounded,
            &self.grouping,
            &self.thousands_sep,
            &self.decimal_point,
        );
        self.place(&body, rounded.is_negative())
    }

    fn place(&self, body: &str, negative: bool) -> String {
        let space = if self.sep_by_space { " " } else { "" };
        let with_symbol = if self.cs_precedes {
            format!("{}{space}{body}", self.symbol)
        } else {
            format!("{body}{space}{}", self.symbol)
        };

        match (negative, self.negative_format) {
            (false, _) => format!("{}{with_symbol}", self.positive_sign),
            (true, NegativeFormat::Minus) => format!("{}{with_symbol}", self.negative_sign),
            (true, NegativeFormat::Parentheses) => format!("({with_symbol})"),
        }
    }
}

fn non_finite(value: f64) -> &'static str {
    if value.is_nan() {
        "NaN"
    } else if value.is_sign_negative() {
        "-∞"
    } else {
        "∞"
    }
}

/// Unsigned digits of `number` with grouping and decimal point
fn render_digits(number: &Decimal, grouping: &[i16], separator: &str, point: &str) -> String {
    let mut out = group_digits(number.integer_digits(), grouping, separator);
    if !number.fraction_digits().is_empty() {
        out.push_str(point);
        out.push_str(number.fraction_digits());
    }
    out
}

fn group_digits(digits: &str, grouping: &[i16], separator: &str) -> String {
    if separator.is_empty() {
        return digits.to_string();
    }

    let mut groups: Vec<&str> = Vec::new();
    let mut end = digits.len();
    let mut size: Option<usize> = None;
    let mut sizes = grouping.iter();

    loop {
        match sizes.next() {
            Some(&g) if !(0..127).contains(&g) => break,
            Some(&g) if g > 0 => size = Some(g as usize),
            // 0 repeats the previous size, exhausted list repeats the last
            _ => {}
        }
        match size {
            Some(s) if end > s => {
                groups.push(&digits[end - s..end]);
                end -= s;
            }
            _ => break,
        }
    }

    groups.push(&digits[..end]);
    groups.reverse();
    groups.join(separator)
}
