//! Gregorian date formatting
//!
//! Patterns use strftime-style directives:
//!
//! | Directive | Output |
//! |-----------|--------|
//! | `%Y` | year, at least four digits |
//! | `%y` | two-digit year |
//! | `%m` / `%-m` | month, padded / unpadded |
//! | `%d` / `%-d` / `%e` | day, padded / unpadded / space padded |
//! | `%B` / `%b` | month name / abbreviated month name |
//! | `%A` / `%a` | weekday name / abbreviated weekday name |
//! | `%j` | day of the year |
//! | `%%` | literal `%` |
//!
//! Unknown directives are copied through unchanged.

use crate::data_format::TimeData;
use crate::error::{DataError, DataResult, LocaleError, LocaleResult};
use chrono::{Datelike, NaiveDate};
use std::fmt::Write;

const ROOT_MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

const ROOT_DAYS: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Number of days in a Gregorian month, `None` for a month outside 1..=12
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let leap = (year % 4 == 0 && year % 100 != 0) || year % 400 == 0;
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => Some(31),
        4 | 6 | 9 | 11 => Some(30),
        2 if leap => Some(29),
        2 => Some(28),
        _ => None,
    }
}

/// Date renderer for one locale
#[derive(Debug, Clone)]
pub struct DateFormatter {
    pattern: String,
    months: Vec<String>,
    abbr_months: Vec<String>,
    /// Sunday first
    days: Vec<String>,
    abbr_days: Vec<String>,
}

impl DateFormatter {
    pub fn from_data(data: &TimeData) -> DataResult<Self> {
        let months = expect_len("LC_TIME.months", &data.months, 12)?;
        let days = expect_len("LC_TIME.days", &data.days, 7)?;
        let abbr_months = match &data.abbr_months {
            Some(names) => expect_len("LC_TIME.abbr_months", names, 12)?,
            None => abbreviate(&months),
        };
        let abbr_days = match &data.abbr_days {
            Some(names) => expect_len("LC_TIME.abbr_days", names, 7)?,
            None => abbreviate(&days),
        };
        if data.date_fmt.trim().is_empty() {
            return Err(DataError::InvalidField {
                field: "LC_TIME.date_fmt",
                reason: "pattern is empty".to_string(),
            });
        }

        Ok(Self {
            pattern: data.date_fmt.clone(),
            months,
            abbr_months,
            days,
            abbr_days,
        })
    }

    /// ISO-style `%Y-%m-%d` with English names
    pub fn root() -> Self {
        let months: Vec<String> = ROOT_MONTHS.iter().map(|s| s.to_string()).collect();
        let days: Vec<String> = ROOT_DAYS.iter().map(|s| s.to_string()).collect();
        Self {
            pattern: "%Y-%m-%d".to_string(),
            abbr_months: abbreviate(&months),
            abbr_days: abbreviate(&days),
            months,
            days,
        }
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Render a calendar date, rejecting days that do not exist
    ///
    /// Every `i32` year is accepted. Weekday and day of year are taken from
    /// the year at the same place in the 400-year Gregorian cycle, which
    /// spans a whole number of weeks.
    pub fn format(&self, year: i32, month: u32, day: u32) -> LocaleResult<String> {
        let invalid = || LocaleError::InvalidDate { year, month, day };
        let max_day = days_in_month(year, month).ok_or_else(invalid)?;
        if day == 0 || day > max_day {
            return Err(invalid());
        }
        let cycle_year = 2000 + year.rem_euclid(400);
        let date = NaiveDate::from_ymd_opt(cycle_year, month, day).ok_or_else(invalid)?;
        Ok(self.render(year, date))
    }

    fn render(&self, year: i32, date: NaiveDate) -> String {
        let mut out = String::with_capacity(self.pattern.len() * 2);
        let month_index = date.month0() as usize;
        let weekday_index = date.weekday().num_days_from_sunday() as usize;
        let mut chars = self.pattern.chars();

        while let Some(ch) = chars.next() {
            if ch != '%' {
                out.push(ch);
                continue;
            }

            let mut directive = chars.next();
            let unpadded = directive == Some('-');
            if unpadded {
                directive = chars.next();
            }

            // Writing to a String cannot fail
            let _ = match directive {
                Some('Y') => write_year(&mut out, year),
                Some('y') => write!(out, "{:02}", year.rem_euclid(100)),
                Some('m') if unpadded => write!(out, "{}", date.month()),
                Some('m') => write!(out, "{:02}", date.month()),
                Some('d') if unpadded => write!(out, "{}", date.day()),
                Some('d') => write!(out, "{:02}", date.day()),
                Some('e') => write!(out, "{:>2}", date.day()),
                Some('j') => write!(out, "{:03}", date.ordinal()),
                Some('B') => out.write_str(&self.months[month_index]),
                Some('b') | Some('h') => out.write_str(&self.abbr_months[month_index]),
                Some('A') => out.write_str(&self.days[weekday_index]),
                Some('a') => out.write_str(&self.abbr_days[weekday_index]),
                Some('%') => out.write_str("%"),
                Some(other) => {
                    out.push('%');
                    if unpadded {
                        out.push('-');
                    }
                    out.write_char(other)
                }
                None => {
                    out.push('%');
                    if unpadded {
                        out.push('-');
                    }
                    Ok(())
                }
            };
        }

        out
    }
}

fn write_year(out: &mut String, year: i32) -> std::fmt::Result {
    if year < 0 {
        write!(out, "-{:04}", year.unsigned_abs())
    } else {
        write!(out, "{:04}", year)
    }
}

fn expect_len(field: &'static str, names: &[String], len: usize) -> DataResult<Vec<String>> {
    if names.len() != len {
        return Err(DataError::InvalidField {
            field,
            reason: format!("expected {len} names, found {}", names.len()),
        });
    }
    Ok(names.to_vec())
}

/// First three characters of each name
fn abbreviate(names: &[String]) -> Vec<String> {
    names.iter().map(|name| name.chars().take(3).collect()).collect()
}
