//! Locale-aware formatting
//!
//! Pure renderers for:
//! - Gregorian dates from a strftime-style pattern with locale names
//! - Plain numbers with locale separators and digit grouping
//! - Money amounts with currency symbol placement and negative styles

pub mod date;
pub mod number;

pub use date::{days_in_month, DateFormatter};
pub use number::{MoneyFormatter, NumberFormatter};

use crate::data_format::DataFormat;
use crate::error::DataResult;

/// All formatters of one locale
#[derive(Debug, Clone)]
pub struct Formatters {
    pub date: DateFormatter,
    pub number: NumberFormatter,
    pub money: MoneyFormatter,
}

impl Formatters {
    /// Validate and build formatters from a raw bundle
    pub fn from_data(data: &DataFormat) -> DataResult<Self> {
        Ok(Self {
            date: DateFormatter::from_data(&data.time)?,
            number: NumberFormatter::from_data(&data.numeric)?,
            money: MoneyFormatter::from_data(&data.monetary, &data.numeric)?,
        })
    }

    /// Neutral formatters of the root locale
    pub fn root() -> Self {
        Self {
            date: DateFormatter::root(),
            number: NumberFormatter::root(),
            money: MoneyFormatter::root(),
        }
    }
}
