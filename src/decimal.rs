//! Exact decimal numbers for formatting and plural operands
//!
//! Numbers are kept as digit strings so that formatting never introduces
//! binary floating point artifacts. `f64` input is first rendered with
//! `ryu`, which yields the shortest string that round-trips to the same
//! float, so `0.1` stays `0.1` rather than `0.1000000000000000055511`.

use crate::error::{LocaleError, LocaleResult};

/// Largest accepted exponent magnitude in scientific notation
const MAX_EXPONENT: i64 = 4096;

/// A finite decimal number as sign, integer digits and fraction digits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decimal {
    negative: bool,
    /// No leading zeros; `"0"` for values below one
    integer: String,
    /// Visible fraction digits, trailing zeros preserved
    fraction: String,
}

impl Decimal {
    /// Parse `[+-]digits[.digits][e[+-]digits]`
    pub fn parse(input: &str) -> LocaleResult<Self> {
        let invalid = || LocaleError::InvalidNumber(input.to_string());
        let s = input.trim();

        let (negative, unsigned) = match s.as_bytes().first() {
            Some(b'-') => (true, &s[1..]),
            Some(b'+') => (false, &s[1..]),
            _ => (false, s),
        };

        let (mantissa, exponent) = match unsigned.find(['e', 'E']) {
            Some(pos) => {
                let exp: i64 = unsigned[pos + 1..].parse().map_err(|_| invalid())?;
                if exp.abs() > MAX_EXPONENT {
                    return Err(invalid());
                }
                (&unsigned[..pos], exp)
            }
            None => (unsigned, 0),
        };

        let (int_part, frac_part) = match mantissa.split_once('.') {
            Some((int_part, frac_part)) => (int_part, frac_part),
            None => (mantissa, ""),
        };

        let all_digits = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        if (int_part.is_empty() && frac_part.is_empty())
            || !all_digits(int_part)
            || !all_digits(frac_part)
        {
            return Err(invalid());
        }

        let mut decimal = if exponent == 0 {
            Self {
                negative,
                integer: int_part.to_string(),
                fraction: frac_part.to_string(),
            }
        } else {
            shift_point(negative, int_part, frac_part, exponent)
        };
        decimal.normalize();
        Ok(decimal)
    }

    /// Exact decimal for a finite float, `None` for NaN and infinities
    pub fn from_f64(value: f64) -> Option<Self> {
        if !value.is_finite() {
            return None;
        }
        let mut buffer = ryu::Buffer::new();
        let mut decimal = Self::parse(buffer.format_finite(value)).ok()?;
        // ryu writes `1.0` for integral values
        let trimmed = decimal.fraction.trim_end_matches('0').len();
        decimal.fraction.truncate(trimmed);
        Some(decimal)
    }

    pub fn from_u64(value: u64) -> Self {
        Self {
            negative: false,
            integer: value.to_string(),
            fraction: String::new(),
        }
    }

    pub fn is_negative(&self) -> bool {
        self.negative
    }

    pub fn is_zero(&self) -> bool {
        self.integer == "0" && self.fraction.bytes().all(|b| b == b'0')
    }

    pub fn integer_digits(&self) -> &str {
        &self.integer
    }

    pub fn fraction_digits(&self) -> &str {
        &self.fraction
    }

    /// Round half away from zero to exactly `scale` fraction digits
    pub fn round(&self, scale: usize) -> Self {
        if self.fraction.len() <= scale {
            let mut fraction = self.fraction.clone();
            fraction.extend(std::iter::repeat('0').take(scale - self.fraction.len()));
            return Self {
                negative: self.negative,
                integer: self.integer.clone(),
                fraction,
            };
        }

        let round_up = self.fraction.as_bytes()[scale] >= b'5';
        let mut digits: Vec<u8> = self
            .integer
            .bytes()
            .chain(self.fraction.bytes().take(scale))
            .collect();

        if round_up {
            let mut carry = true;
            for digit in digits.iter_mut().rev() {
                if *digit == b'9' {
                    *digit = b'0';
                } else {
                    *digit += 1;
                    carry = false;
                    break;
                }
            }
            if carry {
                digits.insert(0, b'1');
            }
        }

        let split = digits.len() - scale;
        let fraction = digits.split_off(split);
        let mut rounded = Self {
            negative: self.negative,
            integer: String::from_utf8(digits).unwrap_or_default(),
            fraction: String::from_utf8(fraction).unwrap_or_default(),
        };
        rounded.normalize();
        rounded
    }

    /// Approximate value, used only for plural rule comparisons
    pub fn to_f64(&self) -> f64 {
        let text = if self.fraction.is_empty() {
            self.integer.clone()
        } else {
            format!("{}.{}", self.integer, self.fraction)
        };
        text.parse().unwrap_or(f64::MAX)
    }

    fn normalize(&mut self) {
        let significant = self.integer.trim_start_matches('0');
        self.integer = if significant.is_empty() {
            "0".to_string()
        } else {
            significant.to_string()
        };
        if self.is_zero() {
            self.negative = false;
        }
    }
}

fn shift_point(negative: bool, int_part: &str, frac_part: &str, exponent: i64) -> Decimal {
    let digits = format!("{int_part}{frac_part}");
    let point = int_part.len() as i64 + exponent;

    let (integer, fraction) = if point <= 0 {
        let zeros = "0".repeat(point.unsigned_abs() as usize);
        ("0".to_string(), format!("{zeros}{digits}"))
    } else if point as usize >= digits.len() {
        let zeros = "0".repeat(point as usize - digits.len());
        (format!("{digits}{zeros}"), String::new())
    } else {
        let (integer, fraction) = digits.split_at(point as usize);
        (integer.to_string(), fraction.to_string())
    };

    Decimal {
        negative,
        integer,
        fraction,
    }
}

impl std::str::FromStr for Decimal {
    type Err = LocaleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl std::fmt::Display for Decimal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.negative {
            f.write_str("-")?;
        }
        f.write_str(&self.integer)?;
        if !self.fraction.is_empty() {
            write!(f, ".{}", self.fraction)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain() {
        let d = Decimal::parse("-001234.5600").unwrap();
        assert!(d.is_negative());
        assert_eq!(d.integer_digits(), "1234");
        assert_eq!(d.fraction_digits(), "5600");
        assert_eq!(d.to_string(), "-1234.5600");
    }

    #[test]
    fn test_parse_partial_forms() {
        assert_eq!(Decimal::parse(".5").unwrap().to_string(), "0.5");
        assert_eq!(Decimal::parse("5.").unwrap().to_string(), "5");
        assert_eq!(Decimal::parse("+7").unwrap().to_string(), "7");
    }

    #[test]
    fn test_parse_exponent() {
        assert_eq!(Decimal::parse("1.5e3").unwrap().to_string(), "1500");
        assert_eq!(Decimal::parse("12.5e-3").unwrap().to_string(), "0.0125");
        assert_eq!(Decimal::parse("1e21").unwrap().to_string(), "1000000000000000000000");
        assert_eq!(Decimal::parse("123.45e1").unwrap().to_string(), "1234.5");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in ["", "-", ".", "1.2.3", "abc", "1e", "1e99999", "1,000"] {
            assert!(Decimal::parse(input).is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_negative_zero_is_zero() {
        let d = Decimal::parse("-0.000").unwrap();
        assert!(!d.is_negative());
        assert!(d.is_zero());
    }

    #[test]
    fn test_from_f64_has_no_binary_artifacts() {
        assert_eq!(Decimal::from_f64(0.1).unwrap().to_string(), "0.1");
        assert_eq!(Decimal::from_f64(1234.5).unwrap().to_string(), "1234.5");
        assert_eq!(Decimal::from_f64(3.0).unwrap().to_string(), "3");
        assert_eq!(Decimal::from_f64(-2.75).unwrap().to_string(), "-2.75");
        assert!(Decimal::from_f64(f64::NAN).is_none());
        assert!(Decimal::from_f64(f64::INFINITY).is_none());
    }

    #[test]
    fn test_round_half_away_from_zero() {
        let round = |s: &str, scale| Decimal::parse(s).unwrap().round(scale).to_string();
        assert_eq!(round("1234.5", 2), "1234.50");
        assert_eq!(round("2.345", 2), "2.35");
        assert_eq!(round("-2.345", 2), "-2.35");
        assert_eq!(round("2.344", 2), "2.34");
        assert_eq!(round("9.995", 2), "10.00");
        assert_eq!(round("999.5", 0), "1000");
        assert_eq!(round("0.4", 0), "0");
    }

    #[test]
    fn test_round_to_zero_drops_sign() {
        let d = Decimal::parse("-0.001").unwrap().round(2);
        assert!(!d.is_negative());
        assert_eq!(d.to_string(), "0.00");
    }
}
