//! CLDR plural rules
//!
//! A [`PluralRuleSet`] is parsed from the CLDR rule syntax
//! (`one: i = 1 and v = 0; few: ...`) into an ordered list of
//! `(category, condition)` pairs. Conditions are plain data (or-of-and
//! relation lists) evaluated against [`PluralOperands`] without any
//! interpreter state. Operands are compared in integer arithmetic, so
//! modulo rules stay exact for integers of any length.
//!
//! Bundles may also carry a gettext `plural=` expression; the common ones
//! map to the equivalent CLDR set through [`PluralRuleSet::from_data`].
//!
//! # Invariants
//!
//! 1. Clauses are evaluated in declaration order; the first match wins.
//! 2. `other` is the implicit fallback, so every number maps to exactly
//!    one category.
//! 3. Evaluation is a pure function of the operands.

use crate::decimal::Decimal;
use crate::error::{LocaleResult, PluralRuleError};
use log::warn;
use std::fmt;

/// CLDR plural categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PluralCategory {
    Zero,
    One,
    Two,
    Few,
    Many,
    Other,
}

impl PluralCategory {
    pub const ALL: [PluralCategory; 6] = [
        Self::Zero,
        Self::One,
        Self::Two,
        Self::Few,
        Self::Many,
        Self::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zero => "zero",
            Self::One => "one",
            Self::Two => "two",
            Self::Few => "few",
            Self::Many => "many",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for PluralCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PluralCategory {
    type Err = PluralRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PluralRuleError::UnknownCategory(s.trim().to_string()))
    }
}

/// Number decomposition used by plural conditions
///
/// | Operand | Meaning |
/// |---------|---------|
/// | `n` | absolute value |
/// | `i` | integer digits |
/// | `v` | count of visible fraction digits |
/// | `w` | same, without trailing zeros |
/// | `f` | visible fraction digits as an integer |
/// | `t` | same, without trailing zeros |
/// | `e` | compact decimal exponent (always 0 here) |
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PluralOperands {
    pub n: f64,
    pub i: u64,
    pub v: u32,
    pub w: u32,
    pub f: u64,
    pub t: u64,
    pub e: u32,
}

impl PluralOperands {
    /// Operands for a decimal, keeping its visible fraction digits
    pub fn from_decimal(decimal: &Decimal) -> Self {
        let fraction = decimal.fraction_digits();
        let trimmed = fraction.trim_end_matches('0');
        Self {
            n: decimal.to_f64().abs(),
            i: digits_to_u64(decimal.integer_digits()),
            v: fraction.len() as u32,
            w: trimmed.len() as u32,
            f: digits_to_u64(fraction),
            t: digits_to_u64(trimmed),
            e: 0,
        }
    }

    /// Parse operands from a decimal string such as `"1.50"`
    pub fn parse(input: &str) -> LocaleResult<Self> {
        Decimal::parse(input).map(|d| Self::from_decimal(&d))
    }

    fn integer(value: u64) -> Self {
        Self {
            n: value as f64,
            i: value,
            v: 0,
            w: 0,
            f: 0,
            t: 0,
            e: 0,
        }
    }

    /// Integer part of an operand and whether it has a non-zero fraction.
    /// Only `n` can have one; `i` carries its integer digits exactly.
    fn get(&self, operand: Operand) -> (u64, bool) {
        match operand {
            Operand::N => (self.i, self.t != 0),
            Operand::I => (self.i, false),
            Operand::V => (u64::from(self.v), false),
            Operand::W => (u64::from(self.w), false),
            Operand::F => (self.f, false),
            Operand::T => (self.t, false),
            Operand::E => (u64::from(self.e), false),
        }
    }
}

/// Digit string to u64; longer strings keep their low 18 digits offset by
/// 10^18 so modulo checks stay exact while equality with small values fails.
fn digits_to_u64(digits: &str) -> u64 {
    const LIMIT: usize = 18;
    if digits.is_empty() {
        return 0;
    }
    if digits.len() <= LIMIT {
        return digits.parse().unwrap_or(0);
    }
    let low: u64 = digits[digits.len() - LIMIT..].parse().unwrap_or(0);
    1_000_000_000_000_000_000 + low
}

impl From<u32> for PluralOperands {
    fn from(value: u32) -> Self {
        Self::integer(u64::from(value))
    }
}

impl From<u64> for PluralOperands {
    fn from(value: u64) -> Self {
        Self::integer(value)
    }
}

impl From<i32> for PluralOperands {
    fn from(value: i32) -> Self {
        Self::integer(u64::from(value.unsigned_abs()))
    }
}

impl From<i64> for PluralOperands {
    fn from(value: i64) -> Self {
        Self::integer(value.unsigned_abs())
    }
}

impl From<usize> for PluralOperands {
    fn from(value: usize) -> Self {
        Self::integer(value as u64)
    }
}

impl From<&Decimal> for PluralOperands {
    fn from(value: &Decimal) -> Self {
        Self::from_decimal(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operand {
    N,
    I,
    V,
    W,
    F,
    T,
    E,
}

/// One `operand [% m] (in|within|=|!=) ranges` test
#[derive(Debug, Clone, PartialEq, Eq)]
struct Relation {
    operand: Operand,
    modulus: Option<u64>,
    negated: bool,
    /// `in`/`=`/`is` require an integral value, `within` does not
    integral: bool,
    ranges: Vec<(u64, u64)>,
}

impl Relation {
    fn matches(&self, operands: &PluralOperands) -> bool {
        let (mut whole, fractional) = operands.get(self.operand);
        if let Some(modulus) = self.modulus {
            whole %= modulus;
        }
        let hit = if !fractional {
            self.ranges.iter().any(|&(lo, hi)| whole >= lo && whole <= hi)
        } else if self.integral {
            false
        } else {
            // whole + fraction lies in [lo, hi] exactly when lo <= whole < hi
            self.ranges.iter().any(|&(lo, hi)| whole >= lo && whole < hi)
        };
        hit != self.negated
    }
}

/// Disjunction of conjunctions
#[derive(Debug, Clone, PartialEq, Eq)]
struct Condition {
    any_of: Vec<Vec<Relation>>,
}

impl Condition {
    fn matches(&self, operands: &PluralOperands) -> bool {
        self.any_of
            .iter()
            .any(|all_of| all_of.iter().all(|relation| relation.matches(operands)))
    }
}

/// Ordered plural rules for one locale
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PluralRuleSet {
    rules: Vec<(PluralCategory, Condition)>,
    source: String,
}

impl PluralRuleSet {
    /// Parse CLDR rule text. An empty string yields an `other`-only set.
    pub fn parse(source: &str) -> Result<Self, PluralRuleError> {
        let mut rules: Vec<(PluralCategory, Condition)> = Vec::new();
        let mut seen_other = false;

        for clause in source.split(';').map(str::trim).filter(|c| !c.is_empty()) {
            let (label, body) = clause
                .split_once(':')
                .ok_or_else(|| PluralRuleError::MissingCategory(clause.to_string()))?;
            let category: PluralCategory = label.parse()?;

            let duplicate = if category == PluralCategory::Other {
                std::mem::replace(&mut seen_other, true)
            } else {
                rules.iter().any(|(c, _)| *c == category)
            };
            if duplicate {
                return Err(PluralRuleError::DuplicateCategory(category.to_string()));
            }

            // Samples are documentation only
            let body = body.split('@').next().unwrap_or_default().trim();
            if category == PluralCategory::Other {
                continue;
            }

            let tokens = tokenize(body)?;
            let condition = Parser::new(&tokens).condition()?;
            rules.push((category, condition));
        }

        Ok(Self {
            rules,
            source: source.trim().to_string(),
        })
    }

    /// Built-in rules for a language subtag, English-style when unknown
    pub fn for_language(language: &str) -> Self {
        Self::parse(preset_for(language)).unwrap_or_default()
    }

    /// Rules from a bundle's `PLURAL_RULES` value.
    ///
    /// CLDR text is parsed strictly. A gettext expression (`n != 1`,
    /// `n > 1`, `0` and the usual ternary chains, with or without the
    /// `nplurals=N; plural=...;` header) maps to the equivalent rule set.
    /// An unrecognised gettext expression gets the preset for `language`.
    pub fn from_data(source: &str, language: &str) -> Result<Self, PluralRuleError> {
        if is_cldr(source) {
            return Self::parse(source);
        }

        let rules = gettext_rules(source, language).unwrap_or_else(|| {
            warn!(
                "Unrecognised gettext plural expression {:?}, using the {} preset",
                source, language
            );
            preset_for(language)
        });
        let mut set = Self::parse(rules)?;
        set.source = source.trim().to_string();
        Ok(set)
    }

    /// Select the category for a number
    pub fn select(&self, operands: impl Into<PluralOperands>) -> PluralCategory {
        let operands = operands.into();
        self.rules
            .iter()
            .find(|(_, condition)| condition.matches(&operands))
            .map(|(category, _)| *category)
            .unwrap_or(PluralCategory::Other)
    }

    /// Categories this set can produce, in declaration order, ending with `other`
    pub fn categories(&self) -> Vec<PluralCategory> {
        let mut categories: Vec<PluralCategory> = self.rules.iter().map(|(c, _)| *c).collect();
        categories.push(PluralCategory::Other);
        categories
    }

    /// Rule text this set was parsed from
    pub fn source(&self) -> &str {
        &self.source
    }
}

const PRESET_OTHER_ONLY: &str = "";
const PRESET_ONE_V0: &str = "one: i = 1 and v = 0";
const PRESET_ZERO_ONE: &str = "one: i = 0,1";
const PRESET_EAST_SLAVIC: &str = "one: v = 0 and i % 10 = 1 and i % 100 != 11; \
    few: v = 0 and i % 10 = 2..4 and i % 100 != 12..14; \
    many: v = 0 and i % 10 = 0 or v = 0 and i % 10 = 5..9 or v = 0 and i % 100 = 11..14";
const PRESET_POLISH: &str = "one: i = 1 and v = 0; \
    few: v = 0 and i % 10 = 2..4 and i % 100 != 12..14; \
    many: v = 0 and i != 1 and i % 10 = 0..1 or v = 0 and i % 10 = 5..9 or v = 0 and i % 100 = 12..14";
const PRESET_WEST_SLAVIC: &str = "one: i = 1 and v = 0; few: i = 2..4 and v = 0; many: v != 0";
const PRESET_SOUTH_SLAVIC: &str =
    "one: v = 0 and i % 10 = 1 and i % 100 != 11 or f % 10 = 1 and f % 100 != 11; \
    few: v = 0 and i % 10 = 2..4 and i % 100 != 12..14 or f % 10 = 2..4 and f % 100 != 12..14";
const PRESET_ARABIC: &str =
    "zero: n = 0; one: n = 1; two: n = 2; few: n % 100 = 3..10; many: n % 100 = 11..99";

fn preset_for(language: &str) -> &'static str {
    let primary = language.split(['-', '_']).next().unwrap_or(language);
    match primary.to_ascii_lowercase().as_str() {
        "fr" | "pt" | "hi" | "bn" => PRESET_ZERO_ONE,
        "ru" | "uk" | "be" => PRESET_EAST_SLAVIC,
        "pl" => PRESET_POLISH,
        "cs" | "sk" => PRESET_WEST_SLAVIC,
        "hr" | "sr" | "bs" => PRESET_SOUTH_SLAVIC,
        "ar" => PRESET_ARABIC,
        "ja" | "zh" | "ko" | "th" | "vi" | "id" | "ms" | "root" => PRESET_OTHER_ONLY,
        _ => PRESET_ONE_V0,
    }
}

/// CLDR clauses open with a bare category word and a colon
fn is_cldr(source: &str) -> bool {
    match source.split(';').map(str::trim).find(|c| !c.is_empty()) {
        None => true,
        Some(clause) => clause.split_once(':').is_some_and(|(label, _)| {
            let label = label.trim();
            !label.is_empty() && label.chars().all(|c| c.is_ascii_alphabetic())
        }),
    }
}

/// CLDR equivalent of a gettext plural expression.
///
/// Matching ignores whitespace and parentheses. The third form of the
/// Slavic `n%10==1 ...` chain is `many` in Russian and `other` in
/// Croatian, so that chain defers to the language preset when it has one.
fn gettext_rules(source: &str, language: &str) -> Option<&'static str> {
    let compact: String = source
        .chars()
        .filter(|c| !c.is_whitespace() && *c != '(' && *c != ')')
        .collect();
    let expression = match compact.find("plural=") {
        Some(pos) => compact[pos + "plural=".len()..]
            .split(';')
            .next()
            .unwrap_or_default(),
        None => compact.trim_end_matches(';'),
    };

    let rules = match expression {
        "0" => PRESET_OTHER_ONLY,
        "n!=1" | "n==1?0:1" => PRESET_ONE_V0,
        "n>1" | "n>1?1:0" => PRESET_ZERO_ONE,
        "n%10==1&&n%100!=11?0:n%10>=2&&n%10<=4&&n%100<10||n%100>=20?1:2" => {
            match preset_for(language) {
                PRESET_SOUTH_SLAVIC => PRESET_SOUTH_SLAVIC,
                _ => PRESET_EAST_SLAVIC,
            }
        }
        "n==1?0:n%10>=2&&n%10<=4&&n%100<10||n%100>=20?1:2" => PRESET_POLISH,
        "n==1?0:n>=2&&n<=4?1:2" => PRESET_WEST_SLAVIC,
        "n==0?0:n==1?1:n==2?2:n%100>=3&&n%100<=10?3:n%100>=11?4:5" => PRESET_ARABIC,
        _ => return None,
    };
    Some(rules)
}

// ── Grammar ─────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
enum Token {
    Word(String),
    Number(u64),
    Eq,
    NotEq,
    Percent,
    Comma,
    Range,
}

impl Token {
    fn describe(&self) -> String {
        match self {
            Token::Word(w) => w.clone(),
            Token::Number(n) => n.to_string(),
            Token::Eq => "=".into(),
            Token::NotEq => "!=".into(),
            Token::Percent => "%".into(),
            Token::Comma => ",".into(),
            Token::Range => "..".into(),
        }
    }
}

fn tokenize(text: &str) -> Result<Vec<Token>, PluralRuleError> {
    let mut tokens = Vec::new();
    let mut chars = text.chars().peekable();

    while let Some(&ch) = chars.peek() {
        match ch {
            c if c.is_whitespace() => {
                chars.next();
            }
            c if c.is_ascii_digit() => {
                let mut value: u64 = 0;
                while let Some(d) = chars.peek().and_then(|c| c.to_digit(10)) {
                    value = value.saturating_mul(10).saturating_add(u64::from(d));
                    chars.next();
                }
                tokens.push(Token::Number(value));
            }
            c if c.is_ascii_alphabetic() => {
                let mut word = String::new();
                while let Some(&c) = chars.peek().filter(|c| c.is_ascii_alphabetic()) {
                    word.push(c);
                    chars.next();
                }
                tokens.push(Token::Word(word));
            }
            '=' => {
                chars.next();
                tokens.push(Token::Eq);
            }
            '!' => {
                chars.next();
                if chars.next() != Some('=') {
                    return Err(PluralRuleError::UnexpectedToken {
                        found: "!".into(),
                        expected: "!=",
                    });
                }
                tokens.push(Token::NotEq);
            }
            '%' => {
                chars.next();
                tokens.push(Token::Percent);
            }
            ',' => {
                chars.next();
                tokens.push(Token::Comma);
            }
            '.' => {
                chars.next();
                if chars.next() != Some('.') {
                    return Err(PluralRuleError::UnexpectedToken {
                        found: ".".into(),
                        expected: "..",
                    });
                }
                tokens.push(Token::Range);
            }
            other => {
                return Err(PluralRuleError::UnexpectedToken {
                    found: other.to_string(),
                    expected: "operand, operator or number",
                })
            }
        }
    }

    Ok(tokens)
}

struct Parser<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, pos: 0 }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self, expected: &'static str) -> Result<&Token, PluralRuleError> {
        let token = self
            .tokens
            .get(self.pos)
            .ok_or(PluralRuleError::UnexpectedEnd(expected))?;
        self.pos += 1;
        Ok(token)
    }

    fn eat_word(&mut self, word: &str) -> bool {
        if matches!(self.peek(), Some(Token::Word(w)) if w == word) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn condition(&mut self) -> Result<Condition, PluralRuleError> {
        let mut any_of = vec![self.and_chain()?];
        while self.eat_word("or") {
            any_of.push(self.and_chain()?);
        }
        if let Some(token) = self.peek() {
            return Err(PluralRuleError::UnexpectedToken {
                found: token.describe(),
                expected: "'and', 'or' or end of clause",
            });
        }
        Ok(Condition { any_of })
    }

    fn and_chain(&mut self) -> Result<Vec<Relation>, PluralRuleError> {
        let mut all_of = vec![self.relation()?];
        while self.eat_word("and") {
            all_of.push(self.relation()?);
        }
        Ok(all_of)
    }

    fn relation(&mut self) -> Result<Relation, PluralRuleError> {
        let operand = match self.next("operand")? {
            Token::Word(w) => match w.as_str() {
                "n" => Operand::N,
                "i" => Operand::I,
                "v" => Operand::V,
                "w" => Operand::W,
                "f" => Operand::F,
                "t" => Operand::T,
                "e" | "c" => Operand::E,
                _ => {
                    return Err(PluralRuleError::UnexpectedToken {
                        found: w.clone(),
                        expected: "operand",
                    })
                }
            },
            other => {
                return Err(PluralRuleError::UnexpectedToken {
                    found: other.describe(),
                    expected: "operand",
                })
            }
        };

        let modulus = if matches!(self.peek(), Some(Token::Percent)) || self.eat_word("mod") {
            if matches!(self.peek(), Some(Token::Percent)) {
                self.pos += 1;
            }
            match self.number()? {
                0 => return Err(PluralRuleError::ZeroModulus),
                modulus => Some(modulus),
            }
        } else {
            None
        };

        let (negated, integral) = self.operator()?;
        let ranges = self.range_list()?;

        Ok(Relation {
            operand,
            modulus,
            negated,
            integral,
            ranges,
        })
    }

    /// Returns `(negated, integral)`
    fn operator(&mut self) -> Result<(bool, bool), PluralRuleError> {
        match self.next("relation operator")?.clone() {
            Token::Eq => Ok((false, true)),
            Token::NotEq => Ok((true, true)),
            Token::Word(w) if w == "is" => Ok((self.eat_word("not"), true)),
            Token::Word(w) if w == "in" => Ok((false, true)),
            Token::Word(w) if w == "within" => Ok((false, false)),
            Token::Word(w) if w == "not" => {
                if self.eat_word("in") {
                    Ok((true, true))
                } else if self.eat_word("within") {
                    Ok((true, false))
                } else {
                    Err(PluralRuleError::UnexpectedToken {
                        found: self.peek().map(Token::describe).unwrap_or_default(),
                        expected: "'in' or 'within'",
                    })
                }
            }
            other => Err(PluralRuleError::UnexpectedToken {
                found: other.describe(),
                expected: "relation operator",
            }),
        }
    }

    fn range_list(&mut self) -> Result<Vec<(u64, u64)>, PluralRuleError> {
        let mut ranges = Vec::new();
        loop {
            let start = self.number()?;
            let end = if matches!(self.peek(), Some(Token::Range)) {
                self.pos += 1;
                self.number()?
            } else {
                start
            };
            ranges.push((start.min(end), start.max(end)));

            if matches!(self.peek(), Some(Token::Comma)) {
                self.pos += 1;
            } else {
                return Ok(ranges);
            }
        }
    }

    fn number(&mut self) -> Result<u64, PluralRuleError> {
        match self.next("number")? {
            Token::Number(n) => Ok(*n),
            other => Err(PluralRuleError::UnexpectedToken {
                found: other.describe(),
                expected: "number",
            }),
        }
    }
}
