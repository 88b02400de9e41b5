//! Locale collation
//!
//! A [`CollationTable`] maps characters and contractions to three-level
//! weights. Strings compare by all primary weights first, then all
//! secondary weights, then all tertiary weights.
//!
//! # Invariants
//!
//! 1. Code points missing from the table weigh their own code point at the
//!    primary level, so every pair of strings is ordered.
//! 2. The order is a total preorder: reflexive, transitive and antisymmetric
//!    up to collation equality.
//! 3. Collation equality is not identity. With `a = b` in the tailoring,
//!    `"a"` and `"b"` compare equal although their bytes differ.
//!
//! # Tailoring syntax
//!
//! | Syntax | Meaning |
//! |--------|---------|
//! | `&x` | reset: following relations are placed after `x` |
//! | `< y` | `y` gets a new primary weight after the previous element |
//! | `<< y` | same primary, greater secondary (accent difference) |
//! | `<<< y` | same primary and secondary, greater tertiary (case difference) |
//! | `= y` | identical weights |
//!
//! Elements of more than one character are contractions (`&c < ch`).

use crate::error::CollationRuleError;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Raw code points occupy the high bits of a primary weight; tailored
/// elements use the low bits to sit between two code points.
const PRIMARY_SHIFT: u32 = 16;

/// Weights of one collation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CollationElement {
    pub primary: u64,
    pub secondary: u16,
    pub tertiary: u16,
}

impl CollationElement {
    /// Fallback weight for a code point absent from the table
    pub fn raw(ch: char) -> Self {
        Self {
            primary: u64::from(u32::from(ch)) << PRIMARY_SHIFT,
            secondary: 0,
            tertiary: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strength {
    Primary,
    Secondary,
    Tertiary,
    Identical,
}

/// Weight table for one locale
#[derive(Debug, Clone, Default)]
pub struct CollationTable {
    entries: HashMap<String, CollationElement>,
    /// Longest entry in chars, bounds the contraction search
    max_len: usize,
}

impl CollationTable {
    /// Table with no tailoring: plain code point order
    pub fn unicode() -> Self {
        Self::default()
    }

    /// Build a table from tailoring rules
    pub fn from_rules(rules: &str) -> Result<Self, CollationRuleError> {
        let mut builder = TableBuilder::default();
        let mut last: Option<CollationElement> = None;
        let mut pending: Option<Strength> = None;
        let mut reset = false;

        for (offset, token) in tokenize(rules) {
            match token {
                RuleToken::Reset => {
                    if pending.is_some() {
                        return Err(CollationRuleError::MissingElement(offset));
                    }
                    reset = true;
                }
                RuleToken::Relation(strength) => {
                    if pending.is_some() || reset {
                        return Err(CollationRuleError::MissingElement(offset));
                    }
                    if last.is_none() {
                        return Err(CollationRuleError::MissingAnchor(rules.trim().to_string()));
                    }
                    pending = Some(strength);
                }
                RuleToken::Element(text) => match (pending.take(), last) {
                    (Some(strength), Some(previous)) => {
                        let weight = builder.place(previous, strength);
                        builder.insert(text, weight);
                        last = Some(weight);
                    }
                    _ => {
                        // A reset, or the first element of the rules
                        last = Some(builder.anchor(&text));
                        reset = false;
                    }
                },
            }
        }

        if pending.is_some() || reset {
            return Err(CollationRuleError::MissingElement(rules.len()));
        }

        Ok(builder.finish())
    }

    pub fn is_tailored(&self) -> bool {
        !self.entries.is_empty()
    }

    /// Split a string into collation elements, longest match first
    pub fn elements(&self, s: &str) -> Vec<CollationElement> {
        let chars: Vec<char> = s.chars().collect();
        let mut elements = Vec::with_capacity(chars.len());
        let mut pos = 0;

        while pos < chars.len() {
            let longest = self.max_len.min(chars.len() - pos);
            let matched = (1..=longest).rev().find_map(|len| {
                let candidate: String = chars[pos..pos + len].iter().collect();
                self.entries.get(&candidate).map(|weight| (len, *weight))
            });

            match matched {
                Some((len, weight)) => {
                    elements.push(weight);
                    pos += len;
                }
                None => {
                    elements.push(CollationElement::raw(chars[pos]));
                    pos += 1;
                }
            }
        }

        elements
    }

    /// Compare two strings level by level
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        if !self.is_tailored() {
            // Raw weights have neutral lower levels, so this is code point order
            return a.chars().cmp(b.chars());
        }

        let left = self.elements(a);
        let right = self.elements(b);

        left.iter()
            .map(|e| e.primary)
            .cmp(right.iter().map(|e| e.primary))
            .then_with(|| {
                left.iter()
                    .map(|e| e.secondary)
                    .cmp(right.iter().map(|e| e.secondary))
            })
            .then_with(|| {
                left.iter()
                    .map(|e| e.tertiary)
                    .cmp(right.iter().map(|e| e.tertiary))
            })
    }

    /// Binary-comparable key; `sort_key(a).cmp(&sort_key(b)) == compare(a, b)`
    pub fn sort_key(&self, s: &str) -> Vec<u64> {
        let elements = self.elements(s);
        let mut key = Vec::with_capacity(elements.len() * 3 + 2);
        key.extend(elements.iter().map(|e| e.primary + 1));
        key.push(0);
        key.extend(elements.iter().map(|e| u64::from(e.secondary) + 1));
        key.push(0);
        key.extend(elements.iter().map(|e| u64::from(e.tertiary) + 1));
        key
    }

    /// Sort strings in place under this collation
    pub fn sort<S: AsRef<str>>(&self, items: &mut [S]) {
        items.sort_by(|a, b| self.compare(a.as_ref(), b.as_ref()));
    }
}

#[derive(Default)]
struct TableBuilder {
    entries: HashMap<String, CollationElement>,
    used_primaries: HashSet<u64>,
    used: HashSet<CollationElement>,
}

impl TableBuilder {
    /// Current weight of an anchor element
    fn anchor(&self, text: &str) -> CollationElement {
        if let Some(weight) = self.entries.get(text) {
            return *weight;
        }
        text.chars()
            .next()
            .map(CollationElement::raw)
            .unwrap_or(CollationElement {
                primary: 0,
                secondary: 0,
                tertiary: 0,
            })
    }

    /// Next free weight after `previous` at the given strength
    fn place(&self, previous: CollationElement, strength: Strength) -> CollationElement {
        match strength {
            Strength::Identical => previous,
            Strength::Primary => {
                let mut primary = previous.primary + 1;
                while self.used_primaries.contains(&primary) {
                    primary += 1;
                }
                CollationElement {
                    primary,
                    secondary: 0,
                    tertiary: 0,
                }
            }
            Strength::Secondary => {
                let mut candidate = CollationElement {
                    secondary: previous.secondary.saturating_add(1),
                    tertiary: 0,
                    ..previous
                };
                while self.used.contains(&candidate) && candidate.secondary < u16::MAX {
                    candidate.secondary += 1;
                }
                candidate
            }
            Strength::Tertiary => {
                let mut candidate = CollationElement {
                    tertiary: previous.tertiary.saturating_add(1),
                    ..previous
                };
                while self.used.contains(&candidate) && candidate.tertiary < u16::MAX {
                    candidate.tertiary += 1;
                }
                candidate
            }
        }
    }

    fn insert(&mut self, text: String, weight: CollationElement) {
        self.used_primaries.insert(weight.primary);
        self.used.insert(weight);
        self.entries.insert(text, weight);
    }

    fn finish(self) -> CollationTable {
        let max_len = self
            .entries
            .keys()
            .map(|k| k.chars().count())
            .max()
            .unwrap_or(0);
        CollationTable {
            entries: self.entries,
            max_len,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum RuleToken {
    Reset,
    Relation(Strength),
    Element(String),
}

/// Split rule text into tokens with their byte offsets. A backslash makes
/// the next character literal, so `\<` is an element.
fn tokenize(rules: &str) -> Vec<(usize, RuleToken)> {
    let mut tokens = Vec::new();
    let mut chars = rules.char_indices().peekable();

    while let Some((offset, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '&' => tokens.push((offset, RuleToken::Reset)),
            '=' => tokens.push((offset, RuleToken::Relation(Strength::Identical))),
            '<' => {
                let mut count = 1;
                while count < 3 && chars.next_if(|&(_, c)| c == '<').is_some() {
                    count += 1;
                }
                let strength = match count {
                    1 => Strength::Primary,
                    2 => Strength::Secondary,
                    _ => Strength::Tertiary,
                };
                tokens.push((offset, RuleToken::Relation(strength)));
            }
            _ => {
                let mut element = String::new();
                let mut current = Some(ch);
                while let Some(c) = current {
                    if c == '\\' {
                        if let Some((_, escaped)) = chars.next() {
                            element.push(escaped);
                        }
                    } else {
                        element.push(c);
                    }
                    current = chars
                        .next_if(|&(_, c)| !c.is_whitespace() && !matches!(c, '&' | '<' | '='))
                        .map(|(_, c)| c);
                }
                tokens.push((offset, RuleToken::Element(element)));
            }
        }
    }

    tokens
}
