//! Pure character-count hint computation.

use crate::messages::HintMessages;

/// Declared length recommendation of a field. `None` means "not declared".
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LengthBounds {
    pub min: Option<usize>,
    pub max: Option<usize>,
}

impl LengthBounds {
    pub fn new(min: Option<usize>, max: Option<usize>) -> Self {
        Self {
            min: min.filter(|&min| min > 0),
            max: max.filter(|&max| max > 0),
        }
    }

    /// Parses raw `data-min` / `data-max` attribute values.
    pub fn from_attributes(min: Option<&str>, max: Option<&str>) -> Self {
        Self::new(min.and_then(parse_bound), max.and_then(parse_bound))
    }

    pub fn is_declared(&self) -> bool {
        self.min.is_some() || self.max.is_some()
    }

    pub fn is_violated_by(&self, length: usize) -> bool {
        self.max.is_some_and(|max| length > max) || self.min.is_some_and(|min| length < min)
    }
}

/// Leading decimal digits after optional whitespace, like `parseInt(raw, 10)`.
/// Negative or digit-less values count as undeclared; digit runs too long
/// for `usize` saturate.
fn parse_bound(raw: &str) -> Option<usize> {
    let trimmed = raw.trim_start();
    let trimmed = trimmed.strip_prefix('+').unwrap_or(trimmed);
    let end = trimmed
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let digits = &trimmed[..end];
    if digits.is_empty() {
        return None;
    }
    Some(digits.parse().unwrap_or(usize::MAX))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hint {
    /// Unicode scalar values, not UTF-16 code units: an emoji outside the
    /// BMP counts once here although `value.length` in JS counts it twice.
    /// Server-side length validation counts the same way.
    pub length: usize,
    pub text: String,
    pub invalid: bool,
}

impl Hint {
    pub fn compute(value: &str, bounds: LengthBounds, messages: &HintMessages) -> Self {
        let length = value.chars().count();
        let mut text = format!("{}: {length}", messages.entered);

        let mut parts = Vec::with_capacity(2);
        if let Some(min) = bounds.min {
            parts.push(format!("{} {min}", messages.minimum));
        }
        if let Some(max) = bounds.max {
            parts.push(format!("{} {max}", messages.maximum));
        }
        if !parts.is_empty() {
            text.push_str(&format!(" ({}: {})", messages.recommendation, parts.join(", ")));
        }

        Self {
            length,
            text,
            invalid: bounds.is_violated_by(length),
        }
    }
}
