//! Integer view

use std::fmt;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::{ObjectKind, Payload, Runtime};
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign int. Bools are ints too.
    Int => [Int, Bool]
}

impl<'rt> Int<'rt> {
    /// A new int object.
    pub fn new(rt: &'rt Runtime, value: i64) -> Result<Self> {
        Handle::adopt(rt, rt.new_int(value)).map(Self::wrap)
    }

    /// Parse `text` in `base` (2 to 36, or 0 to infer it from the prefix).
    ///
    /// Accepts surrounding whitespace, a sign, `_` between digits and a
    /// `0x`/`0o`/`0b` prefix matching the base.
    pub fn parse(rt: &'rt Runtime, text: &str, base: u32) -> Result<Self> {
        Self::new(rt, parse_int(text, base)?)
    }

    /// Truncate a float towards zero.
    pub fn from_f64(rt: &'rt Runtime, value: f64) -> Result<Self> {
        Self::new(rt, truncate(value)?)
    }

    /// A new int holding the integer value of `handle`.
    ///
    /// Ints and bools are copied, floats truncated and text parsed as
    /// decimal. The source object is never shared.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, ptr) = handle.parts()?;
        let value = rt.with_payload(ptr, |payload| match payload {
            Payload::Int(n) => Ok(*n),
            Payload::Bool(b) => Ok(*b as i64),
            Payload::Float(f) => truncate(*f),
            Payload::Text(s) => parse_int(s, 10),
            other => Err(Error::type_error("int, float or str", other.kind().name())),
        })?;
        Self::new(rt, value)
    }

    /// The integer value.
    pub fn value(&self) -> i64 {
        // Views always hold an int or a bool
        self.to_int().unwrap_or_default()
    }

    /// A new int with the opposite sign.
    pub fn neg(&self) -> Result<Self> {
        let value = self.value();
        let negated = value
            .checked_neg()
            .ok_or_else(|| Error::conversion(format!("-({}) overflows a foreign int", value)))?;
        Self::new(self.rt()?, negated)
    }

    /// A new int holding the absolute value.
    pub fn abs(&self) -> Result<Self> {
        let value = self.value();
        let absolute = value
            .checked_abs()
            .ok_or_else(|| Error::conversion(format!("abs({}) overflows a foreign int", value)))?;
        Self::new(self.rt()?, absolute)
    }

    /// Whether the object is a bool rather than a plain int.
    pub fn is_bool_value(&self) -> bool {
        self.kind() == Some(ObjectKind::Bool)
    }
}

impl fmt::Display for Int<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

fn truncate(value: f64) -> Result<i64> {
    if !value.is_finite() {
        return Err(Error::conversion(format!(
            "cannot convert float {} to int",
            value
        )));
    }
    let truncated = value.trunc();
    if truncated < i64::MIN as f64 || truncated >= i64::MAX as f64 {
        return Err(Error::conversion(format!(
            "float {} does not fit in a foreign int",
            value
        )));
    }
    Ok(truncated as i64)
}

fn invalid(text: &str, base: u32) -> Error {
    Error::conversion(format!(
        "invalid literal for int() with base {}: {:?}",
        base, text
    ))
}

fn prefix_base(digits: &str) -> Option<u32> {
    let mut chars = digits.chars();
    match (chars.next(), chars.next().map(|c| c.to_ascii_lowercase())) {
        (Some('0'), Some('x')) => Some(16),
        (Some('0'), Some('o')) => Some(8),
        (Some('0'), Some('b')) => Some(2),
        _ => None,
    }
}

pub(crate) fn parse_int(text: &str, base: u32) -> Result<i64> {
    if base == 1 || base > 36 {
        return Err(Error::conversion(format!(
            "int() base must be >= 2 and <= 36, or 0, got {}",
            base
        )));
    }

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (base, body, after_prefix) = match prefix_base(unsigned) {
        Some(prefixed) if base == 0 || base == prefixed => (prefixed, &unsigned[2..], true),
        _ if base == 0 => (10, unsigned, false),
        _ => (base, unsigned, false),
    };

    // Underscores may only separate digits (or follow a prefix)
    let mut digits = String::with_capacity(body.len() + 1);
    let mut previous_underscore = !after_prefix;
    for c in body.chars() {
        if c == '_' {
            if previous_underscore {
                return Err(invalid(text, base));
            }
            previous_underscore = true;
        } else {
            digits.push(c);
            previous_underscore = false;
        }
    }
    if digits.is_empty() || body.ends_with('_') {
        return Err(invalid(text, base));
    }
    if !digits.chars().all(|c| c.is_digit(base)) {
        return Err(invalid(text, base));
    }

    if negative {
        digits.insert(0, '-');
    }
    i64::from_str_radix(&digits, base).map_err(|_| {
        Error::conversion(format!("{:?} does not fit in a foreign int", text))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("42", 10), Ok(42));
        assert_eq!(parse_int("  -17 ", 10), Ok(-17));
        assert_eq!(parse_int("1_000_000", 10), Ok(1_000_000));
        assert_eq!(parse_int("ff", 16), Ok(255));
        assert_eq!(parse_int("0xFF", 16), Ok(255));
        assert_eq!(parse_int("0x_ff", 16), Ok(255));
        assert_eq!(parse_int("0b101", 0), Ok(5));
        assert_eq!(parse_int("0o17", 0), Ok(15));
        assert_eq!(parse_int("z", 36), Ok(35));
    }

    #[test]
    fn test_parse_int_rejects() {
        for (text, base) in [
            ("", 10),
            ("12a", 10),
            ("_1", 10),
            ("1__0", 10),
            ("1_", 10),
            ("0x10", 10),
            ("- 1", 10),
            ("99999999999999999999", 10),
        ] {
            assert!(
                matches!(parse_int(text, base), Err(Error::Conversion(_))),
                "{:?} in base {} should be rejected",
                text,
                base
            );
        }
        assert!(parse_int("1", 1).is_err());
        assert!(parse_int("1", 37).is_err());
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate(2.9), Ok(2));
        assert_eq!(truncate(-2.9), Ok(-2));
        assert!(truncate(f64::NAN).is_err());
        assert!(truncate(1e300).is_err());
    }

    #[test]
    fn test_neg_and_abs_leave_source_untouched() {
        let rt = Runtime::new();
        let n = Int::new(&rt, -5).unwrap();
        assert_eq!(n.neg().unwrap().value(), 5);
        assert_eq!(n.abs().unwrap().value(), 5);
        assert_eq!(n.value(), -5);
        assert!(Int::new(&rt, i64::MIN).unwrap().abs().is_err());
    }

    #[test]
    fn test_from_handle_copies() {
        let rt = Runtime::new();
        let source = Int::new(&rt, 7).unwrap();
        let copy = Int::from_handle(&source).unwrap();
        assert!(!copy.is_same(&source));
        assert_eq!(copy.value(), 7);

        let text = Handle::adopt(&rt, rt.new_text(" 12 ")).unwrap();
        assert_eq!(Int::from_handle(&text).unwrap().value(), 12);
        let list = Handle::adopt(&rt, rt.new_list(Vec::new())).unwrap();
        assert!(Int::from_handle(&list).is_err());
    }
}
