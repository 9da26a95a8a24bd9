//! Float view

use std::fmt;

use crate::error::{Error, Result};
use crate::handle::Handle;
use crate::runtime::{Payload, Runtime};
use crate::view::foreign_view;

foreign_view! {
    /// View of a foreign float.
    Float => [Float]
}

impl<'rt> Float<'rt> {
    /// Largest finite value a float object can hold.
    pub const MAX: f64 = f64::MAX;

    /// Smallest positive normal value a float object can hold.
    pub const MIN: f64 = f64::MIN_POSITIVE;

    /// A new float object.
    pub fn new(rt: &'rt Runtime, value: f64) -> Result<Self> {
        Handle::adopt(rt, rt.new_float(value)).map(Self::wrap)
    }

    /// Parse a decimal literal, `inf` or `nan` (any case, optional sign).
    pub fn parse(rt: &'rt Runtime, text: &str) -> Result<Self> {
        Self::new(rt, parse_float(text)?)
    }

    /// A new float holding the numeric value of `handle`.
    ///
    /// Floats, ints and bools are converted, text is parsed.
    pub fn from_handle(handle: &Handle<'rt>) -> Result<Self> {
        let (rt, ptr) = handle.parts()?;
        let value = rt.with_payload(ptr, |payload| match payload {
            Payload::Float(f) => Ok(*f),
            Payload::Int(n) => Ok(*n as f64),
            Payload::Bool(b) => Ok(if *b { 1.0 } else { 0.0 }),
            Payload::Text(s) => parse_float(s),
            other => Err(Error::type_error("int, float or str", other.kind().name())),
        })?;
        Self::new(rt, value)
    }

    /// The float value.
    pub fn value(&self) -> f64 {
        self.to_float().unwrap_or(f64::NAN)
    }

    /// A new float with the opposite sign.
    pub fn neg(&self) -> Result<Self> {
        Self::new(self.rt()?, -self.value())
    }

    /// A new float holding the absolute value.
    pub fn abs(&self) -> Result<Self> {
        Self::new(self.rt()?, self.value().abs())
    }
}

impl fmt::Display for Float<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

pub(crate) fn parse_float(text: &str) -> Result<f64> {
    let trimmed = text.trim();
    let invalid = || Error::conversion(format!("could not convert string to float: {:?}", text));

    let bytes = trimmed.as_bytes();
    let mut cleaned = String::with_capacity(trimmed.len());
    for (i, c) in trimmed.char_indices() {
        if c == '_' {
            let between_digits = i > 0
                && bytes[i - 1].is_ascii_digit()
                && bytes.get(i + 1).is_some_and(u8::is_ascii_digit);
            if !between_digits {
                return Err(invalid());
            }
        } else {
            cleaned.push(c);
        }
    }

    cleaned.parse::<f64>().map_err(|_| invalid())
}
