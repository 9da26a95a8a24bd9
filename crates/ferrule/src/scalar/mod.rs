//! Scalar views
//!
//! Scalar views never cache a host copy of their value: every accessor reads
//! the foreign object, and arithmetic helpers return new objects instead of
//! mutating the one they were called on.

mod boolean;
mod float;
mod int;
mod text;

pub use boolean::Boolean;
pub use float::Float;
pub use int::Int;
pub use text::Text;

use crate::error::Result;
use crate::runtime::Runtime;

/// Shorthand for [`Int::new`].
pub fn make_int(rt: &Runtime, value: i64) -> Result<Int<'_>> {
    Int::new(rt, value)
}

/// Shorthand for [`Float::new`].
pub fn make_float(rt: &Runtime, value: f64) -> Result<Float<'_>> {
    Float::new(rt, value)
}

/// Shorthand for [`Text::new`].
pub fn make_text<'rt>(rt: &'rt Runtime, value: &str) -> Result<Text<'rt>> {
    Text::new(rt, value)
}

/// Shorthand for [`Boolean::new`].
pub fn make_bool(rt: &Runtime, value: bool) -> Result<Boolean<'_>> {
    Boolean::new(rt, value)
}
