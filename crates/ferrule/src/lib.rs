//! # Ferrule
//!
//! Safe, ownership-tracking handles over a reference-counted,
//! dynamically-typed object runtime.
//!
//! Foreign objects live in a [`Runtime`] and carry their own reference
//! counts. Host code never touches those counts directly: a [`Handle`] owns
//! exactly one unit of one object, acquires on `clone`, releases on drop and
//! transfers on move. Typed views ([`List`], [`Dict`], [`Int`], ...) wrap the
//! same handle and add kind-specific operations, keeping every element that
//! enters or leaves a container correctly counted.
//!
//! ## Architecture
//!
//! - **Runtime**: object arena, raw refcount primitives and instrumentation
//! - **Handle**: owned and borrowed references, predicates, extraction
//! - **Conversion**: [`ToForeign`], [`IntoForeign`] and [`FromForeign`]
//! - **Views**: scalar and container newtypes over [`Handle`]
//! - **Interpreter**: runtime lifecycle, search path and module table
//!
//! ## Example
//!
//! ```
//! use ferrule::{Dict, Interpreter, List};
//!
//! let interp = Interpreter::new()?;
//! let rt = interp.runtime();
//!
//! let point = Dict::new(rt)?;
//! point.set("x", 1)?;
//! point.set("y", List::from_items(rt, [2, 3])?)?;
//! assert_eq!(point.to_string(), "{'x': 1, 'y': [2, 3]}");
//! # Ok::<(), ferrule::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod container;
pub mod convert;
pub mod error;
pub mod handle;
pub mod interpreter;
pub mod runtime;
pub mod scalar;
pub mod view;

// Re-export main types
pub use config::InterpreterConfig;
pub use container::{Dict, FrozenSet, Function, Iter, List, Module, Set, Tuple};
pub use convert::{FromForeign, IntoForeign, ToForeign};
pub use error::{Error, Result};
pub use handle::{Borrowed, Handle, Ownership};
pub use interpreter::{Interpreter, ModuleInit};
pub use runtime::{NativeFn, ObjPtr, ObjectKind, RefStats, Runtime};
pub use scalar::{make_bool, make_float, make_int, make_text, Boolean, Float, Int, Text};
pub use view::View;

/// Ferrule version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_exists() {
        assert!(!VERSION.is_empty());
    }
}
