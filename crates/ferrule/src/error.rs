//! Error types for handle and runtime operations

use thiserror::Error;

/// Main error type for ferrule operations.
///
/// Every recoverable failure of the handle layer is reported through this
/// type. Reference-count invariant violations are not represented here: they
/// are fatal and abort with a panic (see [`crate::runtime`]).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// A host value could not be turned into a foreign object, or a foreign
    /// object could not be turned into the requested host value.
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// Positional access outside the sequence after negative-index
    /// normalization.
    #[error("Index error: index {index} out of range for length {len}")]
    Index {
        /// The index as supplied by the caller
        index: i64,
        /// Length of the sequence at the time of access
        len: usize,
    },

    /// Keyed lookup or removal of an absent key.
    #[error("Key error: {0}")]
    Key(String),

    /// The foreign object has the wrong kind for the operation.
    #[error("Type error: expected {expected}, got {got}")]
    Type {
        /// What the operation needed
        expected: String,
        /// What it found
        got: String,
    },

    /// A tuple was mutated after it became visible to more than one owner.
    #[error("Tuple is shared and can no longer be mutated")]
    Shared,

    /// The operation needs a foreign object but the handle is empty.
    #[error("Handle is empty")]
    Empty,

    /// The runtime has been shut down (or was never started).
    #[error("Runtime is not initialized")]
    NotReady,

    /// A module could not be resolved.
    #[error("Module not found: {0}")]
    Module(String),

    /// An attribute lookup failed.
    #[error("Attribute not found: {0}")]
    Attribute(String),

    /// Two handles from different runtimes were combined.
    #[error("Handle belongs to a different runtime")]
    RuntimeMismatch,

    /// A native function returned no object.
    #[error("Call error: {0}")]
    Call(String),
}

impl Error {
    /// Build a type error from anything displayable.
    pub fn type_error(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Error::Type {
            expected: expected.into(),
            got: got.into(),
        }
    }

    /// Build a conversion error.
    pub fn conversion(message: impl Into<String>) -> Self {
        Error::Conversion(message.into())
    }
}

/// Result type alias for ferrule operations
pub type Result<T> = std::result::Result<T, Error>;
