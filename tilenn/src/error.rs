//! Error types for operator validation and kernel dispatch.

use crate::dtype::DataType;
use crate::tensor::{DataLayout, DataLayoutSet, TensorShape};

/// Errors reported while building or running operators.
///
/// Every variant describes a graph-construction or programming mistake;
/// nothing here is transient, so callers should not retry.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("operator '{op}' is missing required input {index}")]
    MissingInput { op: String, index: usize },

    #[error("operator '{op}' expects {expected} inputs, got {actual}")]
    InvalidArity {
        op: String,
        expected: usize,
        actual: usize,
    },

    #[error("operator '{op}' does not accept layout {layout} (supported: {supported})")]
    UnsupportedLayout {
        op: String,
        layout: DataLayout,
        supported: DataLayoutSet,
    },

    /// The requested operation has no implementation on this backend.
    #[error("{op} is not supported by the {backend} backend")]
    Unsupported {
        op: &'static str,
        backend: &'static str,
    },

    #[error("tensor '{tensor}' holds {actual} data, expected {expected}")]
    DTypeMismatch {
        tensor: String,
        expected: DataType,
        actual: DataType,
    },

    #[error("incompatible shapes for {op}: {lhs} vs {rhs}")]
    ShapeMismatch {
        op: String,
        lhs: TensorShape,
        rhs: TensorShape,
    },

    #[error("buffer size mismatch: expected {expected} elements, got {actual}")]
    BufferSizeMismatch { expected: usize, actual: usize },

    #[error("invalid parameter for '{op}': {detail}")]
    InvalidParameter { op: String, detail: String },

    #[error("tensor '{0}' is already registered")]
    DuplicateTensor(String),

    #[error("no tensor registered as {0}")]
    UnknownTensor(String),

    #[error("output of operator '{0}' has not been created")]
    NotMaterialized(String),

    #[error("config error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
