//! Errors that can occur while running an action.

use pfa_core::{AvroType, Value};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("input {value} does not match {expected}")]
    InputTypeMismatch { expected: AvroType, value: Value },

    /// A library function failed. `args` are the values it was called with.
    #[error("`{name}` failed at {pos}: {message}")]
    Function {
        name: String,
        pos: String,
        args: Vec<Value>,
        message: String,
    },

    #[error("index {index} is out of range for an array of length {len} at {pos}")]
    IndexOutOfRange { index: i64, len: usize, pos: String },

    #[error("key {key:?} not found at {pos}")]
    MissingKey { key: String, pos: String },

    #[error("pool `{pool}` has no entry {key:?} at {pos}")]
    MissingPoolKey {
        pool: String,
        key: String,
        pos: String,
    },

    /// Host lookup of an absent pool entry.
    #[error("pool `{pool}` has no entry {key:?}")]
    NoPoolEntry { pool: String, key: String },

    /// Raised by an `error` form in the action.
    #[error("{message}")]
    UserError {
        message: String,
        code: Option<i32>,
        pos: String,
    },

    #[error("unknown cell `{0}`")]
    UnknownCell(String),

    #[error("unknown pool `{0}`")]
    UnknownPool(String),

    /// Rejected write to a cell or pool entry.
    #[error("`{name}` holds {expected}, cannot store {value}")]
    CellTypeMismatch {
        name: String,
        expected: AvroType,
        value: Value,
    },
}
