//! PFA compiler: document model, type checking and lowering to IR.
//!
//! This crate turns a parsed [`Document`] into a [`pfa_ir::Executable`]:
//! - `ast` - the action tree and document model
//! - `compile` - scope resolution, signature resolution and type checking
//! - `diagnostics` - positional error reporting

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod ast;
pub mod compile;
pub mod diagnostics;

#[cfg(test)]
pub mod test_utils;

pub use ast::{CellSpec, Document, Expr, NewInit, PoolSpec};
pub use compile::{Compiler, CompilerBuilder, DEFAULT_MAX_DEPTH};
pub use diagnostics::{DiagnosticKind, Diagnostics, Pos};

/// Errors that can occur during compilation.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Recursion fuel exhausted (action nested too deeply).
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("compilation failed with {} errors", .0.error_count())]
    CompileError(Diagnostics),
}

/// Result type for compilation.
pub type Result<T> = std::result::Result<T, Error>;
