//! PFA: portable scoring engines with a structural type system.
//!
//! # Example
//!
//! ```
//! use pfa_lib::{AvroType, Document, Expr, Value};
//!
//! let doc = Document::new(
//!     AvroType::Double,
//!     AvroType::Double,
//!     vec![Expr::call("*", [Expr::var("input"), Expr::int(2)])],
//! );
//!
//! let engine = pfa_lib::compile(&doc).expect("valid document");
//! let mut instance = engine.instantiate(1).remove(0);
//! assert_eq!(instance.action(Value::Double(1.5)), Ok(Value::Double(3.0)));
//! ```

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

mod builder;

#[cfg(test)]
mod scoring_tests;

pub use builder::EngineBuilder;

pub use pfa_compiler::{
    CellSpec, Compiler, CompilerBuilder, DEFAULT_MAX_DEPTH, DiagnosticKind, Diagnostics, Document,
    Expr, NewInit, PoolSpec,
};
pub use pfa_core::{AvroType, Rng, Value};
pub use pfa_ir::{Executable, LibFcn, Library, LibraryBuilder, Pattern, RegistryError, Signature};
pub use pfa_stdlib::default_library;
pub use pfa_vm::{CompiledEngine, EngineInstance, RuntimeError};

/// Errors that can occur while building an engine.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// The action tree is nested too deeply.
    #[error("recursion limit exceeded")]
    RecursionLimitExceeded,

    #[error("compilation failed with {} errors", .0.error_count())]
    CompileError(Diagnostics),

    #[error(transparent)]
    Registry(#[from] RegistryError),
}

impl From<pfa_compiler::Error> for Error {
    fn from(err: pfa_compiler::Error) -> Self {
        match err {
            pfa_compiler::Error::RecursionLimitExceeded => Self::RecursionLimitExceeded,
            pfa_compiler::Error::CompileError(diagnostics) => Self::CompileError(diagnostics),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Compile `doc` against the built-in library with default settings.
pub fn compile(doc: &Document) -> Result<CompiledEngine> {
    EngineBuilder::new().compile(doc)
}
