//! Test helpers: compile against the built-in library.

use std::sync::Arc;

use pfa_ir::{Executable, Library};

use crate::ast::Document;
use crate::compile::Compiler;
use crate::{Error, Result};

pub fn library() -> Arc<Library> {
    Arc::new(pfa_stdlib::default_library().expect("built-ins register cleanly"))
}

pub fn compile(doc: &Document) -> Result<Executable> {
    Compiler::builder(&library()).build().compile(doc)
}

pub fn compile_ok(doc: &Document) -> Executable {
    match compile(doc) {
        Ok(exe) => exe,
        Err(Error::CompileError(diagnostics)) => {
            panic!("expected success, got:\n{}", diagnostics.render())
        }
        Err(err) => panic!("expected success, got {err}"),
    }
}

/// Rendered diagnostics of a document that must fail to compile.
pub fn compile_err(doc: &Document) -> String {
    match compile(doc) {
        Ok(_) => panic!("expected compile errors"),
        Err(Error::CompileError(diagnostics)) => diagnostics.render(),
        Err(err) => panic!("expected diagnostics, got {err}"),
    }
}
