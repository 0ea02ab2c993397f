//! Engine construction with a chosen library and compiler limits.

use std::sync::Arc;

use pfa_compiler::{Compiler, DEFAULT_MAX_DEPTH, Document};
use pfa_ir::Library;
use pfa_vm::CompiledEngine;

use crate::Result;

/// Builder for `CompiledEngine`s.
///
/// Without an explicit library the built-in one is assembled on first use
/// and reused for every later compile through the same builder.
#[derive(Clone, Debug)]
pub struct EngineBuilder {
    library: Option<Arc<Library>>,
    max_depth: u32,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl EngineBuilder {
    pub fn new() -> Self {
        Self {
            library: None,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Compile against `library` instead of the built-ins.
    pub fn library(mut self, library: Arc<Library>) -> Self {
        self.library = Some(library);
        self
    }

    /// Set the maximum action nesting depth.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn compile(&mut self, doc: &Document) -> Result<CompiledEngine> {
        let library = match &self.library {
            Some(library) => Arc::clone(library),
            None => {
                let library = Arc::new(pfa_stdlib::default_library()?);
                tracing::debug!(functions = library.len(), "assembled built-in library");
                self.library = Some(Arc::clone(&library));
                library
            }
        };
        let executable = Compiler::builder(&library)
            .max_depth(self.max_depth)
            .build()
            .compile(doc)?;
        Ok(CompiledEngine::new(executable))
    }
}
