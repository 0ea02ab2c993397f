//! Document compilation.
//!
//! Compilation validates every declared type, checks cell and pool
//! initializers, resolves names and call signatures over the action tree,
//! and checks the action against the declared output type. Any diagnostic
//! means no executable.

mod lower;
mod scope;

#[cfg(test)]
mod compile_tests;

use std::sync::Arc;

use indexmap::IndexMap;
use pfa_core::Value;
use pfa_ir::{CellDecl, Executable, Library, PoolDecl};

use crate::ast::Document;
use crate::diagnostics::{DiagnosticKind, Pos};
use crate::{Error, Result};

use lower::Lowering;

/// Default nesting limit for action trees.
pub const DEFAULT_MAX_DEPTH: u32 = 1024;

/// Compiles documents against one function library.
pub struct Compiler {
    library: Arc<Library>,
    max_depth: u32,
}

/// Builder for `Compiler`.
pub struct CompilerBuilder {
    library: Arc<Library>,
    max_depth: u32,
}

impl CompilerBuilder {
    pub fn new(library: &Arc<Library>) -> Self {
        Self {
            library: Arc::clone(library),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Set the maximum expression nesting depth.
    pub fn max_depth(mut self, depth: u32) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn build(self) -> Compiler {
        Compiler {
            library: self.library,
            max_depth: self.max_depth,
        }
    }
}

impl Compiler {
    pub fn builder(library: &Arc<Library>) -> CompilerBuilder {
        CompilerBuilder::new(library)
    }

    pub fn library(&self) -> &Arc<Library> {
        &self.library
    }

    pub fn compile(&self, doc: &Document) -> Result<Executable> {
        let mut lowering = Lowering::new(&self.library, doc, self.max_depth);

        lowering.check_schema(&doc.input, &Pos::new("input"));
        lowering.check_schema(&doc.output, &Pos::new("output"));
        let cells = declare_cells(&mut lowering, doc);
        let pools = declare_pools(&mut lowering, doc);
        let action = lowering.action(&doc.action);

        if lowering.exhausted {
            return Err(Error::RecursionLimitExceeded);
        }
        let diagnostics = lowering.diagnostics;
        let action = match action {
            Some(action) if diagnostics.is_empty() => action,
            _ => {
                tracing::debug!(errors = diagnostics.error_count(), "compilation failed");
                return Err(Error::CompileError(diagnostics));
            }
        };

        let executable = Executable {
            name: doc.name.clone().unwrap_or_else(|| "Engine".to_owned()),
            input: doc.input.clone(),
            output: doc.output.clone(),
            randseed: doc.randseed,
            cells,
            pools,
            action,
            slot_count: lowering.scopes.slot_count(),
            is_pure: !lowering.stateful,
            library: Arc::clone(&self.library),
        };
        tracing::debug!(
            name = %executable.name,
            slots = executable.slot_count,
            pure = executable.is_pure,
            "compiled document"
        );
        Ok(executable)
    }
}

fn declare_cells(lowering: &mut Lowering<'_>, doc: &Document) -> Vec<CellDecl> {
    let mut cells = Vec::with_capacity(doc.cells.len());
    for (name, spec) in &doc.cells {
        let pos = Pos::new("cells").child(name);
        let init = if lowering.check_schema(&spec.ty, &pos) {
            initial_value(lowering, &spec.init, &spec.ty, &pos.child("init"))
        } else {
            Value::Null
        };
        cells.push(CellDecl {
            name: name.clone(),
            ty: spec.ty.clone(),
            init,
            shared: spec.shared,
        });
    }
    cells
}

fn declare_pools(lowering: &mut Lowering<'_>, doc: &Document) -> Vec<PoolDecl> {
    let mut pools = Vec::with_capacity(doc.pools.len());
    for (name, spec) in &doc.pools {
        let pos = Pos::new("pools").child(name);
        let mut init = IndexMap::with_capacity(spec.init.len());
        if lowering.check_schema(&spec.ty, &pos) {
            for (key, value) in &spec.init {
                let value = initial_value(lowering, value, &spec.ty, &pos.child("init").child(key));
                init.insert(key.clone(), value);
            }
        }
        pools.push(PoolDecl {
            name: name.clone(),
            ty: spec.ty.clone(),
            init,
            shared: spec.shared,
        });
    }
    pools
}

/// Conform an initializer to its declared type, reporting a mismatch.
fn initial_value(
    lowering: &mut Lowering<'_>,
    value: &Value,
    ty: &pfa_core::AvroType,
    pos: &Pos,
) -> Value {
    match value.clone().conform(ty) {
        Some(value) => value,
        None => {
            lowering
                .diagnostics
                .report(DiagnosticKind::InvalidInitializer, pos.clone())
                .message(format!("{value} is not a valid {ty}"))
                .emit();
            Value::Null
        }
    }
}
