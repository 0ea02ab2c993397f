//! Persistent cell and pool storage.
//!
//! Private state belongs to one instance. Shared state is created once per
//! `CompiledEngine` and every instance holds a handle to the same lock.

use std::sync::Arc;

use indexmap::IndexMap;
use parking_lot::RwLock;
use pfa_core::Value;
use pfa_ir::Executable;

pub type Pool = IndexMap<String, Value>;

#[derive(Debug)]
pub enum Store<T> {
    Private(T),
    Shared(Arc<RwLock<T>>),
}

impl<T> Store<T> {
    pub fn read<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        match self {
            Self::Private(value) => f(value),
            Self::Shared(lock) => f(&lock.read()),
        }
    }

    pub fn write<R>(&mut self, f: impl FnOnce(&mut T) -> R) -> R {
        match self {
            Self::Private(value) => f(value),
            Self::Shared(lock) => f(&mut lock.write()),
        }
    }
}

/// Locks for the cells and pools declared `shared`, indexed like the
/// executable's declarations.
#[derive(Debug)]
pub struct SharedState {
    cells: Vec<Option<Arc<RwLock<Value>>>>,
    pools: Vec<Option<Arc<RwLock<Pool>>>>,
}

impl SharedState {
    pub fn new(exe: &Executable) -> Self {
        let cells = exe
            .cells
            .iter()
            .map(|c| c.shared.then(|| Arc::new(RwLock::new(c.init.clone()))))
            .collect();
        let pools = exe
            .pools
            .iter()
            .map(|p| p.shared.then(|| Arc::new(RwLock::new(p.init.clone()))))
            .collect();
        Self { cells, pools }
    }
}

#[derive(Debug)]
pub struct State {
    pub cells: Vec<Store<Value>>,
    pub pools: Vec<Store<Pool>>,
}

impl State {
    pub fn new(exe: &Executable, shared: &SharedState) -> Self {
        let cells = exe
            .cells
            .iter()
            .zip(&shared.cells)
            .map(|(decl, lock)| match lock {
                Some(lock) => Store::Shared(Arc::clone(lock)),
                None => Store::Private(decl.init.clone()),
            })
            .collect();
        let pools = exe
            .pools
            .iter()
            .zip(&shared.pools)
            .map(|(decl, lock)| match lock {
                Some(lock) => Store::Shared(Arc::clone(lock)),
                None => Store::Private(decl.init.clone()),
            })
            .collect();
        Self { cells, pools }
    }
}
