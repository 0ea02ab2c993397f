//! Compiled engines and their instances.

use std::sync::Arc;

use pfa_core::{Rng, Value};
use pfa_ir::Executable;

use super::error::RuntimeError;
use super::interpreter::{Interpreter, conform};
use super::state::{SharedState, State};

/// An executable ready to be instantiated.
///
/// Shared cells and pools live here, so every instance created from the
/// same `CompiledEngine` sees the same shared values.
#[derive(Debug)]
pub struct CompiledEngine {
    exe: Arc<Executable>,
    shared: SharedState,
}

impl CompiledEngine {
    pub fn new(executable: Executable) -> Self {
        let shared = SharedState::new(&executable);
        Self {
            exe: Arc::new(executable),
            shared,
        }
    }

    pub fn executable(&self) -> &Executable {
        &self.exe
    }

    pub fn name(&self) -> &str {
        &self.exe.name
    }

    /// Create `multiplicity` independent instances.
    ///
    /// With a seed, instance `i` draws from `randseed + i`, so instance 0
    /// reproduces a single seeded engine. Without one every instance is
    /// seeded from OS entropy.
    pub fn instantiate(&self, multiplicity: usize) -> Vec<EngineInstance> {
        let instances: Vec<_> = (0..multiplicity).map(|i| self.instance(i)).collect();
        tracing::debug!(
            engine = %self.exe.name,
            multiplicity,
            seeded = self.exe.randseed.is_some(),
            "instantiated engine"
        );
        instances
    }

    fn instance(&self, index: usize) -> EngineInstance {
        let rng = match self.exe.randseed {
            Some(seed) => Rng::from_seed(seed.wrapping_add(index as i64)),
            None => Rng::from_entropy(),
        };
        EngineInstance {
            exe: Arc::clone(&self.exe),
            state: State::new(&self.exe, &self.shared),
            rng,
            index,
        }
    }
}

/// One runnable copy of an engine with its own state and generator.
#[derive(Debug)]
pub struct EngineInstance {
    exe: Arc<Executable>,
    state: State,
    rng: Rng,
    index: usize,
}

impl EngineInstance {
    /// Position of this instance in its `instantiate` batch.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn executable(&self) -> &Executable {
        &self.exe
    }

    /// Run the action on `input`.
    ///
    /// Cell and pool writes and RNG draws made before a failure stay
    /// committed.
    pub fn action(&mut self, input: Value) -> Result<Value, RuntimeError> {
        let exe = &*self.exe;
        if !input.conforms(&exe.input) {
            return Err(RuntimeError::InputTypeMismatch {
                expected: exe.input.clone(),
                value: input,
            });
        }
        let input = conform(input, &exe.input);

        let mut interpreter = Interpreter::new(exe, &mut self.state, &mut self.rng, input);
        match interpreter.eval(&exe.action) {
            Ok(output) => Ok(conform(output, &exe.output)),
            Err(err) => {
                tracing::debug!(engine = %exe.name, instance = self.index, error = %err, "action failed");
                Err(err)
            }
        }
    }

    pub fn get_cell(&self, name: &str) -> Result<Value, RuntimeError> {
        let id = self
            .exe
            .cell_id(name)
            .ok_or_else(|| RuntimeError::UnknownCell(name.to_owned()))?;
        Ok(self.state.cells[id.0 as usize].read(Value::clone))
    }

    /// Replace a cell's value. The value must conform to the cell's type.
    pub fn set_cell(&mut self, name: &str, value: Value) -> Result<(), RuntimeError> {
        let id = self
            .exe
            .cell_id(name)
            .ok_or_else(|| RuntimeError::UnknownCell(name.to_owned()))?;
        let ty = &self.exe.cells[id.0 as usize].ty;
        if !value.conforms(ty) {
            return Err(RuntimeError::CellTypeMismatch {
                name: name.to_owned(),
                expected: ty.clone(),
                value,
            });
        }
        let value = conform(value, ty);
        self.state.cells[id.0 as usize].write(|cell| *cell = value);
        Ok(())
    }

    /// Entry `key` of pool `name`; an absent key is an error.
    pub fn get_pool(&self, name: &str, key: &str) -> Result<Value, RuntimeError> {
        self.lookup_pool(name, key)?
            .ok_or_else(|| RuntimeError::NoPoolEntry {
                pool: name.to_owned(),
                key: key.to_owned(),
            })
    }

    /// Entry `key` of pool `name`, or `default` when the key is absent.
    pub fn get_pool_or(&self, name: &str, key: &str, default: Value) -> Result<Value, RuntimeError> {
        Ok(self.lookup_pool(name, key)?.unwrap_or(default))
    }

    fn lookup_pool(&self, name: &str, key: &str) -> Result<Option<Value>, RuntimeError> {
        let id = self
            .exe
            .pool_id(name)
            .ok_or_else(|| RuntimeError::UnknownPool(name.to_owned()))?;
        Ok(self.state.pools[id.0 as usize].read(|pool| pool.get(key).cloned()))
    }

    pub fn set_pool(&mut self, name: &str, key: &str, value: Value) -> Result<(), RuntimeError> {
        let id = self
            .exe
            .pool_id(name)
            .ok_or_else(|| RuntimeError::UnknownPool(name.to_owned()))?;
        let ty = &self.exe.pools[id.0 as usize].ty;
        if !value.conforms(ty) {
            return Err(RuntimeError::CellTypeMismatch {
                name: format!("{name}[{key:?}]"),
                expected: ty.clone(),
                value,
            });
        }
        let value = conform(value, ty);
        self.state.pools[id.0 as usize].write(|pool| pool.insert(key.to_owned(), value));
        Ok(())
    }
}
