//! Tree-walking evaluator for the typed IR.

use indexmap::IndexMap;
use pfa_core::{AvroType, Rng, Value};
use pfa_ir::{Assign, CallContext, CallNode, Executable, Node, NodeKind, PathStep};

use super::error::RuntimeError;
use super::frame::Frame;
use super::state::State;

type Result<T> = std::result::Result<T, RuntimeError>;

/// Evaluates one action call.
///
/// Cell and pool writes go straight to `state` and RNG draws advance `rng`
/// as they happen; nothing is undone when a later step fails.
pub struct Interpreter<'a> {
    exe: &'a Executable,
    state: &'a mut State,
    rng: &'a mut Rng,
    frame: Frame,
}

impl<'a> Interpreter<'a> {
    pub fn new(exe: &'a Executable, state: &'a mut State, rng: &'a mut Rng, input: Value) -> Self {
        Self {
            exe,
            state,
            rng,
            frame: Frame::new(exe.slot_count, input),
        }
    }

    pub fn eval(&mut self, node: &Node) -> Result<Value> {
        match &node.kind {
            NodeKind::Literal(value) => Ok(value.clone()),
            NodeKind::Var(slot) => Ok(self.frame.get(*slot).clone()),
            NodeKind::Let(assigns) | NodeKind::Set(assigns) => {
                self.assign(assigns)?;
                Ok(Value::Null)
            }
            NodeKind::Call(call) => self.call(call, &node.ty),
            NodeKind::If {
                cond,
                then,
                otherwise,
            } => {
                let value = if self.test(cond)? {
                    self.eval(then)?
                } else if let Some(otherwise) = otherwise {
                    self.eval(otherwise)?
                } else {
                    Value::Null
                };
                Ok(conform(value, &node.ty))
            }
            NodeKind::Cond {
                branches,
                otherwise,
            } => {
                for (cond, body) in branches {
                    if self.test(cond)? {
                        let value = self.eval(body)?;
                        return Ok(conform(value, &node.ty));
                    }
                }
                let value = match otherwise {
                    Some(otherwise) => self.eval(otherwise)?,
                    None => Value::Null,
                };
                Ok(conform(value, &node.ty))
            }
            NodeKind::Do(nodes) => {
                let mut last = Value::Null;
                for node in nodes {
                    last = self.eval(node)?;
                }
                Ok(last)
            }
            NodeKind::While { cond, body } => {
                while self.test(cond)? {
                    self.eval(body)?;
                }
                Ok(Value::Null)
            }
            NodeKind::ForEach { slot, array, body } => {
                let Value::Array(items) = self.eval(array)? else {
                    return Ok(Value::Null);
                };
                for item in items {
                    self.frame.set(*slot, item);
                    self.eval(body)?;
                }
                Ok(Value::Null)
            }
            NodeKind::NewRecord(fields) => {
                let record = self.entries(fields)?;
                Ok(conform(Value::Record(record), &node.ty))
            }
            NodeKind::NewMap(entries) => {
                let map = self.entries(entries)?;
                Ok(conform(Value::Map(map), &node.ty))
            }
            NodeKind::NewArray(items) => {
                let items = items
                    .iter()
                    .map(|item| self.eval(item))
                    .collect::<Result<Vec<_>>>()?;
                Ok(conform(Value::Array(items), &node.ty))
            }
            NodeKind::Attr { base, path, pos } => {
                let base = self.eval(base)?;
                self.walk(base, path, pos)
            }
            NodeKind::CellGet(cell) => {
                let store = &self.state.cells[cell.0 as usize];
                Ok(store.read(Value::clone))
            }
            NodeKind::CellSet { cell, value } => {
                let value = conform(self.eval(value)?, &node.ty);
                let store = &mut self.state.cells[cell.0 as usize];
                store.write(|slot| *slot = value.clone());
                Ok(value)
            }
            NodeKind::PoolGet {
                pool,
                key,
                default,
                pos,
            } => {
                let key = self.key(key)?;
                let found = self.state.pools[pool.0 as usize].read(|p| p.get(&key).cloned());
                match (found, default) {
                    (Some(value), _) => Ok(value),
                    (None, Some(default)) => Ok(conform(self.eval(default)?, &node.ty)),
                    (None, None) => Err(RuntimeError::MissingPoolKey {
                        pool: self.exe.pools[pool.0 as usize].name.clone(),
                        key,
                        pos: pos.clone(),
                    }),
                }
            }
            NodeKind::PoolSet { pool, key, value } => {
                let key = self.key(key)?;
                let value = conform(self.eval(value)?, &node.ty);
                let store = &mut self.state.pools[pool.0 as usize];
                store.write(|p| p.insert(key, value.clone()));
                Ok(value)
            }
            NodeKind::Error { message, code, pos } => Err(RuntimeError::UserError {
                message: message.clone(),
                code: *code,
                pos: pos.clone(),
            }),
            NodeKind::Log { args, namespace } => {
                let mut parts = Vec::with_capacity(args.len());
                for arg in args {
                    parts.push(self.eval(arg)?.to_string());
                }
                tracing::info!(
                    engine = %self.exe.name,
                    namespace = namespace.as_deref().unwrap_or(""),
                    "{}",
                    parts.join(" ")
                );
                Ok(Value::Null)
            }
        }
    }

    fn assign(&mut self, assigns: &[Assign]) -> Result<()> {
        for assign in assigns {
            let value = self.eval(&assign.value)?;
            self.frame.set(assign.slot, conform(value, &assign.ty));
        }
        Ok(())
    }

    fn call(&mut self, call: &CallNode, ret: &AvroType) -> Result<Value> {
        let mut args = Vec::with_capacity(call.args.len());
        for (arg, param) in call.args.iter().zip(&call.params) {
            let value = self.eval(arg)?;
            args.push(conform(value, param));
        }

        let fcn = self.exe.library.fcn(call.fcn);
        let mut ctx = CallContext {
            rng: &mut *self.rng,
            params: &call.params,
            ret,
        };
        match (fcn.imp)(&mut ctx, &args) {
            Ok(value) => Ok(value),
            Err(err) => Err(RuntimeError::Function {
                name: fcn.name.clone(),
                pos: call.pos.clone(),
                args,
                message: err.message,
            }),
        }
    }

    fn test(&mut self, cond: &Node) -> Result<bool> {
        Ok(self.eval(cond)?.as_bool().unwrap_or(false))
    }

    fn key(&mut self, key: &Node) -> Result<String> {
        match self.eval(key)? {
            Value::String(key) => Ok(key),
            other => Ok(other.to_string()),
        }
    }

    fn entries(&mut self, entries: &[(String, Node)]) -> Result<IndexMap<String, Value>> {
        let mut map = IndexMap::with_capacity(entries.len());
        for (name, node) in entries {
            let value = self.eval(node)?;
            map.insert(name.clone(), value);
        }
        Ok(map)
    }

    /// Follow an `Attr` path. Steps are evaluated left to right.
    fn walk(&mut self, mut current: Value, path: &[PathStep], pos: &str) -> Result<Value> {
        for step in path {
            current = match (step, current) {
                (PathStep::Field(name), Value::Record(mut fields)) => {
                    fields.swap_remove(name).ok_or_else(|| RuntimeError::MissingKey {
                        key: name.clone(),
                        pos: pos.to_owned(),
                    })?
                }
                (PathStep::Index(index), Value::Array(items)) => {
                    let index = self.eval(index)?.as_i64().unwrap_or(-1);
                    let len = items.len();
                    usize::try_from(index)
                        .ok()
                        .and_then(|i| items.into_iter().nth(i))
                        .ok_or_else(|| RuntimeError::IndexOutOfRange {
                            index,
                            len,
                            pos: pos.to_owned(),
                        })?
                }
                (PathStep::Key(key), Value::Map(mut entries)) => {
                    let key = self.key(key)?;
                    match entries.swap_remove(&key) {
                        Some(value) => value,
                        None => {
                            return Err(RuntimeError::MissingKey {
                                key,
                                pos: pos.to_owned(),
                            });
                        }
                    }
                }
                (_, other) => {
                    return Err(RuntimeError::MissingKey {
                        key: other.kind_name().to_owned(),
                        pos: pos.to_owned(),
                    });
                }
            };
        }
        Ok(current)
    }
}

/// Convert `value` to the exact representation of `ty`.
///
/// The compiler only lets values through where `ty` accepts them, so a
/// failed conversion keeps the value as it was.
pub fn conform(value: Value, ty: &AvroType) -> Value {
    if value.conforms(ty) {
        let fallback = value.clone();
        value.conform(ty).unwrap_or(fallback)
    } else {
        value
    }
}
