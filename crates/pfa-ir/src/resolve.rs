//! Overload resolution.
//!
//! Each candidate signature is unified against the argument types left to
//! right. The first occurrence of a wildcard binds it; later occurrences must
//! be accepted by the binding, or may widen it when the argument type accepts
//! the bound type and still falls inside the wildcard's class. Widening an
//! existing binding charges the promotion once per earlier occurrence.
//!
//! Among candidates that unify, the one with the least total widening wins;
//! a tie is an error rather than a silent pick.

use pfa_core::{AvroType, widening_cost};

use crate::signature::{Pattern, Signature};

/// Outcome of a successful resolution.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resolved {
    /// Index of the chosen signature.
    pub index: usize,
    /// Parameter types with wildcards substituted.
    pub params: Vec<AvroType>,
    pub ret: AvroType,
    /// Total numeric promotion distance over all arguments.
    pub widening: u32,
}

/// Why a single candidate was rejected.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Mismatch {
    #[error("expects {expected} arguments, got {actual}")]
    Arity { expected: usize, actual: usize },

    #[error("argument {position} expects {expected}, got {actual}")]
    Type {
        position: usize,
        expected: String,
        actual: AvroType,
    },

    #[error("argument {position} is {actual}, but {label} is already {bound}")]
    Conflict {
        position: usize,
        label: String,
        bound: AvroType,
        actual: AvroType,
    },
}

impl Mismatch {
    /// Argument position of the first mismatch; `None` for arity.
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Arity { .. } => None,
            Self::Type { position, .. } | Self::Conflict { position, .. } => Some(*position),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("no signature of `{name}` accepts the given arguments")]
    NoMatch {
        name: String,
        args: Vec<AvroType>,
        candidates: Vec<(Signature, Mismatch)>,
    },

    #[error("call to `{name}` is ambiguous between {} signatures", candidates.len())]
    Ambiguous {
        name: String,
        args: Vec<AvroType>,
        candidates: Vec<Signature>,
    },
}

struct Binding {
    label: String,
    ty: AvroType,
    uses: u32,
}

#[derive(Default)]
struct Bindings {
    slots: Vec<Binding>,
}

impl Bindings {
    fn get(&self, label: &str) -> Option<&AvroType> {
        self.slots.iter().find(|b| b.label == label).map(|b| &b.ty)
    }

    fn unify(&mut self, pattern: &Pattern, actual: &AvroType, position: usize) -> Result<u32, Mismatch> {
        let type_mismatch = || Mismatch::Type {
            position,
            expected: pattern.to_string(),
            actual: actual.clone(),
        };

        match pattern {
            Pattern::Concrete(expected) => widening_cost(expected, actual).ok_or_else(type_mismatch),
            Pattern::Array(inner) => match actual {
                AvroType::Array(items) => self.unify(inner, items, position),
                _ => Err(type_mismatch()),
            },
            Pattern::Map(inner) => match actual {
                AvroType::Map(values) => self.unify(inner, values, position),
                _ => Err(type_mismatch()),
            },
            Pattern::Wildcard { label, class } => {
                let Some(idx) = self.slots.iter().position(|b| &b.label == label) else {
                    if !class.admits(actual) {
                        return Err(Mismatch::Type {
                            position,
                            expected: format!("{label}: {class}"),
                            actual: actual.clone(),
                        });
                    }
                    self.slots.push(Binding {
                        label: label.clone(),
                        ty: actual.clone(),
                        uses: 1,
                    });
                    return Ok(0);
                };

                let binding = &mut self.slots[idx];
                if let Some(cost) = widening_cost(&binding.ty, actual) {
                    binding.uses += 1;
                    return Ok(cost);
                }
                match widening_cost(actual, &binding.ty) {
                    Some(back) if class.admits(actual) => {
                        let cost = back * binding.uses;
                        binding.ty = actual.clone();
                        binding.uses += 1;
                        Ok(cost)
                    }
                    _ => Err(Mismatch::Conflict {
                        position,
                        label: label.clone(),
                        bound: binding.ty.clone(),
                        actual: actual.clone(),
                    }),
                }
            }
        }
    }

    fn instantiate(&self, pattern: &Pattern) -> Option<AvroType> {
        match pattern {
            Pattern::Concrete(ty) => Some(ty.clone()),
            Pattern::Wildcard { label, .. } => self.get(label).cloned(),
            Pattern::Array(inner) => self.instantiate(inner).map(AvroType::array),
            Pattern::Map(inner) => self.instantiate(inner).map(AvroType::map),
        }
    }
}

fn try_signature(index: usize, signature: &Signature, args: &[AvroType]) -> Result<Resolved, Mismatch> {
    if signature.arity() != args.len() {
        return Err(Mismatch::Arity {
            expected: signature.arity(),
            actual: args.len(),
        });
    }

    let mut bindings = Bindings::default();
    let mut widening = 0;
    for (position, (param, actual)) in signature.params.iter().zip(args).enumerate() {
        widening += bindings.unify(&param.pattern, actual, position)?;
    }

    // Parameters are instantiated after all bindings settle so that a widened
    // wildcard applies to its earlier occurrences too.
    let params = signature
        .params
        .iter()
        .zip(args)
        .enumerate()
        .map(|(position, (param, actual))| {
            bindings.instantiate(&param.pattern).ok_or_else(|| Mismatch::Type {
                position,
                expected: param.pattern.to_string(),
                actual: actual.clone(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    // Registration guarantees every return wildcard is bound by a parameter.
    let ret = bindings.instantiate(&signature.ret).unwrap_or(AvroType::Null);

    Ok(Resolved {
        index,
        params,
        ret,
        widening,
    })
}

/// Pick the signature of `name` that best fits `args`.
pub fn resolve(name: &str, signatures: &[Signature], args: &[AvroType]) -> Result<Resolved, ResolveError> {
    let mut matches = Vec::new();
    let mut rejected = Vec::new();
    for (index, signature) in signatures.iter().enumerate() {
        match try_signature(index, signature, args) {
            Ok(resolved) => matches.push(resolved),
            Err(mismatch) => rejected.push((signature.clone(), mismatch)),
        }
    }

    let Some(least) = matches.iter().map(|m| m.widening).min() else {
        return Err(ResolveError::NoMatch {
            name: name.to_owned(),
            args: args.to_vec(),
            candidates: rejected,
        });
    };

    let mut best: Vec<Resolved> = matches.into_iter().filter(|m| m.widening == least).collect();
    if best.len() > 1 {
        return Err(ResolveError::Ambiguous {
            name: name.to_owned(),
            args: args.to_vec(),
            candidates: best.iter().map(|m| signatures[m.index].clone()).collect(),
        });
    }
    Ok(best.remove(0))
}

#[cfg(test)]
#[path = "resolve_tests.rs"]
mod resolve_tests;
