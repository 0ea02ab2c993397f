//! Function registry.
//!
//! A `Library` is assembled once through `LibraryBuilder` and is immutable
//! afterwards; the compiler and every engine share it behind an `Arc`.

use std::fmt;

use indexmap::IndexMap;
use pfa_core::{AvroType, Rng, RngError, Value};

use crate::signature::Signature;

/// Whether a function reads or advances engine state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Purity {
    Pure,
    /// Draws from the instance RNG.
    ConsumesRng,
}

/// Failure raised by a function implementation.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct FcnError {
    pub message: String,
}

impl FcnError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl From<RngError> for FcnError {
    fn from(err: RngError) -> Self {
        Self::new(err.to_string())
    }
}

/// What a function sees of its call site and engine.
pub struct CallContext<'a> {
    pub rng: &'a mut Rng,
    /// Parameter types after wildcard substitution.
    pub params: &'a [AvroType],
    pub ret: &'a AvroType,
}

/// Argument values arrive conformed to `CallContext::params`.
pub type FcnImpl = fn(&mut CallContext<'_>, &[Value]) -> Result<Value, FcnError>;

/// Index of a function in its library.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FcnId(pub u32);

#[derive(Clone)]
pub struct LibFcn {
    pub name: String,
    pub signatures: Vec<Signature>,
    pub purity: Purity,
    pub doc: &'static str,
    pub imp: FcnImpl,
}

impl LibFcn {
    pub fn new(name: &str, imp: FcnImpl) -> Self {
        Self {
            name: name.to_owned(),
            signatures: Vec::new(),
            purity: Purity::Pure,
            doc: "",
            imp,
        }
    }

    pub fn signature(mut self, signature: Signature) -> Self {
        self.signatures.push(signature);
        self
    }

    pub fn consumes_rng(mut self) -> Self {
        self.purity = Purity::ConsumesRng;
        self
    }

    pub fn doc(mut self, doc: &'static str) -> Self {
        self.doc = doc;
        self
    }
}

impl fmt::Debug for LibFcn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LibFcn")
            .field("name", &self.name)
            .field("signatures", &self.signatures.len())
            .field("purity", &self.purity)
            .finish()
    }
}

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("function `{0}` is already registered")]
    Duplicate(String),

    #[error("function `{0}` has no signatures")]
    NoSignatures(String),

    #[error("signature {signature} of `{name}` returns unbound wildcard `{label}`")]
    UnboundReturn {
        name: String,
        signature: String,
        label: String,
    },
}

#[derive(Default)]
pub struct LibraryBuilder {
    fcns: IndexMap<String, LibFcn>,
}

impl LibraryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, fcn: LibFcn) -> Result<&mut Self, RegistryError> {
        if self.fcns.contains_key(&fcn.name) {
            return Err(RegistryError::Duplicate(fcn.name));
        }
        if fcn.signatures.is_empty() {
            return Err(RegistryError::NoSignatures(fcn.name));
        }
        for signature in &fcn.signatures {
            if let Some(label) = signature.unbound_return_labels().into_iter().next() {
                return Err(RegistryError::UnboundReturn {
                    name: fcn.name.clone(),
                    signature: signature.to_string(),
                    label,
                });
            }
        }
        self.fcns.insert(fcn.name.clone(), fcn);
        Ok(self)
    }

    pub fn build(self) -> Library {
        Library { fcns: self.fcns }
    }
}

/// Immutable name-to-function table.
#[derive(Debug)]
pub struct Library {
    fcns: IndexMap<String, LibFcn>,
}

impl Library {
    pub fn builder() -> LibraryBuilder {
        LibraryBuilder::new()
    }

    pub fn get(&self, name: &str) -> Option<&LibFcn> {
        self.fcns.get(name)
    }

    pub fn lookup(&self, name: &str) -> Option<(FcnId, &LibFcn)> {
        let (idx, _, fcn) = self.fcns.get_full(name)?;
        Some((FcnId(idx as u32), fcn))
    }

    /// Function by id.
    ///
    /// # Panics
    /// Panics if `id` did not come from this library.
    pub fn fcn(&self, id: FcnId) -> &LibFcn {
        &self.fcns[id.0 as usize]
    }

    pub fn is_known(&self, name: &str) -> bool {
        self.fcns.contains_key(name)
    }

    pub fn list_signatures(&self, name: &str) -> Option<&[Signature]> {
        self.fcns.get(name).map(|f| f.signatures.as_slice())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.fcns.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.fcns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fcns.is_empty()
    }
}

#[cfg(test)]
#[path = "library_tests.rs"]
mod library_tests;
