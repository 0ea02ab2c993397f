//! Function signatures, overload resolution and the executable IR.
//!
//! - `signature`: parameter patterns (concrete types, wildcards, containers)
//! - `resolve`: wildcard unification and least-widening overload choice
//! - `library`: immutable function registry built once by `LibraryBuilder`
//! - `ir`: the type-annotated tree produced by the compiler and run by the VM

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod ir;
pub mod library;
pub mod resolve;
pub mod signature;

pub use ir::{
    Assign, CallNode, CellDecl, CellId, Executable, Node, NodeKind, PathStep, PoolDecl, PoolId,
    Slot,
};
pub use library::{
    CallContext, FcnError, FcnId, FcnImpl, LibFcn, Library, LibraryBuilder, Purity, RegistryError,
};
pub use resolve::{Mismatch, ResolveError, Resolved, resolve};
pub use signature::{Param, Pattern, Signature, WildClass};
