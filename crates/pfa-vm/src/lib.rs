//! Execution engine for compiled PFA documents.
//!
//! A [`CompiledEngine`] wraps one `Executable` and hands out
//! [`EngineInstance`]s, each with its own cells, pools and random generator
//! (shared cells and pools excepted).

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod engine;

pub use engine::{CompiledEngine, EngineInstance, RuntimeError};
