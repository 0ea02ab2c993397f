//! Core data structures for the PFA engine.
//!
//! This crate contains the pieces shared by every stage of the pipeline:
//! - `avro`: the structural Avro type system and schema validation
//! - `compat`: type compatibility, numeric widening and least upper bounds
//! - `value`: runtime data mirroring Avro types
//! - `rng`: the deterministic Mersenne Twister used by `rand.*`

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod avro;
pub mod compat;
pub mod rng;
pub mod value;

pub use avro::{AvroType, EnumType, Field, FixedType, RecordType, SchemaError};
pub use compat::{accepts, least_upper_bound, widening_cost};
pub use rng::{Rng, RngError};
pub use value::Value;
