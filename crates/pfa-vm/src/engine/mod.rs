//! Runtime engine for compiled documents.
//!
//! Evaluation walks the typed IR directly. Calls are already bound to a
//! signature, so nothing dispatches on runtime types.

mod error;
mod frame;
mod instance;
mod interpreter;
mod state;


pub use error::RuntimeError;
pub use instance::{CompiledEngine, EngineInstance};
