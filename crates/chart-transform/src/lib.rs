//! Sampling and safe table operations.
//!
//! - [`sampler`]: deterministic equidistant row reduction
//! - [`registry`]: the closed set of operations a plan may name
//! - [`operations`]: the operation implementations
//! - [`processor`]: runs a plan step by step, reverting failed steps
//! - [`planner`]: picks the caller's plan or derives one from the template

pub mod error;
pub mod operations;
pub mod params;
pub mod planner;
pub mod processor;
pub mod registry;
pub mod sampler;

pub use error::{OperationError, Result};
pub use planner::{derive_plan, resolve_plan};
pub use processor::{DEFAULT_MAX_STEPS, DataProcessor, ProcessedTable};
pub use registry::{FnOperation, OperationRegistry, SafeOperation};
pub use sampler::{Sampled, Sampler, equidistant_indices};
