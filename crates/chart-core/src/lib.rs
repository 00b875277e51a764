//! Phase-sequenced coordinator for the chart decision pipeline.
//!
//! ```text
//! validation → pattern_selection → chart_selection → data_processing
//!            → data_mapping → build (optional renderer) → result
//! ```
//!
//! - [`config`]: timeouts, limits and concurrency settings
//! - [`phase`]: phase descriptors and the generic runner that applies them
//! - [`budget`]: the global time budget checked at every phase boundary
//! - [`admission`]: the in-flight request ceiling
//! - [`render`]: the render capability and its PNG to SVG retry
//! - [`coordinator`]: wires the phases together

pub mod admission;
pub mod budget;
pub mod config;
pub mod context;
pub mod coordinator;
pub mod phase;
pub mod render;

pub use admission::Admission;
pub use budget::{BudgetCheck, TimeBudget};
pub use config::{
    ConcurrencySettings, ConfigError, PhaseTimeouts, PipelineConfig, ProcessingSettings,
};
pub use context::{PhaseTracker, PipelineOutcome, ProcessingContext};
pub use coordinator::Coordinator;
pub use phase::{FailurePolicy, PhaseDescriptor, PhaseOutcome, phase_table, run_phase, timeout_error};
pub use render::{RenderError, RenderInstruction, RenderOutcome, Renderer, render_with_fallback};
