//! Classifier-backed decisions.
//!
//! - [`classifier`]: the narrow protocol every classifier call goes through
//! - [`pattern`]: pattern classification, which never falls back
//! - [`chart`]: template and auxiliary selection, with default-template fallback
//! - [`proposal`]: optional column mapping proposals
//! - [`testing`]: a scripted classifier for deterministic tests

pub mod chart;
pub mod classifier;
pub mod pattern;
pub mod prompt;
pub mod proposal;
pub mod testing;

pub use chart::{ChartDecision, ChartSelectionError, ChartSelector, filter_auxiliary};
pub use classifier::{
    ClassificationRequest, Classifier, ClassifierError, ClassifierSettings, ClassifierTask,
    ConstrainedClassifier, extract_json, parse_reply,
};
pub use pattern::{PatternDecision, PatternSelectionError, PatternSelector};
pub use proposal::{MappingProposer, restrict_proposal};
