//! CLI library components for chartsmith.

pub mod classifier;
pub mod config;
pub mod logging;
pub mod request;

pub use classifier::HttpClassifier;
pub use config::{AppConfig, EndpointSettings};
