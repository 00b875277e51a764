//! Error types for catalog loading.

use chart_model::{Channel, ModelError, Pattern};
use thiserror::Error;

/// Errors raised while building a template catalog.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    /// The catalog text is not valid TOML or misses fields.
    #[error("failed to parse template catalog: {0}")]
    Parse(#[from] toml::de::Error),

    /// A pattern, channel, type or auxiliary name outside the closed sets.
    #[error("template '{template}': {source}")]
    UnknownName {
        template: String,
        #[source]
        source: ModelError,
    },

    #[error("duplicate template id '{0}'")]
    DuplicateTemplate(String),

    #[error("template '{template}' declares channel '{channel}' more than once")]
    DuplicateChannel { template: String, channel: Channel },

    #[error("template '{0}' has no required channels")]
    NoRequiredChannels(String),

    #[error("template '{template}' channel '{channel}' accepts no types")]
    EmptyTypes { template: String, channel: Channel },

    #[error("pattern {0} has no default template")]
    NoDefault(Pattern),

    #[error("pattern {pattern} has several default templates: {}", ids.join(", "))]
    MultipleDefaults { pattern: Pattern, ids: Vec<String> },
}

pub type Result<T> = std::result::Result<T, CatalogError>;
