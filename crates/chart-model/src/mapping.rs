//! Channel-to-column bindings.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::encoding::Channel;

/// Column bound to each encoding channel.
///
/// Serialises as a flat object, e.g. `{"x": "date", "y": "sales"}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MappingConfig {
    encodings: BTreeMap<Channel, String>,
}

impl MappingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, channel: Channel) -> Option<&str> {
        self.encodings.get(&channel).map(String::as_str)
    }

    pub fn bind(&mut self, channel: Channel, column: impl Into<String>) {
        self.encodings.insert(channel, column.into());
    }

    #[must_use]
    pub fn with(mut self, channel: Channel, column: impl Into<String>) -> Self {
        self.bind(channel, column);
        self
    }

    pub fn contains(&self, channel: Channel) -> bool {
        self.encodings.contains_key(&channel)
    }

    pub fn is_empty(&self) -> bool {
        self.encodings.is_empty()
    }

    pub fn len(&self) -> usize {
        self.encodings.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Channel, &str)> {
        self.encodings
            .iter()
            .map(|(channel, column)| (*channel, column.as_str()))
    }

    /// True when some column is bound to more than one channel.
    pub fn has_shared_columns(&self) -> bool {
        let mut seen = std::collections::BTreeSet::new();
        self.encodings.values().any(|column| !seen.insert(column))
    }
}
