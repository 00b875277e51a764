//! Data processing plans.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One step of a processing plan: a registry operation name plus parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationStep {
    pub operation: String,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl OperationStep {
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: operation.into(),
            params: Map::new(),
        }
    }

    #[must_use]
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Ordered list of steps, executed left to right.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OperationPlan {
    pub steps: Vec<OperationStep>,
}

impl OperationPlan {
    pub fn new(steps: Vec<OperationStep>) -> Self {
        Self { steps }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }
}
