//! Safe-operation registry.
//!
//! The registry is the only way a plan step reaches the table: a name that
//! is not registered here is never executed. It is built once at startup and
//! shared read-only.
//!
//! # Example
//!
//! ```
//! use chart_transform::OperationRegistry;
//!
//! let registry = OperationRegistry::builtin();
//! assert!(registry.get("sort").is_some());
//! assert!(registry.get("eval").is_none());
//! ```

use std::collections::BTreeMap;

use polars::prelude::DataFrame;
use serde_json::{Map, Value};

use crate::error::Result;
use crate::operations;

/// A pure table transform callable from a plan.
///
/// Implementations must not keep state between calls: the same table and
/// parameters always give the same result.
pub trait SafeOperation: Send + Sync {
    /// Name used in plans, lowercase.
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str {
        "Table operation"
    }

    fn apply(&self, df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame>;
}

type OperationFn = fn(&DataFrame, &Map<String, Value>) -> Result<DataFrame>;

/// Operation backed by a plain function.
pub struct FnOperation {
    name: &'static str,
    description: &'static str,
    run: OperationFn,
}

impl FnOperation {
    pub const fn new(name: &'static str, description: &'static str, run: OperationFn) -> Self {
        Self {
            name,
            description,
            run,
        }
    }
}

impl SafeOperation for FnOperation {
    fn name(&self) -> &'static str {
        self.name
    }

    fn description(&self) -> &'static str {
        self.description
    }

    fn apply(&self, df: &DataFrame, params: &Map<String, Value>) -> Result<DataFrame> {
        (self.run)(df, params)
    }
}

/// Operations indexed by name.
#[derive(Default)]
pub struct OperationRegistry {
    operations: BTreeMap<&'static str, Box<dyn SafeOperation>>,
}

impl OperationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in operation.
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        for operation in [
            FnOperation::new(
                "filter",
                "Keep rows matching a comparison",
                operations::filter,
            ),
            FnOperation::new("sort", "Stable sort by columns", operations::sort),
            FnOperation::new(
                "group_aggregate",
                "Aggregate per group in first-seen order",
                operations::group_aggregate,
            ),
            FnOperation::new(
                "pivot",
                "Spread a key column into value columns",
                operations::pivot,
            ),
            FnOperation::new(
                "resample",
                "Aggregate per calendar bucket",
                operations::resample,
            ),
            FnOperation::new("rename", "Rename columns", operations::rename),
            FnOperation::new("limit", "First or last N rows", operations::limit),
            FnOperation::new("sample", "N rows at a fixed stride", operations::sample),
            FnOperation::new("select", "Keep the named columns", operations::select),
            FnOperation::new("drop", "Remove the named columns", operations::drop),
            FnOperation::new("cast", "Change a column type", operations::cast),
            FnOperation::new("fill_null", "Replace missing values", operations::fill_null),
        ] {
            registry.register(Box::new(operation));
        }
        registry
    }

    /// Registers an operation, replacing any with the same name.
    pub fn register(&mut self, operation: Box<dyn SafeOperation>) {
        self.operations.insert(operation.name(), operation);
    }

    /// Looks up an operation; names are matched after trimming and lowercasing.
    pub fn get(&self, name: &str) -> Option<&dyn SafeOperation> {
        self.operations
            .get(name.trim().to_ascii_lowercase().as_str())
            .map(|operation| operation.as_ref())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Registered names in sorted order.
    pub fn names(&self) -> Vec<&'static str> {
        self.operations.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

impl std::fmt::Debug for OperationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationRegistry")
            .field("operations", &self.names())
            .finish()
    }
}
