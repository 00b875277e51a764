//! Chart template catalog.
//!
//! Templates are described by constraints only (channels, accepted types,
//! auxiliary allow-list, default flag). The catalog ships embedded in the
//! crate as TOML:
//!
//! ```text
//! data/
//! └── templates.toml   # revision + [[template]] records
//! ```
//!
//! # Example
//!
//! ```
//! use chart_model::Pattern;
//! use chart_standards::{TemplateCatalog, TemplateRegistry};
//!
//! let catalog = TemplateCatalog::builtin().unwrap();
//! assert_eq!(catalog.default_id(Pattern::P01), Some("line"));
//! ```

pub mod catalog;
pub mod error;
pub mod registry;

pub use catalog::TemplateCatalog;
pub use error::{CatalogError, Result};
pub use registry::TemplateRegistry;
