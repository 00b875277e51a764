//! Column-to-channel binding.
//!
//! [`DataMapper`] binds the columns of a processed table to the encoding
//! channels of a chart template. Required channels that cannot be bound
//! fail the mapping; optional ones are dropped with a warning.

pub mod error;
pub mod fit;
pub mod mapper;

pub use error::{MappingError, Result, available_columns_hint};
pub use fit::{Coercion, DISCRETE_MAX_VALUES, Fit, Rejection, assess};
pub use mapper::{DataMapper, MappedTable, bound_channels};
