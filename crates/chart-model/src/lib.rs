//! Closed option space and data model for the chart decision pipeline.
//!
//! Every decision the pipeline makes lands in one of the enumerations defined
//! here: [`Pattern`], [`AuxiliaryElement`], [`Channel`] and [`SemanticType`].

pub mod auxiliary;
pub mod encoding;
pub mod error;
pub mod mapping;
pub mod operation;
pub mod pattern;
pub mod phase;
pub mod profile;
pub mod request;
pub mod result;
pub mod template;

pub use auxiliary::{AuxiliaryCategory, AuxiliaryElement, MAX_AUXILIARY};
pub use encoding::{Channel, SemanticType};
pub use error::{ModelError, Result};
pub use mapping::MappingConfig;
pub use operation::{OperationPlan, OperationStep};
pub use pattern::{Intent, Pattern};
pub use phase::Phase;
pub use profile::{ColumnDtype, ColumnProfile, DataProfile};
pub use request::{DataFormat, Locale, OutputFormat, RenderOptions, VisualizeRequest};
pub use result::{
    Decisions, ErrorCategory, ErrorCode, ErrorDetail, PhaseTimings, PipelineError,
    RenderedImage, ResultStats, Versions, VisualizationResult,
};
pub use template::{ChannelSpec, TemplateSpec};
