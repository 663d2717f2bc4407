//! Render request pipeline.
//!
//! A request flows through format negotiation, the TeX checker, one
//! typesetting call, the raster and speech stages, SVG optimization and
//! finally response assembly. External renderers are reached only through the
//! traits in [`engines`]; everything else in this module is deterministic.

mod assemble;
pub mod engines;
mod error;
pub mod markup;
mod negotiate;
mod pipeline;
mod plan;
mod sanitize;
mod service;
mod types;

pub use assemble::assemble;
pub use engines::{
    Collaborators, EngineError, Rasterizer, SpeechEngine, SvgOptimizer, TexChecker, TypesetEngine,
};
pub use error::RenderError;
pub use negotiate::{resolve_input_type, resolve_output_format};
pub use pipeline::{check_deferred, finalize, optimize_stage, raster_size, raster_stage, speech_stage};
pub use plan::RenderPlan;
pub use sanitize::{SanitizeOutcome, requires_check, sanitize};
pub use service::MathRenderService;
pub use types::{
    ArtifactBody, CheckerFault, CheckerFeedback, EnrichedResult, PixelSize, RenderOutput,
    RenderRequest, ResponsePayload, SemanticTree, TypesetOptions, TypesetOutput, TypesetResult,
    CACHE_CONTROL, CONTENT_TYPE, INFO_CACHE_DIRECTIVE, JSON_CONTENT_TYPE, MATH_STYLE_HEADER,
    MATHML_CONTENT_TYPE, PNG_CONTENT_TYPE, SPEECH_CONTENT_TYPE, SVG_CONTENT_TYPE,
};
