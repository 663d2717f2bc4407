use mathcast_api_types::ErrorEnvelope;
use serde_json::Value;
use thiserror::Error;

use crate::domain::capabilities::Capability;
use crate::domain::types::{InputType, OutputFormat};

const BAD_REQUEST_TITLE: &str = "Bad Request";
const SERVER_ERROR_TITLE: &str = "Internal Server Error";

/// Request-terminating failures of the render pipeline. Each maps 1:1 onto an
/// [`ErrorEnvelope`]; no partial output accompanies any of them.
#[derive(Debug, Clone, Error)]
pub enum RenderError {
    #[error("q (query) parameter is missing!")]
    MissingQuery,
    #[error("Input format \"{0}\" is not recognized!")]
    UnrecognizedType(String),
    #[error("Output format \"{0}\" is not recognized!")]
    UnrecognizedFormat(String),
    #[error(
        "Output format {format} is disabled via config, try setting \"{capability}: true\" to enable {format} rendering."
    )]
    FormatDisabled {
        format: OutputFormat,
        capability: Capability,
    },
    #[error("{format} accepts only {accepted} as the input type, \"{given}\" given!")]
    TypeMismatch {
        format: OutputFormat,
        accepted: &'static str,
        given: InputType,
    },
    #[error("{name}: {message}")]
    ValidationFailed {
        name: String,
        message: String,
        feedback: Value,
    },
    #[error("No MathML found. Please check the typesetter configuration")]
    MissingMathMl,
    #[error("No suitable output found. Please check the typesetter configuration")]
    NoSuitableOutput,
    #[error("No {0} output was produced for this request")]
    MissingArtifact(OutputFormat),
    #[error("{0}")]
    RasterizationFailed(String),
    #[error("{}", .0.join("\n"))]
    TypesetFailed(Vec<String>),
    #[error("speech generation failed: {0}")]
    SpeechFailed(String),
    #[error("{collaborator} unavailable: {message}")]
    EngineUnavailable {
        collaborator: &'static str,
        message: String,
    },
}

impl RenderError {
    pub fn validation(name: impl Into<String>, message: impl Into<String>, feedback: Value) -> Self {
        Self::ValidationFailed {
            name: name.into(),
            message: message.into(),
            feedback,
        }
    }

    pub fn engine_unavailable(collaborator: &'static str, message: impl Into<String>) -> Self {
        Self::EngineUnavailable {
            collaborator,
            message: message.into(),
        }
    }

    /// Machine-readable tag carried in the envelope's `type` field.
    pub fn kind(&self) -> &'static str {
        match self {
            RenderError::MissingQuery => "missing_query",
            RenderError::UnrecognizedType(_) => "unrecognized_type",
            RenderError::UnrecognizedFormat(_) => "unrecognized_format",
            RenderError::FormatDisabled { .. } => "format_disabled",
            RenderError::TypeMismatch { .. } => "type_mismatch",
            RenderError::ValidationFailed { .. } => "validation_failed",
            RenderError::MissingMathMl => "missing_mathml",
            RenderError::NoSuitableOutput | RenderError::MissingArtifact(_) => {
                "no_suitable_output"
            }
            RenderError::RasterizationFailed(_) => "rasterization_failed",
            RenderError::TypesetFailed(_) => "typeset_failed",
            RenderError::SpeechFailed(_) => "speech_failed",
            RenderError::EngineUnavailable { .. } => "engine_unavailable",
        }
    }

    pub fn status(&self) -> u16 {
        match self {
            RenderError::EngineUnavailable { .. } => 500,
            _ => 400,
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let message = self.to_string();
        let (title, feedback) = match self {
            RenderError::EngineUnavailable { .. } => (SERVER_ERROR_TITLE, None),
            RenderError::ValidationFailed { feedback, .. } => {
                (BAD_REQUEST_TITLE, Some(feedback.clone()))
            }
            _ => (BAD_REQUEST_TITLE, None),
        };

        ErrorEnvelope {
            status: self.status(),
            success: false,
            title: title.to_string(),
            kind: self.kind().to_string(),
            detail: message.clone(),
            error: message,
            feedback,
        }
    }
}
