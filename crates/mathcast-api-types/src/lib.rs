//! Wire types shared by the mathcast HTTP surface and the batch command.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Optional per-request feature toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Features {
    /// Generate spoken-text descriptions for the rendered formula.
    #[serde(default)]
    pub speech: bool,
}

/// Body accepted by the submission endpoint (`POST /{outformat}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenderBody {
    /// Markup to render.
    #[serde(default)]
    pub q: Option<String>,
    /// Input type alias (`tex`, `inline-tex`, `mml`, `ascii`, `chem`).
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    /// Force speech generation off regardless of the configured default.
    #[serde(default)]
    pub nospeech: bool,
}

/// One query in a batch file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BatchQuery {
    #[serde(default)]
    pub q: Option<String>,
    #[serde(default, rename = "type")]
    pub input_type: Option<String>,
    #[serde(default)]
    pub outformat: Option<String>,
    #[serde(default)]
    pub features: Option<Features>,
    /// Key under which the response is stored in the batch output.
    #[serde(default)]
    pub hash: Option<String>,
}

/// Envelope wrapping a [`BatchQuery`], mirroring the batch input format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub query: BatchQuery,
}

/// Response recorded for a batch entry that failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub success: bool,
    pub log: String,
}

impl BatchFailure {
    pub fn new(log: impl Into<String>) -> Self {
        Self {
            success: false,
            log: log.into(),
        }
    }
}

/// Uniform error body returned for every failed render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    pub status: u16,
    pub success: bool,
    pub title: String,
    /// Machine-readable error kind (`validation_failed`, `format_disabled`, ...).
    #[serde(rename = "type")]
    pub kind: String,
    /// Human-readable explanation.
    pub detail: String,
    /// Raw error message.
    pub error: String,
    /// Structured checker feedback for validation failures.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<Value>,
}
