use base64::{Engine as _, engine::general_purpose::STANDARD};
use mathcast_api_types::Features;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;

use crate::domain::types::InputType;

use super::markup::{MarkupNode, VectorNode};

pub const CONTENT_TYPE: &str = "content-type";
pub const CACHE_CONTROL: &str = "cache-control";
pub const MATH_STYLE_HEADER: &str = "x-math-style";
pub const SVG_CONTENT_TYPE: &str = "image/svg+xml";
pub const PNG_CONTENT_TYPE: &str = "image/png";
pub const MATHML_CONTENT_TYPE: &str = "application/mathml+xml";
pub const SPEECH_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const JSON_CONTENT_TYPE: &str = "application/json";
/// Info reports only depend on the markup, so they may be cached for 30 days.
pub const INFO_CACHE_DIRECTIVE: &str = "max-age=2592000";

/// One render call as received from the HTTP or batch surface.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderRequest {
    pub markup: String,
    /// Raw input-type alias; defaults to TeX.
    pub input_type: Option<String>,
    /// Raw output-format alias; defaults to JSON.
    pub output_format: Option<String>,
    /// Explicit feature toggles; the configured speech default applies when absent.
    pub features: Option<Features>,
}

impl RenderRequest {
    pub fn new(markup: impl Into<String>) -> Self {
        Self {
            markup: markup.into(),
            ..Self::default()
        }
    }

    pub fn with_input_type(mut self, input_type: impl Into<String>) -> Self {
        self.input_type = Some(input_type.into());
        self
    }

    pub fn with_output_format(mut self, output_format: impl Into<String>) -> Self {
        self.output_format = Some(output_format.into());
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = Some(features);
        self
    }
}

/// Options handed to the typesetting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TypesetOptions {
    pub math: String,
    pub format: InputType,
    pub svg: bool,
    pub aux_node: bool,
    pub mml: bool,
    pub mml_node: bool,
}

/// Raw artifacts reported by the typesetting engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TypesetOutput {
    #[serde(default)]
    pub mml: Option<String>,
    #[serde(default)]
    pub svg: Option<String>,
    /// Auxiliary markup hosting accessibility annotations.
    #[serde(default, rename = "html")]
    pub aux: Option<String>,
    #[serde(default)]
    pub errors: Vec<String>,
}

/// Engine output together with the in-process node views the post-processing
/// stages operate on.
#[derive(Debug, Clone, PartialEq)]
pub struct TypesetResult {
    pub mml: Option<String>,
    pub mml_node: Option<MarkupNode>,
    pub svg: Option<String>,
    pub svg_node: Option<VectorNode>,
    pub aux: Option<String>,
    pub aux_node: Option<MarkupNode>,
}

impl TypesetResult {
    /// Attach node views for every artifact the options asked a node for.
    /// Engine-reported errors must already have been raised by the caller.
    pub fn new(output: TypesetOutput, options: &TypesetOptions) -> Self {
        let TypesetOutput { mml, svg, aux, .. } = output;

        let svg_node = svg
            .as_deref()
            .filter(|_| options.svg)
            .and_then(VectorNode::parse);
        let mml_node = mml
            .as_deref()
            .filter(|_| options.mml_node)
            .and_then(MarkupNode::parse);
        let aux_node = aux
            .as_deref()
            .filter(|_| options.aux_node)
            .and_then(MarkupNode::parse);

        Self {
            mml,
            mml_node,
            svg,
            svg_node,
            aux,
            aux_node,
        }
    }

    pub fn has_any_node(&self) -> bool {
        self.svg_node.is_some() || self.aux_node.is_some() || self.mml_node.is_some()
    }
}

/// Semantic tree computed by the speech engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticTree {
    pub json: Value,
    pub xml: String,
}

/// Typeset result after the raster and speech stages.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedResult {
    pub typeset: TypesetResult,
    pub png: Option<Vec<u8>>,
    pub speak_text: Option<String>,
    pub semantic_tree: Option<SemanticTree>,
    /// Raster failure recorded for the deferred-error check.
    pub raster_error: Option<String>,
}

impl From<TypesetResult> for EnrichedResult {
    fn from(typeset: TypesetResult) -> Self {
        Self {
            typeset,
            png: None,
            speak_text: None,
            semantic_tree: None,
            raster_error: None,
        }
    }
}

/// Raster output dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelSize {
    pub width: f64,
    pub height: f64,
}

/// Error detail reported by the TeX checker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckerFault {
    pub name: String,
    pub message: String,
}

/// Checker verdict plus the full feedback object it was read from.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckerFeedback {
    pub success: bool,
    pub checked: Option<String>,
    pub error: Option<CheckerFault>,
    pub raw: Value,
}

impl CheckerFeedback {
    pub fn from_value(raw: Value) -> Self {
        let success = raw.get("success").and_then(Value::as_bool).unwrap_or(false);
        let checked = raw
            .get("checked")
            .and_then(Value::as_str)
            .map(str::to_string);
        let error = raw.get("error").filter(|value| !value.is_null()).map(|error| {
            let field = |key: &str| {
                error
                    .get(key)
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string()
            };
            CheckerFault {
                name: field("name"),
                message: field("message"),
            }
        });

        Self {
            success,
            checked,
            error,
            raw,
        }
    }
}

/// Finalized render result as it appears on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct RenderOutput {
    pub success: bool,
    /// Legacy status text, always `"success"`.
    pub log: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mml: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub svg: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_png"
    )]
    pub png: Option<Vec<u8>>,
    #[serde(rename = "html", skip_serializing_if = "Option::is_none")]
    pub aux: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub math_style: Option<String>,
    #[serde(rename = "sanetex", skip_serializing_if = "Option::is_none")]
    pub sanitized: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speak_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speech: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stree_json: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stree_xml: Option<String>,
}

fn serialize_png<S: Serializer>(png: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
    match png {
        Some(bytes) => serializer.serialize_str(&STANDARD.encode(bytes)),
        None => serializer.serialize_none(),
    }
}

/// Body of a single-artifact response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactBody {
    Text(String),
    Binary(Vec<u8>),
}

/// Final per-format response shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponsePayload {
    /// Entire render result.
    Json(RenderOutput),
    /// Render result with svg/png/mml wrapped as `{headers, body}`.
    Complete(Value),
    /// One artifact with its headers.
    Artifact {
        headers: Vec<(&'static str, String)>,
        body: ArtifactBody,
    },
    /// Checker feedback, cacheable.
    InfoReport(Value),
    /// Compact checker parse tree.
    Graph(Value),
}

impl ResponsePayload {
    /// Headers the transport should set alongside the body.
    pub fn headers(&self) -> Vec<(&'static str, String)> {
        match self {
            ResponsePayload::Artifact { headers, .. } => headers.clone(),
            ResponsePayload::InfoReport(_) => vec![
                (CONTENT_TYPE, JSON_CONTENT_TYPE.to_string()),
                (CACHE_CONTROL, INFO_CACHE_DIRECTIVE.to_string()),
            ],
            _ => vec![(CONTENT_TYPE, JSON_CONTENT_TYPE.to_string())],
        }
    }

    /// JSON rendition used by the batch command. Binary artifacts are base64-encoded.
    pub fn to_json(&self) -> Value {
        match self {
            ResponsePayload::Json(output) => {
                serde_json::to_value(output).unwrap_or(Value::Null)
            }
            ResponsePayload::Complete(value)
            | ResponsePayload::InfoReport(value)
            | ResponsePayload::Graph(value) => value.clone(),
            ResponsePayload::Artifact { body, .. } => match body {
                ArtifactBody::Text(text) => Value::String(text.clone()),
                ArtifactBody::Binary(bytes) => Value::String(STANDARD.encode(bytes)),
            },
        }
    }
}
