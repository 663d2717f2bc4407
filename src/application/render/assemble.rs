use serde_json::{Map, Value, json};

use crate::domain::types::OutputFormat;

use super::{
    error::RenderError,
    types::{
        ArtifactBody, CONTENT_TYPE, MATH_STYLE_HEADER, MATHML_CONTENT_TYPE, PNG_CONTENT_TYPE,
        RenderOutput, ResponsePayload, SPEECH_CONTENT_TYPE, SVG_CONTENT_TYPE,
    },
};

/// Shape the finalized output for the requested format.
pub fn assemble(output: RenderOutput, format: OutputFormat) -> Result<ResponsePayload, RenderError> {
    match format {
        OutputFormat::Json => Ok(ResponsePayload::Json(output)),
        OutputFormat::Complete => Ok(ResponsePayload::Complete(complete(&output))),
        OutputFormat::Svg | OutputFormat::Png | OutputFormat::MathMl | OutputFormat::Speech => {
            artifact(output, format)
        }
        OutputFormat::InfoReport | OutputFormat::Graph => Err(RenderError::NoSuitableOutput),
    }
}

fn artifact(output: RenderOutput, format: OutputFormat) -> Result<ResponsePayload, RenderError> {
    let math_style = output.math_style.clone();
    let body = match format {
        OutputFormat::Svg => output.svg.map(ArtifactBody::Text),
        OutputFormat::Png => output.png.map(ArtifactBody::Binary),
        OutputFormat::MathMl => output.mml.map(ArtifactBody::Text),
        OutputFormat::Speech => output.speech.map(ArtifactBody::Text),
        _ => None,
    };
    let body = body.ok_or(RenderError::MissingArtifact(format))?;

    Ok(ResponsePayload::Artifact {
        headers: artifact_headers(format, math_style.as_deref()),
        body,
    })
}

fn artifact_headers(format: OutputFormat, math_style: Option<&str>) -> Vec<(&'static str, String)> {
    match format {
        OutputFormat::Svg => vec![(CONTENT_TYPE, SVG_CONTENT_TYPE.to_string())],
        OutputFormat::Png => vec![(CONTENT_TYPE, PNG_CONTENT_TYPE.to_string())],
        OutputFormat::MathMl => {
            let mut headers = vec![(CONTENT_TYPE, MATHML_CONTENT_TYPE.to_string())];
            if let Some(style) = math_style {
                headers.push((MATH_STYLE_HEADER, style.to_string()));
            }
            headers
        }
        _ => vec![(CONTENT_TYPE, SPEECH_CONTENT_TYPE.to_string())],
    }
}

/// Whole output with each present svg/png/mml field wrapped as
/// `{ headers, body }`.
fn complete(output: &RenderOutput) -> Value {
    let mut value = serde_json::to_value(output).unwrap_or_default();
    let Some(fields) = value.as_object_mut() else {
        return value;
    };

    for (key, format) in [
        ("svg", OutputFormat::Svg),
        ("png", OutputFormat::Png),
        ("mml", OutputFormat::MathMl),
    ] {
        if let Some(body) = fields.remove(key) {
            let headers: Map<String, Value> = artifact_headers(format, output.math_style.as_deref())
                .into_iter()
                .map(|(name, value)| (name.to_string(), Value::String(value)))
                .collect();
            fields.insert(key.to_string(), json!({ "headers": headers, "body": body }));
        }
    }

    value
}
