use crate::domain::{
    capabilities::{Capabilities, Capability},
    types::{InputType, OutputFormat},
};

use super::error::RenderError;

const DEFAULT_INPUT_TYPE: &str = "tex";

/// Resolve an input-type alias. Absent or empty values mean TeX.
pub fn resolve_input_type(raw: Option<&str>) -> Result<InputType, RenderError> {
    let raw = raw
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_INPUT_TYPE);

    match raw.to_ascii_lowercase().as_str() {
        "tex" => Ok(InputType::Tex),
        "inline-tex" => Ok(InputType::InlineTex),
        "mml" | "mathml" => Ok(InputType::MathMl),
        "ascii" | "asciimathml" | "asciimath" => Ok(InputType::AsciiMath),
        "chem" => Ok(InputType::Chem),
        _ => Err(RenderError::UnrecognizedType(raw.to_string())),
    }
}

/// Resolve an output-format alias against the enabled capabilities. Absent or
/// empty values mean JSON.
pub fn resolve_output_format(
    raw: Option<&str>,
    input_type: InputType,
    capabilities: &Capabilities,
) -> Result<OutputFormat, RenderError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(OutputFormat::Json);
    };

    match raw.to_ascii_lowercase().as_str() {
        "svg" => gated(OutputFormat::Svg, Capability::Svg, capabilities),
        "png" => gated(OutputFormat::Png, Capability::Png, capabilities),
        "speech" => gated(OutputFormat::Speech, Capability::Speech, capabilities),
        "texvcinfo" => {
            let format = gated(OutputFormat::InfoReport, Capability::TexvcInfo, capabilities)?;
            if !(input_type.is_tex_family() || input_type == InputType::Chem) {
                return Err(RenderError::TypeMismatch {
                    format,
                    accepted: "tex, inline-tex, or chem",
                    given: input_type,
                });
            }
            Ok(format)
        }
        "graph" => {
            let format = gated(OutputFormat::Graph, Capability::TexvcInfo, capabilities)?;
            if !input_type.is_tex_family() {
                return Err(RenderError::TypeMismatch {
                    format,
                    accepted: "tex or inline-tex",
                    given: input_type,
                });
            }
            Ok(format)
        }
        "mml" | "mathml" => Ok(OutputFormat::MathMl),
        "json" => Ok(OutputFormat::Json),
        "complete" => Ok(OutputFormat::Complete),
        _ => Err(RenderError::UnrecognizedFormat(raw.to_string())),
    }
}

fn gated(
    format: OutputFormat,
    capability: Capability,
    capabilities: &Capabilities,
) -> Result<OutputFormat, RenderError> {
    if capabilities.is_enabled(capability) {
        Ok(format)
    } else {
        Err(RenderError::FormatDisabled { format, capability })
    }
}
