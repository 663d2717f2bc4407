use serde_json::Value;
use tracing::debug;

use crate::domain::{
    capabilities::Capabilities,
    types::{InputType, OutputFormat},
};

use super::{engines::TexChecker, error::RenderError};

/// Result of the checker pass.
#[derive(Debug, Clone, PartialEq)]
pub enum SanitizeOutcome {
    /// Typesetting proceeds with `markup`; `sanitized` is set when the checker ran.
    Continue {
        markup: String,
        sanitized: Option<String>,
    },
    /// Compact parse tree for the `graph` format.
    Graph(Value),
    /// Full checker feedback for the `texvcinfo` format.
    InfoReport(Value),
}

/// Whether the checker must see the markup before anything else happens.
pub fn requires_check(
    input_type: InputType,
    format: OutputFormat,
    capabilities: &Capabilities,
) -> bool {
    let checkable = input_type.is_tex_family() || input_type == InputType::Chem;
    (!capabilities.no_check && checkable) || wants_info(format, capabilities)
}

fn wants_info(format: OutputFormat, capabilities: &Capabilities) -> bool {
    capabilities.texvcinfo && format.is_info()
}

/// Run the TeX checker when required. Invalid markup never reaches the
/// typesetting engine.
pub async fn sanitize(
    checker: &dyn TexChecker,
    markup: String,
    input_type: InputType,
    format: OutputFormat,
    capabilities: &Capabilities,
) -> Result<SanitizeOutcome, RenderError> {
    if !requires_check(input_type, format, capabilities) {
        return Ok(SanitizeOutcome::Continue {
            markup,
            sanitized: None,
        });
    }

    let chemistry = input_type == InputType::Chem;
    let feedback = checker
        .feedback(&markup, chemistry)
        .await
        .map_err(|err| RenderError::engine_unavailable("checker", err.to_string()))?;

    if !feedback.success {
        let (name, message) = feedback
            .error
            .map(|fault| (fault.name, fault.message))
            .unwrap_or_else(|| ("Error".to_string(), "markup rejected".to_string()));
        debug!(
            target = "mathcast::render::sanitize",
            input_type = %input_type,
            error_name = %name,
            "Checker rejected markup"
        );
        return Err(RenderError::validation(name, message, feedback.raw));
    }

    let sanitized = feedback.checked.unwrap_or_default();

    if wants_info(format, capabilities) {
        match format {
            OutputFormat::Graph => {
                let tree = checker
                    .parse_tree(&sanitized)
                    .await
                    .map_err(|err| RenderError::engine_unavailable("checker", err.to_string()))?;
                return Ok(SanitizeOutcome::Graph(tree));
            }
            OutputFormat::InfoReport => return Ok(SanitizeOutcome::InfoReport(feedback.raw)),
            _ => {}
        }
    }

    Ok(SanitizeOutcome::Continue {
        markup: sanitized.clone(),
        sanitized: Some(sanitized),
    })
}
