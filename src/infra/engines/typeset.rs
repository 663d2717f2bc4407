use async_trait::async_trait;
use katex::{OptsBuilder, OutputType};

use crate::{
    application::render::{EngineError, TypesetEngine, TypesetOptions, TypesetOutput},
    domain::types::InputType,
};

use super::command::CommandRunner;

/// Typesetter reached over a JSON stdin/stdout protocol.
#[derive(Debug, Clone)]
pub struct CommandTypesetter {
    runner: CommandRunner,
}

impl CommandTypesetter {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl TypesetEngine for CommandTypesetter {
    async fn typeset(&self, options: &TypesetOptions) -> Result<TypesetOutput, EngineError> {
        let request = serde_json::to_vec(options)
            .map_err(|err| EngineError::protocol(format!("failed to encode options: {err}")))?;
        let stdout = self.runner.run(&[], &request).await?;
        serde_json::from_slice(&stdout)
            .map_err(|err| EngineError::protocol(format!("failed to decode typeset output: {err}")))
    }
}

/// In-process typesetter backed by KaTeX. Produces MathML and an HTML
/// rendition for the auxiliary node; it has no vector output.
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexTypesetter;

#[async_trait]
impl TypesetEngine for KatexTypesetter {
    async fn typeset(&self, options: &TypesetOptions) -> Result<TypesetOutput, EngineError> {
        let options = options.clone();
        tokio::task::spawn_blocking(move || typeset_with_katex(&options))
            .await
            .map_err(|err| EngineError::failed(format!("typeset task failed: {err}")))?
    }
}

fn typeset_with_katex(options: &TypesetOptions) -> Result<TypesetOutput, EngineError> {
    let display_mode = match options.format {
        InputType::Tex => true,
        InputType::InlineTex => false,
        InputType::MathMl => {
            return Ok(TypesetOutput {
                mml: options.mml.then(|| options.math.clone()),
                ..TypesetOutput::default()
            });
        }
        other => {
            return Err(EngineError::unsupported(format!(
                "{other} input cannot be typeset by KaTeX"
            )));
        }
    };

    let mut output = TypesetOutput::default();

    if options.mml {
        match render(&options.math, display_mode, OutputType::Mathml) {
            Ok(markup) => output.mml = Some(extract_math_element(&markup).to_string()),
            Err(message) => output.errors.push(message),
        }
    }

    if options.aux_node && output.errors.is_empty() {
        match render(&options.math, display_mode, OutputType::Html) {
            Ok(markup) => output.aux = Some(markup),
            Err(message) => output.errors.push(message),
        }
    }

    Ok(output)
}

fn render(literal: &str, display_mode: bool, output_type: OutputType) -> Result<String, String> {
    let mut builder = OptsBuilder::default();
    builder.display_mode(display_mode);
    builder.output_type(output_type);
    builder.throw_on_error(true);

    let opts = builder
        .build()
        .map_err(|err| format!("failed to build KaTeX options: {err}"))?;

    katex::render_with_opts(literal, opts).map_err(|err| err.to_string())
}

/// KaTeX wraps MathML in a `<span class="katex">`; keep only the `<math>` element.
fn extract_math_element(markup: &str) -> &str {
    let Some(start) = markup.find("<math") else {
        return markup;
    };
    match markup[start..].rfind("</math>") {
        Some(end) => &markup[start..start + end + "</math>".len()],
        None => &markup[start..],
    }
}
