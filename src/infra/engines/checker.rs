use async_trait::async_trait;
use katex::{OptsBuilder, OutputType};
use serde_json::{Value, json};

use crate::application::render::{CheckerFeedback, EngineError, TexChecker};

use super::command::CommandRunner;

const FEEDBACK_SUBCOMMAND: &str = "feedback";
const GRAPH_SUBCOMMAND: &str = "graph";
const CHEMISTRY_FLAG: &str = "--chem";

/// TeX checker reached through `feedback [--chem]` and `graph` subcommands.
/// Both read the markup on stdin and print JSON.
#[derive(Debug, Clone)]
pub struct CommandTexChecker {
    runner: CommandRunner,
}

impl CommandTexChecker {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    async fn run_json(&self, args: &[&str], markup: &str) -> Result<Value, EngineError> {
        let stdout = self.runner.run(args, markup.as_bytes()).await?;
        serde_json::from_slice(&stdout)
            .map_err(|err| EngineError::protocol(format!("checker printed invalid JSON: {err}")))
    }
}

#[async_trait]
impl TexChecker for CommandTexChecker {
    async fn feedback(
        &self,
        markup: &str,
        chemistry: bool,
    ) -> Result<CheckerFeedback, EngineError> {
        let mut args = vec![FEEDBACK_SUBCOMMAND];
        if chemistry {
            args.push(CHEMISTRY_FLAG);
        }
        let raw = self.run_json(&args, markup).await?;
        Ok(CheckerFeedback::from_value(raw))
    }

    async fn parse_tree(&self, markup: &str) -> Result<Value, EngineError> {
        self.run_json(&[GRAPH_SUBCOMMAND], markup).await
    }
}

/// Checker that accepts whatever KaTeX can parse. The canonical form is the
/// trimmed input. Chemistry markup is passed through unchecked.
#[derive(Debug, Clone, Copy, Default)]
pub struct KatexTexChecker;

#[async_trait]
impl TexChecker for KatexTexChecker {
    async fn feedback(
        &self,
        markup: &str,
        chemistry: bool,
    ) -> Result<CheckerFeedback, EngineError> {
        let markup = markup.to_string();
        let raw = tokio::task::spawn_blocking(move || check_with_katex(&markup, chemistry))
            .await
            .map_err(|err| EngineError::failed(format!("checker task failed: {err}")))?;
        Ok(CheckerFeedback::from_value(raw))
    }

    async fn parse_tree(&self, _markup: &str) -> Result<Value, EngineError> {
        Err(EngineError::unsupported(
            "graph output requires a command checker",
        ))
    }
}

fn check_with_katex(markup: &str, chemistry: bool) -> Value {
    let checked = markup.trim();
    if chemistry {
        return accepted(markup, checked);
    }

    let mut builder = OptsBuilder::default();
    builder.output_type(OutputType::Mathml);
    builder.throw_on_error(true);
    let result = builder
        .build()
        .map_err(|err| err.to_string())
        .and_then(|opts| katex::render_with_opts(checked, opts).map_err(|err| err.to_string()));

    match result {
        Ok(_) => accepted(markup, checked),
        Err(message) => json!({
            "success": false,
            "input": markup,
            "error": {
                "name": "ParseError",
                "message": message,
            },
        }),
    }
}

fn accepted(markup: &str, checked: &str) -> Value {
    json!({
        "success": true,
        "input": markup,
        "checked": checked,
    })
}
