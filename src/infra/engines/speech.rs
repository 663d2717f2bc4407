use async_trait::async_trait;
use serde_json::Value;

use crate::{
    application::render::{EngineError, SemanticTree, SpeechEngine},
    domain::capabilities::SpeechConfig,
};

use super::command::CommandRunner;

/// Speech engine driven through `speech`, `semantic-json`, `semantic-xml` and
/// `enrich` subcommands. MathML goes in on stdin.
#[derive(Debug, Clone)]
pub struct CommandSpeechEngine {
    runner: CommandRunner,
}

impl CommandSpeechEngine {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }

    async fn run(
        &self,
        subcommand: &str,
        mathml: &str,
        config: &SpeechConfig,
        flags: &[&str],
    ) -> Result<String, EngineError> {
        let mut args = vec![
            subcommand,
            "--domain",
            config.domain.as_str(),
            "--style",
            config.style.as_str(),
            "--locale",
            config.locale.as_str(),
        ];
        args.extend_from_slice(flags);
        self.runner.run_text(&args, mathml).await
    }
}

#[async_trait]
impl SpeechEngine for CommandSpeechEngine {
    async fn semantic_tree(
        &self,
        mathml: &str,
        config: &SpeechConfig,
    ) -> Result<SemanticTree, EngineError> {
        let json = self.run("semantic-json", mathml, config, &[]).await?;
        let json: Value = serde_json::from_str(&json).map_err(|err| {
            EngineError::protocol(format!("semantic tree is not valid JSON: {err}"))
        })?;

        let flags: &[&str] = if config.min_stree { &["--compact"] } else { &[] };
        let xml = self.run("semantic-xml", mathml, config, flags).await?;

        Ok(SemanticTree {
            json,
            xml: xml.trim_end().to_string(),
        })
    }

    async fn speak(&self, mathml: &str, config: &SpeechConfig) -> Result<String, EngineError> {
        let text = self.run("speech", mathml, config, &[]).await?;
        Ok(text.trim().to_string())
    }

    async fn enrich(&self, mathml: &str, config: &SpeechConfig) -> Result<String, EngineError> {
        let enriched = self.run("enrich", mathml, config, &[]).await?;
        Ok(enriched.trim_end().to_string())
    }
}
