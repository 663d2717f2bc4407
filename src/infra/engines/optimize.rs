use async_trait::async_trait;

use crate::application::render::{EngineError, SvgOptimizer};

use super::command::CommandRunner;

/// SVG optimizer reading SVG on stdin and printing the optimized SVG.
#[derive(Debug, Clone)]
pub struct CommandSvgOptimizer {
    runner: CommandRunner,
}

impl CommandSvgOptimizer {
    pub fn new(runner: CommandRunner) -> Self {
        Self { runner }
    }
}

#[async_trait]
impl SvgOptimizer for CommandSvgOptimizer {
    async fn optimize(&self, svg: &str) -> Result<String, EngineError> {
        let optimized = self.runner.run_text(&[], svg).await?;
        let optimized = optimized.trim();
        if !optimized.starts_with('<') {
            return Err(EngineError::protocol("optimizer did not print SVG markup"));
        }
        Ok(optimized.to_string())
    }
}
