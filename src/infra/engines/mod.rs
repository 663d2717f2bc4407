//! Collaborator adapters: in-process KaTeX and resvg, or external executables.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::{
    application::render::{
        Collaborators, EngineError, SemanticTree, SpeechEngine, SvgOptimizer, TexChecker,
        TypesetEngine,
    },
    config::{CommandSettings, EngineBackend, EngineSettings},
    domain::capabilities::SpeechConfig,
};

pub mod checker;
pub mod command;
pub mod optimize;
pub mod raster;
pub mod speech;
pub mod typeset;

use checker::{CommandTexChecker, KatexTexChecker};
use command::CommandRunner;
use optimize::CommandSvgOptimizer;
use raster::ResvgRasterizer;
use speech::CommandSpeechEngine;
use typeset::{CommandTypesetter, KatexTypesetter};

/// Stand-in for an optional collaborator that has no executable configured.
#[derive(Debug, Clone, Copy)]
pub struct Unconfigured {
    collaborator: &'static str,
}

impl Unconfigured {
    pub const fn new(collaborator: &'static str) -> Self {
        Self { collaborator }
    }

    fn error(&self) -> EngineError {
        EngineError::unsupported(format!("no {} engine is configured", self.collaborator))
    }
}

#[async_trait]
impl SpeechEngine for Unconfigured {
    async fn semantic_tree(
        &self,
        _mathml: &str,
        _config: &SpeechConfig,
    ) -> Result<SemanticTree, EngineError> {
        Err(self.error())
    }

    async fn speak(&self, _mathml: &str, _config: &SpeechConfig) -> Result<String, EngineError> {
        Err(self.error())
    }

    async fn enrich(&self, _mathml: &str, _config: &SpeechConfig) -> Result<String, EngineError> {
        Err(self.error())
    }
}

#[async_trait]
impl SvgOptimizer for Unconfigured {
    async fn optimize(&self, _svg: &str) -> Result<String, EngineError> {
        Err(self.error())
    }
}

/// Wire every collaborator according to `settings`.
pub fn build_collaborators(settings: &EngineSettings) -> Collaborators {
    let typesetter: Arc<dyn TypesetEngine> = match &settings.typesetter {
        EngineBackend::Katex => Arc::new(KatexTypesetter),
        EngineBackend::Command(command) => {
            Arc::new(CommandTypesetter::new(runner("typesetter", command)))
        }
    };

    let checker: Arc<dyn TexChecker> = match &settings.checker {
        EngineBackend::Katex => Arc::new(KatexTexChecker),
        EngineBackend::Command(command) => {
            Arc::new(CommandTexChecker::new(runner("checker", command)))
        }
    };

    let speech: Arc<dyn SpeechEngine> = match &settings.speech {
        Some(command) => Arc::new(CommandSpeechEngine::new(runner("speech", command))),
        None => Arc::new(Unconfigured::new("speech")),
    };

    let optimizer: Arc<dyn SvgOptimizer> = match &settings.svgo {
        Some(command) => Arc::new(CommandSvgOptimizer::new(runner("svgo", command))),
        None => Arc::new(Unconfigured::new("svgo")),
    };

    Collaborators {
        typesetter,
        checker,
        rasterizer: Arc::new(ResvgRasterizer::new()),
        speech,
        optimizer,
    }
}

fn runner(collaborator: &'static str, command: &CommandSettings) -> CommandRunner {
    info!(
        target = "mathcast::engines",
        collaborator,
        program = %command.program.display(),
        "using external engine"
    );
    CommandRunner::new(command.program.clone(), command.args.clone())
}
