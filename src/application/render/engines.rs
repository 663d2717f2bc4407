//! Contracts of the external collaborators the pipeline orchestrates.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

use crate::domain::capabilities::SpeechConfig;

use super::types::{CheckerFeedback, PixelSize, SemanticTree, TypesetOptions, TypesetOutput};

/// Failure reported by, or while reaching, a collaborator.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("failed to launch `{program}`: {message}")]
    Spawn { program: String, message: String },
    #[error("`{program}` exited with {exit_code:?}: {stderr}")]
    Exit {
        program: String,
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("unexpected response from engine: {0}")]
    Protocol(String),
    #[error("{0}")]
    Unsupported(String),
    #[error("{0}")]
    Failed(String),
}

impl EngineError {
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::Unsupported(message.into())
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }

    /// Whether the collaborator itself could not be reached or understood.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            EngineError::Spawn { .. } | EngineError::Exit { .. } | EngineError::Protocol(_)
        )
    }
}

#[async_trait]
pub trait TypesetEngine: Send + Sync {
    async fn typeset(&self, options: &TypesetOptions) -> Result<TypesetOutput, EngineError>;
}

#[async_trait]
pub trait TexChecker: Send + Sync {
    /// Validate `markup`, returning the checker's full feedback object.
    async fn feedback(&self, markup: &str, chemistry: bool)
    -> Result<CheckerFeedback, EngineError>;

    /// Compact parse tree of already sanitized markup.
    async fn parse_tree(&self, markup: &str) -> Result<Value, EngineError>;
}

#[async_trait]
pub trait Rasterizer: Send + Sync {
    async fn rasterize(&self, svg: &str, size: PixelSize) -> Result<Vec<u8>, EngineError>;
}

/// Speech engine. Configuration travels with every call; implementations keep
/// no per-request state.
#[async_trait]
pub trait SpeechEngine: Send + Sync {
    /// Semantic tree as JSON plus its XML serialization, compact when
    /// `config.min_stree` is set.
    async fn semantic_tree(
        &self,
        mathml: &str,
        config: &SpeechConfig,
    ) -> Result<SemanticTree, EngineError>;

    async fn speak(&self, mathml: &str, config: &SpeechConfig) -> Result<String, EngineError>;

    async fn enrich(&self, mathml: &str, config: &SpeechConfig) -> Result<String, EngineError>;
}

#[async_trait]
pub trait SvgOptimizer: Send + Sync {
    async fn optimize(&self, svg: &str) -> Result<String, EngineError>;
}

/// Shared collaborator handles.
#[derive(Clone)]
pub struct Collaborators {
    pub typesetter: Arc<dyn TypesetEngine>,
    pub checker: Arc<dyn TexChecker>,
    pub rasterizer: Arc<dyn Rasterizer>,
    pub speech: Arc<dyn SpeechEngine>,
    pub optimizer: Arc<dyn SvgOptimizer>,
}
