use std::{sync::Arc, time::Instant};

use mathcast_api_types::Features;
use metrics::{counter, histogram};
use tracing::{debug, info};

use crate::domain::capabilities::Capabilities;

use super::{
    assemble::assemble,
    engines::Collaborators,
    error::RenderError,
    negotiate::{resolve_input_type, resolve_output_format},
    pipeline::{check_deferred, finalize, optimize_stage, raster_stage, speech_stage},
    plan::RenderPlan,
    sanitize::{SanitizeOutcome, sanitize},
    types::{RenderRequest, ResponsePayload, TypesetOptions, TypesetResult},
};

const METRIC_RENDER_TOTAL: &str = "mathcast_render_total";
const METRIC_RENDER_FAILURES: &str = "mathcast_render_failures_total";
const METRIC_RENDER_MS: &str = "mathcast_render_ms";

/// Render request pipeline shared by the HTTP and batch surfaces.
#[derive(Clone)]
pub struct MathRenderService {
    capabilities: Arc<Capabilities>,
    collaborators: Collaborators,
}

impl MathRenderService {
    pub fn new(capabilities: Arc<Capabilities>, collaborators: Collaborators) -> Self {
        Self {
            capabilities,
            collaborators,
        }
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.capabilities
    }

    /// Negotiate, check, typeset, post-process and shape one request.
    pub async fn render(&self, request: RenderRequest) -> Result<ResponsePayload, RenderError> {
        let started_at = Instant::now();
        let result = self.run(request).await;
        let elapsed_ms = started_at.elapsed().as_secs_f64() * 1000.0;

        let outcome = match &result {
            Ok(_) => "success",
            Err(err) => {
                counter!(METRIC_RENDER_FAILURES, "kind" => err.kind()).increment(1);
                debug!(
                    target = "mathcast::render",
                    kind = err.kind(),
                    error = %err,
                    elapsed_ms,
                    "Render failed"
                );
                "failure"
            }
        };
        counter!(METRIC_RENDER_TOTAL, "outcome" => outcome).increment(1);
        histogram!(METRIC_RENDER_MS).record(elapsed_ms);

        result
    }

    async fn run(&self, request: RenderRequest) -> Result<ResponsePayload, RenderError> {
        let RenderRequest {
            markup,
            input_type,
            output_format,
            features,
        } = request;

        if markup.is_empty() {
            return Err(RenderError::MissingQuery);
        }

        let capabilities = self.capabilities.as_ref();
        let input_type = resolve_input_type(input_type.as_deref())?;
        let output_format =
            resolve_output_format(output_format.as_deref(), input_type, capabilities)?;

        let (markup, sanitized) = match sanitize(
            self.collaborators.checker.as_ref(),
            markup,
            input_type,
            output_format,
            capabilities,
        )
        .await?
        {
            SanitizeOutcome::Continue { markup, sanitized } => (markup, sanitized),
            SanitizeOutcome::Graph(tree) => return Ok(ResponsePayload::Graph(tree)),
            SanitizeOutcome::InfoReport(feedback) => {
                return Ok(ResponsePayload::InfoReport(feedback));
            }
        };

        let features = features.unwrap_or(Features {
            speech: capabilities.speech_on,
        });
        let plan = RenderPlan::derive(input_type, output_format, features, capabilities);
        let options = TypesetOptions::from_plan(markup, &plan);

        let typeset_started_at = Instant::now();
        let output = self
            .collaborators
            .typesetter
            .typeset(&options)
            .await
            .map_err(|err| {
                if err.is_unavailable() {
                    RenderError::engine_unavailable("typesetter", err.to_string())
                } else {
                    RenderError::TypesetFailed(vec![err.to_string()])
                }
            })?;
        if !output.errors.is_empty() {
            return Err(RenderError::TypesetFailed(output.errors));
        }
        let typeset = TypesetResult::new(output, &options);
        debug!(
            target = "mathcast::render",
            typeset_ms = typeset_started_at.elapsed().as_millis() as u64,
            svg = typeset.svg.is_some(),
            mml = typeset.mml.is_some(),
            aux = typeset.aux.is_some(),
            "Typeset complete"
        );

        let enriched = raster_stage(
            self.collaborators.rasterizer.as_ref(),
            typeset,
            &plan,
            capabilities.dpi,
        )
        .await;
        check_deferred(&enriched)?;

        let enriched = speech_stage(
            self.collaborators.speech.as_ref(),
            enriched,
            &plan,
            &capabilities.speech_config,
        )
        .await?;

        let output = finalize(enriched, &plan, sanitized);
        let output = optimize_stage(
            self.collaborators.optimizer.as_ref(),
            output,
            capabilities.svgo,
        )
        .await;

        info!(
            target = "mathcast::render",
            input_type = %input_type,
            output_format = %output_format,
            speech = plan.wants_speech,
            raster = output.png.is_some(),
            "Render complete"
        );

        assemble(output, output_format)
    }
}
