//! Post-typesetting stages. Each stage consumes the previous stage's value and
//! returns the next one; nothing here retains state between requests.

use metrics::counter;
use tracing::{debug, warn};

use crate::domain::capabilities::SpeechConfig;

use super::{
    engines::{Rasterizer, SpeechEngine, SvgOptimizer},
    error::RenderError,
    markup::{self, MarkupError},
    plan::RenderPlan,
    types::{EnrichedResult, PixelSize, RenderOutput, TypesetResult},
};

const METRIC_SVGO_FAILURES: &str = "mathcast_svgo_failures_total";

/// Pixels per `ex` at the rasterizer's reference resolution.
const PX_PER_EX: f64 = 6.0;
/// Reference resolution of the rasterizer.
const REFERENCE_DPI: f64 = 90.0;

const SUCCESS_LOG: &str = "success";

/// Pixel size of an SVG whose root dimensions are `width_ex` by `height_ex`.
pub fn raster_size(width_ex: f64, height_ex: f64, dpi: f64) -> PixelSize {
    let scale = dpi / REFERENCE_DPI;
    PixelSize {
        width: width_ex * PX_PER_EX * scale,
        height: height_ex * PX_PER_EX * scale,
    }
}

/// Rasterize the vector artifact when the plan asks for a raster and a usable
/// vector node exists. Failures are recorded on the result, not raised.
pub async fn raster_stage(
    rasterizer: &dyn Rasterizer,
    typeset: TypesetResult,
    plan: &RenderPlan,
    dpi: f64,
) -> EnrichedResult {
    let mut result = EnrichedResult::from(typeset);
    if !plan.wants_raster {
        return result;
    }

    let (Some(node), Some(svg)) = (&result.typeset.svg_node, &result.typeset.svg) else {
        return result;
    };

    let Some((width_ex, height_ex)) = node.size_in_ex() else {
        result.raster_error = Some(format!(
            "cannot rasterize SVG with dimensions {} x {}",
            node.width, node.height
        ));
        return result;
    };

    let size = raster_size(width_ex, height_ex, dpi);
    match rasterizer
        .rasterize(&markup::with_explicit_color(svg), size)
        .await
    {
        Ok(png) => {
            debug!(
                target = "mathcast::render::raster",
                width_px = size.width,
                height_px = size.height,
                png_bytes = png.len(),
                "SVG rasterized"
            );
            result.png = Some(png);
        }
        Err(err) => result.raster_error = Some(err.to_string()),
    }

    result
}

/// Raise a raster failure recorded by [`raster_stage`].
pub fn check_deferred(result: &EnrichedResult) -> Result<(), RenderError> {
    match &result.raster_error {
        Some(message) => Err(RenderError::RasterizationFailed(message.clone())),
        None => Ok(()),
    }
}

/// Attach semantic tree, speech text and accessibility annotations.
pub async fn speech_stage(
    speech: &dyn SpeechEngine,
    mut result: EnrichedResult,
    plan: &RenderPlan,
    config: &SpeechConfig,
) -> Result<EnrichedResult, RenderError> {
    if !plan.wants_speech {
        return Ok(result);
    }

    let Some(mathml) = result.typeset.mml.clone() else {
        return Err(RenderError::MissingMathMl);
    };
    if !result.typeset.has_any_node() {
        return Err(RenderError::NoSuitableOutput);
    }

    if config.semantic {
        let tree = speech
            .semantic_tree(&mathml, config)
            .await
            .map_err(|err| RenderError::SpeechFailed(err.to_string()))?;
        result.semantic_tree = Some(tree);
    }

    if !config.speak_text {
        return Ok(result);
    }

    let text = speech
        .speak(&mathml, config)
        .await
        .map_err(|err| RenderError::SpeechFailed(err.to_string()))?;

    let typeset = &mut result.typeset;
    if typeset.svg_node.is_some()
        && let Some(svg) = typeset.svg.as_deref()
    {
        typeset.svg = Some(markup::annotate_svg(svg, &text).map_err(speech_markup_error)?);
    }
    if typeset.aux_node.is_some()
        && let Some(aux) = typeset.aux.as_deref()
    {
        typeset.aux = Some(markup::annotate_aux(aux, &text).map_err(speech_markup_error)?);
    }
    if typeset.mml_node.is_some() {
        typeset.mml = Some(markup::annotate_mathml(&mathml, &text).map_err(speech_markup_error)?);
    }

    if config.enrich
        && let Some(mml) = typeset.mml.as_deref()
    {
        let enriched = speech
            .enrich(mml, config)
            .await
            .map_err(|err| RenderError::SpeechFailed(err.to_string()))?;
        typeset.mml = Some(enriched);
    }

    result.speak_text = Some(text);
    Ok(result)
}

fn speech_markup_error(err: MarkupError) -> RenderError {
    RenderError::SpeechFailed(err.to_string())
}

/// Convert the enriched result into its wire form. Node views are dropped here.
pub fn finalize(result: EnrichedResult, plan: &RenderPlan, sanitized: Option<String>) -> RenderOutput {
    let EnrichedResult {
        typeset,
        png,
        speak_text,
        semantic_tree,
        raster_error: _,
    } = result;

    let math_style = typeset.svg_node.as_ref().map(|node| node.math_style());
    let (stree_json, stree_xml) = match semantic_tree {
        Some(tree) => (Some(tree.json), Some(tree.xml)),
        None => (None, None),
    };
    let speech = plan.wants_speech.then(|| speak_text.clone()).flatten();

    RenderOutput {
        success: true,
        log: SUCCESS_LOG.to_string(),
        mml: typeset.mml,
        svg: typeset.svg,
        png,
        aux: typeset.aux,
        math_style,
        sanitized,
        speak_text,
        speech,
        stree_json,
        stree_xml,
    }
}

/// Minify the SVG when enabled. A failing optimizer leaves the SVG untouched.
pub async fn optimize_stage(
    optimizer: &dyn SvgOptimizer,
    mut output: RenderOutput,
    enabled: bool,
) -> RenderOutput {
    if !enabled {
        return output;
    }
    let Some(svg) = output.svg.as_deref() else {
        return output;
    };
    let svg_bytes = svg.len();

    match optimizer.optimize(svg).await {
        Ok(optimized) => output.svg = Some(optimized),
        Err(err) => {
            counter!(METRIC_SVGO_FAILURES).increment(1);
            warn!(
                target = "mathcast::render::svgo",
                error = %err,
                svg_bytes,
                "SVG optimization failed; keeping original SVG"
            );
        }
    }

    output
}
