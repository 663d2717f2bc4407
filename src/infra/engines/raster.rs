use std::sync::Arc;

use async_trait::async_trait;
use resvg::{tiny_skia, usvg};

use crate::application::render::{EngineError, PixelSize, Rasterizer};

/// Largest raster edge accepted, in pixels.
const MAX_DIM: u32 = 16_384;

/// In-process rasterizer built on `resvg`.
#[derive(Clone)]
pub struct ResvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl ResvgRasterizer {
    /// Rasterizer with system fonts loaded for any `<text>` in the SVG.
    pub fn new() -> Self {
        let mut fontdb = usvg::fontdb::Database::new();
        fontdb.load_system_fonts();
        Self {
            fontdb: Arc::new(fontdb),
        }
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Rasterizer for ResvgRasterizer {
    async fn rasterize(&self, svg: &str, size: PixelSize) -> Result<Vec<u8>, EngineError> {
        let svg = svg.to_string();
        let fontdb = Arc::clone(&self.fontdb);
        tokio::task::spawn_blocking(move || rasterize_svg(&svg, size, fontdb))
            .await
            .map_err(|err| EngineError::failed(format!("raster task failed: {err}")))?
    }
}

fn rasterize_svg(
    svg: &str,
    size: PixelSize,
    fontdb: Arc<usvg::fontdb::Database>,
) -> Result<Vec<u8>, EngineError> {
    let width = to_px(size.width)?;
    let height = to_px(size.height)?;

    let options = usvg::Options {
        fontdb,
        ..usvg::Options::default()
    };
    let tree = usvg::Tree::from_str(svg, &options)
        .map_err(|err| EngineError::failed(format!("invalid SVG: {err}")))?;

    let mut pixmap = tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| EngineError::failed("failed to allocate raster pixmap"))?;

    let sx = width as f32 / tree.size().width();
    let sy = height as f32 / tree.size().height();
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(sx, sy),
        &mut pixmap.as_mut(),
    );

    pixmap
        .encode_png()
        .map_err(|err| EngineError::failed(format!("failed to encode PNG: {err}")))
}

fn to_px(value: f64) -> Result<u32, EngineError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(EngineError::failed(format!(
            "invalid raster dimension {value}"
        )));
    }
    let px = value.ceil().max(1.0);
    if px > f64::from(MAX_DIM) {
        return Err(EngineError::failed(format!(
            "raster dimension {px} exceeds {MAX_DIM}"
        )));
    }
    Ok(px as u32)
}
