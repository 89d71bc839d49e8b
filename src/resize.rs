use crate::canvas::{BlendMode, Canvas, Interpolation, Rect};
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::raster::PixelImage;

/// Resizes rasters through a canvas.
///
/// Without interpolation each destination pixel center is mapped back to
/// exactly one source pixel, so scaling up by an integer factor and back down
/// reproduces the input. With interpolation the configured
/// [`resize_filter`](RenderConfig::resize_filter) is used.
#[derive(Debug, Clone, Default)]
pub struct ImageGeometryTransformer {
    config: RenderConfig,
}

impl ImageGeometryTransformer {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn resize(&self, image: &PixelImage, target: (u32, u32), interpolate: bool) -> Option<PixelImage> {
        self.try_resize(image, target, interpolate)
            .map_err(|e| log::warn!("resize to {}x{} failed: {}", target.0, target.1, e))
            .ok()
    }

    pub fn try_resize(&self, image: &PixelImage, target: (u32, u32), interpolate: bool) -> RenderResult<PixelImage> {
        let source = image.pixel_data()?;
        let (width, height) = target;
        let mut canvas = Canvas::acquire(width, height, image.scale_factor(), &self.config)?;
        canvas.set_blend_mode(BlendMode::Copy);

        // Half turn, then mirror horizontally: net effect is y inverted about the canvas.
        canvas.translate(width as f64, height as f64);
        canvas.scale(-1.0, -1.0);
        canvas.translate(width as f64, 0.0);
        canvas.scale(-1.0, 1.0);

        let interpolation = if interpolate {
            Interpolation::Filtered(self.config.resize_filter)
        } else {
            Interpolation::Nearest
        };
        canvas.draw_image(Rect::from_size(width, height), source, interpolation)?;
        canvas.extract()
    }
}

/// Resizes with default settings.
pub fn resize(image: &PixelImage, target: (u32, u32), interpolate: bool) -> Option<PixelImage> {
    ImageGeometryTransformer::default().resize(image, target, interpolate)
}
