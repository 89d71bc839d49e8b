use crate::canvas::{Canvas, Rect};
use crate::color::ColorSpec;
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::raster::PixelImage;

/// Produces solid-color rasters.
#[derive(Debug, Clone, Default)]
pub struct SolidColorImageFactory {
    config: RenderConfig,
}

impl SolidColorImageFactory {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    /// A 1x1 raster of `color`. Never fails.
    pub fn fill(&self, color: ColorSpec) -> PixelImage {
        match self.try_fill_sized(color, 1, 1) {
            Ok(image) => image,
            Err(e) => {
                // Only reachable with a zero canvas budget.
                log::warn!("1x1 fill could not get a canvas, building it directly: {}", e);
                PixelImage::single(color.to_rgba8(), self.config.scale_factor)
            }
        }
    }

    pub fn fill_sized(&self, color: ColorSpec, width: u32, height: u32) -> Option<PixelImage> {
        self.try_fill_sized(color, width, height)
            .map_err(|e| log::warn!("fill of {}x{} failed: {}", width, height, e))
            .ok()
    }

    pub fn try_fill_sized(&self, color: ColorSpec, width: u32, height: u32) -> RenderResult<PixelImage> {
        let mut canvas = Canvas::acquire(width, height, self.config.scale_factor, &self.config)?;
        canvas.fill_rect(Rect::from_size(width, height), color);
        canvas.extract()
    }
}

/// A 1x1 raster of `color` with default settings.
pub fn fill(color: ColorSpec) -> PixelImage {
    SolidColorImageFactory::default().fill(color)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_one_pixel() {
        let color = ColorSpec::new(0.25, 0.5, 0.75, 1.0);
        let img = fill(color);
        assert_eq!(img.dimensions(), (1, 1));
        assert_eq!(img.pixel(0, 0), color.to_rgba8());
        let [r, g, b, a] = img.pixel(0, 0).0.map(|c| c as f32 / 255.0);
        for (got, want) in [(r, 0.25), (g, 0.5), (b, 0.75), (a, 1.0)] {
            assert!((got - want).abs() <= 0.5 / 255.0 + f32::EPSILON);
        }
    }

    #[test]
    fn keeps_translucent_alpha() {
        let img = fill(ColorSpec::from_rgba8([1, 2, 3, 100]));
        assert_eq!(img.pixel(0, 0).0, [1, 2, 3, 100]);
    }

    #[test]
    fn survives_a_zero_budget() {
        let factory = SolidColorImageFactory::new(RenderConfig::default().with_max_canvas_pixels(0));
        assert_eq!(factory.fill(ColorSpec::WHITE).pixel(0, 0).0, [255, 255, 255, 255]);
        assert!(factory.fill_sized(ColorSpec::WHITE, 2, 2).is_none());
    }

    #[test]
    fn sized_fill_covers_every_pixel() {
        let img = SolidColorImageFactory::default()
            .fill_sized(ColorSpec::BLACK, 3, 5)
            .unwrap();
        assert!(img.pixels().pixels().all(|p| p.0 == [0, 0, 0, 255]));
    }
}
