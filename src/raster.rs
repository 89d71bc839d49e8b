use image::{GrayImage, Luma, Rgba, RgbaImage};

use crate::error::{RenderError, RenderResult};

/// An immutable straight-alpha RGBA raster with a device scale factor.
///
/// Width and height are always positive. The scale factor is positive and
/// finite; anything else is normalized to `1.0`.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelImage {
    pixels: RgbaImage,
    scale_factor: f32,
}

fn sanitize_scale(scale_factor: f32) -> f32 {
    if scale_factor.is_finite() && scale_factor > 0.0 {
        scale_factor
    } else {
        1.0
    }
}

impl PixelImage {
    /// Wraps a pixel buffer, rejecting empty ones.
    pub fn new(pixels: RgbaImage, scale_factor: f32) -> RenderResult<Self> {
        if pixels.width() == 0 || pixels.height() == 0 {
            return Err(RenderError::ExtractionFailure(format!(
                "raster has no pixels ({}x{})",
                pixels.width(),
                pixels.height()
            )));
        }
        Ok(Self {
            pixels,
            scale_factor: sanitize_scale(scale_factor),
        })
    }

    /// Builds a raster from row-major RGBA bytes.
    pub fn from_raw(width: u32, height: u32, scale_factor: f32, bytes: Vec<u8>) -> RenderResult<Self> {
        let len = bytes.len();
        let pixels = RgbaImage::from_raw(width, height, bytes).ok_or_else(|| {
            RenderError::ExtractionFailure(format!(
                "{} bytes cannot hold a {}x{} RGBA raster",
                len, width, height
            ))
        })?;
        Self::new(pixels, scale_factor)
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.pixels.dimensions()
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn is_square(&self) -> bool {
        self.width() == self.height()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
        *self.pixels.get_pixel(x, y)
    }

    pub fn pixels(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn into_pixels(self) -> RgbaImage {
        self.pixels
    }

    /// Same pixels, different scale factor.
    pub fn with_scale_factor(self, scale_factor: f32) -> Self {
        Self {
            scale_factor: sanitize_scale(scale_factor),
            ..self
        }
    }

    /// The alpha channel as a grayscale mask, row-major like the source.
    pub fn alpha_mask(&self) -> RenderResult<GrayImage> {
        let pixels = self.pixel_data()?;
        Ok(GrayImage::from_fn(pixels.width(), pixels.height(), |x, y| {
            Luma([pixels.get_pixel(x, y)[3]])
        }))
    }

    /// A 1x1 raster; cannot fail.
    pub(crate) fn single(pixel: Rgba<u8>, scale_factor: f32) -> Self {
        Self {
            pixels: RgbaImage::from_pixel(1, 1, pixel),
            scale_factor: sanitize_scale(scale_factor),
        }
    }

    /// Checks the buffer is complete before handing it to a canvas.
    pub(crate) fn pixel_data(&self) -> RenderResult<&RgbaImage> {
        let expected = (self.width() as usize)
            .checked_mul(self.height() as usize)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| RenderError::ExtractionFailure("raster size overflows".to_string()))?;
        if self.pixels.as_raw().len() < expected {
            return Err(RenderError::ExtractionFailure(
                "raster pixel data is truncated".to_string(),
            ));
        }
        Ok(&self.pixels)
    }
}
