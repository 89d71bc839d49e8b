use crate::canvas::{Canvas, Rect};
use crate::color::ColorSpec;
use crate::config::RenderConfig;
use crate::error::RenderResult;
use crate::raster::PixelImage;

/// Recolors a raster while keeping its alpha channel exactly.
///
/// The canvas is filled with the color's opaque RGB through a clip built from the
/// source alpha, so partial (antialiased) alpha survives pixel-for-pixel. The
/// color's own alpha does not attenuate the result.
///
/// # Example
///
/// ```rust
/// use qrsynth::{fill, tint, ColorSpec};
///
/// let dot = fill(ColorSpec::from_rgba8([0, 0, 0, 90]));
/// let red = tint(&dot, ColorSpec::from_rgba8([255, 0, 0, 255])).unwrap();
/// assert_eq!(red.pixel(0, 0).0, [255, 0, 0, 90]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct AlphaMaskTinter {
    config: RenderConfig,
}

impl AlphaMaskTinter {
    pub fn new(config: RenderConfig) -> Self {
        Self { config }
    }

    pub fn tint(&self, image: &PixelImage, color: ColorSpec) -> Option<PixelImage> {
        self.try_tint(image, color)
            .map_err(|e| log::warn!("tint failed: {}", e))
            .ok()
    }

    pub fn try_tint(&self, image: &PixelImage, color: ColorSpec) -> RenderResult<PixelImage> {
        let mask = image.alpha_mask()?;
        let (width, height) = image.dimensions();
        let rect = Rect::from_size(width, height);

        let mut canvas = Canvas::acquire(width, height, image.scale_factor(), &self.config)?;
        canvas.flip_origin();
        canvas.clip_to_mask(rect, &mask)?;
        canvas.fill_rect(rect, color.opaque());
        canvas.extract()
    }
}

/// Tints with default settings.
pub fn tint(image: &PixelImage, color: ColorSpec) -> Option<PixelImage> {
    AlphaMaskTinter::default().tint(image, color)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use proptest::prelude::*;

    fn image_from(width: u32, height: u32, bytes: Vec<u8>) -> PixelImage {
        PixelImage::from_raw(width, height, 2.0, bytes).unwrap()
    }

    #[test]
    fn keeps_geometry_and_scale() {
        let src = image_from(3, 2, vec![255; 24]);
        let out = tint(&src, ColorSpec::BLACK).unwrap();
        assert_eq!(out.dimensions(), (3, 2));
        assert_eq!(out.scale_factor(), 2.0);
    }

    #[test]
    fn is_not_mirrored() {
        // Opaque top row, transparent bottom row.
        let pixels = RgbaImage::from_fn(2, 2, |_, y| if y == 0 { Rgba([1, 2, 3, 255]) } else { Rgba([1, 2, 3, 0]) });
        let src = PixelImage::new(pixels, 1.0).unwrap();
        let out = tint(&src, ColorSpec::WHITE).unwrap();
        assert_eq!(out.pixel(0, 0).0, [255, 255, 255, 255]);
        assert_eq!(out.pixel(0, 1).0, [0, 0, 0, 0]);
    }

    #[test]
    fn color_alpha_does_not_attenuate() {
        let src = image_from(1, 1, vec![0, 0, 0, 77]);
        let out = tint(&src, ColorSpec::from_rgba8([9, 8, 7, 10])).unwrap();
        assert_eq!(out.pixel(0, 0).0, [9, 8, 7, 77]);
    }

    #[test]
    fn oversized_source_cannot_get_a_canvas() {
        let tinter = AlphaMaskTinter::new(RenderConfig::default().with_max_canvas_pixels(3));
        assert!(tinter.tint(&image_from(2, 2, vec![255; 16]), ColorSpec::BLACK).is_none());
    }

    fn arb_image() -> impl Strategy<Value = PixelImage> {
        (1u32..8, 1u32..8).prop_flat_map(|(w, h)| {
            proptest::collection::vec(any::<u8>(), (w * h * 4) as usize)
                .prop_map(move |bytes| image_from(w, h, bytes))
        })
    }

    proptest! {
        #[test]
        fn alpha_is_preserved_and_rgb_replaced(src in arb_image(), rgb in any::<[u8; 3]>()) {
            let color = ColorSpec::from_rgba8([rgb[0], rgb[1], rgb[2], 255]);
            let out = tint(&src, color).unwrap();
            for (s, o) in src.pixels().pixels().zip(out.pixels().pixels()) {
                prop_assert_eq!(s[3], o[3]);
                if o[3] > 0 {
                    prop_assert_eq!([o[0], o[1], o[2]], rgb);
                }
            }
        }
    }
}
