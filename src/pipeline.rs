//! Pure stages that turn a [`MonochromeBitmap`] into an alpha-aware raster.
//!
//! The colored path runs four stages in order:
//!
//! ```text
//! MonochromeBitmap --invert--> GrayImage --mask_to_alpha--> AlphaStencil
//!     --invert_stencil--> AlphaStencil --false_color--> ColoredRaster
//! ```
//!
//! Inverting first makes "on" modules bright, so reading luminance as alpha
//! yields a stencil that is opaque exactly on those modules. The second
//! inversion restores dark-on-light color while the alpha rides along. The
//! stencil-only path skips all of that with [`stencil_from_bitmap`], which
//! produces the same stencil in one step.

use image::{imageops, GrayAlphaImage, GrayImage, LumaA, Rgba, RgbaImage};

use crate::color::ColorSpec;
use crate::qrcode::MonochromeBitmap;

/// A gray raster whose alpha marks the "on" modules.
#[derive(Debug, Clone, PartialEq)]
pub struct AlphaStencil(GrayAlphaImage);

impl AlphaStencil {
    pub fn image(&self) -> &GrayAlphaImage {
        &self.0
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.0.dimensions()
    }

    /// Expands to RGBA, gray copied to each color channel.
    pub fn to_rgba(&self) -> RgbaImage {
        RgbaImage::from_fn(self.0.width(), self.0.height(), |x, y| {
            let LumaA([l, a]) = *self.0.get_pixel(x, y);
            Rgba([l, l, l, a])
        })
    }
}

/// The final, colored output of the stage chain.
#[derive(Debug, Clone, PartialEq)]
pub struct ColoredRaster(RgbaImage);

impl ColoredRaster {
    pub fn image(&self) -> &RgbaImage {
        &self.0
    }

    pub fn into_image(self) -> RgbaImage {
        self.0
    }
}

fn mul_div255(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}

/// Stage (a): swaps dark and light.
pub fn invert(bitmap: &MonochromeBitmap) -> GrayImage {
    let mut inverted = bitmap.image().clone();
    imageops::invert(&mut inverted);
    inverted
}

/// Stage (b): white everywhere, alpha taken from luminance.
pub fn mask_to_alpha(luminance: &GrayImage) -> AlphaStencil {
    let stencil = GrayAlphaImage::from_fn(luminance.width(), luminance.height(), |x, y| {
        LumaA([u8::MAX, luminance.get_pixel(x, y)[0]])
    });
    AlphaStencil(stencil)
}

/// Stage (c): inverts gray, keeps alpha.
pub fn invert_stencil(stencil: AlphaStencil) -> AlphaStencil {
    let mut image = stencil.0;
    imageops::invert(&mut image);
    AlphaStencil(image)
}

/// Stage (d): dark stencil pixels take `color`, light ones become transparent.
///
/// Gray levels in between blend toward transparent, and the result is further
/// attenuated by the stencil's own alpha. Fully transparent output is stored as
/// `(0, 0, 0, 0)`.
pub fn false_color(stencil: &AlphaStencil, color: ColorSpec) -> ColoredRaster {
    let Rgba([r, g, b, ca]) = color.to_rgba8();
    let raster = RgbaImage::from_fn(stencil.0.width(), stencil.0.height(), |x, y| {
        let LumaA([l, sa]) = *stencil.0.get_pixel(x, y);
        let alpha = mul_div255(mul_div255(ca, u8::MAX - l), sa);
        if alpha == 0 {
            Rgba([0, 0, 0, 0])
        } else {
            Rgba([r, g, b, alpha])
        }
    });
    ColoredRaster(raster)
}

/// Converts a bitmap straight into a stencil: "on" opaque black, "off" transparent.
pub fn stencil_from_bitmap(bitmap: &MonochromeBitmap) -> AlphaStencil {
    let image = bitmap.image();
    let stencil = GrayAlphaImage::from_fn(image.width(), image.height(), |x, y| {
        if bitmap.is_on(x, y) {
            LumaA([0, u8::MAX])
        } else {
            LumaA([0, 0])
        }
    });
    AlphaStencil(stencil)
}

/// Runs stages (a) through (c).
pub fn stencil_by_double_inversion(bitmap: &MonochromeBitmap) -> AlphaStencil {
    invert_stencil(mask_to_alpha(&invert(bitmap)))
}
