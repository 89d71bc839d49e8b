//! Software drawing context.
//!
//! A [`Canvas`] is the crate's rasterizer: it owns an RGBA surface, a current
//! transformation matrix (CTM) and an optional clip mask, and draws with integer
//! blending on the CPU only. Identical inputs therefore produce identical bytes on
//! every machine.
//!
//! # Origin contract
//!
//! User space is y-up with its origin at the bottom-left corner of the surface,
//! while extracted rasters are row-major with row 0 at the top. [`Canvas::draw_image`]
//! and [`Canvas::clip_to_mask`] map buffer row `r` of their source to user-space
//! `y` in `[r, r + 1)` (scaled into the destination rect). Drawn without
//! correction, a source therefore comes out upside down; [`Canvas::flip_origin`]
//! installs the translate-and-invert transform that keeps it upright.
//!
//! The canvas is released when dropped, so every exit path of a drawing
//! operation gives its surface back.

use std::borrow::Cow;

use glam::{DAffine2, DVec2};
use image::imageops::{self, FilterType};
use image::{GrayImage, Rgba, RgbaImage};

use crate::color::ColorSpec;
use crate::config::RenderConfig;
use crate::error::{RenderError, RenderResult};
use crate::raster::PixelImage;

/// An axis-aligned rectangle in user space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    /// `(0, 0, width, height)`.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(0.0, 0.0, width as f64, height as f64)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    /// Position of `point` inside the rect, in rect units, or `None` outside.
    fn locate(&self, point: DVec2) -> Option<DVec2> {
        let local = point - DVec2::new(self.x, self.y);
        let inside = local.x >= 0.0
            && local.y >= 0.0
            && local.x < self.width
            && local.y < self.height;
        inside.then_some(local)
    }

    fn corners(&self) -> [DVec2; 4] {
        [
            DVec2::new(self.x, self.y),
            DVec2::new(self.x + self.width, self.y),
            DVec2::new(self.x, self.y + self.height),
            DVec2::new(self.x + self.width, self.y + self.height),
        ]
    }
}

/// How source pixels are sampled when an image is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interpolation {
    /// Nearest neighbor: each destination pixel takes exactly one source pixel.
    Nearest,
    /// Resample to the destination size with an `image` filter first.
    Filtered(FilterType),
}

/// How drawn pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BlendMode {
    /// Straight-alpha source-over.
    #[default]
    SourceOver,
    /// Replace the destination, color channels included, wherever the clip allows.
    Copy,
}

/// A CPU drawing context. See the module docs for the origin contract.
pub struct Canvas {
    surface: RgbaImage,
    scale_factor: f32,
    ctm: DAffine2,
    clip: Option<GrayImage>,
    blend_mode: BlendMode,
}

fn check_budget(width: u32, height: u32, config: &RenderConfig) -> RenderResult<usize> {
    if width == 0 || height == 0 {
        return Err(RenderError::ContextUnavailable(format!(
            "cannot draw into a {}x{} surface",
            width, height
        )));
    }
    let pixels = (width as u64) * (height as u64);
    if pixels > config.max_canvas_pixels {
        return Err(RenderError::ContextUnavailable(format!(
            "{}x{} exceeds the canvas budget of {} pixels",
            width, height, config.max_canvas_pixels
        )));
    }
    usize::try_from(pixels * 4)
        .map_err(|_| RenderError::ContextUnavailable("canvas size overflows".to_string()))
}

fn mul_div255(a: u8, b: u8) -> u8 {
    ((a as u32 * b as u32 + 127) / 255) as u8
}

/// Straight-alpha source-over with the source alpha scaled by `coverage`.
fn blend_over(dst: &mut Rgba<u8>, src: Rgba<u8>, coverage: u8) {
    let sa = mul_div255(src[3], coverage);
    if sa == 0 {
        return;
    }
    let da = dst[3] as u32;
    if sa == 255 || da == 0 {
        *dst = Rgba([src[0], src[1], src[2], sa]);
        return;
    }

    let sa = sa as u32;
    let inv = 255 - sa;
    let out = sa * 255 + da * inv;
    for c in 0..3 {
        let num = src[c] as u32 * sa * 255 + dst[c] as u32 * da * inv;
        dst[c] = ((num + out / 2) / out) as u8;
    }
    dst[3] = ((out + 127) / 255) as u8;
}

/// Resamples with associated alpha so hidden color never bleeds into visible pixels.
fn resample_premultiplied(image: &RgbaImage, width: u32, height: u32, filter: FilterType) -> RgbaImage {
    let mut premultiplied = image.clone();
    for px in premultiplied.pixels_mut() {
        let a = px[3];
        for c in 0..3 {
            px[c] = mul_div255(px[c], a);
        }
    }

    let mut resized = imageops::resize(&premultiplied, width, height, filter);
    for px in resized.pixels_mut() {
        let a = px[3] as u32;
        if a == 0 {
            *px = Rgba([0, 0, 0, 0]);
            continue;
        }
        for c in 0..3 {
            px[c] = ((px[c] as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
    resized
}

fn sample_nearest(image: &RgbaImage, local: DVec2, rect: &Rect) -> Rgba<u8> {
    let (w, h) = image.dimensions();
    let sx = ((local.x * w as f64 / rect.width).floor() as u32).min(w - 1);
    let sy = ((local.y * h as f64 / rect.height).floor() as u32).min(h - 1);
    *image.get_pixel(sx, sy)
}

impl Canvas {
    /// Acquires a private, transparent canvas.
    pub fn acquire(width: u32, height: u32, scale_factor: f32, config: &RenderConfig) -> RenderResult<Self> {
        Self::acquire_with_buffer(Vec::new(), width, height, scale_factor, config)
    }

    /// Acquires a canvas backed by a recycled allocation.
    pub(crate) fn acquire_with_buffer(
        mut buffer: Vec<u8>,
        width: u32,
        height: u32,
        scale_factor: f32,
        config: &RenderConfig,
    ) -> RenderResult<Self> {
        let len = check_budget(width, height, config)?;
        buffer.clear();
        buffer.resize(len, 0);
        let surface = RgbaImage::from_raw(width, height, buffer).ok_or_else(|| {
            RenderError::ContextUnavailable("surface allocation has the wrong size".to_string())
        })?;

        log::trace!("acquired {}x{} canvas", width, height);
        Ok(Self {
            surface,
            scale_factor,
            ctm: DAffine2::IDENTITY,
            clip: None,
            blend_mode: BlendMode::SourceOver,
        })
    }

    pub fn width(&self) -> u32 {
        self.surface.width()
    }

    pub fn height(&self) -> u32 {
        self.surface.height()
    }

    pub fn scale_factor(&self) -> f32 {
        self.scale_factor
    }

    pub fn ctm(&self) -> DAffine2 {
        self.ctm
    }

    /// Prepends `transform` to the CTM: user points go through it first.
    pub fn concat_ctm(&mut self, transform: DAffine2) {
        self.ctm = self.ctm * transform;
    }

    pub fn translate(&mut self, dx: f64, dy: f64) {
        self.concat_ctm(DAffine2::from_translation(DVec2::new(dx, dy)));
    }

    pub fn scale(&mut self, sx: f64, sy: f64) {
        self.concat_ctm(DAffine2::from_scale(DVec2::new(sx, sy)));
    }

    /// Maps row-major sources upright: translate by the height, then invert y.
    pub fn flip_origin(&mut self) {
        self.translate(0.0, self.height() as f64);
        self.scale(1.0, -1.0);
    }

    /// Intersects the clip with `mask` drawn into `rect`, sampled nearest.
    pub fn clip_to_mask(&mut self, rect: Rect, mask: &GrayImage) -> RenderResult<()> {
        if mask.width() == 0 || mask.height() == 0 {
            return Err(RenderError::ExtractionFailure("clip mask has no pixels".to_string()));
        }
        let mut coverage = GrayImage::new(self.width(), self.height());
        if let Some(inverse) = self.inverse_ctm() {
            if !rect.is_empty() {
                let height = self.height();
                let (w, h) = mask.dimensions();
                for (col, row, px) in coverage.enumerate_pixels_mut() {
                    let Some(local) = rect.locate(inverse.transform_point2(device_center(col, row, height)))
                    else {
                        continue;
                    };
                    let sx = ((local.x * w as f64 / rect.width).floor() as u32).min(w - 1);
                    let sy = ((local.y * h as f64 / rect.height).floor() as u32).min(h - 1);
                    px[0] = mask.get_pixel(sx, sy)[0];
                }
            }
        }

        if let Some(existing) = &self.clip {
            for (px, old) in coverage.pixels_mut().zip(existing.pixels()) {
                px[0] = mul_div255(px[0], old[0]);
            }
        }
        self.clip = Some(coverage);
        Ok(())
    }

    pub fn set_blend_mode(&mut self, blend_mode: BlendMode) {
        self.blend_mode = blend_mode;
    }

    /// Fills `rect` with `color`, honoring the CTM and clip.
    pub fn fill_rect(&mut self, rect: Rect, color: ColorSpec) {
        let rgba = color.to_rgba8();
        self.paint(rect, |_| rgba);
    }

    /// Draws `image` stretched over `rect`, honoring the CTM and clip.
    pub fn draw_image(&mut self, rect: Rect, image: &RgbaImage, interpolation: Interpolation) -> RenderResult<()> {
        if image.width() == 0 || image.height() == 0 {
            return Err(RenderError::ExtractionFailure("source image has no pixels".to_string()));
        }

        let source: Cow<'_, RgbaImage> = match interpolation {
            Interpolation::Nearest => Cow::Borrowed(image),
            Interpolation::Filtered(filter) => {
                let (dw, dh) = self.device_extent(&rect);
                if (dw, dh) == image.dimensions() {
                    Cow::Borrowed(image)
                } else {
                    log::debug!(
                        "resampling {}x{} -> {}x{} with {:?}",
                        image.width(),
                        image.height(),
                        dw,
                        dh,
                        filter
                    );
                    Cow::Owned(resample_premultiplied(image, dw, dh, filter))
                }
            }
        };

        self.paint(rect, |local| sample_nearest(&source, local, &rect));
        Ok(())
    }

    /// Copies the surface out as an immutable raster.
    pub fn extract(&self) -> RenderResult<PixelImage> {
        PixelImage::new(self.surface.clone(), self.scale_factor)
    }

    /// Hands the surface allocation back for reuse, leaving an empty canvas.
    pub(crate) fn take_buffer(&mut self) -> Vec<u8> {
        std::mem::replace(&mut self.surface, RgbaImage::new(0, 0)).into_raw()
    }

    fn inverse_ctm(&self) -> Option<DAffine2> {
        let det = self.ctm.matrix2.determinant();
        (det.is_finite() && det.abs() > f64::EPSILON).then(|| self.ctm.inverse())
    }

    /// Size in device pixels of `rect` under the CTM, at least 1x1.
    fn device_extent(&self, rect: &Rect) -> (u32, u32) {
        let points = rect.corners().map(|p| self.ctm.transform_point2(p));
        let (mut min, mut max) = (points[0], points[0]);
        for p in &points[1..] {
            min = min.min(*p);
            max = max.max(*p);
        }
        let extent = (max - min).round();
        ((extent.x as u32).max(1), (extent.y as u32).max(1))
    }

    fn paint<F>(&mut self, rect: Rect, mut shade: F)
    where
        F: FnMut(DVec2) -> Rgba<u8>,
    {
        if rect.is_empty() {
            return;
        }
        let Some(inverse) = self.inverse_ctm() else {
            log::debug!("skipping draw under a degenerate transform");
            return;
        };

        let height = self.surface.height();
        for (col, row, dst) in self.surface.enumerate_pixels_mut() {
            let Some(local) = rect.locate(inverse.transform_point2(device_center(col, row, height))) else {
                continue;
            };
            let coverage = self.clip.as_ref().map_or(255, |clip| clip.get_pixel(col, row)[0]);
            if coverage == 0 {
                continue;
            }
            let src = shade(local);
            match self.blend_mode {
                BlendMode::SourceOver => blend_over(dst, src, coverage),
                BlendMode::Copy => *dst = Rgba([src[0], src[1], src[2], mul_div255(src[3], coverage)]),
            }
        }
    }
}

/// Center of a device pixel in y-up device coordinates.
fn device_center(col: u32, row: u32, height: u32) -> DVec2 {
    DVec2::new(col as f64 + 0.5, (height - row) as f64 - 0.5)
}

impl Drop for Canvas {
    fn drop(&mut self) {
        log::trace!("released canvas");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
    const BLUE: Rgba<u8> = Rgba([0, 0, 255, 255]);

    /// Red top row, blue bottom row.
    fn two_rows() -> RgbaImage {
        RgbaImage::from_fn(3, 2, |_, y| if y == 0 { RED } else { BLUE })
    }

    fn canvas(width: u32, height: u32) -> Canvas {
        Canvas::acquire(width, height, 1.0, &RenderConfig::default()).unwrap()
    }

    #[test]
    fn acquire_rejects_empty_and_oversized_surfaces() {
        let config = RenderConfig::default().with_max_canvas_pixels(100);
        for (w, h) in [(0, 5), (5, 0), (11, 10)] {
            let err = Canvas::acquire(w, h, 1.0, &config).err().unwrap();
            assert!(err.is_retryable(), "{w}x{h} should be a context failure");
        }
        assert!(Canvas::acquire(10, 10, 1.0, &config).is_ok());
    }

    #[test]
    fn unflipped_draw_comes_out_upside_down() {
        let mut c = canvas(3, 2);
        c.draw_image(Rect::from_size(3, 2), &two_rows(), Interpolation::Nearest).unwrap();
        let out = c.extract().unwrap();
        assert_eq!(out.pixel(0, 0), BLUE);
        assert_eq!(out.pixel(0, 1), RED);
    }

    #[test]
    fn flipped_draw_keeps_orientation() {
        let mut c = canvas(3, 2);
        c.flip_origin();
        c.draw_image(Rect::from_size(3, 2), &two_rows(), Interpolation::Nearest).unwrap();
        assert_eq!(c.extract().unwrap().into_pixels(), two_rows());
    }

    #[test]
    fn half_turn_plus_mirror_equals_vertical_flip() {
        let (w, h) = (3.0, 2.0);
        let composed = DAffine2::from_translation(DVec2::new(w, h))
            * DAffine2::from_scale(DVec2::NEG_ONE)
            * DAffine2::from_translation(DVec2::new(w, 0.0))
            * DAffine2::from_scale(DVec2::new(-1.0, 1.0));
        let mut c = canvas(3, 2);
        c.flip_origin();
        assert_eq!(composed, c.ctm());
    }

    #[test]
    fn fill_respects_clip() {
        let mut c = canvas(2, 1);
        let mask = GrayImage::from_raw(2, 1, vec![0, 128]).unwrap();
        c.clip_to_mask(Rect::from_size(2, 1), &mask).unwrap();
        c.fill_rect(Rect::from_size(2, 1), ColorSpec::WHITE);
        let out = c.extract().unwrap();
        assert_eq!(out.pixel(0, 0), Rgba([0, 0, 0, 0]));
        assert_eq!(out.pixel(1, 0), Rgba([255, 255, 255, 128]));
    }

    #[test]
    fn copy_mode_keeps_hidden_color() {
        let src = RgbaImage::from_pixel(1, 1, Rgba([10, 20, 30, 0]));
        let mut c = canvas(1, 1);
        c.set_blend_mode(BlendMode::Copy);
        c.draw_image(Rect::from_size(1, 1), &src, Interpolation::Nearest).unwrap();
        assert_eq!(c.extract().unwrap().pixel(0, 0), Rgba([10, 20, 30, 0]));

        let mut c = canvas(1, 1);
        c.draw_image(Rect::from_size(1, 1), &src, Interpolation::Nearest).unwrap();
        assert_eq!(c.extract().unwrap().pixel(0, 0), Rgba([0, 0, 0, 0]));
    }

    #[test]
    fn degenerate_transform_draws_nothing() {
        let mut c = canvas(2, 2);
        c.scale(0.0, 1.0);
        c.fill_rect(Rect::from_size(2, 2), ColorSpec::BLACK);
        assert!(c.extract().unwrap().pixels().pixels().all(|p| p[3] == 0));
    }

    #[test]
    fn source_over_blends_straight_alpha() {
        let mut dst = Rgba([0, 0, 255, 255]);
        blend_over(&mut dst, Rgba([255, 0, 0, 128]), 255);
        assert_eq!(dst[3], 255);
        assert_eq!(dst[0], 128);
        assert_eq!(dst[2], 127);
    }

    #[test]
    fn filtered_draw_resamples_to_device_size() {
        let mut c = canvas(6, 4);
        c.flip_origin();
        c.draw_image(
            Rect::from_size(6, 4),
            &two_rows(),
            Interpolation::Filtered(FilterType::Triangle),
        )
        .unwrap();
        let out = c.extract().unwrap();
        assert_eq!(out.dimensions(), (6, 4));
        assert_eq!(out.pixel(0, 0), RED);
        assert_eq!(out.pixel(5, 3), BLUE);
    }

    #[test]
    fn filtered_draw_does_not_darken_transparent_edges() {
        let white = Rgba([255, 255, 255, 255]);
        let src = RgbaImage::from_fn(2, 1, |x, _| if x == 0 { white } else { Rgba([0, 0, 0, 0]) });
        let mut c = canvas(8, 1);
        c.set_blend_mode(BlendMode::Copy);
        c.flip_origin();
        c.draw_image(Rect::from_size(8, 1), &src, Interpolation::Filtered(FilterType::CatmullRom))
            .unwrap();
        let out = c.extract().unwrap();

        assert_eq!(out.pixel(0, 0), white);
        assert_eq!(out.pixel(7, 0), Rgba([0, 0, 0, 0]));
        assert!(out.pixels().pixels().any(|p| p[3] > 0 && p[3] < 255));
        for p in out.pixels().pixels().filter(|p| p[3] > 0) {
            assert_eq!([p[0], p[1], p[2]], [255, 255, 255], "{p:?}");
        }
    }

    #[test]
    fn take_buffer_leaves_an_empty_surface() {
        let mut c = canvas(4, 4);
        assert_eq!(c.take_buffer().len(), 64);
        assert_eq!(c.width(), 0);
    }
}
