//! QR image synthesis.
//!
//! [`QrSynthesizer`] encodes a payload at error correction level H, runs the
//! stencil stages from [`crate::pipeline`], draws the result through a canvas
//! checked out of a [`RenderContext`](crate::context) and extracts the final
//! raster. The context is locked for the whole sequence, so synthesizers
//! sharing the process-wide context render one at a time.

use crate::canvas::{Interpolation, Rect};
use crate::color::ColorSpec;
use crate::config::RenderConfig;
use crate::context::{self, RenderContext, SharedContext};
use crate::error::RenderResult;
use crate::pipeline;
use crate::qrcode::{MonochromeBitmap, QrCodeEcc, QrEncoder, QrcodeEncoder};
use crate::raster::PixelImage;

/// Synthesis always uses the highest standard redundancy.
pub const SYNTHESIS_ECC: QrCodeEcc = QrCodeEcc::High;

/// Turns payload bytes and a color into a QR raster.
///
/// # Example
///
/// ```rust
/// use qrsynth::{ColorSpec, QrSynthesizer};
///
/// let qr = QrSynthesizer::new()
///     .synthesize(b"https://example.com", ColorSpec::BLACK)
///     .unwrap();
/// assert!(qr.is_square());
/// ```
pub struct QrSynthesizer<E = QrcodeEncoder> {
    encoder: E,
    config: RenderConfig,
    context: SharedContext,
}

impl QrSynthesizer {
    /// A synthesizer on the process-wide shared context.
    pub fn new() -> Self {
        Self::with_encoder(QrcodeEncoder)
    }

    /// A synthesizer with a context of its own, never contended by other instances.
    pub fn with_private_context() -> Self {
        Self {
            encoder: QrcodeEncoder,
            config: RenderConfig::default(),
            context: context::private(),
        }
    }
}

impl Default for QrSynthesizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: QrEncoder> QrSynthesizer<E> {
    /// A synthesizer on the shared context using a custom encoder.
    pub fn with_encoder(encoder: E) -> Self {
        Self {
            encoder,
            config: RenderConfig::default(),
            context: context::shared(),
        }
    }

    pub fn with_config(mut self, config: RenderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Synthesizes a QR raster, or `None` on any failure.
    ///
    /// With a visible `color`, "on" modules are painted in it and everything else
    /// is transparent. With a transparent `color` the output is a plain stencil:
    /// opaque black modules on transparent, the color ignored.
    pub fn synthesize(&self, payload: &[u8], color: ColorSpec) -> Option<PixelImage> {
        self.try_synthesize(payload, color)
            .map_err(|e| log::warn!("QR synthesis failed: {}", e))
            .ok()
    }

    /// Like [`synthesize`](Self::synthesize) but reports why it failed.
    pub fn try_synthesize(&self, payload: &[u8], color: ColorSpec) -> RenderResult<PixelImage> {
        let mut context = context::lock(&self.context);
        self.render_locked(&mut context, payload, color)
    }

    fn render_locked(&self, context: &mut RenderContext, payload: &[u8], color: ColorSpec) -> RenderResult<PixelImage> {
        let grid = self.encoder.encode(payload, SYNTHESIS_ECC)?;
        let side = MonochromeBitmap::side_for(&grid, self.config.module_size, self.config.quiet_zone)?;
        let mut canvas = context.begin(side, side, self.config.scale_factor, &self.config)?;

        let bitmap = MonochromeBitmap::render(&grid, self.config.module_size, self.config.quiet_zone)?;
        let raster = if color.is_transparent() {
            log::debug!("transparent color, emitting stencil only");
            pipeline::stencil_from_bitmap(&bitmap).to_rgba()
        } else {
            let stencil = pipeline::stencil_by_double_inversion(&bitmap);
            pipeline::false_color(&stencil, color).into_image()
        };

        canvas.flip_origin();
        canvas.draw_image(Rect::from_size(side, side), &raster, Interpolation::Nearest)?;
        let image = canvas.extract()?;
        log::debug!("synthesized {}x{} QR from {} bytes", side, side, payload.len());
        Ok(image)
    }

    #[cfg(test)]
    fn context_is_idle(&self) -> bool {
        context::lock(&self.context).is_idle()
    }
}

/// Synthesizes with default settings on the shared context.
pub fn synthesize(payload: &[u8], color: ColorSpec) -> Option<PixelImage> {
    QrSynthesizer::new().synthesize(payload, color)
}

/// Shared-context render counter, for diagnostics.
pub fn shared_render_count() -> u64 {
    context::lock(&context::shared()).renders()
}
