#![forbid(unsafe_code)]
//! QR encoding primitive.
//!
//! This module turns payload bytes into a square grid of dark and light modules
//! ([`ModuleGrid`]) through the [`QrEncoder`] seam, and rasterizes that grid into a
//! black-on-white [`MonochromeBitmap`] with a quiet zone. The default encoder is
//! backed by the `qrcode` crate; any other implementation of the trait can stand in.

use ::qrcode::types::QrError;
use ::qrcode::{Color, EcLevel};
use image::{GrayImage, Luma};

use crate::error::{RenderError, RenderResult};

/// Error correction level for a QR code.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub enum QrCodeEcc {
    /// Tolerates ~7% erroneous codewords.
    Low,
    /// Tolerates ~15% erroneous codewords.
    Medium,
    /// Tolerates ~25% erroneous codewords.
    Quartile,
    /// Tolerates ~30% erroneous codewords.
    High,
}

impl QrCodeEcc {
    /// Returns an unsigned 2-bit integer (in the range 0 to 3).
    pub fn ordinal(self) -> usize {
        use QrCodeEcc::*;
        match self {
            Low => 0,
            Medium => 1,
            Quartile => 2,
            High => 3,
        }
    }

    /// The single-letter name used by the QR standard.
    pub fn letter(self) -> char {
        ['L', 'M', 'Q', 'H'][self.ordinal()]
    }

    fn ec_level(self) -> EcLevel {
        use QrCodeEcc::*;
        match self {
            Low => EcLevel::L,
            Medium => EcLevel::M,
            Quartile => EcLevel::Q,
            High => EcLevel::H,
        }
    }
}

/// A QR code version (1–40).
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Version(u8);

impl Version {
    /// The minimum version number supported in the QR Code Model 2 standard.
    pub const MIN: Version = Version(1);

    /// The maximum version number supported in the QR Code Model 2 standard.
    pub const MAX: Version = Version(40);

    /// Returns the version whose symbol is `size` modules wide, if any.
    pub fn from_size(size: u32) -> Option<Self> {
        if size < 21 || (size - 17) % 4 != 0 {
            return None;
        }
        let ver = (size - 17) / 4;
        (ver <= Self::MAX.0 as u32).then_some(Self(ver as u8))
    }

    /// Returns the value, which is in the range [1, 40].
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Width and height of a symbol of this version, in modules.
    pub const fn size(self) -> u32 {
        self.0 as u32 * 4 + 17
    }
}

/// A square grid of dark and light modules, without quiet zone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleGrid {
    size: u32,
    dark: Vec<bool>,
}

impl ModuleGrid {
    /// Builds a grid from row-major module colors (`true` = dark).
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ExtractionFailure`] if `size` is zero or `dark` does not
    /// hold exactly `size * size` modules.
    pub fn new(size: u32, dark: Vec<bool>) -> RenderResult<Self> {
        let expected = (size as usize).checked_mul(size as usize);
        if size == 0 || expected != Some(dark.len()) {
            return Err(RenderError::ExtractionFailure(format!(
                "{} modules do not form a {}x{} grid",
                dark.len(),
                size,
                size
            )));
        }
        Ok(Self { size, dark })
    }

    /// The width and height of this grid, measured in modules.
    pub fn size(&self) -> u32 {
        self.size
    }

    /// The version matching this grid's size, when it is a standard QR symbol.
    pub fn version(&self) -> Option<Version> {
        Version::from_size(self.size)
    }

    /// Returns the color of the module at the given coordinates.
    ///
    /// Returns `true` for dark modules and `false` for light modules. Coordinates outside the
    /// grid's bounds return `false`, so callers can walk a quiet zone with negative offsets.
    ///
    /// # Arguments
    ///
    /// * `x` - X-coordinate (0 is left).
    /// * `y` - Y-coordinate (0 is top).
    pub fn get_module(&self, x: i32, y: i32) -> bool {
        let range = 0..self.size as i32;
        range.contains(&x)
            && range.contains(&y)
            && self.dark[y as usize * self.size as usize + x as usize]
    }

    /// Number of dark modules.
    pub fn dark_count(&self) -> usize {
        self.dark.iter().filter(|&&d| d).count()
    }
}

/// Encodes payload bytes into a module grid.
///
/// Implementations must be deterministic: the same payload and level always yield
/// the same grid.
pub trait QrEncoder: Send + Sync {
    fn encode(&self, payload: &[u8], ecc: QrCodeEcc) -> RenderResult<ModuleGrid>;
}

impl<F> QrEncoder for F
where
    F: Fn(&[u8], QrCodeEcc) -> RenderResult<ModuleGrid> + Send + Sync,
{
    fn encode(&self, payload: &[u8], ecc: QrCodeEcc) -> RenderResult<ModuleGrid> {
        self(payload, ecc)
    }
}

/// The default encoder, backed by the `qrcode` crate.
///
/// The smallest version that fits the payload at the requested level is chosen.
///
/// # Example
///
/// ```rust
/// use qrsynth::qrcode::{QrCodeEcc, QrEncoder, QrcodeEncoder};
///
/// let grid = QrcodeEncoder.encode(b"Hello, World!", QrCodeEcc::High).unwrap();
/// assert!(grid.version().is_some());
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder;

impl QrEncoder for QrcodeEncoder {
    fn encode(&self, payload: &[u8], ecc: QrCodeEcc) -> RenderResult<ModuleGrid> {
        let code = ::qrcode::QrCode::with_error_correction_level(payload, ecc.ec_level()).map_err(|e| match e {
            QrError::DataTooLong => RenderError::CapacityExceeded { len: payload.len() },
            other => RenderError::ExtractionFailure(format!("QR encoder rejected payload: {}", other)),
        })?;

        let size = u32::try_from(code.width())
            .map_err(|_| RenderError::ExtractionFailure("QR symbol too wide".to_string()))?;
        let dark = code.to_colors().into_iter().map(|c| c == Color::Dark).collect();
        log::debug!(
            "encoded {} bytes at level {} into a {}x{} grid",
            payload.len(),
            ecc.letter(),
            size,
            size
        );
        ModuleGrid::new(size, dark)
    }
}

/// A rasterized module grid: dark modules black, light modules and quiet zone white.
#[derive(Debug, Clone, PartialEq)]
pub struct MonochromeBitmap {
    image: GrayImage,
    module_size: u32,
    quiet_zone: u32,
}

impl MonochromeBitmap {
    /// Luminance of an "on" (dark) module.
    pub const ON: u8 = 0;
    /// Luminance of an "off" (light) module.
    pub const OFF: u8 = 255;

    /// Renders `grid` at `module_size` pixels per module with a `quiet_zone`-module border.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::ContextUnavailable`] if the bitmap side length overflows.
    pub fn render(grid: &ModuleGrid, module_size: u32, quiet_zone: u32) -> RenderResult<Self> {
        let module_size = module_size.max(1);
        let side = Self::side_for(grid, module_size, quiet_zone)?;

        let mut image = GrayImage::new(side, side);
        let border = quiet_zone as i32;
        for (x, y, pixel) in image.enumerate_pixels_mut() {
            let qr_x = (x / module_size) as i32 - border;
            let qr_y = (y / module_size) as i32 - border;
            *pixel = if grid.get_module(qr_x, qr_y) {
                Luma([Self::ON])
            } else {
                Luma([Self::OFF])
            };
        }

        Ok(Self {
            image,
            module_size,
            quiet_zone,
        })
    }

    /// Side length in pixels of the bitmap [`render`](Self::render) would produce.
    pub fn side_for(grid: &ModuleGrid, module_size: u32, quiet_zone: u32) -> RenderResult<u32> {
        quiet_zone
            .checked_mul(2)
            .and_then(|border| border.checked_add(grid.size()))
            .and_then(|modules| modules.checked_mul(module_size.max(1)))
            .ok_or_else(|| RenderError::ContextUnavailable("bitmap side overflows".to_string()))
    }

    /// Side length in pixels.
    pub fn side(&self) -> u32 {
        self.image.width()
    }

    pub fn module_size(&self) -> u32 {
        self.module_size
    }

    pub fn quiet_zone(&self) -> u32 {
        self.quiet_zone
    }

    pub fn image(&self) -> &GrayImage {
        &self.image
    }

    pub fn into_image(self) -> GrayImage {
        self.image
    }

    /// Whether the pixel at `(x, y)` belongs to a dark module.
    pub fn is_on(&self, x: u32, y: u32) -> bool {
        self.image.get_pixel(x, y)[0] == Self::ON
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checker(size: u32) -> ModuleGrid {
        let dark = (0..size * size).map(|i| (i % size + i / size) % 2 == 0).collect();
        ModuleGrid::new(size, dark).unwrap()
    }

    #[test]
    fn grid_rejects_mismatched_modules() {
        assert!(ModuleGrid::new(0, vec![]).is_err());
        assert!(ModuleGrid::new(3, vec![true; 8]).is_err());
    }

    #[test]
    fn out_of_range_modules_are_light() {
        let grid = checker(3);
        assert!(grid.get_module(0, 0));
        assert!(!grid.get_module(-1, 0));
        assert!(!grid.get_module(0, 3));
    }

    #[test]
    fn version_follows_size() {
        assert_eq!(Version::from_size(21), Some(Version::MIN));
        assert_eq!(Version::from_size(177), Some(Version::MAX));
        assert_eq!(Version::from_size(22), None);
        assert_eq!(Version::MAX.size(), 177);
    }

    #[test]
    fn encodes_at_high_level() {
        let grid = QrcodeEncoder.encode(b"https://example.com", QrCodeEcc::High).unwrap();
        let version = grid.version().unwrap();
        assert_eq!(version.size(), grid.size());
        assert!(grid.dark_count() > 0);
    }

    #[test]
    fn encoding_is_deterministic() {
        let a = QrcodeEncoder.encode(b"same input", QrCodeEcc::High).unwrap();
        let b = QrcodeEncoder.encode(b"same input", QrCodeEcc::High).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn oversized_payload_exceeds_capacity() {
        // Version 40 at level H holds 1273 bytes in byte mode.
        let payload = vec![0xA5u8; 1274];
        let err = QrcodeEncoder.encode(&payload, QrCodeEcc::High).unwrap_err();
        assert!(matches!(err, RenderError::CapacityExceeded { len: 1274 }));
        assert!(QrcodeEncoder.encode(&payload[..1273], QrCodeEcc::High).is_ok());
    }

    #[test]
    fn bitmap_includes_quiet_zone_and_module_size() {
        let grid = checker(3);
        let bitmap = MonochromeBitmap::render(&grid, 2, 1).unwrap();
        assert_eq!(bitmap.side(), (3 + 2) * 2);
        assert!(!bitmap.is_on(0, 0));
        assert!(!bitmap.is_on(1, 1));
        assert!(bitmap.is_on(2, 2));
        assert!(bitmap.is_on(3, 3));
        assert!(!bitmap.is_on(4, 2));
    }

    #[test]
    fn closures_are_encoders() {
        let reject = |_: &[u8], _: QrCodeEcc| -> RenderResult<ModuleGrid> {
            Err(RenderError::ExtractionFailure("no".into()))
        };
        assert!(reject.encode(b"x", QrCodeEcc::Low).is_err());
    }

    #[test]
    fn ecc_letters() {
        assert_eq!(QrCodeEcc::High.letter(), 'H');
        assert_eq!(QrCodeEcc::Low.ordinal(), 0);
    }
}
