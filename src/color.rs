use core::str::FromStr;

use image::Rgba;

use crate::error::ParseColorError;

/// Alpha values at or below this are treated as fully transparent.
///
/// This is the smallest positive magnitude an `f32` can represent, so any alpha
/// the caller meant as visible, however faint, takes the colored path.
pub const ALPHA_EPSILON: f32 = f32::from_bits(1);

/// A normalized RGBA color with every component in `[0, 1]`.
///
/// Components are clamped on construction and `NaN` becomes `0.0`, so a
/// `ColorSpec` can always be quantized without surprises.
///
/// # Example
///
/// ```rust
/// use qrsynth::ColorSpec;
///
/// let orange: ColorSpec = "#FFA500".parse().unwrap();
/// assert_eq!(orange.to_rgba8().0, [255, 165, 0, 255]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorSpec {
    red: f32,
    green: f32,
    blue: f32,
    alpha: f32,
}

fn unit(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl ColorSpec {
    pub const BLACK: Self = Self { red: 0.0, green: 0.0, blue: 0.0, alpha: 1.0 };
    pub const WHITE: Self = Self { red: 1.0, green: 1.0, blue: 1.0, alpha: 1.0 };
    pub const CLEAR: Self = Self { red: 0.0, green: 0.0, blue: 0.0, alpha: 0.0 };

    pub fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red: unit(red),
            green: unit(green),
            blue: unit(blue),
            alpha: unit(alpha),
        }
    }

    pub fn from_rgba8(rgba: [u8; 4]) -> Self {
        let [r, g, b, a] = rgba.map(|c| c as f32 / 255.0);
        Self::new(r, g, b, a)
    }

    pub fn red(&self) -> f32 {
        self.red
    }

    pub fn green(&self) -> f32 {
        self.green
    }

    pub fn blue(&self) -> f32 {
        self.blue
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Whether the alpha is indistinguishable from zero.
    pub fn is_transparent(&self) -> bool {
        self.alpha <= ALPHA_EPSILON
    }

    /// The same color with alpha forced to 1.
    pub fn opaque(self) -> Self {
        Self { alpha: 1.0, ..self }
    }

    /// Quantizes to straight-alpha 8-bit RGBA, rounding to nearest.
    pub fn to_rgba8(&self) -> Rgba<u8> {
        let q = |c: f32| (c * 255.0).round() as u8;
        Rgba([q(self.red), q(self.green), q(self.blue), q(self.alpha)])
    }
}

impl FromStr for ColorSpec {
    type Err = ParseColorError;

    /// Parses `#RRGGBB` or `#RRGGBBAA`; the `#` is optional.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 && hex.len() != 8 {
            return Err(ParseColorError::Length(hex.len()));
        }
        if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(ParseColorError::Digit(hex.to_string()));
        }

        let mut rgba = [255u8; 4];
        for (i, slot) in rgba.iter_mut().take(hex.len() / 2).enumerate() {
            *slot = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
                .map_err(|_| ParseColorError::Digit(hex.to_string()))?;
        }
        Ok(Self::from_rgba8(rgba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn components_are_clamped() {
        let c = ColorSpec::new(-1.0, 2.0, f32::NAN, 0.5);
        assert_eq!((c.red(), c.green(), c.blue(), c.alpha()), (0.0, 1.0, 0.0, 0.5));
    }

    #[test]
    fn transparency_uses_smallest_positive_magnitude() {
        assert!(ColorSpec::CLEAR.is_transparent());
        assert!(ColorSpec::new(0.0, 0.0, 0.0, ALPHA_EPSILON).is_transparent());
        assert!(!ColorSpec::new(0.0, 0.0, 0.0, f32::MIN_POSITIVE).is_transparent());
        assert!(!ColorSpec::new(0.0, 0.0, 0.0, 0.001).is_transparent());
    }

    #[test]
    fn quantization_rounds_to_nearest() {
        let c = ColorSpec::new(0.5, 0.2, 1.0, 0.0);
        assert_eq!(c.to_rgba8().0, [128, 51, 255, 0]);
        assert_eq!(ColorSpec::from_rgba8([1, 2, 3, 4]).to_rgba8().0, [1, 2, 3, 4]);
    }

    #[test]
    fn parses_hex_with_and_without_alpha() {
        let c: ColorSpec = "#10203040".parse().unwrap();
        assert_eq!(c.to_rgba8().0, [0x10, 0x20, 0x30, 0x40]);
        let c: ColorSpec = "ff0000".parse().unwrap();
        assert_eq!(c.to_rgba8().0, [255, 0, 0, 255]);
    }

    #[test]
    fn rejects_bad_hex() {
        assert_eq!("#123".parse::<ColorSpec>(), Err(ParseColorError::Length(3)));
        assert!(matches!("#12345g".parse::<ColorSpec>(), Err(ParseColorError::Digit(_))));
    }
}
