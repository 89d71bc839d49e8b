use crate::color::ColorSpec;
use crate::error::RenderResult;
use crate::qrcode::ModuleGrid;
use crate::raster::PixelImage;

use image::ImageFormat;
use std::io::Cursor;

/*---- Utilities ----*/

/// Returns a string of SVG code for an image depicting the given module grid.
///
/// Dark modules are filled with `color`; light modules and the `border` stay transparent,
/// so the SVG layers over any background. The string always uses Unix newlines (\n),
/// regardless of the platform.
///
/// # Arguments
///
/// * `grid` - The modules to draw.
/// * `border` - Quiet zone width, in modules.
/// * `color` - Fill for dark modules. Alpha below 1 becomes `fill-opacity`.
///
/// # Example
///
/// ```rust
/// use qrsynth::helper::to_svg_string;
/// use qrsynth::qrcode::{QrCodeEcc, QrEncoder, QrcodeEncoder};
/// use qrsynth::ColorSpec;
///
/// let grid = QrcodeEncoder.encode(b"HELLO WORLD", QrCodeEcc::High).unwrap();
/// let svg = to_svg_string(&grid, 4, ColorSpec::BLACK);
/// assert!(svg.contains("fill=\"#000000\""));
/// ```
pub fn to_svg_string(grid: &ModuleGrid, border: u32, color: ColorSpec) -> String {
	let dimension = grid.size() as u64 + 2 * border as u64;
	let [r, g, b, a] = color.to_rgba8().0;

	let mut result = String::new();
	result += "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n";
	result += "<!DOCTYPE svg PUBLIC \"-//W3C//DTD SVG 1.1//EN\" \"http://www.w3.org/Graphics/SVG/1.1/DTD/svg11.dtd\">\n";
	result += &format!(
		"<svg xmlns=\"http://www.w3.org/2000/svg\" version=\"1.1\" viewBox=\"0 0 {0} {0}\" stroke=\"none\">\n", dimension);
	result += "\t<path d=\"";
	let mut first = true;
	for y in 0 .. grid.size() as i32 {
		for x in 0 .. grid.size() as i32 {
			if grid.get_module(x, y) {
				if !first {
					result += " ";
				}
				first = false;
				result += &format!("M{},{}h1v1h-1z", x as u32 + border, y as u32 + border);
			}
		}
	}
	result += &format!("\" fill=\"#{:02X}{:02X}{:02X}\"", r, g, b);
	if a < u8::MAX {
		result += &format!(" fill-opacity=\"{:.3}\"", a as f32 / 255.0);
	}
	result += "/>\n";
	result += "</svg>\n";
	result
}

/// Renders the grid as terminal art, two block characters per dark module.
///
/// One line per module row including the `border`; lines end with `\n`.
pub fn to_ascii_string(grid: &ModuleGrid, border: u32) -> String {
	let border = border as i32;
	let mut result = String::new();
	for y in -border .. grid.size() as i32 + border {
		for x in -border .. grid.size() as i32 + border {
			let c: char = if grid.get_module(x, y) { '█' } else { ' ' };
			result.push(c);
			result.push(c);
		}
		result.push('\n');
	}
	result
}

/// Encodes a raster as PNG bytes, alpha channel included.
///
/// # Errors
///
/// Returns [`crate::RenderError::Encode`] if the PNG encoder fails.
///
/// # Example
///
/// ```rust
/// use qrsynth::{helper::encode_png, synthesize, ColorSpec};
///
/// let qr = synthesize(b"Hello, World!", ColorSpec::BLACK).unwrap();
/// let png = encode_png(&qr).unwrap();
/// assert_eq!(&png[1..4], b"PNG");
/// ```
pub fn encode_png(image: &PixelImage) -> RenderResult<Vec<u8>> {
	let mut bytes = Vec::new();
	image.pixels().write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
	Ok(bytes)
}
