//! # qrsynth
//!
//! A Rust library for synthesizing QR code images and manipulating small rasters in software.
//!
//! `qrsynth` encodes payload bytes into a QR code at the High error correction level and turns
//! it into an RGBA raster whose dark modules carry a chosen color and whose light modules are
//! transparent. Every result is rendered on the CPU, so the same inputs always give the same
//! pixels. Rendering shares one process-wide context that is serialized behind a mutex.
//!
//! ## Features
//!
//! - Synthesize colored QR codes, or an alpha stencil when the color is fully transparent.
//! - Recolor any raster while keeping its alpha channel pixel-for-pixel.
//! - Resize rasters with nearest-neighbor or filtered sampling.
//! - Create 1x1 solid color rasters.
//! - Export module grids as SVG or terminal art, and rasters as PNG.
//! - Safe Rust implementation with no unsafe code.
//!
//! ## Installation
//!
//! Add to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! qrsynth = "0.1" # Replace with the latest version
//! ```
//!
//! ## Example
//!
//! Synthesize a QR code, recolor it, and scale it up:
//!
//! ```rust
//! use qrsynth::{helper::encode_png, resize, synthesize, tint, ColorSpec};
//!
//! let qr = synthesize(b"https://example.com", ColorSpec::BLACK).unwrap();
//! let orange = tint(&qr, "#FFA500".parse().unwrap()).unwrap();
//! let (w, h) = orange.dimensions();
//! let big = resize(&orange, (w * 8, h * 8), false).unwrap();
//!
//! let png = encode_png(&big).unwrap();
//! assert!(!png.is_empty());
//! ```
//!
//! Failures are reported as `None`; the `try_*` methods on the component types return a
//! [`RenderError`] instead:
//!
//! ```rust
//! use qrsynth::{ColorSpec, QrSynthesizer, RenderError};
//!
//! let too_long = vec![b'x'; 4096];
//! let err = QrSynthesizer::new().try_synthesize(&too_long, ColorSpec::BLACK).unwrap_err();
//! assert!(matches!(err, RenderError::CapacityExceeded { .. }));
//! ```
//!
//! ## Modules
//!
//! - [`qrcode`]: QR encoding and monochrome rasterization.
//! - [`pipeline`]: The stencil and false-color stages.
//! - [`canvas`]: The software drawing surface.
//! - [`helper`]: Export utilities.

pub mod canvas;
mod color;
mod config;
mod context;
pub mod error;
mod fill;
pub mod helper;
pub mod pipeline;
pub mod qrcode;
mod raster;
mod resize;
mod synthesizer;
mod tint;

pub use self::canvas::{BlendMode, Canvas, Interpolation, Rect};
pub use self::color::{ColorSpec, ALPHA_EPSILON};
pub use self::config::RenderConfig;
pub use self::error::{ParseColorError, RenderError, RenderResult};
pub use self::fill::{fill, SolidColorImageFactory};
pub use self::raster::PixelImage;
pub use self::resize::{resize, ImageGeometryTransformer};
pub use self::synthesizer::{shared_render_count, synthesize, QrSynthesizer, SYNTHESIS_ECC};
pub use self::tint::{tint, AlphaMaskTinter};
