use image::imageops::FilterType;

/// Rendering configuration shared by every component.
///
/// `Default` gives production values; the `with_*` setters adjust one field at
/// a time.
///
/// # Example
///
/// ```rust
/// use qrsynth::RenderConfig;
///
/// let config = RenderConfig::default().with_module_size(8).with_scale_factor(2.0);
/// assert_eq!(config.module_size, 8);
/// assert_eq!(config.quiet_zone, 4);
/// ```
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Pixels per QR module along each axis.
    pub module_size: u32,
    /// Light border around the QR symbol, in modules.
    pub quiet_zone: u32,
    /// Device scale factor recorded on synthesized and filled rasters.
    pub scale_factor: f32,
    /// Largest canvas (`width * height`) that may be acquired.
    pub max_canvas_pixels: u64,
    /// Filter used when a resize asks for interpolation.
    pub resize_filter: FilterType,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            module_size: 1,
            quiet_zone: 4,
            scale_factor: 1.0,
            max_canvas_pixels: 40_000_000,
            resize_filter: FilterType::CatmullRom,
        }
    }
}

impl RenderConfig {
    pub fn with_module_size(mut self, module_size: u32) -> Self {
        self.module_size = module_size.max(1);
        self
    }

    pub fn with_quiet_zone(mut self, quiet_zone: u32) -> Self {
        self.quiet_zone = quiet_zone;
        self
    }

    pub fn with_scale_factor(mut self, scale_factor: f32) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    pub fn with_max_canvas_pixels(mut self, max_canvas_pixels: u64) -> Self {
        self.max_canvas_pixels = max_canvas_pixels;
        self
    }

    pub fn with_resize_filter(mut self, resize_filter: FilterType) -> Self {
        self.resize_filter = resize_filter;
        self
    }
}
