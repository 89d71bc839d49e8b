/// Error types shared by every rendering operation.
///
/// Public entry points such as [`crate::synthesize`] or [`crate::tint`] swallow these
/// and return `None`; the `try_*` variants hand them back so callers can decide
/// whether a retry makes sense.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The payload does not fit in any QR version at the requested error correction level.
    #[error("payload of {len} bytes exceeds QR capacity")]
    CapacityExceeded { len: usize },

    /// A rasterization step produced no usable pixel data.
    #[error("raster extraction failed: {0}")]
    ExtractionFailure(String),

    /// A drawing canvas could not be acquired.
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    /// Exporting a raster to an encoded format failed.
    #[error("image encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

impl RenderError {
    /// Whether the same call may succeed later without changed input.
    ///
    /// Only context exhaustion is transient. Capacity and extraction failures are
    /// fully determined by the input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ContextUnavailable(_))
    }
}

/// Result alias used throughout the crate.
pub type RenderResult<T> = Result<T, RenderError>;

/// Failure to parse a [`crate::ColorSpec`] from a hex string.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseColorError {
    #[error("expected 6 or 8 hex digits, got {0}")]
    Length(usize),

    #[error("invalid hex digit in {0:?}")]
    Digit(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_context_exhaustion_is_retryable() {
        assert!(RenderError::ContextUnavailable("busy".into()).is_retryable());
        assert!(!RenderError::CapacityExceeded { len: 4000 }.is_retryable());
        assert!(!RenderError::ExtractionFailure("empty".into()).is_retryable());
    }

    #[test]
    fn messages_name_the_failure() {
        let err = RenderError::CapacityExceeded { len: 2000 };
        assert_eq!(err.to_string(), "payload of 2000 bytes exceeds QR capacity");
    }
}
