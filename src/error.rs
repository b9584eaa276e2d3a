//! Central error handling for the lucent renderer
//!
//! Provides a unified RenderError enum with consistent categorization.
//! Construction-time and build-time failures propagate through this type;
//! per-frame anomalies are clamped or logged at the call site instead so the
//! interactive loop stays alive.

/// Centralized error type for all renderer operations
#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    /// A spatial-index build was requested while a previous one is still in
    /// flight. Surfaced synchronously; the new build is not started.
    #[error("BVH build already in progress")]
    BuildInProgress,

    /// Input geometry is missing required attributes or is internally
    /// inconsistent. Rejected before BVH construction ever starts.
    #[error("Malformed geometry: {0}")]
    MalformedGeometry(String),

    /// An environment map with an unrecognized encoding was supplied.
    /// The pipeline recovers by falling back to a flat background color;
    /// this variant exists for hosts that want the typed failure.
    #[error("Unsupported environment format: {0}")]
    UnsupportedEnvironmentFormat(String),

    /// The background build thread failed or panicked.
    #[error("Build error: {0}")]
    Build(String),

    #[error("Device error: {0}")]
    Device(String),

    #[error("Readback error: {0}")]
    Readback(String),
}

impl RenderError {
    /// Convenience constructors for common error types
    pub fn malformed_geometry<T: ToString>(msg: T) -> Self {
        RenderError::MalformedGeometry(msg.to_string())
    }

    pub fn build<T: ToString>(msg: T) -> Self {
        RenderError::Build(msg.to_string())
    }

    pub fn device<T: ToString>(msg: T) -> Self {
        RenderError::Device(msg.to_string())
    }

    pub fn readback<T: ToString>(msg: T) -> Self {
        RenderError::Readback(msg.to_string())
    }
}

/// Result type alias for renderer operations
pub type RenderResult<T> = Result<T, RenderError>;
