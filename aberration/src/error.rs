use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while producing or presenting frames.
///
/// Capture failures are recovered by the demo itself (it falls back to the
/// static source and emits a notice), so `Camera` only escapes from the
/// lower level helpers. The out-of-range channel read of the effect is not
/// an error at all.
#[derive(Error, Debug)]
pub enum DemoError {
    #[error("Camera failed: {0}")]
    Camera(#[from] camera::CameraError),

    #[error("Image effect failed: {0}")]
    Effect(#[from] image_effect::ImageEffectError),

    #[error("Decode asset {} failed: {source}", .path.display())]
    AssetDecode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Present frame failed: {0}")]
    Present(String),

    #[error("File operation failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Live session thread panicked")]
    SessionPanicked,
}

pub type DemoResult<T> = Result<T, DemoError>;
