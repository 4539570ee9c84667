pub mod camera_info;
pub mod synthetic;
pub mod track;

#[cfg(feature = "native")]
pub mod camera_client;

#[cfg(feature = "native")]
pub use camera_client::{CameraClient, CameraConfig, NativeBackend, PixelFormat};

pub use camera_info::CameraInfo;
pub use image::{Rgba, RgbaImage};
pub use synthetic::{SyntheticBackend, SyntheticConfig};
pub use track::{TrackInfo, TrackRegistry};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};

pub type CameraResult<T> = Result<T, CameraError>;

#[derive(thiserror::Error, Debug)]
pub enum CameraError {
    #[error("Failed to query cameras: {0}")]
    QueryError(String),

    #[error("Failed to initialize camera: {0}")]
    InitializationError(String),

    #[error("Failed to start camera: {0}")]
    StartError(String),

    #[error("Failed to stop camera: {0}")]
    StopError(String),

    #[error("No frame available")]
    NoFrameAvailable,

    #[error("No {0} facing camera found")]
    DeviceNotFound(FacingMode),

    #[error("Camera is busy: {0}")]
    DeviceBusy(String),

    #[error("Camera access denied: {0}")]
    PermissionDenied(String),

    #[cfg(feature = "native")]
    #[error("Camera error: {0}")]
    NokhwaError(#[from] nokhwa::NokhwaError),
}

/// Which way the requested camera points. `user` faces the person in front
/// of the screen, `environment` faces away.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    #[default]
    #[strum(to_string = "user", serialize = "front")]
    #[serde(alias = "front")]
    User,

    #[strum(to_string = "environment", serialize = "back")]
    #[serde(alias = "back")]
    Environment,
}

/// An open capture stream. Frames are pulled, the newest one wins.
pub trait CaptureStream: Send {
    fn facing(&self) -> FacingMode;

    fn last_frame(&mut self) -> CameraResult<RgbaImage>;

    /// Stop every track of the stream. Calling it twice is a no-op.
    fn stop(&mut self) -> CameraResult<()>;

    fn is_running(&self) -> bool;
}

pub trait CaptureBackend: Send + Sync {
    fn name(&self) -> &'static str;

    fn devices(&self) -> Vec<CameraInfo>;

    fn open(&self, facing: FacingMode) -> CameraResult<Box<dyn CaptureStream>>;

    /// Tracks that were opened and not yet stopped.
    fn active_tracks(&self) -> Vec<TrackInfo>;
}

pub fn init() {
    #[cfg(all(feature = "native", target_os = "macos"))]
    nokhwa::nokhwa_initialize(|granted| {
        log::info!("User said {} for nokhwa", granted);
    });
}

pub fn rgb_to_rgba(rgb_image: &image::RgbImage) -> RgbaImage {
    let (width, height) = rgb_image.dimensions();
    let mut rgba_img = RgbaImage::new(width, height);

    for (src, dst) in rgb_image.pixels().zip(rgba_img.pixels_mut()) {
        *dst = Rgba([src[0], src[1], src[2], 255]);
    }

    rgba_img
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_facing_mode_parse() {
        assert_eq!(FacingMode::from_str("user").unwrap(), FacingMode::User);
        assert_eq!(FacingMode::from_str("front").unwrap(), FacingMode::User);
        assert_eq!(
            FacingMode::from_str("environment").unwrap(),
            FacingMode::Environment
        );
        assert_eq!(FacingMode::from_str("back").unwrap(), FacingMode::Environment);
        assert!(FacingMode::from_str("sideways").is_err());

        assert_eq!(FacingMode::Environment.to_string(), "environment");
    }

    #[test]
    fn test_rgb_to_rgba() {
        let rgb = image::RgbImage::from_raw(2, 1, vec![1, 2, 3, 4, 5, 6]).unwrap();
        let rgba = rgb_to_rgba(&rgb);
        assert_eq!(rgba.as_raw(), &vec![1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
