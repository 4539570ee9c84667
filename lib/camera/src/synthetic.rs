//! Camera backend that needs no hardware.
//!
//! Every opened stream renders an animated XOR pattern, tinted differently
//! per facing mode so a device switch is visible in the output. Missing
//! devices, denied access and busy devices can be configured to exercise
//! the failure paths of callers.

use crate::{
    CameraError, CameraInfo, CameraResult, CaptureBackend, CaptureStream, FacingMode, TrackInfo,
    TrackRegistry, rgb_to_rgba,
};
use derivative::Derivative;
use derive_setters::Setters;
use image::{RgbImage, RgbaImage};

#[derive(Debug, Clone, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct SyntheticConfig {
    #[derivative(Default(value = "640"))]
    pub width: u32,

    #[derivative(Default(value = "480"))]
    pub height: u32,

    #[derivative(Default(value = "vec![FacingMode::User, FacingMode::Environment]"))]
    pub devices: Vec<FacingMode>,

    pub deny_access: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SyntheticBackend {
    config: SyntheticConfig,
    tracks: TrackRegistry,
}

impl SyntheticBackend {
    pub fn new(config: SyntheticConfig) -> Self {
        Self {
            config,
            tracks: TrackRegistry::new(),
        }
    }

    fn label(facing: FacingMode) -> String {
        format!("Synthetic {facing} camera")
    }
}

impl CaptureBackend for SyntheticBackend {
    fn name(&self) -> &'static str {
        "synthetic"
    }

    fn devices(&self) -> Vec<CameraInfo> {
        self.config
            .devices
            .iter()
            .enumerate()
            .map(|(index, facing)| CameraInfo {
                index: index.to_string(),
                name: Self::label(*facing),
                description: format!("{}x{} test pattern", self.config.width, self.config.height),
            })
            .collect()
    }

    fn open(&self, facing: FacingMode) -> CameraResult<Box<dyn CaptureStream>> {
        if self.config.deny_access {
            return Err(CameraError::PermissionDenied(Self::label(facing)));
        }

        if !self.config.devices.contains(&facing) {
            return Err(CameraError::DeviceNotFound(facing));
        }

        if self.tracks.is_active(facing) {
            return Err(CameraError::DeviceBusy(Self::label(facing)));
        }

        let track = self.tracks.register(Self::label(facing), facing);
        log::info!(
            "open {} ({}x{})",
            track.label,
            self.config.width,
            self.config.height
        );

        Ok(Box::new(SyntheticStream {
            track,
            tracks: self.tracks.clone(),
            width: self.config.width,
            height: self.config.height,
            seed: 0,
            running: true,
        }))
    }

    fn active_tracks(&self) -> Vec<TrackInfo> {
        self.tracks.list()
    }
}

pub struct SyntheticStream {
    track: TrackInfo,
    tracks: TrackRegistry,
    width: u32,
    height: u32,
    seed: u32,
    running: bool,
}

impl CaptureStream for SyntheticStream {
    fn facing(&self) -> FacingMode {
        self.track.facing
    }

    fn last_frame(&mut self) -> CameraResult<RgbaImage> {
        if !self.running {
            return Err(CameraError::NoFrameAvailable);
        }

        let mut frame = RgbImage::new(self.width, self.height);
        gen_pattern(&mut frame, self.seed, self.track.facing);
        self.seed = self.seed.wrapping_add(1);

        Ok(rgb_to_rgba(&frame))
    }

    fn stop(&mut self) -> CameraResult<()> {
        if self.running {
            self.running = false;
            self.tracks.release(self.track.id);
        }

        Ok(())
    }

    fn is_running(&self) -> bool {
        self.running
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        _ = self.stop();
    }
}

/// `seed` moves the pattern one step per frame.
fn gen_pattern(frame: &mut RgbImage, seed: u32, facing: FacingMode) {
    for (x, y, pixel) in frame.enumerate_pixels_mut() {
        let rgba = seed.wrapping_add(x ^ y).to_le_bytes();

        pixel.0 = match facing {
            FacingMode::User => [rgba[0], rgba[1], rgba[2]],
            FacingMode::Environment => [rgba[2], rgba[0], rgba[1]],
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_and_stop_tracks() {
        let backend = SyntheticBackend::new(SyntheticConfig::default().with_width(8).with_height(4));
        let mut stream = backend.open(FacingMode::User).unwrap();

        let frame = stream.last_frame().unwrap();
        assert_eq!(frame.dimensions(), (8, 4));
        assert!(frame.pixels().all(|p| p[3] == 255));

        assert_eq!(backend.active_tracks().len(), 1);
        stream.stop().unwrap();
        assert!(backend.active_tracks().is_empty());
        assert!(!stream.is_running());
        assert!(matches!(stream.last_frame(), Err(CameraError::NoFrameAvailable)));
    }

    #[test]
    fn test_drop_releases_track() {
        let backend = SyntheticBackend::default();
        let stream = backend.open(FacingMode::Environment).unwrap();
        assert_eq!(backend.active_tracks()[0].facing, FacingMode::Environment);

        drop(stream);
        assert!(backend.active_tracks().is_empty());
    }

    #[test]
    fn test_busy_device() {
        let backend = SyntheticBackend::default();
        let _stream = backend.open(FacingMode::User).unwrap();

        assert!(matches!(
            backend.open(FacingMode::User),
            Err(CameraError::DeviceBusy(_))
        ));
        assert!(backend.open(FacingMode::Environment).is_ok());
    }

    #[test]
    fn test_missing_and_denied_device() {
        let backend =
            SyntheticBackend::new(SyntheticConfig::default().with_devices(vec![FacingMode::User]));
        assert!(matches!(
            backend.open(FacingMode::Environment),
            Err(CameraError::DeviceNotFound(FacingMode::Environment))
        ));
        assert_eq!(backend.devices().len(), 1);

        let backend = SyntheticBackend::new(SyntheticConfig::default().with_deny_access(true));
        assert!(matches!(
            backend.open(FacingMode::User),
            Err(CameraError::PermissionDenied(_))
        ));
        assert!(backend.active_tracks().is_empty());
    }

    #[test]
    fn test_pattern_animates() {
        let backend = SyntheticBackend::new(SyntheticConfig::default().with_width(4).with_height(4));
        let mut stream = backend.open(FacingMode::User).unwrap();

        let first = stream.last_frame().unwrap();
        let second = stream.last_frame().unwrap();
        assert_ne!(first, second);
    }
}
