//! Chromatic aberration effect
//!
//! Shifts one byte lane of an RGBA buffer horizontally relative to the
//! other three, producing colour fringing along edges.

use crate::{Effect, ImageEffectResult};
use derivative::Derivative;
use derive_setters::Setters;
use image::RgbaImage;
use num_enum::{IntoPrimitive, TryFromPrimitive};

const CHANNELS: usize = 4;

/// The byte lane inside a 4-byte RGBA pixel that a phase selects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive, IntoPrimitive)]
#[repr(u8)]
pub enum Channel {
    Red = 0,
    Green,
    Blue,
    Alpha,
}

impl Channel {
    pub fn from_phase(phase: i32) -> Self {
        // rem_euclid(4) is always in 0..4
        Channel::try_from(normalize_phase(phase) as u8).unwrap_or(Channel::Red)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Channel::Red => "Red",
            Channel::Green => "Green",
            Channel::Blue => "Blue",
            Channel::Alpha => "Alpha",
        }
    }
}

pub fn normalize_phase(phase: i32) -> usize {
    phase.rem_euclid(CHANNELS as i32) as usize
}

/// Apply the aberration in place.
///
/// For every sample `i` of the lane selected by `phase`, copies
/// `buffer[i + 4 * intensity]` into `buffer[i]`. A source index outside the
/// buffer leaves the destination sample unchanged. Iteration runs forward
/// over the buffer being written, so a negative `intensity` reads samples
/// that earlier iterations already replaced.
pub fn chromatic_aberration(buffer: &mut [u8], intensity: i32, phase: i32) {
    let len = buffer.len() as i64;
    let offset = CHANNELS as i64 * intensity as i64;

    for i in (normalize_phase(phase)..buffer.len()).step_by(CHANNELS) {
        let src = i as i64 + offset;
        if (0..len).contains(&src) {
            buffer[i] = buffer[src as usize];
        }
    }
}

/// Chromatic aberration effect configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Derivative, Setters)]
#[derivative(Default)]
#[setters(prefix = "with_")]
#[non_exhaustive]
pub struct ChromaticAberrationConfig {
    #[derivative(Default(value = "10"))]
    pub intensity: i32,

    #[derivative(Default(value = "0"))]
    pub phase: i32,
}

impl ChromaticAberrationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn channel(&self) -> Channel {
        Channel::from_phase(self.phase)
    }

    pub fn apply_raw(&self, buffer: &mut [u8]) {
        chromatic_aberration(buffer, self.intensity, self.phase);
    }
}

impl Effect for ChromaticAberrationConfig {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        log::trace!(
            "chromatic aberration: {}x{} intensity = {}, channel = {}",
            image.width(),
            image.height(),
            self.intensity,
            self.channel().name()
        );

        self.apply_raw(image);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(len: usize) -> Vec<u8> {
        (0..len).map(|v| (v * 7 % 251) as u8).collect()
    }

    #[test]
    fn test_two_pixel_shift() {
        let mut data = vec![10, 20, 30, 255, 40, 50, 60, 255];
        chromatic_aberration(&mut data, 1, 0);

        // i = 0 reads index 4, i = 4 reads index 8 which is past the end
        assert_eq!(data, vec![40, 20, 30, 255, 40, 50, 60, 255]);
    }

    #[test]
    fn test_zero_intensity_is_identity() {
        for phase in -5..9 {
            let original = sample(64);
            let mut data = original.clone();
            chromatic_aberration(&mut data, 0, phase);
            assert_eq!(data, original, "phase = {phase}");
        }
    }

    #[test]
    fn test_only_selected_lane_changes() {
        for phase in -4..8 {
            for intensity in [-3, -1, 1, 2, 5, 100] {
                let original = sample(4 * 16);
                let mut data = original.clone();
                chromatic_aberration(&mut data, intensity, phase);

                let lane = phase.rem_euclid(4) as usize;
                for (idx, (a, b)) in data.iter().zip(original.iter()).enumerate() {
                    if idx % 4 != lane {
                        assert_eq!(a, b, "phase = {phase}, intensity = {intensity}, idx = {idx}");
                    }
                }
            }
        }
    }

    #[test]
    fn test_out_of_range_is_noop() {
        let original = sample(4 * 8);

        let mut data = original.clone();
        chromatic_aberration(&mut data, 8, 1);
        assert_eq!(data, original);

        let mut data = original.clone();
        chromatic_aberration(&mut data, i32::MAX, 2);
        assert_eq!(data, original);

        let mut data = original.clone();
        chromatic_aberration(&mut data, i32::MIN, 3);
        assert_eq!(data, original);
    }

    #[test]
    fn test_negative_intensity_smears_forward() {
        // red lane: 1, 2, 3, 4
        let mut data = vec![1, 0, 0, 0, 2, 0, 0, 0, 3, 0, 0, 0, 4, 0, 0, 0];
        chromatic_aberration(&mut data, -1, 0);

        // every write reads the sample the previous iteration just wrote
        assert_eq!(data, vec![1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0, 1, 0, 0, 0]);
    }

    #[test]
    fn test_negative_phase_wraps() {
        let mut a = sample(32);
        let mut b = a.clone();
        chromatic_aberration(&mut a, 2, -1);
        chromatic_aberration(&mut b, 2, 3);
        assert_eq!(a, b);

        assert_eq!(Channel::from_phase(-1), Channel::Alpha);
        assert_eq!(Channel::from_phase(6), Channel::Blue);
    }

    #[test]
    fn test_empty_buffer() {
        let mut data: Vec<u8> = vec![];
        chromatic_aberration(&mut data, 3, 2);
        assert!(data.is_empty());
    }

    #[test]
    fn test_config_applies_to_image() {
        let mut image = RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 255]).unwrap();
        ChromaticAberrationConfig::new()
            .with_intensity(1)
            .with_phase(4)
            .apply(&mut image)
            .unwrap();

        assert_eq!(image.as_raw(), &vec![40, 20, 30, 255, 40, 50, 60, 255]);
    }
}
