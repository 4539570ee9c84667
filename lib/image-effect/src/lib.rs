pub mod chromatic_aberration;

pub use chromatic_aberration::{
    Channel, ChromaticAberrationConfig, chromatic_aberration, normalize_phase,
};

use image::RgbaImage;

pub type ImageEffectResult<T> = Result<T, ImageEffectError>;

#[derive(thiserror::Error, Debug)]
pub enum ImageEffectError {
    #[error("Invalid buffer length {0}: not a multiple of 4")]
    InvalidBufferLength(usize),
}

pub trait Effect {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()>;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImageEffect {
    #[default]
    None,
    ChromaticAberration(ChromaticAberrationConfig),
}

impl ImageEffect {
    pub fn name(&self) -> &'static str {
        match self {
            ImageEffect::None => "None",
            ImageEffect::ChromaticAberration(_) => "Chromatic Aberration",
        }
    }
}

impl Effect for ImageEffect {
    fn apply(&self, image: &mut RgbaImage) -> ImageEffectResult<()> {
        match self {
            ImageEffect::None => Ok(()),
            ImageEffect::ChromaticAberration(config) => config.apply(image),
        }
    }
}

/// Apply `effect` to a raw RGBA buffer that is not wrapped in an image.
pub fn apply_rgba(effect: &ImageEffect, buffer: &mut [u8]) -> ImageEffectResult<()> {
    if buffer.len() % 4 != 0 {
        return Err(ImageEffectError::InvalidBufferLength(buffer.len()));
    }

    match effect {
        ImageEffect::None => (),
        ImageEffect::ChromaticAberration(config) => config.apply_raw(buffer),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_none_effect_keeps_image() {
        let mut image = RgbaImage::from_raw(1, 2, vec![1, 2, 3, 4, 5, 6, 7, 8]).unwrap();
        ImageEffect::None.apply(&mut image).unwrap();
        assert_eq!(image.as_raw(), &vec![1, 2, 3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn test_apply_rgba_rejects_partial_pixels() {
        let effect = ImageEffect::ChromaticAberration(ChromaticAberrationConfig::new());
        let mut data = vec![0u8; 6];

        assert!(matches!(
            apply_rgba(&effect, &mut data),
            Err(ImageEffectError::InvalidBufferLength(6))
        ));
    }

    #[test]
    fn test_apply_rgba_shifts_lane() {
        let effect = ImageEffect::ChromaticAberration(
            ChromaticAberrationConfig::new()
                .with_intensity(1)
                .with_phase(1),
        );
        let mut data = vec![10, 20, 30, 255, 40, 50, 60, 255];
        apply_rgba(&effect, &mut data).unwrap();
        assert_eq!(data, vec![10, 50, 30, 255, 40, 50, 60, 255]);
    }
}
