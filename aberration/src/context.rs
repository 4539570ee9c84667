use crate::DemoResult;
use camera::FacingMode;
use image::RgbaImage;
use image_effect::{ChromaticAberrationConfig, Effect, ImageEffect};
use num_enum::{IntoPrimitive, TryFromPrimitive};
use serde::{Deserialize, Serialize};
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicI32, AtomicU8, Ordering},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, TryFromPrimitive, IntoPrimitive, Serialize, Deserialize,
)]
#[repr(u8)]
#[serde(rename_all = "lowercase")]
pub enum SourceMode {
    #[default]
    Static = 0,
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EffectParams {
    pub intensity: i32,
    pub phase: i32,
}

impl EffectParams {
    pub fn new(intensity: i32, phase: i32) -> Self {
        Self { intensity, phase }
    }

    pub fn effect(&self) -> ImageEffect {
        ImageEffect::ChromaticAberration(
            ChromaticAberrationConfig::new()
                .with_intensity(self.intensity)
                .with_phase(self.phase),
        )
    }

    pub fn apply(&self, frame: &mut RgbaImage) -> DemoResult<()> {
        Ok(self.effect().apply(frame)?)
    }
}

/// Values the user can change while frames are being produced.
///
/// Cloning shares the underlying values. Frame producers read them once per
/// trigger or tick and never cache them across ticks.
#[derive(Debug, Clone)]
pub struct RenderContext {
    intensity: Arc<AtomicI32>,
    phase: Arc<AtomicI32>,
    mode: Arc<AtomicU8>,
    facing: Arc<Mutex<FacingMode>>,
}

impl Default for RenderContext {
    fn default() -> Self {
        Self::new(EffectParams::default(), SourceMode::Static, FacingMode::User)
    }
}

impl RenderContext {
    pub fn new(params: EffectParams, mode: SourceMode, facing: FacingMode) -> Self {
        Self {
            intensity: Arc::new(AtomicI32::new(params.intensity)),
            phase: Arc::new(AtomicI32::new(params.phase)),
            mode: Arc::new(AtomicU8::new(mode.into())),
            facing: Arc::new(Mutex::new(facing)),
        }
    }

    pub fn params(&self) -> EffectParams {
        EffectParams {
            intensity: self.intensity.load(Ordering::Relaxed),
            phase: self.phase.load(Ordering::Relaxed),
        }
    }

    pub fn set_intensity(&self, intensity: i32) {
        self.intensity.store(intensity, Ordering::Relaxed);
    }

    pub fn set_phase(&self, phase: i32) {
        self.phase.store(phase, Ordering::Relaxed);
    }

    pub fn mode(&self) -> SourceMode {
        SourceMode::try_from(self.mode.load(Ordering::Acquire)).unwrap_or_default()
    }

    pub fn set_mode(&self, mode: SourceMode) {
        self.mode.store(mode.into(), Ordering::Release);
    }

    pub fn is_live(&self) -> bool {
        self.mode() == SourceMode::Live
    }

    pub fn facing(&self) -> FacingMode {
        *self.facing.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_facing(&self, facing: FacingMode) {
        *self.facing.lock().unwrap_or_else(|e| e.into_inner()) = facing;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_values() {
        let ctx = RenderContext::default();
        let other = ctx.clone();

        other.set_intensity(-7);
        other.set_phase(2);
        other.set_mode(SourceMode::Live);
        other.set_facing(FacingMode::Environment);

        assert_eq!(ctx.params(), EffectParams::new(-7, 2));
        assert!(ctx.is_live());
        assert_eq!(ctx.facing(), FacingMode::Environment);
    }

    #[test]
    fn test_params_apply() {
        let mut frame = RgbaImage::from_raw(2, 1, vec![10, 20, 30, 255, 40, 50, 60, 255]).unwrap();
        EffectParams::new(1, 0).apply(&mut frame).unwrap();
        assert_eq!(frame.as_raw(), &vec![40, 20, 30, 255, 40, 50, 60, 255]);
    }
}
