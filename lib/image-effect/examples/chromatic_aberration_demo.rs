/// Chromatic aberration example
/// Shifts each lane of a generated gradient and writes one image per lane

use anyhow::Result;
use image::{Rgba, RgbaImage};
use image_effect::{Channel, ChromaticAberrationConfig, Effect, ImageEffect};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let output_dir = Path::new("tmp");
    std::fs::create_dir_all(output_dir)?;

    let mut source = RgbaImage::new(320, 240);
    for (x, y, pixel) in source.enumerate_pixels_mut() {
        let r = (x * 255 / 320) as u8;
        let g = (y * 255 / 240) as u8;
        let b = if (x / 40 + y / 40) % 2 == 0 { 220 } else { 30 };
        *pixel = Rgba([r, g, b, 255]);
    }

    for phase in 0..3 {
        let mut img = source.clone();
        let effect = ImageEffect::ChromaticAberration(
            ChromaticAberrationConfig::new()
                .with_intensity(12)
                .with_phase(phase),
        );
        effect.apply(&mut img)?;

        let channel = Channel::from_phase(phase);
        let path = output_dir.join(format!("chromatic_aberration_{}.png", channel.name()));
        img.save(&path)?;

        log::info!("{} channel shifted by 12 pixels: {}", channel.name(), path.display());
    }

    Ok(())
}
