use anyhow::Result;
use camera::{
    CaptureBackend, FacingMode,
    camera_client::{CameraConfig, NativeBackend, PixelFormat},
};
use std::{thread, time::Duration};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let fps = 25;
    let config = CameraConfig::default()
        .with_pixel_format(PixelFormat::RGBA)
        .with_width(1280)
        .with_height(720)
        .with_fps(fps);

    let backend = NativeBackend::new(config);
    let cameras = backend.devices();
    if cameras.is_empty() {
        log::warn!("No working cameras found!");
        return Ok(());
    }

    log::info!("Found {} camera(s)", cameras.len());

    let mut stream = backend.open(FacingMode::User)?;
    log::info!("Starting camera capture...");

    let mut frame_count = 0;
    let mut empty_frame_count = 0;
    std::fs::create_dir_all("tmp")?;

    for _ in 0..100 {
        thread::sleep(Duration::from_millis(1000 / fps as u64));

        match stream.last_frame() {
            Ok(frame) => {
                if frame.is_empty() {
                    empty_frame_count += 1;
                } else if frame_count % 10 == 0 {
                    log::info!(
                        "Frame #{}: {}x{} ({} pixels)",
                        frame_count,
                        frame.width(),
                        frame.height(),
                        frame.len()
                    );

                    if let Err(e) = frame.save(format!("tmp/camera-{frame_count}.png")) {
                        log::warn!("save frame failed: {e}");
                    }
                }
                frame_count += 1;
            }
            Err(e) => log::warn!("{e}"),
        }
    }

    log::info!("Stopping camera...");
    stream.stop()?;
    log::info!("Active tracks after stop: {}", backend.active_tracks().len());

    log::info!(
        "Captured {frame_count} frames, {empty_frame_count} ({}%) empty frames",
        empty_frame_count * 100 / frame_count.max(1)
    );
    Ok(())
}
