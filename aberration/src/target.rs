use crate::{DemoError, DemoResult};
use image::{ImageFormat, RgbaImage};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

/// A 2D surface frames are drawn onto. The surface is resized to every
/// frame before it is presented and keeps nothing from earlier frames.
pub trait RenderTarget: Send {
    fn resize(&mut self, width: u32, height: u32);

    fn size(&self) -> (u32, u32);

    fn present(&mut self, frame: &RgbaImage) -> DemoResult<()>;
}

pub type SharedTarget = Arc<Mutex<Box<dyn RenderTarget>>>;

pub fn shared(target: impl RenderTarget + 'static) -> SharedTarget {
    Arc::new(Mutex::new(Box::new(target)))
}

/// Resize `target` to `frame` and present it.
pub fn draw(target: &SharedTarget, frame: &RgbaImage) -> DemoResult<()> {
    let mut target = target
        .lock()
        .map_err(|e| DemoError::Present(format!("render target lock poisoned: {e}")))?;

    target.resize(frame.width(), frame.height());
    target.present(frame)
}

fn check_size(surface: (u32, u32), frame: &RgbaImage) -> DemoResult<()> {
    if surface != frame.dimensions() {
        return Err(DemoError::Present(format!(
            "frame {}x{} does not match surface {}x{}",
            frame.width(),
            frame.height(),
            surface.0,
            surface.1
        )));
    }

    Ok(())
}

/// Writes every presented frame to one PNG file, replacing the previous one.
#[derive(Debug, Clone)]
pub struct PngTarget {
    path: PathBuf,
    width: u32,
    height: u32,
    presented: u64,
}

impl PngTarget {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            width: 0,
            height: 0,
            presented: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl RenderTarget for PngTarget {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: &RgbaImage) -> DemoResult<()> {
        check_size(self.size(), frame)?;

        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
        {
            fs::create_dir_all(dir)?;
        }

        // readers polling the output never see a half written file
        let tmp = self.path.with_extension("png.part");
        frame
            .save_with_format(&tmp, ImageFormat::Png)
            .map_err(|e| DemoError::Present(format!("write {} failed: {e}", tmp.display())))?;
        fs::rename(&tmp, &self.path)?;

        self.presented += 1;
        log::trace!("present #{} to {}", self.presented, self.path.display());
        Ok(())
    }
}

/// Keeps presented frames in memory. Clones share the frame list, so a
/// clone kept outside the demo can inspect what was drawn.
#[derive(Debug, Clone, Default)]
pub struct MemoryTarget {
    width: u32,
    height: u32,
    frames: Arc<Mutex<Vec<RgbaImage>>>,
}

impl MemoryTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn frames(&self) -> Vec<RgbaImage> {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn last_frame(&self) -> Option<RgbaImage> {
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .last()
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RenderTarget for MemoryTarget {
    fn resize(&mut self, width: u32, height: u32) {
        self.width = width;
        self.height = height;
    }

    fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn present(&mut self, frame: &RgbaImage) -> DemoResult<()> {
        check_size(self.size(), frame)?;
        self.frames
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(frame.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_draw_resizes_target() {
        let memory = MemoryTarget::new();
        let target = shared(memory.clone());

        draw(&target, &RgbaImage::new(3, 2)).unwrap();
        draw(&target, &RgbaImage::new(5, 7)).unwrap();

        assert_eq!(target.lock().unwrap().size(), (5, 7));
        assert_eq!(memory.len(), 2);
        assert_eq!(memory.last_frame().unwrap().dimensions(), (5, 7));
    }

    #[test]
    fn test_present_rejects_wrong_size() {
        let mut memory = MemoryTarget::new();
        memory.resize(4, 4);
        assert!(memory.present(&RgbaImage::new(2, 2)).is_err());
        assert!(memory.is_empty());
    }

    #[test]
    fn test_png_target_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("frame.png");
        let png = PngTarget::new(&path);
        let target = shared(png);

        let mut frame = RgbaImage::new(4, 3);
        frame.put_pixel(1, 1, image::Rgba([1, 2, 3, 255]));
        draw(&target, &frame).unwrap();

        let written = image::open(&path).unwrap().to_rgba8();
        assert_eq!(written, frame);
        assert!(!path.with_extension("png.part").exists());
    }
}
