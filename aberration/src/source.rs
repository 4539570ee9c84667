use crate::{DemoError, DemoResult};
use image::{ImageError, ImageReader, RgbaImage};
use std::path::{Path, PathBuf};

/// Single still image read from disk.
///
/// Every call to [`StaticSource::decode`] reads and decodes the file again,
/// so an asset replaced on disk shows up on the next trigger.
#[derive(Debug, Clone)]
pub struct StaticSource {
    asset: PathBuf,
}

impl StaticSource {
    pub fn new(asset: impl AsRef<Path>) -> Self {
        Self {
            asset: asset.as_ref().to_path_buf(),
        }
    }

    pub fn asset(&self) -> &Path {
        &self.asset
    }

    pub fn decode(&self) -> DemoResult<RgbaImage> {
        let image = ImageReader::open(&self.asset)
            .and_then(|reader| reader.with_guessed_format())
            .map_err(ImageError::IoError)
            .and_then(|reader| reader.decode())
            .map_err(|source| DemoError::AssetDecode {
                path: self.asset.clone(),
                source,
            })?;

        log::debug!(
            "decode {} ({}x{})",
            self.asset.display(),
            image.width(),
            image.height()
        );

        Ok(image.to_rgba8())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_natural_size() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        image::RgbImage::from_pixel(7, 3, image::Rgb([9, 8, 7]))
            .save(&path)
            .unwrap();

        let frame = StaticSource::new(&path).decode().unwrap();
        assert_eq!(frame.dimensions(), (7, 3));
        assert_eq!(frame.get_pixel(6, 2).0, [9, 8, 7, 255]);
    }

    #[test]
    fn test_decode_reads_fresh_each_time() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("still.png");
        let source = StaticSource::new(&path);

        RgbaImage::new(2, 2).save(&path).unwrap();
        assert_eq!(source.decode().unwrap().dimensions(), (2, 2));

        RgbaImage::new(5, 1).save(&path).unwrap();
        assert_eq!(source.decode().unwrap().dimensions(), (5, 1));
    }

    #[test]
    fn test_decode_missing_asset() {
        let source = StaticSource::new("does/not/exist.jpg");
        assert!(matches!(
            source.decode(),
            Err(DemoError::AssetDecode { .. })
        ));
    }
}
