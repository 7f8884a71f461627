//! Backdrop video sources that need no capture device.

use std::path::Path;

use image::imageops::FilterType;
use image::RgbaImage;
use wp_core::video::{VideoFrame, VideoSource};

/// A PNG shown as a static "video" frame.
pub struct StillImageSource {
    frame: VideoFrame,
}

impl StillImageSource {
    pub fn load(path: &Path) -> Result<Self, String> {
        let image = open_rgba(path)?;
        Self::from_image(path, image)
    }

    /// Load and stretch to `width` x `height`, so pose coordinates and the
    /// drawn backdrop share one pixel space.
    pub fn load_at_size(path: &Path, width: u32, height: u32) -> Result<Self, String> {
        let mut pixels = open_rgba(path)?;
        if pixels.dimensions() != (width, height) {
            log::info!(
                "Scaling backdrop {} from {}x{} to {}x{}",
                path.display(),
                pixels.width(),
                pixels.height(),
                width,
                height
            );
            pixels = image::imageops::resize(&pixels, width, height, FilterType::Triangle);
        }
        Self::from_image(path, pixels)
    }

    fn from_image(path: &Path, image: RgbaImage) -> Result<Self, String> {
        let (width, height) = image.dimensions();
        let frame = VideoFrame::new(width, height, image.into_raw(), 1)?;
        log::info!("Backdrop loaded: {} ({}x{})", path.display(), width, height);
        Ok(Self { frame })
    }
}

impl VideoSource for StillImageSource {
    fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn frame(&self) -> Option<&VideoFrame> {
        Some(&self.frame)
    }
}

fn open_rgba(path: &Path) -> Result<RgbaImage, String> {
    Ok(image::open(path)
        .map_err(|e| format!("Failed to load backdrop {}: {e}", path.display()))?
        .to_rgba8())
}

/// Vertical gradient with a faint grid, used when no backdrop is configured.
pub struct TestPatternSource {
    frame: VideoFrame,
}

impl TestPatternSource {
    const GRID: u32 = 40;

    pub fn new(width: u32, height: u32) -> Self {
        let mut rgba = Vec::with_capacity(width as usize * height as usize * 4);
        for y in 0..height {
            let t = y as f32 / height.max(1) as f32;
            let base = [
                (20.0 + 20.0 * t) as u8,
                (24.0 + 40.0 * t) as u8,
                (40.0 + 60.0 * t) as u8,
            ];
            for x in 0..width {
                let on_grid = x % Self::GRID == 0 || y % Self::GRID == 0;
                let lift = if on_grid { 18 } else { 0 };
                rgba.extend_from_slice(&[
                    base[0].saturating_add(lift),
                    base[1].saturating_add(lift),
                    base[2].saturating_add(lift),
                    255,
                ]);
            }
        }
        Self {
            frame: VideoFrame {
                width,
                height,
                rgba,
                generation: 1,
            },
        }
    }
}

impl VideoSource for TestPatternSource {
    fn size(&self) -> (u32, u32) {
        (self.frame.width, self.frame.height)
    }

    fn frame(&self) -> Option<&VideoFrame> {
        Some(&self.frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_file_path(name_hint: &str) -> std::path::PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!(
            "wp_backdrop_test_{}_{}_{}.png",
            name_hint,
            std::process::id(),
            nanos
        ))
    }

    #[test]
    fn test_pattern_has_requested_size() {
        let source = TestPatternSource::new(64, 48);
        assert_eq!(source.size(), (64, 48));
        let frame = source.frame().expect("pattern always has a frame");
        assert_eq!(frame.rgba.len(), 64 * 48 * 4);
        assert!(frame.rgba.chunks(4).all(|px| px[3] == 255));
    }

    #[test]
    fn still_image_loads_png() {
        let path = temp_file_path("valid");
        let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([200, 10, 10, 255]));
        img.save(&path).expect("write temp png");

        let source = StillImageSource::load(&path).expect("png should load");
        assert_eq!(source.size(), (8, 4));
        let frame = source.frame().expect("still image has a frame");
        assert_eq!(&frame.rgba[0..4], &[200, 10, 10, 255]);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn still_image_scales_to_canvas() {
        let path = temp_file_path("scaled");
        let img = image::RgbaImage::from_pixel(8, 4, image::Rgba([10, 200, 10, 255]));
        img.save(&path).expect("write temp png");

        let source = StillImageSource::load_at_size(&path, 16, 12).expect("png should load");
        assert_eq!(source.size(), (16, 12));
        let frame = source.frame().expect("still image has a frame");
        assert_eq!(frame.rgba.len(), 16 * 12 * 4);
        let _ = std::fs::remove_file(path);
    }

    #[test]
    fn still_image_missing_file_errors_with_path() {
        let path = temp_file_path("missing");
        let err = StillImageSource::load(&path)
            .err()
            .expect("missing file should fail");
        assert!(err.contains("Failed to load backdrop"));
    }
}
