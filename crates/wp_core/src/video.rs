//! Video frames as seen by the game: an RGBA8 buffer of known size.
//!
//! Capture devices are outside this crate. Anything that can hand out the most
//! recent frame implements [`VideoSource`]; the frame controller draws it as the
//! backdrop and pose sources read its size for coordinate mapping.

#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major, unpremultiplied RGBA8; `width * height * 4` bytes.
    pub rgba: Vec<u8>,
    /// Bumped by the source whenever the pixels change.
    pub generation: u64,
}

impl VideoFrame {
    pub fn new(width: u32, height: u32, rgba: Vec<u8>, generation: u64) -> Result<Self, String> {
        let expected = width as usize * height as usize * 4;
        if rgba.len() != expected {
            return Err(format!(
                "Video frame {}x{} needs {} bytes, got {}",
                width,
                height,
                expected,
                rgba.len()
            ));
        }
        Ok(Self {
            width,
            height,
            rgba,
            generation,
        })
    }

    pub fn solid(width: u32, height: u32, color: [u8; 4], generation: u64) -> Self {
        let pixels = width as usize * height as usize;
        let mut rgba = Vec::with_capacity(pixels * 4);
        for _ in 0..pixels {
            rgba.extend_from_slice(&color);
        }
        Self {
            width,
            height,
            rgba,
            generation,
        }
    }
}

pub trait VideoSource {
    /// Nominal capture size in pixels.
    fn size(&self) -> (u32, u32);

    /// Most recent frame, if the device has produced one yet.
    fn frame(&self) -> Option<&VideoFrame>;

    /// Give the source a chance to pull a new frame. Called once per render pass.
    fn poll(&mut self) {}
}
