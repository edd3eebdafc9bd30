//! Frame conversion and encoding
//!
//! Turns raw sensor frames into egui textures for the preview and into PNG
//! files for capture.

use std::path::Path;

use egui::ColorImage;
use image::RgbImage;
use thiserror::Error;

use crate::device::RawFrame;

/// Frame save failures
#[derive(Debug, Error)]
pub enum WriteError {
    /// Pixel buffer length does not match the declared dimensions
    #[error("frame buffer does not match its declared dimensions")]
    MalformedFrame,
    /// Encoding or disk write failed
    #[error("failed to write image: {0}")]
    Encode(#[from] image::ImageError),
}

/// Convert a raw frame into a displayable egui image
pub fn to_color_image(frame: &RawFrame) -> ColorImage {
    ColorImage::from_rgb([frame.width as usize, frame.height as usize], &frame.data)
}

/// Encode a raw frame as PNG at `path`
pub fn save_frame(frame: &RawFrame, path: &Path) -> Result<(), WriteError> {
    let image = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
        .ok_or(WriteError::MalformedFrame)?;
    image.save(path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_frame(width: u32, height: u32) -> RawFrame {
        RawFrame {
            data: vec![128; (width * height * 3) as usize],
            width,
            height,
        }
    }

    #[test]
    fn test_to_color_image_dimensions() {
        let image = to_color_image(&test_frame(320, 240));
        assert_eq!(image.size, [320, 240]);
    }

    #[test]
    fn test_save_frame_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("0001_000_QVGA.png");
        save_frame(&test_frame(8, 6), &path).unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_save_frame_rejects_short_buffer() {
        let mut frame = test_frame(8, 6);
        frame.data.truncate(10);
        let dir = tempfile::tempdir().unwrap();
        let result = save_frame(&frame, &dir.path().join("bad.png"));
        assert!(matches!(result, Err(WriteError::MalformedFrame)));
    }
}
