//! Sensor device abstraction
//!
//! The panel talks to the tactile sensor through the `SensorDevice` trait so
//! the capture controller can be driven against a fake implementation in
//! tests. The real sensor enumerates as a UVC camera; see [`uvc`].

pub mod uvc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum LED intensity accepted by the sensor
pub const LIGHTING_MIN: u8 = 0;
/// Maximum LED intensity accepted by the sensor
pub const LIGHTING_MAX: u8 = 15;

/// Video resolution modes supported by the sensor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum VideoMode {
    /// 320x240 at a nominal 60fps
    #[default]
    Qvga,
    /// 640x480 at a nominal 30fps
    Vga,
}

impl VideoMode {
    /// Frame resolution as (width, height)
    pub fn resolution(&self) -> (u32, u32) {
        match self {
            VideoMode::Qvga => (320, 240),
            VideoMode::Vga => (640, 480),
        }
    }

    /// Nominal stream rate in frames per second
    pub fn fps(&self) -> u32 {
        match self {
            VideoMode::Qvga => 60,
            VideoMode::Vga => 30,
        }
    }

    /// Short tag used in saved frame filenames
    pub fn label(&self) -> &'static str {
        match self {
            VideoMode::Qvga => "QVGA",
            VideoMode::Vga => "VGA",
        }
    }

    /// Get display name for UI
    pub fn display_name(&self) -> String {
        format!("{} {}fps", self.label(), self.fps())
    }

    /// All selectable modes, in combo-box order
    pub fn all() -> [VideoMode; 2] {
        [VideoMode::Qvga, VideoMode::Vga]
    }
}

/// A single raw frame pulled from the sensor (tightly packed RGB8)
#[derive(Clone)]
pub struct RawFrame {
    /// RGB pixel data, `width * height * 3` bytes
    pub data: Vec<u8>,
    /// Frame width
    pub width: u32,
    /// Frame height
    pub height: u32,
}

/// Information about an attached sensor
#[derive(Clone, Debug)]
pub struct SensorInfo {
    /// Camera index assigned by the OS backend
    pub index: u32,
    /// Human-readable device name
    pub name: String,
}

/// Device-level failures
#[derive(Debug, Error)]
pub enum DeviceError {
    /// No sensor attached, or the handle has been dropped
    #[error("no tactile sensor connected")]
    Unavailable,
    /// The stream could not be opened or reconfigured
    #[error("failed to open sensor stream: {0}")]
    Open(String),
    /// A single frame request failed
    #[error("frame acquisition failed: {0}")]
    Acquisition(String),
    /// A control write (LED intensity) was rejected
    #[error("failed to apply sensor control: {0}")]
    Control(String),
}

/// Capability interface over the sensor driver.
///
/// Calls are synchronous and assumed fast; the adapter is not reentrant, so
/// exactly one caller (preview loop or capture session) may touch it at a
/// time.
pub trait SensorDevice {
    /// Set LED intensity, `LIGHTING_MIN..=LIGHTING_MAX`
    fn set_intensity(&mut self, value: u8) -> Result<(), DeviceError>;

    /// Switch video mode, reconfiguring the stream
    fn set_mode(&mut self, mode: VideoMode) -> Result<(), DeviceError>;

    /// Pull one frame from the stream
    fn get_frame(&mut self) -> Result<RawFrame, DeviceError>;

    /// Whether the underlying handle is still usable
    fn is_connected(&self) -> bool;

    /// Release the device; further calls return [`DeviceError::Unavailable`]
    fn disconnect(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_resolutions() {
        assert_eq!(VideoMode::Qvga.resolution(), (320, 240));
        assert_eq!(VideoMode::Vga.resolution(), (640, 480));
    }

    #[test]
    fn test_mode_labels() {
        assert_eq!(VideoMode::Qvga.label(), "QVGA");
        assert_eq!(VideoMode::Vga.display_name(), "VGA 30fps");
    }
}
