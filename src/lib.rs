//! Tactile Panel
//!
//! A settings-and-capture panel for a DIGIT-class tactile imaging sensor:
//! device configuration, live preview, and single or batch frame capture
//! with auto-incrementing interaction numbers.

pub mod app;
pub mod capture;
pub mod device;
pub mod frame;
pub mod prefs;
pub mod ui;

// Re-export commonly used types
pub use app::TactilePanelApp;
pub use capture::{CaptureError, CaptureMode, CaptureRequest, CaptureSession, SessionState};
pub use device::{RawFrame, SensorDevice, SensorInfo, VideoMode};
pub use prefs::{PrefStore, Preferences};
