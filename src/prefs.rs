//! Preference persistence
//!
//! A small JSON record (save directory, LED intensity, video mode,
//! interaction number, frame count, countdown) loaded once at startup and
//! written through on every change. Loading never fails the caller: a
//! missing or unreadable file falls back to defaults, and out-of-range
//! values are clamped into range.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::device::{VideoMode, LIGHTING_MAX, LIGHTING_MIN};

/// Interaction numbers are operator-visible, `1..=9999`
pub const INTERACTION_MIN: u16 = 1;
pub const INTERACTION_MAX: u16 = 9999;

/// Frames per batch capture, `1..=600`
pub const FRAME_COUNT_MIN: u16 = 1;
pub const FRAME_COUNT_MAX: u16 = 600;

/// Countdown before the first acquisition, in whole seconds, `0..=10`
pub const COUNTDOWN_MAX: u8 = 10;

/// Persisted preference record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Preferences {
    /// Directory captured frames are written to
    #[serde(rename = "saveDirectory", default = "default_save_directory")]
    pub save_directory: PathBuf,

    /// LED intensity, `LIGHTING_MIN..=LIGHTING_MAX`
    #[serde(rename = "ledIntensity", default = "default_led_intensity")]
    pub led_intensity: u8,

    /// Sensor video mode
    #[serde(rename = "videoMode", default)]
    pub video_mode: VideoMode,

    /// Interaction number stamped on the next capture
    #[serde(rename = "interactionNumber", default = "default_interaction_number")]
    pub interaction_number: u16,

    /// Frames saved per capture (1 = single frame)
    #[serde(rename = "frameCount", default = "default_frame_count")]
    pub frame_count: u16,

    /// Seconds between trigger and first acquisition
    #[serde(rename = "countdownSeconds", default = "default_countdown_seconds")]
    pub countdown_seconds: u8,
}

fn default_save_directory() -> PathBuf {
    PathBuf::from("captures")
}

fn default_led_intensity() -> u8 {
    LIGHTING_MAX
}

fn default_interaction_number() -> u16 {
    INTERACTION_MIN
}

fn default_frame_count() -> u16 {
    FRAME_COUNT_MIN
}

fn default_countdown_seconds() -> u8 {
    3
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            save_directory: default_save_directory(),
            led_intensity: default_led_intensity(),
            video_mode: VideoMode::default(),
            interaction_number: default_interaction_number(),
            frame_count: default_frame_count(),
            countdown_seconds: default_countdown_seconds(),
        }
    }
}

impl Preferences {
    /// Clamp every numeric field into its declared range
    pub fn sanitize(&mut self) {
        self.led_intensity = self.led_intensity.clamp(LIGHTING_MIN, LIGHTING_MAX);
        self.interaction_number = self.interaction_number.clamp(INTERACTION_MIN, INTERACTION_MAX);
        self.frame_count = self.frame_count.clamp(FRAME_COUNT_MIN, FRAME_COUNT_MAX);
        self.countdown_seconds = self.countdown_seconds.min(COUNTDOWN_MAX);
    }
}

/// Persistence failures (non-fatal; the in-memory record stays authoritative)
#[derive(Debug, Error)]
pub enum PrefsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("could not find config directory")]
    NoConfigDir,
}

/// Owns the in-memory record and its on-disk location.
///
/// Mutation goes through the clamping setters only; each one persists
/// synchronously before returning.
pub struct PrefStore {
    path: Option<PathBuf>,
    prefs: Preferences,
}

impl PrefStore {
    /// Get the preferences file path
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|mut p| {
            p.push("TactilePanel");
            p.push("prefs.json");
            p
        })
    }

    /// Load preferences from the config directory.
    ///
    /// Missing config dir, missing file, or a corrupt record all yield
    /// defaults; the corrupt case is logged and the file is overwritten on
    /// the next set.
    pub fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(path),
            None => {
                log::warn!("No config directory available, preferences will not persist");
                Self {
                    path: None,
                    prefs: Preferences::default(),
                }
            }
        }
    }

    /// Load preferences from an explicit path
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let prefs = Self::read_record(&path);
        Self {
            path: Some(path),
            prefs,
        }
    }

    fn read_record(path: &Path) -> Preferences {
        if !path.exists() {
            return Preferences::default();
        }

        let mut prefs = match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<Preferences>(&contents) {
                Ok(p) => p,
                Err(e) => {
                    log::warn!("Corrupt preferences file, using defaults: {}", e);
                    Preferences::default()
                }
            },
            Err(e) => {
                log::warn!("Failed to read preferences, using defaults: {}", e);
                Preferences::default()
            }
        };
        prefs.sanitize();
        prefs
    }

    /// Read-only view of the current record
    pub fn prefs(&self) -> &Preferences {
        &self.prefs
    }

    pub fn save_directory(&self) -> &Path {
        &self.prefs.save_directory
    }

    pub fn led_intensity(&self) -> u8 {
        self.prefs.led_intensity
    }

    pub fn video_mode(&self) -> VideoMode {
        self.prefs.video_mode
    }

    pub fn interaction_number(&self) -> u16 {
        self.prefs.interaction_number
    }

    pub fn frame_count(&self) -> u16 {
        self.prefs.frame_count
    }

    pub fn countdown_seconds(&self) -> u8 {
        self.prefs.countdown_seconds
    }

    pub fn set_save_directory(&mut self, dir: impl Into<PathBuf>) -> Result<(), PrefsError> {
        self.prefs.save_directory = dir.into();
        self.persist()
    }

    pub fn set_led_intensity(&mut self, value: u8) -> Result<(), PrefsError> {
        self.prefs.led_intensity = value.clamp(LIGHTING_MIN, LIGHTING_MAX);
        self.persist()
    }

    pub fn set_video_mode(&mut self, mode: VideoMode) -> Result<(), PrefsError> {
        self.prefs.video_mode = mode;
        self.persist()
    }

    pub fn set_interaction_number(&mut self, value: u16) -> Result<(), PrefsError> {
        self.prefs.interaction_number = value.clamp(INTERACTION_MIN, INTERACTION_MAX);
        self.persist()
    }

    pub fn set_frame_count(&mut self, value: u16) -> Result<(), PrefsError> {
        self.prefs.frame_count = value.clamp(FRAME_COUNT_MIN, FRAME_COUNT_MAX);
        self.persist()
    }

    pub fn set_countdown_seconds(&mut self, value: u8) -> Result<(), PrefsError> {
        self.prefs.countdown_seconds = value.min(COUNTDOWN_MAX);
        self.persist()
    }

    /// Advance the interaction number by exactly one, wrapping 9999 back
    /// to 1.
    pub fn advance_interaction(&mut self) -> Result<(), PrefsError> {
        self.prefs.interaction_number = if self.prefs.interaction_number >= INTERACTION_MAX {
            INTERACTION_MIN
        } else {
            self.prefs.interaction_number + 1
        };
        self.persist()
    }

    /// Serialize the full record to disk
    fn persist(&self) -> Result<(), PrefsError> {
        let Some(path) = &self.path else {
            return Err(PrefsError::NoConfigDir);
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let json = serde_json::to_string_pretty(&self.prefs)?;
        fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_in(dir: &tempfile::TempDir) -> PrefStore {
        PrefStore::load_from(dir.path().join("prefs.json"))
    }

    #[test]
    fn test_default_preferences() {
        let prefs = Preferences::default();
        assert_eq!(prefs.led_intensity, LIGHTING_MAX);
        assert_eq!(prefs.video_mode, VideoMode::Qvga);
        assert_eq!(prefs.interaction_number, 1);
        assert_eq!(prefs.frame_count, 1);
        assert_eq!(prefs.countdown_seconds, 3);
    }

    #[test]
    fn test_setters_clamp_out_of_range_values() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.set_frame_count(700).unwrap();
        assert_eq!(store.frame_count(), 600);

        store.set_countdown_seconds(15).unwrap();
        assert_eq!(store.countdown_seconds(), 10);

        store.set_interaction_number(0).unwrap();
        assert_eq!(store.interaction_number(), 1);

        store.set_led_intensity(200).unwrap();
        assert_eq!(store.led_intensity(), 15);
    }

    #[test]
    fn test_interaction_wraps_at_maximum() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        store.set_interaction_number(INTERACTION_MAX).unwrap();
        store.advance_interaction().unwrap();
        assert_eq!(store.interaction_number(), INTERACTION_MIN);

        // Repeated advances never exceed the maximum
        for _ in 0..3 {
            store.advance_interaction().unwrap();
            assert!(store.interaction_number() <= INTERACTION_MAX);
        }
    }

    #[test]
    fn test_reload_returns_persisted_values() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        {
            let mut store = PrefStore::load_from(&path);
            store.set_led_intensity(7).unwrap();
            store.set_video_mode(VideoMode::Vga).unwrap();
            store.set_interaction_number(42).unwrap();
        }

        let store = PrefStore::load_from(&path);
        assert_eq!(store.led_intensity(), 7);
        assert_eq!(store.video_mode(), VideoMode::Vga);
        assert_eq!(store.interaction_number(), 42);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, "{ not json").unwrap();

        let store = PrefStore::load_from(&path);
        assert_eq!(store.led_intensity(), LIGHTING_MAX);
        assert_eq!(store.interaction_number(), 1);
    }

    #[test]
    fn test_out_of_range_values_on_disk_are_clamped_on_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(
            &path,
            r#"{"ledIntensity": 99, "interactionNumber": 0, "frameCount": 5000, "countdownSeconds": 120}"#,
        )
        .unwrap();

        let store = PrefStore::load_from(&path);
        assert_eq!(store.led_intensity(), LIGHTING_MAX);
        assert_eq!(store.interaction_number(), 1);
        assert_eq!(store.frame_count(), 600);
        assert_eq!(store.countdown_seconds(), 10);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"ledIntensity": 4}"#).unwrap();

        let store = PrefStore::load_from(&path);
        assert_eq!(store.led_intensity(), 4);
        assert_eq!(store.frame_count(), 1);
        assert_eq!(store.video_mode(), VideoMode::Qvga);
    }

    #[test]
    fn test_unwritable_path_keeps_in_memory_value() {
        // Persisting under a path whose parent is a file must fail, but the
        // in-memory value stays authoritative.
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "x").unwrap();

        let mut store = PrefStore::load_from(blocker.join("prefs.json"));
        assert!(store.set_led_intensity(5).is_err());
        assert_eq!(store.led_intensity(), 5);
    }
}
