//! Capture session controller
//!
//! Drives one capture operation from trigger to completion:
//! countdown, acquisition, save, all as discrete steps the UI loop schedules.
//! The session never sleeps or spins; `tick` advances the countdown once per
//! scheduled second and `step` acquires and saves exactly one frame, so
//! cancellation is observed between steps and never mid-device-call.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::device::{DeviceError, SensorDevice, VideoMode};
use crate::frame::{self, WriteError};
use crate::prefs::PrefStore;

/// Whether a session saves one frame or a timed run of frames
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    Single,
    Batch,
}

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Waiting out the operator-visible countdown
    CountingDown,
    /// Requesting the next frame from the device
    Acquiring,
    /// Writing the just-acquired frame to disk
    Saving,
    /// All requested frames saved
    Complete,
    /// Operator cancelled before completion
    Cancelled,
    /// Acquisition or save failed; frames already written stay on disk
    Failed,
}

impl SessionState {
    /// Terminal states end the session
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SessionState::Complete | SessionState::Cancelled | SessionState::Failed
        )
    }
}

/// Capture-level failures, surfaced as status text at the app boundary
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("no tactile sensor connected")]
    DeviceUnavailable,
    #[error("cannot create save directory: {0}")]
    Directory(#[from] std::io::Error),
    #[error(transparent)]
    Acquisition(DeviceError),
    #[error("failed to save frame {index}: {source}")]
    Write { index: u16, source: WriteError },
}

/// Everything a session needs, snapshotted at trigger time
#[derive(Debug, Clone)]
pub struct CaptureRequest {
    pub frames_requested: u16,
    pub countdown_seconds: u8,
    pub target_dir: PathBuf,
    pub interaction_number: u16,
    pub video_mode: VideoMode,
}

impl CaptureRequest {
    /// Snapshot the current preferences into a request
    pub fn from_prefs(store: &PrefStore) -> Self {
        Self {
            frames_requested: store.frame_count(),
            countdown_seconds: store.countdown_seconds(),
            target_dir: store.save_directory().to_path_buf(),
            interaction_number: store.interaction_number(),
            video_mode: store.video_mode(),
        }
    }
}

/// One in-flight capture operation.
///
/// Created per trigger and discarded once terminal. The app represents the
/// idle state by holding no session at all.
pub struct CaptureSession {
    mode: CaptureMode,
    state: SessionState,
    remaining_countdown: u8,
    frames_requested: u16,
    frames_captured: u16,
    target_dir: PathBuf,
    base_interaction: u16,
    video_mode: VideoMode,
}

impl CaptureSession {
    /// Start a session from a request.
    ///
    /// Fails with [`CaptureError::DeviceUnavailable`] before any state is
    /// created when the device is not connected. A zero countdown skips
    /// straight to acquisition.
    pub fn begin(request: CaptureRequest, device: &dyn SensorDevice) -> Result<Self, CaptureError> {
        if !device.is_connected() {
            return Err(CaptureError::DeviceUnavailable);
        }

        fs::create_dir_all(&request.target_dir)?;

        let mode = if request.frames_requested > 1 {
            CaptureMode::Batch
        } else {
            CaptureMode::Single
        };
        let state = if request.countdown_seconds == 0 {
            SessionState::Acquiring
        } else {
            SessionState::CountingDown
        };

        log::info!(
            "Capture started: {} frame(s), {}s countdown, interaction {}",
            request.frames_requested,
            request.countdown_seconds,
            request.interaction_number
        );

        Ok(Self {
            mode,
            state,
            remaining_countdown: request.countdown_seconds,
            frames_requested: request.frames_requested.max(1),
            frames_captured: 0,
            target_dir: request.target_dir,
            base_interaction: request.interaction_number,
            video_mode: request.video_mode,
        })
    }

    pub fn mode(&self) -> CaptureMode {
        self.mode
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Seconds left on the countdown (UI-visible)
    pub fn remaining_countdown(&self) -> u8 {
        self.remaining_countdown
    }

    pub fn frames_captured(&self) -> u16 {
        self.frames_captured
    }

    pub fn frames_requested(&self) -> u16 {
        self.frames_requested
    }

    /// Deterministic path for the frame at `index`:
    /// `<interaction:04>_<index:03>_<MODE>.png`
    pub fn frame_path(&self, index: u16) -> PathBuf {
        self.target_dir.join(format!(
            "{:04}_{:03}_{}.png",
            self.base_interaction,
            index,
            self.video_mode.label()
        ))
    }

    /// Advance the countdown by one scheduled second.
    ///
    /// No-op outside `CountingDown`. Transitions to `Acquiring` when the
    /// countdown reaches zero.
    pub fn tick(&mut self) -> SessionState {
        if self.state == SessionState::CountingDown {
            self.remaining_countdown = self.remaining_countdown.saturating_sub(1);
            if self.remaining_countdown == 0 {
                self.state = SessionState::Acquiring;
            }
        }
        self.state
    }

    /// Cancel the session between scheduled steps.
    ///
    /// Performs no device I/O; frames already written stay on disk. No-op
    /// once terminal.
    pub fn cancel(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::Cancelled;
            log::info!(
                "Capture cancelled after {}/{} frame(s)",
                self.frames_captured,
                self.frames_requested
            );
        }
    }

    /// Mark the session failed between scheduled steps, for device loss
    /// observed outside `step` (the preview pull is where a vanished sensor
    /// usually surfaces first).
    ///
    /// Frames already written stay on disk. No-op once terminal.
    pub fn fail(&mut self) {
        if !self.state.is_terminal() {
            self.state = SessionState::Failed;
            log::warn!(
                "Capture failed after {}/{} frame(s): sensor lost",
                self.frames_captured,
                self.frames_requested
            );
        }
    }

    /// Acquire and save exactly one frame.
    ///
    /// Acquisition failure or a write failure for frame *i* ends the session
    /// `Failed`, keeping frames `0..i` on disk. Returns the resulting state
    /// on success.
    pub fn step(&mut self, device: &mut dyn SensorDevice) -> Result<SessionState, CaptureError> {
        if self.state != SessionState::Acquiring {
            return Ok(self.state);
        }

        let frame = match device.get_frame() {
            Ok(frame) => frame,
            Err(e) => {
                self.state = SessionState::Failed;
                log::warn!(
                    "Acquisition failed on frame {}/{}: {}",
                    self.frames_captured + 1,
                    self.frames_requested,
                    e
                );
                return Err(CaptureError::Acquisition(e));
            }
        };

        self.state = SessionState::Saving;
        let path = self.frame_path(self.frames_captured);
        if let Err(e) = frame::save_frame(&frame, &path) {
            self.state = SessionState::Failed;
            log::warn!("Save failed at {}: {}", path.display(), e);
            return Err(CaptureError::Write {
                index: self.frames_captured,
                source: e,
            });
        }

        self.frames_captured += 1;
        self.state = if self.frames_captured == self.frames_requested {
            log::info!(
                "Capture complete: {} frame(s) in {}",
                self.frames_captured,
                self.target_dir.display()
            );
            SessionState::Complete
        } else {
            SessionState::Acquiring
        };
        Ok(self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use crate::device::RawFrame;

    /// List the saved frame files a directory holds, sorted by name
    fn saved_frames(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .map(|entries| {
                entries
                    .filter_map(|e| e.ok())
                    .filter(|e| e.path().is_file())
                    .map(|e| e.file_name().to_string_lossy().into_owned())
                    .collect()
            })
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Scripted in-memory sensor for driving the session
    struct FakeSensor {
        connected: bool,
        frame_calls: usize,
        /// 1-based call number that should fail, if any
        fail_on_call: Option<usize>,
    }

    impl FakeSensor {
        fn connected() -> Self {
            Self {
                connected: true,
                frame_calls: 0,
                fail_on_call: None,
            }
        }

        fn disconnected() -> Self {
            Self {
                connected: false,
                frame_calls: 0,
                fail_on_call: None,
            }
        }

        fn failing_on(call: usize) -> Self {
            Self {
                fail_on_call: Some(call),
                ..Self::connected()
            }
        }
    }

    impl SensorDevice for FakeSensor {
        fn set_intensity(&mut self, _value: u8) -> Result<(), DeviceError> {
            Ok(())
        }

        fn set_mode(&mut self, _mode: VideoMode) -> Result<(), DeviceError> {
            Ok(())
        }

        fn get_frame(&mut self) -> Result<RawFrame, DeviceError> {
            self.frame_calls += 1;
            if self.fail_on_call == Some(self.frame_calls) {
                return Err(DeviceError::Acquisition("injected fault".into()));
            }
            Ok(RawFrame {
                data: vec![0; 4 * 4 * 3],
                width: 4,
                height: 4,
            })
        }

        fn is_connected(&self) -> bool {
            self.connected
        }

        fn disconnect(&mut self) {
            self.connected = false;
        }
    }

    fn request(dir: &Path, frames: u16, countdown: u8) -> CaptureRequest {
        CaptureRequest {
            frames_requested: frames,
            countdown_seconds: countdown,
            target_dir: dir.to_path_buf(),
            interaction_number: 7,
            video_mode: VideoMode::Qvga,
        }
    }

    #[test]
    fn test_begin_requires_connected_device() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeSensor::disconnected();
        let result = CaptureSession::begin(request(dir.path(), 3, 0), &device);
        assert!(matches!(result, Err(CaptureError::DeviceUnavailable)));
    }

    #[test]
    fn test_zero_countdown_skips_to_acquiring() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeSensor::connected();
        let session = CaptureSession::begin(request(dir.path(), 1, 0), &device).unwrap();
        assert_eq!(session.state(), SessionState::Acquiring);
        assert_eq!(session.mode(), CaptureMode::Single);
    }

    #[test]
    fn test_countdown_ticks_down_to_acquiring() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeSensor::connected();
        let mut session = CaptureSession::begin(request(dir.path(), 2, 3), &device).unwrap();
        assert_eq!(session.state(), SessionState::CountingDown);

        assert_eq!(session.tick(), SessionState::CountingDown);
        assert_eq!(session.remaining_countdown(), 2);
        assert_eq!(session.tick(), SessionState::CountingDown);
        assert_eq!(session.tick(), SessionState::Acquiring);
    }

    #[test]
    fn test_cancel_during_countdown_touches_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = FakeSensor::connected();
        let mut session = CaptureSession::begin(request(dir.path(), 5, 3), &device).unwrap();

        session.tick();
        session.cancel();
        assert_eq!(session.state(), SessionState::Cancelled);

        // Stepping a cancelled session performs no device I/O
        assert_eq!(
            session.step(&mut device).unwrap(),
            SessionState::Cancelled
        );
        assert_eq!(device.frame_calls, 0);
        assert!(saved_frames(dir.path()).is_empty());
    }

    #[test]
    fn test_device_loss_during_countdown_fails_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PrefStore::load_from(dir.path().join("prefs.json"));
        store.set_save_directory(dir.path().join("captures")).unwrap();
        store.set_countdown_seconds(5).unwrap();

        let mut device = FakeSensor::connected();
        let mut session =
            CaptureSession::begin(CaptureRequest::from_prefs(&store), &device).unwrap();
        assert_eq!(session.state(), SessionState::CountingDown);

        session.tick();
        device.disconnect();
        session.fail();
        assert_eq!(session.state(), SessionState::Failed);

        // A failed session performs no further device I/O and writes nothing
        assert_eq!(session.step(&mut device).unwrap(), SessionState::Failed);
        assert_eq!(device.frame_calls, 0);
        assert_eq!(session.frames_captured(), 0);
        assert!(saved_frames(store.save_directory()).is_empty());
        assert_eq!(store.interaction_number(), 1);
    }

    #[test]
    fn test_batch_saves_every_frame_with_increasing_indices() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = FakeSensor::connected();
        let mut session = CaptureSession::begin(request(dir.path(), 5, 0), &device).unwrap();
        assert_eq!(session.mode(), CaptureMode::Batch);

        while session.state() == SessionState::Acquiring {
            session.step(&mut device).unwrap();
        }

        assert_eq!(session.state(), SessionState::Complete);
        let names = saved_frames(dir.path());
        assert_eq!(
            names,
            vec![
                "0007_000_QVGA.png",
                "0007_001_QVGA.png",
                "0007_002_QVGA.png",
                "0007_003_QVGA.png",
                "0007_004_QVGA.png",
            ]
        );
    }

    #[test]
    fn test_interaction_advances_by_one_regardless_of_batch_size() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = PrefStore::load_from(dir.path().join("prefs.json"));
        store.set_frame_count(8).unwrap();
        store.set_countdown_seconds(0).unwrap();
        store.set_save_directory(dir.path().join("captures")).unwrap();

        let mut device = FakeSensor::connected();
        let mut session =
            CaptureSession::begin(CaptureRequest::from_prefs(&store), &device).unwrap();
        while session.state() == SessionState::Acquiring {
            session.step(&mut device).unwrap();
        }
        assert_eq!(session.state(), SessionState::Complete);

        store.advance_interaction().unwrap();
        assert_eq!(store.interaction_number(), 2);
    }

    #[test]
    fn test_acquisition_failure_keeps_partial_batch() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = FakeSensor::failing_on(3);
        let mut session = CaptureSession::begin(request(dir.path(), 5, 0), &device).unwrap();

        session.step(&mut device).unwrap();
        session.step(&mut device).unwrap();
        let err = session.step(&mut device).unwrap_err();

        assert!(matches!(err, CaptureError::Acquisition(_)));
        assert_eq!(session.state(), SessionState::Failed);
        assert_eq!(session.frames_captured(), 2);
        assert_eq!(saved_frames(dir.path()).len(), 2);
    }

    #[test]
    fn test_write_failure_keeps_prior_frames() {
        let dir = tempfile::tempdir().unwrap();
        let mut device = FakeSensor::connected();
        let mut session = CaptureSession::begin(request(dir.path(), 4, 0), &device).unwrap();

        // Block the third frame's filename with a directory so the save fails
        fs::create_dir(session.frame_path(2)).unwrap();

        session.step(&mut device).unwrap();
        session.step(&mut device).unwrap();
        let err = session.step(&mut device).unwrap_err();

        assert!(matches!(err, CaptureError::Write { index: 2, .. }));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.frame_path(0).exists());
        assert!(session.frame_path(1).exists());
        assert!(!session.frame_path(3).exists());
    }

    #[test]
    fn test_frame_path_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let device = FakeSensor::connected();
        let session = CaptureSession::begin(request(dir.path(), 1, 0), &device).unwrap();
        assert_eq!(
            session.frame_path(12).file_name().unwrap(),
            "0007_012_QVGA.png"
        );
    }
}
