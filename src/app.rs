//! Main application state and UI glue
//!
//! One struct owns every piece of mutable state (preferences, device handle,
//! in-flight capture session, preview texture) and advances all of it from
//! the egui update cycle. Countdown ticks and capture steps are scheduled
//! work, never blocking loops, so cancellation is observed between steps.

use std::time::{Duration, Instant};

use eframe::egui;

use crate::capture::{CaptureRequest, CaptureSession, SessionState};
use crate::device::uvc::UvcSensor;
use crate::device::SensorDevice;
use crate::prefs::PrefStore;
use crate::ui::{
    ConnectionPopup, PopupAction, PreviewAction, PreviewPanel, SettingsChange, SettingsPanel,
};

const READY_STATUS: &str = "Ready to capture";

/// Main application state
pub struct TactilePanelApp {
    prefs: PrefStore,
    device: Option<Box<dyn SensorDevice>>,
    session: Option<CaptureSession>,

    // UI panels
    settings_panel: SettingsPanel,
    preview: PreviewPanel,
    popup: Option<ConnectionPopup>,
    status: String,

    // Scheduling
    last_tick: Instant,
    last_preview: Instant,
}

impl TactilePanelApp {
    /// Create the application, loading preferences and attempting the first
    /// device connection.
    pub fn new(_cc: &eframe::CreationContext<'_>) -> Self {
        let prefs = PrefStore::load();

        let mut app = Self {
            prefs,
            device: None,
            session: None,
            settings_panel: SettingsPanel::new(),
            preview: PreviewPanel::new(),
            popup: None,
            status: READY_STATUS.to_owned(),
            last_tick: Instant::now(),
            last_preview: Instant::now(),
        };
        app.try_connect();
        app
    }

    /// Connect to the first attached sensor, applying the persisted mode and
    /// intensity. Failure raises the Retry/Exit popup.
    fn try_connect(&mut self) {
        match UvcSensor::connect(self.prefs.video_mode(), self.prefs.led_intensity()) {
            Ok(sensor) => {
                log::info!("Sensor ready: {}", sensor.serial());
                self.device = Some(Box::new(sensor));
                self.popup = None;
                self.status = READY_STATUS.to_owned();
            }
            Err(e) => {
                log::warn!("Sensor connection failed: {}", e);
                self.device = None;
                self.popup = Some(ConnectionPopup::connection_failed());
            }
        }
    }

    fn capturing(&self) -> bool {
        self.session.is_some()
    }

    /// Whether a session currently owns the device (preview must not race it)
    fn mid_acquisition(&self) -> bool {
        matches!(
            self.session.as_ref().map(CaptureSession::state),
            Some(SessionState::Acquiring | SessionState::Saving)
        )
    }

    fn begin_capture(&mut self) {
        let Some(device) = self.device.as_deref() else {
            self.status = "No sensor connected".to_owned();
            return;
        };

        match CaptureSession::begin(CaptureRequest::from_prefs(&self.prefs), device) {
            Ok(session) => {
                self.last_tick = Instant::now();
                self.status = if session.state() == SessionState::CountingDown {
                    format!("Capturing in {}…", session.remaining_countdown())
                } else {
                    "Capturing…".to_owned()
                };
                self.session = Some(session);
            }
            Err(e) => {
                self.status = format!("Capture failed: {}", e);
            }
        }
    }

    /// Advance the in-flight session by at most one scheduled unit of work.
    fn advance_session(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        match session.state() {
            SessionState::CountingDown => {
                if self.last_tick.elapsed() >= Duration::from_secs(1) {
                    self.last_tick = Instant::now();
                    session.tick();
                }
                if session.state() == SessionState::CountingDown {
                    self.status = format!("Capturing in {}…", session.remaining_countdown());
                }
            }
            SessionState::Acquiring => match self.device.as_deref_mut() {
                Some(device) => match session.step(device) {
                    Ok(_) => {
                        self.status = format!(
                            "Capturing frame {}/{}",
                            session.frames_captured(),
                            session.frames_requested()
                        );
                    }
                    Err(e) => {
                        self.status = format!("Capture failed: {}", e);
                    }
                },
                None => {
                    session.fail();
                    self.status = "Capture failed: sensor disconnected".to_owned();
                }
            },
            _ => {}
        }

        if session.state().is_terminal() {
            match session.state() {
                SessionState::Complete => {
                    let saved = session.frames_captured();
                    if let Err(e) = self.prefs.advance_interaction() {
                        log::warn!("Failed to persist interaction number: {}", e);
                    }
                    self.status = format!(
                        "Saved {} frame(s), next interaction {}",
                        saved,
                        self.prefs.interaction_number()
                    );
                }
                SessionState::Cancelled => {
                    self.status = "Capture cancelled".to_owned();
                }
                // Failure status text was set where the failure was observed
                SessionState::Failed => {}
                _ => {}
            }
            self.session = None;
        }
    }

    /// Pull one frame for the preview, unless a capture owns the device.
    fn update_preview(&mut self, ctx: &egui::Context) {
        if self.mid_acquisition() {
            return;
        }

        let interval =
            Duration::from_millis(1000 / u64::from(self.prefs.video_mode().fps().max(1)));
        if self.last_preview.elapsed() < interval {
            return;
        }

        let Some(device) = self.device.as_deref_mut() else {
            return;
        };
        self.last_preview = Instant::now();

        match device.get_frame() {
            Ok(frame) => self.preview.update_frame(ctx, &frame),
            Err(e) => {
                log::warn!("Preview frame failed: {}", e);
                device.disconnect();
                self.device = None;
                self.popup = Some(ConnectionPopup::lost_connection());
                // Losing the sensor mid-session is a failure, not a cancel
                match self.session.as_mut() {
                    Some(session) => {
                        session.fail();
                        self.status = "Capture failed: sensor disconnected".to_owned();
                    }
                    None => self.status = "No sensor connected".to_owned(),
                }
            }
        }
    }

    /// Push a preference change through to the device.
    fn apply_change(&mut self, change: SettingsChange) {
        let Some(device) = self.device.as_deref_mut() else {
            return;
        };

        let result = match change {
            SettingsChange::Intensity(value) => device.set_intensity(value),
            SettingsChange::Mode(mode) => device.set_mode(mode),
        };

        if let Err(e) = result {
            log::warn!("Failed to apply sensor setting: {}", e);
            self.status = format!("Sensor error: {}", e);
            if !device.is_connected() {
                self.device = None;
                self.popup = Some(ConnectionPopup::lost_connection());
            }
        }
    }
}

impl eframe::App for TactilePanelApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let popup_action = self.popup.as_ref().and_then(|popup| popup.show(ctx));
        match popup_action {
            Some(PopupAction::Retry) => self.try_connect(),
            Some(PopupAction::Exit) => ctx.send_viewport_cmd(egui::ViewportCommand::Close),
            Some(PopupAction::Acknowledge) => self.popup = None,
            None => {}
        }

        self.advance_session();
        self.update_preview(ctx);

        let capturing = self.capturing();
        let interactive = !capturing && self.popup.is_none();

        egui::SidePanel::left("settings")
            .resizable(false)
            .default_width(220.0)
            .show(ctx, |ui| {
                let changes = self.settings_panel.show(ui, &mut self.prefs, interactive);
                for change in changes {
                    self.apply_change(change);
                }
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            let capture_enabled = self.device.is_some() && self.popup.is_none();
            match self.preview.show(ui, &self.status, capturing, capture_enabled) {
                Some(PreviewAction::Capture) => self.begin_capture(),
                Some(PreviewAction::Cancel) => {
                    if let Some(session) = self.session.as_mut() {
                        session.cancel();
                    }
                }
                None => {}
            }
        });

        // Keep stepping while a capture is draining; otherwise wake at the
        // preview rate.
        if self.mid_acquisition() {
            ctx.request_repaint();
        } else if self.capturing() {
            ctx.request_repaint_after(Duration::from_millis(100));
        } else {
            let interval =
                Duration::from_millis(1000 / u64::from(self.prefs.video_mode().fps().max(1)));
            ctx.request_repaint_after(interval);
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        if let Some(device) = self.device.as_deref_mut() {
            device.disconnect();
        }
        log::info!("Shutting down");
    }
}
