//! Sensor and capture settings panel
//!
//! Edits go straight into the preference store (write-through); changes that
//! must also reach the device are reported back to the app as
//! [`SettingsChange`] values.

use eframe::egui;

use crate::device::{VideoMode, LIGHTING_MAX, LIGHTING_MIN};
use crate::prefs::{
    PrefStore, COUNTDOWN_MAX, FRAME_COUNT_MAX, FRAME_COUNT_MIN, INTERACTION_MAX, INTERACTION_MIN,
};

/// A preference edit the device needs to hear about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingsChange {
    Intensity(u8),
    Mode(VideoMode),
}

/// Settings panel UI component
#[derive(Default)]
pub struct SettingsPanel {}

impl SettingsPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Show the panel. Controls are disabled while a capture is in flight.
    /// Returns the changes the device must be told about.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        prefs: &mut PrefStore,
        enabled: bool,
    ) -> Vec<SettingsChange> {
        let mut changes = Vec::new();

        ui.add_enabled_ui(enabled, |ui| {
            ui.heading("Sensor");
            ui.separator();

            let mut intensity = prefs.led_intensity();
            ui.horizontal(|ui| {
                ui.label("RGB intensity:");
                if ui
                    .add(egui::Slider::new(&mut intensity, LIGHTING_MIN..=LIGHTING_MAX))
                    .changed()
                {
                    if let Err(e) = prefs.set_led_intensity(intensity) {
                        log::warn!("Failed to save preferences: {}", e);
                    }
                    changes.push(SettingsChange::Intensity(prefs.led_intensity()));
                }
            });

            let mut mode = prefs.video_mode();
            ui.horizontal(|ui| {
                ui.label("Stream mode:");
                egui::ComboBox::from_id_source("video_mode")
                    .selected_text(mode.display_name())
                    .show_ui(ui, |ui| {
                        for option in VideoMode::all() {
                            ui.selectable_value(&mut mode, option, option.display_name());
                        }
                    });
            });
            if mode != prefs.video_mode() {
                if let Err(e) = prefs.set_video_mode(mode) {
                    log::warn!("Failed to save preferences: {}", e);
                }
                changes.push(SettingsChange::Mode(mode));
            }

            ui.add_space(12.0);
            ui.heading("Capture");
            ui.separator();

            ui.horizontal(|ui| {
                ui.label("Save directory:");
            });
            ui.horizontal(|ui| {
                ui.label(
                    egui::RichText::new(prefs.save_directory().display().to_string()).weak(),
                );
                if ui.button("Browse…").clicked() {
                    if let Some(path) = rfd::FileDialog::new().pick_folder() {
                        if let Err(e) = prefs.set_save_directory(path) {
                            log::warn!("Failed to save preferences: {}", e);
                        }
                    }
                }
            });

            let mut frame_count = prefs.frame_count();
            ui.horizontal(|ui| {
                ui.label("Frames per capture:");
                if ui
                    .add(
                        egui::DragValue::new(&mut frame_count)
                            .clamp_range(FRAME_COUNT_MIN..=FRAME_COUNT_MAX),
                    )
                    .changed()
                {
                    if let Err(e) = prefs.set_frame_count(frame_count) {
                        log::warn!("Failed to save preferences: {}", e);
                    }
                }
            });

            let mut countdown = prefs.countdown_seconds();
            ui.horizontal(|ui| {
                ui.label("Countdown (s):");
                if ui
                    .add(egui::DragValue::new(&mut countdown).clamp_range(0..=COUNTDOWN_MAX))
                    .changed()
                {
                    if let Err(e) = prefs.set_countdown_seconds(countdown) {
                        log::warn!("Failed to save preferences: {}", e);
                    }
                }
            });

            let mut interaction = prefs.interaction_number();
            ui.horizontal(|ui| {
                ui.label("Interaction number:");
                if ui
                    .add(
                        egui::DragValue::new(&mut interaction)
                            .clamp_range(INTERACTION_MIN..=INTERACTION_MAX),
                    )
                    .changed()
                {
                    if let Err(e) = prefs.set_interaction_number(interaction) {
                        log::warn!("Failed to save preferences: {}", e);
                    }
                }
            });
        });

        changes
    }
}
