//! Live preview panel
//!
//! Shows the most recent sensor frame as an egui texture, plus the capture
//! trigger and status line.

use eframe::egui::{self, TextureHandle, TextureOptions};

use crate::device::RawFrame;
use crate::frame;

/// Operator action from the preview panel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewAction {
    Capture,
    Cancel,
}

/// Preview panel UI component
#[derive(Default)]
pub struct PreviewPanel {
    /// Most recent frame, uploaded as a texture
    texture: Option<TextureHandle>,
}

impl PreviewPanel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upload a freshly pulled frame for display
    pub fn update_frame(&mut self, ctx: &egui::Context, frame: &RawFrame) {
        let image = frame::to_color_image(frame);
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("live-preview", image, TextureOptions::LINEAR))
            }
        }
    }

    /// Show the preview with the capture controls underneath.
    ///
    /// While `capturing`, the trigger is replaced with a cancel button and
    /// the last uploaded frame stays on screen.
    pub fn show(
        &mut self,
        ui: &mut egui::Ui,
        status: &str,
        capturing: bool,
        capture_enabled: bool,
    ) -> Option<PreviewAction> {
        let mut action = None;

        ui.vertical_centered(|ui| {
            ui.heading("Live Preview");
            ui.separator();

            match &self.texture {
                Some(texture) => {
                    let size = texture.size_vec2();
                    let available = ui.available_width().max(1.0);
                    let scale = (available / size.x).min(1.5);
                    ui.image((texture.id(), size * scale));
                }
                None => {
                    ui.add_space(40.0);
                    ui.label(egui::RichText::new("No signal").weak());
                    ui.add_space(40.0);
                }
            }

            ui.add_space(8.0);

            if capturing {
                if ui.button("Cancel").clicked() {
                    action = Some(PreviewAction::Cancel);
                }
            } else if ui
                .add_enabled(capture_enabled, egui::Button::new("Capture"))
                .clicked()
            {
                action = Some(PreviewAction::Capture);
            }

            ui.add_space(4.0);
            ui.label(status);
        });

        action
    }
}
