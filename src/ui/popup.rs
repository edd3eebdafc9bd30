//! Modal connection dialogs

use eframe::egui;

/// What the operator chose in a popup
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopupAction {
    /// Try connecting again
    Retry,
    /// Close the application
    Exit,
    /// Dismiss the popup and carry on without a device
    Acknowledge,
}

/// A blocking notice with a fixed set of buttons
pub struct ConnectionPopup {
    title: &'static str,
    message: &'static str,
    retryable: bool,
}

impl ConnectionPopup {
    /// Startup connection failure, with Retry/Exit
    pub fn connection_failed() -> Self {
        Self {
            title: "Connection Failed",
            message: "Failed to connect to a tactile sensor.",
            retryable: true,
        }
    }

    /// Device vanished while streaming; capture stays disabled once dismissed
    pub fn lost_connection() -> Self {
        Self {
            title: "Lost Connection",
            message: "Lost connection to the sensor.\nCapture is disabled until it is reconnected.",
            retryable: false,
        }
    }

    /// Show the popup centered over the main window
    pub fn show(&self, ctx: &egui::Context) -> Option<PopupAction> {
        let mut action = None;

        egui::Window::new(self.title)
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::Vec2::ZERO)
            .show(ctx, |ui| {
                ui.vertical_centered(|ui| {
                    ui.add_space(8.0);
                    ui.label(self.message);
                    ui.add_space(12.0);
                    ui.horizontal(|ui| {
                        if self.retryable {
                            if ui.button("Retry").clicked() {
                                action = Some(PopupAction::Retry);
                            }
                            if ui.button("Exit").clicked() {
                                action = Some(PopupAction::Exit);
                            }
                        } else if ui.button("OK").clicked() {
                            action = Some(PopupAction::Acknowledge);
                        }
                    });
                    ui.add_space(4.0);
                });
            });

        action
    }
}
