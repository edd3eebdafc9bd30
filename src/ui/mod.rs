//! UI panels and dialogs

mod popup;
mod preview_panel;
mod settings_panel;

pub use popup::{ConnectionPopup, PopupAction};
pub use preview_panel::{PreviewAction, PreviewPanel};
pub use settings_panel::{SettingsChange, SettingsPanel};
