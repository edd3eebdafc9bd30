//! Tactile Panel - Main Entry Point

use tactile_panel::TactilePanelApp;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    log::info!("Starting Tactile Panel v{}", env!("CARGO_PKG_VERSION"));

    // Configure native options
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([680.0, 480.0])
            .with_min_inner_size([560.0, 400.0])
            .with_title("Tactile Panel"),
        vsync: true,
        ..Default::default()
    };

    // Run the app
    eframe::run_native(
        "Tactile Panel",
        native_options,
        Box::new(|cc| Box::new(TactilePanelApp::new(cc))),
    )
}
