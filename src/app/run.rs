//! Top-level entry point for running the explorer as a native window.

use eframe::egui;

use crate::client::MessageClient;
use crate::config::ExplorerConfig;

use super::explorer_app::ExplorerApp;
use super::orchestrator::Orchestrator;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] crate::color_scheme::ColorParseError),
    #[error(transparent)]
    Ui(#[from] eframe::Error),
}

/// Launch the explorer in a native window.
///
/// Connects to the configured backend once the egui context exists, so the
/// I/O thread can wake the UI when replies arrive. Blocks until the window is
/// closed.
pub fn run_explorer(mut cfg: ExplorerConfig) -> Result<(), RunError> {
    // Surface bad colors before a window opens.
    cfg.settings.palette()?;
    cfg.settings.unselected()?;

    let title = cfg.title.clone();
    let mut opts = cfg
        .native_options
        .take()
        .unwrap_or_else(eframe::NativeOptions::default);

    if opts.viewport.inner_size.is_none() {
        opts.viewport = opts
            .viewport
            .clone()
            .with_inner_size(egui::vec2(1400.0, 900.0));
    }

    eframe::run_native(
        &title,
        opts,
        Box::new(move |cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);

            log::info!("connecting to {}", cfg.settings.url);
            let client = MessageClient::connect(&cfg.settings.url, Some(cc.egui_ctx.clone()));
            let orchestrator = Orchestrator::new(cfg.settings.clone(), client, cfg.events.clone())?;
            Ok(Box::new(ExplorerApp::new(orchestrator, &cfg)))
        }),
    )?;
    Ok(())
}
