pub mod theme;
pub mod tray;

use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use eframe::egui;
use tokio::sync::mpsc::unbounded_channel;

use crate::app::App;
use crate::core::{ConfigStore, PanelRegistry, ReadingBoard};

/// Launch the overlay: config store, panel registry, tray, and the
/// eframe event loop. Panel refresh tasks run on a tokio runtime that
/// stays alive for the whole UI session.
pub fn run() -> Result<()> {
    let runtime = tokio::runtime::Runtime::new().context("Failed to start async runtime")?;
    let _guard = runtime.enter();

    let path = ConfigStore::default_path()?;
    let store = Arc::new(ConfigStore::open(path));
    let board = Arc::new(ReadingBoard::default());
    let (updates_tx, updates_rx) = unbounded_channel();
    let registry = Arc::new(PanelRegistry::new(&store, &board, updates_tx));

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("System Dashboard")
            .with_inner_size([300.0, 380.0])
            .with_resizable(false),
        ..Default::default()
    };

    eframe::run_native(
        "sysboard",
        options,
        Box::new(move |cc| Ok(Box::new(App::new(cc, store, registry, updates_rx)))),
    )
    .map_err(|err| anyhow!("UI event loop failed: {err}"))
}
