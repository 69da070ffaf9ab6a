/// Fixed registry of the six panels
///
/// Built once at startup; both control surfaces operate on panels
/// exclusively through it, so neither can hold a diverging view of
/// enabled state.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;
use tracing::info;

use crate::core::config::ConfigStore;
use crate::core::metrics::{build_source, ReadingBoard};
use crate::core::panel::{Panel, PanelUpdate};
use crate::utils::PanelKind;

#[derive(Debug, Error)]
pub enum RegistryError {
    /// A control surface referenced a panel name outside the fixed
    /// set; this indicates a programming error, not user input.
    #[error("unknown panel: {0}")]
    UnknownPanel(String),
}

pub struct PanelRegistry {
    panels: Vec<Arc<Panel>>,
}

impl PanelRegistry {
    /// Build the fixed panel set with its default metric sources
    pub fn new(
        store: &Arc<ConfigStore>,
        board: &Arc<ReadingBoard>,
        updates: UnboundedSender<PanelUpdate>,
    ) -> Self {
        let panels = PanelKind::all()
            .iter()
            .map(|kind| {
                Arc::new(Panel::new(
                    *kind,
                    build_source(*kind, board, store),
                    Arc::clone(store),
                    Arc::clone(board),
                    updates.clone(),
                ))
            })
            .collect();
        Self { panels }
    }

    /// Assemble a registry from pre-built panels (the fixed set is the
    /// caller's responsibility)
    pub fn from_panels(panels: Vec<Arc<Panel>>) -> Self {
        Self { panels }
    }

    pub fn panels(&self) -> &[Arc<Panel>] {
        &self.panels
    }

    /// Panel lookup by kind; infallible for the fixed set
    pub fn get(&self, kind: PanelKind) -> &Arc<Panel> {
        self.panels
            .iter()
            .find(|p| p.kind() == kind)
            .expect("registry is built with every panel kind")
    }

    /// Panel lookup by config key
    pub fn find(&self, name: &str) -> Result<&Arc<Panel>, RegistryError> {
        self.panels
            .iter()
            .find(|p| p.kind().key() == name)
            .ok_or_else(|| RegistryError::UnknownPanel(name.to_string()))
    }

    pub fn stop_all(&self) {
        for panel in &self.panels {
            panel.stop();
        }
    }

    pub fn start_all_enabled(&self) {
        for panel in &self.panels {
            panel.start();
        }
    }

    /// "Restart All": stop every panel, then start only those still
    /// enabled
    pub fn restart_all_enabled(&self) {
        info!("restarting all enabled panels");
        self.stop_all();
        self.start_all_enabled();
    }
}
