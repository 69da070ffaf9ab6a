pub mod autostart;
pub mod classify;
pub mod config;
pub mod metrics;
pub mod panel;
pub mod registry;

pub use config::{ConfigStore, GlobalConfig, PanelConfig};
pub use metrics::{MetricError, MetricSource, Reading, ReadingBoard};
pub use panel::{Panel, PanelUpdate};
pub use registry::{PanelRegistry, RegistryError};
