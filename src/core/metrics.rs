/// Metric acquisition for the panel refresh loops
///
/// One `MetricSource` per resource. Sources are synchronous and may
/// block (the network source samples a fixed 1-second window); panel
/// loops call them through `spawn_blocking`. A source failure is an
/// error value, never a panic, so the owning panel can contain it.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use sysinfo::{Disks, Networks, System, MINIMUM_CPU_UPDATE_INTERVAL};
use thiserror::Error;

use crate::core::classify;
use crate::core::config::ConfigStore;
use crate::utils::{bytes_to_mb, format_mb, format_mb_per_sec, format_percent, PanelKind};

/// Window for the network throughput sample
const NETWORK_SAMPLE_WINDOW: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum MetricError {
    #[error("platform metrics unavailable: {0}")]
    Platform(String),
    #[error("metric sampling task failed")]
    Worker,
}

/// One acquired reading. `percent` is the numeric value used for
/// color/risk classification; None marks composite or unavailable
/// readings (network totals, an absent battery), which are excluded
/// from aggregation rather than treated as zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub text: String,
    pub percent: Option<f64>,
}

impl Reading {
    fn percentage(value: f64) -> Self {
        Self {
            text: format_percent(value),
            percent: Some(value),
        }
    }

    fn unavailable() -> Self {
        Self {
            text: "N/A".to_string(),
            percent: None,
        }
    }
}

#[cfg_attr(test, mockall::automock)]
pub trait MetricSource: Send {
    fn fetch(&mut self) -> Result<Reading, MetricError>;
}

/// Latest numeric reading per resource, published by each panel's loop
/// and read by the risk panel. Best-effort: the risk summary may see a
/// slightly stale peer value, which is acceptable.
#[derive(Default)]
pub struct ReadingBoard {
    values: RwLock<HashMap<PanelKind, f64>>,
}

impl ReadingBoard {
    pub fn publish(&self, kind: PanelKind, value: f64) {
        self.values
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(kind, value);
    }

    pub fn latest(&self, kind: PanelKind) -> Option<f64> {
        self.values
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&kind)
            .copied()
    }
}

/// Build the source bound to a panel kind
pub fn build_source(
    kind: PanelKind,
    board: &Arc<ReadingBoard>,
    store: &Arc<ConfigStore>,
) -> Box<dyn MetricSource> {
    match kind {
        PanelKind::Cpu => Box::new(CpuSource::new()),
        PanelKind::Ram => Box::new(RamSource::new()),
        PanelKind::Disk => Box::new(DiskSource::new()),
        PanelKind::Battery => Box::new(BatterySource),
        PanelKind::Risk => Box::new(RiskSource {
            board: Arc::clone(board),
            store: Arc::clone(store),
        }),
        PanelKind::Network => Box::new(NetworkSource::new()),
    }
}

pub struct CpuSource {
    sys: System,
}

impl CpuSource {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl MetricSource for CpuSource {
    fn fetch(&mut self) -> Result<Reading, MetricError> {
        // Usage is computed between two refreshes, which must be at
        // least MINIMUM_CPU_UPDATE_INTERVAL apart.
        self.sys.refresh_cpu();
        std::thread::sleep(MINIMUM_CPU_UPDATE_INTERVAL);
        self.sys.refresh_cpu();
        if self.sys.cpus().is_empty() {
            return Err(MetricError::Platform("no CPUs reported".to_string()));
        }
        let usage = f64::from(self.sys.global_cpu_info().cpu_usage());
        Ok(Reading::percentage(usage))
    }
}

pub struct RamSource {
    sys: System,
}

impl RamSource {
    pub fn new() -> Self {
        Self { sys: System::new() }
    }
}

impl MetricSource for RamSource {
    fn fetch(&mut self) -> Result<Reading, MetricError> {
        self.sys.refresh_memory();
        let total = self.sys.total_memory();
        if total == 0 {
            return Err(MetricError::Platform("total memory reported as 0".to_string()));
        }
        let percent = self.sys.used_memory() as f64 / total as f64 * 100.0;
        Ok(Reading::percentage(percent))
    }
}

pub struct DiskSource {
    disks: Disks,
}

impl DiskSource {
    pub fn new() -> Self {
        Self {
            disks: Disks::new_with_refreshed_list(),
        }
    }

    /// The OS's primary/system volume: the root mount where there is
    /// one, otherwise the first disk the platform reports.
    fn primary(&self) -> Option<&sysinfo::Disk> {
        self.disks
            .iter()
            .find(|d| d.mount_point() == std::path::Path::new("/"))
            .or_else(|| {
                self.disks
                    .iter()
                    .find(|d| d.mount_point().to_string_lossy().starts_with("C:"))
            })
            .or_else(|| self.disks.iter().next())
    }
}

impl MetricSource for DiskSource {
    fn fetch(&mut self) -> Result<Reading, MetricError> {
        self.disks.refresh();
        let disk = self
            .primary()
            .ok_or_else(|| MetricError::Platform("no disks reported".to_string()))?;
        let total = disk.total_space();
        if total == 0 {
            return Err(MetricError::Platform("disk reports zero capacity".to_string()));
        }
        let used = total.saturating_sub(disk.available_space());
        let percent = used as f64 / total as f64 * 100.0;
        Ok(Reading::percentage(percent))
    }
}

/// Battery charge, read from the platform power-supply interface.
/// Machines without a battery report "N/A"; that is not a failure.
pub struct BatterySource;

impl BatterySource {
    #[cfg(target_os = "linux")]
    fn charge_percent() -> Option<f64> {
        let entries = std::fs::read_dir("/sys/class/power_supply").ok()?;
        for entry in entries.flatten() {
            let path = entry.path();
            let kind = std::fs::read_to_string(path.join("type")).unwrap_or_default();
            if kind.trim() != "Battery" {
                continue;
            }
            let capacity = std::fs::read_to_string(path.join("capacity")).ok()?;
            return capacity.trim().parse::<f64>().ok();
        }
        None
    }

    #[cfg(not(target_os = "linux"))]
    fn charge_percent() -> Option<f64> {
        None
    }
}

impl MetricSource for BatterySource {
    fn fetch(&mut self) -> Result<Reading, MetricError> {
        match Self::charge_percent() {
            Some(percent) => Ok(Reading::percentage(percent)),
            None => Ok(Reading::unavailable()),
        }
    }
}

pub struct NetworkSource {
    networks: Networks,
}

impl NetworkSource {
    pub fn new() -> Self {
        Self {
            networks: Networks::new_with_refreshed_list(),
        }
    }
}

impl MetricSource for NetworkSource {
    fn fetch(&mut self) -> Result<Reading, MetricError> {
        // Two samples one second apart: cumulative totals from the
        // second sample, throughput from the delta.
        self.networks.refresh();
        std::thread::sleep(NETWORK_SAMPLE_WINDOW);
        self.networks.refresh();

        let (mut sent_window, mut recv_window) = (0u64, 0u64);
        let (mut sent_total, mut recv_total) = (0u64, 0u64);
        for (_name, data) in &self.networks {
            sent_window += data.transmitted();
            recv_window += data.received();
            sent_total += data.total_transmitted();
            recv_total += data.total_received();
        }

        let window_secs = NETWORK_SAMPLE_WINDOW.as_secs_f64();
        let text = format!(
            "Sent: {}\nRecv: {}\nTotal: {:.2} MB\nUp: {}\nDown: {}",
            format_mb(sent_total),
            format_mb(recv_total),
            bytes_to_mb(sent_total) + bytes_to_mb(recv_total),
            format_mb_per_sec(sent_window, window_secs),
            format_mb_per_sec(recv_window, window_secs),
        );
        Ok(Reading {
            text,
            percent: None,
        })
    }
}

/// Aggregate risk summary over the other panels' latest readings.
/// Disabled panels and unavailable metrics are excluded.
pub struct RiskSource {
    pub(crate) board: Arc<ReadingBoard>,
    pub(crate) store: Arc<ConfigStore>,
}

impl MetricSource for RiskSource {
    fn fetch(&mut self) -> Result<Reading, MetricError> {
        let text = classify::summarize(|kind| {
            if !self.store.panel(kind).enabled {
                return None;
            }
            self.board.latest(kind)
        });
        Ok(Reading {
            text,
            percent: None,
        })
    }
}
