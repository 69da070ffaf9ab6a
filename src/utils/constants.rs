/// Panel definitions and layout constants
///
/// The panel set is fixed: one panel per monitored resource plus the
/// aggregated risk panel. Order here is also the default left-to-right
/// placement order on first run.

use std::fmt;

/// Config file name inside the app config directory
pub const CONFIG_FILE_NAME: &str = "widget_config.json";

/// Width of one panel cell in the default layout row
pub const PANEL_WIDTH: i32 = 200;

/// Margin from the top and right screen edges for the default layout
pub const SCREEN_MARGIN: i32 = 10;

/// Default refresh interval in seconds
pub const DEFAULT_REFRESH_SECS: f64 = 2.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Cpu,
    Ram,
    Disk,
    Battery,
    Risk,
    Network,
}

impl PanelKind {
    /// All panels in default layout order
    pub fn all() -> &'static [PanelKind] {
        &[
            PanelKind::Cpu,
            PanelKind::Ram,
            PanelKind::Disk,
            PanelKind::Battery,
            PanelKind::Risk,
            PanelKind::Network,
        ]
    }

    /// Stable identity used as the config key
    pub fn key(&self) -> &'static str {
        match self {
            PanelKind::Cpu => "cpu",
            PanelKind::Ram => "ram",
            PanelKind::Disk => "disk",
            PanelKind::Battery => "battery",
            PanelKind::Risk => "risk",
            PanelKind::Network => "network",
        }
    }

    /// Window title shown at the top of the panel
    pub fn title(&self) -> &'static str {
        match self {
            PanelKind::Cpu => "CPU Usage",
            PanelKind::Ram => "RAM Usage",
            PanelKind::Disk => "Disk Usage",
            PanelKind::Battery => "Battery Status",
            PanelKind::Risk => "Risk Summary",
            PanelKind::Network => "Network Usage",
        }
    }

    /// Short resource label used in risk summary lines and buttons
    pub fn label(&self) -> &'static str {
        match self {
            PanelKind::Cpu => "CPU",
            PanelKind::Ram => "RAM",
            PanelKind::Disk => "Disk",
            PanelKind::Battery => "Battery",
            PanelKind::Risk => "Risk",
            PanelKind::Network => "Network",
        }
    }

    pub fn from_key(key: &str) -> Option<PanelKind> {
        PanelKind::all().iter().copied().find(|k| k.key() == key)
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Whether higher or lower values are worse for a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Risk tier cut points for one resource. For ascending resources a
/// value at or above `high` is high risk; for battery (descending) a
/// value at or below `high` is high risk.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub medium: f64,
    pub high: f64,
}

/// Risk thresholds per resource. Panels without a numeric reading
/// (risk, network) have none and never contribute to the summary.
pub fn risk_thresholds(kind: PanelKind) -> Option<(Thresholds, Direction)> {
    match kind {
        PanelKind::Cpu | PanelKind::Ram => Some((
            Thresholds {
                medium: 70.0,
                high: 90.0,
            },
            Direction::Ascending,
        )),
        PanelKind::Disk => Some((
            Thresholds {
                medium: 80.0,
                high: 90.0,
            },
            Direction::Ascending,
        )),
        PanelKind::Battery => Some((
            Thresholds {
                medium: 30.0,
                high: 10.0,
            },
            Direction::Descending,
        )),
        PanelKind::Risk | PanelKind::Network => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panel_order() {
        let all = PanelKind::all();
        assert_eq!(all.len(), 6);
        assert_eq!(all[0], PanelKind::Cpu);
        assert_eq!(all[5], PanelKind::Network);
    }

    #[test]
    fn test_key_round_trip() {
        for kind in PanelKind::all() {
            assert_eq!(PanelKind::from_key(kind.key()), Some(*kind));
        }
        assert_eq!(PanelKind::from_key("gpu"), None);
    }

    #[test]
    fn test_battery_thresholds_inverted() {
        let (thresholds, direction) = risk_thresholds(PanelKind::Battery).unwrap();
        assert_eq!(direction, Direction::Descending);
        assert!(thresholds.high < thresholds.medium);
    }

    #[test]
    fn test_aggregate_panels_have_no_thresholds() {
        assert!(risk_thresholds(PanelKind::Risk).is_none());
        assert!(risk_thresholds(PanelKind::Network).is_none());
    }
}
