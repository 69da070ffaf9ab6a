/// Risk and color classification for metric readings
///
/// Two independent tiering schemes coexist:
/// - a three-tier risk level (`RiskTier`) driven by the per-resource
///   `Thresholds` table, which feeds the textual risk summary
/// - a four-tier presentation color (`ColorTier`) on separate,
///   per-resource breakpoints, used only to color panel text
///
/// Both are table-driven; no per-resource branching outside the tables.

use serde::{Deserialize, Serialize};

use crate::utils::{risk_thresholds, Direction, PanelKind, Thresholds};

/// Returned by the summary when nothing is above its floor
pub const NO_RISKS: &str = "No risks";

/// Resources that contribute lines to the risk summary, in emission order
pub const SUMMARY_ORDER: [PanelKind; 4] = [
    PanelKind::Cpu,
    PanelKind::Ram,
    PanelKind::Disk,
    PanelKind::Battery,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum RiskTier {
    Low,
    Medium,
    High,
}

/// Classify a reading against a resource's risk thresholds.
/// Ascending: value >= high is High, >= medium is Medium, else Low.
/// Descending (battery): value <= high is High, <= medium is Medium.
pub fn risk_tier(value: f64, thresholds: Thresholds, direction: Direction) -> RiskTier {
    match direction {
        Direction::Ascending => {
            if value >= thresholds.high {
                RiskTier::High
            } else if value >= thresholds.medium {
                RiskTier::Medium
            } else {
                RiskTier::Low
            }
        }
        Direction::Descending => {
            if value <= thresholds.high {
                RiskTier::High
            } else if value <= thresholds.medium {
                RiskTier::Medium
            } else {
                RiskTier::Low
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorTier {
    Red,
    Orange,
    Yellow,
    Green,
    Neutral,
}

/// Color breakpoints for one resource, ordered worst-first.
/// Ascending: value > cuts[0] is red, > cuts[1] orange, > cuts[2] yellow.
/// Descending: value < cuts[0] is red, < cuts[1] orange, < cuts[2] yellow.
struct ColorScale {
    cuts: [f64; 3],
    direction: Direction,
}

fn color_scale(kind: PanelKind) -> Option<ColorScale> {
    match kind {
        PanelKind::Cpu => Some(ColorScale {
            cuts: [75.0, 50.0, 25.0],
            direction: Direction::Ascending,
        }),
        PanelKind::Ram | PanelKind::Disk => Some(ColorScale {
            cuts: [90.0, 75.0, 50.0],
            direction: Direction::Ascending,
        }),
        PanelKind::Battery => Some(ColorScale {
            cuts: [20.0, 50.0, 75.0],
            direction: Direction::Descending,
        }),
        PanelKind::Risk | PanelKind::Network => None,
    }
}

/// Presentation color for a reading. Panels without a color scale
/// always render in the theme's neutral color.
pub fn color_tier(kind: PanelKind, value: f64) -> ColorTier {
    let Some(scale) = color_scale(kind) else {
        return ColorTier::Neutral;
    };
    let worse = |cut: f64| match scale.direction {
        Direction::Ascending => value > cut,
        Direction::Descending => value < cut,
    };
    if worse(scale.cuts[0]) {
        ColorTier::Red
    } else if worse(scale.cuts[1]) {
        ColorTier::Orange
    } else if worse(scale.cuts[2]) {
        ColorTier::Yellow
    } else {
        ColorTier::Green
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// Hex color for a tier under this theme
    pub fn hex(&self, tier: ColorTier) -> &'static str {
        match self {
            Theme::Dark => match tier {
                ColorTier::Red => "#ff4d4f",
                ColorTier::Orange => "#ffa940",
                ColorTier::Yellow => "#ffec3d",
                ColorTier::Green => "#52c41a",
                ColorTier::Neutral => "#ffffff",
            },
            Theme::Light => match tier {
                ColorTier::Red => "#c62828",
                ColorTier::Orange => "#ef6c00",
                ColorTier::Yellow => "#f9a825",
                ColorTier::Green => "#2e7d32",
                ColorTier::Neutral => "#1f1f1f",
            },
        }
    }

    /// Color used when a panel renders an acquisition error
    pub fn error_hex(&self) -> &'static str {
        self.hex(ColorTier::Red)
    }
}

/// Summary emission floor: readings strictly on the safe side of this
/// never produce a line.
fn summary_floor(kind: PanelKind) -> f64 {
    match kind {
        PanelKind::Battery => 75.0,
        _ => 50.0,
    }
}

fn summary_label(kind: PanelKind, tier: RiskTier) -> &'static str {
    if kind == PanelKind::Battery {
        match tier {
            RiskTier::High => "CRITICALLY LOW",
            RiskTier::Medium => "LOW",
            RiskTier::Low => "MODERATE",
        }
    } else {
        match tier {
            RiskTier::High => "CRITICAL",
            RiskTier::Medium => "HIGH",
            RiskTier::Low => "MODERATE",
        }
    }
}

/// Build the aggregated risk summary. `sample` must return the latest
/// numeric reading for a resource, or None when the panel is disabled
/// or the metric is unavailable (an absent battery must be excluded,
/// not treated as zero). Lines are emitted in `SUMMARY_ORDER`.
pub fn summarize<F>(sample: F) -> String
where
    F: Fn(PanelKind) -> Option<f64>,
{
    let mut lines = Vec::new();
    for kind in SUMMARY_ORDER {
        let Some(value) = sample(kind) else { continue };
        let Some((thresholds, direction)) = risk_thresholds(kind) else {
            continue;
        };
        let above_floor = match direction {
            Direction::Ascending => value >= summary_floor(kind),
            Direction::Descending => value < summary_floor(kind),
        };
        if !above_floor {
            continue;
        }
        let tier = risk_tier(value, thresholds, direction);
        let label = summary_label(kind, tier);
        if kind == PanelKind::Battery {
            lines.push(format!("Battery is {} ({:.0}%)", label, value));
        } else {
            lines.push(format!("{} usage is {} ({:.0}%)", kind.label(), label, value));
        }
    }
    if lines.is_empty() {
        NO_RISKS.to_string()
    } else {
        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_tier_ascending_boundaries() {
        let t = Thresholds {
            medium: 70.0,
            high: 90.0,
        };
        assert_eq!(risk_tier(69.9, t, Direction::Ascending), RiskTier::Low);
        assert_eq!(risk_tier(70.0, t, Direction::Ascending), RiskTier::Medium);
        assert_eq!(risk_tier(89.9, t, Direction::Ascending), RiskTier::Medium);
        assert_eq!(risk_tier(90.0, t, Direction::Ascending), RiskTier::High);
        assert_eq!(risk_tier(100.0, t, Direction::Ascending), RiskTier::High);
    }

    #[test]
    fn test_risk_tier_battery_inverted() {
        let t = Thresholds {
            medium: 30.0,
            high: 10.0,
        };
        assert_eq!(risk_tier(80.0, t, Direction::Descending), RiskTier::Low);
        assert_eq!(risk_tier(31.0, t, Direction::Descending), RiskTier::Low);
        assert_eq!(risk_tier(30.0, t, Direction::Descending), RiskTier::Medium);
        assert_eq!(risk_tier(10.0, t, Direction::Descending), RiskTier::High);
        assert_eq!(risk_tier(5.0, t, Direction::Descending), RiskTier::High);
    }

    #[test]
    fn test_cpu_color_breakpoints() {
        assert_eq!(color_tier(PanelKind::Cpu, 10.0), ColorTier::Green);
        assert_eq!(color_tier(PanelKind::Cpu, 25.0), ColorTier::Green);
        assert_eq!(color_tier(PanelKind::Cpu, 30.0), ColorTier::Yellow);
        assert_eq!(color_tier(PanelKind::Cpu, 60.0), ColorTier::Orange);
        assert_eq!(color_tier(PanelKind::Cpu, 75.0), ColorTier::Orange);
        assert_eq!(color_tier(PanelKind::Cpu, 80.0), ColorTier::Red);
    }

    #[test]
    fn test_ram_disk_color_breakpoints() {
        for kind in [PanelKind::Ram, PanelKind::Disk] {
            assert_eq!(color_tier(kind, 50.0), ColorTier::Green);
            assert_eq!(color_tier(kind, 60.0), ColorTier::Yellow);
            assert_eq!(color_tier(kind, 80.0), ColorTier::Orange);
            assert_eq!(color_tier(kind, 95.0), ColorTier::Red);
        }
    }

    #[test]
    fn test_battery_color_inverted() {
        assert_eq!(color_tier(PanelKind::Battery, 15.0), ColorTier::Red);
        assert_eq!(color_tier(PanelKind::Battery, 35.0), ColorTier::Orange);
        assert_eq!(color_tier(PanelKind::Battery, 60.0), ColorTier::Yellow);
        assert_eq!(color_tier(PanelKind::Battery, 75.0), ColorTier::Yellow);
        assert_eq!(color_tier(PanelKind::Battery, 90.0), ColorTier::Green);
    }

    #[test]
    fn test_aggregate_panels_are_neutral() {
        assert_eq!(color_tier(PanelKind::Risk, 99.0), ColorTier::Neutral);
        assert_eq!(color_tier(PanelKind::Network, 99.0), ColorTier::Neutral);
    }

    #[test]
    fn test_theme_palettes_differ() {
        for tier in [
            ColorTier::Red,
            ColorTier::Orange,
            ColorTier::Yellow,
            ColorTier::Green,
            ColorTier::Neutral,
        ] {
            assert_ne!(Theme::Dark.hex(tier), Theme::Light.hex(tier));
        }
        assert_eq!(Theme::Dark.error_hex(), Theme::Dark.hex(ColorTier::Red));
    }

    #[test]
    fn test_summary_scenario() {
        let summary = summarize(|kind| match kind {
            PanelKind::Cpu => Some(95.0),
            PanelKind::Ram => Some(45.0),
            PanelKind::Disk => Some(85.0),
            // battery absent on this machine
            _ => None,
        });
        assert_eq!(
            summary,
            "CPU usage is CRITICAL (95%)\nDisk usage is HIGH (85%)"
        );
    }

    #[test]
    fn test_summary_ram_at_sixty_is_moderate() {
        // 60% sits in the [50, 70) band and gets a MODERATE line; the
        // floor only suppresses readings strictly below 50.
        let summary = summarize(|kind| match kind {
            PanelKind::Cpu => Some(95.0),
            PanelKind::Ram => Some(60.0),
            PanelKind::Disk => Some(85.0),
            _ => None,
        });
        assert_eq!(
            summary,
            "CPU usage is CRITICAL (95%)\nRAM usage is MODERATE (60%)\nDisk usage is HIGH (85%)"
        );
    }

    #[test]
    fn test_summary_order_is_fixed() {
        let summary = summarize(|kind| match kind {
            PanelKind::Disk => Some(95.0),
            PanelKind::Cpu => Some(95.0),
            _ => None,
        });
        let lines: Vec<&str> = summary.lines().collect();
        assert!(lines[0].starts_with("CPU"));
        assert!(lines[1].starts_with("Disk"));
    }

    #[test]
    fn test_summary_battery_lines() {
        let low = summarize(|kind| (kind == PanelKind::Battery).then_some(25.0));
        assert_eq!(low, "Battery is LOW (25%)");
        let critical = summarize(|kind| (kind == PanelKind::Battery).then_some(5.0));
        assert_eq!(critical, "Battery is CRITICALLY LOW (5%)");
        let fine = summarize(|kind| (kind == PanelKind::Battery).then_some(80.0));
        assert_eq!(fine, NO_RISKS);
    }

    #[test]
    fn test_summary_all_nominal() {
        let summary = summarize(|kind| match kind {
            PanelKind::Cpu | PanelKind::Ram => Some(20.0),
            PanelKind::Disk => Some(40.0),
            PanelKind::Battery => Some(90.0),
            _ => None,
        });
        assert_eq!(summary, NO_RISKS);
    }

    #[test]
    fn test_summary_moderate_band() {
        let summary = summarize(|kind| (kind == PanelKind::Ram).then_some(55.0));
        assert_eq!(summary, "RAM usage is MODERATE (55%)");
    }
}
