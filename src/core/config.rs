/// Persisted panel layout and refresh configuration
///
/// Stores per-panel enabled flags and screen positions plus the global
/// refresh interval in ~/.config/sysboard/widget_config.json. Every
/// mutation goes through `ConfigStore::update`, which serializes
/// writers behind one mutex and persists write-through. Unknown
/// top-level keys in the file are preserved across load/save cycles.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

use crate::core::classify::Theme;
use crate::utils::{
    PanelKind, CONFIG_FILE_NAME, DEFAULT_REFRESH_SECS, PANEL_WIDTH, SCREEN_MARGIN,
};

fn default_enabled() -> bool {
    true
}

fn default_refresh_rate() -> f64 {
    DEFAULT_REFRESH_SECS
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanelConfig {
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub x: i32,
    #[serde(default)]
    pub y: i32,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            x: 0,
            y: 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GlobalConfig {
    /// Seconds between refresh ticks, shared by all panels and read
    /// fresh on every tick
    #[serde(default = "default_refresh_rate")]
    pub refresh_rate: f64,
    #[serde(default)]
    pub theme: Theme,
    #[serde(default)]
    pub panels: BTreeMap<String, PanelConfig>,
    /// Keys we do not understand are kept verbatim for forward
    /// compatibility
    #[serde(flatten)]
    extra: BTreeMap<String, serde_json::Value>,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        let mut config = Self {
            refresh_rate: DEFAULT_REFRESH_SECS,
            theme: Theme::default(),
            panels: BTreeMap::new(),
            extra: BTreeMap::new(),
        };
        config.ensure_panels();
        config
    }
}

impl GlobalConfig {
    /// Guarantee an entry for every known panel
    fn ensure_panels(&mut self) {
        for kind in PanelKind::all() {
            self.panels
                .entry(kind.key().to_string())
                .or_insert_with(PanelConfig::default);
        }
    }

    pub fn panel(&self, kind: PanelKind) -> PanelConfig {
        self.panels.get(kind.key()).copied().unwrap_or_default()
    }

    pub fn panel_mut(&mut self, kind: PanelKind) -> &mut PanelConfig {
        self.panels
            .entry(kind.key().to_string())
            .or_insert_with(PanelConfig::default)
    }
}

/// Owning store for the persisted configuration. Panels and control
/// surfaces never hold a mutable reference to the config itself; they
/// read snapshots and mutate through `update`.
pub struct ConfigStore {
    path: PathBuf,
    state: Mutex<GlobalConfig>,
}

impl ConfigStore {
    /// Default config file location (~/.config/sysboard/widget_config.json)
    pub fn default_path() -> Result<PathBuf> {
        let dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("sysboard");
        Ok(dir.join(CONFIG_FILE_NAME))
    }

    /// Open the store at the given path. A missing file yields the
    /// defaults (all panels enabled at (0,0), 2.0s refresh); a corrupt
    /// file is logged and replaced by defaults on the next save.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let state = match Self::read_config(&path) {
            Ok(Some(config)) => config,
            Ok(None) => GlobalConfig::default(),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config unreadable, using defaults");
                GlobalConfig::default()
            }
        };
        Self {
            path,
            state: Mutex::new(state),
        }
    }

    fn read_config(path: &Path) -> Result<Option<GlobalConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = fs::read_to_string(path).context("Failed to read config file")?;
        let mut config: GlobalConfig =
            serde_json::from_str(&contents).context("Failed to parse config file")?;
        config.ensure_panels();
        Ok(Some(config))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, GlobalConfig> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Best-effort copy for rendering; may lag a concurrent writer
    pub fn snapshot(&self) -> GlobalConfig {
        self.lock().clone()
    }

    pub fn refresh_rate(&self) -> f64 {
        self.lock().refresh_rate
    }

    pub fn theme(&self) -> Theme {
        self.lock().theme
    }

    pub fn panel(&self, kind: PanelKind) -> PanelConfig {
        self.lock().panel(kind)
    }

    /// Apply a mutation and persist immediately (write-through). A
    /// failed write is logged; the in-memory state stays authoritative
    /// and the next successful update re-persists it.
    pub fn update<R>(&self, mutate: impl FnOnce(&mut GlobalConfig) -> R) -> R {
        let mut state = self.lock();
        let result = mutate(&mut state);
        if let Err(err) = Self::write_config(&self.path, &state) {
            warn!(path = %self.path.display(), error = %err, "failed to persist config");
        }
        result
    }

    /// Persist the current state
    pub fn save(&self) -> Result<()> {
        let state = self.lock();
        Self::write_config(&self.path, &state)
    }

    /// Atomic write: temp file in the same directory, then rename, so
    /// a crash mid-write cannot corrupt the previous version.
    fn write_config(path: &Path, config: &GlobalConfig) -> Result<()> {
        let contents =
            serde_json::to_string_pretty(config).context("Failed to serialize config")?;
        let dir = path
            .parent()
            .context("Config path has no parent directory")?;
        fs::create_dir_all(dir).context("Failed to create config directory")?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, contents).context("Failed to write config temp file")?;
        fs::rename(&tmp, path).context("Failed to replace config file")?;
        Ok(())
    }

    /// First-run placement: a single row of fixed-width cells anchored
    /// to the top-right of the primary display, in panel order. Only
    /// panels still at (0,0) (never moved) are placed, so the pass is
    /// idempotent and user layouts survive it.
    pub fn initialize_default_positions(&self, screen_width: i32) {
        let count = PanelKind::all().len() as i32;
        let start_x = screen_width - count * PANEL_WIDTH - SCREEN_MARGIN;
        self.update(|config| {
            for (i, kind) in PanelKind::all().iter().enumerate() {
                let slot_x = start_x + i as i32 * PANEL_WIDTH;
                let panel = config.panel_mut(*kind);
                if panel.x == 0 && panel.y == 0 {
                    panel.x = slot_x;
                    panel.y = SCREEN_MARGIN;
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn store_in(dir: &tempfile::TempDir) -> ConfigStore {
        ConfigStore::open(dir.path().join(CONFIG_FILE_NAME))
    }

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(store.refresh_rate(), DEFAULT_REFRESH_SECS);
        assert_eq!(store.theme(), Theme::Dark);
        for kind in PanelKind::all() {
            let panel = store.panel(*kind);
            assert!(panel.enabled);
            assert_eq!((panel.x, panel.y), (0, 0));
        }
    }

    #[test]
    fn test_update_is_write_through() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.update(|config| config.panel_mut(PanelKind::Disk).enabled = false);

        let reopened = store_in(&dir);
        assert!(!reopened.panel(PanelKind::Disk).enabled);
        assert!(reopened.panel(PanelKind::Cpu).enabled);
    }

    #[test]
    fn test_save_load_fixed_point() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        let store = ConfigStore::open(&path);
        store.update(|config| {
            config.refresh_rate = 3.5;
            config.panel_mut(PanelKind::Ram).x = 640;
        });
        let first = std::fs::read_to_string(&path).unwrap();

        let reopened = ConfigStore::open(&path);
        reopened.save().unwrap();
        let second = std::fs::read_to_string(&path).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_unknown_keys_survive_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(
            &path,
            r#"{ "refresh_rate": 1.5, "panels": {}, "future_feature": { "level": 3 } }"#,
        )
        .unwrap();

        let store = ConfigStore::open(&path);
        assert_eq!(store.refresh_rate(), 1.5);
        store.save().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&contents).unwrap();
        assert_eq!(value["future_feature"]["level"], 3);
    }

    #[test]
    fn test_corrupt_file_falls_back_to_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join(CONFIG_FILE_NAME);
        std::fs::write(&path, "not json {").unwrap();
        let store = ConfigStore::open(&path);
        assert_eq!(store.refresh_rate(), DEFAULT_REFRESH_SECS);
    }

    #[test]
    fn test_default_positions_row_anchored_right() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.initialize_default_positions(1920);

        let expected_start = 1920 - 6 * PANEL_WIDTH - SCREEN_MARGIN;
        for (i, kind) in PanelKind::all().iter().enumerate() {
            let panel = store.panel(*kind);
            assert_eq!(panel.x, expected_start + i as i32 * PANEL_WIDTH);
            assert_eq!(panel.y, SCREEN_MARGIN);
        }
        // last cell ends at the right margin
        let last = store.panel(PanelKind::Network);
        assert_eq!(last.x + PANEL_WIDTH, 1920 - SCREEN_MARGIN);
    }

    #[test]
    fn test_default_positions_idempotent_and_preserving() {
        let dir = tempdir().unwrap();
        let store = store_in(&dir);
        store.update(|config| {
            let panel = config.panel_mut(PanelKind::Ram);
            panel.x = 5;
            panel.y = 7;
        });

        store.initialize_default_positions(1920);
        let after_first: Vec<_> = PanelKind::all().iter().map(|k| store.panel(*k)).collect();

        store.initialize_default_positions(1920);
        let after_second: Vec<_> = PanelKind::all().iter().map(|k| store.panel(*k)).collect();

        assert_eq!(after_first, after_second);
        // a moved panel keeps its position
        assert_eq!((store.panel(PanelKind::Ram).x, store.panel(PanelKind::Ram).y), (5, 7));
    }
}
