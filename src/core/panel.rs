/// Panel lifecycle state machine and refresh loop
///
/// A panel is either Stopped (no loop, no surface) or Running (loop
/// active, surface shown). `toggle` is the only sanctioned way to
/// enable or disable a panel; it persists the flag and then reconciles
/// the runtime state. The refresh loop runs as a tokio task and hands
/// presentation updates to the UI context over a channel; it never
/// touches a surface directly.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::classify::{self, ColorTier};
use crate::core::config::ConfigStore;
use crate::core::metrics::{MetricError, MetricSource, ReadingBoard};
use crate::utils::PanelKind;

/// Floor for the live-editable refresh interval; guards against a
/// hand-edited config busy-looping the samplers.
const MIN_REFRESH_SECS: f64 = 0.05;

/// Worker-to-UI render handoff. The UI applies an update only if its
/// epoch still matches the panel's, so a message raced against stop()
/// can never land on a destroyed surface.
#[derive(Debug, Clone)]
pub struct PanelUpdate {
    pub kind: PanelKind,
    pub epoch: u64,
    pub text: String,
    pub tier: ColorTier,
    pub failed: bool,
}

/// Everything a refresh loop needs, cloned out of the panel so the
/// task owns its handles outright
struct LoopContext {
    kind: PanelKind,
    epoch: u64,
    source: Arc<Mutex<Box<dyn MetricSource>>>,
    store: Arc<ConfigStore>,
    board: Arc<ReadingBoard>,
    updates: UnboundedSender<PanelUpdate>,
    running: Arc<AtomicBool>,
}

pub struct Panel {
    kind: PanelKind,
    source: Arc<Mutex<Box<dyn MetricSource>>>,
    store: Arc<ConfigStore>,
    board: Arc<ReadingBoard>,
    updates: UnboundedSender<PanelUpdate>,
    running: Arc<AtomicBool>,
    /// Bumped on every start and stop; stale-epoch updates are dropped
    epoch: AtomicU64,
    task: Mutex<Option<JoinHandle<()>>>,
    last_position: Mutex<(i32, i32)>,
}

impl Panel {
    pub fn new(
        kind: PanelKind,
        source: Box<dyn MetricSource>,
        store: Arc<ConfigStore>,
        board: Arc<ReadingBoard>,
        updates: UnboundedSender<PanelUpdate>,
    ) -> Self {
        let persisted = store.panel(kind);
        Self {
            kind,
            source: Arc::new(Mutex::new(source)),
            store,
            board,
            updates,
            running: Arc::new(AtomicBool::new(false)),
            epoch: AtomicU64::new(0),
            task: Mutex::new(None),
            last_position: Mutex::new((persisted.x, persisted.y)),
        }
    }

    pub fn kind(&self) -> PanelKind {
        self.kind
    }

    pub fn is_enabled(&self) -> bool {
        self.store.panel(self.kind).enabled
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn epoch(&self) -> u64 {
        self.epoch.load(Ordering::Acquire)
    }

    /// Persisted screen position
    pub fn position(&self) -> (i32, i32) {
        let panel = self.store.panel(self.kind);
        (panel.x, panel.y)
    }

    /// Begin the refresh loop. No-op if already Running or disabled.
    pub fn start(&self) {
        if self.is_running() || !self.is_enabled() {
            return;
        }
        self.running.store(true, Ordering::Release);
        let epoch = self.epoch.fetch_add(1, Ordering::AcqRel) + 1;

        let context = LoopContext {
            kind: self.kind,
            epoch,
            source: Arc::clone(&self.source),
            store: Arc::clone(&self.store),
            board: Arc::clone(&self.board),
            updates: self.updates.clone(),
            running: Arc::clone(&self.running),
        };
        let handle = tokio::spawn(refresh_loop(context));
        *self.task.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
        debug!(panel = self.kind.key(), "panel started");
    }

    /// Cancel the loop and invalidate in-flight renders. After this
    /// returns, no further update for the old epoch will be applied.
    pub fn stop(&self) {
        if !self.is_running() {
            return;
        }
        self.running.store(false, Ordering::Release);
        self.epoch.fetch_add(1, Ordering::AcqRel);
        if let Some(handle) = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            handle.abort();
        }
        debug!(panel = self.kind.key(), "panel stopped");
    }

    /// The only entry point for enabling/disabling: persist the flag,
    /// then reconcile runtime state with it.
    pub fn toggle(&self, enable: bool) {
        let kind = self.kind;
        self.store
            .update(|config| config.panel_mut(kind).enabled = enable);
        if enable {
            self.start();
        } else {
            self.stop();
        }
    }

    pub fn restart(&self) {
        self.stop();
        if self.is_enabled() {
            self.start();
        }
    }

    /// Record a user-initiated move reported by the surface. Writes
    /// through immediately; redundant reports are coalesced.
    pub fn set_position(&self, x: i32, y: i32) {
        let mut last = self
            .last_position
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *last == (x, y) {
            return;
        }
        *last = (x, y);
        let kind = self.kind;
        self.store.update(|config| {
            let panel = config.panel_mut(kind);
            panel.x = x;
            panel.y = y;
        });
    }
}

async fn refresh_loop(ctx: LoopContext) {
    loop {
        if !ctx.running.load(Ordering::Acquire) {
            break;
        }

        // Sources may block (network holds a 1s sampling window), so
        // acquisition runs off the async workers.
        let source = Arc::clone(&ctx.source);
        let fetched = tokio::task::spawn_blocking(move || {
            source
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .fetch()
        })
        .await
        .unwrap_or_else(|join_err| {
            warn!(error = %join_err, "metric sampling task aborted");
            Err(MetricError::Worker)
        });

        if !ctx.running.load(Ordering::Acquire) {
            break;
        }

        match fetched {
            Ok(reading) => {
                if let Some(percent) = reading.percent {
                    ctx.board.publish(ctx.kind, percent);
                }
                let tier = reading
                    .percent
                    .map(|p| classify::color_tier(ctx.kind, p))
                    .unwrap_or(ColorTier::Neutral);
                let _ = ctx.updates.send(PanelUpdate {
                    kind: ctx.kind,
                    epoch: ctx.epoch,
                    text: format!("{}\n{}", ctx.kind.title(), reading.text),
                    tier,
                    failed: false,
                });
            }
            Err(err) => {
                warn!(panel = ctx.kind.key(), error = %err, "metric acquisition failed");
                let _ = ctx.updates.send(PanelUpdate {
                    kind: ctx.kind,
                    epoch: ctx.epoch,
                    text: format!("{}\nError: {}", ctx.kind.title(), err),
                    tier: ColorTier::Red,
                    failed: true,
                });
                // Intentionally no retry: the panel stays frozen on the
                // error until the user restarts it. This mirrors the
                // long-standing behavior of the original dashboard; do
                // not "fix" it into auto-retry without a deliberate
                // decision.
                break;
            }
        }

        // Read live from the store each tick, not captured once
        let interval = ctx.store.refresh_rate().max(MIN_REFRESH_SECS);
        tokio::time::sleep(Duration::from_secs_f64(interval)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::metrics::{MockMetricSource, Reading};
    use crate::utils::CONFIG_FILE_NAME;
    use std::sync::atomic::AtomicUsize;
    use tempfile::tempdir;
    use tokio::sync::mpsc::unbounded_channel;

    const TICK: Duration = Duration::from_millis(50);

    fn test_store(dir: &tempfile::TempDir) -> Arc<ConfigStore> {
        let store = Arc::new(ConfigStore::open(dir.path().join(CONFIG_FILE_NAME)));
        store.update(|config| config.refresh_rate = TICK.as_secs_f64());
        store
    }

    fn counting_source(count: Arc<AtomicUsize>) -> Box<MockMetricSource> {
        let mut source = MockMetricSource::new();
        source.expect_fetch().returning(move || {
            count.fetch_add(1, Ordering::SeqCst);
            Ok(Reading {
                text: "42.0 %".to_string(),
                percent: Some(42.0),
            })
        });
        Box::new(source)
    }

    fn make_panel(
        kind: PanelKind,
        source: Box<MockMetricSource>,
        store: &Arc<ConfigStore>,
    ) -> (
        Arc<Panel>,
        tokio::sync::mpsc::UnboundedReceiver<PanelUpdate>,
    ) {
        let (tx, rx) = unbounded_channel();
        let board = Arc::new(ReadingBoard::default());
        let panel = Arc::new(Panel::new(kind, source, Arc::clone(store), board, tx));
        (panel, rx)
    }

    #[tokio::test]
    async fn test_toggle_on_then_off_leaves_stopped() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        let count = Arc::new(AtomicUsize::new(0));
        let (panel, _rx) = make_panel(PanelKind::Cpu, counting_source(Arc::clone(&count)), &store);

        panel.toggle(true);
        assert!(panel.is_running());
        tokio::time::sleep(TICK / 2).await;

        panel.toggle(false);
        assert!(!panel.is_running());
        assert!(!store.panel(PanelKind::Cpu).enabled);

        // let any in-flight sample drain, then verify the loop is dead
        tokio::time::sleep(TICK).await;
        let frozen = count.load(Ordering::SeqCst);
        tokio::time::sleep(TICK * 3).await;
        assert_eq!(count.load(Ordering::SeqCst), frozen);
    }

    #[tokio::test]
    async fn test_start_is_noop_when_disabled() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        store.update(|config| config.panel_mut(PanelKind::Ram).enabled = false);
        let count = Arc::new(AtomicUsize::new(0));
        let (panel, _rx) = make_panel(PanelKind::Ram, counting_source(Arc::clone(&count)), &store);

        panel.start();
        assert!(!panel.is_running());
        tokio::time::sleep(TICK * 2).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_acquisition_failure_halts_loop_once() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        let count = Arc::new(AtomicUsize::new(0));
        let mut source = MockMetricSource::new();
        let hits = Arc::clone(&count);
        source.expect_fetch().returning(move || {
            hits.fetch_add(1, Ordering::SeqCst);
            Err(MetricError::Platform("permission denied".to_string()))
        });
        let (panel, mut rx) = make_panel(PanelKind::Disk, Box::new(source), &store);

        panel.toggle(true);
        tokio::time::sleep(TICK * 4).await;

        // the source was invoked exactly once, then the loop halted
        assert_eq!(count.load(Ordering::SeqCst), 1);
        let update = rx.recv().await.unwrap();
        assert!(update.failed);
        assert!(update.text.contains("permission denied"));
        assert_eq!(update.tier, ColorTier::Red);
        // the panel stays visually present (still Running) until an
        // external restart
        assert!(panel.is_running());
    }

    #[tokio::test]
    async fn test_updates_carry_classification() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        let mut source = MockMetricSource::new();
        source.expect_fetch().returning(|| {
            Ok(Reading {
                text: "95.0 %".to_string(),
                percent: Some(95.0),
            })
        });
        let (panel, mut rx) = make_panel(PanelKind::Cpu, Box::new(source), &store);

        panel.toggle(true);
        let update = rx.recv().await.unwrap();
        assert_eq!(update.kind, PanelKind::Cpu);
        assert_eq!(update.epoch, panel.epoch());
        assert_eq!(update.tier, ColorTier::Red);
        assert!(update.text.starts_with("CPU Usage\n"));
        panel.stop();
    }

    #[tokio::test]
    async fn test_stop_invalidates_epoch() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        let count = Arc::new(AtomicUsize::new(0));
        let (panel, mut rx) =
            make_panel(PanelKind::Ram, counting_source(Arc::clone(&count)), &store);

        panel.toggle(true);
        let first = rx.recv().await.unwrap();
        assert_eq!(first.epoch, panel.epoch());

        panel.stop();
        // anything still queued from before the stop is stale now
        assert!(first.epoch < panel.epoch());
    }

    #[tokio::test]
    async fn test_set_position_writes_through() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        let count = Arc::new(AtomicUsize::new(0));
        let (panel, _rx) = make_panel(PanelKind::Network, counting_source(count), &store);

        panel.set_position(640, 10);
        assert_eq!(panel.position(), (640, 10));

        let reopened = ConfigStore::open(dir.path().join(CONFIG_FILE_NAME));
        let persisted = reopened.panel(PanelKind::Network);
        assert_eq!((persisted.x, persisted.y), (640, 10));
    }

    #[tokio::test]
    async fn test_restart_spawns_fresh_epoch() {
        let dir = tempdir().unwrap();
        let store = test_store(&dir);
        let count = Arc::new(AtomicUsize::new(0));
        let (panel, mut rx) = make_panel(PanelKind::Cpu, counting_source(count), &store);

        panel.toggle(true);
        let first = rx.recv().await.unwrap();

        panel.restart();
        assert!(panel.is_running());
        // skip anything queued before the restart
        loop {
            let update = rx.recv().await.unwrap();
            if update.epoch > first.epoch {
                assert_eq!(update.epoch, panel.epoch());
                break;
            }
        }
        panel.stop();
    }
}
