/// Desktop application: control window, panel viewports, tray wiring
///
/// This is the single rendering context. Worker tasks never touch a
/// surface; they send `PanelUpdate` messages which are drained and
/// applied here. Each Running panel is drawn as a borderless,
/// always-on-top immediate viewport; the control window is the root
/// viewport.

use std::collections::HashMap;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use eframe::egui;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{info, warn};

use crate::core::autostart::Autostart;
use crate::core::classify::ColorTier;
use crate::core::{ConfigStore, Panel, PanelRegistry, PanelUpdate};
use crate::ui::theme;
use crate::ui::tray::{TrayCommand, TrayHandle};
use crate::utils::{PanelKind, PANEL_WIDTH};

/// Fallback primary display width when the platform does not report one
const FALLBACK_SCREEN_WIDTH: i32 = 1920;

/// Latest applied render state for one panel
struct RenderState {
    epoch: u64,
    text: String,
    tier: ColorTier,
    failed: bool,
}

pub struct App {
    store: Arc<ConfigStore>,
    registry: Arc<PanelRegistry>,
    updates: UnboundedReceiver<PanelUpdate>,
    tray: Option<TrayHandle>,
    tray_commands: Option<Receiver<TrayCommand>>,
    autostart: Option<Autostart>,
    autostart_enabled: bool,
    render: HashMap<PanelKind, RenderState>,
    /// Viewport position captured once per panel epoch so the builder
    /// does not fight user drags
    anchors: HashMap<PanelKind, (u64, egui::Pos2)>,
    layout_ready: bool,
    quitting: bool,
}

impl App {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        store: Arc<ConfigStore>,
        registry: Arc<PanelRegistry>,
        updates: UnboundedReceiver<PanelUpdate>,
    ) -> Self {
        let (tray, tray_commands) = match crate::ui::tray::spawn(&store, cc.egui_ctx.clone()) {
            Ok((handle, rx)) => (Some(handle), Some(rx)),
            Err(err) => {
                warn!(error = %err, "tray icon unavailable, continuing without it");
                (None, None)
            }
        };
        let autostart = match Autostart::new() {
            Ok(autostart) => Some(autostart),
            Err(err) => {
                warn!(error = %err, "autostart unavailable");
                None
            }
        };
        let autostart_enabled = autostart.as_ref().map(Autostart::is_enabled).unwrap_or(false);

        Self {
            store,
            registry,
            updates,
            tray,
            tray_commands,
            autostart,
            autostart_enabled,
            render: HashMap::new(),
            anchors: HashMap::new(),
            layout_ready: false,
            quitting: false,
        }
    }

    /// First-run layout placement, once the primary display width is
    /// known and before any panel is shown
    fn initialize_layout(&mut self, ctx: &egui::Context) {
        let width = ctx
            .input(|i| i.viewport().monitor_size)
            .map(|size| size.x as i32)
            .unwrap_or(FALLBACK_SCREEN_WIDTH);
        self.store.initialize_default_positions(width);
        self.registry.start_all_enabled();
        self.layout_ready = true;
        info!(screen_width = width, "panels initialized");
    }

    fn drain_tray_commands(&mut self) {
        let Some(rx) = &self.tray_commands else { return };
        let mut pending = Vec::new();
        while let Ok(command) = rx.try_recv() {
            pending.push(command);
        }
        for command in pending {
            match command {
                TrayCommand::Toggle(kind) => self.toggle_panel(kind),
                TrayCommand::Quit => self.quit_all(),
            }
        }
    }

    fn drain_panel_updates(&mut self) {
        while let Ok(update) = self.updates.try_recv() {
            let panel = self.registry.get(update.kind);
            // liveness check: drop renders raced against stop()
            if update.epoch != panel.epoch() || !panel.is_running() {
                continue;
            }
            self.render.insert(
                update.kind,
                RenderState {
                    epoch: update.epoch,
                    text: update.text,
                    tier: update.tier,
                    failed: update.failed,
                },
            );
        }
    }

    fn toggle_panel(&mut self, kind: PanelKind) {
        let panel = self.registry.get(kind);
        let enabled = panel.is_enabled();
        panel.toggle(!enabled);
        self.sync_tray();
    }

    /// Stop every panel's loop, then terminate the process by closing
    /// the root viewport
    fn quit_all(&mut self) {
        info!("shutting down all panels");
        self.registry.stop_all();
        self.quitting = true;
    }

    fn sync_tray(&self) {
        if let Some(tray) = &self.tray {
            tray.sync(&self.store);
        }
    }

    fn control_window(&mut self, ctx: &egui::Context) {
        let active_theme = self.store.theme();
        let frame = egui::Frame::default()
            .fill(theme::panel_background(active_theme))
            .inner_margin(egui::Margin::same(12.0));

        egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
            ui.heading("System Dashboard");
            ui.add_space(6.0);

            if self.autostart.is_some() {
                if ui
                    .checkbox(&mut self.autostart_enabled, "Start at login")
                    .changed()
                {
                    self.apply_autostart();
                }
                ui.add_space(6.0);
            }

            if ui.button("Close All").clicked() {
                self.quit_all();
            }
            if ui.button("Restart All").clicked() {
                self.registry.restart_all_enabled();
            }
            ui.separator();

            for kind in PanelKind::all() {
                // read enabled state live; no private copy that could
                // drift from the tray's view
                let enabled = self.registry.get(*kind).is_enabled();
                let label = if enabled {
                    format!("Kill {} Panel", kind.label())
                } else {
                    format!("Show {} Panel", kind.label())
                };
                if ui.button(label).clicked() {
                    self.toggle_panel(*kind);
                }
            }
        });
    }

    fn show_panel_viewport(&mut self, ctx: &egui::Context, panel: &Arc<Panel>) {
        let kind = panel.kind();
        let epoch = panel.epoch();
        let active_theme = self.store.theme();

        // anchor the window where it was persisted, once per start
        let anchor = self.anchors.entry(kind).or_insert_with(|| {
            let (x, y) = panel.position();
            (epoch, egui::pos2(x as f32, y as f32))
        });
        if anchor.0 != epoch {
            let (x, y) = panel.position();
            *anchor = (epoch, egui::pos2(x as f32, y as f32));
        }
        let anchor_pos = anchor.1;

        let (text, color) = match self.render.get(&kind) {
            Some(state) if state.epoch == epoch => {
                let color = if state.failed {
                    theme::error_color(active_theme)
                } else {
                    theme::tier_color(active_theme, state.tier)
                };
                (state.text.clone(), color)
            }
            _ => (
                format!("{}\nInitializing...", kind.title()),
                theme::tier_color(active_theme, ColorTier::Neutral),
            ),
        };

        let builder = egui::ViewportBuilder::default()
            .with_title(kind.title())
            .with_position(anchor_pos)
            .with_inner_size([PANEL_WIDTH as f32 - 10.0, 90.0])
            .with_decorations(false)
            .with_resizable(false)
            .with_always_on_top()
            .with_taskbar(false);

        let panel = Arc::clone(panel);
        let background = theme::panel_background(active_theme);
        ctx.show_viewport_immediate(
            egui::ViewportId::from_hash_of(kind.key()),
            builder,
            move |ctx, _class| {
                let frame = egui::Frame::default()
                    .fill(background)
                    .inner_margin(egui::Margin::same(12.0));
                egui::CentralPanel::default().frame(frame).show(ctx, |ui| {
                    let drag = ui.interact(
                        ui.max_rect(),
                        egui::Id::new(("panel_drag", kind.key())),
                        egui::Sense::click_and_drag(),
                    );
                    if drag.drag_started() {
                        ctx.send_viewport_cmd(egui::ViewportCommand::StartDrag);
                    }
                    ui.label(egui::RichText::new(text.clone()).color(color).size(13.0));
                });

                // write the user-moved position through to the store
                if let Some(rect) = ctx.input(|i| i.viewport().outer_rect) {
                    panel.set_position(rect.min.x as i32, rect.min.y as i32);
                }
            },
        );
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        if !self.layout_ready {
            self.initialize_layout(ctx);
        }

        self.drain_tray_commands();
        self.drain_panel_updates();

        self.control_window(ctx);

        let running: Vec<Arc<Panel>> = self
            .registry
            .panels()
            .iter()
            .filter(|p| p.is_running())
            .cloned()
            .collect();
        for panel in &running {
            self.show_panel_viewport(ctx, panel);
        }

        if self.quitting {
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }

        // keep draining worker updates even while idle
        ctx.request_repaint_after(Duration::from_millis(200));
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        // window-manager close counts as quit: no task may outlive the
        // process teardown
        self.registry.stop_all();
    }
}

impl App {
    fn apply_autostart(&mut self) {
        let Some(autostart) = &self.autostart else { return };
        if let Err(err) = autostart.set_enabled(self.autostart_enabled) {
            // never disturb panel lifecycle over this
            warn!(error = %err, "failed to update autostart entry");
            self.autostart_enabled = autostart.is_enabled();
        }
    }
}
