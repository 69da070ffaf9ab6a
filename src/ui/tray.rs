/// System tray control surface
///
/// One check item per panel plus Quit. The tray never keeps its own
/// notion of enabled state: menu events are forwarded as commands into
/// the UI context, and the check marks are re-synced from the config
/// store after every command, so the tray and the control window
/// cannot diverge.

use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

use anyhow::{Context, Result};
use tray_icon::menu::{CheckMenuItem, Menu, MenuEvent, MenuId, MenuItem};
use tray_icon::{Icon, TrayIcon, TrayIconBuilder};

use crate::core::ConfigStore;
use crate::utils::PanelKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrayCommand {
    Toggle(PanelKind),
    Quit,
}

pub struct TrayHandle {
    // the icon disappears from the tray if this is dropped
    _tray: TrayIcon,
    items: Vec<(PanelKind, CheckMenuItem)>,
}

impl TrayHandle {
    /// Re-read enabled flags from the store into the check marks
    pub fn sync(&self, store: &ConfigStore) {
        for (kind, item) in &self.items {
            item.set_checked(store.panel(*kind).enabled);
        }
    }
}

/// Build the tray icon and start forwarding its menu events as
/// commands. `repaint` wakes the UI context so commands are drained
/// promptly.
pub fn spawn(
    store: &Arc<ConfigStore>,
    repaint: eframe::egui::Context,
) -> Result<(TrayHandle, Receiver<TrayCommand>)> {
    let menu = Menu::new();
    let mut items = Vec::new();
    let mut commands: HashMap<MenuId, TrayCommand> = HashMap::new();

    for kind in PanelKind::all() {
        let item = CheckMenuItem::new(
            format!("Toggle {}", kind.title()),
            true,
            store.panel(*kind).enabled,
            None,
        );
        menu.append(&item).context("Failed to build tray menu")?;
        commands.insert(item.id().clone(), TrayCommand::Toggle(*kind));
        items.push((*kind, item));
    }

    let quit = MenuItem::new("Quit", true, None);
    menu.append(&quit).context("Failed to build tray menu")?;
    commands.insert(quit.id().clone(), TrayCommand::Quit);

    let tray = TrayIconBuilder::new()
        .with_menu(Box::new(menu))
        .with_tooltip("System Dashboard")
        .with_icon(placeholder_icon()?)
        .build()
        .context("Failed to create tray icon")?;

    let (tx, rx) = channel();
    forward_menu_events(commands, tx, repaint);

    Ok((TrayHandle { _tray: tray, items }, rx))
}

fn forward_menu_events(
    commands: HashMap<MenuId, TrayCommand>,
    tx: Sender<TrayCommand>,
    repaint: eframe::egui::Context,
) {
    std::thread::spawn(move || {
        while let Ok(event) = MenuEvent::receiver().recv() {
            let Some(command) = commands.get(&event.id).copied() else {
                continue;
            };
            if tx.send(command).is_err() {
                break;
            }
            repaint.request_repaint();
        }
    });
}

/// Solid placeholder icon, like the original's generated bitmap
fn placeholder_icon() -> Result<Icon> {
    const SIZE: u32 = 64;
    let mut rgba = Vec::with_capacity((SIZE * SIZE * 4) as usize);
    for _ in 0..SIZE * SIZE {
        rgba.extend_from_slice(&[0x3b, 0x82, 0xf6, 0xff]);
    }
    Icon::from_rgba(rgba, SIZE, SIZE).context("Failed to build tray icon image")
}
