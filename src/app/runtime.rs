use super::APP_DISPLAY_NAME;
use crossbeam_channel::{unbounded, Receiver, Sender, TryRecvError};
use eframe::egui;
use float_grid::config::Settings;
use float_grid::events::UserEvent;
use float_grid::icons::{DiskCachedProvider, IconImage, IconLoader, ShellIconProvider};
use log::{error, info, warn};
use std::thread;
use std::time::Duration;
use tray_icon::{
    menu::{Menu, MenuEvent, MenuId, MenuItem},
    Icon, MouseButton, MouseButtonState, TrayIcon, TrayIconBuilder, TrayIconEvent,
};

const TRAY_ICON_SIDE: usize = 32;

pub struct RuntimeHandles {
    /// `None` when the platform refused a tray icon; the ball still works.
    pub tray_icon: Option<TrayIcon>,
    pub rx: Receiver<UserEvent>,
    pub toggle_item: MenuItem,
}

pub fn build_runtime(ctx: &egui::Context) -> RuntimeHandles {
    let (ui_tx, ui_rx) = unbounded::<UserEvent>();

    let tray_menu = Menu::new();
    let toggle_item = MenuItem::new("Hide", true, None);
    let quit_item = MenuItem::new("Quit", true, None);
    if let Err(err) = tray_menu.append_items(&[&toggle_item, &quit_item]) {
        error!("failed to build tray menu: {err}");
    }

    let tray_icon = tray_icon_image().and_then(|icon| {
        TrayIconBuilder::new()
            .with_menu(Box::new(tray_menu))
            .with_tooltip(APP_DISPLAY_NAME)
            .with_icon(icon)
            .build()
            .map_err(|err| error!("failed to create tray icon: {err}"))
            .ok()
    });

    spawn_runtime_event_loop(
        ui_tx,
        ctx.clone(),
        toggle_item.id().clone(),
        quit_item.id().clone(),
    );

    RuntimeHandles {
        tray_icon,
        rx: ui_rx,
        toggle_item,
    }
}

/// Icon worker backed by the shell, with results kept on disk next to the
/// settings. Every finished icon wakes the UI.
pub fn spawn_icon_loader(ctx: &egui::Context) -> IconLoader {
    let notify_ctx = ctx.clone();
    let notify = move || notify_ctx.request_repaint();
    match Settings::config_dir() {
        Some(dir) => {
            let cache_dir = dir.join("icon_cache");
            info!("icon cache at {}", cache_dir.display());
            IconLoader::spawn(DiskCachedProvider::new(ShellIconProvider, cache_dir), notify)
        }
        None => {
            warn!("no config directory; icons are not cached on disk");
            IconLoader::spawn(ShellIconProvider, notify)
        }
    }
}

fn tray_icon_image() -> Option<Icon> {
    let image = ball_image(TRAY_ICON_SIDE, [45, 190, 150, 255]);
    Icon::from_rgba(image.rgba, image.width as u32, image.height as u32)
        .map_err(|err| error!("bad tray icon image: {err}"))
        .ok()
}

/// Filled disc on a transparent square.
fn ball_image(side: usize, color: [u8; 4]) -> IconImage {
    let mut image = IconImage::transparent(side, side);
    let r = side as f32 * 0.5;
    for y in 0..side {
        for x in 0..side {
            let dx = x as f32 + 0.5 - r;
            let dy = y as f32 + 0.5 - r;
            if dx * dx + dy * dy <= (r - 1.0) * (r - 1.0) {
                let i = (y * side + x) * 4;
                image.rgba[i..i + 4].copy_from_slice(&color);
            }
        }
    }
    image
}

fn spawn_runtime_event_loop(
    ui_tx: Sender<UserEvent>,
    ctx: egui::Context,
    toggle_menu_id: MenuId,
    quit_menu_id: MenuId,
) {
    thread::spawn(move || {
        let mut is_visible = true;
        loop {
            match MenuEvent::receiver().try_recv() {
                Ok(event) => {
                    if event.id == toggle_menu_id {
                        apply_runtime_action(UserEvent::Toggle, &ui_tx, &ctx, &mut is_visible);
                    } else if event.id == quit_menu_id {
                        apply_runtime_action(UserEvent::Quit, &ui_tx, &ctx, &mut is_visible);
                    }
                }
                Err(err) => {
                    if !matches!(err, TryRecvError::Empty) {
                        error!("menu receiver error: {}", err);
                    }
                }
            }

            match TrayIconEvent::receiver().try_recv() {
                Ok(TrayIconEvent::Click {
                    button: MouseButton::Left,
                    button_state: MouseButtonState::Up,
                    ..
                }) => apply_runtime_action(UserEvent::Toggle, &ui_tx, &ctx, &mut is_visible),
                Ok(_) => {}
                Err(err) => {
                    if !matches!(err, TryRecvError::Empty) {
                        error!("tray receiver error: {}", err);
                    }
                }
            }

            thread::sleep(Duration::from_millis(10));
        }
    });
}

/// Window visibility is switched from this thread: a minimized window does
/// not run its update loop, so it could never bring itself back.
fn apply_runtime_action(
    action: UserEvent,
    ui_tx: &Sender<UserEvent>,
    ctx: &egui::Context,
    is_visible: &mut bool,
) {
    match action {
        UserEvent::Show => {
            *is_visible = true;
            ctx.send_viewport_cmd(egui::ViewportCommand::Visible(true));
            ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(false));
            let _ = ui_tx.send(UserEvent::Show);
        }
        UserEvent::Hide => {
            if *is_visible {
                *is_visible = false;
                ctx.send_viewport_cmd(egui::ViewportCommand::Minimized(true));
                let _ = ui_tx.send(UserEvent::Hide);
            }
        }
        UserEvent::Toggle => {
            let next = if *is_visible {
                UserEvent::Hide
            } else {
                UserEvent::Show
            };
            apply_runtime_action(next, ui_tx, ctx, is_visible);
        }
        UserEvent::Quit => {
            if ui_tx.send(UserEvent::Quit).is_err() {
                warn!("ui is gone before quit");
            }
            ctx.send_viewport_cmd(egui::ViewportCommand::Close);
        }
    }
    ctx.request_repaint();
}
