mod runtime;
mod state;
mod style;
mod ui;

use crossbeam_channel::Receiver;
use eframe::egui;
use float_grid::config::Settings;
use float_grid::dock::{DockConfig, EdgeDock};
use float_grid::engine::LauncherEngine;
use float_grid::events::UserEvent;
use float_grid::launch::LaunchReport;
use float_grid::layout::Point;
use float_grid::store::{AddEntryResult, AppStore, MemoryPersistence};
use log::{error, warn};
use state::{RenameState, ResizeDrag, TextureCache, Toast, ViewMode, WindowDrag};
use std::time::Instant;
use tray_icon::{menu::MenuItem, TrayIcon};

pub const APP_DISPLAY_NAME: &str = "Float Grid";
pub const GRID_WIDTH: f32 = 380.0;
pub const GRID_HEIGHT: f32 = 460.0;
pub const MIN_GRID_WIDTH: f32 = 200.0;
pub const MIN_GRID_HEIGHT: f32 = 220.0;
/// Screen size assumed until the viewport reports the real one.
const FALLBACK_SCREEN: Point = Point::new(1920.0, 1080.0);

pub struct FloatGridApp {
    _tray_icon: Option<TrayIcon>,
    rx: Receiver<UserEvent>,
    toggle_item: MenuItem,
    is_visible: bool,
    settings: Settings,
    engine: LauncherEngine,
    dock: EdgeDock,
    mode: ViewMode,
    window_drag: Option<WindowDrag>,
    resize_drag: Option<ResizeDrag>,
    search: String,
    add_input: String,
    show_add_bar: bool,
    context_target: Option<usize>,
    renaming: Option<RenameState>,
    textures: TextureCache,
    warning_message: Option<Toast>,
    /// Start of the grid's slide-in.
    opened_at: Option<Instant>,
}

impl FloatGridApp {
    pub fn new(cc: &eframe::CreationContext<'_>, settings: Settings) -> Self {
        let grid_size = grid_window_size(&settings);
        let runtime = runtime::build_runtime(&cc.egui_ctx);
        let loader = runtime::spawn_icon_loader(&cc.egui_ctx);

        let mut warning_message = None;
        let engine = match LauncherEngine::open_default(settings.clone(), grid_size.x) {
            Ok(engine) => engine,
            Err(err) => {
                error!("{err}; entries will not be saved");
                warning_message = Some(Toast {
                    message: "Entries cannot be saved on this system".to_string(),
                    since: Instant::now(),
                });
                let store = AppStore::open(Box::new(MemoryPersistence::new()));
                LauncherEngine::new(store, settings.clone(), grid_size.x)
            }
        }
        .with_icon_loader(loader);

        let ball = ball_window_side(&settings);
        let origin = settings
            .ball_pos
            .map(|(x, y)| Point::new(x, y))
            .unwrap_or(Point::new(FALLBACK_SCREEN.x - ball - 40.0, 200.0));
        let dock = EdgeDock::new(
            DockConfig::from(&settings),
            origin,
            Point::new(ball, ball),
            FALLBACK_SCREEN,
        );
        cc.egui_ctx
            .send_viewport_cmd(egui::ViewportCommand::OuterPosition(to_pos(dock.current_origin())));

        Self {
            _tray_icon: runtime.tray_icon,
            rx: runtime.rx,
            toggle_item: runtime.toggle_item,
            is_visible: true,
            settings,
            engine,
            dock,
            mode: ViewMode::Ball,
            window_drag: None,
            resize_drag: None,
            search: String::new(),
            add_input: String::new(),
            show_add_bar: false,
            context_target: None,
            renaming: None,
            textures: TextureCache::default(),
            warning_message,
            opened_at: None,
        }
    }

    fn on_user_event(&mut self, ctx: &egui::Context, event: UserEvent) {
        match event {
            UserEvent::Show => {
                self.is_visible = true;
                self.toggle_item.set_text("Hide");
                ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
            }
            UserEvent::Hide => {
                self.is_visible = false;
                self.toggle_item.set_text("Show");
                self.collapse_to_ball(ctx);
            }
            // the runtime thread resolves toggles before they get here
            UserEvent::Toggle => {}
            UserEvent::Quit => {
                self.save_settings();
                ctx.send_viewport_cmd(egui::ViewportCommand::Close);
            }
        }
    }

    fn open_grid(&mut self, ctx: &egui::Context) {
        if self.mode == ViewMode::Grid {
            return;
        }
        self.mode = ViewMode::Grid;
        let size = grid_window_size(&self.settings);
        let screen = self.screen_size(ctx);
        let ball = self.dock.resting_origin();
        // open towards the middle of the screen
        let x = if ball.x + size.x > screen.x {
            ball.x + ball_window_side(&self.settings) - size.x
        } else {
            ball.x
        };
        let y = ball.y.min(screen.y - size.y);
        let origin = egui::pos2(x.max(0.0), y.max(0.0));
        ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
        ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(origin));
        self.engine.set_container_width(size.x - style::CONTENT_PADDING * 2.0);
    }

    fn collapse_to_ball(&mut self, ctx: &egui::Context) {
        if self.mode == ViewMode::Ball {
            return;
        }
        self.mode = ViewMode::Ball;
        self.show_add_bar = false;
        self.renaming = None;
        self.context_target = None;
        self.engine.capture_lost(Instant::now());
        if ctx.input(|i| i.viewport().maximized.unwrap_or(false)) {
            ctx.send_viewport_cmd(egui::ViewportCommand::Maximized(false));
        }
        let side = ball_window_side(&self.settings);
        ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(egui::vec2(side, side)));
        ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(to_pos(
            self.dock.current_origin(),
        )));
    }

    fn screen_size(&self, ctx: &egui::Context) -> Point {
        ctx.input(|i| i.viewport().monitor_size)
            .filter(|s| s.x > 0.0 && s.y > 0.0)
            .map(|s| Point::new(s.x, s.y))
            .unwrap_or(FALLBACK_SCREEN)
    }

    fn show_warning<S: Into<String>>(&mut self, message: S) {
        self.warning_message = Some(Toast {
            message: message.into(),
            since: Instant::now(),
        });
    }

    fn report_add(&mut self, result: AddEntryResult, what: &str) {
        match result {
            AddEntryResult::Added(_) => {}
            AddEntryResult::Duplicate(index) => {
                let name = self
                    .engine
                    .store()
                    .get(index)
                    .map(|e| e.name.clone())
                    .unwrap_or_default();
                self.show_warning(format!("Already added as \"{name}\""));
            }
            AddEntryResult::Missing => self.show_warning(format!("Not found: {what}")),
            AddEntryResult::Unsupported => self.show_warning(format!("Cannot add {what}")),
        }
    }

    fn report_launch(&mut self, reports: Vec<LaunchReport>) {
        let failed: Vec<String> = reports
            .into_iter()
            .filter(|r| !r.is_ok())
            .map(|r| r.name)
            .collect();
        if !failed.is_empty() {
            self.show_warning(format!("Could not open {}", failed.join(", ")));
        }
    }

    fn surface_persist_error(&mut self) {
        if let Some(err) = self.engine.take_persist_error() {
            warn!("entry list not saved: {err}");
            self.show_warning("Changes could not be saved");
        }
    }

    fn save_settings(&mut self) {
        let ball = self.dock.resting_origin();
        self.settings.ball_pos = Some((ball.x, ball.y));
        self.settings.save();
    }
}

pub(crate) fn ball_window_side(settings: &Settings) -> f32 {
    sanitize_dimension(settings.ball_size, 56.0, 24.0, 256.0) + style::BALL_MARGIN * 2.0
}

pub(crate) fn grid_window_size(settings: &Settings) -> egui::Vec2 {
    let (w, h) = settings.window_size.unwrap_or((GRID_WIDTH, GRID_HEIGHT));
    egui::vec2(
        sanitize_dimension(w, GRID_WIDTH, MIN_GRID_WIDTH, 4096.0),
        sanitize_dimension(h, GRID_HEIGHT, MIN_GRID_HEIGHT, 4096.0),
    )
}

pub(crate) fn sanitize_dimension(value: f32, fallback: f32, min: f32, max: f32) -> f32 {
    if !value.is_finite() {
        return fallback;
    }
    value.clamp(min, max)
}

pub(crate) fn to_pos(p: Point) -> egui::Pos2 {
    egui::pos2(p.x, p.y)
}

pub(crate) fn to_point(p: egui::Pos2) -> Point {
    Point::new(p.x, p.y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_sizes_are_sanitized() {
        let settings = Settings {
            window_size: Some((f32::NAN, 10.0)),
            ball_size: 1000.0,
            ..Settings::default()
        };
        assert_eq!(
            grid_window_size(&settings),
            egui::vec2(GRID_WIDTH, MIN_GRID_HEIGHT)
        );
        assert_eq!(ball_window_side(&settings), 256.0 + style::BALL_MARGIN * 2.0);
    }
}
