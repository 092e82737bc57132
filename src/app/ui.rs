use super::state::{RenameState, ResizeDrag, WindowDrag};
use super::style::{
    LauncherTheme, ADD_BAR_HEIGHT, BALL_MARGIN, CONTENT_PADDING, HEADER_HEIGHT, PANEL_ROUNDING,
    RESIZE_GRIP, TILE_ROUNDING,
};
use super::{
    grid_window_size, to_point, to_pos, FloatGridApp, ViewMode, MIN_GRID_HEIGHT, MIN_GRID_WIDTH,
};
use eframe::egui;
use float_grid::drag::DragPhase;
use float_grid::easing::Easing;
use float_grid::engine::{EngineEvent, LauncherEngine, TileView, ICON_FETCH_SIZE};
use float_grid::icons::IconLookup;
use float_grid::launch::ShellLauncher;
use float_grid::store::AddEntryResult;
use float_grid::layout::Point;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const TOAST_DURATION: Duration = Duration::from_millis(2400);
const OPEN_ANIM: Duration = Duration::from_millis(420);
const OPEN_SLIDE: f32 = 14.0;
const LABEL_CHARS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq)]
enum WindowDragStep {
    Idle,
    Moved(egui::Pos2),
    Released,
}

impl eframe::App for FloatGridApp {
    fn clear_color(&self, _visuals: &egui::Visuals) -> [f32; 4] {
        [0.0, 0.0, 0.0, 0.0]
    }

    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.rx.try_recv() {
            self.on_user_event(ctx, event);
        }

        let now = Instant::now();
        let screen = self.screen_size(ctx);
        self.dock.set_screen(screen);

        self.engine.request_visible_icons();
        for key in self.engine.drain_icons() {
            self.textures.forget(&key);
        }
        self.engine.tick(now);

        let theme = LauncherTheme::default();
        match self.mode {
            ViewMode::Ball => self.draw_ball(ctx, &theme, now),
            ViewMode::Grid => self.draw_grid(ctx, &theme, now),
        }

        self.surface_persist_error();
        self.draw_toast(ctx, &theme);
        self.schedule_repaint(ctx, now);
    }
}

impl FloatGridApp {
    fn schedule_repaint(&self, ctx: &egui::Context, now: Instant) {
        let wake = [self.engine.next_wake(now), self.dock.next_deadline()]
            .into_iter()
            .flatten()
            .min();
        if let Some(at) = wake {
            ctx.request_repaint_after(at.saturating_duration_since(now));
        }
    }

    fn draw_ball(&mut self, ctx: &egui::Context, theme: &LauncherTheme, now: Instant) {
        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let rect = ui.max_rect();
                let resp = ui.allocate_rect(rect, egui::Sense::click_and_drag());
                let center = rect.center();
                let r = (rect.width().min(rect.height()) * 0.5 - BALL_MARGIN).max(4.0);
                let painter = ui.painter();
                painter.circle_filled(center + egui::vec2(0.0, 1.5), r, theme.toast_bg);
                painter.circle_filled(center, r, theme.ball_fill);
                painter.circle_stroke(center, r - 1.0, egui::Stroke::new(2.0, theme.ball_ring));
                painter.text(
                    center,
                    egui::Align2::CENTER_CENTER,
                    self.engine.store().len().to_string(),
                    egui::FontId::proportional(r * 0.7),
                    theme.title_color,
                );

                if resp.hovered() && self.window_drag.is_none() && self.dock.hover(now) {
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(to_pos(
                        self.dock.current_origin(),
                    )));
                }
                if !resp.hovered() && self.window_drag.is_none() && self.dock.poll(now) {
                    ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(to_pos(
                        self.dock.current_origin(),
                    )));
                }

                match self.handle_window_drag(ctx, &resp) {
                    WindowDragStep::Idle => {}
                    WindowDragStep::Moved(origin) => self.dock.drag_to(to_point(origin)),
                    WindowDragStep::Released => {
                        let origin = self.dock.release(now);
                        ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(to_pos(
                            origin,
                        )));
                        self.save_settings();
                    }
                }

                if resp.clicked() {
                    self.open_grid(ctx);
                    self.opened_at = Some(now);
                }
                resp.on_hover_text(super::APP_DISPLAY_NAME);
            });
    }

    /// Moves the whole window along with the pointer.
    fn handle_window_drag(&mut self, ctx: &egui::Context, resp: &egui::Response) -> WindowDragStep {
        let Some(window_rect) = ctx.input(|i| i.viewport().outer_rect) else {
            return WindowDragStep::Idle;
        };
        if resp.drag_started_by(egui::PointerButton::Primary) {
            if let Some(hover_pos) = ctx.input(|i| i.pointer.hover_pos()) {
                self.window_drag = Some(WindowDrag {
                    start_window_pos: window_rect.min,
                    start_global_mouse: window_rect.min + hover_pos.to_vec2(),
                });
            }
        }
        let Some(drag) = self.window_drag else {
            return WindowDragStep::Idle;
        };
        if ctx.input(|i| i.pointer.button_released(egui::PointerButton::Primary)) {
            self.window_drag = None;
            return WindowDragStep::Released;
        }
        match ctx.input(|i| i.pointer.hover_pos()) {
            Some(hover_pos) => {
                let current_global_mouse = window_rect.min + hover_pos.to_vec2();
                let new_origin = drag.start_window_pos + (current_global_mouse - drag.start_global_mouse);
                ctx.send_viewport_cmd(egui::ViewportCommand::OuterPosition(new_origin));
                WindowDragStep::Moved(new_origin)
            }
            None => WindowDragStep::Idle,
        }
    }

    fn draw_grid(&mut self, ctx: &egui::Context, theme: &LauncherTheme, now: Instant) {
        let dropped: Vec<PathBuf> = ctx.input(|i| {
            i.raw
                .dropped_files
                .iter()
                .filter_map(|f| f.path.clone())
                .collect()
        });
        for path in dropped {
            let result = self.engine.add_path(&path, None);
            self.report_add(result, &path.display().to_string());
        }
        let hovering_files = ctx.input(|i| !i.raw.hovered_files.is_empty());

        if ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            if self.renaming.is_some() {
                self.renaming = None;
            } else if self.show_add_bar {
                self.show_add_bar = false;
            } else {
                self.collapse_to_ball(ctx);
                return;
            }
        }

        let slide = match self.opened_at {
            Some(start) if now.saturating_duration_since(start) < OPEN_ANIM => {
                let t = now.saturating_duration_since(start).as_secs_f32() / OPEN_ANIM.as_secs_f32();
                ctx.request_repaint();
                (1.0 - Easing::OutElastic.apply(t)) * OPEN_SLIDE
            }
            _ => {
                self.opened_at = None;
                0.0
            }
        };

        egui::CentralPanel::default()
            .frame(egui::Frame::none())
            .show(ctx, |ui| {
                let panel = ui.max_rect();
                ui.painter().rect_filled(panel, PANEL_ROUNDING, theme.panel_bg);
                ui.painter().rect_stroke(
                    panel,
                    PANEL_ROUNDING,
                    egui::Stroke::new(1.0, theme.panel_border),
                );

                let header = egui::Rect::from_min_size(panel.min, egui::vec2(panel.width(), HEADER_HEIGHT));
                if self.draw_header(ui, ctx, header, theme) {
                    return;
                }

                let bottom = if self.show_add_bar { ADD_BAR_HEIGHT } else { 0.0 };
                let content = egui::Rect::from_min_max(
                    egui::pos2(panel.min.x + CONTENT_PADDING, header.max.y + slide),
                    egui::pos2(
                        panel.max.x - CONTENT_PADDING,
                        (panel.max.y - bottom - CONTENT_PADDING).max(header.max.y + 1.0),
                    ),
                );
                self.engine.set_container_width(content.width());
                self.draw_tiles(ui, ctx, content, theme, now, hovering_files);

                if self.show_add_bar {
                    let bar = egui::Rect::from_min_max(
                        egui::pos2(panel.min.x + CONTENT_PADDING, panel.max.y - ADD_BAR_HEIGHT),
                        egui::pos2(panel.max.x - CONTENT_PADDING - RESIZE_GRIP, panel.max.y - 4.0),
                    );
                    self.draw_add_bar(ui, bar);
                }
                self.draw_resize_grip(ui, ctx, panel, theme);
            });

        self.draw_rename(ctx);
    }

    /// Search box, window handle and collapse button. Returns `true` when the
    /// grid was collapsed.
    fn draw_header(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        header: egui::Rect,
        theme: &LauncherTheme,
    ) -> bool {
        ui.painter().rect_filled(
            header,
            egui::Rounding {
                nw: PANEL_ROUNDING,
                ne: PANEL_ROUNDING,
                sw: 0.0,
                se: 0.0,
            },
            theme.header_bg,
        );
        let handle = ui.allocate_rect(header, egui::Sense::drag());
        if let WindowDragStep::Released = self.handle_window_drag(ctx, &handle) {
            ctx.request_repaint();
        }

        let button_side = HEADER_HEIGHT - 10.0;
        let close_rect = egui::Rect::from_min_size(
            egui::pos2(header.max.x - button_side - 8.0, header.min.y + 5.0),
            egui::vec2(button_side, button_side),
        );
        let maximize_rect = close_rect.translate(egui::vec2(-(button_side + 4.0), 0.0));
        let search_rect = egui::Rect::from_min_max(
            egui::pos2(header.min.x + 10.0, header.min.y + 6.0),
            egui::pos2(maximize_rect.min.x - 8.0, header.max.y - 6.0),
        );

        let before = self.search.clone();
        ui.put(
            search_rect,
            egui::TextEdit::singleline(&mut self.search).hint_text("Search"),
        );
        if self.search != before {
            self.engine.set_filter(&self.search);
        }

        let viewport = ctx.input(|i| i.viewport().clone());
        let (glyph, hint) = if viewport.maximized.unwrap_or(false) {
            ("🗗", "Restore")
        } else {
            ("🗖", "Maximize")
        };
        let maximize = ui.put(maximize_rect, egui::Button::new(glyph).frame(false));
        if maximize.on_hover_text(hint).clicked() {
            ctx.send_viewport_cmd(maximize_command(&viewport));
        }

        let close = ui.put(close_rect, egui::Button::new("●").frame(false));
        if close.on_hover_text("Collapse").clicked() {
            self.collapse_to_ball(ctx);
            return true;
        }
        false
    }

    fn draw_tiles(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        content: egui::Rect,
        theme: &LauncherTheme,
        now: Instant,
        hovering_files: bool,
    ) {
        let builder = egui::UiBuilder::new().max_rect(content);
        ui.allocate_new_ui(builder, |ui| {
            egui::ScrollArea::vertical()
                .drag_to_scroll(false)
                .auto_shrink([false, false])
                .show(ui, |ui| {
                    let height = self.engine.content_height().max(ui.available_height());
                    let (canvas, resp) = ui.allocate_exact_size(
                        egui::vec2(ui.available_width(), height),
                        egui::Sense::click_and_drag(),
                    );
                    let origin = canvas.min;
                    self.forward_pointer(ctx, &resp, origin, now);
                    self.paint_canvas(ui, ctx, origin, theme, now, hovering_files);
                    self.tile_context_menu(&resp);
                });
        });
    }

    fn forward_pointer(
        &mut self,
        ctx: &egui::Context,
        resp: &egui::Response,
        origin: egui::Pos2,
        now: Instant,
    ) {
        let local = |p: egui::Pos2| Point::new(p.x - origin.x, p.y - origin.y);
        let (pressed, down, released, pos) = ctx.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.primary_down(),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });

        if pressed && resp.contains_pointer() {
            if let Some(p) = pos {
                self.engine.pointer_down(local(p));
            }
        }

        if self.engine.drag_phase() != DragPhase::Idle {
            if let (true, Some(p)) = (down, pos) {
                self.engine.pointer_move(local(p), now);
            }
            if released {
                let event = self.engine.pointer_up(now);
                self.on_engine_event(event);
            } else if !down {
                let event = self.engine.capture_lost(now);
                self.on_engine_event(event);
            }
        } else if resp.clicked() {
            let add_slot = self.engine.add_slot_rect();
            if pos.is_some_and(|p| add_slot.contains(local(p))) {
                self.show_add_bar = true;
            }
        }

        if resp.secondary_clicked() {
            self.context_target = pos.and_then(|p| self.engine.hit_test(local(p)));
        }
    }

    fn on_engine_event(&mut self, event: EngineEvent) {
        match event {
            EngineEvent::Activated(index) => {
                let reports = self.engine.launch(index, &ShellLauncher);
                self.report_launch(reports);
            }
            EngineEvent::Combined(index) => {
                if let Some(entry) = self.engine.store().get(index) {
                    let message = format!("Created \"{}\"", entry.name);
                    self.show_warning(message);
                }
            }
            EngineEvent::Reordered | EngineEvent::None => {}
        }
    }

    fn paint_canvas(
        &mut self,
        ui: &egui::Ui,
        ctx: &egui::Context,
        origin: egui::Pos2,
        theme: &LauncherTheme,
        now: Instant,
        hovering_files: bool,
    ) {
        let painter = ui.painter();
        let to_screen = |r: float_grid::layout::Rect| {
            egui::Rect::from_min_size(
                egui::pos2(origin.x + r.min.x, origin.y + r.min.y),
                egui::vec2(r.width, r.height),
            )
        };
        let hover = ctx.input(|i| i.pointer.hover_pos());

        let add_rect = to_screen(self.engine.add_slot_rect());
        let add_box = egui::Rect::from_min_size(add_rect.min, egui::vec2(add_rect.width(), add_rect.width()));
        let add_color = if hovering_files {
            theme.drop_hint
        } else {
            theme.tile_border
        };
        painter.rect_stroke(add_box.shrink(2.0), TILE_ROUNDING, egui::Stroke::new(1.5, add_color));
        painter.text(
            add_box.center(),
            egui::Align2::CENTER_CENTER,
            "+",
            egui::FontId::proportional(add_box.height() * 0.45),
            add_color,
        );

        if self.engine.is_no_match() {
            painter.text(
                egui::pos2(add_rect.max.x + 16.0, add_box.center().y),
                egui::Align2::LEFT_CENTER,
                "No match",
                egui::FontId::proportional(14.0),
                theme.label_color,
            );
        }

        let engine = &self.engine;
        for tile in engine.tiles(now) {
            let rect = to_screen(tile.rect);
            let hovered = hover.is_some_and(|p| rect.contains(p));
            paint_tile(painter, ctx, &mut self.textures, engine, &tile, rect, theme, hovered);
        }
    }

    fn tile_context_menu(&mut self, resp: &egui::Response) {
        resp.context_menu(|ui| {
            let target = self
                .context_target
                .and_then(|index| self.engine.store().get(index).map(|e| (index, e.is_combo())));
            match target {
                Some((index, is_combo)) => {
                    if ui.button("Rename").clicked() {
                        let text = self
                            .engine
                            .store()
                            .get(index)
                            .map(|e| e.name.clone())
                            .unwrap_or_default();
                        self.renaming = Some(RenameState { index, text });
                        ui.close_menu();
                    }
                    if is_combo && ui.button("Split group").clicked() {
                        self.engine.dissolve_at(index);
                        ui.close_menu();
                    }
                    if ui.button("Remove").clicked() {
                        self.engine.remove_at(index);
                        self.context_target = None;
                        ui.close_menu();
                    }
                }
                None => {
                    if ui.button("Add path or URL").clicked() {
                        self.show_add_bar = true;
                        ui.close_menu();
                    }
                }
            }
        });
    }

    fn draw_add_bar(&mut self, ui: &mut egui::Ui, bar: egui::Rect) {
        let button_w = 52.0;
        let gap = 6.0;
        let slot = |i: f32| {
            let max_x = bar.max.x - i * (button_w + gap);
            egui::Rect::from_min_max(egui::pos2(max_x - button_w, bar.min.y), egui::pos2(max_x, bar.max.y))
        };
        let input_rect = egui::Rect::from_min_max(bar.min, egui::pos2(slot(2.0).min.x - gap, bar.max.y));

        let input = ui.put(
            input_rect,
            egui::TextEdit::singleline(&mut self.add_input).hint_text("Path or URL"),
        );
        let submitted = input.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter));

        let file = ui.put(slot(2.0), egui::Button::new("File…"));
        if file.on_hover_text("Choose a program").clicked() {
            let picked = rfd::FileDialog::new()
                .set_title("Choose a program")
                .add_filter("Programs", &["exe"])
                .add_filter("All files", &["*"])
                .pick_file();
            if let Some(path) = picked {
                self.add_entry(AddSource::Picked(path));
            }
        }
        let folder = ui.put(slot(1.0), egui::Button::new("Folder…"));
        if folder.on_hover_text("Choose a folder").clicked() {
            let picked = rfd::FileDialog::new().set_title("Choose a folder").pick_folder();
            if let Some(path) = picked {
                self.add_entry(AddSource::Picked(path));
            }
        }

        let clicked = ui.put(slot(0.0), egui::Button::new("Add")).clicked();
        if submitted || clicked {
            let text = self.add_input.trim().to_string();
            if !text.is_empty() {
                self.add_entry(AddSource::Typed(text));
            }
        }
    }

    fn add_entry(&mut self, source: AddSource) {
        let result = add_from(&mut self.engine, &source);
        self.report_add(result, &source.describe());
        if matches!(result, AddEntryResult::Added(_)) {
            if matches!(source, AddSource::Typed(_)) {
                self.add_input.clear();
            }
            self.show_add_bar = false;
        }
    }

    fn draw_resize_grip(
        &mut self,
        ui: &mut egui::Ui,
        ctx: &egui::Context,
        panel: egui::Rect,
        theme: &LauncherTheme,
    ) {
        let zone = egui::Rect::from_min_max(panel.max - egui::vec2(RESIZE_GRIP, RESIZE_GRIP), panel.max);
        let resp = ui.interact(zone, ui.id().with("resize_grip"), egui::Sense::drag());
        if resp.hovered() || resp.dragged() {
            ctx.set_cursor_icon(egui::CursorIcon::ResizeNwSe);
        }
        ui.painter().line_segment(
            [zone.left_bottom() + egui::vec2(4.0, -3.0), zone.right_top() + egui::vec2(-3.0, 4.0)],
            egui::Stroke::new(1.0, theme.tile_border),
        );

        let global_mouse = ctx.input(|i| {
            let window = i.viewport().outer_rect?;
            Some(window.min + i.pointer.hover_pos()?.to_vec2())
        });
        if resp.drag_started_by(egui::PointerButton::Primary) {
            if let Some(start_global_mouse) = global_mouse {
                self.resize_drag = Some(ResizeDrag {
                    start_size: panel.size(),
                    start_global_mouse,
                });
            }
        }
        let Some(state) = self.resize_drag else {
            return;
        };
        if ctx.input(|i| i.pointer.button_released(egui::PointerButton::Primary)) {
            self.resize_drag = None;
            let size = panel.size();
            self.settings.window_size = Some((size.x, size.y));
            let size = grid_window_size(&self.settings);
            self.settings.window_size = Some((size.x, size.y));
            self.save_settings();
            return;
        }
        if let Some(mouse) = global_mouse {
            let delta = mouse - state.start_global_mouse;
            let size = egui::vec2(
                (state.start_size.x + delta.x).max(MIN_GRID_WIDTH),
                (state.start_size.y + delta.y).max(MIN_GRID_HEIGHT),
            );
            ctx.send_viewport_cmd(egui::ViewportCommand::InnerSize(size));
        }
    }

    fn draw_rename(&mut self, ctx: &egui::Context) {
        let Some(state) = &mut self.renaming else {
            return;
        };
        let mut commit = false;
        let mut cancel = false;
        egui::Window::new("Rename")
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
            .show(ctx, |ui| {
                let edit = ui.text_edit_singleline(&mut state.text);
                edit.request_focus();
                if edit.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    commit = true;
                }
                ui.horizontal(|ui| {
                    commit |= ui.button("OK").clicked();
                    cancel |= ui.button("Cancel").clicked();
                });
            });
        if commit {
            let index = state.index;
            let text = state.text.clone();
            self.renaming = None;
            if !self.engine.rename(index, &text) {
                self.show_warning("Name cannot be empty");
            }
        } else if cancel {
            self.renaming = None;
        }
    }

    fn draw_toast(&mut self, ctx: &egui::Context, theme: &LauncherTheme) {
        let Some(toast) = &self.warning_message else {
            return;
        };
        if toast.since.elapsed() >= TOAST_DURATION {
            self.warning_message = None;
            return;
        }
        // the ball window is too small to hold a message
        if self.mode == ViewMode::Ball {
            return;
        }
        let painter = ctx.layer_painter(egui::LayerId::new(
            egui::Order::Foreground,
            egui::Id::new("warning"),
        ));
        let rect = ctx.screen_rect();
        let galley = painter.layout(
            toast.message.clone(),
            egui::FontId::proportional(14.0),
            theme.toast_text,
            rect.width() - 40.0,
        );
        let text_rect = galley.rect;
        let anchor = egui::pos2(rect.center().x, rect.max.y - 36.0);
        let placed = text_rect.translate(anchor - text_rect.center());
        painter.rect_filled(placed.expand(10.0), 10.0, theme.toast_bg);
        painter.rect_stroke(placed.expand(10.0), 10.0, egui::Stroke::new(1.0, theme.tile_border));
        painter.galley(placed.min, galley, theme.toast_text);
        ctx.request_repaint_after(Duration::from_millis(100));
    }
}

#[allow(clippy::too_many_arguments)]
fn paint_tile(
    painter: &egui::Painter,
    ctx: &egui::Context,
    textures: &mut super::state::TextureCache,
    engine: &LauncherEngine,
    tile: &TileView<'_>,
    rect: egui::Rect,
    theme: &LauncherTheme,
    hovered: bool,
) {
    let icon_box = egui::Rect::from_min_size(rect.min, egui::vec2(rect.width(), rect.width()));
    if tile.raised {
        painter.rect_filled(icon_box.translate(egui::vec2(0.0, 4.0)), TILE_ROUNDING, theme.toast_bg);
    }
    let fill = if hovered || tile.raised {
        theme.tile_hover
    } else {
        theme.tile_bg
    };
    painter.rect_filled(icon_box, TILE_ROUNDING, fill);
    if let Some(color) = theme.tile_border_for(tile.highlight) {
        painter.rect_stroke(icon_box, TILE_ROUNDING, egui::Stroke::new(2.0, color));
    }

    let inner = icon_box.shrink(icon_box.width() * 0.18);
    let texture = if tile.entry.is_combo() {
        textures.combo(ctx, tile.entry, || {
            engine.combo_icon(tile.entry, ICON_FETCH_SIZE as usize)
        })
    } else {
        match (engine.icon_for(tile.entry), tile.entry.icon_key()) {
            (IconLookup::Ready(image), Some(key)) => Some(textures.icon(ctx, key, image)),
            _ => None,
        }
    };
    match texture {
        Some(tex) => painter.image(
            tex.id(),
            inner,
            egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
            egui::Color32::WHITE,
        ),
        None => {
            painter.rect_filled(inner, 8.0, theme.icon_placeholder);
            painter.text(
                inner.center(),
                egui::Align2::CENTER_CENTER,
                tile.entry.placeholder_letter().to_string(),
                egui::FontId::proportional(inner.height() * 0.5),
                theme.title_color,
            );
        }
    }

    let label = egui::Rect::from_min_max(egui::pos2(rect.min.x, icon_box.max.y), rect.max);
    painter.text(
        label.center(),
        egui::Align2::CENTER_CENTER,
        elide(&tile.entry.name, LABEL_CHARS),
        egui::FontId::proportional(12.0),
        theme.label_color,
    );
}

/// Where a new entry comes from.
#[derive(Debug, Clone, PartialEq)]
enum AddSource {
    /// Text from the add bar: a path or a web address.
    Typed(String),
    /// A path chosen in a native picker.
    Picked(PathBuf),
}

impl AddSource {
    fn describe(&self) -> String {
        match self {
            AddSource::Typed(text) => text.clone(),
            AddSource::Picked(path) => path.display().to_string(),
        }
    }
}

fn add_from(engine: &mut LauncherEngine, source: &AddSource) -> AddEntryResult {
    match source {
        AddSource::Picked(path) => engine.add_path(path, None),
        AddSource::Typed(text) if looks_like_path(text) => engine.add_path(Path::new(text), None),
        AddSource::Typed(text) => engine.add_url(text, None),
    }
}

fn maximize_command(viewport: &egui::ViewportInfo) -> egui::ViewportCommand {
    egui::ViewportCommand::Maximized(!viewport.maximized.unwrap_or(false))
}

fn elide(name: &str, max_chars: usize) -> String {
    if name.chars().count() <= max_chars {
        return name.to_string();
    }
    let kept: String = name.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{kept}…")
}

/// Drive letters and slashes mean a filesystem path; anything else is
/// treated as a web address.
fn looks_like_path(text: &str) -> bool {
    let bytes = text.as_bytes();
    text.starts_with('/')
        || text.starts_with('~')
        || text.contains('\\')
        || (bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && !text.contains("://"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_grid::config::Settings;
    use float_grid::store::{AppStore, MemoryPersistence};

    #[test]
    fn long_labels_are_elided() {
        assert_eq!(elide("Calc", 10), "Calc");
        assert_eq!(elide("Visual Studio Code", 10), "Visual St…");
    }

    fn empty_engine() -> LauncherEngine {
        let store = AppStore::open(Box::new(MemoryPersistence::new()));
        LauncherEngine::new(store, Settings::default(), 360.0)
    }

    #[test]
    fn picked_folder_and_typed_url_become_entries() {
        let dir = std::env::temp_dir().join(format!("float_grid_ui_{}", std::process::id()));
        let folder = dir.join("Tools");
        std::fs::create_dir_all(&folder).unwrap();
        let mut engine = empty_engine();

        let picked = AddSource::Picked(folder.clone());
        assert_eq!(add_from(&mut engine, &picked), AddEntryResult::Added(0));
        assert_eq!(engine.store().entries()[0].name, "Tools");
        assert_eq!(add_from(&mut engine, &picked), AddEntryResult::Duplicate(0));

        let typed = AddSource::Typed("example.com".to_string());
        assert_eq!(add_from(&mut engine, &typed), AddEntryResult::Added(1));
        assert_eq!(engine.store().entries()[1].path(), Some("http://example.com"));

        let gone = AddSource::Picked(dir.join("missing.exe"));
        assert_eq!(add_from(&mut engine, &gone), AddEntryResult::Missing);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn maximize_button_toggles() {
        let mut viewport = egui::ViewportInfo::default();
        assert!(matches!(
            maximize_command(&viewport),
            egui::ViewportCommand::Maximized(true)
        ));
        viewport.maximized = Some(true);
        assert!(matches!(
            maximize_command(&viewport),
            egui::ViewportCommand::Maximized(false)
        ));
    }

    #[test]
    fn paths_and_urls_are_told_apart() {
        assert!(looks_like_path(r"C:\Windows\notepad.exe"));
        assert!(looks_like_path("/usr/bin/gedit"));
        assert!(!looks_like_path("example.com"));
        assert!(!looks_like_path("https://docs.rs/"));
        assert!(!looks_like_path("localhost:8080"));
    }
}
