use eframe::egui;
use float_grid::combine::combo_name;
use float_grid::entry::AppEntry;
use float_grid::icons::IconImage;
use std::collections::HashMap;
use std::time::Instant;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewMode {
    Ball,
    Grid,
}

/// Window being moved by hand, in screen coordinates.
#[derive(Debug, Clone, Copy)]
pub struct WindowDrag {
    pub start_window_pos: egui::Pos2,
    pub start_global_mouse: egui::Pos2,
}

#[derive(Debug, Clone, Copy)]
pub struct ResizeDrag {
    pub start_size: egui::Vec2,
    pub start_global_mouse: egui::Pos2,
}

pub struct RenameState {
    pub index: usize,
    pub text: String,
}

/// GPU copies of resolved icons, keyed like the engine's icon cache.
/// Combo mosaics are keyed by their member list.
#[derive(Default)]
pub struct TextureCache {
    icons: HashMap<String, egui::TextureHandle>,
    combos: HashMap<String, egui::TextureHandle>,
}

impl TextureCache {
    pub fn icon(
        &mut self,
        ctx: &egui::Context,
        key: &str,
        image: &IconImage,
    ) -> egui::TextureHandle {
        self.icons
            .entry(key.to_string())
            .or_insert_with(|| upload(ctx, key, image))
            .clone()
    }

    pub fn combo<F>(
        &mut self,
        ctx: &egui::Context,
        entry: &AppEntry,
        compose: F,
    ) -> Option<egui::TextureHandle>
    where
        F: FnOnce() -> Option<IconImage>,
    {
        let key = combo_key(entry);
        if let Some(tex) = self.combos.get(&key) {
            return Some(tex.clone());
        }
        let image = compose()?;
        let tex = upload(ctx, &key, &image);
        self.combos.insert(key, tex.clone());
        Some(tex)
    }

    /// A member icon changed; mosaics built from it are stale.
    pub fn forget(&mut self, key: &str) {
        self.icons.remove(key);
        self.combos.clear();
    }
}

fn combo_key(entry: &AppEntry) -> String {
    let members: Vec<&str> = entry
        .children()
        .iter()
        .take(4)
        .map(|c| c.icon_key().unwrap_or(c.name.as_str()))
        .collect();
    format!("combo:{}:{}", combo_name(entry.children()), members.join("|"))
}

fn upload(ctx: &egui::Context, name: &str, image: &IconImage) -> egui::TextureHandle {
    let color = egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
    ctx.load_texture(name, color, egui::TextureOptions::LINEAR)
}

pub struct Toast {
    pub message: String,
    pub since: Instant,
}
