use eframe::egui::Color32;
use float_grid::drag::Highlight;

pub const HEADER_HEIGHT: f32 = 34.0;
pub const ADD_BAR_HEIGHT: f32 = 34.0;
pub const CONTENT_PADDING: f32 = 8.0;
pub const PANEL_ROUNDING: f32 = 14.0;
pub const TILE_ROUNDING: f32 = 12.0;
pub const RESIZE_GRIP: f32 = 14.0;
/// Padding around the ball inside its window, for the shadow.
pub const BALL_MARGIN: f32 = 4.0;

#[derive(Clone, Copy)]
pub struct LauncherTheme {
    pub panel_bg: Color32,
    pub panel_border: Color32,
    pub header_bg: Color32,
    pub title_color: Color32,
    pub label_color: Color32,
    pub tile_bg: Color32,
    pub tile_hover: Color32,
    pub tile_border: Color32,
    pub preview_border: Color32,
    pub locked_border: Color32,
    pub icon_placeholder: Color32,
    pub drop_hint: Color32,
    pub ball_fill: Color32,
    pub ball_ring: Color32,
    pub toast_bg: Color32,
    pub toast_text: Color32,
}

impl Default for LauncherTheme {
    fn default() -> Self {
        Self {
            panel_bg: Color32::from_rgba_premultiplied(14, 20, 31, 214),
            panel_border: Color32::from_rgba_premultiplied(161, 179, 201, 36),
            header_bg: Color32::from_rgba_premultiplied(21, 32, 48, 200),
            title_color: Color32::from_rgb(242, 248, 255),
            label_color: Color32::from_rgb(205, 218, 232),
            tile_bg: Color32::from_rgba_premultiplied(24, 36, 50, 154),
            tile_hover: Color32::from_rgba_premultiplied(35, 53, 74, 184),
            tile_border: Color32::from_rgba_premultiplied(147, 169, 194, 78),
            preview_border: Color32::from_rgba_premultiplied(93, 214, 189, 150),
            locked_border: Color32::from_rgb(93, 214, 189),
            icon_placeholder: Color32::from_rgba_premultiplied(205, 221, 238, 108),
            drop_hint: Color32::from_rgba_premultiplied(93, 214, 189, 186),
            ball_fill: Color32::from_rgba_premultiplied(28, 110, 98, 230),
            ball_ring: Color32::from_rgba_premultiplied(160, 240, 220, 160),
            toast_bg: Color32::from_rgba_premultiplied(8, 12, 18, 236),
            toast_text: Color32::from_rgb(245, 250, 255),
        }
    }
}

impl LauncherTheme {
    pub fn tile_border_for(&self, highlight: Highlight) -> Option<Color32> {
        match highlight {
            Highlight::None => None,
            Highlight::Preview => Some(self.preview_border),
            Highlight::Locked => Some(self.locked_border),
        }
    }
}
