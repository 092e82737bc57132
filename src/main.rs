#![cfg_attr(target_os = "windows", windows_subsystem = "windows")]

mod app;

use crate::app::{ball_window_side, FloatGridApp, APP_DISPLAY_NAME};
use eframe::egui;
use float_grid::config::Settings;

fn main() -> eframe::Result<()> {
    env_logger::init();
    let settings = Settings::load();
    let side = ball_window_side(&settings);

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([side, side])
            .with_resizable(false)
            .with_decorations(false)
            .with_transparent(true)
            .with_always_on_top()
            .with_taskbar(false)
            .with_drag_and_drop(true)
            .with_visible(true),
        ..Default::default()
    };

    eframe::run_native(
        APP_DISPLAY_NAME,
        options,
        Box::new(move |cc| {
            cc.egui_ctx.set_visuals(egui::Visuals::dark());
            install_windows_font_fallback(&cc.egui_ctx);
            Ok(Box::new(FloatGridApp::new(cc, settings)))
        }),
    )
}

fn install_windows_font_fallback(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();
    let font_candidates = [
        ("yahei", r"C:\Windows\Fonts\msyh.ttc"),
        ("yahei_ui", r"C:\Windows\Fonts\msyhbd.ttc"),
        ("simhei", r"C:\Windows\Fonts\simhei.ttf"),
    ];

    for (name, path) in font_candidates {
        if let Ok(data) = std::fs::read(path) {
            fonts
                .font_data
                .insert(name.to_owned(), egui::FontData::from_owned(data).into());

            if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Proportional) {
                family.insert(0, name.to_owned());
            }
            if let Some(family) = fonts.families.get_mut(&egui::FontFamily::Monospace) {
                family.push(name.to_owned());
            }
            break;
        }
    }

    ctx.set_fonts(fonts);
}
