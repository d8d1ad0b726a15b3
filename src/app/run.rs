//! Top-level entry point for running StreamPlot as a native window.

use eframe::egui;

use crate::config::AppConfig;

use super::streamplot_app::StreamPlotApp;

/// Open the main window and block until it is closed.
///
/// Ingestion workers are stopped and joined when the app is dropped on exit.
pub fn run_app(mut config: AppConfig) -> eframe::Result<()> {
    let app = StreamPlotApp::new(&config);

    let title = config.title.clone();
    let mut opts = config
        .native_options
        .take()
        .unwrap_or_else(eframe::NativeOptions::default);

    if opts.viewport.icon.is_none() {
        if let Some(icon) = load_app_icon_svg() {
            opts.viewport = opts.viewport.clone().with_icon(icon);
        }
    }

    if opts.viewport.inner_size.is_none() {
        opts.viewport = opts
            .viewport
            .clone()
            .with_inner_size(egui::vec2(1400.0, 900.0));
    }

    eframe::run_native(
        &title,
        opts,
        Box::new(|cc| {
            let mut fonts = egui::FontDefinitions::default();
            egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);
            cc.egui_ctx.set_fonts(fonts);
            Ok(Box::new(app))
        }),
    )
}

/// Edge length of the rendered window icon in pixels.
const ICON_EDGE: u32 = 128;

/// Load `icon.svg` from the crate root as an [`egui::IconData`].
///
/// Returns `None` if the file is missing or cannot be rendered; the window then keeps the
/// platform default icon.
fn load_app_icon_svg() -> Option<egui::IconData> {
    let svg_path = concat!(env!("CARGO_MANIFEST_DIR"), "/icon.svg");
    let data = std::fs::read(svg_path).ok()?;
    render_svg_icon(&data, ICON_EDGE)
}

/// Rasterize SVG data into a square `edge` x `edge` RGBA icon, scaled to fit.
fn render_svg_icon(data: &[u8], edge: u32) -> Option<egui::IconData> {
    let tree = usvg::Tree::from_data(data, &usvg::Options::default()).ok()?;
    let size = tree.size();
    let longest = size.width().max(size.height());
    if edge == 0 || longest <= 0.0 {
        return None;
    }
    // Uniform scale keeps the aspect ratio of non-square drawings.
    let scale = edge as f32 / longest;
    let mut pixmap = tiny_skia::Pixmap::new(edge, edge)?;
    resvg::render(
        &tree,
        tiny_skia::Transform::from_scale(scale, scale),
        &mut pixmap.as_mut(),
    );
    Some(egui::IconData {
        rgba: pixmap.take(),
        width: edge,
        height: edge,
    })
}
