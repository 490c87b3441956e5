use egui::{Color32, FontFamily, FontId, Rounding, Stroke, Style, TextStyle, Visuals};

use crate::roster::TaskColor;

/// Font family for filled Phosphor icons
pub fn phosphor_fill_family() -> FontFamily {
    FontFamily::Name("phosphor-fill".into())
}

pub fn setup_fonts(ctx: &egui::Context) {
    let mut fonts = egui::FontDefinitions::default();

    // Phosphor Regular icons as fallback in Proportional family
    egui_phosphor::add_to_fonts(&mut fonts, egui_phosphor::Variant::Regular);

    // Phosphor Fill as a separate family, with the default text font as fallback
    fonts.font_data.insert(
        "phosphor-fill".into(),
        egui_phosphor::Variant::Fill.font_data(),
    );
    let mut fill_family = vec!["phosphor-fill".to_owned()];
    if let Some(proportional) = fonts.families.get(&FontFamily::Proportional) {
        fill_family.extend(proportional.iter().cloned());
    }
    fonts.families.insert(phosphor_fill_family(), fill_family);

    ctx.set_fonts(fonts);
}

pub fn setup_theme(ctx: &egui::Context) {
    let mut style = Style::default();

    // Light visuals, close to the web dashboard
    let mut visuals = Visuals::light();

    let bg = Color32::from_rgb(250, 250, 249);
    visuals.panel_fill = bg;
    visuals.window_fill = Color32::WHITE;
    visuals.faint_bg_color = Color32::from_rgb(243, 244, 246);
    visuals.extreme_bg_color = Color32::WHITE;

    visuals.widgets.noninteractive.bg_fill = Color32::from_rgb(241, 241, 239);
    visuals.widgets.noninteractive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(60, 60, 58));

    visuals.widgets.inactive.bg_fill = Color32::from_rgb(229, 231, 235);
    visuals.widgets.inactive.fg_stroke = Stroke::new(1.0, Color32::from_rgb(40, 40, 38));

    visuals.widgets.hovered.bg_fill = Color32::from_rgb(209, 213, 219);
    visuals.widgets.hovered.fg_stroke = Stroke::new(1.0, Color32::BLACK);

    // Accent color for active/pressed buttons
    let accent = accent();
    visuals.widgets.active.bg_fill = accent;
    visuals.widgets.active.fg_stroke = Stroke::new(1.0, Color32::WHITE);

    visuals.selection.bg_fill = accent.gamma_multiply(0.25);
    visuals.selection.stroke = Stroke::new(1.0, accent);
    visuals.hyperlink_color = accent;

    visuals.widgets.noninteractive.rounding = Rounding::same(6.0);
    visuals.widgets.inactive.rounding = Rounding::same(6.0);
    visuals.widgets.hovered.rounding = Rounding::same(6.0);
    visuals.widgets.active.rounding = Rounding::same(6.0);
    visuals.window_rounding = Rounding::same(8.0);

    style.visuals = visuals;

    style.text_styles = [
        (TextStyle::Small, FontId::new(12.0, FontFamily::Proportional)),
        (TextStyle::Body, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Button, FontId::new(14.0, FontFamily::Proportional)),
        (TextStyle::Heading, FontId::new(18.0, FontFamily::Proportional)),
        (TextStyle::Monospace, FontId::new(14.0, FontFamily::Monospace)),
    ]
    .into();

    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(14.0, 8.0);
    style.spacing.window_margin = egui::Margin::same(20.0);

    ctx.set_style(style);
}

pub fn accent() -> Color32 {
    Color32::from_rgb(37, 99, 235)
}

/// Returns (fill, accent stripe) for a task box
pub fn task_colors(color: TaskColor) -> (Color32, Color32) {
    match color {
        TaskColor::Red => (Color32::from_rgb(254, 226, 226), Color32::from_rgb(220, 38, 38)),
        TaskColor::Green => (Color32::from_rgb(220, 252, 231), Color32::from_rgb(22, 163, 74)),
        TaskColor::Blue => (Color32::from_rgb(219, 234, 254), Color32::from_rgb(37, 99, 235)),
    }
}

/// Returns (hour line, quarter line, lane separator) colors for the board grid
pub fn grid_colors() -> (Color32, Color32, Color32) {
    (
        Color32::from_rgb(229, 231, 235),
        Color32::from_rgb(243, 244, 246),
        Color32::from_rgb(209, 213, 219),
    )
}

pub fn now_line_color() -> Color32 {
    Color32::from_rgb(234, 56, 76)
}

/// Returns (content_bg, frame_color) for dialogs
pub fn dialog_colors() -> (Color32, Color32) {
    (
        Color32::WHITE,
        Color32::from_rgb(209, 213, 219),
    )
}

pub fn error_color() -> Color32 {
    Color32::from_rgb(220, 38, 38)
}

pub fn muted_text() -> Color32 {
    Color32::from_rgb(107, 114, 128)
}
