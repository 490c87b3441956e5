mod app;
mod theme;
mod views;

pub use app::DashboardApp;
pub use theme::{setup_fonts, setup_theme};
