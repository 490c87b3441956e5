use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::layout::{LayoutWindow, DEFAULT_DURATION_MINUTES, MINUTES_PER_DAY};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum ClockFormat {
    #[default]
    Hour12,      // "2:30 PM"
    Hour24,      // "14:30"
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_backend_origin")]
    pub backend_origin: String,
    /// Host of the client registry; separate from the attendance backend
    #[serde(default = "default_tasks_service_origin")]
    pub tasks_service_origin: String,
    #[serde(default)]
    pub email: String,
    #[serde(default = "default_font_scale")]
    pub font_scale: f32,
    #[serde(default)]
    pub clock_format: ClockFormat,
    #[serde(default = "default_window_start_hour")]
    pub window_start_hour: u8,
    #[serde(default = "default_window_end_hour")]
    pub window_end_hour: u8,
    #[serde(default = "default_hour_height")]
    pub hour_height: f32,
    #[serde(default = "default_duration_minutes")]
    pub default_duration_minutes: u32,
    #[serde(default = "default_min_box_height")]
    pub min_box_height: f32,
    #[serde(default = "default_slot_minutes")]
    pub slot_minutes: u32,
}

fn default_backend_origin() -> String {
    "http://attendance-service.5d-dev.com".to_string()
}

fn default_tasks_service_origin() -> String {
    "http://tasks-service.5d-dev.com".to_string()
}

fn default_font_scale() -> f32 {
    1.0
}

fn default_window_start_hour() -> u8 {
    10  // 10am
}

fn default_window_end_hour() -> u8 {
    19  // 7pm
}

fn default_hour_height() -> f32 {
    96.0
}

fn default_duration_minutes() -> u32 {
    DEFAULT_DURATION_MINUTES
}

fn default_min_box_height() -> f32 {
    40.0
}

fn default_slot_minutes() -> u32 {
    20
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend_origin: default_backend_origin(),
            tasks_service_origin: default_tasks_service_origin(),
            email: String::new(),
            font_scale: default_font_scale(),
            clock_format: ClockFormat::default(),
            window_start_hour: default_window_start_hour(),
            window_end_hour: default_window_end_hour(),
            hour_height: default_hour_height(),
            default_duration_minutes: default_duration_minutes(),
            min_box_height: default_min_box_height(),
            slot_minutes: default_slot_minutes(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = fs::read_to_string(path)
                .context("Failed to read config file")?;
            serde_json::from_str(&contents)
                .context("Failed to parse config file")
        } else {
            Ok(Config::default())
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let proj_dirs = project_dirs()?;
        Ok(proj_dirs.config_dir().join("config.json"))
    }

    /// Backend origin without trailing slashes, with a scheme
    pub fn origin(&self) -> String {
        normalize_origin(&self.backend_origin)
    }

    pub fn base_url(&self) -> String {
        api_url(&self.origin())
    }

    pub fn tasks_base_url(&self) -> String {
        api_url(&normalize_origin(&self.tasks_service_origin))
    }

    /// Fallback task length, kept within one day
    pub fn default_duration_minutes(&self) -> u32 {
        self.default_duration_minutes.clamp(1, MINUTES_PER_DAY)
    }

    /// Form slot length, kept within one day
    pub fn slot_minutes(&self) -> u32 {
        self.slot_minutes.clamp(1, MINUTES_PER_DAY)
    }

    /// Visible window, repaired if the hours are out of order
    pub fn layout_window(&self) -> LayoutWindow {
        let start = self.window_start_hour.min(23) as u32;
        let end = (self.window_end_hour as u32).clamp(start + 1, 24);
        LayoutWindow::from_hours(start, end)
    }

    pub fn pixels_per_minute(&self) -> f32 {
        self.hour_height.max(1.0) / 60.0
    }
}

fn normalize_origin(raw: &str) -> String {
    let origin = raw.trim().trim_end_matches('/');
    if origin.starts_with("http://") || origin.starts_with("https://") {
        origin.to_string()
    } else {
        format!("http://{}", origin)
    }
}

fn api_url(origin: &str) -> String {
    let origin = origin.strip_suffix("/api").unwrap_or(origin);
    format!("{}/api", origin)
}

pub fn project_dirs() -> Result<ProjectDirs> {
    ProjectDirs::from("com", "shiftboard", "shiftboard")
        .context("Could not determine config directory")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_board() {
        let config = Config::default();
        assert_eq!(config.layout_window(), LayoutWindow { start: 600, end: 1140 });
        assert!((config.pixels_per_minute() - 1.6).abs() < 1e-6);
        assert_eq!(config.slot_minutes, 20);
        assert_eq!(config.default_duration_minutes, 60);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let config: Config = serde_json::from_str(r#"{"email": "hr@example.com"}"#).unwrap();
        assert_eq!(config.email, "hr@example.com");
        assert_eq!(config.window_end_hour, 19);
        assert_eq!(config.clock_format, ClockFormat::Hour12);
    }

    #[test]
    fn base_url_normalisation() {
        let mut config = Config::default();
        config.backend_origin = "attendance.example.com/".to_string();
        assert_eq!(config.base_url(), "http://attendance.example.com/api");

        config.backend_origin = "https://attendance.example.com/api".to_string();
        assert_eq!(config.base_url(), "https://attendance.example.com/api");

        config.tasks_service_origin = "tasks.example.com/api/".to_string();
        assert_eq!(config.tasks_base_url(), "http://tasks.example.com/api");
    }

    #[test]
    fn durations_from_disk_are_bounded() {
        let config: Config = serde_json::from_str(
            r#"{"default_duration_minutes": 4294967295, "slot_minutes": 0}"#,
        )
        .unwrap();
        assert_eq!(config.default_duration_minutes(), MINUTES_PER_DAY);
        assert_eq!(config.slot_minutes(), 1);
        assert_eq!(Config::default().default_duration_minutes(), 60);
    }

    #[test]
    fn inverted_window_is_repaired() {
        let mut config = Config::default();
        config.window_start_hour = 18;
        config.window_end_hour = 9;
        assert_eq!(config.layout_window(), LayoutWindow { start: 1080, end: 1140 });
    }

    #[test]
    fn round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let mut config = Config::default();
        config.email = "ops@example.com".to_string();
        config.clock_format = ClockFormat::Hour24;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.email, "ops@example.com");
        assert_eq!(loaded.clock_format, ClockFormat::Hour24);

        let missing = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(missing.email, "");
    }
}
