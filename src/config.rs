use crate::error::StoreError;
use crate::layout::GridMetrics;
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const SETTINGS_FILE: &str = "settings.json";
pub const APPS_FILE: &str = "apps.json";

/// Tuning knobs persisted as a flat JSON object. Any missing field, or a
/// missing file, falls back to the compiled-in default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub item_size: f32,
    pub spacing: f32,
    pub margin: f32,
    pub label_height: f32,
    /// Largest distance (px) between facing edges at which a neighbour becomes
    /// a magnet candidate. Kept below `spacing` so resting neighbours do not attract.
    pub magnet_threshold: f32,
    /// Dwell time before a magnet candidate locks.
    pub magnet_delay_ms: u64,
    /// Pointer travel (px) that turns a press into a drag.
    pub drag_threshold: f32,
    pub edge_dock: bool,
    pub edge_dock_delay_ms: u64,
    pub edge_dock_distance: f32,
    pub edge_dock_peek: f32,
    pub ball_size: f32,
    pub ball_pos: Option<(f32, f32)>,
    pub window_size: Option<(f32, f32)>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            item_size: 72.0,
            spacing: 16.0,
            margin: 12.0,
            label_height: 18.0,
            magnet_threshold: 12.0,
            magnet_delay_ms: 450,
            drag_threshold: 6.0,
            edge_dock: true,
            edge_dock_delay_ms: 1500,
            edge_dock_distance: 24.0,
            edge_dock_peek: 10.0,
            ball_size: 56.0,
            ball_pos: None,
            window_size: None,
        }
    }
}

impl Settings {
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "float_grid", "float_grid")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    pub fn metrics(&self) -> GridMetrics {
        let defaults = GridMetrics::default();
        GridMetrics {
            item_size: positive_or(self.item_size, defaults.item_size),
            spacing: non_negative_or(self.spacing, defaults.spacing),
            margin: non_negative_or(self.margin, defaults.margin),
            label_height: non_negative_or(self.label_height, defaults.label_height),
        }
    }

    pub fn magnet_delay(&self) -> Duration {
        Duration::from_millis(self.magnet_delay_ms)
    }

    pub fn edge_dock_delay(&self) -> Duration {
        Duration::from_millis(self.edge_dock_delay_ms)
    }

    pub fn load() -> Self {
        match Self::config_dir() {
            Some(dir) => Self::load_from(&dir.join(SETTINGS_FILE)),
            None => Self::default(),
        }
    }

    /// Reads settings from `path`; a missing or unreadable file means defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match read_json(path) {
            Ok(settings) => settings,
            Err(err) => {
                warn!("Failed to parse settings, using defaults: {err}");
                Self::default()
            }
        }
    }

    pub fn save(&self) {
        let Some(dir) = Self::config_dir() else {
            warn!("No config directory; settings not saved");
            return;
        };
        if let Err(err) = self.save_to(&dir.join(SETTINGS_FILE)) {
            warn!("Failed to save settings: {err}");
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<(), StoreError> {
        write_json(path, self)
    }
}

fn positive_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        fallback
    }
}

fn non_negative_or(value: f32, fallback: f32) -> f32 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        fallback
    }
}

pub(crate) fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, StoreError> {
    let file = std::fs::File::open(path).map_err(|source| StoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_reader(std::io::BufReader::new(file)).map_err(|source| StoreError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub(crate) fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), StoreError> {
    let io_err = |source: std::io::Error| StoreError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(io_err)?;
    }
    let file = std::fs::File::create(path).map_err(io_err)?;
    serde_json::to_writer_pretty(std::io::BufWriter::new(file), value).map_err(|source| {
        StoreError::Json {
            path: path.to_path_buf(),
            source,
        }
    })
}

#[cfg(test)]
pub(crate) fn temp_dir(tag: &str) -> PathBuf {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::{SystemTime, UNIX_EPOCH};

    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let uniq = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time error")
        .as_nanos();
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    let dir = std::env::temp_dir().join(format!(
        "float_grid_{tag}_{}_{uniq}_{n}",
        std::process::id()
    ));
    std::fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = temp_dir("settings_missing");
        let settings = Settings::load_from(&dir.join(SETTINGS_FILE));
        assert_eq!(settings, Settings::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = temp_dir("settings_partial");
        let path = dir.join(SETTINGS_FILE);
        std::fs::write(&path, r#"{"item_size": 64, "magnet_delay_ms": 300, "edge_dock": false}"#)
            .unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings.item_size, 64.0);
        assert_eq!(settings.magnet_delay(), Duration::from_millis(300));
        assert!(!settings.edge_dock);
        assert_eq!(settings.spacing, 16.0);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn malformed_file_gives_defaults() {
        let dir = temp_dir("settings_bad");
        let path = dir.join(SETTINGS_FILE);
        std::fs::write(&path, "{not json").unwrap();
        assert_eq!(Settings::load_from(&path), Settings::default());
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn save_then_load_keeps_values() {
        let dir = temp_dir("settings_save");
        let path = dir.join("nested").join(SETTINGS_FILE);
        let settings = Settings {
            ball_pos: Some((10.0, 20.0)),
            magnet_threshold: 30.0,
            ..Settings::default()
        };
        settings.save_to(&path).unwrap();
        assert_eq!(Settings::load_from(&path), settings);
        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn metrics_reject_nonsense_sizes() {
        let settings = Settings {
            item_size: -4.0,
            spacing: f32::NAN,
            ..Settings::default()
        };
        let m = settings.metrics();
        assert_eq!(m.item_size, 72.0);
        assert_eq!(m.spacing, 16.0);
    }
}
