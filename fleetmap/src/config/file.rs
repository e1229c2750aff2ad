//! The INI-backed configuration file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use tracing::warn;

use super::{config_directory, config_file_path, ConfigError, ConfigKey};
use crate::export::DEFAULT_EXPORT_FILE;
use crate::geo::{LatLon, Viewport};
use crate::logging::{LoggingConfig, DEFAULT_LOG_FILE, DEFAULT_LOG_LEVEL};
use crate::selection::{
    MarkerHitBox, SelectionMode, DEFAULT_MARKER_HEIGHT, DEFAULT_MARKER_OFFSET_Y,
    DEFAULT_MARKER_WIDTH,
};
use crate::session::{SessionConfig, DEFAULT_POLL_INTERVAL_MS};
use crate::source::{DEFAULT_BASE_URL, DEFAULT_POSITIONS_PATH, DEFAULT_TIMEOUT_SECS};

/// `[source]`: where positions are fetched from.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub url: String,
    pub path: String,
    pub timeout_secs: u64,
}

/// `[poll]`: refresh cadence.
#[derive(Debug, Clone, PartialEq)]
pub struct PollSettings {
    pub interval_ms: u64,
    pub start_visible: bool,
}

/// `[export]`: GeoJSON export of each fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportSettings {
    pub enabled: bool,
    pub path: PathBuf,
}

/// `[map]`: initial snapshot and camera.
#[derive(Debug, Clone, PartialEq)]
pub struct MapSettings {
    pub asset: Option<PathBuf>,
    pub center_lat: f64,
    pub center_lon: f64,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

/// `[selection]`: tap behaviour and marker geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionSettings {
    pub mode: SelectionMode,
    pub marker_width: f64,
    pub marker_height: f64,
    pub marker_offset_x: f64,
    pub marker_offset_y: f64,
}

/// `[logging]`: log file location and level.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
    pub level: String,
}

/// All settings, with defaults for anything the file leaves out.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigFile {
    pub source: SourceSettings,
    pub poll: PollSettings,
    pub export: ExportSettings,
    pub map: MapSettings,
    pub selection: SelectionSettings,
    pub logging: LoggingSettings,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let viewport = Viewport::default();
        let dir = config_directory();

        Self {
            source: SourceSettings {
                url: DEFAULT_BASE_URL.to_string(),
                path: DEFAULT_POSITIONS_PATH.to_string(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            poll: PollSettings {
                interval_ms: DEFAULT_POLL_INTERVAL_MS,
                start_visible: true,
            },
            export: ExportSettings {
                enabled: true,
                path: dir.join(DEFAULT_EXPORT_FILE),
            },
            map: MapSettings {
                asset: None,
                center_lat: viewport.center.lat,
                center_lon: viewport.center.lon,
                zoom: viewport.zoom,
                width: viewport.width,
                height: viewport.height,
            },
            selection: SelectionSettings {
                mode: SelectionMode::default(),
                marker_width: DEFAULT_MARKER_WIDTH,
                marker_height: DEFAULT_MARKER_HEIGHT,
                marker_offset_x: 0.0,
                marker_offset_y: DEFAULT_MARKER_OFFSET_Y,
            },
            logging: LoggingSettings {
                directory: dir,
                file: DEFAULT_LOG_FILE.to_string(),
                level: DEFAULT_LOG_LEVEL.to_string(),
            },
        }
    }
}

impl ConfigFile {
    /// Load from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from the default location, using defaults if the file is absent.
    ///
    /// Unreadable or invalid files are still reported.
    pub fn load_or_default() -> Result<Self, ConfigError> {
        match Self::load() {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let ini = Ini::load_from_file(path).map_err(|e| match e {
            ini::Error::Io(source) => ConfigError::Io {
                path: path.to_path_buf(),
                source,
            },
            ini::Error::Parse(parse) => ConfigError::Parse {
                path: path.to_path_buf(),
                message: parse.to_string(),
            },
        })?;

        Self::from_ini(&ini)
    }

    /// Apply every known key found in `ini` on top of the defaults.
    pub fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        for (section, properties) in ini.iter() {
            let Some(section) = section else { continue };
            for (key, value) in properties.iter() {
                match ConfigKey::lookup(section, key) {
                    Some(config_key) => config_key.set(&mut config, value)?,
                    None => warn!(section, key, "Ignoring unknown configuration key"),
                }
            }
        }

        Ok(config)
    }

    /// Render as INI. Unset optional keys are omitted.
    pub fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            let value = key.get(self);
            if !value.is_empty() {
                ini.with_section(Some(key.section()))
                    .set(key.key_name(), value);
            }
        }
        ini
    }

    /// Save to the default location, creating the directory if needed.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        self.to_ini()
            .write_to_file(path)
            .map_err(|source| ConfigError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    /// Validated initial camera.
    pub fn viewport(&self) -> Result<Viewport, ConfigError> {
        Ok(Viewport::new(
            LatLon::new(self.map.center_lat, self.map.center_lon),
            self.map.zoom,
            self.map.width,
            self.map.height,
        )?)
    }

    pub fn hit_box(&self) -> MarkerHitBox {
        MarkerHitBox::new(self.selection.marker_width, self.selection.marker_height)
            .with_offset(self.selection.marker_offset_x, self.selection.marker_offset_y)
    }

    /// Session settings derived from `[poll]`, `[map]` and `[selection]`.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        let mut session = SessionConfig::new()
            .with_poll_interval(Duration::from_millis(self.poll.interval_ms))
            .with_start_visible(self.poll.start_visible)
            .with_viewport(self.viewport()?)
            .with_selection_mode(self.selection.mode)
            .with_hit_box(self.hit_box());

        if let Some(asset) = &self.map.asset {
            session = session.with_snapshot_path(asset);
        }
        Ok(session)
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::new(&self.logging.directory)
            .with_file_name(&self.logging.file)
            .with_level(&self.logging.level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let result = ConfigFile::load_from(&dir.path().join("config.ini"));
        assert!(matches!(result, Err(ConfigError::NotFound(_))));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let ini = Ini::load_from_str(
            "[source]\nurl = https://fleet.example.com/api/\n\n[poll]\ninterval_ms = 5000\n",
        )
        .unwrap();

        let config = ConfigFile::from_ini(&ini).unwrap();
        assert_eq!(config.source.url, "https://fleet.example.com/api/");
        assert_eq!(config.source.path, DEFAULT_POSITIONS_PATH);
        assert_eq!(config.poll.interval_ms, 5000);
        assert!(config.poll.start_visible);
    }

    #[test]
    fn test_invalid_value_is_reported() {
        let ini = Ini::load_from_str("[poll]\ninterval_ms = soon\n").unwrap();
        let result = ConfigFile::from_ini(&ini);
        assert!(matches!(result, Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let ini = Ini::load_from_str("[poll]\ncolour = blue\n[extra]\nx = 1\n").unwrap();
        assert_eq!(ConfigFile::from_ini(&ini).unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_save_then_load_preserves_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.selection.mode = SelectionMode::Single;
        config.map.asset = Some(PathBuf::from("/srv/trucks.geojson"));
        config.export.enabled = false;
        config.save_to(&path).unwrap();

        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_session_config_carries_settings() {
        let mut config = ConfigFile::default();
        config.poll.interval_ms = 100;
        config.poll.start_visible = false;
        config.map.asset = Some(PathBuf::from("seed.geojson"));

        let session = config.session_config().unwrap();
        assert_eq!(session.poll_interval, Duration::from_millis(500));
        assert!(!session.start_visible);
        assert_eq!(session.snapshot_path, Some(PathBuf::from("seed.geojson")));
    }

    #[test]
    fn test_bad_camera_is_rejected() {
        let mut config = ConfigFile::default();
        config.map.width = 0.0;
        assert!(matches!(config.viewport(), Err(ConfigError::Geo(_))));
    }
}
