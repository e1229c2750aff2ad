//! Addressable configuration keys.

use std::fmt::Display;
use std::path::PathBuf;
use std::str::FromStr;

use super::{ConfigError, ConfigFile};
use crate::geo::{MAX_LAT, MAX_LON, MAX_ZOOM, MIN_LAT, MIN_LON};

/// A single setting, addressed as `section.key`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    SourceUrl,
    SourcePath,
    SourceTimeoutSecs,
    PollIntervalMs,
    PollStartVisible,
    ExportEnabled,
    ExportPath,
    MapAsset,
    MapCenterLat,
    MapCenterLon,
    MapZoom,
    MapWidth,
    MapHeight,
    SelectionMode,
    SelectionMarkerWidth,
    SelectionMarkerHeight,
    SelectionMarkerOffsetX,
    SelectionMarkerOffsetY,
    LoggingDirectory,
    LoggingFile,
    LoggingLevel,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::SourceUrl,
    ConfigKey::SourcePath,
    ConfigKey::SourceTimeoutSecs,
    ConfigKey::PollIntervalMs,
    ConfigKey::PollStartVisible,
    ConfigKey::ExportEnabled,
    ConfigKey::ExportPath,
    ConfigKey::MapAsset,
    ConfigKey::MapCenterLat,
    ConfigKey::MapCenterLon,
    ConfigKey::MapZoom,
    ConfigKey::MapWidth,
    ConfigKey::MapHeight,
    ConfigKey::SelectionMode,
    ConfigKey::SelectionMarkerWidth,
    ConfigKey::SelectionMarkerHeight,
    ConfigKey::SelectionMarkerOffsetX,
    ConfigKey::SelectionMarkerOffsetY,
    ConfigKey::LoggingDirectory,
    ConfigKey::LoggingFile,
    ConfigKey::LoggingLevel,
];

impl ConfigKey {
    /// Every key, grouped by section in file order.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// Find the key for a `[section]` entry.
    pub fn lookup(section: &str, key: &str) -> Option<ConfigKey> {
        ALL_KEYS
            .iter()
            .copied()
            .find(|k| k.section() == section && k.key_name() == key)
    }

    pub fn section(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            SourceUrl | SourcePath | SourceTimeoutSecs => "source",
            PollIntervalMs | PollStartVisible => "poll",
            ExportEnabled | ExportPath => "export",
            MapAsset | MapCenterLat | MapCenterLon | MapZoom | MapWidth | MapHeight => "map",
            SelectionMode
            | SelectionMarkerWidth
            | SelectionMarkerHeight
            | SelectionMarkerOffsetX
            | SelectionMarkerOffsetY => "selection",
            LoggingDirectory | LoggingFile | LoggingLevel => "logging",
        }
    }

    pub fn key_name(&self) -> &'static str {
        use ConfigKey::*;
        match self {
            SourceUrl => "url",
            SourcePath => "path",
            SourceTimeoutSecs => "timeout_secs",
            PollIntervalMs => "interval_ms",
            PollStartVisible => "start_visible",
            ExportEnabled => "enabled",
            ExportPath => "path",
            MapAsset => "asset",
            MapCenterLat => "center_lat",
            MapCenterLon => "center_lon",
            MapZoom => "zoom",
            MapWidth => "width",
            MapHeight => "height",
            SelectionMode => "mode",
            SelectionMarkerWidth => "marker_width",
            SelectionMarkerHeight => "marker_height",
            SelectionMarkerOffsetX => "marker_offset_x",
            SelectionMarkerOffsetY => "marker_offset_y",
            LoggingDirectory => "directory",
            LoggingFile => "file",
            LoggingLevel => "level",
        }
    }

    /// Dotted name, e.g. `poll.interval_ms`.
    pub fn name(&self) -> String {
        format!("{}.{}", self.section(), self.key_name())
    }

    /// Current value as a string; empty when an optional value is unset.
    pub fn get(&self, config: &ConfigFile) -> String {
        use ConfigKey::*;
        match self {
            SourceUrl => config.source.url.clone(),
            SourcePath => config.source.path.clone(),
            SourceTimeoutSecs => config.source.timeout_secs.to_string(),
            PollIntervalMs => config.poll.interval_ms.to_string(),
            PollStartVisible => config.poll.start_visible.to_string(),
            ExportEnabled => config.export.enabled.to_string(),
            ExportPath => config.export.path.display().to_string(),
            MapAsset => config
                .map
                .asset
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default(),
            MapCenterLat => config.map.center_lat.to_string(),
            MapCenterLon => config.map.center_lon.to_string(),
            MapZoom => config.map.zoom.to_string(),
            MapWidth => config.map.width.to_string(),
            MapHeight => config.map.height.to_string(),
            SelectionMode => config.selection.mode.to_string(),
            SelectionMarkerWidth => config.selection.marker_width.to_string(),
            SelectionMarkerHeight => config.selection.marker_height.to_string(),
            SelectionMarkerOffsetX => config.selection.marker_offset_x.to_string(),
            SelectionMarkerOffsetY => config.selection.marker_offset_y.to_string(),
            LoggingDirectory => config.logging.directory.display().to_string(),
            LoggingFile => config.logging.file.clone(),
            LoggingLevel => config.logging.level.clone(),
        }
    }

    /// Validate `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        use ConfigKey::*;
        let value = value.trim();
        match self {
            SourceUrl => {
                if !(value.starts_with("http://") || value.starts_with("https://")) {
                    return Err(self.invalid(value, "must start with http:// or https://"));
                }
                config.source.url = value.to_string();
            }
            SourcePath => config.source.path = value.to_string(),
            SourceTimeoutSecs => {
                let secs: u64 = self.parse(value)?;
                if secs == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.source.timeout_secs = secs;
            }
            PollIntervalMs => config.poll.interval_ms = self.parse(value)?,
            PollStartVisible => config.poll.start_visible = self.parse_bool(value)?,
            ExportEnabled => config.export.enabled = self.parse_bool(value)?,
            ExportPath => config.export.path = self.non_empty(value).map(PathBuf::from)?,
            MapAsset => {
                config.map.asset = (!value.is_empty()).then(|| PathBuf::from(value));
            }
            MapCenterLat => config.map.center_lat = self.parse_in_range(value, MIN_LAT, MAX_LAT)?,
            MapCenterLon => config.map.center_lon = self.parse_in_range(value, MIN_LON, MAX_LON)?,
            MapZoom => config.map.zoom = self.parse_in_range(value, 0.0, MAX_ZOOM)?,
            MapWidth => config.map.width = self.parse_positive(value)?,
            MapHeight => config.map.height = self.parse_positive(value)?,
            SelectionMode => {
                config.selection.mode = value
                    .parse::<crate::selection::SelectionMode>()
                    .map_err(|reason| self.invalid(value, &reason))?;
            }
            SelectionMarkerWidth => config.selection.marker_width = self.parse_positive(value)?,
            SelectionMarkerHeight => config.selection.marker_height = self.parse_positive(value)?,
            SelectionMarkerOffsetX => config.selection.marker_offset_x = self.parse(value)?,
            SelectionMarkerOffsetY => config.selection.marker_offset_y = self.parse(value)?,
            LoggingDirectory => {
                config.logging.directory = self.non_empty(value).map(PathBuf::from)?;
            }
            LoggingFile => config.logging.file = self.non_empty(value)?.to_string(),
            LoggingLevel => config.logging.level = self.non_empty(value)?.to_string(),
        }
        Ok(())
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| self.invalid(value, &e.to_string()))
    }

    fn parse_bool(&self, value: &str) -> Result<bool, ConfigError> {
        match value.to_lowercase().as_str() {
            "true" | "yes" | "on" | "1" => Ok(true),
            "false" | "no" | "off" | "0" => Ok(false),
            _ => Err(self.invalid(value, "expected true or false")),
        }
    }

    fn parse_in_range(&self, value: &str, min: f64, max: f64) -> Result<f64, ConfigError> {
        let parsed: f64 = self.parse(value)?;
        if !parsed.is_finite() || parsed < min || parsed > max {
            return Err(self.invalid(value, &format!("must be between {} and {}", min, max)));
        }
        Ok(parsed)
    }

    fn parse_positive(&self, value: &str) -> Result<f64, ConfigError> {
        let parsed: f64 = self.parse(value)?;
        if !parsed.is_finite() || parsed <= 0.0 {
            return Err(self.invalid(value, "must be greater than 0"));
        }
        Ok(parsed)
    }

    fn non_empty<'a>(&self, value: &'a str) -> Result<&'a str, ConfigError> {
        if value.is_empty() {
            return Err(self.invalid(value, "must not be empty"));
        }
        Ok(value)
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    /// Parse a dotted `section.key` name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.split_once('.')
            .and_then(|(section, key)| ConfigKey::lookup(section, key))
            .ok_or_else(|| ConfigError::InvalidValue {
                key: "key".to_string(),
                value: s.to_string(),
                reason: "unknown configuration key".to_string(),
            })
    }
}
