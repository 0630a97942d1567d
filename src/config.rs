use crate::error::ConfigError;
use crate::model::{SeriesColor, TimeAxis};
use crate::stats::LatestPolicy;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const CONFIG_PATH: &str = "price_chart.json";

/// Ten fixed series colors, cycled by series position.
pub const DEFAULT_PALETTE: [SeriesColor; 10] = [
    SeriesColor([0x4E, 0x79, 0xA7]),
    SeriesColor([0xF2, 0x8E, 0x2B]),
    SeriesColor([0xE1, 0x57, 0x59]),
    SeriesColor([0x76, 0xB7, 0xB2]),
    SeriesColor([0x59, 0xA1, 0x4F]),
    SeriesColor([0xED, 0xC9, 0x48]),
    SeriesColor([0xB0, 0x7A, 0xA1]),
    SeriesColor([0xFF, 0x9D, 0xA7]),
    SeriesColor([0x9C, 0x75, 0x5F]),
    SeriesColor([0xBA, 0xB0, 0xAC]),
];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// File path or http(s) URL of the price log.
    pub source: String,
    pub delimiter: char,
    pub latest_policy: LatestPolicy,
    pub time_axis: TimeAxis,
    pub value_axis_label: String,
    /// `#RRGGBB` strings.
    pub palette: Vec<String>,
    pub window_size: [f32; 2],
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            source: "price_data.csv".to_string(),
            delimiter: ',',
            latest_policy: LatestPolicy::default(),
            time_axis: TimeAxis::default(),
            value_axis_label: "Price".to_string(),
            palette: DEFAULT_PALETTE.iter().map(|c| c.to_hex()).collect(),
            window_size: [1400.0, 900.0],
        }
    }
}

impl AppConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(serde_json::from_str(&data)?)
    }

    /// Reads `path` if it exists. A missing file means defaults; a broken
    /// one is logged and also falls back to defaults.
    pub fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            log::info!("no {} found, using default settings", path.display());
            return Self::default();
        }
        match Self::from_file(path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("{}, using default settings", e);
                Self::default()
            }
        }
    }

    /// Parsed palette. Bad entries are dropped; an empty result means the default palette.
    pub fn series_palette(&self) -> Vec<SeriesColor> {
        let colors: Vec<SeriesColor> = self
            .palette
            .iter()
            .filter_map(|hex| {
                let color = SeriesColor::from_hex(hex);
                if color.is_none() {
                    log::warn!("ignoring palette entry '{}'", hex);
                }
                color
            })
            .collect();

        if colors.is_empty() {
            DEFAULT_PALETTE.to_vec()
        } else {
            colors
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TimeUnit;
    use std::io::Write;

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"source": "prices.csv", "time_axis": {{"unit": "hour", "step": 6, "label_format": "%H:%M"}}}}"#
        )
        .unwrap();

        let config = AppConfig::from_file(file.path()).unwrap();
        assert_eq!(config.source, "prices.csv");
        assert_eq!(config.time_axis.unit, TimeUnit::Hour);
        assert_eq!(config.time_axis.step, 6);
        assert_eq!(config.delimiter, ',');
        assert_eq!(config.latest_policy, LatestPolicy::FilterFirst);
    }

    #[test]
    fn policy_is_snake_case() {
        let config: AppConfig =
            serde_json::from_str(r#"{"latest_policy": "aggregate_then_filter"}"#).unwrap();
        assert_eq!(config.latest_policy, LatestPolicy::AggregateThenFilter);
    }

    #[test]
    fn broken_or_missing_file_falls_back() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(AppConfig::load_or_default(&dir.path().join("none.json")), AppConfig::default());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(AppConfig::from_file(file.path()), Err(ConfigError::Parse(_))));
        assert_eq!(AppConfig::load_or_default(file.path()), AppConfig::default());
    }

    #[test]
    fn palette_drops_bad_entries() {
        let config = AppConfig {
            palette: vec!["#000000".into(), "nope".into(), "ff0000".into()],
            ..AppConfig::default()
        };
        assert_eq!(
            config.series_palette(),
            vec![SeriesColor([0, 0, 0]), SeriesColor([255, 0, 0])]
        );

        let empty = AppConfig {
            palette: vec![],
            ..AppConfig::default()
        };
        assert_eq!(empty.series_palette(), DEFAULT_PALETTE.to_vec());
    }
}
