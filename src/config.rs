//! Configuration Module
//! Loads run settings from YAML (or JSON) with built-in defaults.

use crate::charts::PlotStyle;
use crate::data::{CleanOptions, MissingPolicy};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Cannot read config {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Run settings. Every key is optional in the file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub default_species: Option<String>,
    pub default_country: Option<String>,
    pub start_year: Option<i32>,
    pub end_year: Option<i32>,
    pub missing_value_markers: Vec<String>,
    pub flag_prefix: String,
    pub missing_policy: MissingPolicy,
    pub plot_style: PlotStyle,
}

impl Default for Config {
    fn default() -> Self {
        let clean = CleanOptions::default();
        Self {
            data_dir: PathBuf::from("data"),
            output_dir: PathBuf::from("output"),
            default_species: None,
            default_country: None,
            start_year: None,
            end_year: None,
            missing_value_markers: clean.missing_markers,
            flag_prefix: clean.flag_prefix,
            missing_policy: clean.missing_policy,
            plot_style: PlotStyle::default(),
        }
    }
}

impl Config {
    /// Load a config file; a missing file yields the defaults.
    ///
    /// `.json` files are parsed as JSON, everything else as YAML.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            warn!("Config {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("json"))
            .unwrap_or(false);

        let config: Config = if is_json {
            serde_json::from_str(&text).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        } else if text.trim().is_empty() {
            Self::default()
        } else {
            serde_yaml::from_str(&text).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        };

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn clean_options(&self) -> CleanOptions {
        CleanOptions {
            flag_prefix: self.flag_prefix.clone(),
            missing_markers: self.missing_value_markers.clone(),
            missing_policy: self.missing_policy,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.missing_value_markers, vec![".", "", "NA"]);
        assert_eq!(config.flag_prefix, "S");
        assert_eq!(config.output_dir, PathBuf::from("output"));
    }

    #[test]
    fn test_partial_yaml_overrides() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "default_species: FCY\nstart_year: 1990\nmissing_value_markers: ['.', '-']\nmissing_policy: 'null'\nplot_style:\n  line_color: '#336699'\n  grid: false\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.default_species.as_deref(), Some("FCY"));
        assert_eq!(config.start_year, Some(1990));
        assert_eq!(config.end_year, None);
        assert_eq!(config.missing_value_markers, vec![".", "-"]);
        assert_eq!(config.missing_policy, MissingPolicy::Null);
        assert_eq!(config.plot_style.line_color, "#336699");
        assert!(!config.plot_style.grid);
        assert_eq!(config.plot_style.marker, "o");
        assert_eq!(config.plot_style.figure_size, [1000, 600]);
    }

    #[test]
    fn test_json_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"end_year": 2010, "plot_style": {"figure_size": [800, 400]}}"#).unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.end_year, Some(2010));
        assert_eq!(config.plot_style.figure_size, [800, 400]);
    }

    #[test]
    fn test_malformed_yaml_is_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "start_year: [not a year\n").unwrap();
        assert!(matches!(Config::load(&path), Err(ConfigError::Yaml { .. })));
    }

    #[test]
    fn test_clean_options_follow_config() {
        let config = Config {
            flag_prefix: "F".to_string(),
            missing_policy: MissingPolicy::Null,
            ..Config::default()
        };
        let opts = config.clean_options();
        assert_eq!(opts.flag_prefix, "F");
        assert_eq!(opts.missing_policy, MissingPolicy::Null);
    }
}
