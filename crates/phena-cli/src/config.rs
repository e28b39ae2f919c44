//! User configuration for the `phena` binary
//!
//! Stored as JSON in `{config_dir}/phena/config.json`. A missing or invalid
//! file means defaults; command-line flags override whatever is loaded.

use anyhow::{Context, Result, bail};
use phena_preview::controls::{DEFAULT_REFRESH_RATE, DEFAULT_ROTATION_SPEED};
use phena_preview::csp::DEFAULT_CDN_ORIGIN;
use phena_preview::document::DEFAULT_P5_URL;
use phena_preview::{BuilderOptions, Preferences, TemplateSource};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings shared by every subcommand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Template file to use instead of the built-in page
    pub template: Option<PathBuf>,
    /// p5.js script URL
    pub p5_url: String,
    /// Origin allowed to serve scripts besides nonce-tagged ones
    pub cdn_origin: String,
    /// Origin of the preview page's own resources
    pub csp_source: String,
    /// Initial rotation speed in degrees per second
    pub rotation_speed: f64,
    /// Initial refresh rate in frames per second
    pub refresh_rate: f64,
    /// Watch-mode debounce in milliseconds
    pub debounce_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            template: None,
            p5_url: DEFAULT_P5_URL.to_string(),
            cdn_origin: DEFAULT_CDN_ORIGIN.to_string(),
            csp_source: "'self'".to_string(),
            rotation_speed: DEFAULT_ROTATION_SPEED,
            refresh_rate: DEFAULT_REFRESH_RATE,
            debounce_ms: 150,
        }
    }
}

impl Config {
    /// Builder options for the preview library
    pub fn builder_options(&self) -> BuilderOptions {
        BuilderOptions {
            template: self
                .template
                .clone()
                .map_or(TemplateSource::Embedded, TemplateSource::File),
            p5_url: self.p5_url.clone(),
            cdn_origin: self.cdn_origin.clone(),
            defaults: Preferences {
                rotation_speed: self.rotation_speed,
                refresh_rate: self.refresh_rate,
            }
            .sanitized(),
        }
    }
}

/// Default location of the config file
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("phena").join("config.json"))
}

/// Load the config, returning defaults if the file doesn't exist or is invalid
pub fn load_config(path: Option<&Path>) -> Config {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        return Config::default();
    };

    if !path.exists() {
        return Config::default();
    }

    match fs::read_to_string(&path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!("Ignoring invalid config {}: {}", path.display(), e);
            Config::default()
        }),
        Err(e) => {
            tracing::warn!("Failed to read config {}: {}", path.display(), e);
            Config::default()
        }
    }
}

/// Write the config to disk
pub fn save_config(config: &Config, path: Option<&Path>) -> Result<PathBuf> {
    let Some(path) = path.map(Path::to_path_buf).or_else(default_config_path) else {
        bail!("Could not determine config directory");
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    let json = serde_json::to_string_pretty(config).context("Failed to serialize config")?;
    fs::write(&path, json).context("Failed to write config file")?;
    Ok(path)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("phena_no_such_config.json");
        assert_eq!(load_config(Some(&path)), Config::default());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let path = std::env::temp_dir().join("phena_partial_config.json");
        fs::write(&path, r#"{ "refresh_rate": 60.0 }"#).unwrap();

        let config = load_config(Some(&path));
        assert!((config.refresh_rate - 60.0).abs() < f64::EPSILON);
        assert_eq!(config.p5_url, DEFAULT_P5_URL);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_invalid_file_gives_defaults() {
        let path = std::env::temp_dir().join("phena_invalid_config.json");
        fs::write(&path, "{ not json").unwrap();
        assert_eq!(load_config(Some(&path)), Config::default());
        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_save_then_load() {
        let path = std::env::temp_dir().join("phena_config_dir/config.json");
        let config = Config {
            template: Some(PathBuf::from("/opt/phena/page.html")),
            debounce_ms: 400,
            ..Config::default()
        };

        let written = save_config(&config, Some(&path)).unwrap();
        assert_eq!(written, path);
        assert_eq!(load_config(Some(&path)), config);

        fs::remove_file(&path).ok();
    }

    #[test]
    fn test_builder_options() {
        let config = Config {
            template: Some(PathBuf::from("page.html")),
            refresh_rate: 0.0,
            ..Config::default()
        };
        let options = config.builder_options();
        assert_eq!(
            options.template,
            TemplateSource::File(PathBuf::from("page.html"))
        );
        assert!((options.defaults.refresh_rate - DEFAULT_REFRESH_RATE).abs() < f64::EPSILON);
    }

    #[test]
    fn test_builder_options_replace_non_finite_values() {
        let config = Config {
            rotation_speed: f64::NAN,
            refresh_rate: f64::INFINITY,
            ..Config::default()
        };
        let defaults = config.builder_options().defaults;
        assert!((defaults.rotation_speed - DEFAULT_ROTATION_SPEED).abs() < f64::EPSILON);
        assert!((defaults.refresh_rate - DEFAULT_REFRESH_RATE).abs() < f64::EPSILON);
        assert!(!defaults.to_json().contains("null"));
    }
}
