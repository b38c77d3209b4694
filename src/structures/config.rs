use std::{fs::File, io::BufReader, path::Path};

use log::info;
use serde::Deserialize;

use super::dashboard::StripMode;
use super::errors::BoardError;

pub const DEFAULT_REFRESH_SECONDS: u64 = 300;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Base URL of the monitoring API.
    #[serde(default)]
    pub api_url: Option<String>,
    #[serde(default)]
    pub strip: StripMode,
    /// Page auto-refresh interval, 0 disables it.
    #[serde(default = "default_refresh_seconds")]
    pub refresh_seconds: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: None,
            strip: StripMode::default(),
            refresh_seconds: DEFAULT_REFRESH_SECONDS,
        }
    }
}

fn default_refresh_seconds() -> u64 {
    DEFAULT_REFRESH_SECONDS
}

/// Resolved runtime settings shared with the handlers.
#[derive(Debug, Clone)]
pub struct Settings {
    pub api_url: String,
    pub strip: StripMode,
    pub refresh_seconds: u64,
}

impl Config {
    /// Reads `path`. A missing file is only accepted when the API URL comes
    /// from the command line.
    pub fn load(path: &str, api_url_override: Option<&str>) -> Result<Self, BoardError> {
        if !Path::new(path).exists() && api_url_override.is_some() {
            info!("No config at {}, using defaults", path);
            return Ok(Self::default());
        }
        info!("Reading config from {}", path);
        Ok(serde_yaml::from_reader(BufReader::new(File::open(path)?))?)
    }

    pub fn into_settings(self, api_url_override: Option<&str>) -> Result<Settings, BoardError> {
        let api_url = api_url_override
            .map(str::to_string)
            .or(self.api_url)
            .map(|url| url.trim().trim_end_matches('/').to_string())
            .filter(|url| !url.is_empty())
            .ok_or_else(|| BoardError::Config("api_url is not set".to_string()))?;
        Ok(Settings {
            api_url,
            strip: self.strip,
            refresh_seconds: self.refresh_seconds,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_full_config() {
        let config: Config = serde_yaml::from_str(
            "api_url: https://monitor.example/\nstrip: monthly\nrefresh_seconds: 60\n",
        )
        .unwrap();
        let settings = config.into_settings(None).unwrap();
        assert_eq!(settings.api_url, "https://monitor.example");
        assert_eq!(settings.strip, StripMode::Monthly);
        assert_eq!(settings.refresh_seconds, 60);
    }

    #[test]
    fn defaults_apply() {
        let config: Config = serde_yaml::from_str("api_url: https://monitor.example\n").unwrap();
        assert_eq!(config.strip, StripMode::Recent);
        assert_eq!(config.refresh_seconds, DEFAULT_REFRESH_SECONDS);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(serde_yaml::from_str::<Config>("sites: []\n").is_err());
    }

    #[test]
    fn override_wins_and_missing_url_fails() {
        let config: Config = serde_yaml::from_str("api_url: https://a.example\n").unwrap();
        let settings = config.into_settings(Some("https://b.example//")).unwrap();
        assert_eq!(settings.api_url, "https://b.example");

        assert!(matches!(
            Config::default().into_settings(None),
            Err(BoardError::Config(_))
        ));
    }

    #[test]
    fn missing_file_needs_override() {
        let path = "/nonexistent/uptimeboard.yaml";
        assert!(Config::load(path, None).is_err());
        assert!(Config::load(path, Some("https://a.example")).is_ok());
    }
}
