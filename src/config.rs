use std::path::Path;

use serde::Deserialize;

use crate::{Error, stopwatch::StopwatchOptions};

/// Stopwatch settings as read from a TOML file.
///
/// ```toml
/// target_ms = 90000
/// tick_interval_ms = 100
/// almost_done_threshold_ms = 15000
/// ```
///
/// Unknown keys are rejected so that a misspelt option does not silently
/// fall back to its default.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Countdown length; absent or 0 runs as a stopwatch.
    pub target_ms: Option<u64>,
    pub options: StopwatchOptions,
}

#[derive(Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    target_ms: Option<u64>,
    tick_interval_ms: u64,
    almost_done_threshold_ms: u64,
}

impl Default for ConfigFile {
    fn default() -> Self {
        let options = StopwatchOptions::default();
        Self {
            target_ms: None,
            tick_interval_ms: options.tick_interval_ms,
            almost_done_threshold_ms: options.almost_done_threshold_ms,
        }
    }
}

impl From<ConfigFile> for Config {
    fn from(file: ConfigFile) -> Self {
        Self {
            target_ms: file.target_ms,
            options: StopwatchOptions {
                tick_interval_ms: file.tick_interval_ms,
                almost_done_threshold_ms: file.almost_done_threshold_ms,
            },
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|source| Error::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text).map_err(|source| Error::ParseConfig {
            path: path.to_path_buf(),
            source,
        })
    }

    fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str::<ConfigFile>(text).map(Config::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_uses_defaults() {
        let config = Config::parse("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.target_ms, None);
        assert_eq!(config.options, StopwatchOptions::default());
    }

    #[test]
    fn reads_all_keys() {
        let config = Config::parse(
            "target_ms = 90000\ntick_interval_ms = 100\nalmost_done_threshold_ms = 15000\n",
        )
        .unwrap();
        assert_eq!(config.target_ms, Some(90_000));
        assert_eq!(config.options.tick_interval_ms, 100);
        assert_eq!(config.options.almost_done_threshold_ms, 15_000);
    }

    #[test]
    fn partial_options_keep_other_defaults() {
        let config = Config::parse("tick_interval_ms = 250").unwrap();
        assert_eq!(config.options.tick_interval_ms, 250);
        assert_eq!(config.options.almost_done_threshold_ms, 10_000);
    }

    #[test]
    fn negative_values_fail_to_parse() {
        assert!(Config::parse("tick_interval_ms = -5").is_err());
    }

    #[test]
    fn misspelt_key_is_rejected() {
        let err = Config::parse("tick_interval = 100").unwrap_err();
        assert!(err.to_string().contains("tick_interval"));
    }

    #[test]
    fn missing_file_reports_path() {
        let path = Path::new("/nonexistent/tickwatch.toml");
        let err = Config::load(path).unwrap_err();
        assert!(matches!(err, Error::ReadConfig { .. }));
        assert!(err.to_string().contains("/nonexistent/tickwatch.toml"));
    }
}
