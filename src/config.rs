use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

use crate::core::MatchingOptions;

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub storage: StorageSettings,
    #[serde(default)]
    pub hospitals: HospitalSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Directory holding one JSON file per collection
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> String { "data".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct HospitalSettings {
    #[serde(default = "default_hospitals_path")]
    pub path: String,
}

impl Default for HospitalSettings {
    fn default() -> Self {
        Self {
            path: default_hospitals_path(),
        }
    }
}

fn default_hospitals_path() -> String { "config/hospitals.toml".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_true")]
    pub broaden_emergency: bool,
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            broaden_emergency: default_true(),
        }
    }
}

impl From<&MatchingSettings> for MatchingOptions {
    fn from(settings: &MatchingSettings) -> Self {
        MatchingOptions {
            broaden_emergency: settings.broaden_emergency,
        }
    }
}

fn default_true() -> bool { true }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with BLOODLINK)
    pub fn load() -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., BLOODLINK__STORAGE__DATA_DIR -> storage.data_dir
            .add_source(
                Environment::with_prefix("BLOODLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("BLOODLINK")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.storage.data_dir, "data");
        assert_eq!(settings.hospitals.path, "config/hospitals.toml");
        assert!(settings.matching.broaden_emergency);
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "compact");
    }

    #[test]
    fn test_load_from_partial_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[matching]\nbroaden_emergency = false\n\n[storage]\ndata_dir = \"/tmp/blood\"").unwrap();

        let settings = Settings::load_from(file.path()).unwrap();
        assert!(!settings.matching.broaden_emergency);
        assert_eq!(settings.storage.data_dir, "/tmp/blood");
        assert_eq!(settings.logging.level, "info");
    }

    #[test]
    fn test_matching_options_from_settings() {
        let options = MatchingOptions::from(&MatchingSettings { broaden_emergency: false });
        assert!(!options.broaden_emergency);
    }
}
