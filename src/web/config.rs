use serde::Deserialize;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::classifier::{ClassifierError, MotionClassifier, ThresholdTable};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("classifier: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("sensors.motion_interval: {0}")]
    Interval(String),
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub web: WebConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub classifier: ThresholdTable,
    #[serde(default)]
    pub sensors: SensorsConfig,
    #[serde(default)]
    pub api_keys: Vec<ApiKey>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:8080".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    pub base_folder: PathBuf,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SensorsConfig {
    /// Humantime duration, e.g. `1s` or `500ms`.
    #[serde(default = "default_motion_interval")]
    pub motion_interval: String,
    #[serde(default = "default_true")]
    pub location_permission: bool,
    #[serde(default = "default_true")]
    pub motion_permission: bool,
}

impl Default for SensorsConfig {
    fn default() -> Self {
        Self {
            motion_interval: default_motion_interval(),
            location_permission: true,
            motion_permission: true,
        }
    }
}

impl SensorsConfig {
    pub fn motion_interval(&self) -> Result<Duration, ConfigError> {
        let interval = humantime::parse_duration(self.motion_interval.trim())
            .map_err(|e| ConfigError::Interval(e.to_string()))?;
        if interval.is_zero() {
            return Err(ConfigError::Interval("must be greater than zero".into()));
        }
        Ok(interval)
    }
}

fn default_motion_interval() -> String {
    "1s".to_string()
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiKey {
    pub key: String,
    pub name: String,
    pub permissions: HashSet<Permission>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    PushSamples,
    ControlSession,
    ReadRoutes,
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_str(&content)
    }

    pub fn from_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.classifier.validate()?;
        config.sensors.motion_interval()?;
        Ok(config)
    }

    pub fn classifier(&self) -> Result<MotionClassifier, ConfigError> {
        Ok(MotionClassifier::new(self.classifier)?)
    }

    pub fn find_api_key(&self, key: &str) -> Option<&ApiKey> {
        self.api_keys.iter().find(|k| k.key == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_uses_defaults() {
        let config = Config::from_str("storage:\n  base_folder: ./data\n").unwrap();
        assert_eq!(config.web.bind, "0.0.0.0:8080");
        assert_eq!(config.classifier, ThresholdTable::default());
        assert_eq!(
            config.sensors.motion_interval().unwrap(),
            Duration::from_secs(1)
        );
        assert!(config.sensors.location_permission);
        assert!(config.api_keys.is_empty());
    }

    #[test]
    fn full_config() {
        let yaml = r#"
web:
  bind: "127.0.0.1:9000"
storage:
  base_folder: /tmp/stride
classifier:
  speed: { walking: 0.8, running: 2.5, vehicle: 8.0 }
sensors:
  motion_interval: 500ms
  motion_permission: false
api_keys:
  - key: secret
    name: phone
    permissions: [push_samples, control_session]
"#;
        let config = Config::from_str(yaml).unwrap();
        assert_eq!(config.web.bind, "127.0.0.1:9000");
        assert_eq!(config.classifier.speed.walking, 0.8);
        assert_eq!(config.classifier.acceleration.running, 1.5);
        assert_eq!(
            config.sensors.motion_interval().unwrap(),
            Duration::from_millis(500)
        );
        assert!(!config.sensors.motion_permission);

        let key = config.find_api_key("secret").unwrap();
        assert!(key.permissions.contains(&Permission::PushSamples));
        assert!(!key.permissions.contains(&Permission::ReadRoutes));
        assert!(config.find_api_key("other").is_none());
    }

    #[test]
    fn rejects_bad_thresholds_and_intervals() {
        let yaml = r#"
storage: { base_folder: ./data }
classifier:
  speed: { walking: 3.0, running: 1.0, vehicle: 6.5 }
"#;
        assert!(matches!(
            Config::from_str(yaml),
            Err(ConfigError::Classifier(_))
        ));

        let yaml = "storage: { base_folder: ./data }\nsensors: { motion_interval: 0s }\n";
        assert!(matches!(
            Config::from_str(yaml),
            Err(ConfigError::Interval(_))
        ));
    }
}
