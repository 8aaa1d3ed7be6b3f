use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

use crate::app_dirs::AppDirs;
use crate::classifier::ClassifierConfig;
use crate::error::ConfigError;
use crate::status::Locale;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub classifier: ClassifierConfig,
    pub cooldown_ms: u64,
    pub recording_window_ms: u64,
    pub locale: Locale,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            classifier: ClassifierConfig::default(),
            cooldown_ms: 500,
            recording_window_ms: 3000,
            locale: Locale::English,
        }
    }
}

impl Config {
    pub fn cooldown(&self) -> Duration {
        Duration::from_millis(self.cooldown_ms)
    }

    pub fn recording_window(&self) -> Duration {
        Duration::from_millis(self.recording_window_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.classifier.validate()?;
        if self.cooldown_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "cooldown_ms",
                message: "must be greater than zero".into(),
            });
        }
        if self.recording_window_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "recording_window_ms",
                message: "must be greater than zero".into(),
            });
        }
        Ok(())
    }
}

pub trait ConfigStore {
    fn load(&self) -> Config;
    fn save(&self, cfg: &Config) -> Result<(), ConfigError>;
}

#[derive(Debug, Clone)]
pub struct FileConfigStore {
    path: PathBuf,
}

impl FileConfigStore {
    pub fn new() -> Self {
        Self {
            path: AppDirs::config_path(),
        }
    }

    pub fn with_path<P: AsRef<Path>>(p: P) -> Self {
        Self {
            path: p.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Default for FileConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore for FileConfigStore {
    fn load(&self) -> Config {
        let Ok(bytes) = fs::read(&self.path) else {
            return Config::default();
        };
        match serde_json::from_slice::<Config>(&bytes) {
            Ok(cfg) => cfg,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "ignoring unreadable config");
                Config::default()
            }
        }
    }

    fn save(&self, cfg: &Config) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_vec_pretty(cfg)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}
