use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    pub fn config_path() -> PathBuf {
        if let Some(pd) = ProjectDirs::from("", "", "handmate") {
            pd.config_dir().join("config.json")
        } else {
            PathBuf::from("handmate_config.json")
        }
    }

    pub fn state_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("handmate")
        } else if let Some(pd) = ProjectDirs::from("", "", "handmate") {
            pd.data_local_dir().to_path_buf()
        } else {
            PathBuf::from(".")
        }
    }

    pub fn log_path() -> PathBuf {
        Self::state_dir().join("handmate.log")
    }

    pub fn dataset_dir() -> PathBuf {
        Self::state_dir().join("datasets")
    }
}
