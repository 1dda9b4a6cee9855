use directories::ProjectDirs;
use std::path::PathBuf;

/// Centralized application directory resolution
pub struct AppDirs;

impl AppDirs {
    fn project() -> Option<ProjectDirs> {
        ProjectDirs::from("", "", "driftdeck")
    }

    pub fn config_path() -> PathBuf {
        Self::project()
            .map(|pd| pd.config_dir().join("config.json"))
            .unwrap_or_else(|| PathBuf::from("driftdeck_config.json"))
    }

    /// `$HOME/.local/state/driftdeck` when HOME is set, else the platform data dir.
    pub fn log_path() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home)
                .join(".local")
                .join("state")
                .join("driftdeck")
                .join("driftdeck.log")
        } else {
            Self::project()
                .map(|pd| pd.data_local_dir().join("driftdeck.log"))
                .unwrap_or_else(|| PathBuf::from("driftdeck.log"))
        }
    }
}
