use std::path::PathBuf;

use crate::domain::{AppConfig, DomainError};

/// Port for persisting configuration and resolving the directories the core writes to.
pub trait ConfigStore: Send + Sync {
    /// Load configuration, writing the defaults first if none exists.
    fn load(&self) -> Result<AppConfig, DomainError>;

    fn save(&self, config: &AppConfig) -> Result<(), DomainError>;

    fn config_path(&self) -> PathBuf;

    /// Directory the model is materialized into.
    fn data_dir(&self) -> PathBuf;

    fn logs_dir(&self) -> PathBuf;

    /// Directory for transient staged audio copies.
    fn staging_dir(&self) -> PathBuf {
        self.data_dir().join("staging")
    }
}
