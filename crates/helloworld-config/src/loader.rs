use std::path::{Path, PathBuf};

use helloworld_common::{Error, Result};
use tracing::{debug, info};

use crate::model::{AppConfig, app_dir};

const CANDIDATE_FILES: &[&str] = &["config.yml", "config.yaml", "config.toml"];

/// Locates and parses the service configuration.
///
/// A missing config file is not an error: the service runs on defaults.
pub struct ConfigLoader {
    config_dir: PathBuf,
}

impl ConfigLoader {
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Loader rooted at `<home>/<app_name>`.
    pub fn for_app(app_name: &str) -> Result<Self> {
        Ok(Self::new(app_dir(app_name)?))
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// First existing candidate file in the config directory, if any.
    pub fn find_config_file(&self) -> Option<PathBuf> {
        CANDIDATE_FILES
            .iter()
            .map(|name| self.config_dir.join(name))
            .find(|path| path.is_file())
    }

    pub fn load(&self) -> Result<AppConfig> {
        match self.find_config_file() {
            Some(path) => Self::load_file(&path),
            None => {
                debug!(
                    "no config file in {}, using defaults",
                    self.config_dir.display()
                );
                Ok(AppConfig::default())
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<AppConfig> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read {}: {e}", path.display())))?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        let config = match ext {
            "yml" | "yaml" => serde_yaml::from_str(&contents)
                .map_err(|e| Error::Config(format!("YAML parse error: {e}")))?,
            "toml" => toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("TOML parse error: {e}")))?,
            other => {
                return Err(Error::Config(format!(
                    "unsupported config extension: {other}"
                )));
            }
        };

        info!("config loaded from {}", path.display());
        Ok(config)
    }
}
