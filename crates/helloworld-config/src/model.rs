use std::path::PathBuf;

use helloworld_common::{Error, Result};
use serde::{Deserialize, Serialize};

/// Name used for the data directory and the database file when nothing else
/// is configured.
pub const DEFAULT_APP_NAME: &str = "helloworldapp";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub gateway: GatewayConfig,
    pub database: DatabaseConfig,
    /// Fallback filter directive when `RUST_LOG` is unset, e.g. `debug`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8081,
            request_timeout_secs: 15,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub app_name: String,
    /// Explicit database file. When unset the file lives at
    /// `<home>/<app_name>/<app_name>.db`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Refuse to start the gateway when a migration step fails. When false the
    /// failure is logged and the server starts against whatever schema exists.
    pub abort_on_migration_failure: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            app_name: DEFAULT_APP_NAME.to_string(),
            path: None,
            abort_on_migration_failure: true,
        }
    }
}

impl DatabaseConfig {
    /// Directory holding the database file and, by default, the config file.
    pub fn data_dir(&self) -> Result<PathBuf> {
        if let Some(parent) = self.path.as_ref().and_then(|p| p.parent()) {
            return Ok(parent.to_path_buf());
        }
        app_dir(&self.app_name)
    }

    pub fn resolve_path(&self) -> Result<PathBuf> {
        match &self.path {
            Some(path) => Ok(path.clone()),
            None => Ok(app_dir(&self.app_name)?.join(format!("{}.db", self.app_name))),
        }
    }
}

/// `<home>/<app_name>`
pub fn app_dir(app_name: &str) -> Result<PathBuf> {
    dirs::home_dir()
        .map(|home| home.join(app_name))
        .ok_or_else(|| Error::Config("could not determine home directory".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_original_listener() {
        let config = AppConfig::default();
        assert_eq!(config.gateway.host, "127.0.0.1");
        assert_eq!(config.gateway.port, 8081);
        assert_eq!(config.gateway.request_timeout_secs, 15);
        assert_eq!(config.database.app_name, DEFAULT_APP_NAME);
        assert!(config.database.abort_on_migration_failure);
    }

    #[test]
    fn explicit_path_wins_over_app_name() {
        let db = DatabaseConfig {
            path: Some(PathBuf::from("/tmp/custom/app.db")),
            ..Default::default()
        };
        assert_eq!(db.resolve_path().unwrap(), PathBuf::from("/tmp/custom/app.db"));
        assert_eq!(db.data_dir().unwrap(), PathBuf::from("/tmp/custom"));
    }

    #[test]
    fn default_path_nests_file_under_app_dir() {
        let db = DatabaseConfig::default();
        let Ok(path) = db.resolve_path() else {
            // No home directory in this environment.
            return;
        };
        assert!(path.ends_with("helloworldapp/helloworldapp.db"));
    }
}
