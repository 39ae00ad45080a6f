use std::sync::Arc;

use helloworld_config::AppConfig;
use helloworld_db::{Database, MigrationReport};

/// Shared application state accessible from all request handlers.
pub struct AppState {
    pub config: AppConfig,
    pub database: Arc<Database>,
    /// Outcome of the startup migration run.
    pub migration: MigrationReport,
}

impl AppState {
    pub fn new(config: AppConfig, database: Arc<Database>, migration: MigrationReport) -> Self {
        Self {
            config,
            database,
            migration,
        }
    }
}

pub type SharedState = Arc<AppState>;
