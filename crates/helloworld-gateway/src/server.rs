use std::future::Future;
use std::sync::Arc;

use axum::ServiceExt;
use axum::extract::Request;
use helloworld_common::Result;
use helloworld_config::{AppConfig, DatabaseConfig};
use helloworld_db::{Database, FailurePolicy, MigrationReport, Migrator};
use tokio::net::TcpListener;
use tower::Layer;
use tower_http::normalize_path::NormalizePathLayer;
use tracing::{error, info, warn};

use crate::router::build_router;
use crate::state::AppState;

/// Bring `database` up to the newest schema using the configured failure
/// policy.
///
/// With `abort_on_migration_failure` the first failing step is returned as an
/// error; otherwise it is logged and the report records it.
pub fn migrate_database(database: &Database, config: &DatabaseConfig) -> Result<MigrationReport> {
    let policy = if config.abort_on_migration_failure {
        FailurePolicy::Abort
    } else {
        FailurePolicy::Continue
    };
    let migrator = Migrator::embedded().with_failure_policy(policy);

    match database.migrate(&migrator) {
        Ok(report) => {
            if let Some(failure) = &report.failure {
                warn!("starting with an incomplete schema: {failure}");
            }
            Ok(report)
        }
        Err(e) => {
            error!("database migration failed: {e}");
            Err(e)
        }
    }
}

/// The HTTP server. Opens and migrates the database, then binds and serves.
pub struct GatewayServer {
    config: AppConfig,
    database: Option<Arc<Database>>,
}

impl GatewayServer {
    pub fn new(config: AppConfig) -> Self {
        Self {
            config,
            database: None,
        }
    }

    /// Use an already opened database instead of the configured file.
    pub fn with_database(mut self, database: Arc<Database>) -> Self {
        self.database = Some(database);
        self
    }

    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    pub async fn run_until<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let database = match self.database {
            Some(db) => db,
            None => Arc::new(Database::open(&self.config.database.resolve_path()?)?),
        };

        // Migrations finish before the listener exists.
        let report = migrate_database(&database, &self.config.database)?;
        info!("current database version: {}", report.final_version);

        let addr = format!("{}:{}", self.config.gateway.host, self.config.gateway.port);
        let state = Arc::new(AppState::new(self.config, database, report));
        let app = NormalizePathLayer::trim_trailing_slash().layer(build_router(state));

        let listener = TcpListener::bind(&addr).await?;
        info!("helloworld gateway listening on {}", addr);

        axum::serve(listener, ServiceExt::<Request>::into_make_service(app))
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| helloworld_common::Error::Gateway(format!("server error: {e}")))?;

        info!("gateway stopped");
        Ok(())
    }
}
