mod banner;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use helloworld_config::{AppConfig, ConfigLoader, DEFAULT_APP_NAME};
use helloworld_db::Database;
use helloworld_gateway::{GatewayServer, migrate_database};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "helloworld", version, about = "Hello world HTTP service")]
struct Cli {
    /// Config file (yml, yaml or toml). Defaults to ~/helloworldapp/config.yml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Database file, overriding the configured location.
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Migrate the database and serve HTTP (default).
    Start {
        #[arg(long, env = "HELLOWORLD_HOST")]
        host: Option<String>,
        #[arg(short, long, env = "HELLOWORLD_PORT")]
        port: Option<u16>,
        /// Start even if a migration step fails.
        #[arg(long)]
        allow_degraded: bool,
    },
    /// Apply pending migrations and exit.
    Migrate,
    /// Print the current schema version as JSON.
    Status,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    };
    init_tracing(&config, cli.log_json);

    if let Err(e) = run(cli, config).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => ConfigLoader::load_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfigLoader::for_app(DEFAULT_APP_NAME)
            .and_then(|loader| loader.load())
            .context("failed to load configuration")?,
    };

    if let Some(db) = &cli.db {
        config.database.path = Some(db.clone());
    }
    Ok(config)
}

fn init_tracing(config: &AppConfig, json: bool) {
    let default_directive = config
        .log_level
        .clone()
        .unwrap_or_else(|| "helloworld=info,tower_http=info".to_string());
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run(cli: Cli, mut config: AppConfig) -> Result<()> {
    match cli.command.unwrap_or(Command::Start {
        host: None,
        port: None,
        allow_degraded: false,
    }) {
        Command::Start {
            host,
            port,
            allow_degraded,
        } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }
            if allow_degraded {
                config.database.abort_on_migration_failure = false;
            }

            let database = open_database(&config)?;
            banner::print_banner(&config, &database);

            GatewayServer::new(config)
                .with_database(database)
                .run_until(shutdown_signal())
                .await
                .context("gateway failed")?;
        }
        Command::Migrate => {
            let database = open_database(&config)?;
            let report = migrate_database(&database, &config.database)
                .context("migration failed")?;
            if report.applied.is_empty() {
                println!("database already at version {}", report.final_version);
            } else {
                println!(
                    "applied {} -> database at version {}",
                    report.applied.join(", "),
                    report.final_version
                );
            }
        }
        Command::Status => {
            let database = open_database(&config)?;
            let version = database
                .schema_version()
                .context("failed to read schema version")?;
            let status = serde_json::json!({
                "database": database.path().map(|p| p.display().to_string()),
                "schema_version": version,
                "initialized": version.is_initialized(),
            });
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
    }
    Ok(())
}

fn open_database(config: &AppConfig) -> Result<Arc<Database>> {
    let path = config.database.resolve_path()?;
    let database =
        Database::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    info!("using database {}", path.display());
    Ok(Arc::new(database))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("unable to install ctrl+c handler: {err}");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};

        match signal(SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                error!("unable to install sigterm handler: {err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
