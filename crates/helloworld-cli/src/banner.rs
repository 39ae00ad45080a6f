use helloworld_config::AppConfig;
use helloworld_db::Database;

/// Print the startup banner with the listener address and database summary.
pub fn print_banner(config: &AppConfig, database: &Database) {
    let version = env!("CARGO_PKG_VERSION");

    let url = format!("http://{}:{}", config.gateway.host, config.gateway.port);

    let db_display = match (database.path(), std::env::var("HOME")) {
        (Some(path), Ok(home)) if !home.is_empty() => {
            path.to_string_lossy().replace(&home, "~")
        }
        (Some(path), _) => path.to_string_lossy().to_string(),
        (None, _) => ":memory:".to_string(),
    };

    // Read before migrating, so this is the version the process found.
    let schema = match database.schema_version() {
        Ok(v) if v.is_initialized() => format!("v{v}"),
        Ok(_) => "uninitialized".to_string(),
        Err(_) => "unreadable".to_string(),
    };

    let on_failure = if config.database.abort_on_migration_failure {
        "abort"
    } else {
        "continue"
    };

    let width = 64;
    let title = format!("helloworld v{version}");
    let title_dashes = width - 2 - title.len() - 5;
    let top = format!("╭─── {title} {}╮", "─".repeat(title_dashes));
    let bottom = format!("╰{}╯", "─".repeat(width - 2));

    let inner = width - 4;
    let row = |s: &str| format!("│ {:<inner$} │", s);

    println!("{top}");
    println!("{}", row(""));
    println!("{}", row(&format!("Listening   {url}")));
    println!("{}", row(&format!("Database    {db_display}")));
    println!("{}", row(&format!("Schema      {schema}")));
    println!("{}", row(&format!("On failure  {on_failure}")));
    println!("{}", row(""));
    println!("{}", row("Press Ctrl+C to stop"));
    println!("{bottom}");
}
