pub mod database;
pub mod error;
pub mod executor;
pub mod migrations;
pub mod migrator;
pub mod script;
pub mod version;

pub use database::{Database, GreetingRecord};
pub use error::{MigrationError, TransactionAction};
pub use executor::execute_statement;
pub use migrations::{EmbeddedScripts, MIGRATION_STEPS, MigrationStep, ScriptSource};
pub use migrator::{FailurePolicy, MigrationReport, Migrator};
pub use script::{run_script, split_statements};
pub use version::{SchemaVersion, current_version};
