use rusqlite::Connection;
use serde::Serialize;
use tracing::{error, info, warn};

use crate::error::MigrationError;
use crate::migrations::{EmbeddedScripts, MIGRATION_STEPS, MigrationStep, ScriptSource};
use crate::script::run_script;
use crate::version::{SchemaVersion, current_version};

/// What to do when a migration step fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the error to the caller.
    #[default]
    Abort,
    /// Log the error and report it in [`MigrationReport::failure`].
    Continue,
}

/// Outcome of a [`Migrator::run`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub starting_version: SchemaVersion,
    pub final_version: SchemaVersion,
    /// Names of the steps applied during this run, in order.
    pub applied: Vec<&'static str>,
    /// Set only under [`FailurePolicy::Continue`].
    pub failure: Option<String>,
}

impl MigrationReport {
    pub fn is_up_to_date(&self) -> bool {
        self.failure.is_none()
    }
}

/// Brings a database up to the newest schema version.
///
/// Steps are applied in ascending order while the current version is below
/// each step's target. After every step the version is read back from the
/// database; a step that does not advance it stops the chain.
pub struct Migrator<S = EmbeddedScripts> {
    source: S,
    steps: Vec<MigrationStep>,
    policy: FailurePolicy,
}

impl Migrator<EmbeddedScripts> {
    pub fn embedded() -> Self {
        Self::new(EmbeddedScripts, MIGRATION_STEPS.to_vec())
    }
}

impl Default for Migrator<EmbeddedScripts> {
    fn default() -> Self {
        Self::embedded()
    }
}

impl<S: ScriptSource> Migrator<S> {
    pub fn new(source: S, mut steps: Vec<MigrationStep>) -> Self {
        steps.sort_by_key(|step| step.version);
        Self {
            source,
            steps,
            policy: FailurePolicy::default(),
        }
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn latest_version(&self) -> SchemaVersion {
        self.steps
            .last()
            .map(|step| SchemaVersion::new(step.version))
            .unwrap_or(SchemaVersion::UNINITIALIZED)
    }

    pub fn run(&self, conn: &Connection) -> Result<MigrationReport, MigrationError> {
        let mut report = MigrationReport {
            starting_version: SchemaVersion::UNINITIALIZED,
            final_version: SchemaVersion::UNINITIALIZED,
            applied: Vec::new(),
            failure: None,
        };

        if let Err(e) = self.apply_pending(conn, &mut report) {
            match self.policy {
                FailurePolicy::Abort => return Err(e),
                FailurePolicy::Continue => {
                    warn!("continuing with schema version {}: {e}", report.final_version);
                    report.failure = Some(e.to_string());
                }
            }
        }

        info!(
            "database at version {} ({} step(s) applied)",
            report.final_version,
            report.applied.len()
        );
        Ok(report)
    }

    fn apply_pending(
        &self,
        conn: &Connection,
        report: &mut MigrationReport,
    ) -> Result<(), MigrationError> {
        let starting_version = current_version(conn)?;
        info!("current database version: {starting_version}");
        report.starting_version = starting_version;
        report.final_version = starting_version;

        for step in &self.steps {
            let target = SchemaVersion::new(step.version);
            if report.final_version >= target {
                continue;
            }
            if !report.final_version.is_initialized() {
                info!("no \"version\" table");
            }

            let script = self
                .source
                .script(step.script)
                .ok_or_else(|| MigrationError::MissingScript(step.script.to_string()))?;
            let label = format!("{} (version {})", step.name, step.version);
            run_script(conn, &script, &label)?;

            let found = current_version(conn)?;
            report.final_version = found;
            if found < target {
                error!("step {} left the database at version {found}", step.name);
                return Err(MigrationError::NoProgress {
                    step: step.name.to_string(),
                    expected: step.version,
                    found: found.get(),
                });
            }
            report.applied.push(step.name);
        }
        Ok(())
    }
}
