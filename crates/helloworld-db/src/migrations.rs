use std::borrow::Cow;
use std::collections::HashMap;

/// One schema change, identified by the version it records on success.
///
/// The script itself is responsible for inserting `version` into the
/// tracking table; the migrator only checks that it did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MigrationStep {
    pub version: i64,
    pub name: &'static str,
    /// Resource name looked up in the [`ScriptSource`].
    pub script: &'static str,
}

/// Built-in migration chain, in ascending version order.
///
/// When adding a migration, add the SQL file under `src/sql/`, register it in
/// [`EmbeddedScripts`] and append a step here.
pub const MIGRATION_STEPS: &[MigrationStep] = &[
    MigrationStep {
        version: 0,
        name: "init",
        script: "sql/init.sql",
    },
    MigrationStep {
        version: 1,
        name: "v1",
        script: "sql/v1.sql",
    },
];

/// Read-by-name access to migration scripts.
pub trait ScriptSource {
    fn script(&self, name: &str) -> Option<Cow<'_, str>>;
}

/// Scripts compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmbeddedScripts;

const EMBEDDED: &[(&str, &str)] = &[
    ("sql/init.sql", include_str!("sql/init.sql")),
    ("sql/v1.sql", include_str!("sql/v1.sql")),
];

impl ScriptSource for EmbeddedScripts {
    fn script(&self, name: &str) -> Option<Cow<'_, str>> {
        EMBEDDED
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, sql)| Cow::Borrowed(*sql))
    }
}

impl ScriptSource for HashMap<String, String> {
    fn script(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|sql| Cow::Borrowed(sql.as_str()))
    }
}
