use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::Error;

/// A trait that must be implemented to define a migration.
///
/// The `name` must be unique among all migrations registered on a
/// [`Migrator`](crate::Migrator). Names double as the execution order key: migrations
/// are applied in ascending lexicographic order of name and unapplied in descending
/// order, so prefix them with a sortable timestamp (`20240101120000_create_users`).
///
/// All three methods must be pure accessors; drivers may call them any number of times.
pub trait Migration {
    /// Returns the unique name of this migration.
    ///
    /// # IMPORTANT WARNING
    ///
    /// **Once a migration has been applied to any database, its name must NEVER be changed.**
    /// The name is what the tracking table records. Renaming an applied migration makes it
    /// look pending again, and leaves the old name behind as an orphan record.
    fn name(&self) -> &str;

    /// SQL applied when migrating forward. May contain several statements.
    fn up_script(&self) -> &str;

    /// SQL that reverses [`up_script`](Migration::up_script). An empty script is recorded
    /// as unapplied without running anything.
    fn down_script(&self) -> &str;
}

impl std::fmt::Debug for dyn Migration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migration")
            .field("name", &self.name())
            .finish()
    }
}

impl PartialEq for dyn Migration {
    fn eq(&self, other: &Self) -> bool {
        self.name() == other.name()
    }
}

/// An owned migration built from SQL strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlMigration {
    name: String,
    up: String,
    down: String,
}

impl SqlMigration {
    pub fn new(name: impl Into<String>, up: impl Into<String>, down: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            up: up.into(),
            down: down.into(),
        }
    }
}

impl Migration for SqlMigration {
    fn name(&self) -> &str {
        &self.name
    }

    fn up_script(&self) -> &str {
        &self.up
    }

    fn down_script(&self) -> &str {
        &self.down
    }
}

/// A row of the tracking table: a migration the database reports as applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedMigration {
    pub name: String,
    pub executed_at: DateTime<Utc>,
}

impl ExecutedMigration {
    pub fn new(name: impl Into<String>, executed_at: DateTime<Utc>) -> Self {
        Self {
            name: name.into(),
            executed_at,
        }
    }
}

/// Parse an `executed_at` value read back as text.
///
/// Rows written by sqlshift carry RFC 3339 timestamps; rows filled by the column's
/// `DEFAULT CURRENT_TIMESTAMP` come back as `YYYY-MM-DD HH:MM:SS`, interpreted as UTC.
#[cfg_attr(
    not(any(feature = "sqlite", feature = "mysql", feature = "postgres")),
    allow(dead_code)
)]
pub(crate) fn parse_executed_at(raw: &str) -> Result<DateTime<Utc>, Error> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(naive.and_utc());
        }
    }
    // postgres text output of timestamptz: `2024-01-01 12:00:00.123+00`
    if let Ok(parsed) = DateTime::parse_from_str(&format!("{raw}00"), "%Y-%m-%d %H:%M:%S%.f%z") {
        return Ok(parsed.with_timezone(&Utc));
    }
    Err(Error::Generic(format!(
        "Failed to parse executed_at timestamp '{}'",
        raw
    )))
}
