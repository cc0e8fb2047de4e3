//! Testing utilities for migration development and verification for SQLite.
//!
//! This module provides a harness for writing migration tests: running migrations
//! forward and back, seeding and querying data, schema assertions and reversibility checks.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use tempfile::TempDir;

use crate::sqlite::SqliteDriver;
use crate::{Config, Context, Error, Migration, MigrationList, Migrator, DEFAULT_MIGRATION_TABLE_NAME};

/// A test harness for SQLite migrations backed by a throwaway database file.
///
/// The migrator and the harness's own connection share the file, so data written
/// with [`execute`](Self::execute) is visible to migrations and vice versa.
///
/// # Example
///
/// ```
/// # #[cfg(not(feature = "testing"))]
/// # fn main() {}
/// # #[cfg(feature = "testing")]
/// # fn main() -> Result<(), sqlshift::Error> {
/// use std::sync::Arc;
/// use sqlshift::testing::sqlite::SqliteTestHarness;
/// use sqlshift::{Migration, SqlMigration};
///
/// let mut harness = SqliteTestHarness::new(vec![Arc::new(SqlMigration::new(
///     "001_create_users",
///     "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
///     "DROP TABLE users",
/// )) as Arc<dyn Migration>])?;
///
/// harness.migrate()?;
/// harness.execute("INSERT INTO users VALUES (1, 'alice')")?;
/// harness.assert_table_exists("users")?;
///
/// let name: String = harness.query_one("SELECT name FROM users WHERE id = 1")?;
/// assert_eq!(name, "alice");
/// # Ok(())
/// # }
/// ```
pub struct SqliteTestHarness {
    conn: Connection,
    migrator: Migrator,
    ctx: Context,
    path: PathBuf,
    // Dropped last so the file outlives both connections
    _dir: TempDir,
}

/// Represents a captured database schema for comparison and snapshotting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaSnapshot {
    /// Table name to definition, excluding the tracking table
    pub tables: BTreeMap<String, TableSchema>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSchema {
    pub columns: Vec<ColumnInfo>,
    pub indexes: Vec<IndexInfo>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexInfo {
    pub name: String,
    pub unique: bool,
    pub sql: String,
}

fn failure(message: String) -> Error {
    Error::Generic(message)
}

impl SqliteTestHarness {
    /// Create a harness over a fresh temporary database with `migrations` registered.
    ///
    /// Pass the same migrations your application registers: as the list grows,
    /// assertions about earlier migrations SHOULD NOT CHANGE.
    pub fn new(migrations: Vec<Arc<dyn Migration>>) -> Result<Self, Error> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("test.sqlite3");

        let mut migrator = Migrator::new(Config::new(SqliteDriver::open(&path)?))?;
        migrator.register(migrations)?;
        let conn = Connection::open(&path)?;

        Ok(Self {
            conn,
            migrator,
            ctx: Context::background(),
            path,
            _dir: dir,
        })
    }

    /// Path of the temporary database file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn migrator(&mut self) -> &mut Migrator {
        &mut self.migrator
    }

    /// Get a reference to the underlying connection for advanced usage.
    pub fn connection(&mut self) -> &mut Connection {
        &mut self.conn
    }

    /// Apply every pending migration.
    pub fn migrate(&mut self) -> Result<(), Error> {
        self.migrator.migrate(&self.ctx)
    }

    /// Unapply the last `steps` executed migrations.
    pub fn rollback(&mut self, steps: usize) -> Result<(), Error> {
        self.migrator.rollback(&self.ctx, steps)
    }

    pub fn reset(&mut self) -> Result<(), Error> {
        self.migrator.reset(&self.ctx)
    }

    pub fn list(&mut self) -> Result<MigrationList, Error> {
        self.migrator.list(&self.ctx)
    }

    /// Names of executed migrations, ascending.
    pub fn executed(&mut self) -> Result<Vec<String>, Error> {
        Ok(self
            .list()?
            .executed()
            .map(|entry| entry.name().to_string())
            .collect())
    }

    /// Execute SQL (for setting up test data). May contain several statements.
    pub fn execute(&mut self, sql: &str) -> Result<(), Error> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }

    /// Query a single value from the database.
    pub fn query_one<T>(&mut self, sql: &str) -> Result<T, Error>
    where
        T: rusqlite::types::FromSql,
    {
        Ok(self.conn.query_row(sql, [], |row| row.get(0))?)
    }

    /// Query all values from a single-column result.
    pub fn query_all<T>(&mut self, sql: &str) -> Result<Vec<T>, Error>
    where
        T: rusqlite::types::FromSql,
    {
        self.query_map(sql, |row| row.get(0))
    }

    /// Query with a custom row mapper.
    pub fn query_map<T, F>(&mut self, sql: &str, f: F) -> Result<Vec<T>, Error>
    where
        F: FnMut(&Row) -> rusqlite::Result<T>,
    {
        let mut stmt = self.conn.prepare(sql)?;
        let results = stmt.query_map([], f)?.collect::<Result<Vec<T>, _>>()?;
        Ok(results)
    }

    fn count_schema_objects(&self, kind: &str, name: &str) -> Result<i64, Error> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type = ?1 AND name = ?2",
            [kind, name],
            |row| row.get(0),
        )?)
    }

    pub fn assert_table_exists(&mut self, table_name: &str) -> Result<(), Error> {
        if self.count_schema_objects("table", table_name)? == 0 {
            return Err(failure(format!("Table '{}' does not exist", table_name)));
        }
        Ok(())
    }

    pub fn assert_table_not_exists(&mut self, table_name: &str) -> Result<(), Error> {
        if self.count_schema_objects("table", table_name)? > 0 {
            return Err(failure(format!(
                "Table '{}' exists but should not",
                table_name
            )));
        }
        Ok(())
    }

    pub fn assert_column_exists(
        &mut self,
        table_name: &str,
        column_name: &str,
    ) -> Result<(), Error> {
        let columns = self.get_columns(table_name)?;
        if !columns.iter().any(|c| c.name == column_name) {
            return Err(failure(format!(
                "Column '{}' does not exist in table '{}'",
                column_name, table_name
            )));
        }
        Ok(())
    }

    pub fn assert_index_exists(&mut self, index_name: &str) -> Result<(), Error> {
        if self.count_schema_objects("index", index_name)? == 0 {
            return Err(failure(format!("Index '{}' does not exist", index_name)));
        }
        Ok(())
    }

    /// Capture the current schema, excluding SQLite internals and the tracking table.
    pub fn capture_schema(&mut self) -> Result<SchemaSnapshot, Error> {
        let table_names: Vec<String> = self
            .conn
            .prepare(
                "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' AND name != ?1",
            )?
            .query_map([DEFAULT_MIGRATION_TABLE_NAME], |row| row.get(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut tables = BTreeMap::new();
        for table_name in table_names {
            let columns = self.get_columns(&table_name)?;
            let indexes = self.get_indexes(&table_name)?;
            tables.insert(table_name, TableSchema { columns, indexes });
        }

        Ok(SchemaSnapshot { tables })
    }

    /// Assert that the current schema matches a previously captured snapshot.
    pub fn assert_schema_matches(&mut self, expected: &SchemaSnapshot) -> Result<(), Error> {
        let actual = self.capture_schema()?;
        if actual == *expected {
            return Ok(());
        }

        let mut differences = Vec::new();
        for table_name in expected.tables.keys() {
            if !actual.tables.contains_key(table_name) {
                differences.push(format!("  - Table '{}' is missing", table_name));
            }
        }
        for table_name in actual.tables.keys() {
            if !expected.tables.contains_key(table_name) {
                differences.push(format!("  - Unexpected table '{}' found", table_name));
            }
        }
        for (table_name, expected_table) in &expected.tables {
            let Some(actual_table) = actual.tables.get(table_name) else {
                continue;
            };
            if expected_table.columns != actual_table.columns {
                differences.push(format!(
                    "  - Table '{}' columns differ:\n    Expected: {:?}\n    Actual:   {:?}",
                    table_name, expected_table.columns, actual_table.columns
                ));
            }
            if expected_table.indexes != actual_table.indexes {
                let names = |t: &TableSchema| t.indexes.iter().map(|i| i.name.clone()).collect::<Vec<_>>();
                differences.push(format!(
                    "  - Table '{}' index mismatch:\n    Expected indexes: {:?}\n    Actual indexes:   {:?}",
                    table_name,
                    names(expected_table),
                    names(actual_table)
                ));
            }
        }

        Err(failure(format!(
            "Schema mismatch detected:\n{}",
            differences.join("\n")
        )))
    }

    /// Apply every pending migration, roll exactly those back, and assert the
    /// schema is back where it started.
    ///
    /// Fails without touching the database when a pending migration sorts before one
    /// that is already executed, since rolling back by count would then undo the
    /// wrong migrations.
    pub fn assert_reversible(&mut self) -> Result<(), Error> {
        let pending = self.migrator.pending(&self.ctx)?;
        let Some(lowest_pending) = pending.first().map(|m| m.name().to_string()) else {
            return Ok(());
        };

        let executed_before = self.executed()?;
        if let Some(latest) = executed_before.last() {
            if *latest > lowest_pending {
                return Err(failure(format!(
                    "Cannot check reversibility: pending migration '{}' sorts before executed migration '{}'",
                    lowest_pending, latest
                )));
            }
        }

        let before = self.capture_schema()?;
        self.migrate()?;
        self.rollback(pending.len())?;

        let executed_after = self.executed()?;
        if executed_after != executed_before {
            return Err(failure(format!(
                "Rollback did not restore executed migrations:\n    Expected: {:?}\n    Actual:   {:?}",
                executed_before, executed_after
            )));
        }
        self.assert_schema_matches(&before)
    }

    fn get_columns(&self, table_name: &str) -> Result<Vec<ColumnInfo>, Error> {
        let mut stmt = self.conn.prepare(&format!(
            "PRAGMA table_info(\"{}\")",
            table_name.replace('"', "\"\"")
        ))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    type_name: row.get(2)?,
                    not_null: row.get::<_, i32>(3)? != 0,
                    default_value: row.get(4)?,
                    primary_key: row.get::<_, i32>(5)? != 0,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(columns)
    }

    fn get_indexes(&self, table_name: &str) -> Result<Vec<IndexInfo>, Error> {
        // Automatic indexes have no SQL and are implied by the columns
        let mut stmt = self.conn.prepare(
            "SELECT name, sql FROM sqlite_master WHERE type = 'index' AND tbl_name = ?1 AND sql IS NOT NULL ORDER BY name",
        )?;
        let indexes = stmt
            .query_map([table_name], |row| {
                let sql: String = row.get(1)?;
                Ok(IndexInfo {
                    name: row.get(0)?,
                    unique: sql.to_uppercase().contains("UNIQUE"),
                    sql,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(indexes)
    }
}
