//! SQLite driver built on [`rusqlite`](https://crates.io/crates/rusqlite).
//!
//! Each migration's script and its tracking row are written inside one transaction,
//! so a failing migration leaves neither its schema changes nor its record behind.
//! Earlier migrations of the same batch stay committed.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sqlshift::sqlite::SqliteDriver;
//! use sqlshift::{Config, Context, Migration, Migrator, SqlMigration};
//!
//! let driver = SqliteDriver::open_in_memory().unwrap();
//! let mut migrator = Migrator::new(Config::new(driver)).unwrap();
//! migrator
//!     .register(vec![Arc::new(SqlMigration::new(
//!         "20240101000000_create_users",
//!         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
//!         "DROP TABLE users",
//!     )) as Arc<dyn Migration>])
//!     .unwrap();
//!
//! let ctx = Context::background();
//! migrator.migrate(&ctx).unwrap();
//! let list = migrator.list(&ctx).unwrap();
//! assert!(list.entries()[0].is_executed);
//! ```

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use rusqlite::{params, Connection};

use crate::context::Context;
use crate::driver::{self, Driver, Hooks, DEFAULT_MIGRATION_TABLE_NAME};
use crate::error::Error;
use crate::migration::{parse_executed_at, ExecutedMigration, Migration};

// Re-export rusqlite types for callers constructing their own connections
pub use rusqlite::Connection as SqliteConnection;

#[derive(Debug)]
pub struct SqliteDriver {
    conn: Connection,
    migration_table_name: String,
}

impl SqliteDriver {
    /// Wrap an existing connection.
    pub fn new(conn: Connection) -> Self {
        Self {
            conn,
            migration_table_name: DEFAULT_MIGRATION_TABLE_NAME.to_string(),
        }
    }

    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, Error> {
        Ok(Self::new(Connection::open(path)?))
    }

    pub fn open_in_memory() -> Result<Self, Error> {
        Ok(Self::new(Connection::open_in_memory()?))
    }

    pub fn migration_table_name(&self) -> &str {
        &self.migration_table_name
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn into_connection(self) -> Connection {
        self.conn
    }

    fn apply_one(&mut self, migration: &dyn Migration) -> Result<(), Error> {
        let name = migration.name();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::apply(name, e.into()))?;

        let script = migration.up_script();
        if !script.trim().is_empty() {
            tx.execute_batch(script)
                .map_err(|e| Error::apply(name, e.into()))?;
        }

        tx.execute(
            &format!(
                "INSERT INTO {} (name, executed_at) VALUES (?1, ?2)",
                self.migration_table_name
            ),
            params![name, Utc::now().to_rfc3339()],
        )
        .map_err(|e| Error::record(name, e.into()))?;

        tx.commit().map_err(|e| Error::record(name, e.into()))
    }

    fn unapply_one(&mut self, migration: &dyn Migration) -> Result<(), Error> {
        let name = migration.name();
        let tx = self
            .conn
            .transaction()
            .map_err(|e| Error::unapply(name, e.into()))?;

        let script = migration.down_script();
        if !script.trim().is_empty() {
            tx.execute_batch(script)
                .map_err(|e| Error::unapply(name, e.into()))?;
        }

        tx.execute(
            &format!("DELETE FROM {} WHERE name = ?1", self.migration_table_name),
            params![name],
        )
        .map_err(|e| Error::remove_record(name, e.into()))?;

        tx.commit().map_err(|e| Error::remove_record(name, e.into()))
    }

    fn drop_user_tables(&mut self, ctx: &Context) -> Result<(), Error> {
        let tables = self
            .user_tables()
            .map_err(|e| Error::Generic(format!("failed to query tables: {}", e)))?;

        // SQLite cannot drop several tables in one statement
        for table in &tables {
            ctx.err()?;

            #[cfg(feature = "tracing")]
            tracing::debug!(table = %table, "Dropping table");

            self.conn
                .execute_batch(&format!(
                    "DROP TABLE IF EXISTS \"{}\";",
                    table.replace('"', "\"\"")
                ))
                .map_err(|e| Error::Generic(format!("failed to drop table {}: {}", table, e)))?;
        }
        Ok(())
    }

    fn user_tables(&self) -> Result<Vec<String>, Error> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%'",
        )?;
        let tables = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(tables)
    }
}

impl Driver for SqliteDriver {
    fn set_migration_table_name(&mut self, name: &str) {
        self.migration_table_name = driver::migration_table_name_or_default(name);
    }

    fn create_migrations_table(&mut self, ctx: &Context) -> Result<(), Error> {
        ctx.err()?;

        #[cfg(feature = "tracing")]
        tracing::debug!(table = %self.migration_table_name, "Ensuring migration tracking table exists");

        self.conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS {} (
                    name VARCHAR(255) PRIMARY KEY NOT NULL,
                    executed_at TIMESTAMP DEFAULT CURRENT_TIMESTAMP
                )",
                self.migration_table_name
            ),
            [],
        )?;
        Ok(())
    }

    fn get_executed_migrations(
        &mut self,
        ctx: &Context,
        reverse: bool,
    ) -> Result<Vec<ExecutedMigration>, Error> {
        ctx.err()?;

        let order = if reverse { "DESC" } else { "ASC" };
        let mut stmt = self.conn.prepare(&format!(
            "SELECT name, CAST(executed_at AS TEXT) FROM {} ORDER BY name {}",
            self.migration_table_name, order
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(name, executed_at)| -> Result<ExecutedMigration, Error> {
                Ok(ExecutedMigration::new(name, parse_executed_at(&executed_at)?))
            })
            .collect()
    }

    fn apply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error> {
        driver::run_batch(ctx, migrations, hooks, |migration| {
            #[cfg(feature = "tracing")]
            let _span = tracing::info_span!("sqlite_migration_up", name = %migration.name()).entered();

            self.apply_one(migration)
        })
    }

    fn unapply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error> {
        driver::run_batch(ctx, migrations, hooks, |migration| {
            #[cfg(feature = "tracing")]
            let _span = tracing::info_span!("sqlite_migration_down", name = %migration.name()).entered();

            self.unapply_one(migration)
        })
    }

    fn clean_database(&mut self, ctx: &Context) -> Result<(), Error> {
        ctx.err()?;
        self.conn
            .execute_batch("PRAGMA foreign_keys = OFF;")
            .map_err(|e| Error::Generic(format!("failed to disable FK checks: {}", e)))?;

        let dropped = self.drop_user_tables(ctx);
        let restored = self
            .conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .map_err(|e| Error::Generic(format!("failed to re-enable FK checks: {}", e)));
        dropped.and(restored)
    }
}
