#![cfg_attr(docsrs, feature(doc_cfg))]
//! `sqlshift` applies ordered, reversible SQL migrations and records each one in a
//! tracking table inside the database it changes.
//!
//! Core concepts:
//! - A [`Migration`] is a uniquely named pair of SQL scripts (`up` and `down`). Names
//!   are the ordering key, so prefix them with a sortable timestamp.
//! - A [`Driver`] talks to one database engine. The [`Migrator`] owns one and decides
//!   what to run by comparing the registered migrations with the tracking table.
//!
//! # Operations
//!
//! | Operation | Effect |
//! |-----------|--------|
//! | [`migrate`](Migrator::migrate) | Apply every pending migration, ascending |
//! | [`rollback`](Migrator::rollback) | Unapply the last N executed migrations, descending |
//! | [`reset`](Migrator::reset) | Unapply everything, then migrate |
//! | [`fresh`](Migrator::fresh) | Drop every table, then migrate |
//! | [`clean`](Migrator::clean) | Drop every table |
//! | [`list`](Migrator::list) | Every registered migration with its applied status |
//!
//! A batch stops at the first failing migration. Migrations before it stay applied and
//! recorded, so running the same operation again resumes from the failure.
//!
//! Every operation takes a [`Context`]. Cancelling it (or letting its deadline pass)
//! stops a batch before the next migration starts.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sqlshift::sqlite::SqliteDriver;
//! use sqlshift::{sql_migration, Config, Context, Migration, Migrator};
//!
//! sql_migration!(CreateUsers, "20240101120000_create_users",
//!     up: "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
//!     down: "DROP TABLE users"
//! );
//!
//! # fn main() -> Result<(), sqlshift::Error> {
//! let mut migrator = Migrator::new(Config::new(SqliteDriver::open_in_memory()?))?;
//! migrator.register(vec![Arc::new(CreateUsers) as Arc<dyn Migration>])?;
//!
//! let ctx = Context::background();
//! migrator.migrate(&ctx)?;
//! print!("{}", migrator.list(&ctx)?);
//! # Ok(())
//! # }
//! ```
//!
//! # Database support
//!
//! - [`SQLite`](sqlite) - available with the `sqlite` feature flag (default).
//! - [`MySQL`](mysql) - available with the `mysql` feature flag.
//! - [`PostgreSQL`](postgres) - available with the `postgres` feature flag.
//!
//! Tracing integration is available with the `tracing` feature flag (default), and
//! testing utilities with the `testing` feature flag.

mod context;
pub use context::{CancelHandle, Context};

mod driver;
pub use driver::{migration_table_name_or_default, Driver, Hooks, DEFAULT_MIGRATION_TABLE_NAME};

mod error;
pub use error::Error;

mod list;
pub use list::{ListEntry, MigrationList};

mod migration;
pub use migration::{ExecutedMigration, Migration, SqlMigration};

mod migrator;
pub use migrator::{Config, Direction, Migrator, DEFAULT_MIGRATION_FILES_DIR};

mod template;
pub use template::migration_name;

#[macro_use]
mod macros;

#[cfg(feature = "sqlite")]
#[cfg_attr(docsrs, doc(cfg(feature = "sqlite")))]
pub mod sqlite;

#[cfg(feature = "mysql")]
#[cfg_attr(docsrs, doc(cfg(feature = "mysql")))]
pub mod mysql;

#[cfg(feature = "postgres")]
#[cfg_attr(docsrs, doc(cfg(feature = "postgres")))]
pub mod postgres;

#[cfg(any(test, feature = "testing"))]
#[cfg_attr(docsrs, doc(cfg(feature = "testing")))]
pub mod testing;

#[cfg(all(test, feature = "mysql"))]
pub(crate) mod test_mysql;

#[cfg(all(test, feature = "postgres"))]
pub(crate) mod test_postgres;
