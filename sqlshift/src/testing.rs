//! Testing utilities for migration development.
//!
//! [`memory::MemoryDriver`] stands in for a database when testing code that drives a
//! [`Migrator`](crate::Migrator). [`sqlite::SqliteTestHarness`] runs real migrations
//! against a temporary SQLite file.

pub mod memory;
#[cfg(feature = "testing")]
pub mod sqlite;
