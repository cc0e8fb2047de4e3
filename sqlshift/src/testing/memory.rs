//! An in-memory [`Driver`] for exercising migration orchestration without a database.
//!
//! [`MemoryDriver`] keeps the tracking table in a map and records every call it
//! receives. Clones share state, so a test can hand one clone to a
//! [`Migrator`](crate::Migrator) and inspect the other.
//!
//! ```
//! # #[cfg(not(feature = "testing"))]
//! # fn main() {}
//! # #[cfg(feature = "testing")]
//! # fn main() {
//! use std::sync::Arc;
//! use sqlshift::testing::memory::MemoryDriver;
//! use sqlshift::{Config, Context, Migration, Migrator, SqlMigration};
//!
//! let driver = MemoryDriver::new().with_executed(&["001_a"]);
//! let mut migrator = Migrator::new(Config::new(driver.clone())).unwrap();
//! migrator
//!     .register(vec![
//!         Arc::new(SqlMigration::new("001_a", "", "")) as Arc<dyn Migration>,
//!         Arc::new(SqlMigration::new("002_b", "", "")) as Arc<dyn Migration>,
//!     ])
//!     .unwrap();
//!
//! migrator.migrate(&Context::background()).unwrap();
//! assert_eq!(driver.applied_batches(), vec![vec!["002_b".to_string()]]);
//! # }
//! ```

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::{DateTime, Utc};

use crate::context::Context;
use crate::driver::{self, Driver, Hooks, DEFAULT_MIGRATION_TABLE_NAME};
use crate::error::Error;
use crate::migration::{ExecutedMigration, Migration};

/// One call received by a [`MemoryDriver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    SetMigrationTableName(String),
    CreateMigrationsTable,
    GetExecutedMigrations { reverse: bool },
    /// Names of the batch as requested, including any never reached.
    ApplyMigrations(Vec<String>),
    UnapplyMigrations(Vec<String>),
    CleanDatabase,
}

#[derive(Debug)]
struct State {
    migration_table_name: String,
    tracking_table_exists: bool,
    executed: BTreeMap<String, DateTime<Utc>>,
    tables: BTreeSet<String>,
    calls: Vec<DriverCall>,
    fail_apply: HashSet<String>,
    fail_unapply: HashSet<String>,
    fail_clean: bool,
}

impl Default for State {
    fn default() -> Self {
        Self {
            migration_table_name: DEFAULT_MIGRATION_TABLE_NAME.to_string(),
            tracking_table_exists: false,
            executed: BTreeMap::new(),
            tables: BTreeSet::new(),
            calls: Vec::new(),
            fail_apply: HashSet::new(),
            fail_unapply: HashSet::new(),
            fail_clean: false,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDriver {
    state: Arc<Mutex<State>>,
}

impl MemoryDriver {
    pub fn new() -> Self {
        Self::default()
    }

    // Recover state poisoned by a panicking test
    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pre-populate the tracking table.
    pub fn with_executed(self, names: &[&str]) -> Self {
        {
            let mut state = self.state();
            state.tracking_table_exists = true;
            for name in names {
                state.executed.insert(name.to_string(), Utc::now());
            }
        }
        self
    }

    /// Pretend these user tables exist, for observing [`Driver::clean_database`].
    pub fn with_tables(self, tables: &[&str]) -> Self {
        self.state()
            .tables
            .extend(tables.iter().map(|t| t.to_string()));
        self
    }

    /// Make applying `name` fail with nothing recorded.
    pub fn fail_apply_on(self, name: &str) -> Self {
        self.state().fail_apply.insert(name.to_string());
        self
    }

    /// Make unapplying `name` fail with its record left in place.
    pub fn fail_unapply_on(self, name: &str) -> Self {
        self.state().fail_unapply.insert(name.to_string());
        self
    }

    pub fn fail_clean(self) -> Self {
        self.state().fail_clean = true;
        self
    }

    pub fn clear_failures(&self) {
        let mut state = self.state();
        state.fail_apply.clear();
        state.fail_unapply.clear();
        state.fail_clean = false;
    }

    pub fn calls(&self) -> Vec<DriverCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn applied_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::ApplyMigrations(names) => Some(names),
                _ => None,
            })
            .collect()
    }

    pub fn unapplied_batches(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                DriverCall::UnapplyMigrations(names) => Some(names),
                _ => None,
            })
            .collect()
    }

    /// Names in the tracking table, ascending.
    pub fn executed_names(&self) -> Vec<String> {
        self.state().executed.keys().cloned().collect()
    }

    pub fn tables(&self) -> Vec<String> {
        self.state().tables.iter().cloned().collect()
    }

    pub fn migration_table_name(&self) -> String {
        self.state().migration_table_name.clone()
    }

    fn record(&self, call: DriverCall) {
        self.state().calls.push(call);
    }

    fn apply_one(&self, migration: &dyn Migration) -> Result<(), Error> {
        let mut state = self.state();
        let name = migration.name();
        if state.fail_apply.contains(name) {
            return Err(Error::apply(
                name,
                Error::Generic("injected apply failure".to_string()),
            ));
        }
        state.executed.insert(name.to_string(), Utc::now());
        Ok(())
    }

    fn unapply_one(&self, migration: &dyn Migration) -> Result<(), Error> {
        let mut state = self.state();
        let name = migration.name();
        if state.fail_unapply.contains(name) {
            return Err(Error::unapply(
                name,
                Error::Generic("injected unapply failure".to_string()),
            ));
        }
        state.executed.remove(name);
        Ok(())
    }
}

fn names(migrations: &[Arc<dyn Migration>]) -> Vec<String> {
    migrations.iter().map(|m| m.name().to_string()).collect()
}

impl Driver for MemoryDriver {
    fn set_migration_table_name(&mut self, name: &str) {
        self.record(DriverCall::SetMigrationTableName(name.to_string()));
        self.state().migration_table_name = driver::migration_table_name_or_default(name);
    }

    fn create_migrations_table(&mut self, ctx: &Context) -> Result<(), Error> {
        self.record(DriverCall::CreateMigrationsTable);
        ctx.err()?;
        self.state().tracking_table_exists = true;
        Ok(())
    }

    fn get_executed_migrations(
        &mut self,
        ctx: &Context,
        reverse: bool,
    ) -> Result<Vec<ExecutedMigration>, Error> {
        self.record(DriverCall::GetExecutedMigrations { reverse });
        ctx.err()?;

        let state = self.state();
        if !state.tracking_table_exists {
            return Err(Error::Generic(format!(
                "no such table: {}",
                state.migration_table_name
            )));
        }

        let mut executed = state
            .executed
            .iter()
            .map(|(name, at)| ExecutedMigration::new(name.clone(), *at))
            .collect::<Vec<_>>();
        if reverse {
            executed.reverse();
        }
        Ok(executed)
    }

    fn apply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error> {
        self.record(DriverCall::ApplyMigrations(names(migrations)));
        driver::run_batch(ctx, migrations, hooks, |migration| self.apply_one(migration))
    }

    fn unapply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error> {
        self.record(DriverCall::UnapplyMigrations(names(migrations)));
        driver::run_batch(ctx, migrations, hooks, |migration| {
            self.unapply_one(migration)
        })
    }

    fn clean_database(&mut self, ctx: &Context) -> Result<(), Error> {
        self.record(DriverCall::CleanDatabase);
        ctx.err()?;

        let mut state = self.state();
        if state.fail_clean {
            return Err(Error::Generic("injected clean failure".to_string()));
        }
        // the tracking table is a user table too
        state.tables.clear();
        state.executed.clear();
        state.tracking_table_exists = false;
        Ok(())
    }
}
