//! The contract every storage backend implements.
//!
//! The [`Migrator`](crate::Migrator) never talks to a database directly. It asks a
//! [`Driver`] to create the tracking table, report what has run, apply or unapply an
//! ordered batch, and drop every user table. Each SQL dialect ships its own driver;
//! all of them must behave identically at this boundary.

use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::migration::{ExecutedMigration, Migration};

/// Tracking table name used when none (or an empty one) is configured.
pub const DEFAULT_MIGRATION_TABLE_NAME: &str = "migrations";

/// Storage backend consumed by the [`Migrator`](crate::Migrator).
pub trait Driver {
    /// Configure the tracking table name. An empty name resets it to
    /// [`DEFAULT_MIGRATION_TABLE_NAME`].
    fn set_migration_table_name(&mut self, name: &str);

    /// Ensure the tracking table exists. Safe to call on every run.
    fn create_migrations_table(&mut self, ctx: &Context) -> Result<(), Error>;

    /// All tracking rows, ordered by name ascending (descending when `reverse`).
    fn get_executed_migrations(
        &mut self,
        ctx: &Context,
        reverse: bool,
    ) -> Result<Vec<ExecutedMigration>, Error>;

    /// Run each migration's up script in the given order and record it.
    ///
    /// Stops at the first failure and returns an error naming that migration.
    /// Migrations before it stay applied and recorded; the ones after it are never attempted.
    fn apply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error>;

    /// Run each migration's down script in the given order and delete its record.
    /// Same halt-on-first-failure policy as [`Driver::apply_migrations`].
    fn unapply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error>;

    /// Drop every user table, with integrity checks suspended around the drop.
    fn clean_database(&mut self, ctx: &Context) -> Result<(), Error>;
}

impl<D: Driver + ?Sized> Driver for Box<D> {
    fn set_migration_table_name(&mut self, name: &str) {
        (**self).set_migration_table_name(name)
    }

    fn create_migrations_table(&mut self, ctx: &Context) -> Result<(), Error> {
        (**self).create_migrations_table(ctx)
    }

    fn get_executed_migrations(
        &mut self,
        ctx: &Context,
        reverse: bool,
    ) -> Result<Vec<ExecutedMigration>, Error> {
        (**self).get_executed_migrations(ctx, reverse)
    }

    fn apply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error> {
        (**self).apply_migrations(ctx, migrations, hooks)
    }

    fn unapply_migrations(
        &mut self,
        ctx: &Context,
        migrations: &[Arc<dyn Migration>],
        hooks: &Hooks<'_>,
    ) -> Result<(), Error> {
        (**self).unapply_migrations(ctx, migrations, hooks)
    }

    fn clean_database(&mut self, ctx: &Context) -> Result<(), Error> {
        (**self).clean_database(ctx)
    }
}

/// Observer callbacks invoked synchronously around each migration of a batch.
///
/// `on_running` fires before a migration's statements; exactly one of `on_success` or
/// `on_failed` fires after them.
#[derive(Default, Clone, Copy)]
pub struct Hooks<'a> {
    pub on_running: Option<&'a dyn Fn(&dyn Migration)>,
    pub on_success: Option<&'a dyn Fn(&dyn Migration)>,
    pub on_failed: Option<&'a dyn Fn(&dyn Migration, &Error)>,
}

impl<'a> Hooks<'a> {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn on_running(mut self, callback: &'a dyn Fn(&dyn Migration)) -> Self {
        self.on_running = Some(callback);
        self
    }

    pub fn on_success(mut self, callback: &'a dyn Fn(&dyn Migration)) -> Self {
        self.on_success = Some(callback);
        self
    }

    pub fn on_failed(mut self, callback: &'a dyn Fn(&dyn Migration, &Error)) -> Self {
        self.on_failed = Some(callback);
        self
    }

    fn running(&self, migration: &dyn Migration) {
        if let Some(callback) = self.on_running {
            callback(migration);
        }
    }

    fn success(&self, migration: &dyn Migration) {
        if let Some(callback) = self.on_success {
            callback(migration);
        }
    }

    fn failed(&self, migration: &dyn Migration, error: &Error) {
        if let Some(callback) = self.on_failed {
            callback(migration, error);
        }
    }
}

impl std::fmt::Debug for Hooks<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hooks")
            .field("on_running", &self.on_running.is_some())
            .field("on_success", &self.on_success.is_some())
            .field("on_failed", &self.on_failed.is_some())
            .finish()
    }
}

/// Drive one batch through `step`, one migration at a time.
///
/// The context is checked before each migration. A migration's script and its
/// tracking write are a single step, so cancellation never separates the two.
/// `step` is expected to return errors already wrapped with the migration name.
pub(crate) fn run_batch<F>(
    ctx: &Context,
    migrations: &[Arc<dyn Migration>],
    hooks: &Hooks<'_>,
    mut step: F,
) -> Result<(), Error>
where
    F: FnMut(&dyn Migration) -> Result<(), Error>,
{
    for migration in migrations {
        let migration = migration.as_ref();
        ctx.err()?;

        hooks.running(migration);
        match step(migration) {
            Ok(()) => hooks.success(migration),
            Err(error) => {
                hooks.failed(migration, &error);
                return Err(error);
            }
        }
    }
    Ok(())
}

/// Resolve a configured table name, falling back to [`DEFAULT_MIGRATION_TABLE_NAME`].
pub fn migration_table_name_or_default(name: &str) -> String {
    if name.is_empty() {
        DEFAULT_MIGRATION_TABLE_NAME.to_string()
    } else {
        name.to_string()
    }
}
