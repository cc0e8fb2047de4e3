use std::cell::Cell;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::context::Context;
use crate::driver::{Driver, Hooks};
use crate::error::Error;
use crate::list::MigrationList;
use crate::migration::{ExecutedMigration, Migration};
use crate::template;

/// Directory [`Migrator::create`] writes to when none is configured.
pub const DEFAULT_MIGRATION_FILES_DIR: &str = "migrations";

/// Which way a batch runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// Everything a [`Migrator`] needs up front.
#[derive(Default)]
pub struct Config {
    /// Backend the migrator talks to. Required.
    pub driver: Option<Box<dyn Driver>>,
    /// Tracking table name. `None` or empty selects the driver default ("migrations").
    pub migration_table_name: Option<String>,
    /// Where [`Migrator::create`] writes new migration files.
    pub migration_files_dir: Option<PathBuf>,
}

impl Config {
    pub fn new(driver: impl Driver + 'static) -> Self {
        Self {
            driver: Some(Box::new(driver)),
            ..Self::default()
        }
    }

    pub fn with_migration_table_name(mut self, name: impl Into<String>) -> Self {
        self.migration_table_name = Some(name.into());
        self
    }

    pub fn with_migration_files_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.migration_files_dir = Some(dir.into());
        self
    }
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("driver", &self.driver.is_some())
            .field("migration_table_name", &self.migration_table_name)
            .field("migration_files_dir", &self.migration_files_dir)
            .finish()
    }
}

#[derive(Default)]
struct Callbacks {
    on_migration_start: Option<Box<dyn Fn(Direction, &str) + Send + Sync>>,
    on_migration_complete: Option<Box<dyn Fn(Direction, &str, Duration) + Send + Sync>>,
    on_migration_error: Option<Box<dyn Fn(Direction, &str, &Error) + Send + Sync>>,
}

/// The entrypoint for running registered [`Migration`]s through a [`Driver`].
///
/// Migrations are applied in ascending name order and unapplied in descending name
/// order. The migrator keeps no state about the database itself: every operation asks
/// the driver for the tracking table's contents first.
pub struct Migrator {
    driver: Box<dyn Driver>,
    migrations: BTreeMap<String, Arc<dyn Migration>>,
    migration_files_dir: PathBuf,
    callbacks: Callbacks,
}

// Manual Debug impl since the driver and closures don't implement Debug
impl std::fmt::Debug for Migrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cb = &self.callbacks;
        f.debug_struct("Migrator")
            .field("migrations", &self.migrations.keys().collect::<Vec<_>>())
            .field("migration_files_dir", &self.migration_files_dir)
            .field("on_migration_start", &cb.on_migration_start.is_some())
            .field("on_migration_complete", &cb.on_migration_complete.is_some())
            .field("on_migration_error", &cb.on_migration_error.is_some())
            .finish()
    }
}

impl Migrator {
    /// Create a migrator from `config`. Fails if no driver was supplied.
    pub fn new(config: Config) -> Result<Self, Error> {
        let Config {
            driver,
            migration_table_name,
            migration_files_dir,
        } = config;
        let mut driver = driver.ok_or(Error::DriverNotProvided)?;
        driver.set_migration_table_name(migration_table_name.as_deref().unwrap_or(""));

        Ok(Self {
            driver,
            migrations: BTreeMap::new(),
            migration_files_dir: migration_files_dir
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MIGRATION_FILES_DIR)),
            callbacks: Callbacks::default(),
        })
    }

    /// Set a callback to be invoked when a migration starts running.
    pub fn on_migration_start<F>(mut self, callback: F) -> Self
    where
        F: Fn(Direction, &str) + Send + Sync + 'static,
    {
        self.callbacks.on_migration_start = Some(Box::new(callback));
        self
    }

    /// Set a callback to be invoked when a migration finishes successfully.
    /// The callback receives how long the migration took.
    pub fn on_migration_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(Direction, &str, Duration) + Send + Sync + 'static,
    {
        self.callbacks.on_migration_complete = Some(Box::new(callback));
        self
    }

    /// Set a callback to be invoked when a migration fails.
    pub fn on_migration_error<F>(mut self, callback: F) -> Self
    where
        F: Fn(Direction, &str, &Error) + Send + Sync + 'static,
    {
        self.callbacks.on_migration_error = Some(Box::new(callback));
        self
    }

    /// Add migrations to the registry.
    ///
    /// Fails with [`Error::DuplicateMigration`] if any name is already registered or
    /// appears twice in `migrations`. Nothing is registered when the call fails.
    pub fn register(&mut self, migrations: Vec<Arc<dyn Migration>>) -> Result<(), Error> {
        let mut incoming = BTreeSet::new();
        for migration in &migrations {
            let name = migration.name();
            if self.migrations.contains_key(name) || !incoming.insert(name) {
                return Err(Error::DuplicateMigration(name.to_string()));
            }
        }

        for migration in migrations {
            self.migrations
                .insert(migration.name().to_string(), migration);
        }
        Ok(())
    }

    /// All registered migrations in ascending name order.
    pub fn migrations(&self) -> Vec<Arc<dyn Migration>> {
        self.migrations.values().cloned().collect()
    }

    pub fn migration_files_dir(&self) -> &Path {
        &self.migration_files_dir
    }

    pub fn set_migration_files_dir(&mut self, dir: impl Into<PathBuf>) {
        self.migration_files_dir = dir.into();
    }

    /// Registered migrations absent from the tracking table, in the order
    /// [`migrate`](Self::migrate) would apply them.
    pub fn pending(&mut self, ctx: &Context) -> Result<Vec<Arc<dyn Migration>>, Error> {
        self.ensure_migrations_table(ctx)?;
        let executed: HashSet<String> = self
            .driver
            .get_executed_migrations(ctx, false)?
            .into_iter()
            .map(|m| m.name)
            .collect();

        let pending = self
            .migrations
            .values()
            .filter(|m| !executed.contains(m.name()))
            .cloned()
            .collect::<Vec<_>>();

        #[cfg(feature = "tracing")]
        tracing::debug!(
            executed = executed.len(),
            pending = ?pending.iter().map(|m| m.name()).collect::<Vec<_>>(),
            "Computed pending migrations"
        );

        Ok(pending)
    }

    /// Apply every pending migration in ascending name order.
    pub fn migrate(&mut self, ctx: &Context) -> Result<(), Error> {
        let pending = self.pending(ctx)?;
        if pending.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::info!("Nothing to migrate");
            return Ok(());
        }

        run_batch(
            self.driver.as_mut(),
            &self.callbacks,
            ctx,
            Direction::Up,
            &pending,
        )
    }

    /// Drop every table, then apply all migrations from an empty schema.
    pub fn fresh(&mut self, ctx: &Context) -> Result<(), Error> {
        self.clean(ctx)?;
        self.migrate(ctx)
    }

    /// Unapply every executed migration (most recent name first), then migrate again.
    ///
    /// Does nothing when no migration has been executed.
    pub fn reset(&mut self, ctx: &Context) -> Result<(), Error> {
        let executed = self.driver.get_executed_migrations(ctx, true)?;
        if executed.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::info!("Nothing to reset");
            return Ok(());
        }

        let batch = self.resolve(&executed)?;
        run_batch(
            self.driver.as_mut(),
            &self.callbacks,
            ctx,
            Direction::Down,
            &batch,
        )?;

        self.migrate(ctx)
    }

    /// Unapply the last `steps` executed migrations in descending name order.
    ///
    /// Asking for more steps than there are executed migrations unapplies all of them.
    pub fn rollback(&mut self, ctx: &Context, steps: usize) -> Result<(), Error> {
        if steps < 1 {
            return Err(Error::InvalidStep(steps));
        }

        self.ensure_migrations_table(ctx)?;
        let mut executed = self.driver.get_executed_migrations(ctx, true)?;
        executed.truncate(steps);
        let batch = self.resolve(&executed)?;

        if batch.is_empty() {
            #[cfg(feature = "tracing")]
            tracing::info!("Nothing to roll back");
            return Ok(());
        }

        run_batch(
            self.driver.as_mut(),
            &self.callbacks,
            ctx,
            Direction::Down,
            &batch,
        )
    }

    /// Drop every user table through the driver.
    pub fn clean(&mut self, ctx: &Context) -> Result<(), Error> {
        #[cfg(feature = "tracing")]
        tracing::info!("Cleaning database");

        self.driver
            .clean_database(ctx)
            .map_err(|e| Error::CleanDatabase(Box::new(e)))
    }

    /// Every registered migration with its applied status, in ascending name order.
    pub fn list(&mut self, ctx: &Context) -> Result<MigrationList, Error> {
        self.ensure_migrations_table(ctx)?;
        let executed = self.driver.get_executed_migrations(ctx, false)?;
        Ok(MigrationList::join(self.migrations.values(), &executed))
    }

    /// Write a new, empty migration source file into the migration files directory.
    /// Returns the path of the created file.
    pub fn create(&self, name: &str) -> Result<PathBuf, Error> {
        let path = template::write_migration_file(&self.migration_files_dir, name, chrono::Utc::now())?;

        #[cfg(feature = "tracing")]
        tracing::info!(path = %path.display(), "Created migration");

        Ok(path)
    }

    fn ensure_migrations_table(&mut self, ctx: &Context) -> Result<(), Error> {
        self.driver
            .create_migrations_table(ctx)
            .map_err(|e| Error::CreateMigrationsTable(Box::new(e)))
    }

    /// Look up the registered migration behind each tracking row, keeping their order.
    fn resolve(&self, executed: &[ExecutedMigration]) -> Result<Vec<Arc<dyn Migration>>, Error> {
        executed
            .iter()
            .map(|record| {
                self.migrations
                    .get(&record.name)
                    .cloned()
                    .ok_or_else(|| Error::MigrationNotRegistered(record.name.clone()))
            })
            .collect()
    }
}

fn run_batch(
    driver: &mut dyn Driver,
    callbacks: &Callbacks,
    ctx: &Context,
    direction: Direction,
    batch: &[Arc<dyn Migration>],
) -> Result<(), Error> {
    let started = Cell::new(Instant::now());

    let on_running = |migration: &dyn Migration| {
        started.set(Instant::now());

        #[cfg(feature = "tracing")]
        tracing::info!(migration = %migration.name(), direction = ?direction, "Running migration");

        if let Some(ref callback) = callbacks.on_migration_start {
            callback(direction, migration.name());
        }
    };
    let on_success = |migration: &dyn Migration| {
        let elapsed = started.get().elapsed();

        #[cfg(feature = "tracing")]
        tracing::info!(
            migration = %migration.name(),
            direction = ?direction,
            duration_ms = elapsed.as_millis(),
            "Migration completed successfully"
        );

        if let Some(ref callback) = callbacks.on_migration_complete {
            callback(direction, migration.name(), elapsed);
        }
    };
    let on_failed = |migration: &dyn Migration, error: &Error| {
        #[cfg(feature = "tracing")]
        tracing::error!(
            migration = %migration.name(),
            direction = ?direction,
            error = %error,
            "Migration failed"
        );

        if let Some(ref callback) = callbacks.on_migration_error {
            callback(direction, migration.name(), error);
        }
    };

    let hooks = Hooks::none()
        .on_running(&on_running)
        .on_success(&on_success)
        .on_failed(&on_failed);

    match direction {
        Direction::Up => driver.apply_migrations(ctx, batch, &hooks),
        Direction::Down => driver.unapply_migrations(ctx, batch, &hooks),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::SqlMigration;
    use crate::testing::memory::{DriverCall, MemoryDriver};
    use std::sync::Mutex;

    fn migration(name: &str) -> Arc<dyn Migration> {
        Arc::new(SqlMigration::new(
            name,
            format!("CREATE TABLE t_{name} (id INT)"),
            format!("DROP TABLE t_{name}"),
        ))
    }

    fn migrator(driver: &MemoryDriver, names: &[&str]) -> Migrator {
        let mut migrator = Migrator::new(Config::new(driver.clone())).unwrap();
        migrator
            .register(names.iter().map(|n| migration(n)).collect())
            .unwrap();
        driver.clear_calls();
        migrator
    }

    fn names(migrations: &[Arc<dyn Migration>]) -> Vec<&str> {
        migrations.iter().map(|m| m.name()).collect()
    }

    #[test]
    fn new_requires_a_driver() {
        let err = Migrator::new(Config::default()).unwrap_err();
        assert!(matches!(err, Error::DriverNotProvided));
    }

    #[test]
    fn new_configures_table_name() {
        let driver = MemoryDriver::new();
        Migrator::new(Config::new(driver.clone()).with_migration_table_name("schema_log")).unwrap();
        assert_eq!(driver.migration_table_name(), "schema_log");

        let driver = MemoryDriver::new();
        Migrator::new(Config::new(driver.clone())).unwrap();
        assert_eq!(driver.migration_table_name(), "migrations");
    }

    #[test]
    fn register_duplicate_is_rejected() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_create_users"]);

        let err = migrator
            .register(vec![migration("001_create_users")])
            .unwrap_err();
        assert!(err.to_string().contains("registered more than once"));
        assert_eq!(names(&migrator.migrations()), vec!["001_create_users"]);
    }

    #[test]
    fn register_is_atomic() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a"]);

        let err = migrator
            .register(vec![migration("002_b"), migration("001_a")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMigration(ref n) if n == "001_a"));
        assert_eq!(names(&migrator.migrations()), vec!["001_a"]);

        let err = migrator
            .register(vec![migration("003_c"), migration("003_c")])
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateMigration(ref n) if n == "003_c"));
        assert_eq!(names(&migrator.migrations()), vec!["001_a"]);
    }

    #[test]
    fn migrate_with_no_migrations_succeeds() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &[]);
        migrator.migrate(&Context::background()).unwrap();
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::CreateMigrationsTable,
                DriverCall::GetExecutedMigrations { reverse: false },
            ]
        );
    }

    #[test]
    fn migrate_applies_pending_in_ascending_order() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["002_b", "001_a"]);
        let ctx = Context::background();

        migrator.migrate(&ctx).unwrap();
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::CreateMigrationsTable,
                DriverCall::GetExecutedMigrations { reverse: false },
                DriverCall::ApplyMigrations(vec!["001_a".into(), "002_b".into()]),
            ]
        );

        let list = migrator.list(&ctx).unwrap();
        assert!(list.entries().iter().all(|e| e.is_executed));
    }

    #[test]
    fn migrate_applies_only_the_set_difference() {
        let driver = MemoryDriver::new().with_executed(&["002_b"]);
        let mut migrator = migrator(&driver, &["003_c", "001_a", "002_b", "004_d"]);

        migrator.migrate(&Context::background()).unwrap();
        assert_eq!(
            driver.applied_batches(),
            vec![vec!["001_a".to_string(), "003_c".into(), "004_d".into()]]
        );
    }

    #[test]
    fn migrate_twice_writes_nothing_the_second_time() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a", "002_b"]);
        let ctx = Context::background();

        migrator.migrate(&ctx).unwrap();
        driver.clear_calls();
        migrator.migrate(&ctx).unwrap();

        assert!(driver.applied_batches().is_empty());
        assert!(driver.unapplied_batches().is_empty());
    }

    #[test]
    fn migrate_ignores_orphan_records() {
        let driver = MemoryDriver::new().with_executed(&["000_removed"]);
        let mut migrator = migrator(&driver, &["001_a"]);

        migrator.migrate(&Context::background()).unwrap();
        assert_eq!(driver.applied_batches(), vec![vec!["001_a".to_string()]]);
        assert_eq!(driver.executed_names(), vec!["000_removed", "001_a"]);
    }

    #[test]
    fn migrate_failure_keeps_earlier_records_and_names_the_culprit() {
        let driver = MemoryDriver::new().fail_apply_on("002_b");
        let mut migrator = migrator(&driver, &["001_a", "002_b", "003_c"]);
        let ctx = Context::background();

        let err = migrator.migrate(&ctx).unwrap_err();
        assert_eq!(err.migration_name(), Some("002_b"));
        assert!(err.to_string().contains("002_b"));
        assert_eq!(driver.executed_names(), vec!["001_a"]);

        // retry resumes from the failure point
        driver.clear_failures();
        driver.clear_calls();
        migrator.migrate(&ctx).unwrap();
        assert_eq!(
            driver.applied_batches(),
            vec![vec!["002_b".to_string(), "003_c".into()]]
        );
    }

    #[test]
    fn fresh_cleans_then_migrates_everything() {
        let driver = MemoryDriver::new()
            .with_tables(&["users", "products"])
            .with_executed(&["001_a"]);
        let mut migrator = migrator(&driver, &["001_a", "002_b"]);

        migrator.fresh(&Context::background()).unwrap();

        assert_eq!(driver.calls()[0], DriverCall::CleanDatabase);
        assert!(!driver.tables().contains(&"users".to_string()));
        assert!(!driver.tables().contains(&"products".to_string()));
        assert_eq!(
            driver.applied_batches(),
            vec![vec!["001_a".to_string(), "002_b".into()]]
        );
    }

    #[test]
    fn reset_with_nothing_executed_does_nothing() {
        let driver = MemoryDriver::new().with_executed(&[]);
        let mut migrator = migrator(&driver, &["001_a"]);

        migrator.reset(&Context::background()).unwrap();
        assert_eq!(
            driver.calls(),
            vec![DriverCall::GetExecutedMigrations { reverse: true }]
        );
        assert!(driver.executed_names().is_empty());
    }

    #[test]
    fn reset_without_tracking_table_is_an_error() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a"]);

        assert!(migrator.reset(&Context::background()).is_err());
        assert!(driver.applied_batches().is_empty());
    }

    #[test]
    fn reset_unapplies_in_descending_order_then_reapplies() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a", "002_b", "003_c"]);
        let ctx = Context::background();
        migrator.migrate(&ctx).unwrap();
        driver.clear_calls();

        migrator.reset(&ctx).unwrap();
        assert_eq!(
            driver.unapplied_batches(),
            vec![vec!["003_c".to_string(), "002_b".into(), "001_a".into()]]
        );
        assert_eq!(
            driver.applied_batches(),
            vec![vec!["001_a".to_string(), "002_b".into(), "003_c".into()]]
        );
    }

    #[test]
    fn rollback_one_step_unapplies_latest_only() {
        let driver = MemoryDriver::new().with_executed(&["001_a", "002_b"]);
        let mut migrator = migrator(&driver, &["001_a", "002_b"]);

        migrator.rollback(&Context::background(), 1).unwrap();
        assert_eq!(driver.unapplied_batches(), vec![vec!["002_b".to_string()]]);
        assert_eq!(driver.executed_names(), vec!["001_a"]);
    }

    #[test]
    fn rollback_overshoot_unapplies_everything() {
        let driver = MemoryDriver::new().with_executed(&["001_a", "002_b"]);
        let mut migrator = migrator(&driver, &["001_a", "002_b", "003_c"]);

        migrator.rollback(&Context::background(), 10).unwrap();
        assert_eq!(
            driver.unapplied_batches(),
            vec![vec!["002_b".to_string(), "001_a".into()]]
        );
        assert!(driver.executed_names().is_empty());
    }

    #[test]
    fn rollback_with_nothing_executed_is_a_no_op() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a"]);
        migrator.rollback(&Context::background(), 1).unwrap();
        assert!(driver.unapplied_batches().is_empty());
    }

    #[test]
    fn rollback_rejects_zero_steps() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a"]);
        let err = migrator.rollback(&Context::background(), 0).unwrap_err();
        assert!(matches!(err, Error::InvalidStep(0)));
        assert!(driver.calls().is_empty());
    }

    #[test]
    fn rollback_of_unregistered_record_is_a_lookup_error() {
        let driver = MemoryDriver::new().with_executed(&["001_a", "002_removed"]);
        let mut migrator = migrator(&driver, &["001_a"]);

        let err = migrator.rollback(&Context::background(), 1).unwrap_err();
        assert!(matches!(err, Error::MigrationNotRegistered(ref n) if n == "002_removed"));
        assert!(driver.unapplied_batches().is_empty());
        assert_eq!(driver.executed_names(), vec!["001_a", "002_removed"]);
    }

    #[test]
    fn rollback_skipping_past_orphans_is_fine() {
        let driver = MemoryDriver::new().with_executed(&["000_removed", "001_a"]);
        let mut migrator = migrator(&driver, &["001_a"]);

        migrator.rollback(&Context::background(), 1).unwrap();
        assert_eq!(driver.executed_names(), vec!["000_removed"]);
    }

    #[test]
    fn apply_then_unapply_restores_records() {
        let driver = MemoryDriver::new().with_executed(&["001_a"]);
        let mut migrator = migrator(&driver, &["001_a", "002_b"]);
        let ctx = Context::background();
        let before = driver.executed_names();

        migrator.migrate(&ctx).unwrap();
        migrator.rollback(&ctx, 1).unwrap();
        assert_eq!(driver.executed_names(), before);
    }

    #[test]
    fn clean_error_is_described() {
        let driver = MemoryDriver::new().fail_clean();
        let mut migrator = migrator(&driver, &[]);
        let err = migrator.clean(&Context::background()).unwrap_err();
        assert!(err.to_string().contains("failed to clean database"));
    }

    #[test]
    fn list_reports_executed_and_pending() {
        let driver = MemoryDriver::new().with_executed(&["001_create_users"]);
        let mut migrator = migrator(&driver, &["001_create_users", "002_add_email"]);

        let list = migrator.list(&Context::background()).unwrap();
        assert_eq!(list.len(), 2);
        assert!(list.entries()[0].is_executed);
        assert!(list.entries()[0].executed_at.is_some());
        assert!(!list.entries()[1].is_executed);
        assert_eq!(
            driver.calls(),
            vec![
                DriverCall::CreateMigrationsTable,
                DriverCall::GetExecutedMigrations { reverse: false },
            ]
        );
    }

    #[test]
    fn callbacks_observe_each_migration() {
        let events = Arc::new(Mutex::new(Vec::new()));
        let (start, complete, error) = (events.clone(), events.clone(), events.clone());

        let driver = MemoryDriver::new().fail_apply_on("002_b");
        let mut migrator = Migrator::new(Config::new(driver.clone()))
            .unwrap()
            .on_migration_start(move |d, name| start.lock().unwrap().push(format!("start {d:?} {name}")))
            .on_migration_complete(move |d, name, _| {
                complete.lock().unwrap().push(format!("complete {d:?} {name}"))
            })
            .on_migration_error(move |d, name, _| {
                error.lock().unwrap().push(format!("error {d:?} {name}"))
            });
        migrator
            .register(vec![migration("001_a"), migration("002_b")])
            .unwrap();

        assert!(migrator.migrate(&Context::background()).is_err());
        assert_eq!(
            *events.lock().unwrap(),
            vec![
                "start Up 001_a",
                "complete Up 001_a",
                "start Up 002_b",
                "error Up 002_b",
            ]
        );
    }

    #[test]
    fn cancelled_context_fails_before_any_io() {
        let driver = MemoryDriver::new();
        let mut migrator = migrator(&driver, &["001_a"]);
        let ctx = Context::background();
        ctx.cancel_handle().cancel();

        let err = migrator.migrate(&ctx).unwrap_err();
        assert!(err.is_cancellation());
        assert!(driver.executed_names().is_empty());
    }

    #[test]
    fn create_writes_into_configured_dir() {
        let dir = tempfile::tempdir().unwrap();
        let driver = MemoryDriver::new();
        let migrator = Migrator::new(
            Config::new(driver).with_migration_files_dir(dir.path().join("migrations")),
        )
        .unwrap();

        let path = migrator.create("create users table").unwrap();
        assert!(path.starts_with(dir.path().join("migrations")));
        assert!(path
            .file_name()
            .unwrap()
            .to_string_lossy()
            .ends_with("_create_users_table.rs"));
        assert!(path.exists());
    }

    #[test]
    fn set_migration_files_dir_overrides_default() {
        let mut migrator = Migrator::new(Config::new(MemoryDriver::new())).unwrap();
        assert_eq!(migrator.migration_files_dir(), Path::new("migrations"));
        migrator.set_migration_files_dir("db/migrations");
        assert_eq!(migrator.migration_files_dir(), Path::new("db/migrations"));
    }
}
