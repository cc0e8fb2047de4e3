//! Convenience macros for defining migrations.

/// Define a SQL-only migration as a unit struct.
///
/// # Basic Usage
///
/// ```
/// use sqlshift::sql_migration;
///
/// sql_migration!(CreateUsersTable, "20240101120000_create_users_table",
///     up: "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL)",
///     down: "DROP TABLE users"
/// );
/// ```
///
/// This expands to a struct `CreateUsersTable` that implements the
/// [`Migration`](crate::Migration) trait. Register it with
/// `Arc::new(CreateUsersTable) as Arc<dyn Migration>`.
///
/// # Up-Only Migrations
///
/// Omit `down` when the migration cannot be reversed. Unapplying it removes the
/// tracking record without running anything.
///
/// ```
/// use sqlshift::sql_migration;
///
/// sql_migration!(SeedCountries, "20240101120500_seed_countries",
///     up: "INSERT INTO countries (code) VALUES ('NZ'), ('AU')"
/// );
/// ```
///
/// # Multiple Statements
///
/// Statements given as an array are joined with `;` into one script:
///
/// ```
/// use sqlshift::sql_migration;
///
/// sql_migration!(InitialSchema, "20240101130000_initial_schema",
///     up: [
///         "CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)",
///         "CREATE TABLE posts (id INTEGER PRIMARY KEY, user_id INTEGER, title TEXT)",
///         "CREATE INDEX idx_posts_user ON posts(user_id)"
///     ],
///     down: [
///         "DROP INDEX idx_posts_user",
///         "DROP TABLE posts",
///         "DROP TABLE users"
///     ]
/// );
/// ```
///
/// Statements must be string literals. For scripts assembled at runtime use
/// [`SqlMigration`](crate::SqlMigration) instead.
#[macro_export]
macro_rules! sql_migration {
    ($ty:ident, $name:literal,
        up: [$up_first:literal $(, $up_rest:literal)* $(,)?],
        down: [$down_first:literal $(, $down_rest:literal)* $(,)?]
    ) => {
        $crate::__sql_migration_impl!($ty, $name,
            concat!($up_first $(, ";\n", $up_rest)*),
            concat!($down_first $(, ";\n", $down_rest)*)
        );
    };

    ($ty:ident, $name:literal,
        up: $up:literal,
        down: $down:literal
    ) => {
        $crate::__sql_migration_impl!($ty, $name, $up, $down);
    };

    ($ty:ident, $name:literal,
        up: [$up_first:literal $(, $up_rest:literal)* $(,)?]
    ) => {
        $crate::__sql_migration_impl!($ty, $name,
            concat!($up_first $(, ";\n", $up_rest)*),
            ""
        );
    };

    ($ty:ident, $name:literal,
        up: $up:literal
    ) => {
        $crate::__sql_migration_impl!($ty, $name, $up, "");
    };
}

#[macro_export]
#[doc(hidden)]
macro_rules! __sql_migration_impl {
    ($ty:ident, $name:expr, $up:expr, $down:expr) => {
        #[derive(Debug, Clone, Copy, Default)]
        pub struct $ty;

        impl $crate::Migration for $ty {
            fn name(&self) -> &str {
                $name
            }

            fn up_script(&self) -> &str {
                $up
            }

            fn down_script(&self) -> &str {
                $down
            }
        }
    };
}
