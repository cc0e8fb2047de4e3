//! Database migrations for the sample application.

use std::sync::Arc;

use sqlshift::{sql_migration, Migration};

sql_migration!(CreateUsersTable, "20240101120000_create_users_table",
    up: "CREATE TABLE users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL
    )",
    down: "DROP TABLE users"
);

sql_migration!(AddEmailColumn, "20240102090000_add_email_column",
    up: "ALTER TABLE users ADD COLUMN email TEXT",
    down: "ALTER TABLE users DROP COLUMN email"
);

sql_migration!(CreatePostsTable, "20240103150000_create_posts_table",
    up: [
        "CREATE TABLE posts (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id INTEGER NOT NULL,
            title TEXT NOT NULL,
            body TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (user_id) REFERENCES users(id)
        )",
        "CREATE INDEX idx_posts_user_id ON posts(user_id)"
    ],
    down: ["DROP INDEX idx_posts_user_id", "DROP TABLE posts"]
);

/// Every migration this application ships, in any order.
pub fn all() -> Vec<Arc<dyn Migration>> {
    vec![
        Arc::new(CreateUsersTable) as Arc<dyn Migration>,
        Arc::new(AddEmailColumn) as Arc<dyn Migration>,
        Arc::new(CreatePostsTable) as Arc<dyn Migration>,
    ]
}
