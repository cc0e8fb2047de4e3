//! Scaffolding for new migration source files.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use heck::{ToSnakeCase, ToUpperCamelCase};

use crate::error::Error;

const FILE_NAME_TIMESTAMP: &str = "%Y%m%d%H%M%S";

/// Migration name for a human-entered description, e.g.
/// `"Create users table"` at 2024-01-01 12:00:00 becomes `20240101120000_create_users_table`.
pub fn migration_name(description: &str, now: DateTime<Utc>) -> Result<String, Error> {
    if !description.chars().any(|c| c.is_alphanumeric()) {
        return Err(Error::InvalidMigrationName(description.to_string()));
    }
    Ok(format!(
        "{}_{}",
        now.format(FILE_NAME_TIMESTAMP),
        description.to_snake_case()
    ))
}

fn type_name(description: &str) -> String {
    let camel = description.to_upper_camel_case();
    match camel.chars().next() {
        Some(c) if c.is_ascii_alphabetic() => camel,
        _ => format!("Migration{}", camel),
    }
}

fn render(type_name: &str, migration_name: &str) -> String {
    format!(
        r#"use sqlshift::sql_migration;

sql_migration!({type_name}, "{migration_name}",
    up: "",
    down: ""
);
"#
    )
}

/// Write a new migration file into `dir`, creating the directory if needed.
/// Fails rather than overwrite an existing file.
pub(crate) fn write_migration_file(
    dir: &Path,
    description: &str,
    now: DateTime<Utc>,
) -> Result<PathBuf, Error> {
    let name = migration_name(description, now)?;
    fs::create_dir_all(dir)?;

    let path = dir.join(format!("{}.rs", name));
    let mut file = OpenOptions::new().write(true).create_new(true).open(&path)?;
    file.write_all(render(&type_name(description), &name).as_bytes())?;

    Ok(path)
}
