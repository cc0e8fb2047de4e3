use anyhow::{anyhow, bail};
use sqlshift::Driver;

/// Open a driver for `url`, chosen by its scheme.
///
/// | Scheme | Driver | Feature |
/// |--------|--------|---------|
/// | `sqlite:<path>`, `sqlite://<path>`, `sqlite::memory:` | SQLite | `sqlite` |
/// | `mysql://` | MySQL | `mysql` |
/// | `postgres://`, `postgresql://` | PostgreSQL | `postgres` |
pub fn connect(url: &str) -> anyhow::Result<Box<dyn Driver>> {
    let (scheme, rest) = url
        .split_once(':')
        .ok_or_else(|| anyhow!("database URL has no scheme; expected sqlite:, mysql:// or postgres://"))?;

    // Only the scheme goes into log lines and errors; the rest may hold credentials
    tracing::debug!(scheme, "Connecting to database");

    match scheme {
        "sqlite" => connect_sqlite(rest.strip_prefix("//").unwrap_or(rest)),
        "mysql" => connect_mysql(url),
        "postgres" | "postgresql" => connect_postgres(url),
        other => bail!("unsupported database scheme '{}'", other),
    }
}

#[cfg(feature = "sqlite")]
fn connect_sqlite(path: &str) -> anyhow::Result<Box<dyn Driver>> {
    use sqlshift::sqlite::SqliteDriver;

    let driver = match path {
        "" => bail!("sqlite URL has no database path"),
        ":memory:" => SqliteDriver::open_in_memory()?,
        path => SqliteDriver::open(path)?,
    };
    Ok(Box::new(driver))
}

#[cfg(not(feature = "sqlite"))]
fn connect_sqlite(_path: &str) -> anyhow::Result<Box<dyn Driver>> {
    bail!("sqlite support is not enabled; rebuild with the `sqlite` feature")
}

#[cfg(feature = "mysql")]
fn connect_mysql(url: &str) -> anyhow::Result<Box<dyn Driver>> {
    Ok(Box::new(sqlshift::mysql::MysqlDriver::connect(url)?))
}

#[cfg(not(feature = "mysql"))]
fn connect_mysql(_url: &str) -> anyhow::Result<Box<dyn Driver>> {
    bail!("mysql support is not enabled; rebuild with the `mysql` feature")
}

#[cfg(feature = "postgres")]
fn connect_postgres(url: &str) -> anyhow::Result<Box<dyn Driver>> {
    Ok(Box::new(sqlshift::postgres::PostgresDriver::connect(url)?))
}

#[cfg(not(feature = "postgres"))]
fn connect_postgres(_url: &str) -> anyhow::Result<Box<dyn Driver>> {
    bail!("postgres support is not enabled; rebuild with the `postgres` feature")
}
