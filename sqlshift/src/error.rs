/// Error type for the sqlshift crate.
///
/// Backend failures are wrapped with the migration (or operation) they belong to;
/// the original cause stays reachable through [`std::error::Error::source`].
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("driver not provided")]
    DriverNotProvided,
    #[error("migration {0} registered more than once")]
    DuplicateMigration(String),
    #[error("rollback step must be at least 1, got {0}")]
    InvalidStep(usize),
    #[error("invalid migration name '{0}'")]
    InvalidMigrationName(String),
    #[error("migration {0} is recorded as executed but is not registered")]
    MigrationNotRegistered(String),

    #[error("failed to apply migration {name}: {source}")]
    ApplyMigration {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("failed to record migration {name}: {source}")]
    RecordMigration {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("failed to unapply migration {name}: {source}")]
    UnapplyMigration {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("failed to remove migration record {name}: {source}")]
    RemoveMigrationRecord {
        name: String,
        #[source]
        source: Box<Error>,
    },
    #[error("failed to create migrations table: {0}")]
    CreateMigrationsTable(#[source] Box<Error>),
    #[error("failed to clean database: {0}")]
    CleanDatabase(#[source] Box<Error>),

    #[error("operation cancelled")]
    Cancelled,
    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[cfg(feature = "sqlite")]
    #[error("{0}")]
    Rusqlite(rusqlite::Error),
    #[cfg(feature = "mysql")]
    #[error("{0}")]
    Mysql(String),
    #[cfg(feature = "postgres")]
    #[error("{0}")]
    Postgres(#[from] postgres::Error),
    #[error("{0}")]
    Generic(String),
}

impl Error {
    /// The migration a batch failure is about, if any.
    pub fn migration_name(&self) -> Option<&str> {
        match self {
            Self::DuplicateMigration(name)
            | Self::MigrationNotRegistered(name)
            | Self::ApplyMigration { name, .. }
            | Self::RecordMigration { name, .. }
            | Self::UnapplyMigration { name, .. }
            | Self::RemoveMigrationRecord { name, .. } => Some(name),
            _ => None,
        }
    }

    /// Whether this error (or the error it wraps) came from a cancelled or expired [`Context`](crate::Context).
    pub fn is_cancellation(&self) -> bool {
        match self {
            Self::Cancelled | Self::DeadlineExceeded => true,
            Self::ApplyMigration { source, .. }
            | Self::RecordMigration { source, .. }
            | Self::UnapplyMigration { source, .. }
            | Self::RemoveMigrationRecord { source, .. }
            | Self::CreateMigrationsTable(source)
            | Self::CleanDatabase(source) => source.is_cancellation(),
            _ => false,
        }
    }

    pub(crate) fn apply(name: &str, source: Error) -> Self {
        Self::ApplyMigration {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn record(name: &str, source: Error) -> Self {
        Self::RecordMigration {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn unapply(name: &str, source: Error) -> Self {
        Self::UnapplyMigration {
            name: name.to_string(),
            source: Box::new(source),
        }
    }

    pub(crate) fn remove_record(name: &str, source: Error) -> Self {
        Self::RemoveMigrationRecord {
            name: name.to_string(),
            source: Box::new(source),
        }
    }
}

#[cfg(feature = "sqlite")]
impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        Self::Rusqlite(value)
    }
}

#[cfg(feature = "mysql")]
impl From<mysql::Error> for Error {
    fn from(value: mysql::Error) -> Self {
        Self::Mysql(value.to_string())
    }
}

impl From<String> for Error {
    fn from(value: String) -> Self {
        Self::Generic(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error as _;

    #[test]
    fn duplicate_message_mentions_registration() {
        let err = Error::DuplicateMigration("001_create_users".to_string());
        assert_eq!(
            err.to_string(),
            "migration 001_create_users registered more than once"
        );
    }

    #[test]
    fn apply_error_keeps_name_and_cause() {
        let err = Error::apply("002_b", Error::Generic("syntax error".to_string()));
        assert_eq!(err.to_string(), "failed to apply migration 002_b: syntax error");
        assert_eq!(err.migration_name(), Some("002_b"));
        assert_eq!(err.source().unwrap().to_string(), "syntax error");
    }

    #[test]
    fn cancellation_is_seen_through_wrappers() {
        let err = Error::record("001_a", Error::Cancelled);
        assert!(err.is_cancellation());
        assert!(!Error::Generic("x".to_string()).is_cancellation());
    }
}
