use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::migration::{ExecutedMigration, Migration};

/// One registered migration annotated with whether the database reports it as applied.
#[derive(Debug, Clone)]
pub struct ListEntry {
    pub migration: Arc<dyn Migration>,
    pub is_executed: bool,
    pub executed_at: Option<DateTime<Utc>>,
}

impl ListEntry {
    pub fn name(&self) -> &str {
        self.migration.name()
    }
}

/// Every registered migration in ascending name order, joined against the tracking table.
///
/// Built fresh on every [`Migrator::list`](crate::Migrator::list) call. Tracking rows
/// whose migration is no longer registered do not appear.
#[derive(Debug, Clone, Default)]
pub struct MigrationList {
    entries: Vec<ListEntry>,
}

impl MigrationList {
    /// Join `registered` (any order) with `executed` rows.
    pub fn join<'a, I>(registered: I, executed: &[ExecutedMigration]) -> Self
    where
        I: IntoIterator<Item = &'a Arc<dyn Migration>>,
    {
        let executed_at: HashMap<&str, DateTime<Utc>> = executed
            .iter()
            .map(|m| (m.name.as_str(), m.executed_at))
            .collect();

        let mut entries = registered
            .into_iter()
            .map(|migration| {
                let at = executed_at.get(migration.name()).copied();
                ListEntry {
                    migration: Arc::clone(migration),
                    is_executed: at.is_some(),
                    executed_at: at,
                }
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.name().cmp(b.name()));

        Self { entries }
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn executed(&self) -> impl Iterator<Item = &ListEntry> {
        self.entries.iter().filter(|e| e.is_executed)
    }

    pub fn pending(&self) -> impl Iterator<Item = &ListEntry> {
        self.entries.iter().filter(|e| !e.is_executed)
    }
}

impl IntoIterator for MigrationList {
    type Item = ListEntry;
    type IntoIter = std::vec::IntoIter<ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a MigrationList {
    type Item = &'a ListEntry;
    type IntoIter = std::slice::Iter<'a, ListEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl fmt::Display for MigrationList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.entries.is_empty() {
            return writeln!(f, "No migrations registered.");
        }

        let width = self
            .entries
            .iter()
            .map(|e| e.name().len())
            .max()
            .unwrap_or(0)
            .max("Migration".len());

        writeln!(f, "{:<width$}  {:<8}  Executed At", "Migration", "Status")?;
        for entry in &self.entries {
            let status = if entry.is_executed { "Executed" } else { "Pending" };
            let at = entry
                .executed_at
                .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
                .unwrap_or_else(|| "-".to_string());
            writeln!(f, "{:<width$}  {:<8}  {}", entry.name(), status, at)?;
        }
        Ok(())
    }
}
