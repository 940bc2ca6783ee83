//! Format version migration framework.
//!
//! A registry of functions that each upgrade a JSON document from one format
//! version to the next, chained to bring old saves up to date before they are
//! decoded into current types.

use std::collections::BTreeMap;

use serde_json::Value;

/// Errors that can occur during migration.
#[derive(Debug, thiserror::Error)]
pub enum MigrationError {
    #[error("no migration path from version {from} to version {to}")]
    NoMigrationPath { from: u32, to: u32 },
    #[error("migration from version {from} failed: {reason}")]
    MigrationFailed { from: u32, reason: String },
    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Upgrades a document from `version N` to `version N+1`.
pub type MigrationFn = fn(Value) -> Result<Value, MigrationError>;

/// Registry of migration functions keyed by source version.
#[derive(Debug, Clone, Default)]
pub struct MigrationRegistry {
    migrations: BTreeMap<u32, MigrationFn>,
}

impl MigrationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a migration from `from_version` to `from_version + 1`.
    pub fn register(&mut self, from_version: u32, migrate: MigrationFn) {
        self.migrations.insert(from_version, migrate);
    }

    pub fn with(mut self, from_version: u32, migrate: MigrationFn) -> Self {
        self.register(from_version, migrate);
        self
    }

    /// Check whether a complete migration path exists from `from` to `to`.
    pub fn can_migrate(&self, from: u32, to: u32) -> bool {
        if from >= to {
            return from == to;
        }
        (from..to).all(|v| self.migrations.contains_key(&v))
    }

    /// Upgrade `value` from version `from` to version `to`, one step at a
    /// time. Downgrades are never possible.
    pub fn migrate(&self, value: Value, from: u32, to: u32) -> Result<Value, MigrationError> {
        if !self.can_migrate(from, to) {
            return Err(MigrationError::NoMigrationPath { from, to });
        }

        let mut current = value;
        for version in from..to {
            let migrate_fn = self
                .migrations
                .get(&version)
                .ok_or(MigrationError::NoMigrationPath { from, to })?;
            current = migrate_fn(current)?;
            tracing::debug!(from = version, to = version + 1, "document migrated");
        }
        Ok(current)
    }

    /// Number of registered migration steps.
    pub fn step_count(&self) -> usize {
        self.migrations.len()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
