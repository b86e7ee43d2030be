// gmark/src/infrastructure/repositories/sqlite/migration.rs
use crate::infrastructure::repositories::sqlite::error::{SqliteRepositoryError, SqliteResult};
use diesel::sqlite::Sqlite;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

/// Schema, ownership keys and the Uncategorized index
pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("./migrations");

/// Names of the embedded migrations not yet applied, oldest first
pub fn pending_names(conn: &mut impl MigrationHarness<Sqlite>) -> SqliteResult<Vec<String>> {
    let pending = conn.pending_migrations(MIGRATIONS).map_err(|e| {
        SqliteRepositoryError::MigrationError(format!("Failed to check pending migrations: {}", e))
    })?;
    Ok(pending.iter().map(|m| m.name().to_string()).collect())
}

pub fn apply_pending(conn: &mut impl MigrationHarness<Sqlite>) -> SqliteResult<usize> {
    let applied = conn.run_pending_migrations(MIGRATIONS).map_err(|e| {
        SqliteRepositoryError::MigrationError(format!("Failed to run migrations: {}", e))
    })?;
    debug!("Applied {} migrations", applied.len());
    Ok(applied.len())
}
