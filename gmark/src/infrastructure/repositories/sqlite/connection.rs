// gmark/src/infrastructure/repositories/sqlite/connection.rs
use super::error::{SqliteRepositoryError, SqliteResult};
use crate::infrastructure::repositories::sqlite::migration::{apply_pending, pending_names};
use chrono::Local;
use diesel::connection::SimpleConnection;
use diesel::r2d2::{self, ConnectionManager, CustomizeConnection};
use diesel::sqlite::SqliteConnection;
use std::fs;
use std::path::Path;
use tracing::{debug, info, instrument};

pub type ConnectionPool = r2d2::Pool<ConnectionManager<SqliteConnection>>;
pub type PooledConnection = r2d2::PooledConnection<ConnectionManager<SqliteConnection>>;

/// Per-connection settings. SQLite ships with foreign keys disabled; the
/// ownership guarantees rest entirely on them, so every pooled connection
/// turns them on before first use.
#[derive(Debug, Clone, Copy)]
pub struct SqlitePragmas {
    pub busy_timeout_ms: u32,
}

impl Default for SqlitePragmas {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
        }
    }
}

impl CustomizeConnection<SqliteConnection, r2d2::Error> for SqlitePragmas {
    fn on_acquire(&self, conn: &mut SqliteConnection) -> Result<(), r2d2::Error> {
        conn.batch_execute(&format!(
            "PRAGMA foreign_keys = ON; PRAGMA busy_timeout = {};",
            self.busy_timeout_ms
        ))
        .map_err(r2d2::Error::QueryError)
    }
}

/// Initialize a connection pool and bring the schema up to date
pub fn init_pool(database_url: &str) -> SqliteResult<ConnectionPool> {
    debug!("Initializing connection pool for: {}", database_url);

    if let Some(parent) = Path::new(database_url).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent).map_err(SqliteRepositoryError::IoError)?;
        }
    }

    let manager = ConnectionManager::<SqliteConnection>::new(database_url);
    let pool = r2d2::Pool::builder()
        .max_size(8)
        .connection_customizer(Box::new(SqlitePragmas::default()))
        .build(manager)
        .map_err(|e| SqliteRepositoryError::ConnectionPoolError(e.to_string()))?;

    run_pending_migrations(&pool, database_url)?;

    info!("Connection pool initialized successfully");
    Ok(pool)
}

fn has_bookmarks(conn: &mut SqliteConnection) -> bool {
    use crate::infrastructure::repositories::sqlite::schema::bookmarks::dsl;
    use diesel::prelude::*;

    match dsl::bookmarks.count().get_result::<i64>(conn) {
        Ok(n) => n > 0,
        Err(e) => {
            debug!("Bookmarks table not readable, treating database as empty: {}", e);
            false
        }
    }
}

fn backup_path(db_path: &Path) -> Option<std::path::PathBuf> {
    let file_name = db_path.file_name()?.to_string_lossy().to_string();
    let date_suffix = Local::now().format("%Y%m%d").to_string();
    let backup_name = match file_name.rfind('.') {
        Some(ext_pos) => {
            let (name, ext) = file_name.split_at(ext_pos);
            format!("{}_backup_{}{}", name, date_suffix, ext)
        }
        None => format!("{}_backup_{}", file_name, date_suffix),
    };
    Some(db_path.with_file_name(backup_name))
}

/// Run any pending database migrations, copying a database that holds
/// bookmarks aside first
#[instrument(level = "info", skip(pool))]
pub fn run_pending_migrations(pool: &ConnectionPool, database_url: &str) -> SqliteResult<()> {
    let mut conn = pool
        .get()
        .map_err(|e| SqliteRepositoryError::ConnectionPoolError(e.to_string()))?;

    let pending = pending_names(&mut *conn)?;

    if pending.is_empty() {
        debug!("No pending migrations to run");
        return Ok(());
    }

    for name in &pending {
        info!("Pending migration: {}", name);
    }

    let db_path = Path::new(database_url);
    if db_path.exists() && has_bookmarks(&mut conn) {
        let backup = backup_path(db_path).ok_or_else(|| {
            SqliteRepositoryError::OperationFailed(
                "Could not determine database filename for backup".to_string(),
            )
        })?;
        fs::copy(db_path, &backup).map_err(SqliteRepositoryError::IoError)?;
        info!("Backup created at: {}", backup.display());
    } else {
        debug!("Skipping backup for database without bookmarks");
    }

    apply_pending(&mut *conn)?;

    info!("Migrations completed successfully");
    Ok(())
}
