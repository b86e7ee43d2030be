// src/util/testing.rs

use std::env;
use std::path::PathBuf;
use std::sync::OnceLock;
use tempfile::TempDir;
use tracing::{debug, info, instrument};
use tracing_subscriber::{
    filter::filter_fn,
    fmt::{self, format::FmtSpan},
    prelude::*,
    EnvFilter,
};

use crate::domain::category::{Category, NewCategory};
use crate::domain::repositories::repository::CategoryRepository;
use crate::infrastructure::repositories::sqlite::connection::{init_pool, ConnectionPool};
use crate::infrastructure::repositories::sqlite::{
    SqliteBookmarkRepository, SqliteCategoryRepository,
};

/// Global test configuration, initialized exactly once via OnceLock.
#[derive(Debug)]
pub struct TestEnv {
    pub started_at: chrono::DateTime<chrono::Utc>,
}

static TEST_ENV: OnceLock<TestEnv> = OnceLock::new();

/// Initializes logging for tests exactly once.
pub fn init_test_env() -> &'static TestEnv {
    TEST_ENV.get_or_init(|| {
        setup_test_logging();
        info!("Test environment initialized");
        TestEnv {
            started_at: chrono::Utc::now(),
        }
    })
}

/// Logging setup only runs once; subsequent calls do nothing if `tracing` is already set.
fn setup_test_logging() {
    if tracing::dispatcher::has_been_set() {
        debug!("Tracing subscriber already set");
        return;
    }

    let noisy_modules = ["diesel", "reqwest", "mio", "want", "hyper_util", "rustls"];
    let module_filter = filter_fn(move |metadata| {
        !noisy_modules
            .iter()
            .any(|name| metadata.target().starts_with(name))
    });

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let subscriber = tracing_subscriber::registry().with(
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_thread_names(false)
            .with_span_events(FmtSpan::CLOSE)
            .with_filter(module_filter)
            .with_filter(env_filter),
    );

    subscriber.try_init().unwrap_or_else(|e| {
        eprintln!("Error: Failed to set up logging: {}", e);
    });
}

/// Restores the `GMARK_*` environment variables on drop.
#[derive(Debug, Clone)]
pub struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    pub const VARS: [&'static str; 3] = ["GMARK_DB_URL", "GMARK_API_URL", "GMARK_PAGE_SIZE"];

    pub fn new() -> Self {
        Self {
            saved: Self::VARS
                .iter()
                .map(|name| (*name, env::var(name).ok()))
                .collect(),
        }
    }
}

impl Default for EnvGuard {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for EnvGuard {
    #[instrument(level = "trace")]
    fn drop(&mut self) {
        for (name, value) in &self.saved {
            match value {
                Some(v) => env::set_var(name, v),
                None => env::remove_var(name),
            }
        }
    }
}

/// A migrated database in its own temporary directory, removed on drop.
///
/// Pools need a file: every pooled `:memory:` connection would see its own
/// empty database.
#[derive(Debug)]
pub struct TestDb {
    pool: ConnectionPool,
    pub path: PathBuf,
    _dir: TempDir,
}

impl TestDb {
    #[allow(clippy::new_without_default)]
    pub fn new() -> Self {
        init_test_env();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("gmark.db");
        let pool = init_pool(&path.to_string_lossy()).expect("Failed to initialize test database");
        debug!("Test database at {}", path.display());
        Self {
            pool,
            path,
            _dir: dir,
        }
    }

    pub fn url(&self) -> String {
        self.path.to_string_lossy().to_string()
    }

    pub fn pool(&self) -> ConnectionPool {
        self.pool.clone()
    }

    pub fn bookmark_repository(&self) -> SqliteBookmarkRepository {
        SqliteBookmarkRepository::new(self.pool())
    }

    pub fn category_repository(&self) -> SqliteCategoryRepository {
        SqliteCategoryRepository::new(self.pool())
    }

    /// Inserts a top-level category and returns its id.
    pub fn insert_category(&self, owner_id: &str, name: &str) -> i32 {
        let mut category = Category::new(
            owner_id,
            NewCategory {
                name: name.to_string(),
                ..Default::default()
            },
        )
        .expect("Invalid test category");
        self.category_repository()
            .add(&mut category)
            .expect("Failed to insert test category");
        category.id.expect("Category without id after insert")
    }
}
