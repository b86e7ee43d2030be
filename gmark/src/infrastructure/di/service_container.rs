// gmark/src/infrastructure/di/service_container.rs
use crate::api::handler::ApiHandler;
use crate::application::error::{ApplicationError, ApplicationResult};
use crate::application::services::bookmark_service::BookmarkService;
use crate::application::services::category_service::CategoryService;
use crate::application::{BookmarkServiceImpl, CategoryServiceImpl};
use crate::config::Settings;
use crate::infrastructure::repositories::sqlite::connection::{init_pool, ConnectionPool};
use crate::infrastructure::repositories::sqlite::{
    SqliteBookmarkRepository, SqliteCategoryRepository,
};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, instrument};

/// Production service container - single source of truth for service creation
pub struct ServiceContainer {
    pub bookmark_repository: Arc<SqliteBookmarkRepository>,
    pub category_repository: Arc<SqliteCategoryRepository>,
    pub bookmark_service: Arc<dyn BookmarkService>,
    pub category_service: Arc<dyn CategoryService>,
    page_size: usize,
}

impl ServiceContainer {
    /// Open the configured database, which must already exist.
    #[instrument(skip_all, level = "debug", fields(db_url = %config.db_url))]
    pub fn new(config: &Settings) -> ApplicationResult<Self> {
        let pool = Self::open_pool(&config.db_url)?;
        Ok(Self::with_pool(pool, config))
    }

    /// Wire all services over an existing pool
    pub fn with_pool(pool: ConnectionPool, config: &Settings) -> Self {
        let bookmark_repository = Arc::new(SqliteBookmarkRepository::new(pool.clone()));
        let category_repository = Arc::new(SqliteCategoryRepository::new(pool));

        let bookmark_service: Arc<dyn BookmarkService> = Arc::new(
            BookmarkServiceImpl::new(bookmark_repository.clone())
                .with_max_batch_items(config.max_batch_items),
        );
        let category_service: Arc<dyn CategoryService> = Arc::new(CategoryServiceImpl::new(
            category_repository.clone(),
            bookmark_repository.clone(),
        ));

        Self {
            bookmark_repository,
            category_repository,
            bookmark_service,
            category_service,
            page_size: config.page_size,
        }
    }

    fn open_pool(db_url: &str) -> ApplicationResult<ConnectionPool> {
        if !Path::new(db_url).exists() {
            return Err(ApplicationError::Other(format!(
                "Database not found at '{}'. Set GMARK_DB_URL or create one with 'gmark create-db <path>'",
                db_url
            )));
        }

        debug!("Opening database {}", db_url);
        init_pool(db_url).map_err(|e| {
            ApplicationError::Other(format!("Failed to open SQLite database: {}", e))
        })
    }

    pub fn api_handler(&self) -> ApiHandler {
        ApiHandler::new(self.bookmark_service.clone(), self.category_service.clone())
            .with_page_size(self.page_size)
    }
}

impl std::fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("bookmark_repository", &"Arc<SqliteBookmarkRepository>")
            .field("category_repository", &"Arc<SqliteCategoryRepository>")
            .field("bookmark_service", &"Arc<dyn BookmarkService>")
            .field("category_service", &"Arc<dyn CategoryService>")
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::testing::TestDb;

    #[test]
    fn given_missing_database_then_error_names_create_db() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings {
            db_url: dir.path().join("absent.db").to_string_lossy().to_string(),
            ..Settings::default()
        };

        let err = ServiceContainer::new(&settings).unwrap_err();
        assert!(err.to_string().contains("create-db"));
    }

    #[test]
    fn given_existing_database_then_services_wired() {
        let db = TestDb::new();
        let settings = Settings {
            db_url: db.url(),
            page_size: 5,
            ..Settings::default()
        };

        let container = ServiceContainer::new(&settings).unwrap();
        assert!(format!("{:?}", container).contains("page_size: 5"));
        assert!(container
            .category_service
            .list_categories("alice")
            .unwrap()
            .iter()
            .any(|c| c.category.is_system));
    }
}
