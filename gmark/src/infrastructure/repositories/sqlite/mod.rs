pub mod bookmark_repository;
pub mod category_repository;
pub mod connection;
pub mod error;
pub mod migration;
pub mod model;
pub mod schema;

pub use bookmark_repository::SqliteBookmarkRepository;
pub use category_repository::SqliteCategoryRepository;
