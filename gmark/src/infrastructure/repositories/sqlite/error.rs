// gmark/src/infrastructure/repositories/sqlite/error.rs

use crate::domain::error::DomainError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SqliteRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] DieselError),

    #[error("Diesel connection error: {0}")]
    ConnectionError(#[from] diesel::ConnectionError),

    #[error("Connection pool error: {0}")]
    ConnectionPoolError(String),

    #[error("Bookmark not found with ID: {0}")]
    BookmarkNotFound(i32),

    #[error("Category not found with ID: {0}")]
    CategoryNotFound(i32),

    /// A composite foreign key rejected rows of different owners.
    #[error("Ownership constraint violated: {0}")]
    OwnershipViolation(String),

    #[error("Duplicate bookmark: {0}")]
    DuplicateBookmark(String),

    #[error("Failed to convert entity: {0}")]
    ConversionError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Migration error: {0}")]
    MigrationError(String),

    #[error("Repository operation failed: {0}")]
    OperationFailed(String),
}

pub type SqliteResult<T> = Result<T, SqliteRepositoryError>;

/// SQLite reports composite FK failures as "FOREIGN KEY constraint failed";
/// the message check covers builds that do not surface extended result codes.
pub fn is_foreign_key_violation(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => true,
        DieselError::DatabaseError(_, info) => info.message().contains("FOREIGN KEY constraint"),
        _ => false,
    }
}

pub fn is_unique_violation(err: &DieselError) -> bool {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => true,
        DieselError::DatabaseError(_, info) => info.message().contains("UNIQUE constraint"),
        _ => false,
    }
}

impl From<SqliteRepositoryError> for DomainError {
    fn from(err: SqliteRepositoryError) -> Self {
        match err {
            SqliteRepositoryError::BookmarkNotFound(id) => {
                DomainError::BookmarkNotFound(id.to_string())
            }
            SqliteRepositoryError::CategoryNotFound(id) => {
                DomainError::CategoryNotFound(id.to_string())
            }
            SqliteRepositoryError::OwnershipViolation(msg) => DomainError::OwnershipViolation(msg),
            SqliteRepositoryError::DuplicateBookmark(msg) => DomainError::BookmarkExists(msg),
            SqliteRepositoryError::DatabaseError(diesel_err) => match diesel_err {
                DieselError::NotFound => {
                    DomainError::RepositoryError("Resource not found".to_string())
                }
                DieselError::DatabaseError(_, info) => {
                    DomainError::RepositoryError(format!("Database error: {}", info.message()))
                }
                _ => DomainError::RepositoryError(format!("Database error: {}", diesel_err)),
            },
            SqliteRepositoryError::ConnectionError(e) => {
                DomainError::RepositoryError(format!("Connection error: {}", e))
            }
            SqliteRepositoryError::ConnectionPoolError(e) => {
                DomainError::RepositoryError(format!("Connection pool error: {}", e))
            }
            SqliteRepositoryError::ConversionError(e) => {
                DomainError::RepositoryError(format!("Data conversion error: {}", e))
            }
            SqliteRepositoryError::IoError(e) => DomainError::Io(e),
            SqliteRepositoryError::MigrationError(e) => {
                DomainError::RepositoryError(format!("Migration error: {}", e))
            }
            SqliteRepositoryError::OperationFailed(e) => DomainError::RepositoryError(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_ownership_violation_then_maps_to_domain_validation() {
        let err: DomainError = SqliteRepositoryError::OwnershipViolation(
            "bookmark and category must belong to the same user".to_string(),
        )
        .into();
        assert!(matches!(err, DomainError::OwnershipViolation(_)));
        assert!(err.is_validation());
    }

    #[test]
    fn given_not_found_then_maps_to_domain_not_found() {
        let err: DomainError = SqliteRepositoryError::CategoryNotFound(3).into();
        assert!(err.is_not_found());
    }

    #[test]
    fn given_plain_not_found_then_is_no_constraint_violation() {
        assert!(!is_foreign_key_violation(&DieselError::NotFound));
        assert!(!is_unique_violation(&DieselError::NotFound));
    }
}
