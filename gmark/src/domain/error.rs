// gmark/src/domain/error.rs
use crate::domain::bookmark::BookmarkBuilderError;
use crate::domain::category::CategoryBuilderError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Invalid owner: {0}")]
    InvalidOwner(String),

    #[error("Invalid content source: {0}")]
    InvalidContentSource(String),

    #[error("Invalid content reference: {0}")]
    InvalidContentRef(String),

    #[error("Invalid bookmark: {0}")]
    InvalidBookmark(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Invalid cursor: {0}")]
    InvalidCursor(String),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// A write tried to relate rows owned by different users.
    #[error("Ownership violation: {0}")]
    OwnershipViolation(String),

    #[error("Category is not editable: {0}")]
    ImmutableCategory(String),

    #[error("Bookmark already exists: {0}")]
    BookmarkExists(String),

    #[error("Bookmark not found: {0}")]
    BookmarkNotFound(String),

    #[error("Category not found: {0}")]
    CategoryNotFound(String),

    #[error("Repository error: {0}")]
    RepositoryError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    /// Prefix the message with `context`, keeping the variant where it carries a message.
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        let context = context.into();
        match self {
            DomainError::InvalidOwner(msg) => {
                DomainError::InvalidOwner(format!("{}: {}", context, msg))
            }
            DomainError::InvalidCategory(msg) => {
                DomainError::InvalidCategory(format!("{}: {}", context, msg))
            }
            DomainError::OwnershipViolation(msg) => {
                DomainError::OwnershipViolation(format!("{}: {}", context, msg))
            }
            DomainError::RepositoryError(msg) => {
                DomainError::RepositoryError(format!("{}: {}", context, msg))
            }
            DomainError::Other(msg) => DomainError::Other(format!("{}: {}", context, msg)),
            err => err,
        }
    }

    /// Caller-side mistakes: malformed input or a rejected cross-owner write.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            DomainError::InvalidOwner(_)
                | DomainError::InvalidContentSource(_)
                | DomainError::InvalidContentRef(_)
                | DomainError::InvalidBookmark(_)
                | DomainError::InvalidCategory(_)
                | DomainError::InvalidCursor(_)
                | DomainError::InvalidQuery(_)
                | DomainError::OwnershipViolation(_)
                | DomainError::ImmutableCategory(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            DomainError::BookmarkNotFound(_) | DomainError::CategoryNotFound(_)
        )
    }
}

impl From<BookmarkBuilderError> for DomainError {
    fn from(e: BookmarkBuilderError) -> Self {
        DomainError::InvalidBookmark(e.to_string())
    }
}

impl From<CategoryBuilderError> for DomainError {
    fn from(e: CategoryBuilderError) -> Self {
        DomainError::InvalidCategory(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_ownership_violation_when_context_added_then_variant_is_kept() {
        let err = DomainError::OwnershipViolation(
            "bookmark and category must belong to the same user".to_string(),
        )
        .context("sync categories");

        assert!(err.is_validation());
        assert_eq!(
            err.to_string(),
            "Ownership violation: sync categories: bookmark and category must belong to the same user"
        );
    }

    #[test]
    fn given_not_found_errors_then_they_are_not_validation_errors() {
        let err = DomainError::CategoryNotFound("7".to_string());
        assert!(err.is_not_found());
        assert!(!err.is_validation());
    }
}
