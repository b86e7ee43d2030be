// gmark/src/application/error.rs
use crate::domain::error::DomainError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApplicationError {
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Bookmark not found with ID {0}")]
    BookmarkNotFound(i32),

    #[error("Bookmark already exists: Id {0}: {1}")]
    BookmarkExists(i32, String),

    #[error("Category not found with ID {0}")]
    CategoryNotFound(i32),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{0}")]
    Other(String),
}

impl ApplicationError {
    pub fn context<C: Into<String>>(self, context: C) -> Self {
        match self {
            ApplicationError::Other(msg) => {
                ApplicationError::Other(format!("{}: {}", context.into(), msg))
            }
            ApplicationError::Domain(err) => ApplicationError::Domain(err.context(context)),
            ApplicationError::Validation(msg) => {
                ApplicationError::Validation(format!("{}: {}", context.into(), msg))
            }
            // keep the kind so that status mapping survives added context
            err => err,
        }
    }

    /// Errors the caller can fix by changing the request
    pub fn is_validation(&self) -> bool {
        match self {
            ApplicationError::Validation(_) => true,
            ApplicationError::Domain(e) => e.is_validation(),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        match self {
            ApplicationError::BookmarkNotFound(_) | ApplicationError::CategoryNotFound(_) => true,
            ApplicationError::Domain(e) => e.is_not_found(),
            _ => false,
        }
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            ApplicationError::BookmarkExists(..)
                | ApplicationError::Domain(DomainError::BookmarkExists(_))
        )
    }

    /// The bare reason, without the layer prefixes of `Display`.
    pub fn reason(&self) -> String {
        match self {
            ApplicationError::Domain(DomainError::OwnershipViolation(msg))
            | ApplicationError::Validation(msg)
            | ApplicationError::Other(msg) => msg.clone(),
            err => err.to_string(),
        }
    }
}

impl From<std::io::Error> for ApplicationError {
    fn from(err: std::io::Error) -> Self {
        ApplicationError::Domain(DomainError::Io(err))
    }
}

pub type ApplicationResult<T> = Result<T, ApplicationError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_ownership_violation_then_reason_is_unprefixed() {
        let err = ApplicationError::from(DomainError::OwnershipViolation(
            "bookmark and category must belong to the same user".to_string(),
        ));
        assert!(err.is_validation());
        assert_eq!(
            err.reason(),
            "bookmark and category must belong to the same user"
        );
    }

    #[test]
    fn given_context_then_kind_is_kept() {
        let err = ApplicationError::BookmarkNotFound(3).context("delete");
        assert!(err.is_not_found());

        let err = ApplicationError::BookmarkExists(1, "1:items".to_string()).context("add");
        assert!(err.is_conflict());

        let err = ApplicationError::from(DomainError::BookmarkExists("x".to_string()));
        assert!(err.is_conflict());
        assert!(!err.is_validation());
    }
}
