// gmark/src/domain/owner.rs
use crate::domain::error::{DomainError, DomainResult};

const MAX_OWNER_LEN: usize = 128;

/// Owner ids scope every row; they are opaque but must be non-blank single tokens.
pub fn validate_owner(owner_id: &str) -> DomainResult<()> {
    if owner_id.trim().is_empty() {
        return Err(DomainError::InvalidOwner(
            "owner id cannot be empty".to_string(),
        ));
    }
    if owner_id.len() > MAX_OWNER_LEN {
        return Err(DomainError::InvalidOwner(format!(
            "owner id longer than {} characters",
            MAX_OWNER_LEN
        )));
    }
    if owner_id.chars().any(char::is_whitespace) {
        return Err(DomainError::InvalidOwner(format!(
            "owner id '{}' contains whitespace",
            owner_id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_owner() {
        assert!(validate_owner("user-1").is_ok());
        assert!(validate_owner("").is_err());
        assert!(validate_owner("   ").is_err());
        assert!(validate_owner("two words").is_err());
        assert!(validate_owner(&"x".repeat(129)).is_err());
    }
}
