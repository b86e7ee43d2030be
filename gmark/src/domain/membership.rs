// gmark/src/domain/membership.rs
use chrono::{DateTime, Utc};

/// Places one bookmark into one category. `owner_id` is never taken from a
/// caller: the store copies it from the bookmark row on insert, and both
/// foreign keys include it.
#[derive(Debug, Clone, PartialEq)]
pub struct Membership {
    pub bookmark_id: i32,
    pub category_id: i32,
    pub owner_id: String,
    pub position: i32,
    pub added_at: DateTime<Utc>,
}
