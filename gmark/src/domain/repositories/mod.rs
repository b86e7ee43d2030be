pub mod cursor;
pub mod query;
pub mod repository;
