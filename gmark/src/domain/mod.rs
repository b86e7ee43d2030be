pub mod bookmark;
pub mod category;
pub mod content;
pub mod error;
pub mod membership;
pub mod owner;
pub mod repositories;
pub mod status;
