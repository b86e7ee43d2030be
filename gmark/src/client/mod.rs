// gmark/src/client/mod.rs
//! Client side of the endpoint contract: typed calls, the shared result
//! cache with its invalidation rules, the batch status front-end, the
//! optimistic bookmark projection and the per-view pagination memo.
pub mod api;
pub mod cache;
pub mod clock;
pub mod error;
pub mod gallery;
pub mod invalidation;
pub mod keys;
pub mod optimistic;
pub mod pagination;
pub mod resolver;
pub mod transport;
pub mod view;

pub use api::ApiClient;
pub use cache::QueryCache;
pub use gallery::GalleryClient;
pub use resolver::BatchStatusResolver;
pub use transport::{HttpTransport, LocalTransport, Transport};
