//! The endpoint contract: request enum, JSON bodies and the handler that
//! maps service results and errors onto status codes.
pub mod dto;
pub mod handler;
pub mod request;

pub use handler::ApiHandler;
pub use request::{ApiRequest, ApiResponse, Method};
