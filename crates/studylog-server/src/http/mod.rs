//! HTTP surface: public verification and the authenticated certificate API.

mod error;
mod extract;
mod pages;
pub mod routes;

pub use error::ApiError;
pub use routes::{AppState, build_router};
