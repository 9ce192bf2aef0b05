//! HTTP server exposing the coach and speech gateways

mod error;
mod handlers;
mod router;

pub use error::ApiError;
pub use router::{AppState, build_router, serve};
