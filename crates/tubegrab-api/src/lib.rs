//! Axum HTTP API server.
//!
//! This crate provides:
//! - Video info lookup with normalized, video-first format lists
//! - A streaming download proxy towards the media origin
//! - The single-page client UI
//! - Security headers, request IDs and Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::{ApiConfig, ResolverBackend};
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
