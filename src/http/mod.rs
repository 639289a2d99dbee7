//! # HTTP API
//!
//! JSON over HTTP on top of a [`BookingStore`]. All errors leave through
//! [`ApiError`], so every endpoint shares one response shape.

pub mod error;
pub mod routes;
pub mod server;

use std::sync::Arc;

use crate::engine::BookingStore;

pub use error::{ApiError, ApiResult};
pub use server::{HttpServer, build_router};

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn BookingStore>,
}

impl AppState {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }
}
