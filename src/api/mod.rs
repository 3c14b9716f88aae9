//! API module
//!
//! HTTP API endpoints and middleware.

pub mod middleware;
pub mod routes;
pub mod session;

use std::sync::Arc;

use axum::Router;
use tower_http::trace::TraceLayer;

use crate::config::WebCredentials;
use crate::services::SubscriptionService;

use session::SessionStore;

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SubscriptionService>,
    pub sessions: Arc<SessionStore>,
    pub credentials: Arc<WebCredentials>,
}

impl AppState {
    pub fn new(service: Arc<SubscriptionService>, credentials: WebCredentials) -> Self {
        Self {
            service,
            sessions: Arc::new(SessionStore::new()),
            credentials: Arc::new(credentials),
        }
    }
}

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // Layers run bottom-up: logging -> session -> handler
    let protected_routes = routes::protected_router()
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::session_middleware,
        ))
        .layer(axum::middleware::from_fn(middleware::logging_middleware));

    routes::public_router()
        .layer(axum::middleware::from_fn(middleware::logging_middleware))
        .nest("/api", protected_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
