pub mod auth;
pub mod checkin;
pub mod config;
pub mod engine;
pub mod error;
pub mod models;
pub mod qr;
pub mod routes;
pub mod rsvp;
pub mod store;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use config::Config;
use engine::InviteLifecycleEngine;

#[derive(Clone)]
pub struct AppState {
    pub engine: InviteLifecycleEngine,
    pub config: Arc<Config>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(routes::api_router())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
