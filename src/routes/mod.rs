pub mod events;
pub mod health;
pub mod invites;

use axum::Router;
use crate::AppState;

pub fn api_router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(invites::router())
        .merge(events::router())
}
