use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store = state.engine.store();
    let ok = store.is_healthy().await;
    Json(serde_json::json!({
        "status": if ok { "ok" } else { "degraded" },
        "store": store.backend_name(),
    }))
}
