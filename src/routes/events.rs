use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::AppState;
use crate::auth::middleware::StaffUser;
use crate::error::AppError;
use crate::models::invite::{AttendanceSummary, InviteDetails};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/events/{event_id}/invites", get(list_invites))
        .route("/api/events/{event_id}/attendance", get(attendance))
}

#[derive(Debug, Serialize)]
struct InviteListResponse {
    invites: Vec<InviteDetails>,
}

async fn list_invites(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(event_id): Path<String>,
) -> Result<Json<InviteListResponse>, AppError> {
    staff.require_organizer()?;
    let invites = state.engine.list_event_invites(&event_id).await?;
    Ok(Json(InviteListResponse { invites }))
}

async fn attendance(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(event_id): Path<String>,
) -> Result<Json<AttendanceSummary>, AppError> {
    staff.require_organizer()?;
    Ok(Json(state.engine.attendance(&event_id).await?))
}
