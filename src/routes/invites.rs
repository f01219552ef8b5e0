use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::WithRejection;
use serde_json::{Value, json};

use crate::AppState;
use crate::auth::middleware::StaffUser;
use crate::engine::CheckInTarget;
use crate::error::{AppError, InviteError};
use crate::models::invite::{
    CheckInRequest, CheckInResponse, CreateInviteRequest, CreateInviteResponse, InviteDetails,
    InviteId, ScanCheckInRequest, SubmitRsvpRequest, SubmitRsvpResponse,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/invites", post(create_invite))
        .route("/api/invites/{id}", get(get_invite))
        .route("/api/invites/{id}/qr", get(get_qr_code))
        .route("/api/invites/{id}/rsvp", post(submit_rsvp))
        .route("/api/invites/{id}/checkin", post(check_in))
        .route("/api/checkin/scan", post(check_in_by_code))
}

/// Path ids that are not UUIDs cannot name an invite.
fn parse_id(raw: &str) -> Result<InviteId, AppError> {
    raw.parse().map_err(|_| AppError::Invite(InviteError::NotFound))
}

/// Re-entry is only honoured for organizers. Anyone else asking for it gets a
/// normal admission, and 403 if the guest turns out to be inside already.
async fn admit(
    state: &AppState,
    staff: &StaffUser,
    target: CheckInTarget,
    body: CheckInRequest,
) -> Result<CheckInResponse, AppError> {
    let denied_reentry = body.reentry && !staff.is_organizer();
    let allow_reentry = body.reentry && staff.is_organizer();
    match state.engine.check_in(target, body, allow_reentry).await {
        Err(InviteError::AlreadyCheckedIn(_)) if denied_reentry => Err(AppError::Forbidden),
        result => Ok(result?),
    }
}

async fn create_invite(
    State(state): State<AppState>,
    staff: StaffUser,
    WithRejection(Json(body), _): WithRejection<Json<CreateInviteRequest>, AppError>,
) -> Result<Json<CreateInviteResponse>, AppError> {
    staff.require_organizer()?;
    Ok(Json(state.engine.create_invite(body).await?))
}

async fn get_invite(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<InviteDetails>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.engine.get_invite_details(id).await?))
}

async fn get_qr_code(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let id = parse_id(&id)?;
    let code = state.engine.qr_code(id).await?;
    Ok(Json(json!({ "inviteId": id, "code": code })))
}

async fn submit_rsvp(
    State(state): State<AppState>,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<SubmitRsvpRequest>, AppError>,
) -> Result<Json<SubmitRsvpResponse>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(state.engine.submit_rsvp(id, body).await?))
}

async fn check_in(
    State(state): State<AppState>,
    staff: StaffUser,
    Path(id): Path<String>,
    WithRejection(Json(body), _): WithRejection<Json<CheckInRequest>, AppError>,
) -> Result<Json<CheckInResponse>, AppError> {
    let id = parse_id(&id)?;
    Ok(Json(admit(&state, &staff, CheckInTarget::Id(id), body).await?))
}

async fn check_in_by_code(
    State(state): State<AppState>,
    staff: StaffUser,
    WithRejection(Json(body), _): WithRejection<Json<ScanCheckInRequest>, AppError>,
) -> Result<Json<CheckInResponse>, AppError> {
    let target = CheckInTarget::Code(body.code);
    Ok(Json(admit(&state, &staff, target, body.check_in).await?))
}
