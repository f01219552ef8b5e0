use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Failures of the invite lifecycle. Each variant names the condition that was
/// violated so callers can branch on it; none of them are worth retrying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InviteError {
    InvalidInput(String),
    NotFound,
    MalformedCode(String),
    AlreadySubmitted,
    NotAccepted,
    AlreadyCheckedIn(String),
    InvalidPlusOneIndex { index: usize, available: usize },
    CapacityExceeded { requested: usize, allowed: usize },
    Storage(String),
}

impl InviteError {
    /// Stable machine-readable discriminator sent alongside the message.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::NotFound => "not_found",
            Self::MalformedCode(_) => "malformed_code",
            Self::AlreadySubmitted => "already_submitted",
            Self::NotAccepted => "not_accepted",
            Self::AlreadyCheckedIn(_) => "already_checked_in",
            Self::InvalidPlusOneIndex { .. } => "invalid_plus_one_index",
            Self::CapacityExceeded { .. } => "capacity_exceeded",
            Self::Storage(_) => "storage",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidInput(_) | Self::MalformedCode(_) | Self::InvalidPlusOneIndex { .. } => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::AlreadySubmitted | Self::NotAccepted | Self::AlreadyCheckedIn(_) => {
                StatusCode::CONFLICT
            }
            Self::CapacityExceeded { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for InviteError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidInput(msg) => write!(f, "{msg}"),
            Self::NotFound => write!(f, "Invite not found"),
            Self::MalformedCode(msg) => write!(f, "Invalid invite code: {msg}"),
            Self::AlreadySubmitted => write!(f, "RSVP has already been submitted"),
            Self::NotAccepted => write!(f, "Invite has not been accepted"),
            Self::AlreadyCheckedIn(who) => write!(f, "{who} is already checked in"),
            Self::InvalidPlusOneIndex { index, available } => {
                write!(f, "Plus-one #{index} does not exist ({available} on this invite)")
            }
            Self::CapacityExceeded { requested, allowed } => {
                write!(f, "{requested} plus-ones requested but only {allowed} allowed")
            }
            Self::Storage(msg) => write!(f, "Storage error: {msg}"),
        }
    }
}

impl std::error::Error for InviteError {}

impl From<sqlx::Error> for InviteError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage(e.to_string())
    }
}

#[derive(Debug)]
pub enum AppError {
    Unauthorized,
    Forbidden,
    Invite(InviteError),
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unauthorized => write!(f, "Authentication required"),
            Self::Forbidden => write!(f, "Insufficient permissions"),
            Self::Invite(e) => write!(f, "{e}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, kind, message) = match &self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "unauthorized", self.to_string()),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            Self::Invite(e @ InviteError::Storage(_)) => {
                tracing::error!("{e}");
                (
                    e.status(),
                    e.kind(),
                    "Internal server error".to_string(),
                )
            }
            Self::Invite(e) => (e.status(), e.kind(), e.to_string()),
        };

        if status.is_client_error() {
            tracing::warn!(status = status.as_u16(), kind, "{message}");
        }

        (status, Json(json!({ "error": message, "kind": kind }))).into_response()
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Invite(InviteError::InvalidInput(rejection.body_text()))
    }
}

impl From<InviteError> for AppError {
    fn from(e: InviteError) -> Self {
        Self::Invite(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejections_map_to_distinct_statuses() {
        let not_found = AppError::from(InviteError::NotFound).into_response();
        let malformed =
            AppError::from(InviteError::MalformedCode("bad tag".into())).into_response();
        let duplicate =
            AppError::from(InviteError::AlreadyCheckedIn("Ada".into())).into_response();
        let over = AppError::from(InviteError::CapacityExceeded { requested: 3, allowed: 1 })
            .into_response();

        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);
        assert_eq!(malformed.status(), StatusCode::BAD_REQUEST);
        assert_eq!(duplicate.status(), StatusCode::CONFLICT);
        assert_eq!(over.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn kinds_are_unique() {
        let all = [
            InviteError::InvalidInput(String::new()),
            InviteError::NotFound,
            InviteError::MalformedCode(String::new()),
            InviteError::AlreadySubmitted,
            InviteError::NotAccepted,
            InviteError::AlreadyCheckedIn(String::new()),
            InviteError::InvalidPlusOneIndex { index: 0, available: 0 },
            InviteError::CapacityExceeded { requested: 0, allowed: 0 },
            InviteError::Storage(String::new()),
        ];
        let mut kinds: Vec<_> = all.iter().map(InviteError::kind).collect();
        kinds.sort_unstable();
        kinds.dedup();
        assert_eq!(kinds.len(), all.len());
    }
}
