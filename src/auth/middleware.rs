use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum_extra::extract::CookieJar;

use crate::AppState;
use crate::error::AppError;

use super::jwt::{self, StaffRole};

const COOKIE_NAME: &str = "token";

/// Authenticated event staff, from a bearer token or the `token` cookie.
#[derive(Debug, Clone)]
pub struct StaffUser {
    pub name: String,
    pub role: StaffRole,
}

impl StaffUser {
    pub fn is_organizer(&self) -> bool {
        self.role == StaffRole::Organizer
    }

    pub fn require_organizer(&self) -> Result<(), AppError> {
        if self.is_organizer() {
            Ok(())
        } else {
            Err(AppError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for StaffUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let bearer = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(|t| t.trim().to_string());

        let token = match bearer {
            Some(token) => token,
            None => {
                let jar = CookieJar::from_request_parts(parts, state)
                    .await
                    .map_err(|_| AppError::Unauthorized)?;
                jar.get(COOKIE_NAME)
                    .map(|c| c.value().to_string())
                    .ok_or(AppError::Unauthorized)?
            }
        };

        let claims = jwt::validate_token(&token, &state.config.jwt_secret)?;

        Ok(StaffUser {
            name: claims.sub,
            role: claims.role,
        })
    }
}
