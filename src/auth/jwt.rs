use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StaffRole {
    /// Creates invites, sees event dashboards, may authorize re-entry.
    Organizer,
    /// Scans guests in at the door.
    Door,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub role: StaffRole,
    pub exp: i64,
    pub iat: i64,
}

pub fn create_token(
    staff_name: &str,
    role: StaffRole,
    valid_for_hours: i64,
    secret: &str,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = Utc::now();
    let claims = Claims {
        sub: staff_name.to_string(),
        role,
        exp: (now + Duration::hours(valid_for_hours)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|_| AppError::Unauthorized)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn issued_token_validates() {
        let token = create_token("sam", StaffRole::Door, 1, "s3cret").unwrap();
        let claims = validate_token(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, "sam");
        assert_eq!(claims.role, StaffRole::Door);
    }

    #[test]
    fn wrong_secret_or_expired_token_is_rejected() {
        let token = create_token("sam", StaffRole::Organizer, 1, "s3cret").unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AppError::Unauthorized)));

        let expired = create_token("sam", StaffRole::Organizer, -2, "s3cret").unwrap();
        assert!(matches!(validate_token(&expired, "s3cret"), Err(AppError::Unauthorized)));
    }
}
