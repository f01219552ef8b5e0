use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::error::InviteError;
use crate::models::invite::{CheckInEntry, Invite, InviteId, PlusOne, RsvpStatus};

const COLUMNS: &str = "id, event_id, guest_name, phone, allowed_plus_ones, rsvp_status, plus_ones, \
     parking_required, checked_in_principal, plus_one_admissions, check_ins, created_at, responded_at";

#[derive(Debug, FromRow)]
struct InviteRow {
    id: Uuid,
    event_id: String,
    guest_name: String,
    phone: String,
    allowed_plus_ones: i32,
    rsvp_status: RsvpStatus,
    plus_ones: Json<Vec<PlusOne>>,
    parking_required: bool,
    checked_in_principal: bool,
    plus_one_admissions: Json<Vec<Option<DateTime<Utc>>>>,
    check_ins: Json<Vec<CheckInEntry>>,
    created_at: DateTime<Utc>,
    responded_at: Option<DateTime<Utc>>,
}

impl TryFrom<InviteRow> for Invite {
    type Error = InviteError;

    fn try_from(row: InviteRow) -> Result<Self, Self::Error> {
        let allowed_plus_ones = u32::try_from(row.allowed_plus_ones).map_err(|_| {
            InviteError::Storage(format!("invite {} has a negative plus-one limit", row.id))
        })?;
        Ok(Self {
            id: InviteId(row.id),
            event_id: row.event_id,
            guest_name: row.guest_name,
            phone: row.phone,
            allowed_plus_ones,
            rsvp_status: row.rsvp_status,
            plus_ones: row.plus_ones.0,
            parking_required: row.parking_required,
            checked_in_principal: row.checked_in_principal,
            plus_one_admissions: row.plus_one_admissions.0,
            check_ins: row.check_ins.0,
            created_at: row.created_at,
            responded_at: row.responded_at,
        })
    }
}

/// Postgres-backed store. Row locks (`SELECT ... FOR UPDATE`) serialize
/// writers on the same invite; other rows are unaffected.
#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub async fn insert(&self, invite: Invite) -> Result<Invite, InviteError> {
        let allowed = i32::try_from(invite.allowed_plus_ones)
            .map_err(|_| InviteError::InvalidInput("allowedPlusOnes is too large".into()))?;

        sqlx::query(
            "INSERT INTO invites (id, event_id, guest_name, phone, allowed_plus_ones, rsvp_status,
                                  plus_ones, parking_required, checked_in_principal,
                                  plus_one_admissions, check_ins, created_at, responded_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(invite.id.0)
        .bind(&invite.event_id)
        .bind(&invite.guest_name)
        .bind(&invite.phone)
        .bind(allowed)
        .bind(invite.rsvp_status)
        .bind(Json(&invite.plus_ones))
        .bind(invite.parking_required)
        .bind(invite.checked_in_principal)
        .bind(Json(&invite.plus_one_admissions))
        .bind(Json(&invite.check_ins))
        .bind(invite.created_at)
        .bind(invite.responded_at)
        .execute(&self.db)
        .await?;

        Ok(invite)
    }

    pub async fn get(&self, id: InviteId) -> Result<Invite, InviteError> {
        let sql = format!("SELECT {COLUMNS} FROM invites WHERE id = $1");
        let row = sqlx::query_as::<_, InviteRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.db)
            .await?
            .ok_or(InviteError::NotFound)?;
        Invite::try_from(row)
    }

    pub async fn update<T, F>(&self, id: InviteId, mutator: F) -> Result<(Invite, T), InviteError>
    where
        F: FnOnce(&mut Invite) -> Result<T, InviteError>,
    {
        let mut tx = self.db.begin().await?;

        let sql = format!("SELECT {COLUMNS} FROM invites WHERE id = $1 FOR UPDATE");
        let row = sqlx::query_as::<_, InviteRow>(&sql)
            .bind(id.0)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(InviteError::NotFound)?;

        let mut invite = Invite::try_from(row)?;
        // Dropping the transaction on a rejected mutation rolls it back.
        let out = mutator(&mut invite)?;

        sqlx::query(
            "UPDATE invites
             SET rsvp_status = $2, plus_ones = $3, parking_required = $4,
                 checked_in_principal = $5, plus_one_admissions = $6, check_ins = $7,
                 responded_at = $8
             WHERE id = $1",
        )
        .bind(id.0)
        .bind(invite.rsvp_status)
        .bind(Json(&invite.plus_ones))
        .bind(invite.parking_required)
        .bind(invite.checked_in_principal)
        .bind(Json(&invite.plus_one_admissions))
        .bind(Json(&invite.check_ins))
        .bind(invite.responded_at)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok((invite, out))
    }

    pub async fn list_by_event(&self, event_id: &str) -> Result<Vec<Invite>, InviteError> {
        let sql = format!("SELECT {COLUMNS} FROM invites WHERE event_id = $1 ORDER BY created_at");
        sqlx::query_as::<_, InviteRow>(&sql)
            .bind(event_id)
            .fetch_all(&self.db)
            .await?
            .into_iter()
            .map(Invite::try_from)
            .collect()
    }

    pub async fn ping(&self) -> bool {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.db)
            .await
            .is_ok()
    }
}
