mod memory;
mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

use crate::error::InviteError;
use crate::models::invite::{Invite, InviteId};

/// Updates to one invite are serialized; a rejected mutation persists nothing.
#[derive(Clone)]
pub enum InviteStore {
    Memory(MemoryStore),
    Postgres(PgStore),
}

impl InviteStore {
    pub fn memory() -> Self {
        Self::Memory(MemoryStore::new())
    }

    pub async fn create(
        &self,
        event_id: &str,
        guest_name: &str,
        phone: &str,
        allowed_plus_ones: i64,
    ) -> Result<Invite, InviteError> {
        let event_id = event_id.trim();
        let guest_name = guest_name.trim();
        let phone = phone.trim();

        if event_id.is_empty() {
            return Err(InviteError::InvalidInput("eventId is required".into()));
        }
        if guest_name.is_empty() {
            return Err(InviteError::InvalidInput("guestName is required".into()));
        }
        if phone.is_empty() {
            return Err(InviteError::InvalidInput("phone is required".into()));
        }
        let allowed_plus_ones = u32::try_from(allowed_plus_ones).map_err(|_| {
            InviteError::InvalidInput("allowedPlusOnes must be a non-negative integer".into())
        })?;

        let invite = Invite::new(
            event_id.to_string(),
            guest_name.to_string(),
            phone.to_string(),
            allowed_plus_ones,
        );

        match self {
            Self::Memory(s) => s.insert(invite),
            Self::Postgres(s) => s.insert(invite).await,
        }
    }

    pub async fn get(&self, id: InviteId) -> Result<Invite, InviteError> {
        match self {
            Self::Memory(s) => s.get(id),
            Self::Postgres(s) => s.get(id).await,
        }
    }

    pub async fn update<T, F>(&self, id: InviteId, mutator: F) -> Result<(Invite, T), InviteError>
    where
        F: FnOnce(&mut Invite) -> Result<T, InviteError>,
    {
        match self {
            Self::Memory(s) => s.update(id, mutator),
            Self::Postgres(s) => s.update(id, mutator).await,
        }
    }

    pub async fn list_by_event(&self, event_id: &str) -> Result<Vec<Invite>, InviteError> {
        match self {
            Self::Memory(s) => Ok(s.list_by_event(event_id)),
            Self::Postgres(s) => s.list_by_event(event_id).await,
        }
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            Self::Memory(_) => "memory",
            Self::Postgres(_) => "postgres",
        }
    }

    pub async fn is_healthy(&self) -> bool {
        match self {
            Self::Memory(_) => true,
            Self::Postgres(s) => s.ping().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invite::RsvpStatus;

    #[tokio::test]
    async fn create_starts_pending_with_no_check_ins() {
        let store = InviteStore::memory();
        let invite = store.create("evt", " Ada ", "555", 2).await.unwrap();

        assert_eq!(invite.guest_name, "Ada");
        assert_eq!(invite.rsvp_status, RsvpStatus::Pending);
        assert!(invite.plus_ones.is_empty());
        assert!(invite.check_ins.is_empty());
        assert!(!invite.checked_in_principal);
        assert_eq!(store.get(invite.id).await.unwrap(), invite);
    }

    #[tokio::test]
    async fn create_rejects_bad_input() {
        let store = InviteStore::memory();
        for (guest, phone, allowed) in [("", "555", 0), ("Ada", "  ", 0), ("Ada", "555", -1)] {
            let err = store.create("evt", guest, phone, allowed).await.unwrap_err();
            assert_eq!(err.kind(), "invalid_input");
        }
    }

    #[tokio::test]
    async fn ids_are_unique() {
        let store = InviteStore::memory();
        let a = store.create("evt", "Ada", "1", 0).await.unwrap();
        let b = store.create("evt", "Ada", "1", 0).await.unwrap();
        assert_ne!(a.id, b.id);
    }
}
