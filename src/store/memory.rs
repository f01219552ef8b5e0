use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::InviteError;
use crate::models::invite::{Invite, InviteId};

// The map lock only guards membership; each record has its own mutex.
#[derive(Clone, Default)]
pub struct MemoryStore {
    records: Arc<RwLock<HashMap<InviteId, Arc<Mutex<Invite>>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, invite: Invite) -> Result<Invite, InviteError> {
        let mut records = self.records.write();
        if records.contains_key(&invite.id) {
            return Err(InviteError::Storage(format!(
                "invite {} already exists",
                invite.id
            )));
        }
        records.insert(invite.id, Arc::new(Mutex::new(invite.clone())));
        Ok(invite)
    }

    pub fn get(&self, id: InviteId) -> Result<Invite, InviteError> {
        let record = self.record(id)?;
        let invite = record.lock().clone();
        Ok(invite)
    }

    pub fn update<T, F>(&self, id: InviteId, mutator: F) -> Result<(Invite, T), InviteError>
    where
        F: FnOnce(&mut Invite) -> Result<T, InviteError>,
    {
        let record = self.record(id)?;
        let mut current = record.lock();
        let mut draft = current.clone();
        let out = mutator(&mut draft)?;
        *current = draft.clone();
        Ok((draft, out))
    }

    pub fn list_by_event(&self, event_id: &str) -> Vec<Invite> {
        let records: Vec<_> = self.records.read().values().cloned().collect();
        let mut invites: Vec<Invite> = records
            .iter()
            .map(|record| record.lock().clone())
            .filter(|invite| invite.event_id == event_id)
            .collect();
        invites.sort_by_key(|invite| invite.created_at);
        invites
    }

    fn record(&self, id: InviteId) -> Result<Arc<Mutex<Invite>>, InviteError> {
        self.records
            .read()
            .get(&id)
            .cloned()
            .ok_or(InviteError::NotFound)
    }
}
