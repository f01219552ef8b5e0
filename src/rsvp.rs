use chrono::Utc;

use crate::error::InviteError;
use crate::models::invite::{Invite, InviteId, PlusOne, RsvpConfirmation, RsvpStatus};
use crate::store::InviteStore;

#[derive(Clone)]
pub struct RsvpProcessor {
    store: InviteStore,
}

impl RsvpProcessor {
    pub fn new(store: InviteStore) -> Self {
        Self { store }
    }

    pub async fn submit(
        &self,
        invite_id: InviteId,
        attending: bool,
        plus_ones: Vec<PlusOne>,
        parking_required: bool,
    ) -> Result<RsvpConfirmation, InviteError> {
        let (invite, confirmation) = self
            .store
            .update(invite_id, |invite| {
                apply(invite, attending, plus_ones, parking_required)
            })
            .await?;

        tracing::info!(
            invite_id = %invite.id,
            status = ?invite.rsvp_status,
            guest_count = confirmation.guest_count,
            "RSVP recorded"
        );
        Ok(confirmation)
    }
}

/// Moves a pending invite to accepted or declined.
///
/// Declining discards any plus-ones or parking request the caller sent.
pub fn apply(
    invite: &mut Invite,
    attending: bool,
    plus_ones: Vec<PlusOne>,
    parking_required: bool,
) -> Result<RsvpConfirmation, InviteError> {
    if invite.rsvp_status != RsvpStatus::Pending {
        return Err(InviteError::AlreadySubmitted);
    }

    if !attending {
        invite.rsvp_status = RsvpStatus::Declined;
        invite.plus_ones.clear();
        invite.plus_one_admissions.clear();
        invite.parking_required = false;
        invite.responded_at = Some(Utc::now());
        return Ok(RsvpConfirmation {
            invite_id: invite.id,
            rsvp_status: RsvpStatus::Declined,
            guest_count: 0,
        });
    }

    let allowed = invite.allowed_plus_ones as usize;
    if plus_ones.len() > allowed {
        return Err(InviteError::CapacityExceeded {
            requested: plus_ones.len(),
            allowed,
        });
    }

    let plus_ones: Vec<PlusOne> = plus_ones
        .into_iter()
        .map(|p| PlusOne {
            name: p.name.trim().to_string(),
            phone: p.phone.trim().to_string(),
        })
        .collect();
    if let Some(pos) = plus_ones.iter().position(|p| p.name.is_empty()) {
        return Err(InviteError::InvalidInput(format!(
            "plus-one #{pos} needs a name"
        )));
    }

    invite.rsvp_status = RsvpStatus::Accepted;
    invite.plus_one_admissions = vec![None; plus_ones.len()];
    invite.plus_ones = plus_ones;
    invite.parking_required = parking_required;
    invite.responded_at = Some(Utc::now());

    Ok(RsvpConfirmation {
        invite_id: invite.id,
        rsvp_status: RsvpStatus::Accepted,
        guest_count: 1 + invite.plus_ones.len(),
    })
}
