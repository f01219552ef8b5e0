use chrono::{DateTime, Utc};

use crate::error::InviteError;
use crate::models::invite::{
    AdmissionKind, CheckInEntry, CheckInResponse, Invite, InviteId, Party, RsvpStatus,
};
use crate::store::InviteStore;

#[derive(Debug, Clone)]
pub struct Scan {
    pub scanned_at: DateTime<Utc>,
    pub scanned_by: String,
}

/// Every admission runs inside one [`InviteStore::update`], so of two scans
/// of the same person exactly one wins.
#[derive(Clone)]
pub struct CheckInCoordinator {
    store: InviteStore,
}

impl CheckInCoordinator {
    pub fn new(store: InviteStore) -> Self {
        Self { store }
    }

    pub async fn admit_principal(
        &self,
        invite_id: InviteId,
        scan: Scan,
        allow_reentry: bool,
    ) -> Result<CheckInResponse, InviteError> {
        self.admit(invite_id, Party::Principal, scan, allow_reentry)
            .await
    }

    pub async fn admit_plus_one(
        &self,
        invite_id: InviteId,
        plus_one_index: usize,
        scan: Scan,
        allow_reentry: bool,
    ) -> Result<CheckInResponse, InviteError> {
        self.admit(
            invite_id,
            Party::PlusOne {
                index: plus_one_index,
            },
            scan,
            allow_reentry,
        )
        .await
    }

    pub async fn admit(
        &self,
        invite_id: InviteId,
        party: Party,
        scan: Scan,
        allow_reentry: bool,
    ) -> Result<CheckInResponse, InviteError> {
        let scan = Scan {
            scanned_by: scan.scanned_by.trim().to_string(),
            ..scan
        };
        if scan.scanned_by.is_empty() {
            return Err(InviteError::InvalidInput("scannedBy is required".into()));
        }

        let (invite, kind) = self
            .store
            .update(invite_id, |invite| match party {
                Party::Principal => record_principal(invite, &scan, allow_reentry),
                Party::PlusOne { index } => record_plus_one(invite, index, &scan, allow_reentry),
            })
            .await?;

        tracing::info!(
            invite_id = %invite.id,
            %party,
            ?kind,
            scanned_by = %scan.scanned_by,
            checked_in = invite.checked_in_count(),
            "admission recorded"
        );

        Ok(CheckInResponse {
            success: true,
            invite_id: invite.id,
            guest_name: invite.guest_name.clone(),
            allowed_plus_ones: invite.allowed_plus_ones,
            checked_in_count: invite.checked_in_count(),
            party,
            kind,
            admission_state: invite.admission_state(),
        })
    }
}

fn ensure_accepted(invite: &Invite) -> Result<(), InviteError> {
    if invite.rsvp_status == RsvpStatus::Accepted {
        Ok(())
    } else {
        Err(InviteError::NotAccepted)
    }
}

fn log_entry(invite: &mut Invite, party: Party, kind: AdmissionKind, scan: &Scan) {
    invite.check_ins.push(CheckInEntry {
        party,
        kind,
        scanned_at: scan.scanned_at,
        scanned_by: scan.scanned_by.clone(),
    });
}

pub fn record_principal(
    invite: &mut Invite,
    scan: &Scan,
    allow_reentry: bool,
) -> Result<AdmissionKind, InviteError> {
    ensure_accepted(invite)?;

    if invite.checked_in_principal {
        if !allow_reentry {
            return Err(InviteError::AlreadyCheckedIn(invite.guest_name.clone()));
        }
        log_entry(invite, Party::Principal, AdmissionKind::ReEntry, scan);
        return Ok(AdmissionKind::ReEntry);
    }

    invite.checked_in_principal = true;
    log_entry(invite, Party::Principal, AdmissionKind::Admission, scan);
    Ok(AdmissionKind::Admission)
}

pub fn record_plus_one(
    invite: &mut Invite,
    index: usize,
    scan: &Scan,
    allow_reentry: bool,
) -> Result<AdmissionKind, InviteError> {
    ensure_accepted(invite)?;

    let available = invite.plus_ones.len();
    if index >= available || index >= invite.plus_one_admissions.len() {
        return Err(InviteError::InvalidPlusOneIndex { index, available });
    }

    let party = Party::PlusOne { index };
    if invite.plus_one_admissions[index].is_some() {
        if !allow_reentry {
            return Err(InviteError::AlreadyCheckedIn(
                invite.plus_ones[index].name.clone(),
            ));
        }
        log_entry(invite, party, AdmissionKind::ReEntry, scan);
        return Ok(AdmissionKind::ReEntry);
    }

    if invite.checked_in_plus_ones() >= available {
        return Err(InviteError::CapacityExceeded {
            requested: invite.checked_in_plus_ones() + 1,
            allowed: available,
        });
    }

    invite.plus_one_admissions[index] = Some(scan.scanned_at);
    log_entry(invite, party, AdmissionKind::Admission, scan);
    Ok(AdmissionKind::Admission)
}
