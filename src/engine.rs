//! The single surface API handlers and the CLI talk to.
//!
//! The engine adds no rules of its own; it fixes the order in which the
//! components run (decode before lookup, lookup before RSVP or check-in).

use crate::checkin::{CheckInCoordinator, Scan};
use crate::error::InviteError;
use crate::models::invite::{
    AttendanceSummary, CheckInRequest, CheckInResponse, CreateInviteRequest,
    CreateInviteResponse, Invite, InviteDetails, InviteId, SubmitRsvpRequest,
    SubmitRsvpResponse,
};
use crate::qr::QrCodec;
use crate::rsvp::RsvpProcessor;
use crate::store::InviteStore;

/// How the door identified the invite.
#[derive(Debug, Clone)]
pub enum CheckInTarget {
    Id(InviteId),
    Code(String),
}

#[derive(Clone)]
pub struct InviteLifecycleEngine {
    store: InviteStore,
    codec: QrCodec,
    rsvp: RsvpProcessor,
    door: CheckInCoordinator,
    public_base_url: String,
}

impl InviteLifecycleEngine {
    pub fn new(store: InviteStore, codec: QrCodec, public_base_url: &str) -> Self {
        Self {
            rsvp: RsvpProcessor::new(store.clone()),
            door: CheckInCoordinator::new(store.clone()),
            store,
            codec,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn store(&self) -> &InviteStore {
        &self.store
    }

    pub fn codec(&self) -> &QrCodec {
        &self.codec
    }

    pub async fn create_invite(
        &self,
        request: CreateInviteRequest,
    ) -> Result<CreateInviteResponse, InviteError> {
        let invite = self
            .store
            .create(
                &request.event_id,
                &request.guest_name,
                &request.phone,
                request.allowed_plus_ones,
            )
            .await?;

        tracing::info!(invite_id = %invite.id, event_id = %invite.event_id, "invite created");

        let base = &self.public_base_url;
        Ok(CreateInviteResponse {
            invite_id: invite.id,
            qr_code: self.codec.encode(invite.id),
            qr_code_url: format!("{base}/api/invites/{}/qr", invite.id),
            rsvp_url: format!("{base}/rsvp?inviteId={}", invite.id),
        })
    }

    pub async fn get_invite_details(&self, invite_id: InviteId) -> Result<InviteDetails, InviteError> {
        let invite = self.store.get(invite_id).await?;
        Ok(InviteDetails::from(&invite))
    }

    pub async fn qr_code(&self, invite_id: InviteId) -> Result<String, InviteError> {
        let invite = self.store.get(invite_id).await?;
        Ok(self.codec.encode(invite.id))
    }

    pub async fn submit_rsvp(
        &self,
        invite_id: InviteId,
        request: SubmitRsvpRequest,
    ) -> Result<SubmitRsvpResponse, InviteError> {
        let confirmation = self
            .rsvp
            .submit(
                invite_id,
                request.attending,
                request.plus_ones,
                request.parking_required,
            )
            .await?;
        Ok(confirmation.into())
    }

    pub async fn decode_and_lookup(&self, code: &str) -> Result<Invite, InviteError> {
        let invite_id = self.codec.decode(code)?;
        self.store.get(invite_id).await
    }

    /// `allow_reentry` must only be set once the caller has been authorized
    /// for it; the request's own `reentry` flag is not consulted here.
    pub async fn check_in(
        &self,
        target: CheckInTarget,
        request: CheckInRequest,
        allow_reentry: bool,
    ) -> Result<CheckInResponse, InviteError> {
        let invite_id = match target {
            CheckInTarget::Id(id) => id,
            CheckInTarget::Code(code) => self.decode_and_lookup(&code).await?.id,
        };

        let party = request.party();
        let scan = Scan {
            scanned_at: request.scanned_at,
            scanned_by: request.scanned_by,
        };
        self.door.admit(invite_id, party, scan, allow_reentry).await
    }

    pub async fn list_event_invites(&self, event_id: &str) -> Result<Vec<InviteDetails>, InviteError> {
        let invites = self.store.list_by_event(event_id).await?;
        Ok(invites.iter().map(InviteDetails::from).collect())
    }

    pub async fn attendance(&self, event_id: &str) -> Result<AttendanceSummary, InviteError> {
        let invites = self.store.list_by_event(event_id).await?;
        Ok(AttendanceSummary::tally(event_id, &invites))
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::models::invite::{AdmissionKind, PlusOne, RsvpStatus};

    fn engine() -> InviteLifecycleEngine {
        InviteLifecycleEngine::new(
            InviteStore::memory(),
            QrCodec::new("engine-test"),
            "https://invites.example/",
        )
    }

    fn create(allowed: i64) -> CreateInviteRequest {
        CreateInviteRequest {
            event_id: "gala-2026".into(),
            guest_name: "Ada Lovelace".into(),
            phone: "+44 20 7946 0000".into(),
            allowed_plus_ones: allowed,
        }
    }

    fn rsvp(attending: bool, names: &[&str]) -> SubmitRsvpRequest {
        SubmitRsvpRequest {
            attending,
            plus_ones: names
                .iter()
                .map(|n| PlusOne { name: n.to_string(), phone: String::new() })
                .collect(),
            parking_required: false,
        }
    }

    fn door(plus_one_index: Option<usize>) -> CheckInRequest {
        CheckInRequest {
            scanned_at: Utc::now(),
            scanned_by: "door-1".into(),
            plus_one_index,
            reentry: false,
        }
    }

    #[tokio::test]
    async fn full_party_check_in_by_scanned_code() {
        let engine = engine();
        let created = engine.create_invite(create(2)).await.unwrap();
        assert_eq!(
            created.rsvp_url,
            format!("https://invites.example/rsvp?inviteId={}", created.invite_id)
        );

        engine
            .submit_rsvp(created.invite_id, rsvp(true, &["Bob", "Cy"]))
            .await
            .unwrap();

        let code = CheckInTarget::Code(created.qr_code.clone());
        engine.check_in(code.clone(), door(None), false).await.unwrap();
        engine.check_in(code.clone(), door(Some(0)), false).await.unwrap();
        let last = engine.check_in(code.clone(), door(Some(1)), false).await.unwrap();
        assert_eq!(last.checked_in_count, 3);

        let err = engine.check_in(code, door(Some(0)), false).await.unwrap_err();
        assert_eq!(err.kind(), "already_checked_in");
    }

    #[tokio::test]
    async fn over_capacity_rsvp_leaves_invite_pending() {
        let engine = engine();
        let created = engine.create_invite(create(1)).await.unwrap();

        let err = engine
            .submit_rsvp(created.invite_id, rsvp(true, &["Bob", "Cy"]))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "capacity_exceeded");

        let details = engine.get_invite_details(created.invite_id).await.unwrap();
        assert_eq!(details.rsvp_status, RsvpStatus::Pending);
    }

    #[tokio::test]
    async fn declined_invite_cannot_check_in() {
        let engine = engine();
        let created = engine.create_invite(create(2)).await.unwrap();

        let response = engine
            .submit_rsvp(created.invite_id, rsvp(false, &["Bob"]))
            .await
            .unwrap();
        assert_eq!(response.rsvp_status, RsvpStatus::Declined);
        assert_eq!(response.guest_count, 0);

        let details = engine.get_invite_details(created.invite_id).await.unwrap();
        assert!(details.plus_ones.is_empty());

        let err = engine
            .check_in(CheckInTarget::Id(created.invite_id), door(None), false)
            .await
            .unwrap_err();
        assert_eq!(err, InviteError::NotAccepted);
    }

    #[tokio::test]
    async fn tampered_code_is_malformed_not_missing() {
        let engine = engine();
        let created = engine.create_invite(create(0)).await.unwrap();

        let mut tampered = created.qr_code.clone();
        let last = tampered.pop().unwrap();
        tampered.push(if last == '0' { '1' } else { '0' });

        let err = engine.decode_and_lookup(&tampered).await.unwrap_err();
        assert_eq!(err.kind(), "malformed_code");

        // A well-formed code for an invite that was never stored.
        let stranger = engine.codec().encode(InviteId::new());
        assert_eq!(
            engine.decode_and_lookup(&stranger).await.unwrap_err(),
            InviteError::NotFound
        );
    }

    #[tokio::test]
    async fn reentry_needs_explicit_permission() {
        let engine = engine();
        let created = engine.create_invite(create(0)).await.unwrap();
        engine.submit_rsvp(created.invite_id, rsvp(true, &[])).await.unwrap();

        let target = CheckInTarget::Id(created.invite_id);
        engine.check_in(target.clone(), door(None), false).await.unwrap();

        let mut asked = door(None);
        asked.reentry = true;
        let err = engine.check_in(target.clone(), asked, false).await.unwrap_err();
        assert_eq!(err.kind(), "already_checked_in");

        let allowed = engine.check_in(target, door(None), true).await.unwrap();
        assert_eq!(allowed.kind, AdmissionKind::ReEntry);
    }

    #[tokio::test]
    async fn attendance_reflects_check_ins() {
        let engine = engine();
        let a = engine.create_invite(create(1)).await.unwrap();
        let b = engine.create_invite(create(0)).await.unwrap();
        engine.submit_rsvp(a.invite_id, rsvp(true, &["Bob"])).await.unwrap();
        engine.submit_rsvp(b.invite_id, rsvp(false, &[])).await.unwrap();
        engine
            .check_in(CheckInTarget::Id(a.invite_id), door(None), false)
            .await
            .unwrap();

        let summary = engine.attendance("gala-2026").await.unwrap();
        assert_eq!(summary.invites, 2);
        assert_eq!(summary.expected_guests, 2);
        assert_eq!(summary.checked_in, 1);
        assert_eq!(engine.list_event_invites("gala-2026").await.unwrap().len(), 2);
    }
}
