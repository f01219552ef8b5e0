use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Opaque, immutable invite identifier. Serialized as a hyphenated UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InviteId(pub Uuid);

impl InviteId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for InviteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for InviteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for InviteId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "rsvp_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum RsvpStatus {
    Pending,
    Accepted,
    Declined,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlusOne {
    pub name: String,
    #[serde(default)]
    pub phone: String,
}

/// Who is being admitted: the invitee or one plus-one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Party {
    Principal,
    PlusOne { index: usize },
}

impl fmt::Display for Party {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Principal => write!(f, "principal"),
            Self::PlusOne { index } => write!(f, "plus-one #{index}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionKind {
    Admission,
    ReEntry,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdmissionState {
    NotAdmitted,
    PartiallyAdmitted,
    FullyAdmitted,
}

/// One line of the append-only door log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInEntry {
    pub party: Party,
    pub kind: AdmissionKind,
    pub scanned_at: DateTime<Utc>,
    pub scanned_by: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invite {
    pub id: InviteId,
    pub event_id: String,
    pub guest_name: String,
    pub phone: String,
    pub allowed_plus_ones: u32,
    pub rsvp_status: RsvpStatus,
    pub plus_ones: Vec<PlusOne>,
    pub parking_required: bool,
    pub checked_in_principal: bool,
    /// Admission time per plus-one slot, parallel to `plus_ones`.
    pub plus_one_admissions: Vec<Option<DateTime<Utc>>>,
    pub check_ins: Vec<CheckInEntry>,
    pub created_at: DateTime<Utc>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl Invite {
    pub fn new(event_id: String, guest_name: String, phone: String, allowed_plus_ones: u32) -> Self {
        Self {
            id: InviteId::new(),
            event_id,
            guest_name,
            phone,
            allowed_plus_ones,
            rsvp_status: RsvpStatus::Pending,
            plus_ones: Vec::new(),
            parking_required: false,
            checked_in_principal: false,
            plus_one_admissions: Vec::new(),
            check_ins: Vec::new(),
            created_at: Utc::now(),
            responded_at: None,
        }
    }

    pub fn checked_in_plus_ones(&self) -> usize {
        self.plus_one_admissions.iter().filter(|a| a.is_some()).count()
    }

    /// Principal (0/1) plus admitted plus-ones. Re-entries are not counted.
    pub fn checked_in_count(&self) -> usize {
        usize::from(self.checked_in_principal) + self.checked_in_plus_ones()
    }

    pub fn party_size(&self) -> usize {
        match self.rsvp_status {
            RsvpStatus::Accepted => 1 + self.plus_ones.len(),
            _ => 0,
        }
    }

    pub fn admission_state(&self) -> AdmissionState {
        let admitted = self.checked_in_count();
        if admitted == 0 {
            AdmissionState::NotAdmitted
        } else if admitted == self.party_size() {
            AdmissionState::FullyAdmitted
        } else {
            AdmissionState::PartiallyAdmitted
        }
    }
}

// --- Request bodies ---

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteRequest {
    pub event_id: String,
    pub guest_name: String,
    pub phone: String,
    pub allowed_plus_ones: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRsvpRequest {
    pub attending: bool,
    #[serde(default)]
    pub plus_ones: Vec<PlusOne>,
    #[serde(default)]
    pub parking_required: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub scanned_at: DateTime<Utc>,
    pub scanned_by: String,
    #[serde(default)]
    pub plus_one_index: Option<usize>,
    #[serde(default)]
    pub reentry: bool,
}

impl CheckInRequest {
    pub fn party(&self) -> Party {
        match self.plus_one_index {
            Some(index) => Party::PlusOne { index },
            None => Party::Principal,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanCheckInRequest {
    pub code: String,
    #[serde(flatten)]
    pub check_in: CheckInRequest,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateInviteResponse {
    pub invite_id: InviteId,
    pub qr_code: String,
    pub qr_code_url: String,
    pub rsvp_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InviteDetails {
    pub invite_id: InviteId,
    pub event_id: String,
    pub guest_name: String,
    pub phone: String,
    pub allowed_plus_ones: u32,
    pub rsvp_status: RsvpStatus,
    pub plus_ones: Vec<PlusOne>,
    pub parking_required: bool,
    pub checked_in: bool,
    pub checked_in_plus_ones: usize,
    pub admission_state: AdmissionState,
}

impl From<&Invite> for InviteDetails {
    fn from(invite: &Invite) -> Self {
        Self {
            invite_id: invite.id,
            event_id: invite.event_id.clone(),
            guest_name: invite.guest_name.clone(),
            phone: invite.phone.clone(),
            allowed_plus_ones: invite.allowed_plus_ones,
            rsvp_status: invite.rsvp_status,
            plus_ones: invite.plus_ones.clone(),
            parking_required: invite.parking_required,
            checked_in: invite.checked_in_principal,
            checked_in_plus_ones: invite.checked_in_plus_ones(),
            admission_state: invite.admission_state(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RsvpConfirmation {
    pub invite_id: InviteId,
    pub rsvp_status: RsvpStatus,
    pub guest_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitRsvpResponse {
    pub success: bool,
    pub message: String,
    pub invite_id: InviteId,
    pub rsvp_status: RsvpStatus,
    pub guest_count: usize,
}

impl From<RsvpConfirmation> for SubmitRsvpResponse {
    fn from(c: RsvpConfirmation) -> Self {
        let message = match c.rsvp_status {
            RsvpStatus::Accepted => format!("RSVP confirmed for {} guest(s)", c.guest_count),
            _ => "RSVP recorded: not attending".to_string(),
        };
        Self {
            success: true,
            message,
            invite_id: c.invite_id,
            rsvp_status: c.rsvp_status,
            guest_count: c.guest_count,
        }
    }
}

/// Result of a successful admission, with counts taken after the mutation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInResponse {
    pub success: bool,
    pub invite_id: InviteId,
    pub guest_name: String,
    pub allowed_plus_ones: u32,
    pub checked_in_count: usize,
    pub party: Party,
    pub kind: AdmissionKind,
    pub admission_state: AdmissionState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceSummary {
    pub event_id: String,
    pub invites: usize,
    pub pending: usize,
    pub accepted: usize,
    pub declined: usize,
    pub expected_guests: usize,
    pub checked_in: usize,
    pub parking_spaces: usize,
}

impl AttendanceSummary {
    pub fn tally(event_id: &str, invites: &[Invite]) -> Self {
        let mut summary = Self {
            event_id: event_id.to_string(),
            invites: invites.len(),
            pending: 0,
            accepted: 0,
            declined: 0,
            expected_guests: 0,
            checked_in: 0,
            parking_spaces: 0,
        };
        for invite in invites {
            match invite.rsvp_status {
                RsvpStatus::Pending => summary.pending += 1,
                RsvpStatus::Declined => summary.declined += 1,
                RsvpStatus::Accepted => {
                    summary.accepted += 1;
                    summary.expected_guests += invite.party_size();
                    summary.checked_in += invite.checked_in_count();
                    if invite.parking_required {
                        summary.parking_spaces += 1;
                    }
                }
            }
        }
        summary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invite_id_parses_its_display_form() {
        let id = InviteId::new();
        let parsed: InviteId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
        assert!("not-a-uuid".parse::<InviteId>().is_err());
    }

    #[test]
    fn admission_state_follows_slots() {
        let mut invite = Invite::new("evt".into(), "Ada".into(), "555".into(), 1);
        invite.rsvp_status = RsvpStatus::Accepted;
        invite.plus_ones = vec![PlusOne { name: "Bob".into(), phone: String::new() }];
        invite.plus_one_admissions = vec![None];
        assert_eq!(invite.admission_state(), AdmissionState::NotAdmitted);

        invite.checked_in_principal = true;
        assert_eq!(invite.admission_state(), AdmissionState::PartiallyAdmitted);

        invite.plus_one_admissions[0] = Some(Utc::now());
        assert_eq!(invite.admission_state(), AdmissionState::FullyAdmitted);
        assert_eq!(invite.checked_in_count(), 2);
    }

    #[test]
    fn check_in_body_defaults_to_principal() {
        let body: CheckInRequest = serde_json::from_str(
            r#"{"scannedAt":"2026-05-01T18:00:00Z","scannedBy":"door-1"}"#,
        )
        .unwrap();
        assert_eq!(body.party(), Party::Principal);
        assert!(!body.reentry);
    }

    #[test]
    fn attendance_tally_ignores_declined_guests() {
        let mut accepted = Invite::new("evt".into(), "Ada".into(), "1".into(), 2);
        accepted.rsvp_status = RsvpStatus::Accepted;
        accepted.parking_required = true;
        accepted.plus_ones = vec![PlusOne { name: "Bob".into(), phone: String::new() }];
        accepted.plus_one_admissions = vec![None];
        accepted.checked_in_principal = true;

        let mut declined = Invite::new("evt".into(), "Cy".into(), "2".into(), 0);
        declined.rsvp_status = RsvpStatus::Declined;

        let pending = Invite::new("evt".into(), "Di".into(), "3".into(), 0);

        let summary = AttendanceSummary::tally("evt", &[accepted, declined, pending]);
        assert_eq!(summary.invites, 3);
        assert_eq!(summary.accepted, 1);
        assert_eq!(summary.declined, 1);
        assert_eq!(summary.pending, 1);
        assert_eq!(summary.expected_guests, 2);
        assert_eq!(summary.checked_in, 1);
        assert_eq!(summary.parking_spaces, 1);
    }
}
