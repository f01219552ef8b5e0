//! Scannable invite codes.
//!
//! A code is `INV-<invite uuid as 32 hex>-<tag>`, where the tag is the first
//! four bytes of SHA-256 over the codec secret and the hex id. A scan that
//! fails to parse or carries the wrong tag is rejected here, before any store
//! lookup happens.

use constant_time_eq::constant_time_eq;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::error::InviteError;
use crate::models::invite::InviteId;

const PREFIX: &str = "INV";
const TAG_BYTES: usize = 4;

#[derive(Clone)]
pub struct QrCodec {
    secret: String,
}

impl QrCodec {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    pub fn encode(&self, invite_id: InviteId) -> String {
        let hex_id = invite_id.0.simple().to_string();
        let tag: String = self.tag(&hex_id).iter().map(|b| format!("{b:02x}")).collect();
        format!("{PREFIX}-{hex_id}-{tag}")
    }

    pub fn decode(&self, code: &str) -> Result<InviteId, InviteError> {
        let code = code.trim().to_ascii_lowercase();
        let mut parts = code.split('-');

        let (Some(prefix), Some(hex_id), Some(tag), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return Err(malformed("expected three segments"));
        };

        if !prefix.eq_ignore_ascii_case(PREFIX) {
            return Err(malformed("unknown prefix"));
        }
        if hex_id.len() != 32 || !hex_id.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(malformed("bad identifier"));
        }
        let Some(tag) = parse_tag(tag) else {
            return Err(malformed("bad integrity tag"));
        };
        if !constant_time_eq(&self.tag(hex_id), &tag) {
            return Err(malformed("integrity check failed"));
        }

        Uuid::try_parse(hex_id)
            .map(InviteId)
            .map_err(|_| malformed("bad identifier"))
    }

    fn tag(&self, hex_id: &str) -> [u8; TAG_BYTES] {
        let digest = Sha256::new()
            .chain_update(self.secret.as_bytes())
            .chain_update(b":")
            .chain_update(hex_id.as_bytes())
            .finalize();
        let mut tag = [0u8; TAG_BYTES];
        tag.copy_from_slice(&digest[..TAG_BYTES]);
        tag
    }
}

fn parse_tag(hex: &str) -> Option<[u8; TAG_BYTES]> {
    if hex.len() != TAG_BYTES * 2 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let mut tag = [0u8; TAG_BYTES];
    for (byte, pair) in tag.iter_mut().zip(hex.as_bytes().chunks(2)) {
        *byte = u8::from_str_radix(std::str::from_utf8(pair).ok()?, 16).ok()?;
    }
    Some(tag)
}

fn malformed(reason: &str) -> InviteError {
    InviteError::MalformedCode(reason.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn codec() -> QrCodec {
        QrCodec::new("test-secret")
    }

    #[test]
    fn decodes_what_it_encodes() {
        let id = InviteId::new();
        let code = codec().encode(id);
        assert!(code.starts_with("INV-"));
        assert_eq!(codec().decode(&code).unwrap(), id);
    }

    #[test]
    fn tolerates_case_and_whitespace() {
        let id = InviteId::new();
        let code = format!("  {}\n", codec().encode(id).to_uppercase());
        assert_eq!(codec().decode(&code).unwrap(), id);
    }

    #[test]
    fn rejects_foreign_codes() {
        for code in ["INVALID-QR-CODE", "INV-TEST-VALID-001", "", "INV--", "hello"] {
            assert!(
                matches!(codec().decode(code), Err(InviteError::MalformedCode(_))),
                "{code} should be malformed"
            );
        }
    }

    #[test]
    fn rejects_code_signed_with_other_secret() {
        let code = QrCodec::new("other").encode(InviteId::new());
        assert!(matches!(
            codec().decode(&code),
            Err(InviteError::MalformedCode(_))
        ));
    }

    #[test]
    fn rejects_non_hex_tag() {
        let code = codec().encode(InviteId::new());
        let (body, _) = code.rsplit_once('-').unwrap();
        for tag in ["zzzzzzzz", "0x12ab34", "éé1234"] {
            let forged = format!("{body}-{tag}");
            assert_eq!(
                codec().decode(&forged),
                Err(InviteError::MalformedCode("bad integrity tag".into())),
                "{forged}"
            );
        }
    }

    proptest! {
        #[test]
        fn truncated_codes_are_malformed(cut in 0usize..48) {
            let code = codec().encode(InviteId::new());
            let truncated = &code[..cut.min(code.len() - 1)];
            prop_assert!(matches!(codec().decode(truncated), Err(InviteError::MalformedCode(_))));
        }

        #[test]
        fn single_character_tampering_is_detected(pos in 4usize..45, replacement in "[0-9a-f]") {
            let code = codec().encode(InviteId::new());
            let original = &code[pos..pos + 1];
            prop_assume!(original != "-" && original != replacement.as_str());
            let mut tampered = code.clone();
            tampered.replace_range(pos..pos + 1, &replacement);
            prop_assert!(matches!(codec().decode(&tampered), Err(InviteError::MalformedCode(_))));
        }
    }
}
