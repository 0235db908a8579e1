//! Bearer-token payload codec.
//!
//! Only the middle segment is ever read. Header and signature are carried
//! through untouched and never checked; authenticity is the API's concern.

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig, STANDARD_NO_PAD};
use base64::Engine;
use tracing::debug;

use crate::claims::Claims;
use crate::error::{TokenError, TokenResult};

const MOCK_HEADER: &str = r#"{"alg":"none","typ":"JWT"}"#;
const MOCK_SIGNATURE: &str = "mock-signature";

// Lenient producers leave non-zero bits after the last full byte; browsers'
// `atob` ignores them, so the payload decoder does too.
const PAYLOAD_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

/// Decode the payload of `token`, or `None` if any step fails.
pub fn decode(token: &str) -> Option<Claims> {
    match try_decode(token) {
        Ok(claims) => Some(claims),
        Err(err) => {
            debug!(error = %err, "bearer token payload could not be decoded");
            None
        }
    }
}

pub fn try_decode(token: &str) -> TokenResult<Claims> {
    let segments: Vec<&str> = token.split('.').collect();
    if segments.len() != 3 || segments.iter().any(|segment| segment.is_empty()) {
        return Err(TokenError::Malformed);
    }

    let payload = repad(segments[1]);
    let bytes = PAYLOAD_ENGINE.decode(payload.as_bytes())?;
    let text = String::from_utf8(bytes)?;
    let claims = serde_json::from_str(&text)?;
    Ok(claims)
}

/// Issue an unsigned token carrying `claims`, padding stripped.
///
/// Used by local development logins and tests; nothing downstream can tell
/// it from a real token because nothing downstream checks signatures.
pub fn encode(claims: &Claims) -> TokenResult<String> {
    let payload = serde_json::to_vec(claims)?;
    Ok(format!(
        "{}.{}.{}",
        STANDARD_NO_PAD.encode(MOCK_HEADER),
        STANDARD_NO_PAD.encode(payload),
        STANDARD_NO_PAD.encode(MOCK_SIGNATURE),
    ))
}

// Producers strip `=` and may use the URL-safe alphabet; bring the segment
// back to padded standard base64.
fn repad(segment: &str) -> String {
    let pad_len = (4 - segment.len() % 4) % 4;
    let mut padded: String = segment
        .chars()
        .map(|ch| match ch {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    padded.extend(std::iter::repeat('=').take(pad_len));
    padded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claims::RoleClaim;
    use base64::engine::general_purpose::STANDARD;
    use serde_json::json;

    fn token_with_payload(payload: &str) -> String {
        format!(
            "{}.{}.sig",
            STANDARD_NO_PAD.encode(MOCK_HEADER),
            STANDARD_NO_PAD.encode(payload)
        )
    }

    #[test]
    fn repad_appends_missing_padding() {
        assert_eq!(repad("YQ"), "YQ==");
        assert_eq!(repad("YWI"), "YWI=");
        assert_eq!(repad("YWJj"), "YWJj");
    }

    #[test]
    fn repad_maps_url_safe_alphabet() {
        assert_eq!(repad("a-b_"), "a+b/");
    }

    #[test]
    fn decodes_stripped_payload() {
        let token = token_with_payload(r#"{"email":"khach@nova.vn","sub":"9","exp":1900000000}"#);
        let claims = decode(&token).expect("claims");
        assert_eq!(claims.email, "khach@nova.vn");
        assert_eq!(claims.subject_id, "9");
        assert_eq!(claims.expires_at, 1_900_000_000);
    }

    #[test]
    fn decodes_padded_payload() {
        let payload = STANDARD.encode(r#"{"sub":"1"}"#);
        assert!(payload.ends_with('='));
        let token = format!("h.{payload}.s");
        assert_eq!(decode(&token).map(|c| c.subject_id), Some("1".to_string()));
    }

    #[test]
    fn tolerates_non_zero_trailing_bits() {
        // `eyJzdWIiOiIxIn0` with its final sextet's spare bits set.
        let claims = decode("aA.eyJzdWIiOiIxIn1.cw").expect("claims");
        assert_eq!(claims.subject_id, "1");
    }

    #[test]
    fn header_and_signature_are_never_inspected() {
        let payload = STANDARD_NO_PAD.encode(r#"{"sub":"1"}"#);
        let token = format!("!!not-base64!!.{payload}.???");
        assert!(decode(&token).is_some());
    }

    #[test]
    fn rejects_wrong_segment_counts() {
        for token in ["", "abc", "a.b", "a.b.c.d", "a..c", ".b.c", "a.b."] {
            let err = try_decode(token).expect_err("should reject");
            assert!(matches!(err, TokenError::Malformed), "{token}");
        }
    }

    #[test]
    fn reports_each_failure_stage() {
        assert!(matches!(try_decode("h.*&^.s"), Err(TokenError::Base64(_))));

        let invalid_utf8 = STANDARD_NO_PAD.encode([0xffu8, 0xfe, 0xfd]);
        assert!(matches!(
            try_decode(&format!("h.{invalid_utf8}.s")),
            Err(TokenError::Utf8(_))
        ));

        let not_json = STANDARD_NO_PAD.encode("not json");
        assert!(matches!(
            try_decode(&format!("h.{not_json}.s")),
            Err(TokenError::Json(_))
        ));
    }

    #[test]
    fn non_object_payload_is_rejected() {
        assert!(decode(&token_with_payload("[1,2,3]")).is_none());
        assert!(decode(&token_with_payload("\"text\"")).is_none());
    }

    #[test]
    fn encode_produces_three_unpadded_segments() {
        let claims = Claims::new("a@nova.vn", "5", 100)
            .with_role(RoleClaim::Many(vec!["customer".into(), "Shop".into()]))
            .with_shop_id("3");
        let token = encode(&claims).expect("encode");

        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);
        assert!(segments.iter().all(|segment| !segment.contains('=')));

        let payload = STANDARD.decode(repad(segments[1])).expect("payload");
        let value: serde_json::Value = serde_json::from_slice(&payload).expect("json");
        assert_eq!(value["ShopId"], json!("3"));
        assert_eq!(value["role"], json!(["customer", "Shop"]));
        assert_eq!(decode(&token), Some(claims));
    }
}
