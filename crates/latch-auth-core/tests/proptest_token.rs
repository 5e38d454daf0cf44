//! Property-based tests for token issuance, verification and fingerprints
//!
//! These tests verify:
//! - Issued tokens verify with the same principal and type
//! - Malformed input never panics and never verifies
//! - Any edit to the signed payload is detected
//! - Fingerprints are deterministic and fixed-width

mod common;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::Duration as ChronoDuration;
use common::{HASHING_SECRET, SIGNING_SECRET};
use latch_auth_core::{AuthConfig, CredentialHasher, ManualClock, TokenCodec, TokenError};
use latch_types::{PrincipalId, TokenType};
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;

fn codec() -> (TokenCodec, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(common::start()));
    let config = AuthConfig::try_new("latch", SIGNING_SECRET, HASHING_SECRET).unwrap();
    (TokenCodec::new(&config, clock.clone()).unwrap(), clock)
}

// ============================================================================
// Strategies
// ============================================================================

fn arb_token_type() -> impl Strategy<Value = TokenType> {
    prop_oneof![Just(TokenType::Access), Just(TokenType::Renewal)]
}

/// Principal IDs as the database hands them out
fn arb_principal_id() -> impl Strategy<Value = PrincipalId> {
    (1i64..i64::MAX).prop_map(PrincipalId)
}

/// Lifetimes from one second to a year
fn arb_ttl() -> impl Strategy<Value = u64> {
    1u64..31_536_000u64
}

/// Strings that are not tokens signed by the test key
fn arb_malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just(".".to_string()),
        Just("..".to_string()),
        "[a-zA-Z0-9_-]{0,64}",
        "[a-zA-Z0-9_-]{1,40}\\.[a-zA-Z0-9_-]{1,40}\\.[a-zA-Z0-9_-]{0,60}",
        "[!@#$%^&*() ]{1,30}",
        any::<Vec<u8>>().prop_map(|bytes| {
            format!(
                "eyJhbGciOiJIUzI1NiJ9.{}.{}",
                URL_SAFE_NO_PAD.encode(&bytes),
                URL_SAFE_NO_PAD.encode([0u8; 32])
            )
        }),
    ]
}

// ============================================================================
// Round-trip and type isolation
// ============================================================================

proptest! {
    /// Property: verify(issue(p, t, ttl)) returns p and t with a non-empty rotation ID
    #[test]
    fn prop_issue_then_verify(
        principal_id in arb_principal_id(),
        token_type in arb_token_type(),
        ttl in arb_ttl(),
    ) {
        let (codec, _) = codec();
        let issued = codec.issue(principal_id, token_type, Duration::from_secs(ttl)).unwrap();
        let claims = codec.verify(&issued.token).unwrap();

        prop_assert_eq!(claims.principal_id, principal_id);
        prop_assert_eq!(claims.token_type, token_type);
        prop_assert!(!claims.rotation_id.is_empty());
        prop_assert_eq!(&claims, &issued.claims);
    }

    /// Property: the type claim survives verification, so callers can tell the two apart
    #[test]
    fn prop_types_never_cross(principal_id in arb_principal_id(), ttl in arb_ttl()) {
        let (codec, _) = codec();
        let access = codec.issue(principal_id, TokenType::Access, Duration::from_secs(ttl)).unwrap();
        let renewal = codec.issue(principal_id, TokenType::Renewal, Duration::from_secs(ttl)).unwrap();

        prop_assert_ne!(codec.verify(&access.token).unwrap().token_type, TokenType::Renewal);
        prop_assert_ne!(codec.verify(&renewal.token).unwrap().token_type, TokenType::Access);
    }

    /// Property: valid through exp, expired one second later
    #[test]
    fn prop_expiry_boundary(token_type in arb_token_type(), ttl in 2u64..1_000_000u64) {
        let (codec, clock) = codec();
        let issued = codec.issue(PrincipalId(1), token_type, Duration::from_secs(ttl)).unwrap();

        clock.advance(ChronoDuration::seconds(ttl as i64 - 1));
        prop_assert!(codec.verify(&issued.token).is_ok());

        clock.advance(ChronoDuration::seconds(2));
        prop_assert_eq!(codec.verify(&issued.token), Err(TokenError::Expired));
        prop_assert!(codec.verify_allow_expired(&issued.token).is_ok());
    }

    /// Property: every issuance gets its own rotation ID
    #[test]
    fn prop_rotation_ids_unique(principal_id in arb_principal_id(), token_type in arb_token_type()) {
        let (codec, _) = codec();
        let a = codec.issue(principal_id, token_type, Duration::from_secs(60)).unwrap();
        let b = codec.issue(principal_id, token_type, Duration::from_secs(60)).unwrap();
        prop_assert_ne!(a.claims.rotation_id, b.claims.rotation_id);
        prop_assert_ne!(a.token, b.token);
    }
}

// ============================================================================
// Malformed input and tampering
// ============================================================================

proptest! {
    /// Property: malformed tokens never panic and never verify
    #[test]
    fn prop_malformed_token_rejected(raw in arb_malformed_token()) {
        let (codec, _) = codec();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| codec.verify(&raw)));
        prop_assert!(result.is_ok(), "verify panicked for {:?}", raw);
        prop_assert!(result.unwrap().is_err());
    }

    /// Property: changing any payload character invalidates the token
    #[test]
    fn prop_payload_tampering_detected(
        principal_id in arb_principal_id(),
        token_type in arb_token_type(),
        position in any::<prop::sample::Index>(),
        replacement in prop::sample::select(b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_".to_vec()),
    ) {
        let (codec, _) = codec();
        let issued = codec.issue(principal_id, token_type, Duration::from_secs(60)).unwrap();

        let parts: Vec<&str> = issued.token.split('.').collect();
        prop_assert_eq!(parts.len(), 3);

        // Leave the last character alone; it may only carry padding bits
        let mut payload = parts[1].as_bytes().to_vec();
        let index = position.index(payload.len() - 1);
        prop_assume!(payload[index] != replacement);
        payload[index] = replacement;
        let payload = String::from_utf8(payload).unwrap();

        let tampered = format!("{}.{}.{}", parts[0], payload, parts[2]);
        prop_assert!(codec.verify(&tampered).is_err());
    }
}

// ============================================================================
// Fingerprints
// ============================================================================

proptest! {
    /// Property: fingerprints are deterministic 64-char lowercase hex
    #[test]
    fn prop_fingerprint_deterministic(token in ".{0,256}") {
        let hasher = CredentialHasher::new(HASHING_SECRET).unwrap();
        let a = hasher.fingerprint(&token);
        let b = hasher.fingerprint(&token);

        prop_assert_eq!(&a, &b);
        prop_assert_eq!(a.len(), CredentialHasher::FINGERPRINT_LEN);
        prop_assert!(a.bytes().all(|c| matches!(c, b'0'..=b'9' | b'a'..=b'f')));
    }

    /// Property: distinct tokens get distinct fingerprints
    #[test]
    fn prop_fingerprint_distinguishes(a in "[a-zA-Z0-9._-]{1,128}", b in "[a-zA-Z0-9._-]{1,128}") {
        prop_assume!(a != b);
        let hasher = CredentialHasher::new(HASHING_SECRET).unwrap();
        prop_assert_ne!(hasher.fingerprint(&a), hasher.fingerprint(&b));
    }
}
