//! # Signed Bearer Tokens
//!
//! Compact three-segment tokens (`header.claims.signature`), each segment
//! base64url without padding, signed with HMAC-SHA256 over `header.claims`.
//!
//! ## Security Properties
//!
//! - **Stateless**: signature and expiration live in the token; validation
//!   needs no server-side lookup.
//! - **Fixed algorithm**: only `HS256` headers are accepted.
//! - **Constant-time verification**: `Mac::verify_slice`.
//! - **No revocation**: a token stays valid until `exp`. Roles are frozen at
//!   issuance and only change when a new token is issued.

use crate::CryptoError;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::collections::BTreeSet;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use zeroize::Zeroizing;

type HmacSha256 = Hmac<Sha256>;

/// Only supported signing algorithm.
pub const TOKEN_ALGORITHM: &str = "HS256";

/// Minimum shared secret length in bytes (256 bits for HS256).
pub const MIN_SECRET_LEN: usize = 32;

/// Claims carried by a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject identity (username).
    pub sub: String,
    /// Role claims frozen at issuance.
    #[serde(default)]
    pub roles: BTreeSet<String>,
    /// Issued-at, epoch seconds.
    pub iat: u64,
    /// Expiration, epoch seconds.
    pub exp: u64,
}

impl Claims {
    /// True when `now` is at or past the expiration.
    pub fn is_expired_at(&self, now: u64) -> bool {
        now >= self.exp
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Header {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

/// Issues and validates signed tokens under one shared secret and TTL.
pub struct TokenCodec {
    secret: Zeroizing<Vec<u8>>,
    ttl: Duration,
}

impl TokenCodec {
    /// Create a codec.
    ///
    /// # Errors
    ///
    /// `CryptoError::Configuration` if the secret is shorter than
    /// [`MIN_SECRET_LEN`] or the TTL is zero.
    pub fn new(secret: &[u8], ttl: Duration) -> Result<Self, CryptoError> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(CryptoError::Configuration(format!(
                "token secret must be at least {MIN_SECRET_LEN} bytes, got {}",
                secret.len()
            )));
        }
        if ttl.as_secs() == 0 {
            return Err(CryptoError::Configuration(
                "token TTL must be at least one second".into(),
            ));
        }
        Ok(Self {
            secret: Zeroizing::new(secret.to_vec()),
            ttl,
        })
    }

    /// Process-wide token lifetime.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a token for `subject` expiring at `now + ttl`.
    ///
    /// # Errors
    ///
    /// `CryptoError::EmptySubject` if `subject` is empty.
    pub fn issue<I, R>(&self, subject: &str, roles: I, now: u64) -> Result<String, CryptoError>
    where
        I: IntoIterator<Item = R>,
        R: Into<String>,
    {
        if subject.is_empty() {
            return Err(CryptoError::EmptySubject);
        }

        let claims = Claims {
            sub: subject.to_string(),
            roles: roles.into_iter().map(Into::into).collect(),
            iat: now,
            exp: now.saturating_add(self.ttl.as_secs()),
        };
        let header = Header {
            alg: TOKEN_ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        };

        let header_json =
            serde_json::to_vec(&header).map_err(|e| CryptoError::Serialization(e.to_string()))?;
        let claims_json =
            serde_json::to_vec(&claims).map_err(|e| CryptoError::Serialization(e.to_string()))?;

        let signing_input = format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(header_json),
            URL_SAFE_NO_PAD.encode(claims_json)
        );
        let signature = self.sign(signing_input.as_bytes())?;

        Ok(format!(
            "{signing_input}.{}",
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Verify and decode a token against the current wall clock.
    pub fn parse(&self, token: &str) -> Result<Claims, CryptoError> {
        self.parse_at(token, unix_now())
    }

    /// Verify and decode a token as of `now` (epoch seconds).
    ///
    /// Checks run in order: structure, signature, claims, expiration. A token
    /// with a valid signature and a past `exp` therefore always yields
    /// `Expired`.
    pub fn parse_at(&self, token: &str, now: u64) -> Result<Claims, CryptoError> {
        let mut segments = token.split('.');
        let (header_b64, claims_b64, signature_b64) =
            match (segments.next(), segments.next(), segments.next(), segments.next()) {
                (Some(h), Some(c), Some(s), None) => (h, c, s),
                _ => return Err(CryptoError::Malformed("expected three segments".into())),
            };

        let header: Header = decode_json(header_b64, "header")?;
        if header.alg != TOKEN_ALGORITHM {
            return Err(CryptoError::Malformed(format!(
                "unsupported algorithm {}",
                header.alg
            )));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature_b64)
            .map_err(|_| CryptoError::Malformed("signature is not base64url".into()))?;

        let mut mac = self.mac()?;
        mac.update(header_b64.as_bytes());
        mac.update(b".");
        mac.update(claims_b64.as_bytes());
        mac.verify_slice(&signature)
            .map_err(|_| CryptoError::BadSignature)?;

        let claims: Claims = decode_json(claims_b64, "claims")?;
        if claims.sub.is_empty() {
            return Err(CryptoError::Malformed("empty subject".into()));
        }
        if claims.is_expired_at(now) {
            return Err(CryptoError::Expired {
                expired_at: claims.exp,
                now,
            });
        }

        Ok(claims)
    }

    /// Subject of a valid token.
    pub fn subject_of(&self, token: &str) -> Result<String, CryptoError> {
        self.parse(token).map(|claims| claims.sub)
    }

    /// True iff the token is valid now and its subject is exactly `expected_subject`.
    pub fn is_valid_for(&self, token: &str, expected_subject: &str) -> bool {
        self.is_valid_for_at(token, expected_subject, unix_now())
    }

    /// [`TokenCodec::is_valid_for`] evaluated at `now`.
    pub fn is_valid_for_at(&self, token: &str, expected_subject: &str, now: u64) -> bool {
        matches!(self.parse_at(token, now), Ok(claims) if claims.sub == expected_subject)
    }

    fn mac(&self) -> Result<HmacSha256, CryptoError> {
        HmacSha256::new_from_slice(&self.secret)
            .map_err(|e| CryptoError::Configuration(e.to_string()))
    }

    fn sign(&self, input: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let mut mac = self.mac()?;
        mac.update(input);
        Ok(mac.finalize().into_bytes().to_vec())
    }
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("secret", &"[REDACTED]")
            .field("ttl", &self.ttl)
            .finish()
    }
}

fn decode_json<T: serde::de::DeserializeOwned>(segment: &str, what: &str) -> Result<T, CryptoError> {
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .map_err(|_| CryptoError::Malformed(format!("{what} is not base64url")))?;
    serde_json::from_slice(&bytes)
        .map_err(|_| CryptoError::Malformed(format!("{what} is not valid JSON")))
}

/// Current Unix time in seconds.
pub fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const SECRET: &[u8] = b"an-hs256-secret-that-is-long-enough!!";
    const T0: u64 = 1_700_000_000;

    fn codec() -> TokenCodec {
        TokenCodec::new(SECRET, Duration::from_secs(3600)).unwrap()
    }

    #[test]
    fn test_issue_then_parse() {
        let codec = codec();
        let token = codec.issue("alice", ["ROLE_USER"], T0).unwrap();
        let claims = codec.parse_at(&token, T0 + 1).unwrap();

        assert_eq!(claims.sub, "alice");
        assert!(claims.roles.contains("ROLE_USER"));
        assert_eq!(claims.iat, T0);
        assert_eq!(claims.exp, T0 + 3600);
    }

    #[test]
    fn test_is_valid_for_subject() {
        let codec = codec();
        let token = codec.issue("alice", ["ROLE_USER"], T0).unwrap();

        assert!(codec.is_valid_for_at(&token, "alice", T0));
        assert!(!codec.is_valid_for_at(&token, "bob", T0));
        assert!(!codec.is_valid_for_at(&token, "Alice", T0));
        assert!(!codec.is_valid_for_at(&token, "alice", T0 + 3600));
    }

    #[test]
    fn test_fresh_token_valid_against_wall_clock() {
        let codec = codec();
        let token = codec.issue("alice", ["ROLE_USER"], unix_now()).unwrap();
        assert!(codec.is_valid_for(&token, "alice"));
        assert_eq!(codec.subject_of(&token).unwrap(), "alice");
    }

    #[test]
    fn test_three_segments() {
        let token = codec().issue("alice", Vec::<String>::new(), T0).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert!(!token.contains('='));
    }

    #[test]
    fn test_empty_subject_rejected() {
        assert_eq!(
            codec().issue("", ["ROLE_USER"], T0),
            Err(CryptoError::EmptySubject)
        );
    }

    #[test]
    fn test_expired_at_exact_boundary() {
        let codec = codec();
        let token = codec.issue("alice", ["ROLE_USER"], T0).unwrap();
        assert!(codec.parse_at(&token, T0 + 3599).is_ok());
        assert_eq!(
            codec.parse_at(&token, T0 + 3600),
            Err(CryptoError::Expired {
                expired_at: T0 + 3600,
                now: T0 + 3600
            })
        );
    }

    #[test]
    fn test_other_secret_is_bad_signature() {
        let token = codec().issue("alice", ["ROLE_USER"], T0).unwrap();
        let other = TokenCodec::new(
            b"a-completely-different-secret-value!!",
            Duration::from_secs(3600),
        )
        .unwrap();
        assert_eq!(other.parse_at(&token, T0), Err(CryptoError::BadSignature));
    }

    #[test]
    fn test_malformed_inputs() {
        let codec = codec();
        for input in ["", "garbage", "a.b", "a.b.c.d", "!!.!!.!!"] {
            assert!(
                matches!(codec.parse_at(input, T0), Err(CryptoError::Malformed(_))),
                "{input:?}"
            );
        }
    }

    #[test]
    fn test_alg_none_rejected() {
        let codec = codec();
        let token = codec.issue("alice", ["ROLE_ADMIN"], T0).unwrap();
        let claims_b64 = token.split('.').nth(1).unwrap();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none","typ":"JWT"}"#);
        let forged = format!("{header}.{claims_b64}.");
        assert!(matches!(
            codec.parse_at(&forged, T0),
            Err(CryptoError::Malformed(_))
        ));
    }

    #[test]
    fn test_swapped_claims_fail_signature() {
        let codec = codec();
        let alice = codec.issue("alice", ["ROLE_USER"], T0).unwrap();
        let admin = codec.issue("mallory", ["ROLE_ADMIN"], T0).unwrap();

        let alice_parts: Vec<&str> = alice.split('.').collect();
        let admin_parts: Vec<&str> = admin.split('.').collect();
        let spliced = format!("{}.{}.{}", alice_parts[0], admin_parts[1], alice_parts[2]);

        assert_eq!(codec.parse_at(&spliced, T0), Err(CryptoError::BadSignature));
    }

    #[test]
    fn test_short_secret_and_zero_ttl_rejected() {
        assert!(TokenCodec::new(b"short", Duration::from_secs(60))
            .unwrap_err()
            .is_configuration());
        assert!(TokenCodec::new(SECRET, Duration::ZERO)
            .unwrap_err()
            .is_configuration());
    }

    fn subject() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_.@-]{1,32}"
    }

    fn roles() -> impl Strategy<Value = BTreeSet<String>> {
        prop::collection::btree_set("ROLE_[A-Z]{1,8}", 0..4)
    }

    proptest! {
        #[test]
        fn prop_roundtrip(sub in subject(), roles in roles(), now in 0u64..4_000_000_000) {
            let codec = codec();
            let token = codec.issue(&sub, roles.clone(), now).unwrap();
            let claims = codec.parse_at(&token, now).unwrap();
            prop_assert_eq!(claims.sub, sub);
            prop_assert_eq!(claims.roles, roles);
        }

        #[test]
        fn prop_expired_is_always_expired(sub in subject(), roles in roles(), late in 0u64..1_000_000) {
            let codec = codec();
            let token = codec.issue(&sub, roles, T0).unwrap();
            let result = codec.parse_at(&token, T0 + 3600 + late);
            let is_expired = matches!(result, Err(CryptoError::Expired { .. }));
            prop_assert!(is_expired);
        }

        #[test]
        fn prop_any_character_change_rejected(
            sub in subject(),
            index in any::<usize>(),
            replacement in prop::sample::select(b"AQgw09-_.xZ".to_vec()),
        ) {
            let codec = codec();
            let token = codec.issue(&sub, ["ROLE_USER"], T0).unwrap();
            let mut bytes = token.into_bytes();
            let at = index % bytes.len();
            prop_assume!(bytes[at] != replacement);
            bytes[at] = replacement;
            let tampered = String::from_utf8(bytes).unwrap();

            let result = codec.parse_at(&tampered, T0);
            let rejected = matches!(
                result,
                Err(CryptoError::BadSignature) | Err(CryptoError::Malformed(_))
            );
            prop_assert!(rejected, "tampered token gave {:?}", result);
        }
    }
}
