//! Signed Token Codec
//!
//! Issues and verifies HS256-signed tokens for every [`TokenKind`]. The codec
//! holds its secret, lifetimes and clock explicitly, so verification is a pure
//! function of those inputs.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::models::{SignedTokenClaims, TokenKind};

/// Token issuance and verification failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Signature and structure are valid but `exp` has passed
    #[error("Token has expired")]
    Expired,

    /// Bad structure, bad signature or unreadable claims
    #[error("Token is malformed: {0}")]
    Malformed(String),

    /// Token was minted for a different purpose
    #[error("Expected a {expected} token, found {found}")]
    KindMismatch { expected: TokenKind, found: TokenKind },

    /// Encoding failed
    #[error("Token generation failed: {0}")]
    Generation(String),
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually driven clock with second precision
#[derive(Debug)]
pub struct FixedClock {
    seconds: AtomicI64,
}

impl FixedClock {
    pub fn new(at: DateTime<Utc>) -> Self {
        Self {
            seconds: AtomicI64::new(at.timestamp()),
        }
    }

    /// Move the clock forward (or back, with a negative duration)
    pub fn advance(&self, by: Duration) {
        self.seconds.fetch_add(by.num_seconds(), Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.seconds.load(Ordering::SeqCst), 0).unwrap_or_default()
    }
}

/// HS256 codec shared by the activation, reset and session flows
#[derive(Clone)]
pub struct TokenCodec {
    config: TokenConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    /// Create a codec reading the wall clock
    pub fn new(config: TokenConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Create a codec with an injected clock
    pub fn with_clock(config: TokenConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        Self {
            config,
            encoding_key,
            decoding_key,
            clock,
        }
    }

    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Issue a token of `kind` with the configured lifetime
    pub fn issue(&self, subject: Uuid, kind: TokenKind) -> Result<String, TokenError> {
        self.issue_with_lifetime(subject, kind, self.config.lifetime(kind))
    }

    /// Issue a token of `kind` valid for `lifetime` from now
    pub fn issue_with_lifetime(
        &self,
        subject: Uuid,
        kind: TokenKind,
        lifetime: Duration,
    ) -> Result<String, TokenError> {
        let now = self.clock.now();
        self.sign(&SignedTokenClaims::new(subject, kind, now, now + lifetime))
    }

    /// Issue a token of `kind` that also carries the account email
    pub fn issue_with_email(
        &self,
        subject: Uuid,
        kind: TokenKind,
        email: &str,
    ) -> Result<String, TokenError> {
        let now = self.clock.now();
        let claims = SignedTokenClaims::new(subject, kind, now, now + self.config.lifetime(kind))
            .with_email(email);
        self.sign(&claims)
    }

    /// Verify a token of `expected` kind and return its subject
    pub fn verify(&self, token: &str, expected: TokenKind) -> Result<Uuid, TokenError> {
        let claims = self.verify_claims(token, expected)?;
        claims
            .subject_id()
            .map_err(|_| TokenError::Malformed("subject is not an account id".into()))
    }

    /// Verify a token of `expected` kind and return all claims
    pub fn verify_claims(
        &self,
        token: &str,
        expected: TokenKind,
    ) -> Result<SignedTokenClaims, TokenError> {
        let claims = self.decode_any(token)?;
        if claims.kind != expected {
            return Err(TokenError::KindMismatch {
                expected,
                found: claims.kind,
            });
        }
        Ok(claims)
    }

    /// Check signature and expiry without regard to kind
    pub fn decode_any(&self, token: &str) -> Result<SignedTokenClaims, TokenError> {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is checked against the injected clock below
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<SignedTokenClaims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| TokenError::Malformed(e.to_string()))?;

        if self.clock.now().timestamp() >= claims.exp {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, claims: &SignedTokenClaims) -> Result<String, TokenError> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| TokenError::Generation(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-that-is-long-enough-for-hs256";

    fn codec_at(clock: Arc<FixedClock>) -> TokenCodec {
        TokenCodec::with_clock(TokenConfig::new(SECRET), clock)
    }

    fn fixed_clock() -> Arc<FixedClock> {
        Arc::new(FixedClock::new(Utc::now()))
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = codec_at(fixed_clock());
        let subject = Uuid::new_v4();

        let token = codec.issue(subject, TokenKind::Activation).unwrap();
        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify(&token, TokenKind::Activation).unwrap(), subject);
    }

    #[test]
    fn test_expired_token_rejected() {
        let clock = fixed_clock();
        let codec = codec_at(clock.clone());
        let subject = Uuid::new_v4();

        let past = codec
            .issue_with_lifetime(subject, TokenKind::ResetPassword, Duration::minutes(-1))
            .unwrap();
        assert_eq!(
            codec.verify(&past, TokenKind::ResetPassword),
            Err(TokenError::Expired)
        );

        let token = codec.issue(subject, TokenKind::ResetPassword).unwrap();
        clock.advance(Duration::minutes(14));
        assert!(codec.verify(&token, TokenKind::ResetPassword).is_ok());
        // Exactly at expiry counts as expired
        clock.advance(Duration::minutes(1));
        assert_eq!(
            codec.verify(&token, TokenKind::ResetPassword),
            Err(TokenError::Expired)
        );
    }

    #[test]
    fn test_kind_mismatch_rejected_for_every_kind() {
        let codec = codec_at(fixed_clock());
        let subject = Uuid::new_v4();

        let refresh = codec.issue(subject, TokenKind::Refresh).unwrap();
        assert_eq!(
            codec.verify(&refresh, TokenKind::Activation),
            Err(TokenError::KindMismatch {
                expected: TokenKind::Activation,
                found: TokenKind::Refresh,
            })
        );

        let activation = codec.issue(subject, TokenKind::Activation).unwrap();
        assert!(matches!(
            codec.verify(&activation, TokenKind::ResetPassword),
            Err(TokenError::KindMismatch { .. })
        ));
        assert!(matches!(
            codec.verify(&activation, TokenKind::Access),
            Err(TokenError::KindMismatch { .. })
        ));
    }

    #[test]
    fn test_malformed_tokens_rejected() {
        let codec = codec_at(fixed_clock());
        assert!(matches!(
            codec.verify("not-a-token", TokenKind::Access),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(
            codec.verify("", TokenKind::Access),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_foreign_secret_rejected() {
        let clock = fixed_clock();
        let codec = codec_at(clock.clone());
        let other = TokenCodec::with_clock(
            TokenConfig::new("a-completely-different-secret-value-123"),
            clock,
        );

        let token = other.issue(Uuid::new_v4(), TokenKind::Access).unwrap();
        assert!(matches!(
            codec.verify(&token, TokenKind::Access),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = codec_at(fixed_clock());
        let token = codec.issue(Uuid::new_v4(), TokenKind::Access).unwrap();
        let other = codec.issue(Uuid::new_v4(), TokenKind::Access).unwrap();

        // Splice the payload of one token with the signature of another
        let parts: Vec<&str> = token.split('.').collect();
        let other_parts: Vec<&str> = other.split('.').collect();
        let forged = format!("{}.{}.{}", parts[0], other_parts[1], parts[2]);

        assert!(matches!(
            codec.verify(&forged, TokenKind::Access),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_email_claim_and_decode_any() {
        let codec = codec_at(fixed_clock());
        let subject = Uuid::new_v4();

        let token = codec
            .issue_with_email(subject, TokenKind::Refresh, "user@test.com")
            .unwrap();
        let claims = codec.decode_any(&token).unwrap();
        assert_eq!(claims.kind, TokenKind::Refresh);
        assert_eq!(claims.email.as_deref(), Some("user@test.com"));
        assert_eq!(claims.exp - claims.iat, Duration::minutes(1440).num_seconds());
    }
}
