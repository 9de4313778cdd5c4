//! HMAC-SHA256 signing and verification of tokens.
//!
//! The MAC input is the canonical identity text immediately followed by the
//! canonical expiration text, with no delimiter in between. This framing is
//! independent from the dot-separated transport format in `domain::token`.
//!
//! Verification order:
//! 1. Recompute the MAC over the token's own identity and expiration and
//!    compare it to the carried signature in constant time.
//! 2. Only then look at the clock: a token is live while `expires > now`.
use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

use crate::domain::Token;
use crate::errors::TokenError;
use crate::utils::config::{Config, ConfigError};

type HmacSha256 = Hmac<Sha256>;

/// Length of an HMAC-SHA256 signature in bytes.
pub const SIGNATURE_LEN: usize = 32;

/// Issues and checks tokens for one (secret, expiration) pair.
///
/// Holds no mutable state, so a single signer can be shared freely across
/// threads. The keyed MAC is prepared once and cloned per operation.
#[derive(Clone)]
pub struct TokenSigner {
    mac: HmacSha256,
    expiration: Duration,
}

impl TokenSigner {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let mac = HmacSha256::new_from_slice(config.secret())
            .map_err(|_| ConfigError::Invalid("Secret is not a usable HMAC key"))?;
        let expiration = Duration::from_std(config.expiration())
            .map_err(|_| ConfigError::Invalid("Expiration is out of range"))?;

        Ok(Self { mac, expiration })
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    pub fn generate(&self, identity: impl Into<String>) -> Token {
        self.generate_at(identity, Utc::now())
    }

    /// Generate a token as if the clock read `now`.
    ///
    /// Expirations past the end of year 9999 saturate there.
    pub fn generate_at(&self, identity: impl Into<String>, now: DateTime<Utc>) -> Token {
        let expires = now
            .checked_add_signed(self.expiration)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        let unsigned = Token::from_parts(identity, expires, Vec::new());
        let signature = self.keyed_mac(&unsigned).finalize().into_bytes().to_vec();

        unsigned.with_signature(signature)
    }

    /// Check signature then expiration, returning the token's identity.
    pub fn validate(&self, token: &Token) -> Result<String, TokenError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(&self, token: &Token, now: DateTime<Utc>) -> Result<String, TokenError> {
        // verify_slice compares in constant time and rejects wrong lengths.
        self.keyed_mac(token)
            .verify_slice(token.signature())
            .map_err(|_| TokenError::InvalidSignature)?;

        if token.expires() > now {
            Ok(token.identity().to_string())
        } else {
            Err(TokenError::ExpiredToken)
        }
    }

    /// Generate and encode in one step.
    pub fn issue(&self, identity: impl Into<String>) -> String {
        self.generate(identity).encode()
    }

    /// Decode and validate in one step.
    pub fn verify(&self, encoded: &str) -> Result<String, TokenError> {
        let token = Token::decode(encoded)?;
        self.validate(&token)
    }

    fn keyed_mac(&self, token: &Token) -> HmacSha256 {
        let mut mac = self.mac.clone();
        mac.update(token.identity_text().as_bytes());
        mac.update(token.expires_text().as_bytes());
        mac
    }
}

impl fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSigner")
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE as B64_URL, Engine};
    use chrono::TimeZone;

    fn signer(secret: &str, expiration_secs: u64) -> TokenSigner {
        let config = Config::new(secret, std::time::Duration::from_secs(expiration_secs)).unwrap();
        TokenSigner::new(&config).unwrap()
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 6, 1, 11, 0, 0).unwrap()
    }

    #[test]
    fn signature_matches_reference_hmac() {
        let token = signer("topsecret", 3600).generate_at("42", t0());

        assert_eq!(token.expires_text(), "2015-06-01T12:00:00Z");
        assert_eq!(token.signature().len(), SIGNATURE_LEN);
        // HMAC-SHA256("topsecret", "42" || "2015-06-01T12:00:00Z")
        assert_eq!(
            B64_URL.encode(token.signature()),
            "GHXZn4cJ1r8PnuqbShi-0rtwFiH4eIVFH7bfv0Fo5gw="
        );
    }

    #[test]
    fn generation_is_deterministic_for_the_same_instant() {
        let s = signer("topsecret", 3600);
        assert_eq!(s.generate_at("42", t0()), s.generate_at("42", t0()));
    }

    #[test]
    fn expiration_drops_subseconds() {
        let now = t0() + Duration::milliseconds(999);
        let token = signer("topsecret", 60).generate_at("42", now);
        assert_eq!(token.expires(), t0() + Duration::seconds(60));
    }

    #[test]
    fn validates_before_expiry_and_expires_at_the_boundary() {
        let s = signer("topsecret", 3600);
        let token = s.generate_at("42", t0());

        assert_eq!(s.validate_at(&token, t0() + Duration::minutes(30)).unwrap(), "42");
        assert_eq!(
            s.validate_at(&token, token.expires() - Duration::seconds(1)).unwrap(),
            "42"
        );
        assert_eq!(
            s.validate_at(&token, token.expires()),
            Err(TokenError::ExpiredToken)
        );
        assert_eq!(
            s.validate_at(&token, t0() + Duration::hours(2)),
            Err(TokenError::ExpiredToken)
        );
    }

    #[test]
    fn zero_expiration_is_expired_not_invalid() {
        let s = signer("topsecret", 0);
        let token = s.generate_at("42", t0());
        assert_eq!(s.validate_at(&token, t0()), Err(TokenError::ExpiredToken));
    }

    #[test]
    fn signature_check_precedes_expiry_check() {
        let s = signer("topsecret", 3600);
        let token = s.generate_at("42", t0());
        let forged = Token::from_parts("42", token.expires(), vec![0u8; SIGNATURE_LEN]);

        let long_after = t0() + Duration::days(30);
        assert_eq!(
            s.validate_at(&forged, long_after),
            Err(TokenError::InvalidSignature)
        );
    }

    #[test]
    fn truncated_signature_is_invalid() {
        let s = signer("topsecret", 3600);
        let token = s.generate_at("42", t0());
        let short = Token::from_parts("42", token.expires(), token.signature()[..16].to_vec());
        assert_eq!(s.validate_at(&short, t0()), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn mac_input_is_identity_then_expiration_without_separator() {
        let token = signer("topsecret", 3600).generate_at("user-7", t0());

        let mut mac = HmacSha256::new_from_slice(b"topsecret").unwrap();
        mac.update(b"user-72015-06-01T12:00:00Z");
        assert_eq!(token.signature(), mac.finalize().into_bytes().as_slice());
    }

    #[test]
    fn extreme_clock_saturates_at_the_last_representable_second() {
        let s = signer("topsecret", 3600);
        let token = s.generate_at("x", DateTime::<Utc>::MAX_UTC);

        assert_eq!(token.expires_text(), "9999-12-31T23:59:59Z");
        let decoded = Token::decode(&token.encode()).unwrap();
        assert_eq!(s.validate_at(&decoded, t0()).unwrap(), "x");
    }

    #[test]
    fn sub_second_expiration_is_kept_exactly() {
        let config = Config::new("topsecret", std::time::Duration::from_micros(1500)).unwrap();
        let s = TokenSigner::new(&config).unwrap();
        assert_eq!(s.expiration(), Duration::microseconds(1500));
    }

    #[test]
    fn debug_output_omits_key_material() {
        let rendered = format!("{:?}", signer("topsecret", 60));
        assert!(rendered.starts_with("TokenSigner"));
        assert!(!rendered.contains("topsecret"));
    }
}
