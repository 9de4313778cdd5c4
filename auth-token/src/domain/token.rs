//! Token value and its transport codec.
//!
//! A token travels as three dot-separated segments, each encoded
//! independently with the URL-safe base64 alphabet (padded):
//!
//! ```text
//! base64url(identity) "." base64url(expires, RFC 3339) "." base64url(signature)
//! ```
//!
//! Decoding only checks structure. Whether the signature matches and whether
//! the token is still live is decided by `TokenSigner`.
use base64::{engine::general_purpose::URL_SAFE as B64_URL, Engine};
use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use std::fmt;
use std::str::FromStr;

use crate::errors::TokenError;

pub const SEGMENT_SEPARATOR: char = '.';

// Bounds of the four-digit years RFC 3339 can carry, as Unix seconds.
const EARLIEST_EXPIRES_SECS: i64 = -62_167_219_200; // 0000-01-01T00:00:00Z
const LATEST_EXPIRES_SECS: i64 = 253_402_300_799; // 9999-12-31T23:59:59Z

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    identity: String,
    expires: DateTime<Utc>,
    signature: Vec<u8>,
}

impl Token {
    /// Assemble a token from already known parts (decoded input, tests).
    ///
    /// `expires` is truncated to whole seconds and clamped to years
    /// 0000-9999, the range and precision the wire format carries.
    pub fn from_parts(identity: impl Into<String>, expires: DateTime<Utc>, signature: Vec<u8>) -> Self {
        Self {
            identity: identity.into(),
            expires: clamp_expires(expires),
            signature,
        }
    }

    pub(crate) fn with_signature(self, signature: Vec<u8>) -> Self {
        Self { signature, ..self }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn expires(&self) -> DateTime<Utc> {
        self.expires
    }

    pub fn signature(&self) -> &[u8] {
        &self.signature
    }

    /// Canonical identity text, shared by the wire format and the MAC input.
    pub fn identity_text(&self) -> &str {
        &self.identity
    }

    /// Canonical expiration text, shared by the wire format and the MAC input.
    pub fn expires_text(&self) -> String {
        format_expires(self.expires)
    }

    pub fn encode(&self) -> String {
        let identity = B64_URL.encode(self.identity_text());
        let expires = B64_URL.encode(self.expires_text());
        let signature = B64_URL.encode(&self.signature);

        format!("{identity}{SEGMENT_SEPARATOR}{expires}{SEGMENT_SEPARATOR}{signature}")
    }

    pub fn decode(encoded: &str) -> Result<Self, TokenError> {
        let sections: Vec<&str> = encoded.split(SEGMENT_SEPARATOR).collect();
        let [identity, expires, signature] = sections.as_slice() else {
            return Err(TokenError::MalformedToken("expected three segments"));
        };

        let identity = decode_text(identity)?;

        let expires_text = decode_text(expires)?;
        let expires = DateTime::parse_from_rfc3339(&expires_text)
            .map_err(|_| TokenError::MalformedToken("invalid expiration timestamp"))?
            .with_timezone(&Utc);
        // Offsets and fractional seconds would re-render differently inside
        // the MAC input, so only the canonical form is accepted.
        if format_expires(expires) != expires_text {
            return Err(TokenError::MalformedToken("non-canonical expiration timestamp"));
        }

        let signature = decode_segment(signature)?;

        Ok(Self {
            identity,
            expires,
            signature,
        })
    }
}

fn clamp_expires(expires: DateTime<Utc>) -> DateTime<Utc> {
    let secs = expires.timestamp();
    if (EARLIEST_EXPIRES_SECS..=LATEST_EXPIRES_SECS).contains(&secs) {
        return expires.trunc_subsecs(0);
    }
    let bounded = secs.clamp(EARLIEST_EXPIRES_SECS, LATEST_EXPIRES_SECS);
    // Both bounds are representable, so the fallback is never taken.
    DateTime::from_timestamp(bounded, 0).unwrap_or(DateTime::UNIX_EPOCH)
}

fn format_expires(expires: DateTime<Utc>) -> String {
    expires.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn decode_segment(segment: &str) -> Result<Vec<u8>, TokenError> {
    B64_URL
        .decode(segment)
        .map_err(|_| TokenError::MalformedToken("invalid base64 segment"))
}

fn decode_text(segment: &str) -> Result<String, TokenError> {
    let bytes = decode_segment(segment)?;
    String::from_utf8(bytes).map_err(|_| TokenError::MalformedToken("segment is not valid UTF-8"))
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for Token {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Token::decode(s)
    }
}
