use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    MalformedToken(&'static str),

    #[error("invalid token signature")]
    InvalidSignature,

    #[error("token has expired")]
    ExpiredToken,
}

impl TokenError {
    /// An expired token was otherwise legitimate, so the caller may ask the
    /// principal to re-authenticate. Every other variant is hostile input.
    pub fn is_expired(&self) -> bool {
        matches!(self, TokenError::ExpiredToken)
    }
}
