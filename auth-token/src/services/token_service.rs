//! Token issuance and verification service.
//!
//! This module provides the `TokenService`, which coordinates:
//! - Issuing encoded tokens for an identity
//! - Verifying encoded tokens (structure, signature, expiration)
//! - Replacing the signing configuration at runtime
//!
//! Concurrency:
//! - The active `TokenSigner` lives behind an async `RwLock`.
//! - Every call clones the signer under a read lock and releases the lock
//!   before any crypto runs, so one call always sees one consistent
//!   (secret, expiration) pair even if `replace_config` runs concurrently.
//!
//! Errors:
//! - Verification surfaces exactly one `TokenError` kind so callers can tell
//!   hostile input (malformed, bad signature) from an expired session.
use log::{debug, warn};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::errors::TokenError;
use crate::services::signer::TokenSigner;
use crate::utils::config::{Config, ConfigError};

#[derive(Clone)]
/// Shared façade over the active signer.
///
/// Typical lifecycle:
/// 1. Build once from the startup `Config`
/// 2. `issue` after the principal authenticated
/// 3. `verify` on every protected request
/// 4. `replace_config` if the operator swaps the secret (old tokens stop verifying)
pub struct TokenService {
    signer: Arc<RwLock<TokenSigner>>,
}

impl TokenService {
    pub fn new(config: &Config) -> Result<Self, ConfigError> {
        let signer = TokenSigner::new(config)?;
        Ok(Self {
            signer: Arc::new(RwLock::new(signer)),
        })
    }

    async fn snapshot(&self) -> TokenSigner {
        self.signer.read().await.clone()
    }

    /// Issue an encoded token for `identity`.
    pub async fn issue(&self, identity: &str) -> String {
        let signer = self.snapshot().await;
        let token = signer.generate(identity);
        debug!("issued token for {identity}, expires {}", token.expires_text());
        token.encode()
    }

    /// Verify an encoded token and return its identity.
    ///
    /// Errors:
    /// - `TokenError::MalformedToken`: not three valid segments
    /// - `TokenError::InvalidSignature`: tampered, or signed with another secret
    /// - `TokenError::ExpiredToken`: authentic but past its expiration
    pub async fn verify(&self, encoded: &str) -> Result<String, TokenError> {
        let signer = self.snapshot().await;
        match signer.verify(encoded) {
            Ok(identity) => Ok(identity),
            Err(err @ TokenError::ExpiredToken) => {
                debug!("rejected token: {err}");
                Err(err)
            }
            Err(err) => {
                warn!("rejected token: {err}");
                Err(err)
            }
        }
    }

    /// Swap in a new configuration. Calls already holding a snapshot finish
    /// with the previous one.
    pub async fn replace_config(&self, config: &Config) -> Result<(), ConfigError> {
        let next = TokenSigner::new(config)?;
        {
            let mut signer = self.signer.write().await;
            *signer = next;
        }
        debug!("token configuration replaced, expiration {:?}", config.expiration());
        Ok(())
    }
}
