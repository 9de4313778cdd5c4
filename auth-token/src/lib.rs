//! Stateless authentication tokens signed with HMAC-SHA256.
//!
//! A token binds an identity to an expiration instant. It is encoded as three
//! dot-separated base64url segments and can be verified with nothing but the
//! shared secret: no session store is involved.
//!
//! ```
//! use std::time::Duration;
//! use auth_token::services::TokenSigner;
//! use auth_token::utils::Config;
//!
//! let config = Config::new("topsecret", Duration::from_secs(3600))?;
//! let signer = TokenSigner::new(&config)?;
//! let token = signer.issue("42");
//! assert_eq!(signer.verify(&token).unwrap(), "42");
//! # Ok::<(), auth_token::utils::config::ConfigError>(())
//! ```
pub mod domain;
pub mod errors;
pub mod services;
pub mod utils;
