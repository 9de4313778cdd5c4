pub mod signer;
pub mod token_service;

pub use signer::*;
pub use token_service::*;
