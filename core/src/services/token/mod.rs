//! Token service module for session token management
//!
//! This module handles all token-related operations including:
//! - Signing and parsing access and refresh tokens
//! - Revocation through a durable store and an optional cache mirror
//! - Deadline-bounded revocation checks on every authentication

mod accelerator;
mod clock;
mod codec;
mod config;
mod deadline;
mod service;
mod traits;

#[cfg(test)]
mod tests;

pub use accelerator::{InMemoryRevocationAccelerator, NullRevocationAccelerator};
pub use clock::{Clock, ManualClock, SystemClock};
pub use codec::{fingerprint, TokenCodec};
pub use config::TokenServiceConfig;
pub use deadline::Deadline;
pub use service::TokenLifecycleManager;
pub use traits::{AcceleratorVerdict, RevocationAccelerator};
