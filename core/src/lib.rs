//! # CharityWorks Core
//!
//! Domain layer for session tokens: entities, error taxonomy, the token
//! codec, the revocation store and accelerator ports, and the lifecycle
//! manager that composes them.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::*;
