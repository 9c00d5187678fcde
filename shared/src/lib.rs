//! Shared configuration and common types for the CharityWorks server
//!
//! This crate provides functionality used across all server modules:
//! - Configuration types (JWT, revocation policy, cache, database, environment)
//! - Error response structures returned at the HTTP boundary

pub mod config;
pub mod errors;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, CacheConfig, ConfigError, DatabaseConfig, Environment, JwtConfig,
    LoggingConfig, RevocationCheckMode, RevocationPolicyConfig, ServerConfig,
};
pub use errors::{error_codes, ErrorResponse};
