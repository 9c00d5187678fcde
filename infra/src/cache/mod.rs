//! Cache module for Redis-based caching
//!
//! Provides the Redis client with connection retry logic and the Redis
//! implementation of the revocation accelerator.

pub mod redis_client;
pub mod revocation_cache;

#[cfg(test)]
mod tests;

pub use redis_client::RedisClient;
pub use revocation_cache::RedisRevocationAccelerator;

// Re-export commonly used types
pub use cw_shared::config::cache::CacheConfig;
