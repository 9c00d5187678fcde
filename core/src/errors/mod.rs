//! Domain-specific error types and error handling.

mod types;


pub use types::{BackendError, ErrorCategory, MalformedCause, TokenError, TokenErrorKind};

pub type TokenResult<T> = Result<T, TokenError>;
