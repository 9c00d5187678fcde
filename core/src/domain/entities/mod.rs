//! Domain entities representing core business objects.

pub mod revocation;
pub mod token;
pub mod user;


pub use revocation::{RevocationReason, RevocationRecord};
pub use token::{Claims, TokenKind, TokenPair, BEARER};
pub use user::{Role, UserId};
