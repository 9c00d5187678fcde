pub mod revocation;

pub use revocation::{InMemoryRevocationStore, RevocationStore, SaveOutcome};
