//! Business services containing domain logic and use cases.

pub mod token;

pub use token::{
    AcceleratorVerdict, Clock, Deadline, InMemoryRevocationAccelerator, ManualClock,
    NullRevocationAccelerator, RevocationAccelerator, SystemClock, TokenCodec,
    TokenLifecycleManager, TokenServiceConfig,
};
