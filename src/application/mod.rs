// Application layer - use cases and orchestration over the account store.

pub mod service;
pub mod transfer;

pub use service::*;
pub use transfer::*;
