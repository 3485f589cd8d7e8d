mod account;
mod error;
mod transfer;

pub use account::*;
pub use error::*;
pub use transfer::*;
