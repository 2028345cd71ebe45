//! Small helpers shared across the crate: hex formatting for logs and
//! fixtures, and deadline arithmetic on the wrapping platform clock.

pub mod hex;
pub mod timeout;

pub use hex::*;
pub use timeout::*;
