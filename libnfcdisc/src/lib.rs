// libnfcdisc/src/lib.rs

//! libnfcdisc
//!
//! Poll-driven NFC discovery and activation engine. It sequences a
//! contactless front-end through technology detection, collision
//! resolution, activation and data exchange for NFC-A/B/F/V, ST25TB and
//! active P2P, as poller or as listener. The radio driver and protocol
//! layers are supplied by the application through the `transport` traits.
#![warn(missing_docs)]

pub mod config;
pub mod constants;
/// Discovered devices and what activation learned about them
pub mod device;
pub mod engine;
/// Crate error type
pub mod error;
/// Everything an application needs to drive the engine
pub mod prelude;
/// Parameters and frame checks of the ISO-DEP and NFC-DEP layers
pub mod protocol;
pub mod technology;
pub mod test_support;
/// Front-end traits and the simulated front-end
pub mod transport;
/// Masks, flags and small value types
pub mod types;
pub mod utils;

// Re-export common types at crate root so `crate::Error`, `crate::Result`,
// and the newtypes in `types` are available for consumers and for
// convenient `prelude` re-exports.
pub use crate::error::*;
pub use crate::types::*;

pub use prelude::*;
