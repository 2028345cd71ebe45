// libnfcdisc/src/transport/mod.rs

/// In-memory front-end for tests, benches and demos
pub mod mock;
pub mod traits;

pub use mock::{Farewell, ListenEvent, MockField, MockFrontend};
pub use traits::{
    ChainingParams, Frontend, IsoDepLayer, ListenMode, ListenStatus, NfcDepLayer, RadioDriver,
    TechnologyPoller, WakeupMode,
};
