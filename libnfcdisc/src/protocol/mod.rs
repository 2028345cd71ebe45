// libnfcdisc/src/protocol/mod.rs

pub mod frame;
/// ISO14443-4
pub mod isodep;
pub mod nfcdep;

pub use frame::{ListenFrame, classify_nfca, classify_nfcf, is_sleep_req};
pub use isodep::{AtsParams, PollerParams, is_rats};
pub use nfcdep::{AtrParams, TargetParams, is_atr_req};
