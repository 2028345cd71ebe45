// libnfcdisc/src/prelude.rs

pub use crate::config::{DiscoverParams, DiscoverParamsBuilder, WakeupSetting};
pub use crate::device::{DeviceRecord, ListenDevice, ProtocolInfo, Remote};
pub use crate::engine::{Engine, ExchangeHandle, State};
pub use crate::technology::Technology;
pub use crate::transport::Frontend;
pub use crate::{
    BitRate, ComplianceMode, DeviceType, Error, ListenMask, Nfcid, Result, RfInterface, TechMask,
    TxRxFlags,
};

// Re-export small utilities for convenience
pub use crate::utils::{bytes_to_hex, bytes_to_hex_spaced, parse_hex};
