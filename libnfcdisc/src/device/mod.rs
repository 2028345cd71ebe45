// libnfcdisc/src/device/mod.rs

pub mod listen;
/// Device list entries
pub mod record;

pub use listen::{
    ListenDevice, NfcaListenDevice, NfcaType, NfcbListenDevice, NfcfListenDevice,
    NfcvListenDevice, St25tbListenDevice,
};
pub use record::{DeviceRecord, IsoDepInfo, NfcDepInfo, PollerKind, ProtocolInfo, Remote};
