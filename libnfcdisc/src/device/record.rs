// libnfcdisc/src/device/record.rs

use crate::device::listen::ListenDevice;
use crate::protocol::nfcdep;
use crate::technology::Technology;
use crate::types::{BitRate, CommMode, DeviceType, Nfcid, RfInterface};

/// Remote poller technologies that can activate the engine in listen mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum PollerKind {
    /// NFC-A reader
    NfcA,
    /// NFC-F reader
    NfcF,
    /// Active P2P initiator
    Ap2p,
}

/// Who is on the other side of the link
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Remote {
    /// Found while polling; the engine is the poller
    Listener(ListenDevice),
    /// Activated us while listening; the engine is the listener
    Poller(PollerKind),
}

/// ISO-DEP parameters negotiated during activation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IsoDepInfo {
    /// Frame size of the remote side (FSC in poller role, FSD in listener role)
    pub fsx: usize,
    /// Frame waiting time in 1/fc
    pub fwt: u32,
    /// Delta frame waiting time in 1/fc
    pub dfwt: u32,
    /// DID in use, 0 for none
    pub did: u8,
    /// Listener to poller rate
    pub dsi: BitRate,
    /// Poller to listener rate
    pub dri: BitRate,
}

/// NFC-DEP parameters negotiated during ATR (and PSL)
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NfcDepInfo {
    /// Peer NFCID3
    pub nfcid3: Nfcid,
    /// PPt of ATR_RES in poller role, PPi of ATR_REQ in listener role
    pub pp: u8,
    /// DID in use
    pub did: u8,
    /// Frame waiting time in 1/fc
    pub fwt: u32,
    /// Delta frame waiting time in 1/fc
    pub dfwt: u32,
    /// Passive or active link
    pub comm_mode: CommMode,
    /// General bytes received from the peer
    pub general_bytes: Vec<u8>,
}

impl NfcDepInfo {
    /// Maximum frame size announced by the peer
    pub fn frame_size(&self) -> usize {
        nfcdep::lr_to_frame_size(nfcdep::pp_to_lr(self.pp))
    }
}

/// Activation result of the higher protocol layer, if any
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ProtocolInfo {
    /// Raw RF, or not activated yet
    #[default]
    None,
    /// ISO-DEP activation result
    IsoDep(IsoDepInfo),
    /// NFC-DEP activation result
    NfcDep(NfcDepInfo),
}

/// One entry of the discovered-device list
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct DeviceRecord {
    /// The remote device
    pub remote: Remote,
    /// Identifier, updated by activation
    pub nfcid: Nfcid,
    /// Assigned once activated
    pub interface: Option<RfInterface>,
    /// Higher layer parameters
    pub protocol: ProtocolInfo,
}

impl DeviceRecord {
    /// Record for a device found by collision resolution
    pub fn listener(dev: ListenDevice) -> Self {
        Self {
            nfcid: dev.nfcid(),
            remote: Remote::Listener(dev),
            interface: None,
            protocol: ProtocolInfo::None,
        }
    }

    /// Record for a remote poller that addressed us in listen mode
    pub fn poller(kind: PollerKind) -> Self {
        Self {
            remote: Remote::Poller(kind),
            nfcid: Nfcid::empty(),
            interface: None,
            protocol: ProtocolInfo::None,
        }
    }

    /// Device type as reported to the application
    pub fn device_type(&self) -> DeviceType {
        match &self.remote {
            Remote::Listener(dev) => dev.technology().listen_device_type(),
            Remote::Poller(PollerKind::NfcA) => DeviceType::PollNfcA,
            Remote::Poller(PollerKind::NfcF) => DeviceType::PollNfcF,
            Remote::Poller(PollerKind::Ap2p) => DeviceType::PollAp2p,
        }
    }

    /// Technology the device was found with, poller role only
    pub fn technology(&self) -> Option<Technology> {
        match &self.remote {
            Remote::Listener(dev) => Some(dev.technology()),
            Remote::Poller(_) => None,
        }
    }

    /// Anti-collision result, poller role only
    pub fn listen_device(&self) -> Option<&ListenDevice> {
        match &self.remote {
            Remote::Listener(dev) => Some(dev),
            Remote::Poller(_) => None,
        }
    }

    pub(crate) fn listen_device_mut(&mut self) -> Option<&mut ListenDevice> {
        match &mut self.remote {
            Remote::Listener(dev) => Some(dev),
            Remote::Poller(_) => None,
        }
    }

    /// Found while polling
    pub fn is_remote_listener(&self) -> bool {
        matches!(self.remote, Remote::Listener(_))
    }

    /// ISO-DEP parameters after an ISO-DEP activation
    pub fn iso_dep(&self) -> Option<&IsoDepInfo> {
        match &self.protocol {
            ProtocolInfo::IsoDep(info) => Some(info),
            _ => None,
        }
    }

    /// NFC-DEP parameters after an NFC-DEP activation
    pub fn nfc_dep(&self) -> Option<&NfcDepInfo> {
        match &self.protocol {
            ProtocolInfo::NfcDep(info) => Some(info),
            _ => None,
        }
    }
}

impl std::fmt::Display for DeviceRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}]", self.device_type(), self.nfcid.to_hex())?;
        if let Some(itf) = self.interface {
            write!(f, " via {}", itf)?;
        }
        Ok(())
    }
}
