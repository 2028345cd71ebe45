// libnfcdisc/src/types.rs

use crate::Error;
use crate::constants::NFCID_MAX_LEN;
use derive_more::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Display, Not};
use std::convert::TryFrom;

/// Requested/found technology bitmask - Newtype Pattern (u16)
///
/// Poll technologies occupy the low byte, listen technologies the high
/// nibble.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    BitOr,
    BitAnd,
    BitOrAssign,
    BitAndAssign,
    Not,
)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TechMask(u16);

impl TechMask {
    /// No technology
    pub const NONE: Self = Self(0x0000);
    /// NFC-A poller
    pub const POLL_A: Self = Self(0x0001);
    /// NFC-B poller
    pub const POLL_B: Self = Self(0x0002);
    /// NFC-F poller
    pub const POLL_F: Self = Self(0x0004);
    /// NFC-V poller
    pub const POLL_V: Self = Self(0x0008);
    /// Active P2P initiator
    pub const POLL_AP2P: Self = Self(0x0010);
    /// ST25TB poller
    pub const POLL_ST25TB: Self = Self(0x0020);
    /// NFC-A listener (card emulation or passive target)
    pub const LISTEN_A: Self = Self(0x1000);
    /// NFC-B listener
    pub const LISTEN_B: Self = Self(0x2000);
    /// NFC-F listener
    pub const LISTEN_F: Self = Self(0x4000);
    /// Active P2P target
    pub const LISTEN_AP2P: Self = Self(0x8000);

    /// Every poll technology
    pub const ALL_POLL: Self = Self(0x003F);
    /// Every listen technology
    pub const ALL_LISTEN: Self = Self(0xF000);

    /// Build from raw bits, unknown bits kept as is
    pub const fn from_bits(bits: u16) -> Self {
        Self(bits)
    }

    /// Raw value
    pub fn bits(&self) -> u16 {
        self.0
    }

    /// All bits of `other` are set. Always false for an empty `other`.
    pub fn contains(&self, other: TechMask) -> bool {
        other.0 != 0 && (self.0 & other.0) == other.0
    }

    /// At least one bit in common
    pub fn intersects(&self, other: TechMask) -> bool {
        (self.0 & other.0) != 0
    }

    /// No bit set
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Set the bits of `other`
    pub fn insert(&mut self, other: TechMask) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`
    pub fn remove(&mut self, other: TechMask) {
        self.0 &= !other.0;
    }

    /// Only the poll technology bits
    pub fn poll(&self) -> TechMask {
        *self & Self::ALL_POLL
    }

    /// Only the listen technology bits
    pub fn listen(&self) -> TechMask {
        *self & Self::ALL_LISTEN
    }
}

/// Listen-mode mask handed to the radio driver when entering listen mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, BitOr, BitOrAssign)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListenMask(u8);

impl ListenMask {
    /// Listen mode off
    pub const NONE: Self = Self(0x00);
    /// NFC-A
    pub const NFCA: Self = Self(0x01);
    /// NFC-B
    pub const NFCB: Self = Self(0x02);
    /// NFC-F
    pub const NFCF: Self = Self(0x04);
    /// Active communication mode
    pub const ACTIVE_P2P: Self = Self(0x08);

    /// Compute the listen mask for the listen technologies present in `techs`.
    pub fn from_techs(techs: TechMask) -> Self {
        let mut mask = Self::NONE;
        if techs.contains(TechMask::LISTEN_A) {
            mask |= Self::NFCA;
        }
        if techs.contains(TechMask::LISTEN_B) {
            mask |= Self::NFCB;
        }
        if techs.contains(TechMask::LISTEN_F) {
            mask |= Self::NFCF;
        }
        if techs.contains(TechMask::LISTEN_AP2P) {
            mask |= Self::ACTIVE_P2P;
        }
        mask
    }

    /// Raw value
    pub fn bits(&self) -> u8 {
        self.0
    }

    /// All bits of `other` are set
    pub fn contains(&self, other: ListenMask) -> bool {
        other.0 != 0 && (self.0 & other.0) == other.0
    }

    /// No listen mode requested
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }
}

/// Data exchange flags forwarded untouched to the radio driver (u32)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, BitOr)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TxRxFlags(u32);

impl TxRxFlags {
    /// CRC and parity handled by the driver
    pub const DEFAULT: Self = Self(0x0000);
    /// The caller appends the CRC
    pub const CRC_TX_MANUAL: Self = Self(0x0001);
    /// Keep the received CRC in the buffer
    pub const CRC_RX_KEEP: Self = Self(0x0002);
    /// Keep received parity bits
    pub const PAR_RX_KEEP: Self = Self(0x0004);
    /// Send without parity
    pub const PAR_TX_NONE: Self = Self(0x0008);
    /// NFCIP-1 framing (SoD byte and length)
    pub const NFCIP1_ON: Self = Self(0x0010);
    /// Disable automatic gain control
    pub const AGC_OFF: Self = Self(0x0020);

    /// Everything handled by the caller: no CRC, no parity.
    pub const RAW: Self =
        Self(Self::CRC_TX_MANUAL.0 | Self::CRC_RX_KEEP.0 | Self::PAR_RX_KEEP.0 | Self::PAR_TX_NONE.0);

    /// Build from raw bits
    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw value
    pub fn bits(&self) -> u32 {
        self.0
    }
}

/// Bit rates. Declaration order follows the on-air rate so `PartialOrd`
/// can be used for range checks; `Keep` sorts last.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BitRate {
    /// fc/128, the rate every technology starts at
    #[display(fmt = "106 kbit/s")]
    Br106,
    /// fc/64
    #[display(fmt = "212 kbit/s")]
    Br212,
    /// fc/32
    #[display(fmt = "424 kbit/s")]
    Br424,
    /// fc/16
    #[display(fmt = "848 kbit/s")]
    Br848,
    /// fc/8
    #[display(fmt = "1695 kbit/s")]
    Br1695,
    /// fc/4
    #[display(fmt = "3390 kbit/s")]
    Br3390,
    /// fc/2
    #[display(fmt = "6780 kbit/s")]
    Br6780,
    /// fc
    #[display(fmt = "13560 kbit/s")]
    Br13560,
    /// Leave the current rate unchanged
    #[display(fmt = "keep")]
    Keep,
}

impl Default for BitRate {
    fn default() -> Self {
        BitRate::Br106
    }
}

/// Compliance mode forwarded to the technology pollers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ComplianceMode {
    /// NFC Forum Digital behavior
    #[default]
    Nfc,
    /// EMVCo contactless rules
    Emv,
    /// Plain ISO/IEC 14443, 18092 and 15693
    Iso,
}

/// High-level interface assigned to an activated device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RfInterface {
    /// Frames go to the radio driver as is
    #[display(fmt = "RF")]
    RfRaw,
    /// ISO-DEP (ISO 14443-4) APDUs
    #[display(fmt = "ISO-DEP")]
    IsoDep,
    /// NFC-DEP (ISO 18092) PDUs
    #[display(fmt = "NFC-DEP")]
    NfcDep,
}

/// Device type as seen from this engine.
///
/// `Listen*` types are remote listeners found while polling; `Poll*` types
/// are remote pollers that activated us while in listen mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DeviceType {
    /// NFC-A tag or card
    #[display(fmt = "NFC-A listener")]
    ListenNfcA,
    /// NFC-B card
    #[display(fmt = "NFC-B listener")]
    ListenNfcB,
    /// FeliCa card or NFC-F target
    #[display(fmt = "NFC-F listener")]
    ListenNfcF,
    /// Vicinity tag
    #[display(fmt = "NFC-V listener")]
    ListenNfcV,
    /// ST25TB tag
    #[display(fmt = "ST25TB listener")]
    ListenSt25tb,
    /// Active P2P target
    #[display(fmt = "AP2P listener")]
    ListenAp2p,
    /// NFC-A reader
    #[display(fmt = "NFC-A poller")]
    PollNfcA,
    /// NFC-B reader
    #[display(fmt = "NFC-B poller")]
    PollNfcB,
    /// NFC-F reader
    #[display(fmt = "NFC-F poller")]
    PollNfcF,
    /// NFC-V reader
    #[display(fmt = "NFC-V poller")]
    PollNfcV,
    /// Active P2P initiator
    #[display(fmt = "AP2P poller")]
    PollAp2p,
}

impl DeviceType {
    /// The remote device is a listener: this engine acts as poller.
    pub fn is_remote_listener(&self) -> bool {
        matches!(
            self,
            Self::ListenNfcA
                | Self::ListenNfcB
                | Self::ListenNfcF
                | Self::ListenNfcV
                | Self::ListenSt25tb
                | Self::ListenAp2p
        )
    }

    /// The remote device is a poller: this engine acts as listener.
    pub fn is_remote_poller(&self) -> bool {
        !self.is_remote_listener()
    }
}

/// NFC-DEP communication mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CommMode {
    /// Target answers by load modulation
    Passive,
    /// Both sides generate their own field
    Active,
}

/// Radio modes the engine switches to explicitly
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RfMode {
    /// Active P2P initiator
    PollActiveP2p,
    /// Active P2P target
    ListenActiveP2p,
}

/// Listen-mode states reported by the radio driver. Declaration order
/// matches the driver's numbering so `>= LmState::Idle` means "a remote
/// field has been detected".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LmState {
    /// Listen mode not started
    NotInit,
    /// No remote field
    PowerOff,
    /// Field present, nothing received yet
    Idle,
    /// NFC-A anti-collision running
    ReadyA,
    /// NFC-B waiting for ATTRIB
    ReadyB,
    /// NFC-F answered SENSF_REQ
    ReadyF,
    /// NFC-A selected
    ActiveA,
    /// ISO-DEP card emulation over NFC-A
    CardEmu4A,
    /// ISO-DEP card emulation over NFC-B
    CardEmu4B,
    /// Type 3 tag emulation
    CardEmu3,
    /// NFC-DEP target over NFC-A
    TargetA,
    /// NFC-DEP target over NFC-F or active mode
    TargetF,
    /// NFC-A halted by SLP_REQ
    SleepA,
    /// NFC-B halted
    SleepB,
    /// `ReadyA` reached from `SleepA`
    ReadyAx,
    /// `ActiveA` reached from `SleepA`
    ActiveAx,
    /// Halted while NFC-A and NFC-F were both listening
    SleepAf,
}

/// NFCID of a device - bounded byte string (up to 10 bytes)
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Nfcid {
    bytes: [u8; NFCID_MAX_LEN],
    len: u8,
}

impl Nfcid {
    /// Zero-length NFCID
    pub const fn empty() -> Self {
        Self {
            bytes: [0u8; NFCID_MAX_LEN],
            len: 0,
        }
    }

    /// The NFCID bytes, without padding
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len as usize]
    }

    /// Length in bytes, 0 to 10
    pub fn len(&self) -> usize {
        self.len as usize
    }

    /// No NFCID known
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Lower-case hex without separators
    pub fn to_hex(&self) -> String {
        crate::utils::bytes_to_hex(self.as_bytes())
    }
}

impl std::fmt::Debug for Nfcid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Nfcid({})", self.to_hex())
    }
}

impl TryFrom<&[u8]> for Nfcid {
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        if bytes.len() > NFCID_MAX_LEN {
            return Err(Error::NoMemory {
                capacity: NFCID_MAX_LEN,
                required: bytes.len(),
            });
        }
        let mut out = Self::empty();
        out.bytes[..bytes.len()].copy_from_slice(bytes);
        out.len = bytes.len() as u8;
        Ok(out)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Nfcid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}
