// libnfcdisc/src/technology.rs
//! Poll technologies and the fixed order in which discovery visits them.

use crate::types::{DeviceType, TechMask};
use derive_more::Display;

/// One contactless poll technology
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Technology {
    /// Active P2P
    #[display(fmt = "AP2P")]
    Ap2p,
    /// ISO 14443-A, Type 1, 2 and 4A tags
    #[display(fmt = "NFC-A")]
    NfcA,
    /// ISO 14443-B
    #[display(fmt = "NFC-B")]
    NfcB,
    /// FeliCa
    #[display(fmt = "NFC-F")]
    NfcF,
    /// ISO 15693
    #[display(fmt = "NFC-V")]
    NfcV,
    /// ST25TB memory tags
    #[display(fmt = "ST25TB")]
    St25tb,
}

/// Technologies compiled into this build, in detection/resolution priority
/// order. Disabled technologies are absent from the list.
pub const POLL_ORDER: &[Technology] = &[
    #[cfg(feature = "nfc-dep")]
    Technology::Ap2p,
    #[cfg(feature = "nfca")]
    Technology::NfcA,
    #[cfg(feature = "nfcb")]
    Technology::NfcB,
    #[cfg(feature = "nfcf")]
    Technology::NfcF,
    #[cfg(feature = "nfcv")]
    Technology::NfcV,
    #[cfg(feature = "st25tb")]
    Technology::St25tb,
];

impl Technology {
    /// Poll bit of this technology in a `TechMask`
    pub fn mask(&self) -> TechMask {
        match self {
            Self::Ap2p => TechMask::POLL_AP2P,
            Self::NfcA => TechMask::POLL_A,
            Self::NfcB => TechMask::POLL_B,
            Self::NfcF => TechMask::POLL_F,
            Self::NfcV => TechMask::POLL_V,
            Self::St25tb => TechMask::POLL_ST25TB,
        }
    }

    /// Device type assigned to devices found with this technology
    pub fn listen_device_type(&self) -> DeviceType {
        match self {
            Self::Ap2p => DeviceType::ListenAp2p,
            Self::NfcA => DeviceType::ListenNfcA,
            Self::NfcB => DeviceType::ListenNfcB,
            Self::NfcF => DeviceType::ListenNfcF,
            Self::NfcV => DeviceType::ListenNfcV,
            Self::St25tb => DeviceType::ListenSt25tb,
        }
    }

    /// Whether the code path for this technology is compiled in
    pub fn is_enabled(&self) -> bool {
        POLL_ORDER.contains(self)
    }

    /// Cargo feature gating this technology
    pub fn feature(&self) -> &'static str {
        match self {
            Self::Ap2p => "nfc-dep",
            Self::NfcA => "nfca",
            Self::NfcB => "nfcb",
            Self::NfcF => "nfcf",
            Self::NfcV => "nfcv",
            Self::St25tb => "st25tb",
        }
    }

    /// Every technology, enabled or not
    pub fn all() -> [Technology; 6] {
        [
            Self::Ap2p,
            Self::NfcA,
            Self::NfcB,
            Self::NfcF,
            Self::NfcV,
            Self::St25tb,
        ]
    }
}

/// Listen technologies and the feature each one needs
pub(crate) const LISTEN_REQUIREMENTS: [(TechMask, &str, bool); 4] = [
    (TechMask::LISTEN_A, "nfca", cfg!(feature = "nfca")),
    (TechMask::LISTEN_B, "nfcb", cfg!(feature = "nfcb")),
    (TechMask::LISTEN_F, "nfcf", cfg!(feature = "nfcf")),
    (TechMask::LISTEN_AP2P, "nfc-dep", cfg!(feature = "nfc-dep")),
];
