// libnfcdisc/src/device/listen.rs
//! Anti-collision results, one payload type per poll technology.
//!
//! The engine only reads the fields it needs to pick an activation path
//! (sub-type, sleep flag, identifiers); everything else is carried through
//! for the application.

use crate::constants::{NFCA_T1T_UID_LEN, NFCB_NFCID0_LEN, NFCF_NFCID2_LEN, NFCV_UID_LEN, ST25TB_UID_LEN};
use crate::technology::Technology;
use crate::types::Nfcid;
use crate::Result;
use std::convert::TryFrom;

/// NFC-A listener sub-type derived from SENS_RES/SEL_RES
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NfcaType {
    /// Type 1 tag (Topaz), identified through RID
    T1t,
    /// Type 2 tag, no higher layer
    T2t,
    /// ISO-DEP capable
    T4t,
    /// NFC-DEP capable
    NfcDep,
    /// Both ISO-DEP and NFC-DEP capable; NFC-DEP is preferred
    T4tNfcDep,
}

/// NFC-A device found by anti-collision
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NfcaListenDevice {
    /// Sub-type, picks the activation
    pub kind: NfcaType,
    /// SENS_RES (ATQA)
    pub sens_res: [u8; 2],
    /// SEL_RES (SAK)
    pub sel_res: u8,
    /// NFCID1, empty for T1T
    pub nfcid1: Nfcid,
    /// UID from RID_RES, T1T only
    pub rid_uid: Option<[u8; NFCA_T1T_UID_LEN]>,
    /// Left in SLEEP_A by anti-collision; must be woken and re-selected
    pub is_sleep: bool,
}

impl NfcaListenDevice {
    /// Device of `kind` with a SEL_RES matching it
    pub fn new(kind: NfcaType, nfcid1: &[u8]) -> Result<Self> {
        Ok(Self {
            kind,
            sens_res: [0x44, 0x00],
            sel_res: match kind {
                NfcaType::T1t | NfcaType::T2t => 0x00,
                NfcaType::T4t => 0x20,
                NfcaType::NfcDep => 0x40,
                NfcaType::T4tNfcDep => 0x60,
            },
            nfcid1: Nfcid::try_from(nfcid1)?,
            rid_uid: None,
            is_sleep: false,
        })
    }

    /// Type 1 tag whose UID was read through RID
    pub fn t1t(uid: [u8; NFCA_T1T_UID_LEN]) -> Self {
        Self {
            kind: NfcaType::T1t,
            sens_res: [0x00, 0x0C],
            sel_res: 0x00,
            nfcid1: Nfcid::empty(),
            rid_uid: Some(uid),
            is_sleep: false,
        }
    }

    /// Same device, left sleeping by anti-collision
    pub fn sleeping(mut self) -> Self {
        self.is_sleep = true;
        self
    }
}

/// NFC-B device: SENSB_RES content
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NfcbListenDevice {
    /// PUPI
    pub nfcid0: [u8; NFCB_NFCID0_LEN],
    /// Application data
    pub app_data: [u8; 4],
    /// Protocol info: BRC, FSCI|protocol type, FWI|ADC|FO
    pub prot_info: [u8; 3],
    /// Left in SLEEP_B; must be woken before activation
    pub is_sleep: bool,
}

impl NfcbListenDevice {
    /// Protocol type bit announcing ISO14443-4 compliance
    pub const PROTO_ISO_MASK: u8 = 0x01;

    /// 256 byte frames, ISO-DEP compliant or not
    pub fn new(nfcid0: [u8; NFCB_NFCID0_LEN], iso_dep: bool) -> Self {
        // FSCI=8 (256 bytes) in the high nibble
        let fsci_pro = 0x80 | if iso_dep { Self::PROTO_ISO_MASK } else { 0x00 };
        Self {
            nfcid0,
            app_data: [0; 4],
            prot_info: [0x00, fsci_pro, 0x81],
            is_sleep: false,
        }
    }

    /// Protocol type announces ISO14443-4
    pub fn supports_iso_dep(&self) -> bool {
        self.prot_info[1] & Self::PROTO_ISO_MASK != 0
    }

    /// Same device, left sleeping
    pub fn sleeping(mut self) -> Self {
        self.is_sleep = true;
        self
    }
}

/// NFC-F device: SENSF_RES content
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NfcfListenDevice {
    /// NFCID2
    pub nfcid2: [u8; NFCF_NFCID2_LEN],
    /// PAD0 and PMm
    pub pad: [u8; 8],
    /// System code, when requested in SENSF_REQ
    pub system_code: Option<[u8; 2]>,
}

impl NfcfListenDevice {
    /// First two NFCID2 bytes of a device advertising NFC-DEP
    pub const NFCDEP_PREFIX: [u8; 2] = [0x01, 0xFE];

    /// Device with no system code reported
    pub fn new(nfcid2: [u8; NFCF_NFCID2_LEN]) -> Self {
        Self {
            nfcid2,
            pad: [0; 8],
            system_code: None,
        }
    }

    /// NFCID2 carries the NFC-DEP prefix
    pub fn supports_nfc_dep(&self) -> bool {
        self.nfcid2[..2] == Self::NFCDEP_PREFIX
    }
}

/// NFC-V device: INVENTORY response
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NfcvListenDevice {
    /// UID, LSB first
    pub uid: [u8; NFCV_UID_LEN],
    /// Data storage format identifier
    pub dsfid: u8,
}

/// ST25TB device
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct St25tbListenDevice {
    /// UID
    pub uid: [u8; ST25TB_UID_LEN],
    /// Chip ID from INITIATE
    pub chip_id: u8,
}

/// Technology-tagged anti-collision result
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ListenDevice {
    /// NFC-A result
    NfcA(NfcaListenDevice),
    /// NFC-B result
    NfcB(NfcbListenDevice),
    /// NFC-F result
    NfcF(NfcfListenDevice),
    /// NFC-V result
    NfcV(NfcvListenDevice),
    /// ST25TB result
    St25tb(St25tbListenDevice),
    /// Active P2P target; everything it reports is in its NFC-DEP info
    Ap2p,
}

impl ListenDevice {
    /// Technology that found the device
    pub fn technology(&self) -> Technology {
        match self {
            Self::NfcA(_) => Technology::NfcA,
            Self::NfcB(_) => Technology::NfcB,
            Self::NfcF(_) => Technology::NfcF,
            Self::NfcV(_) => Technology::NfcV,
            Self::St25tb(_) => Technology::St25tb,
            Self::Ap2p => Technology::Ap2p,
        }
    }

    /// Identifier known right after collision resolution. Activation may
    /// replace it (NFCID3 for NFC-DEP, RID UID for T1T).
    pub fn nfcid(&self) -> Nfcid {
        let bytes: &[u8] = match self {
            Self::NfcA(a) => a.nfcid1.as_bytes(),
            Self::NfcB(b) => &b.nfcid0,
            Self::NfcF(f) => &f.nfcid2,
            Self::NfcV(v) => &v.uid,
            Self::St25tb(s) => &s.uid,
            Self::Ap2p => &[],
        };
        // Every fixed-size identifier above fits in an Nfcid
        Nfcid::try_from(bytes).unwrap_or_default()
    }

    /// Needs a wake-up before it can be activated
    pub fn is_sleep(&self) -> bool {
        match self {
            Self::NfcA(a) => a.is_sleep,
            Self::NfcB(b) => b.is_sleep,
            _ => false,
        }
    }

    /// Record that the device has been woken and selected again
    pub(crate) fn set_awake(&mut self) {
        match self {
            Self::NfcA(a) => a.is_sleep = false,
            Self::NfcB(b) => b.is_sleep = false,
            _ => {}
        }
    }
}
