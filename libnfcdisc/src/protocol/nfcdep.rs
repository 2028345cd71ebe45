// libnfcdisc/src/protocol/nfcdep.rs
//! NFC-DEP (NFCIP-1) helpers and the parameter sets handed to the NFC-DEP
//! layer for initiator and target activation.

use crate::constants::{
    NFCDEP_ATR_REQ_MAX_LEN, NFCDEP_ATR_REQ_MIN_LEN, NFCDEP_ATR_REQ_NFCID3_POS, NFCDEP_CMD0_REQ,
    NFCDEP_CMD1_ATR_REQ, NFCDEP_FRAME_SIZE_MAX_LEN, NFCDEP_FS_VAL_MIN, NFCDEP_NFCID3_LEN,
    NFCDEP_PP_LR_MASK, NFCDEP_PP_LR_SHIFT,
};
use crate::types::{BitRate, CommMode, Nfcid};

/// Length reduction (LR) field of a PPi/PPt byte
pub fn pp_to_lr(pp: u8) -> u8 {
    (pp & NFCDEP_PP_LR_MASK) >> NFCDEP_PP_LR_SHIFT
}

/// PP byte carrying only the given LR
pub fn lr_to_pp(lr: u8) -> u8 {
    (lr << NFCDEP_PP_LR_SHIFT) & NFCDEP_PP_LR_MASK
}

/// Frame size selected by an LR value
pub fn lr_to_frame_size(lr: u8) -> usize {
    (NFCDEP_FS_VAL_MIN * (lr as usize + 1)).min(NFCDEP_FRAME_SIZE_MAX_LEN)
}

/// Check that `frame` is an ATR_REQ and return the initiator's NFCID3.
pub fn parse_atr_req(frame: &[u8]) -> Option<&[u8]> {
    if !(NFCDEP_ATR_REQ_MIN_LEN..=NFCDEP_ATR_REQ_MAX_LEN).contains(&frame.len()) {
        return None;
    }
    if frame[0] != NFCDEP_CMD0_REQ || frame[1] != NFCDEP_CMD1_ATR_REQ {
        return None;
    }
    Some(&frame[NFCDEP_ATR_REQ_NFCID3_POS..NFCDEP_ATR_REQ_NFCID3_POS + NFCDEP_NFCID3_LEN])
}

/// `frame` is a well-formed ATR_REQ
pub fn is_atr_req(frame: &[u8]) -> bool {
    parse_atr_req(frame).is_some()
}

/// Initiator parameters for ATR_REQ (and PSL_REQ when a higher rate is
/// allowed)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtrParams {
    /// Passive or active mode
    pub comm_mode: CommMode,
    /// Operation flags (`NFCDEP_OPER_*`)
    pub oper_param: u8,
    /// NFCID3, or NFCID2 when talking to an NFC-F target
    pub nfcid: Nfcid,
    /// Device identifier, 0 for none
    pub did: u8,
    /// Node address, 0 for none
    pub nad: u8,
    /// Send rates offered (BSi)
    pub bs: u8,
    /// Receive rates offered (BRi)
    pub br: u8,
    /// Length reduction
    pub lr: u8,
    /// Gi bytes
    pub general_bytes: Vec<u8>,
    /// Upper bound for PSL negotiation
    pub max_bit_rate: BitRate,
}

/// Target parameters used to answer an ATR_REQ
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TargetParams {
    /// Mode the initiator used
    pub comm_mode: CommMode,
    /// Our NFCID3
    pub nfcid3: Nfcid,
    /// Send rates supported (BSt)
    pub bst: u8,
    /// Receive rates supported (BRt)
    pub brt: u8,
    /// Timeout value (TO)
    pub to: u8,
    /// Protocol parameters (PPt)
    pub ppt: u8,
    /// Gt bytes
    pub general_bytes: Vec<u8>,
    /// Operation flags (`NFCDEP_OPER_*`)
    pub oper_param: u8,
}
