// libnfcdisc/src/protocol/frame.rs
//! Classification of the first frame a remote poller sends while the
//! engine is in listen mode.

use crate::constants::{NFCA_SLP_REQ, NFCDEP_LEN_LEN, NFCDEP_SB_LEN};
use crate::protocol::{isodep, nfcdep};
use crate::types::BitRate;

/// NFC-DEP header preceding an ATR_REQ at 106 kbit/s (SB + LEN)
pub const NFCA_DEP_HEADER_LEN: usize = NFCDEP_SB_LEN + NFCDEP_LEN_LEN;

/// NFC-DEP header preceding an ATR_REQ at 212/424 kbit/s (LEN only)
pub const NFCF_DEP_HEADER_LEN: usize = NFCDEP_LEN_LEN;

/// What a received listen-mode frame asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListenFrame<'a> {
    /// NFC-A SLP_REQ
    SleepReq,
    /// ISO-DEP RATS
    Rats,
    /// NFC-DEP ATR_REQ with the header stripped
    AtrReq(&'a [u8]),
    /// Anything else
    Unknown,
}

/// Exactly an NFC-A SLP_REQ
pub fn is_sleep_req(frame: &[u8]) -> bool {
    frame == NFCA_SLP_REQ
}

/// ATR_REQ following an NFC-DEP header of `header_len` bytes
pub fn atr_req_after_header(frame: &[u8], header_len: usize) -> Option<&[u8]> {
    let body = frame.get(header_len..)?;
    nfcdep::is_atr_req(body).then_some(body)
}

/// Classify a frame received in an NFC-A active state
pub fn classify_nfca(frame: &[u8]) -> ListenFrame<'_> {
    if is_sleep_req(frame) {
        ListenFrame::SleepReq
    } else if isodep::is_rats(frame) {
        ListenFrame::Rats
    } else if let Some(atr) = atr_req_after_header(frame, NFCA_DEP_HEADER_LEN) {
        ListenFrame::AtrReq(atr)
    } else {
        ListenFrame::Unknown
    }
}

/// Classify a frame received in the NFC-F ready state. Anything other than
/// an ATR_REQ is T3T card emulation traffic.
pub fn classify_nfcf(frame: &[u8]) -> ListenFrame<'_> {
    match atr_req_after_header(frame, NFCF_DEP_HEADER_LEN) {
        Some(atr) => ListenFrame::AtrReq(atr),
        None => ListenFrame::Unknown,
    }
}

/// Header length in front of an active P2P ATR_REQ depends on the rate the
/// initiator used
pub fn ap2p_header_len(bit_rate: BitRate) -> usize {
    if bit_rate == BitRate::Br106 {
        NFCA_DEP_HEADER_LEN
    } else {
        NFCF_DEP_HEADER_LEN
    }
}
