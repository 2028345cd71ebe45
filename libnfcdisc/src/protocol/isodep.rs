// libnfcdisc/src/protocol/isodep.rs

use crate::constants::{
    ISODEP_CMD_RATS, ISODEP_DEFAULT_FWI, ISODEP_DEFAULT_SFGI, ISODEP_FSXI_256, ISODEP_NO_DID,
    ISODEP_RATS_LEN,
};
use crate::types::BitRate;

/// RATS is exactly two bytes: E0 followed by FSDI|DID
pub fn is_rats(frame: &[u8]) -> bool {
    frame.len() == ISODEP_RATS_LEN && frame[0] == ISODEP_CMD_RATS
}

/// Poller-side activation parameters (RATS/PPS or ATTRIB)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerParams {
    /// Frame size the poller accepts
    pub fsdi: u8,
    /// DID to assign, 0 for none
    pub did: u8,
    /// Highest rate PPS may select
    pub max_bit_rate: BitRate,
}

impl PollerParams {
    /// 256 byte frames, no DID
    pub fn new(max_bit_rate: BitRate) -> Self {
        Self {
            fsdi: ISODEP_FSXI_256,
            did: ISODEP_NO_DID,
            max_bit_rate,
        }
    }
}

/// ATS content sent by the engine when a remote poller sends RATS
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtsParams {
    /// Frame size we accept
    pub fsci: u8,
    /// Frame waiting time integer
    pub fwi: u8,
    /// Start-up frame guard time integer
    pub sfgi: u8,
    /// Advertise DID support in TC(1)
    pub did_supported: bool,
    /// Same divisor in both directions
    pub same_divisor: bool,
    /// Historical bytes appended to the ATS
    pub historical_bytes: Vec<u8>,
}

impl Default for AtsParams {
    fn default() -> Self {
        Self {
            fsci: ISODEP_FSXI_256,
            fwi: ISODEP_DEFAULT_FWI,
            sfgi: ISODEP_DEFAULT_SFGI,
            did_supported: false,
            same_divisor: true,
            historical_bytes: Vec::new(),
        }
    }
}

/// Frame size selected by an FSDI/FSCI value (ISO14443-4 table)
pub fn fsxi_to_frame_size(fsxi: u8) -> usize {
    match fsxi {
        0 => 16,
        1 => 24,
        2 => 32,
        3 => 40,
        4 => 48,
        5 => 64,
        6 => 96,
        7 => 128,
        8 => 256,
        9 => 512,
        10 => 1024,
        11 => 2048,
        12 => 4096,
        _ => 256,
    }
}
