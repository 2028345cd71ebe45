// libnfcdisc/src/transport/traits.rs
//! Collaborator contract of the discovery engine.
//!
//! The radio driver, the technology pollers and the ISO-DEP/NFC-DEP layers
//! are external to this crate. The engine only sequences calls to them, so
//! every multi-frame operation is split into a `start_*` call and a
//! `*_status` call returning `Poll::Pending` while it is in progress.

use std::task::Poll;

use crate::config::{ListenConfig, WakeupConfig};
use crate::device::{IsoDepInfo, ListenDevice, NfcDepInfo};
use crate::protocol::{AtrParams, AtsParams, PollerParams, TargetParams};
use crate::technology::Technology;
use crate::types::{BitRate, ComplianceMode, ListenMask, LmState, RfMode, TxRxFlags};
use crate::Result;

/// Low-level radio driver of the contactless front-end
pub trait RadioDriver {
    /// One-time driver initialisation
    fn initialize(&mut self) -> Result<()>;

    /// Load analog calibration tables. Default is a no-op for front-ends
    /// without calibration data.
    fn analog_config_initialize(&mut self) {}

    /// Driver background processing, run once per engine tick before any
    /// engine logic
    fn worker(&mut self);

    /// Platform clock in milliseconds. Wraps around.
    fn millis(&self) -> u32;

    /// Switch the radio mode and bit rates
    fn set_mode(&mut self, mode: RfMode, tx_bit_rate: BitRate, rx_bit_rate: BitRate) -> Result<()>;

    /// Turn the field on (if not already) and start the guard time
    fn field_on_and_start_gt(&mut self) -> Result<()>;

    /// Turn the field off
    fn field_off(&mut self) -> Result<()>;

    /// Guard time started by `field_on_and_start_gt` is over
    fn is_gt_expired(&self) -> bool;

    /// Send `tx` and wait up to `fwt` for the answer
    fn start_transceive(&mut self, tx: &[u8], flags: TxRxFlags, fwt: u32) -> Result<()>;

    /// Copy the received frame into `rx` once complete and return its length
    fn transceive_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>>;
}

/// Per-technology poller modules (NFC-A/B/F/V, ST25TB)
pub trait TechnologyPoller {
    /// Configure the radio for `tech`. `BitRate::Keep` selects the
    /// technology's default rate.
    fn poller_initialize(&mut self, tech: Technology, bit_rate: BitRate) -> Result<()>;

    /// One-shot presence check. `Ok` means at least one device answered.
    fn technology_detection(&mut self, tech: Technology, compliance: ComplianceMode) -> Result<()>;

    /// Start identification of at most `capacity` devices
    fn start_collision_resolution(
        &mut self,
        tech: Technology,
        compliance: ComplianceMode,
        capacity: usize,
    ) -> Result<()>;

    /// Devices found once resolution is complete
    fn collision_resolution_status(&mut self) -> Poll<Result<Vec<ListenDevice>>>;

    /// Broadcast wake-up (WUPA for NFC-A, ALLB_REQ for NFC-B)
    fn wake_up(&mut self, tech: Technology) -> Result<()>;

    /// Select one specific device after a wake-up
    fn select(&mut self, device: &ListenDevice) -> Result<()>;
}

/// Parameters shared by the chaining transceive primitives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainingParams {
    /// Remote frame size
    pub fsx: usize,
    /// Frame waiting time
    pub fwt: u32,
    /// Delta frame waiting time
    pub dfwt: u32,
    /// DID in use, 0 for none
    pub did: u8,
}

/// ISO14443-4 layer
pub trait IsoDepLayer {
    /// RATS/PPS for NFC-A or ATTRIB for NFC-B
    fn isodep_poller_start_activation(
        &mut self,
        device: &ListenDevice,
        params: &PollerParams,
    ) -> Result<()>;

    /// Remote ATS or ATTRIB answer, once activation completes
    fn isodep_poller_activation_status(&mut self) -> Poll<Result<IsoDepInfo>>;

    /// Answer a received RATS with the given ATS
    fn isodep_listen_start_activation(&mut self, ats: &AtsParams, rats: &[u8]) -> Result<()>;

    /// Negotiated parameters once the remote poller sent its first I-block
    fn isodep_listen_activation_status(&mut self) -> Poll<Result<IsoDepInfo>>;

    /// Send one APDU, chained into frames of `params.fsx`
    fn isodep_start_apdu_transceive(&mut self, apdu: &[u8], params: &ChainingParams) -> Result<()>;

    /// Reassembled answer APDU
    fn isodep_apdu_transceive_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>>;

    /// S(DESELECT)
    fn isodep_deselect(&mut self) -> Result<()>;
}

/// NFCIP-1 layer
pub trait NfcDepLayer {
    /// ATR_REQ (and PSL_REQ when allowed) as initiator. Completes in one
    /// call.
    fn nfcdep_initiator_activate(&mut self, params: &AtrParams) -> Result<NfcDepInfo>;

    /// Answer a received ATR_REQ as target
    fn nfcdep_listen_start_activation(&mut self, params: &TargetParams, atr_req: &[u8]) -> Result<()>;

    /// Negotiated parameters once the initiator finished PSL
    fn nfcdep_listen_activation_status(&mut self) -> Poll<Result<NfcDepInfo>>;

    /// Send one PDU, chained as needed
    fn nfcdep_start_pdu_transceive(&mut self, pdu: &[u8], params: &ChainingParams) -> Result<()>;

    /// Reassembled answer PDU
    fn nfcdep_pdu_transceive_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>>;

    /// RLS_REQ
    fn nfcdep_release(&mut self) -> Result<()>;

    /// DSL_REQ
    fn nfcdep_deselect(&mut self) -> Result<()>;
}

/// What listen mode currently reports
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenStatus {
    /// Current listen state
    pub state: LmState,
    /// Length of a frame received from the remote poller, copied into the
    /// caller's buffer
    pub received: Option<usize>,
    /// Bit rate the remote poller used
    pub bit_rate: BitRate,
}

/// Card emulation / target mode of the driver
pub trait ListenMode {
    /// Start listening for the technologies in `mask`
    fn listen_start(&mut self, mask: ListenMask, config: &ListenConfig) -> Result<()>;

    /// Current listen state and the frame received in it, if any
    fn listen_state(&mut self, rx: &mut [u8]) -> ListenStatus;

    /// Move the listen state machine to `state`
    fn listen_set_state(&mut self, state: LmState) -> Result<()>;

    /// Enter a sleep state and wait for the remote poller to wake us again
    fn listen_sleep_start(&mut self, state: LmState) -> Result<()>;

    /// Leave listen mode
    fn listen_stop(&mut self) -> Result<()>;
}

/// Low power field detection
pub trait WakeupMode {
    /// `None` uses the driver's default configuration
    fn wakeup_start(&mut self, config: Option<&WakeupConfig>) -> Result<()>;

    /// A measurement crossed its threshold
    fn wakeup_has_woke(&mut self) -> bool;

    /// Leave wake-up mode
    fn wakeup_stop(&mut self) -> Result<()>;
}

/// Everything the engine drives
pub trait Frontend: RadioDriver + TechnologyPoller + IsoDepLayer + NfcDepLayer + ListenMode + WakeupMode {}

impl<T> Frontend for T where
    T: RadioDriver + TechnologyPoller + IsoDepLayer + NfcDepLayer + ListenMode + WakeupMode
{
}
