// libnfcdisc/src/engine/detect.rs
//! Technology detection: one presence probe per requested technology, in
//! `POLL_ORDER`, each after its own guard time.

use std::task::Poll;

use log::{debug, trace};

use super::Engine;
use super::state::DetectStep;
use crate::Result;
use crate::technology::{POLL_ORDER, Technology};
use crate::types::BitRate;

impl Engine {
    /// Ready once every requested technology has been probed. Finding
    /// nothing is a valid outcome; only driver setup failures are errors.
    pub(super) fn detect(&mut self, step: &mut DetectStep) -> Poll<Result<()>> {
        for &tech in POLL_ORDER {
            if !self.techs_todo.contains(tech.mask()) {
                continue;
            }

            #[cfg(feature = "nfc-dep")]
            if tech == Technology::Ap2p {
                return self.detect_ap2p(step);
            }

            if *step == DetectStep::Next {
                self.fe.poller_initialize(tech, self.poll_bit_rate(tech))?;
                self.fe.field_on_and_start_gt()?;
                *step = DetectStep::GuardTime(tech);
            }

            if self.fe.is_gt_expired() {
                match self.fe.technology_detection(tech, self.params.compliance) {
                    Ok(()) => {
                        debug!("{} present", tech);
                        self.techs_found.insert(tech.mask());
                    }
                    Err(e) => trace!("{} not detected: {}", tech, e),
                }
                *step = DetectStep::Next;
                self.techs_todo.remove(tech.mask());
            }
            return Poll::Pending;
        }
        Poll::Ready(Ok(()))
    }

    /// Active P2P has no separate presence check: the ATR exchange is the
    /// probe. A peer that answers ends detection for this cycle.
    #[cfg(feature = "nfc-dep")]
    fn detect_ap2p(&mut self, step: &mut DetectStep) -> Poll<Result<()>> {
        use crate::device::{DeviceRecord, ListenDevice, ProtocolInfo};
        use crate::types::{CommMode, RfInterface, RfMode, TechMask};
        use log::{info, warn};

        if *step == DetectStep::Next {
            let br = self.params.ap2p_bit_rate;
            self.fe.set_mode(RfMode::PollActiveP2p, br, br)?;
            self.fe.field_on_and_start_gt()?;
            *step = DetectStep::GuardTime(Technology::Ap2p);
        }

        if self.fe.is_gt_expired() {
            self.techs_todo.remove(TechMask::POLL_AP2P);
            *step = DetectStep::Next;

            let atr = self.initiator_params(None, CommMode::Active);
            match self.fe.nfcdep_initiator_activate(&atr) {
                Ok(info) => {
                    info!("AP2P peer activated, NFCID3 {}", info.nfcid3.to_hex());
                    self.techs_found.insert(TechMask::POLL_AP2P);
                    let mut rec = DeviceRecord::listener(ListenDevice::Ap2p);
                    rec.interface = Some(RfInterface::NfcDep);
                    rec.protocol = ProtocolInfo::NfcDep(info);
                    self.devices.push(rec);
                    return Poll::Ready(Ok(()));
                }
                Err(e) => {
                    trace!("no AP2P peer: {}", e);
                    if let Err(e) = self.fe.field_off() {
                        warn!("field off failed: {}", e);
                    }
                }
            }
        }
        Poll::Pending
    }

    /// Bit rate handed to the technology poller: NFC-F polls at the
    /// configured rate, everything else at its default.
    pub(super) fn poll_bit_rate(&self, tech: Technology) -> BitRate {
        match tech {
            Technology::NfcF => self.params.nfcf_bit_rate,
            _ => BitRate::Keep,
        }
    }
}
