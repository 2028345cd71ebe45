// libnfcdisc/src/engine/listen.rs
//! Listener role: card emulation and NFC-DEP target.
//!
//! Listen mode is only entered after polling found nothing. The remote
//! poller drives everything; the engine inspects the first frame it sends
//! and picks the matching activation.

use std::task::Poll;

use log::{debug, info, warn};

use super::Engine;
use super::state::Phase;
use crate::{Error, Result};

impl Engine {
    /// `ListenTechDetect`: enable listen mode for the configured mask, or
    /// give up and restart once the discovery period is over
    pub(super) fn listen_detect_tick(&mut self) {
        if self.disc_timer_expired() {
            self.stop_listening();
            self.enter_notify(Phase::StartDiscovery);
            return;
        }

        #[cfg(feature = "listen")]
        if !self.lm_mask.is_empty() {
            match self.fe.listen_start(self.lm_mask, &self.params.listen) {
                Ok(()) => {
                    debug!("listen mode started, mask {:#04x}", self.lm_mask.bits());
                    self.enter(Phase::ListenCollAvoidance);
                }
                Err(e) => debug!("listen mode not started: {}", e),
            }
        }
    }

    /// `ListenCollAvoidance`: wait for a remote field
    pub(super) fn listen_field_tick(&mut self) {
        if self.disc_timer_expired() {
            self.stop_listening();
            self.enter_notify(Phase::StartDiscovery);
            return;
        }

        #[cfg(feature = "listen")]
        {
            let st = self.fe.listen_state(&mut self.rf_buf[..]);
            if st.state >= crate::types::LmState::Idle {
                if let Some(n) = st.received {
                    self.rx_len = n.min(self.rf_buf.len());
                }
                debug!("remote field detected ({:?})", st.state);
                self.enter(Phase::ListenActivation);
            }
        }
    }

    /// `ListenActivation` and `ListenSleep`
    pub(super) fn listen_activation_tick(&mut self) {
        if self.disc_timer_expired() {
            self.stop_listening();
            self.enter_notify(Phase::StartDiscovery);
            return;
        }

        match self.listen_activate() {
            Poll::Pending => {}
            Poll::Ready(Ok(())) => {
                self.active = Some(0);
                self.exchange = None;
                if let Some(rec) = self.devices.first() {
                    info!("activated by remote {}", rec);
                }
                self.enter_notify(Phase::Activated);
            }
            Poll::Ready(Err(e)) => {
                warn!("listen activation failed: {}", e);
                self.stop_listening();
                self.enter_notify(Phase::StartDiscovery);
            }
        }
    }

    fn stop_listening(&mut self) {
        #[cfg(feature = "listen")]
        let res = self.fe.listen_stop();
        #[cfg(not(feature = "listen"))]
        let res = self.fe.field_off();
        if let Err(e) = res {
            warn!("listen stop failed: {}", e);
        }
    }

    #[cfg(not(feature = "listen"))]
    fn listen_activate(&mut self) -> Poll<Result<()>> {
        Poll::Ready(Err(Error::Disabled("listen")))
    }

    #[cfg(feature = "listen")]
    fn listen_activate(&mut self) -> Poll<Result<()>> {
        use crate::device::{DeviceRecord, PollerKind, ProtocolInfo};
        use crate::protocol::frame::{self, ListenFrame};
        use crate::types::{LmState, RfInterface};

        let st = self.fe.listen_state(&mut self.rf_buf[..]);
        let data = st.received.map(|n| self.take_received(n));

        match st.state {
            LmState::ActiveA | LmState::ActiveAx => {
                let Some(data) = data else {
                    return Poll::Pending;
                };
                match frame::classify_nfca(&data) {
                    ListenFrame::SleepReq => {
                        self.fe.listen_sleep_start(LmState::SleepA)?;
                        debug!("SLP_REQ received");
                    }
                    _ if self.params.activate_after_sak => {
                        let mut rec = DeviceRecord::poller(PollerKind::NfcA);
                        rec.interface = Some(RfInterface::RfRaw);
                        self.devices = vec![rec];
                        self.fe.listen_set_state(LmState::ActiveA)?;
                        return Poll::Ready(Ok(()));
                    }
                    #[cfg(feature = "iso-dep")]
                    ListenFrame::Rats => {
                        use crate::protocol::AtsParams;

                        self.fe.listen_set_state(LmState::CardEmu4A)?;
                        self.fe.isodep_listen_start_activation(&AtsParams::default(), &data)?;
                        debug!("RATS received, ATS sent");
                    }
                    #[cfg(feature = "nfc-dep")]
                    ListenFrame::AtrReq(atr) => {
                        self.devices = vec![DeviceRecord::poller(PollerKind::NfcA)];
                        self.start_target(atr, crate::types::CommMode::Passive)?;
                    }
                    _ => return Poll::Ready(Err(Error::Protocol("unexpected first frame in NFC-A"))),
                }
                Poll::Pending
            }

            LmState::CardEmu4A => {
                let info = match self.fe.isodep_listen_activation_status() {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(res) => res?,
                };
                let mut rec = DeviceRecord::poller(PollerKind::NfcA);
                rec.interface = Some(RfInterface::IsoDep);
                rec.protocol = ProtocolInfo::IsoDep(info);
                self.devices = vec![rec];
                Poll::Ready(Ok(()))
            }

            LmState::ReadyF => {
                if let Some(data) = data {
                    match frame::classify_nfcf(&data) {
                        #[cfg(feature = "nfc-dep")]
                        ListenFrame::AtrReq(atr) => {
                            self.devices = vec![DeviceRecord::poller(PollerKind::NfcF)];
                            self.start_target(atr, crate::types::CommMode::Passive)?;
                        }
                        // First T3T command already received
                        _ => self.fe.listen_set_state(LmState::CardEmu3)?,
                    }
                }
                Poll::Pending
            }

            LmState::CardEmu3 => {
                let mut rec = DeviceRecord::poller(PollerKind::NfcF);
                rec.interface = Some(RfInterface::RfRaw);
                self.devices = vec![rec];
                Poll::Ready(Ok(()))
            }

            #[cfg(feature = "nfc-dep")]
            LmState::TargetA | LmState::TargetF => {
                let info = match self.fe.nfcdep_listen_activation_status() {
                    Poll::Pending => return Poll::Pending,
                    Poll::Ready(res) => res?,
                };
                let rec = self
                    .devices
                    .first_mut()
                    .ok_or(Error::Internal("NFC-DEP target without poller record".into()))?;
                rec.interface = Some(RfInterface::NfcDep);
                rec.nfcid = info.nfcid3;
                rec.protocol = ProtocolInfo::NfcDep(info);
                Poll::Ready(Ok(()))
            }

            LmState::Idle => {
                let Some(data) = data else {
                    return Poll::Pending;
                };
                if !self.lm_mask.contains(crate::types::ListenMask::ACTIVE_P2P) {
                    return Poll::Pending;
                }
                self.activate_ap2p_target(&data, st.bit_rate)
            }

            LmState::ReadyA | LmState::ReadyAx | LmState::SleepA | LmState::SleepAf => Poll::Pending,

            // Remote field gone before activation completed
            LmState::PowerOff => Poll::Ready(Err(Error::LinkLoss)),

            other => Poll::Ready(Err(Error::Internal(format!("unexpected listen state {:?}", other)))),
        }
    }

    /// Copy out the frame the driver reported, never past the RF buffer
    #[cfg(feature = "listen")]
    fn take_received(&mut self, n: usize) -> Vec<u8> {
        let n = n.min(self.rf_buf.len());
        self.rx_len = n;
        self.rf_buf[..n].to_vec()
    }

    /// Active P2P: the initiator's ATR_REQ arrives in `Idle` with a header
    /// depending on the bit rate it used
    #[cfg(feature = "listen")]
    fn activate_ap2p_target(&mut self, data: &[u8], bit_rate: crate::types::BitRate) -> Poll<Result<()>> {
        #[cfg(feature = "nfc-dep")]
        {
            use crate::device::{DeviceRecord, PollerKind};
            use crate::protocol::frame;
            use crate::types::{CommMode, RfMode};

            let header = frame::ap2p_header_len(bit_rate);
            if let Some(atr) = frame::atr_req_after_header(data, header) {
                self.devices = vec![DeviceRecord::poller(PollerKind::Ap2p)];
                self.fe.set_mode(RfMode::ListenActiveP2p, bit_rate, bit_rate)?;
                self.start_target(atr, CommMode::Active)?;
                return Poll::Pending;
            }
        }
        #[cfg(not(feature = "nfc-dep"))]
        let _ = (data, bit_rate);
        Poll::Ready(Err(Error::Protocol("unexpected first frame in active mode")))
    }

    /// Answer an ATR_REQ as NFC-DEP target
    #[cfg(all(feature = "listen", feature = "nfc-dep"))]
    fn start_target(&mut self, atr_req: &[u8], comm_mode: crate::types::CommMode) -> Result<()> {
        use crate::constants::{
            NFCDEP_GB_MAX_LEN, NFCDEP_LR_254, NFCDEP_OPER_DEFAULT, NFCDEP_WT_TRG_MAX_L13,
        };
        use crate::protocol::TargetParams;
        use crate::protocol::nfcdep::lr_to_pp;
        use crate::types::{LmState, Nfcid};

        if self.params.general_bytes.len() >= NFCDEP_GB_MAX_LEN {
            return Err(Error::Param("general bytes too long for ATR_RES"));
        }
        let target = TargetParams {
            comm_mode,
            nfcid3: Nfcid::try_from(&self.params.nfcid3[..])?,
            bst: 0,
            brt: 0,
            to: NFCDEP_WT_TRG_MAX_L13,
            ppt: lr_to_pp(NFCDEP_LR_254),
            general_bytes: self.params.general_bytes.clone(),
            oper_param: NFCDEP_OPER_DEFAULT,
        };
        // Passive NFC-A targets answer in TargetA, everything else in TargetF
        let next = match (comm_mode, self.devices.first().map(|r| &r.remote)) {
            (
                crate::types::CommMode::Passive,
                Some(crate::device::Remote::Poller(crate::device::PollerKind::NfcA)),
            ) => LmState::TargetA,
            _ => LmState::TargetF,
        };
        self.fe.listen_set_state(next)?;
        self.fe.nfcdep_listen_start_activation(&target, atr_req)?;
        debug!("ATR_REQ received, ATR_RES sent ({:?})", comm_mode);
        Ok(())
    }
}
