// libnfcdisc/src/engine/exchange.rs
//! Data exchange over whichever interface activation assigned.
//!
//! The receive buffer depends on the interface: raw frames land in the RF
//! buffer, ISO-DEP APDUs and NFC-DEP PDUs in their own reassembly buffers.

use std::task::Poll;

use log::{debug, trace};

use super::Engine;
use super::state::Phase;
#[cfg(feature = "iso-dep")]
use crate::constants::ISODEP_NO_DID;
use crate::device::{PollerKind, Remote};
#[cfg(any(feature = "iso-dep", feature = "nfc-dep"))]
use crate::transport::ChainingParams;
use crate::types::{RfInterface, TxRxFlags};
use crate::utils::bytes_to_hex_spaced;
use crate::{Error, Result};

/// Identifies one started exchange. A handle from an earlier exchange (or
/// an earlier activation) is rejected by `data_exchange_status`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExchangeHandle {
    seq: u32,
    interface: RfInterface,
}

impl ExchangeHandle {
    /// Interface the exchange was started on
    pub fn interface(&self) -> RfInterface {
        self.interface
    }
}

#[derive(Debug)]
pub(super) struct Exchange {
    seq: u32,
    interface: RfInterface,
    /// Terminal result, re-reported until the next exchange starts
    result: Option<Result<usize>>,
}

impl Engine {
    /// Start an exchange with the active device. `fwt` and `flags` only
    /// apply to the raw RF interface; ISO-DEP and NFC-DEP use the timings
    /// negotiated at activation.
    ///
    /// In listener role the first call must pass an empty `tx`: the first
    /// command of the remote poller was already received during activation
    /// and is returned as the response.
    pub fn data_exchange_start(
        &mut self,
        tx: &[u8],
        fwt: u32,
        flags: TxRxFlags,
    ) -> Result<ExchangeHandle> {
        if !self.state().is_device_activated() {
            return Err(Error::WrongState);
        }
        let idx = self.active.ok_or(Error::WrongState)?;
        let rec = self.devices.get(idx).ok_or(Error::WrongState)?;
        let interface = rec
            .interface
            .ok_or(Error::Param("active device has no interface"))?;

        if self.phase == Phase::Activated && !rec.is_remote_listener() {
            if !tx.is_empty() {
                return Err(Error::WrongState);
            }
            let t3t = rec.remote == Remote::Poller(PollerKind::NfcF)
                && interface == RfInterface::RfRaw;
            let handle = self.new_exchange(interface);
            if self.params.activate_after_sak {
                // SAK already sent by the driver; nothing to wait for
                self.cache_result(Ok(self.rx_len));
                self.enter(Phase::DataExchangeDone);
            } else {
                if t3t {
                    self.cache_result(Ok(self.rx_len));
                }
                self.enter(Phase::DataExchange);
            }
            return Ok(handle);
        }

        debug!("tx {} via {}: {}", tx.len(), interface, bytes_to_hex_spaced(tx));
        match interface {
            RfInterface::RfRaw => self.fe.start_transceive(tx, flags, fwt)?,

            #[cfg(feature = "iso-dep")]
            RfInterface::IsoDep => {
                let info = *rec.iso_dep().ok_or(Error::Internal("ISO-DEP info missing".into()))?;
                if tx.len() > self.apdu_buf.len() {
                    return Err(Error::NoMemory {
                        capacity: self.apdu_buf.len(),
                        required: tx.len(),
                    });
                }
                let params = ChainingParams {
                    fsx: info.fsx,
                    fwt: info.fwt,
                    dfwt: info.dfwt,
                    did: ISODEP_NO_DID,
                };
                self.apdu_buf[..tx.len()].copy_from_slice(tx);
                self.fe
                    .isodep_start_apdu_transceive(&self.apdu_buf[..tx.len()], &params)?;
            }

            #[cfg(feature = "nfc-dep")]
            RfInterface::NfcDep => {
                let info = rec.nfc_dep().ok_or(Error::Internal("NFC-DEP info missing".into()))?;
                if tx.len() > self.pdu_buf.len() {
                    return Err(Error::NoMemory {
                        capacity: self.pdu_buf.len(),
                        required: tx.len(),
                    });
                }
                let params = ChainingParams {
                    fsx: info.frame_size(),
                    fwt: info.fwt,
                    dfwt: info.dfwt,
                    did: info.did,
                };
                self.pdu_buf[..tx.len()].copy_from_slice(tx);
                self.fe
                    .nfcdep_start_pdu_transceive(&self.pdu_buf[..tx.len()], &params)?;
            }

            #[allow(unreachable_patterns)]
            _ => return Err(Error::Disabled("interface not compiled in")),
        }

        let handle = self.new_exchange(interface);
        self.enter(Phase::DataExchange);
        Ok(handle)
    }

    /// Poll the exchange started with `handle`. The returned slice borrows
    /// the engine's receive buffer for the interface.
    pub fn data_exchange_status(&mut self, handle: ExchangeHandle) -> Poll<Result<&[u8]>> {
        match &self.exchange {
            Some(ex) if ex.seq == handle.seq => {}
            _ => return Poll::Ready(Err(Error::WrongState)),
        }
        match self.exchange_step() {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            Poll::Ready(Ok(n)) => {
                let buf: &[u8] = match handle.interface {
                    RfInterface::RfRaw => &self.rf_buf[..],
                    RfInterface::IsoDep => &self.apdu_buf[..],
                    RfInterface::NfcDep => &self.pdu_buf[..],
                };
                Poll::Ready(Ok(&buf[..n.min(buf.len())]))
            }
        }
    }

    /// Advance the current exchange. Once a terminal result is known it is
    /// cached, the state moves on (`DataExchangeDone`, or `ListenSleep` when
    /// the remote poller put us to sleep) and later calls re-report it.
    pub(super) fn exchange_step(&mut self) -> Poll<Result<usize>> {
        let Some(ex) = self.exchange.as_ref() else {
            return Poll::Ready(Err(Error::WrongState));
        };
        let interface = ex.interface;
        if let Some(res) = ex.result.clone() {
            if self.phase == Phase::DataExchange {
                self.exchange_done(&res);
            }
            return Poll::Ready(res);
        }
        if self.phase != Phase::DataExchange {
            return Poll::Ready(Err(Error::WrongState));
        }

        let polled = match interface {
            RfInterface::RfRaw => self.fe.transceive_status(&mut self.rf_buf[..]),
            RfInterface::IsoDep => self.fe.isodep_apdu_transceive_status(&mut self.apdu_buf[..]),
            RfInterface::NfcDep => self.fe.nfcdep_pdu_transceive_status(&mut self.pdu_buf[..]),
        };
        let res = match polled {
            Poll::Pending => return Poll::Pending,
            Poll::Ready(Ok(n)) => {
                self.rx_len = n;
                trace!("rx {} via {}", n, interface);
                Ok(n)
            }
            Poll::Ready(Err(Error::SleepRequested)) => self.arm_listen_sleep(),
            Poll::Ready(Err(e)) => {
                debug!("exchange via {} failed: {}", interface, e);
                Err(e)
            }
        };

        self.cache_result(res.clone());
        self.exchange_done(&res);
        Poll::Ready(res)
    }

    /// The remote poller sent SLP_REQ: go to sleep and keep reporting it
    fn arm_listen_sleep(&mut self) -> Result<usize> {
        #[cfg(feature = "listen")]
        {
            self.fe.listen_sleep_start(crate::types::LmState::SleepA)?;
            debug!("sleep requested by remote poller");
        }
        Err(Error::SleepRequested)
    }

    fn exchange_done(&mut self, res: &Result<usize>) {
        match res {
            Err(Error::SleepRequested) => self.enter_notify(Phase::ListenSleep),
            _ => self.enter_notify(Phase::DataExchangeDone),
        }
    }

    fn new_exchange(&mut self, interface: RfInterface) -> ExchangeHandle {
        self.exchange_seq = self.exchange_seq.wrapping_add(1);
        self.exchange = Some(Exchange {
            seq: self.exchange_seq,
            interface,
            result: None,
        });
        ExchangeHandle {
            seq: self.exchange_seq,
            interface,
        }
    }

    fn cache_result(&mut self, res: Result<usize>) {
        if let Some(ex) = self.exchange.as_mut() {
            ex.result = Some(res);
        }
    }
}
