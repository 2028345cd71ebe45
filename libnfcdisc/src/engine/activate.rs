// libnfcdisc/src/engine/activate.rs
//! Poller-side activation of the selected device.

use std::task::Poll;

use log::{debug, info};

use super::Engine;
use super::state::ActivationStep;
use crate::constants::{
    NFCDEP_BX_NO_HIGH_BR, NFCDEP_DID_NO, NFCDEP_LR_254, NFCDEP_NAD_NO, NFCDEP_OPER_DEFAULT,
};
use crate::device::{ListenDevice, NfcaType, ProtocolInfo};
use crate::protocol::AtrParams;
use crate::technology::Technology;
use crate::types::{BitRate, CommMode, Nfcid, RfInterface};
use crate::{Error, Result};

/// What activation settled for the device
struct Activation {
    nfcid: Nfcid,
    interface: RfInterface,
    protocol: ProtocolInfo,
}

impl Activation {
    fn raw(nfcid: Nfcid) -> Self {
        Self {
            nfcid,
            interface: RfInterface::RfRaw,
            protocol: ProtocolInfo::None,
        }
    }
}

impl Engine {
    pub(super) fn activate(&mut self, step: &mut ActivationStep) -> Poll<Result<()>> {
        let idx = self.selected;
        let Some(dev) = self.devices.get(idx).and_then(|r| r.listen_device()).cloned() else {
            return Poll::Ready(Err(Error::WrongState));
        };

        let act = match &dev {
            ListenDevice::Ap2p => match self.devices[idx].nfc_dep() {
                // ATR_REQ already exchanged during detection
                Some(info) => Activation {
                    nfcid: info.nfcid3,
                    interface: RfInterface::NfcDep,
                    protocol: ProtocolInfo::NfcDep(info.clone()),
                },
                None => return Poll::Ready(Err(Error::Internal("AP2P device without ATR".into()))),
            },

            ListenDevice::NfcA(a) => {
                if *step == ActivationStep::Start {
                    self.fe.poller_initialize(Technology::NfcA, BitRate::Keep)?;
                    *step = ActivationStep::Initialized;
                    return Poll::Pending;
                }
                if a.is_sleep {
                    if *step == ActivationStep::Woken {
                        self.fe.select(&dev)?;
                        self.wake_selected();
                        *step = ActivationStep::Initialized;
                    } else {
                        self.fe.wake_up(Technology::NfcA)?;
                        *step = ActivationStep::Woken;
                    }
                    return Poll::Pending;
                }

                match a.kind {
                    NfcaType::T1t => {
                        let uid = a.rid_uid.unwrap_or_default();
                        Activation::raw(Nfcid::try_from(&uid[..])?)
                    }
                    NfcaType::T2t => Activation::raw(a.nfcid1),
                    NfcaType::T4t => match self.activate_iso_dep(&dev, step) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(res) => res?.with_nfcid(a.nfcid1),
                    },
                    NfcaType::NfcDep | NfcaType::T4tNfcDep => self.activate_nfc_dep(&dev, a.nfcid1)?,
                }
            }

            ListenDevice::NfcB(b) => {
                if *step == ActivationStep::Start {
                    self.fe.poller_initialize(Technology::NfcB, BitRate::Keep)?;
                    *step = ActivationStep::Initialized;
                    return Poll::Pending;
                }
                if b.is_sleep && *step == ActivationStep::Initialized {
                    // ALLB_REQ may collide; NFCID0 is known so ATTRIB still addresses
                    // the right card
                    if let Err(e) = self.fe.wake_up(Technology::NfcB) {
                        debug!("ALLB_REQ: {}", e);
                    }
                    self.wake_selected();
                }
                let nfcid = Nfcid::try_from(&b.nfcid0[..])?;
                if b.supports_iso_dep() {
                    match self.activate_iso_dep(&dev, step) {
                        Poll::Pending => return Poll::Pending,
                        Poll::Ready(res) => res?.with_nfcid(nfcid),
                    }
                } else {
                    Activation::raw(nfcid)
                }
            }

            ListenDevice::NfcF(f) => {
                self.fe
                    .poller_initialize(Technology::NfcF, self.params.nfcf_bit_rate)?;
                let nfcid2 = Nfcid::try_from(&f.nfcid2[..])?;
                if cfg!(feature = "nfc-dep") && f.supports_nfc_dep() {
                    self.activate_nfc_dep(&dev, nfcid2)?
                } else {
                    Activation::raw(nfcid2)
                }
            }

            ListenDevice::NfcV(v) => {
                self.fe.poller_initialize(Technology::NfcV, BitRate::Keep)?;
                Activation::raw(Nfcid::try_from(&v.uid[..])?)
            }

            ListenDevice::St25tb(s) => {
                self.fe.poller_initialize(Technology::St25tb, BitRate::Keep)?;
                Activation::raw(Nfcid::try_from(&s.uid[..])?)
            }
        };

        let rec = &mut self.devices[idx];
        rec.nfcid = act.nfcid;
        rec.interface = Some(act.interface);
        rec.protocol = act.protocol;
        info!("activated {}", rec);
        self.active = Some(idx);
        Poll::Ready(Ok(()))
    }

    fn wake_selected(&mut self) {
        if let Some(dev) = self
            .devices
            .get_mut(self.selected)
            .and_then(|r| r.listen_device_mut())
        {
            dev.set_awake();
        }
    }

    /// RATS/PPS (NFC-A) or ATTRIB (NFC-B). Without ISO-DEP support the
    /// device is used through the raw RF interface.
    fn activate_iso_dep(
        &mut self,
        dev: &ListenDevice,
        step: &mut ActivationStep,
    ) -> Poll<Result<Activation>> {
        #[cfg(feature = "iso-dep")]
        {
            use crate::protocol::PollerParams;

            if *step != ActivationStep::IsoDep {
                let params = PollerParams::new(self.params.max_bit_rate);
                self.fe.isodep_poller_start_activation(dev, &params)?;
                *step = ActivationStep::IsoDep;
                return Poll::Pending;
            }
            match self.fe.isodep_poller_activation_status() {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Ok(info)) => {
                    debug!("ISO-DEP up: FSC {} FWT {}", info.fsx, info.fwt);
                    Poll::Ready(Ok(Activation {
                        nfcid: Nfcid::empty(),
                        interface: RfInterface::IsoDep,
                        protocol: ProtocolInfo::IsoDep(info),
                    }))
                }
                Poll::Ready(Err(e)) => Poll::Ready(Err(e)),
            }
        }
        #[cfg(not(feature = "iso-dep"))]
        {
            let _ = (dev, step);
            Poll::Ready(Ok(Activation::raw(Nfcid::empty())))
        }
    }

    /// Passive ATR_REQ (and PSL_REQ) in one call. Without NFC-DEP support
    /// the device is used through the raw RF interface with `fallback` as
    /// its identifier.
    fn activate_nfc_dep(&mut self, dev: &ListenDevice, fallback: Nfcid) -> Result<Activation> {
        if !cfg!(feature = "nfc-dep") {
            return Ok(Activation::raw(fallback));
        }
        let atr = self.initiator_params(Some(dev), CommMode::Passive);
        let info = self.fe.nfcdep_initiator_activate(&atr)?;
        debug!("NFC-DEP up: PPt {:#04x} GB {} bytes", info.pp, info.general_bytes.len());
        Ok(Activation {
            nfcid: info.nfcid3,
            interface: RfInterface::NfcDep,
            protocol: ProtocolInfo::NfcDep(info),
        })
    }

    /// ATR_REQ parameters. NFC-F targets are addressed with their NFCID2,
    /// everything else with the local NFCID3.
    pub(super) fn initiator_params(&self, dev: Option<&ListenDevice>, comm_mode: CommMode) -> AtrParams {
        let nfcid = match dev {
            Some(ListenDevice::NfcF(f)) => Nfcid::try_from(&f.nfcid2[..]),
            _ => Nfcid::try_from(&self.params.nfcid3[..]),
        }
        .unwrap_or_default();
        AtrParams {
            comm_mode,
            oper_param: NFCDEP_OPER_DEFAULT,
            nfcid,
            did: NFCDEP_DID_NO,
            nad: NFCDEP_NAD_NO,
            bs: NFCDEP_BX_NO_HIGH_BR,
            br: NFCDEP_BX_NO_HIGH_BR,
            lr: NFCDEP_LR_254,
            general_bytes: self.params.general_bytes.clone(),
            max_bit_rate: self.params.max_bit_rate,
        }
    }
}

impl Activation {
    /// Keep the anti-collision identifier for protocols that do not
    /// provide their own
    fn with_nfcid(mut self, nfcid: Nfcid) -> Self {
        if self.nfcid.is_empty() {
            self.nfcid = nfcid;
        }
        self
    }
}
