// libnfcdisc/src/engine/mod.rs
//! Poll-driven discovery engine.
//!
//! `Engine::poll` advances the state machine by at most one top-level
//! transition and never blocks. Multi-tick sub-procedures (guard times,
//! anti-collision, activation handshakes, chained exchanges) keep their
//! progress in the `Phase` sub-steps and resume on the next tick.

mod activate;
mod collision;
mod deactivate;
mod detect;
mod exchange;
mod listen;
mod state;

pub use exchange::ExchangeHandle;
pub use state::State;

use std::task::Poll;

use log::{debug, info, trace, warn};

use crate::config::DiscoverParams;
use crate::constants::{ISODEP_APDU_MAX_LEN, NFCDEP_PDU_MAX_LEN, RF_BUF_LEN};
use crate::device::DeviceRecord;
use crate::transport::Frontend;
use crate::types::{ListenMask, TechMask};
use crate::utils::Deadline;
use crate::{Error, Result};

use exchange::Exchange;
use state::{ActivationStep, DetectStep, Phase, ResolveStep};

/// The discovery and activation engine. Owns its front-end; the
/// application owns the engine and drives it through `poll`.
pub struct Engine {
    fe: Box<dyn Frontend>,
    phase: Phase,
    params: DiscoverParams,
    lm_mask: ListenMask,
    techs_todo: TechMask,
    techs_found: TechMask,
    devices: Vec<DeviceRecord>,
    selected: usize,
    active: Option<usize>,
    disc_restart: bool,
    disc_timer: Option<Deadline>,
    rf_buf: [u8; RF_BUF_LEN],
    apdu_buf: Box<[u8; ISODEP_APDU_MAX_LEN]>,
    pdu_buf: Box<[u8; NFCDEP_PDU_MAX_LEN]>,
    rx_len: usize,
    exchange: Option<Exchange>,
    exchange_seq: u32,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("phase", &self.phase)
            .field("techs_todo", &self.techs_todo)
            .field("techs_found", &self.techs_found)
            .field("devices", &self.devices.len())
            .field("active", &self.active)
            .finish()
    }
}

impl Engine {
    /// Engine in `NotInit` driving `fe`. Call `initialize` before anything else.
    pub fn new(fe: Box<dyn Frontend>) -> Self {
        Self {
            fe,
            phase: Phase::NotInit,
            params: DiscoverParams::default(),
            lm_mask: ListenMask::NONE,
            techs_todo: TechMask::NONE,
            techs_found: TechMask::NONE,
            devices: Vec::new(),
            selected: 0,
            active: None,
            disc_restart: false,
            disc_timer: None,
            rf_buf: [0u8; RF_BUF_LEN],
            apdu_buf: Box::new([0u8; ISODEP_APDU_MAX_LEN]),
            pdu_buf: Box::new([0u8; NFCDEP_PDU_MAX_LEN]),
            rx_len: 0,
            exchange: None,
            exchange_seq: 0,
        }
    }

    /// One-time front-end setup. Allowed before the first discovery and
    /// again from `Idle`.
    pub fn initialize(&mut self) -> Result<()> {
        if self.state() > State::Idle {
            return Err(Error::WrongState);
        }
        self.phase = Phase::NotInit;
        self.fe.analog_config_initialize();
        self.fe.initialize()?;
        self.phase = Phase::Idle;
        info!("engine initialized");
        Ok(())
    }

    /// Start a discovery run with `params`. The parameters are kept until
    /// the next call.
    pub fn discover(&mut self, params: DiscoverParams) -> Result<()> {
        if self.phase != Phase::Idle {
            return Err(Error::WrongState);
        }
        params.validate()?;

        self.active = None;
        self.exchange = None;
        self.techs_found = TechMask::NONE;
        self.devices.clear();
        self.disc_restart = true;
        self.lm_mask = ListenMask::from_techs(params.techs);
        info!(
            "discovery started: techs {:#06x}, limit {}",
            params.techs.bits(),
            params.device_limit
        );
        self.params = params;
        self.phase = Phase::StartDiscovery;
        Ok(())
    }

    /// One non-blocking tick. Runs the driver worker first, then at most
    /// one transition of the state machine.
    pub fn poll(&mut self) -> State {
        self.fe.worker();

        match self.phase {
            Phase::NotInit
            | Phase::Idle
            | Phase::PollSelect
            | Phase::Activated
            | Phase::DataExchangeDone => {}

            Phase::StartDiscovery => self.start_discovery(),

            Phase::WakeupMode => self.wakeup_tick(),

            Phase::PollTechDetect(mut step) => {
                if self.disc_timer.is_none() {
                    let now = self.fe.millis();
                    self.disc_timer = Some(Deadline::after(now, self.params.total_duration_ms));
                }
                let res = self.detect(&mut step);
                self.phase = Phase::PollTechDetect(step);
                if let Poll::Ready(res) = res {
                    self.detection_done(res);
                }
            }

            Phase::PollCollAvoidance(mut step) => {
                let res = self.resolve(&mut step);
                self.phase = Phase::PollCollAvoidance(step);
                if let Poll::Ready(res) = res {
                    self.resolution_done(res);
                }
            }

            Phase::PollActivation(mut step) => {
                let res = self.activate(&mut step);
                self.phase = Phase::PollActivation(step);
                match res {
                    Poll::Pending => {}
                    Poll::Ready(Ok(())) => self.enter_notify(Phase::Activated),
                    Poll::Ready(Err(e)) => {
                        warn!("activation of device {} failed: {}", self.selected, e);
                        self.enter(Phase::Deactivation);
                    }
                }
            }

            // Transitions happen inside once the result is known
            Phase::DataExchange => {
                let _ = self.exchange_step();
            }

            Phase::Deactivation => {
                self.deactivate_link();
                let next = if self.disc_restart {
                    Phase::StartDiscovery
                } else {
                    Phase::Idle
                };
                self.enter_notify(next);
            }

            Phase::ListenTechDetect => self.listen_detect_tick(),
            Phase::ListenCollAvoidance => self.listen_field_tick(),
            Phase::ListenActivation | Phase::ListenSleep => self.listen_activation_tick(),
        }

        self.state()
    }

    /// Choose which of several found devices to activate
    pub fn select(&mut self, index: usize) -> Result<()> {
        if self.phase != Phase::PollSelect {
            return Err(Error::WrongState);
        }
        if index >= self.devices.len() {
            return Err(Error::Param("device index out of range"));
        }
        debug!("device {} selected", index);
        self.selected = index;
        self.phase = Phase::PollActivation(ActivationStep::Start);
        Ok(())
    }

    /// Current state, without advancing the engine
    pub fn state(&self) -> State {
        self.phase.state()
    }

    /// Devices found in the current cycle, available from `PollSelect` on
    pub fn devices_found(&self) -> Result<&[DeviceRecord]> {
        if self.state() < State::PollSelect {
            return Err(Error::WrongState);
        }
        Ok(&self.devices)
    }

    /// The activated device. `WrongState` before `Activated`.
    pub fn active_device(&self) -> Result<&DeviceRecord> {
        if self.state() < State::Activated {
            return Err(Error::WrongState);
        }
        self.active
            .and_then(|idx| self.devices.get(idx))
            .ok_or(Error::Request)
    }

    fn enter(&mut self, next: Phase) {
        if self.phase.state() != next.state() {
            trace!("{} -> {}", self.phase.state(), next.state());
        }
        self.phase = next;
    }

    /// Transition and report it to the application callback
    fn enter_notify(&mut self, next: Phase) {
        self.enter(next);
        let state = next.state();
        debug!("state {} ({})", state, state.code());
        if let Some(cb) = self.params.notify.as_mut() {
            cb(state);
        }
    }

    fn disc_timer_expired(&self) -> bool {
        self.disc_timer
            .is_some_and(|t| t.is_expired(self.fe.millis()))
    }

    fn start_discovery(&mut self) {
        self.active = None;
        self.exchange = None;
        self.devices.clear();
        self.selected = 0;
        self.techs_found = TechMask::NONE;
        self.techs_todo = self.params.techs;
        self.disc_timer = None;
        self.enter(Phase::PollTechDetect(DetectStep::Next));

        #[cfg(feature = "wakeup")]
        if self.params.wakeup.is_enabled() {
            match self.fe.wakeup_start(self.params.wakeup.config()) {
                Ok(()) => self.enter_notify(Phase::WakeupMode),
                Err(e) => warn!("wake-up mode not started, polling directly: {}", e),
            }
        }
    }

    fn wakeup_tick(&mut self) {
        #[cfg(feature = "wakeup")]
        if self.fe.wakeup_has_woke() {
            if let Err(e) = self.fe.wakeup_stop() {
                warn!("wake-up stop failed: {}", e);
            }
            info!("woken by field change");
            self.enter_notify(Phase::PollTechDetect(DetectStep::Next));
        }
    }

    fn detection_done(&mut self, res: Result<()>) {
        let found_nothing = self.techs_found.is_empty();
        if let Err(e) = &res {
            warn!("technology detection aborted: {}", e);
        }
        if res.is_err() || found_nothing {
            if let Err(e) = self.fe.field_off() {
                warn!("field off failed: {}", e);
            }
            self.enter(Phase::ListenTechDetect);
            return;
        }
        info!("technologies found: {:#06x}", self.techs_found.bits());
        self.techs_todo = self.techs_found;
        self.enter(Phase::PollCollAvoidance(ResolveStep::Next));
    }

    fn resolution_done(&mut self, res: Result<()>) {
        if let Err(e) = &res {
            warn!("collision resolution aborted: {}", e);
        }
        if res.is_err() || self.devices.is_empty() {
            self.enter(Phase::Deactivation);
            return;
        }
        info!("{} device(s) identified", self.devices.len());
        if self.devices.len() > 1 && self.params.notify.is_some() {
            self.enter_notify(Phase::PollSelect);
            return;
        }
        self.selected = 0;
        self.enter(Phase::PollActivation(ActivationStep::Start));
    }
}
