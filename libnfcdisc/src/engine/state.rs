// libnfcdisc/src/engine/state.rs

use crate::technology::Technology;
use derive_more::Display;

/// Externally visible state of the discovery engine.
///
/// Declaration order is significant: range checks such as "at least
/// `Activated`" compare states with `<`/`>=`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum State {
    /// Front-end not initialized yet
    NotInit,
    /// Initialized, no discovery running
    Idle,
    /// A new discovery cycle is about to begin
    StartDiscovery,
    /// Low power field detection
    WakeupMode,
    /// Looking for remote listeners technology by technology
    PollTechDetect,
    /// Resolving the devices of each detected technology
    PollCollAvoidance,
    /// Several devices found, waiting for `select`
    PollSelect,
    /// Activating the selected device
    PollActivation,
    /// Entering listen mode
    ListenTechDetect,
    /// Listening, waiting for a remote field
    ListenCollAvoidance,
    /// A remote poller is activating us
    ListenActivation,
    /// Put to sleep by the remote poller
    ListenSleep,
    /// A device is active and ready for data exchange
    Activated,
    /// Exchange in flight
    DataExchange,
    /// Exchange finished
    DataExchangeDone,
    /// Deferred deactivation, runs on the next poll
    Deactivation,
}

impl State {
    /// Numeric state code used in traces
    pub fn code(&self) -> u8 {
        match self {
            Self::NotInit => 0,
            Self::Idle => 1,
            Self::StartDiscovery => 2,
            Self::WakeupMode => 3,
            Self::PollTechDetect => 10,
            Self::PollCollAvoidance => 11,
            Self::PollSelect => 12,
            Self::PollActivation => 13,
            Self::ListenTechDetect => 20,
            Self::ListenCollAvoidance => 21,
            Self::ListenActivation => 22,
            Self::ListenSleep => 23,
            Self::Activated => 30,
            Self::DataExchange => 31,
            Self::DataExchangeDone => 33,
            Self::Deactivation => 34,
        }
    }

    /// A device is active and usable for data exchange
    pub fn is_device_activated(&self) -> bool {
        *self >= Self::Activated && *self < Self::Deactivation
    }

    /// Discovery is running and nothing has been activated yet
    pub fn is_in_discovery(&self) -> bool {
        *self >= Self::StartDiscovery && *self < Self::Activated
    }
}

/// Progress of technology detection for the technology being probed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DetectStep {
    /// Next technology still needs initialising
    Next,
    /// Field is on, waiting for the guard time before probing
    GuardTime(Technology),
}

/// Progress of collision resolution for the current technology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ResolveStep {
    Next,
    GuardTime(Technology),
    Resolving(Technology),
}

/// Progress of the poller-side activation of the selected device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ActivationStep {
    Start,
    /// Technology initialised; a sleeping device still needs waking
    Initialized,
    /// WUPA sent, the device still needs selecting
    Woken,
    /// ISO-DEP activation started, polling its status
    IsoDep,
}

/// Internal state: the public `State` plus resumption data for the
/// multi-tick sub-procedures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Phase {
    NotInit,
    Idle,
    StartDiscovery,
    WakeupMode,
    PollTechDetect(DetectStep),
    PollCollAvoidance(ResolveStep),
    PollSelect,
    PollActivation(ActivationStep),
    ListenTechDetect,
    ListenCollAvoidance,
    ListenActivation,
    ListenSleep,
    Activated,
    DataExchange,
    DataExchangeDone,
    Deactivation,
}

impl Phase {
    pub(crate) fn state(&self) -> State {
        match self {
            Self::NotInit => State::NotInit,
            Self::Idle => State::Idle,
            Self::StartDiscovery => State::StartDiscovery,
            Self::WakeupMode => State::WakeupMode,
            Self::PollTechDetect(_) => State::PollTechDetect,
            Self::PollCollAvoidance(_) => State::PollCollAvoidance,
            Self::PollSelect => State::PollSelect,
            Self::PollActivation(_) => State::PollActivation,
            Self::ListenTechDetect => State::ListenTechDetect,
            Self::ListenCollAvoidance => State::ListenCollAvoidance,
            Self::ListenActivation => State::ListenActivation,
            Self::ListenSleep => State::ListenSleep,
            Self::Activated => State::Activated,
            Self::DataExchange => State::DataExchange,
            Self::DataExchangeDone => State::DataExchangeDone,
            Self::Deactivation => State::Deactivation,
        }
    }
}
