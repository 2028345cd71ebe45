// libnfcdisc/src/config.rs
//! Discovery parameters and their builder.

use crate::constants::{MAX_DEVICES, NFCDEP_GB_MAX_LEN, NFCDEP_NFCID3_LEN};
use crate::engine::State;
use crate::technology::{LISTEN_REQUIREMENTS, Technology};
use crate::types::{BitRate, ComplianceMode, Nfcid, TechMask};
use crate::utils::DEFAULT_TOTAL_DURATION_MS;
use crate::{Error, Result};

/// Callback invoked once per externally visible state transition
pub type NotifyFn = Box<dyn FnMut(State)>;

/// One wake-up measurement channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WakeupMeasure {
    /// Deviation from the reference that wakes the engine
    pub delta: u8,
    /// `None` lets the driver measure its own reference
    pub reference: Option<u16>,
    /// Let the driver track slow drifts of the reference
    pub auto_average: bool,
}

/// Low power field detection configuration handed to the wake-up driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct WakeupConfig {
    /// Interval between two measurements
    pub period_ms: u16,
    /// Also wake up when the period timer fires
    pub irq_timeout: bool,
    /// Use the driver's software tag detection
    pub sw_tag_detect: bool,
    /// Amplitude measurement, `None` to skip it
    pub amplitude: Option<WakeupMeasure>,
    /// Phase measurement
    pub phase: Option<WakeupMeasure>,
    /// Capacitive sensor
    pub capacitive: Option<WakeupMeasure>,
}

impl Default for WakeupConfig {
    fn default() -> Self {
        Self {
            period_ms: 100,
            irq_timeout: false,
            sw_tag_detect: false,
            amplitude: Some(WakeupMeasure {
                delta: 8,
                reference: None,
                auto_average: true,
            }),
            phase: None,
            capacitive: None,
        }
    }
}

/// Whether to sit in low power wake-up mode before each polling cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum WakeupSetting {
    /// Poll right away
    #[default]
    Disabled,
    /// Driver's built-in configuration
    Default,
    /// Explicit configuration
    Custom(WakeupConfig),
}

impl WakeupSetting {
    /// Wake-up mode requested at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    /// Configuration to hand to the driver; `None` selects its default
    pub fn config(&self) -> Option<&WakeupConfig> {
        match self {
            Self::Custom(cfg) => Some(cfg),
            _ => None,
        }
    }
}

/// Passive NFC-A card emulation identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListenConfigA {
    /// NFCID1 sent during anti-collision
    pub nfcid: Nfcid,
    /// SENS_RES (ATQA)
    pub sens_res: [u8; 2],
    /// SEL_RES (SAK)
    pub sel_res: u8,
}

impl Default for ListenConfigA {
    fn default() -> Self {
        Self {
            nfcid: Nfcid::empty(),
            sens_res: [0x44, 0x00],
            sel_res: 0x20,
        }
    }
}

/// Passive NFC-F card emulation identity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ListenConfigF {
    /// System code answered to SENSF_REQ
    pub system_code: [u8; 2],
    /// SENSF_RES without the length byte: NFCID2, PAD0 and PMm
    pub sensf_res: [u8; 19],
}

impl Default for ListenConfigF {
    fn default() -> Self {
        let mut sensf_res = [0u8; 19];
        sensf_res[0] = 0x01;
        sensf_res[1] = 0x02;
        sensf_res[2] = 0xFE;
        Self {
            system_code: [0xFF, 0xFF],
            sensf_res,
        }
    }
}

/// Listen-mode configuration handed to the driver when listening starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ListenConfig {
    /// NFC-A identity
    pub nfca: ListenConfigA,
    /// NFC-F identity
    pub nfcf: ListenConfigF,
}

/// Parameters of one discovery run. Copied into the engine by `discover`
/// and left untouched until the next call.
pub struct DiscoverParams {
    /// Compliance mode handed to the technology pollers
    pub compliance: ComplianceMode,
    /// Poll and listen technologies to look for
    pub techs: TechMask,
    /// Length of a whole poll + listen cycle
    pub total_duration_ms: u32,
    /// Devices to collect before stopping anti-collision, 1 to `MAX_DEVICES`
    pub device_limit: u8,
    /// Highest bit rate negotiated during activation
    pub max_bit_rate: BitRate,
    /// Rate used for NFC-F polling, 212 or 424 kbit/s
    pub nfcf_bit_rate: BitRate,
    /// Rate used as active P2P initiator
    pub ap2p_bit_rate: BitRate,
    /// Local NFCID3 used on ATR_REQ/ATR_RES
    pub nfcid3: [u8; NFCDEP_NFCID3_LEN],
    /// General bytes for ATR_REQ/ATR_RES
    pub general_bytes: Vec<u8>,
    /// Identity presented while listening
    pub listen: ListenConfig,
    /// Wake-up mode before each cycle
    pub wakeup: WakeupSetting,
    /// Report activation as soon as an NFC-A poller selected us (after SAK)
    pub activate_after_sak: bool,
    /// Do not send DSL/RLS/S(DESELECT) on deactivation
    pub skip_deactivation: bool,
    /// Called on every notified state change
    pub notify: Option<NotifyFn>,
}

impl Default for DiscoverParams {
    fn default() -> Self {
        Self {
            compliance: ComplianceMode::Nfc,
            techs: TechMask::NONE,
            total_duration_ms: DEFAULT_TOTAL_DURATION_MS,
            device_limit: MAX_DEVICES as u8,
            max_bit_rate: BitRate::Br106,
            nfcf_bit_rate: BitRate::Br212,
            ap2p_bit_rate: BitRate::Br424,
            nfcid3: [0u8; NFCDEP_NFCID3_LEN],
            general_bytes: Vec::new(),
            listen: ListenConfig::default(),
            wakeup: WakeupSetting::Disabled,
            activate_after_sak: false,
            skip_deactivation: false,
            notify: None,
        }
    }
}

impl std::fmt::Debug for DiscoverParams {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DiscoverParams")
            .field("compliance", &self.compliance)
            .field("techs", &self.techs)
            .field("total_duration_ms", &self.total_duration_ms)
            .field("device_limit", &self.device_limit)
            .field("max_bit_rate", &self.max_bit_rate)
            .field("nfcf_bit_rate", &self.nfcf_bit_rate)
            .field("ap2p_bit_rate", &self.ap2p_bit_rate)
            .field("general_bytes", &self.general_bytes.len())
            .field("wakeup", &self.wakeup)
            .field("activate_after_sak", &self.activate_after_sak)
            .field("skip_deactivation", &self.skip_deactivation)
            .field("notify", &self.notify.is_some())
            .finish()
    }
}

impl DiscoverParams {
    /// Start from the defaults
    pub fn builder() -> DiscoverParamsBuilder {
        DiscoverParamsBuilder::new()
    }

    /// Check ranges first (`Param`), then that every requested technology
    /// is compiled in (`Disabled`).
    pub fn validate(&self) -> Result<()> {
        if self.device_limit == 0 || self.device_limit as usize > MAX_DEVICES {
            return Err(Error::Param("device limit out of range"));
        }
        if self.max_bit_rate > BitRate::Br1695 && self.max_bit_rate != BitRate::Keep {
            return Err(Error::Param("maximum bit rate above 1695 kbit/s"));
        }
        if self.techs.contains(TechMask::POLL_F)
            && !matches!(self.nfcf_bit_rate, BitRate::Br212 | BitRate::Br424)
        {
            return Err(Error::Param("NFC-F polls at 212 or 424 kbit/s only"));
        }
        if self.techs.contains(TechMask::POLL_AP2P) && self.ap2p_bit_rate > BitRate::Br424 {
            return Err(Error::Param("AP2P bit rate above 424 kbit/s"));
        }
        if self.general_bytes.len() > NFCDEP_GB_MAX_LEN {
            return Err(Error::Param("general bytes too long"));
        }

        for tech in Technology::all() {
            if self.techs.contains(tech.mask()) && !tech.is_enabled() {
                return Err(Error::Disabled(tech.feature()));
            }
        }
        for (mask, feature, enabled) in LISTEN_REQUIREMENTS {
            if self.techs.contains(mask) && !enabled {
                return Err(Error::Disabled(feature));
            }
        }
        if !self.techs.listen().is_empty() && !cfg!(feature = "listen") {
            return Err(Error::Disabled("listen"));
        }
        if self.wakeup.is_enabled() && !cfg!(feature = "wakeup") {
            return Err(Error::Disabled("wakeup"));
        }
        Ok(())
    }
}

/// Fluent construction of `DiscoverParams`
pub struct DiscoverParamsBuilder {
    params: DiscoverParams,
}

impl DiscoverParamsBuilder {
    /// Builder holding `DiscoverParams::default()`
    pub fn new() -> Self {
        Self {
            params: DiscoverParams::default(),
        }
    }

    /// Technologies to poll for and listen as
    pub fn techs(mut self, techs: TechMask) -> Self {
        self.params.techs = techs;
        self
    }

    /// Compliance mode
    pub fn compliance(mut self, mode: ComplianceMode) -> Self {
        self.params.compliance = mode;
        self
    }

    /// Length of one discovery cycle in ms
    pub fn total_duration_ms(mut self, ms: u32) -> Self {
        self.params.total_duration_ms = ms;
        self
    }

    /// Stop collecting devices at `limit`
    pub fn device_limit(mut self, limit: u8) -> Self {
        self.params.device_limit = limit;
        self
    }

    /// Upper bound for the negotiated rate
    pub fn max_bit_rate(mut self, br: BitRate) -> Self {
        self.params.max_bit_rate = br;
        self
    }

    /// NFC-F polling rate
    pub fn nfcf_bit_rate(mut self, br: BitRate) -> Self {
        self.params.nfcf_bit_rate = br;
        self
    }

    /// Active P2P initiator rate
    pub fn ap2p_bit_rate(mut self, br: BitRate) -> Self {
        self.params.ap2p_bit_rate = br;
        self
    }

    /// Local NFCID3 for NFC-DEP
    pub fn nfcid3(mut self, nfcid3: [u8; NFCDEP_NFCID3_LEN]) -> Self {
        self.params.nfcid3 = nfcid3;
        self
    }

    /// General bytes carried in ATR_REQ and ATR_RES
    pub fn general_bytes(mut self, gb: &[u8]) -> Self {
        self.params.general_bytes = gb.to_vec();
        self
    }

    /// Card emulation identity
    pub fn listen_config(mut self, cfg: ListenConfig) -> Self {
        self.params.listen = cfg;
        self
    }

    /// Wake-up mode
    pub fn wakeup(mut self, setting: WakeupSetting) -> Self {
        self.params.wakeup = setting;
        self
    }

    /// Report NFC-A listen activation right after SAK
    pub fn activate_after_sak(mut self, on: bool) -> Self {
        self.params.activate_after_sak = on;
        self
    }

    /// Leave the remote device without a protocol farewell
    pub fn skip_deactivation(mut self, on: bool) -> Self {
        self.params.skip_deactivation = on;
        self
    }

    /// Callback for state change notifications
    pub fn notify<F>(mut self, f: F) -> Self
    where
        F: FnMut(State) + 'static,
    {
        self.params.notify = Some(Box::new(f));
        self
    }

    /// Validate and return the parameters
    pub fn build(self) -> Result<DiscoverParams> {
        self.params.validate()?;
        Ok(self.params)
    }

    /// Return the parameters without validation; `discover` still checks them
    pub fn build_unchecked(self) -> DiscoverParams {
        self.params
    }
}

impl Default for DiscoverParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}
