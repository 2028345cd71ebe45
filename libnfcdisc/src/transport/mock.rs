// libnfcdisc/src/transport/mock.rs

use std::cell::{Ref, RefCell, RefMut};
use std::collections::VecDeque;
use std::rc::Rc;
use std::task::Poll;

use crate::config::{ListenConfig, WakeupConfig};
use crate::constants::{NFCDEP_ATR_REQ_NFCID3_POS, NFCDEP_NFCID3_LEN};
use crate::device::{IsoDepInfo, ListenDevice, NfcDepInfo};
use crate::protocol::isodep::fsxi_to_frame_size;
use crate::protocol::{AtrParams, AtsParams, PollerParams, TargetParams};
use crate::technology::Technology;
use crate::transport::traits::{
    ChainingParams, IsoDepLayer, ListenMode, ListenStatus, NfcDepLayer, RadioDriver,
    TechnologyPoller, WakeupMode,
};
use crate::types::{
    BitRate, CommMode, ComplianceMode, ListenMask, LmState, Nfcid, RfInterface, RfMode, TxRxFlags,
};
use crate::{Error, Result};

/// Frame a simulated remote poller sends while the engine listens
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenEvent {
    /// Listen state the driver reports next
    pub state: LmState,
    /// Frame received in that state
    pub frame: Option<Vec<u8>>,
    /// Rate the remote poller used
    pub bit_rate: BitRate,
}

impl ListenEvent {
    /// Listen state change without data (field on, field lost...)
    pub fn state(state: LmState) -> Self {
        Self {
            state,
            frame: None,
            bit_rate: BitRate::Br106,
        }
    }

    /// Listen state change carrying the first frame of the remote poller
    pub fn frame(state: LmState, frame: &[u8]) -> Self {
        Self {
            state,
            frame: Some(frame.to_vec()),
            bit_rate: BitRate::Br106,
        }
    }

    /// Received at `bit_rate` instead of 106 kbit/s
    pub fn at(mut self, bit_rate: BitRate) -> Self {
        self.bit_rate = bit_rate;
        self
    }
}

/// Protocol farewell the engine sent on deactivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Farewell {
    /// S(DESELECT)
    IsoDepDeselect,
    /// RLS_REQ
    NfcDepRelease,
    /// DSL_REQ
    NfcDepDeselect,
}

/// State of the simulated RF field. Public so tests can script devices
/// and inspect what the engine did.
#[derive(Debug)]
pub struct MockField {
    /// Simulated clock
    pub now_ms: u32,
    /// Clock advance per `worker()` call
    pub tick_ms: u32,
    /// Guard time after field on
    pub gt_ms: u32,
    /// End of the current guard time
    pub gt_deadline: u32,
    /// Calls to `worker()`
    pub worker_calls: usize,

    /// `initialize()` called
    pub initialized: bool,
    /// `analog_config_initialize()` called
    pub analog_configured: bool,
    /// Field currently on
    pub field_on: bool,
    /// Calls to `field_off()`
    pub field_off_count: usize,
    /// Every `set_mode()`, in order
    pub modes: Vec<(RfMode, BitRate)>,
    /// Make `field_on_and_start_gt()` fail
    pub fail_field_on: bool,

    /// Devices present in the field
    pub tags: Vec<ListenDevice>,
    /// Poller initializations, in order
    pub inits: Vec<(Technology, BitRate)>,
    /// Technology detections, in order
    pub probes: Vec<Technology>,
    /// Pending ticks before collision resolution completes
    pub collision_ticks: usize,
    /// Technologies whose collision resolution fails
    pub collision_errors: Vec<Technology>,
    collision: Option<(usize, Result<Vec<ListenDevice>>)>,
    /// Technologies woken up before activation
    pub wakes: Vec<Technology>,
    /// Calls to `select()`
    pub selects: usize,

    /// Activation result for ISO-DEP capable devices
    pub iso_dep: IsoDepInfo,
    /// Pending ticks before ISO-DEP activation completes
    pub activation_ticks: usize,
    /// Make the next ISO-DEP activation fail
    pub activation_error: Option<Error>,
    activation: Option<usize>,
    /// Passive NFC-DEP target answering ATR_REQ
    pub nfc_dep_peer: Option<NfcDepInfo>,
    /// Active P2P target answering ATR_REQ
    pub ap2p_peer: Option<NfcDepInfo>,
    /// ATR_REQ parameters the engine sent
    pub atr_requests: Vec<AtrParams>,

    /// Replies of the remote side, one per exchange
    pub responses: VecDeque<Result<Vec<u8>>>,
    /// Pending ticks before an exchange completes
    pub exchange_ticks: usize,
    in_flight: Option<usize>,
    /// Frames transmitted, with the interface used
    pub sent: Vec<(RfInterface, Vec<u8>)>,
    /// FWT of the last raw transceive
    pub last_fwt: u32,
    /// Flags of the last raw transceive
    pub last_flags: TxRxFlags,
    /// Chaining parameters of the last APDU or PDU
    pub last_chaining: Option<ChainingParams>,
    /// Every exchange fails with `LinkLoss`
    pub link_lost: bool,
    /// Protocol farewells sent
    pub farewells: Vec<Farewell>,

    /// Listen mode running
    pub listen_active: bool,
    /// Mask handed to `listen_start()`
    pub listen_mask: ListenMask,
    /// Current listen state
    pub lm_state: LmState,
    /// Scripted remote poller
    pub listen_events: VecDeque<ListenEvent>,
    current_frame: Option<Vec<u8>>,
    lm_bit_rate: BitRate,
    /// Sleep states entered
    pub sleep_starts: Vec<LmState>,
    /// ATS parameters of the last RATS answer
    pub ats: Option<AtsParams>,
    /// Target parameters of the last ATR_RES
    pub target_params: Option<TargetParams>,
    listen_activation: Option<Result<ListenActivation>>,

    /// Wake-up mode running
    pub wakeup_active: bool,
    /// Configuration of every `wakeup_start()`
    pub wakeup_configs: Vec<Option<WakeupConfig>>,
    /// Ticks until the wake-up measurement fires; `None` never wakes
    pub wake_after: Option<u32>,
    /// Make `wakeup_start()` fail
    pub wakeup_start_error: bool,
}

#[derive(Debug, Clone)]
enum ListenActivation {
    IsoDep(IsoDepInfo),
    NfcDep(NfcDepInfo),
}

impl Default for MockField {
    fn default() -> Self {
        Self {
            now_ms: 0,
            tick_ms: 1,
            gt_ms: 1,
            gt_deadline: 0,
            worker_calls: 0,
            initialized: false,
            analog_configured: false,
            field_on: false,
            field_off_count: 0,
            modes: Vec::new(),
            fail_field_on: false,
            tags: Vec::new(),
            inits: Vec::new(),
            probes: Vec::new(),
            collision_ticks: 0,
            collision_errors: Vec::new(),
            collision: None,
            wakes: Vec::new(),
            selects: 0,
            iso_dep: IsoDepInfo {
                fsx: 256,
                fwt: 65_536,
                dfwt: 256,
                did: 0,
                dsi: BitRate::Br106,
                dri: BitRate::Br106,
            },
            activation_ticks: 0,
            activation_error: None,
            activation: None,
            nfc_dep_peer: None,
            ap2p_peer: None,
            atr_requests: Vec::new(),
            responses: VecDeque::new(),
            exchange_ticks: 0,
            in_flight: None,
            sent: Vec::new(),
            last_fwt: 0,
            last_flags: TxRxFlags::DEFAULT,
            last_chaining: None,
            link_lost: false,
            farewells: Vec::new(),
            listen_active: false,
            listen_mask: ListenMask::NONE,
            lm_state: LmState::NotInit,
            listen_events: VecDeque::new(),
            current_frame: None,
            lm_bit_rate: BitRate::Br106,
            sleep_starts: Vec::new(),
            ats: None,
            target_params: None,
            listen_activation: None,
            wakeup_active: false,
            wakeup_configs: Vec::new(),
            wake_after: None,
            wakeup_start_error: false,
        }
    }
}

impl MockField {
    fn start_exchange(&mut self, itf: RfInterface, tx: &[u8]) {
        self.sent.push((itf, tx.to_vec()));
        self.in_flight = Some(self.exchange_ticks);
    }

    fn exchange_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>> {
        if self.link_lost {
            self.in_flight = None;
            return Poll::Ready(Err(Error::LinkLoss));
        }
        match self.in_flight {
            Some(n) if n > 0 => {
                self.in_flight = Some(n - 1);
                return Poll::Pending;
            }
            // Listener waiting for the remote poller's next command
            None if self.responses.is_empty() => return Poll::Pending,
            _ => {}
        }
        self.in_flight = None;
        match self.responses.pop_front() {
            Some(Ok(resp)) => {
                if resp.len() > rx.len() {
                    return Poll::Ready(Err(Error::NoMemory {
                        capacity: rx.len(),
                        required: resp.len(),
                    }));
                }
                rx[..resp.len()].copy_from_slice(&resp);
                Poll::Ready(Ok(resp.len()))
            }
            Some(Err(e)) => Poll::Ready(Err(e)),
            None => Poll::Ready(Err(Error::Timeout)),
        }
    }

    fn is_waiting(state: LmState) -> bool {
        matches!(
            state,
            LmState::PowerOff
                | LmState::Idle
                | LmState::ReadyA
                | LmState::ReadyAx
                | LmState::ReadyB
                | LmState::ReadyF
                | LmState::SleepA
                | LmState::SleepB
                | LmState::SleepAf
        )
    }
}

/// Simulated front-end. Clones share the same field, so a test keeps one
/// handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct MockFrontend {
    field: Rc<RefCell<MockField>>,
}

impl MockFrontend {
    /// Empty field
    pub fn new() -> Self {
        Self::default()
    }

    /// Field holding `tags`
    pub fn with_tags(tags: Vec<ListenDevice>) -> Self {
        let mock = Self::new();
        mock.borrow_mut().tags = tags;
        mock
    }

    /// Inspect the field
    pub fn borrow(&self) -> Ref<'_, MockField> {
        self.field.borrow()
    }

    /// Script the field
    pub fn borrow_mut(&self) -> RefMut<'_, MockField> {
        self.field.borrow_mut()
    }

    /// Device enters the field
    pub fn add_tag(&self, tag: ListenDevice) {
        self.borrow_mut().tags.push(tag);
    }

    /// Queue the remote reply to the next exchange
    pub fn push_response(&self, resp: &[u8]) {
        self.borrow_mut().responses.push_back(Ok(resp.to_vec()));
    }

    /// Queue a failed exchange
    pub fn push_error(&self, err: Error) {
        self.borrow_mut().responses.push_back(Err(err));
    }

    /// Queue what the remote poller does next
    pub fn push_listen_event(&self, ev: ListenEvent) {
        self.borrow_mut().listen_events.push_back(ev);
    }

    /// Remote device leaves the field
    pub fn drop_link(&self) {
        let mut f = self.borrow_mut();
        f.link_lost = true;
        f.tags.clear();
    }

    /// Transmitted frames without their interface
    pub fn sent_frames(&self) -> Vec<Vec<u8>> {
        self.borrow().sent.iter().map(|(_, tx)| tx.clone()).collect()
    }
}

impl RadioDriver for MockFrontend {
    fn initialize(&mut self) -> Result<()> {
        self.borrow_mut().initialized = true;
        Ok(())
    }

    fn analog_config_initialize(&mut self) {
        self.borrow_mut().analog_configured = true;
    }

    fn worker(&mut self) {
        let mut f = self.borrow_mut();
        f.now_ms = f.now_ms.wrapping_add(f.tick_ms);
        f.worker_calls += 1;
    }

    fn millis(&self) -> u32 {
        self.borrow().now_ms
    }

    fn set_mode(&mut self, mode: RfMode, tx_bit_rate: BitRate, _rx_bit_rate: BitRate) -> Result<()> {
        self.borrow_mut().modes.push((mode, tx_bit_rate));
        Ok(())
    }

    fn field_on_and_start_gt(&mut self) -> Result<()> {
        let mut f = self.borrow_mut();
        if f.fail_field_on {
            return Err(Error::Driver("external field present".into()));
        }
        f.field_on = true;
        f.gt_deadline = f.now_ms.wrapping_add(f.gt_ms);
        Ok(())
    }

    fn field_off(&mut self) -> Result<()> {
        let mut f = self.borrow_mut();
        f.field_on = false;
        f.field_off_count += 1;
        Ok(())
    }

    fn is_gt_expired(&self) -> bool {
        let f = self.borrow();
        (f.now_ms.wrapping_sub(f.gt_deadline) as i32) >= 0
    }

    fn start_transceive(&mut self, tx: &[u8], flags: TxRxFlags, fwt: u32) -> Result<()> {
        let mut f = self.borrow_mut();
        f.last_flags = flags;
        f.last_fwt = fwt;
        f.start_exchange(RfInterface::RfRaw, tx);
        Ok(())
    }

    fn transceive_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>> {
        self.borrow_mut().exchange_status(rx)
    }
}

impl TechnologyPoller for MockFrontend {
    fn poller_initialize(&mut self, tech: Technology, bit_rate: BitRate) -> Result<()> {
        self.borrow_mut().inits.push((tech, bit_rate));
        Ok(())
    }

    fn technology_detection(&mut self, tech: Technology, _compliance: ComplianceMode) -> Result<()> {
        let mut f = self.borrow_mut();
        f.probes.push(tech);
        if !f.field_on {
            return Err(Error::Driver("field is off".into()));
        }
        if f.tags.iter().any(|t| t.technology() == tech) {
            Ok(())
        } else {
            Err(Error::Timeout)
        }
    }

    fn start_collision_resolution(
        &mut self,
        tech: Technology,
        _compliance: ComplianceMode,
        capacity: usize,
    ) -> Result<()> {
        let mut f = self.borrow_mut();
        let result = if f.collision_errors.contains(&tech) {
            Err(Error::Protocol("collision not resolved"))
        } else {
            Ok(f
                .tags
                .iter()
                .filter(|t| t.technology() == tech)
                .take(capacity)
                .cloned()
                .collect())
        };
        f.collision = Some((f.collision_ticks, result));
        Ok(())
    }

    fn collision_resolution_status(&mut self) -> Poll<Result<Vec<ListenDevice>>> {
        let mut f = self.borrow_mut();
        match f.collision.take() {
            Some((0, result)) => Poll::Ready(result),
            Some((n, result)) => {
                f.collision = Some((n - 1, result));
                Poll::Pending
            }
            None => Poll::Ready(Err(Error::Internal("no collision resolution started".into()))),
        }
    }

    fn wake_up(&mut self, tech: Technology) -> Result<()> {
        self.borrow_mut().wakes.push(tech);
        Ok(())
    }

    fn select(&mut self, _device: &ListenDevice) -> Result<()> {
        self.borrow_mut().selects += 1;
        Ok(())
    }
}

impl IsoDepLayer for MockFrontend {
    fn isodep_poller_start_activation(
        &mut self,
        _device: &ListenDevice,
        _params: &PollerParams,
    ) -> Result<()> {
        let mut f = self.borrow_mut();
        f.activation = Some(f.activation_ticks);
        Ok(())
    }

    fn isodep_poller_activation_status(&mut self) -> Poll<Result<IsoDepInfo>> {
        let mut f = self.borrow_mut();
        match f.activation {
            Some(n) if n > 0 => {
                f.activation = Some(n - 1);
                Poll::Pending
            }
            Some(_) => {
                f.activation = None;
                match f.activation_error.clone() {
                    Some(e) => Poll::Ready(Err(e)),
                    None => Poll::Ready(Ok(f.iso_dep)),
                }
            }
            None => Poll::Ready(Err(Error::Internal("no activation started".into()))),
        }
    }

    fn isodep_listen_start_activation(&mut self, ats: &AtsParams, rats: &[u8]) -> Result<()> {
        let mut f = self.borrow_mut();
        let fsdi = rats.get(1).map(|b| b >> 4).unwrap_or(0);
        let mut info = f.iso_dep;
        info.fsx = fsxi_to_frame_size(fsdi);
        f.ats = Some(ats.clone());
        f.listen_activation = Some(Ok(ListenActivation::IsoDep(info)));
        Ok(())
    }

    fn isodep_listen_activation_status(&mut self) -> Poll<Result<IsoDepInfo>> {
        match self.borrow_mut().listen_activation.take() {
            Some(Ok(ListenActivation::IsoDep(info))) => Poll::Ready(Ok(info)),
            Some(Err(e)) => Poll::Ready(Err(e)),
            _ => Poll::Ready(Err(Error::Internal("no ISO-DEP listen activation".into()))),
        }
    }

    fn isodep_start_apdu_transceive(&mut self, apdu: &[u8], params: &ChainingParams) -> Result<()> {
        let mut f = self.borrow_mut();
        f.last_chaining = Some(*params);
        f.start_exchange(RfInterface::IsoDep, apdu);
        Ok(())
    }

    fn isodep_apdu_transceive_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>> {
        self.borrow_mut().exchange_status(rx)
    }

    fn isodep_deselect(&mut self) -> Result<()> {
        self.borrow_mut().farewells.push(Farewell::IsoDepDeselect);
        Ok(())
    }
}

impl NfcDepLayer for MockFrontend {
    fn nfcdep_initiator_activate(&mut self, params: &AtrParams) -> Result<NfcDepInfo> {
        let mut f = self.borrow_mut();
        f.atr_requests.push(params.clone());
        let peer = match params.comm_mode {
            CommMode::Active => f.ap2p_peer.clone(),
            CommMode::Passive => f.nfc_dep_peer.clone(),
        };
        peer.ok_or(Error::Timeout)
    }

    fn nfcdep_listen_start_activation(&mut self, params: &TargetParams, atr_req: &[u8]) -> Result<()> {
        let mut f = self.borrow_mut();
        let id_end = NFCDEP_ATR_REQ_NFCID3_POS + NFCDEP_NFCID3_LEN;
        let nfcid3 = atr_req
            .get(NFCDEP_ATR_REQ_NFCID3_POS..id_end)
            .and_then(|id| Nfcid::try_from(id).ok())
            .unwrap_or_default();
        // ATR_REQ: CMD0 CMD1 NFCID3 DIDi BSi BRi PPi
        let ppi = atr_req.get(id_end + 3).copied().unwrap_or(0);
        f.target_params = Some(params.clone());
        f.listen_activation = Some(Ok(ListenActivation::NfcDep(NfcDepInfo {
            nfcid3,
            pp: ppi,
            did: 0,
            fwt: 0,
            dfwt: 0,
            comm_mode: params.comm_mode,
            general_bytes: atr_req.get(id_end + 4..).unwrap_or(&[]).to_vec(),
        })));
        Ok(())
    }

    fn nfcdep_listen_activation_status(&mut self) -> Poll<Result<NfcDepInfo>> {
        match self.borrow_mut().listen_activation.take() {
            Some(Ok(ListenActivation::NfcDep(info))) => Poll::Ready(Ok(info)),
            Some(Err(e)) => Poll::Ready(Err(e)),
            _ => Poll::Ready(Err(Error::Internal("no NFC-DEP listen activation".into()))),
        }
    }

    fn nfcdep_start_pdu_transceive(&mut self, pdu: &[u8], params: &ChainingParams) -> Result<()> {
        let mut f = self.borrow_mut();
        f.last_chaining = Some(*params);
        f.start_exchange(RfInterface::NfcDep, pdu);
        Ok(())
    }

    fn nfcdep_pdu_transceive_status(&mut self, rx: &mut [u8]) -> Poll<Result<usize>> {
        self.borrow_mut().exchange_status(rx)
    }

    fn nfcdep_release(&mut self) -> Result<()> {
        self.borrow_mut().farewells.push(Farewell::NfcDepRelease);
        Ok(())
    }

    fn nfcdep_deselect(&mut self) -> Result<()> {
        self.borrow_mut().farewells.push(Farewell::NfcDepDeselect);
        Ok(())
    }
}

impl ListenMode for MockFrontend {
    fn listen_start(&mut self, mask: ListenMask, _config: &ListenConfig) -> Result<()> {
        let mut f = self.borrow_mut();
        f.listen_active = true;
        f.listen_mask = mask;
        f.lm_state = LmState::PowerOff;
        f.current_frame = None;
        Ok(())
    }

    fn listen_state(&mut self, rx: &mut [u8]) -> ListenStatus {
        let mut f = self.borrow_mut();
        if !f.listen_active {
            return ListenStatus {
                state: LmState::NotInit,
                received: None,
                bit_rate: f.lm_bit_rate,
            };
        }
        if f.current_frame.is_none() && MockField::is_waiting(f.lm_state) {
            if let Some(ev) = f.listen_events.pop_front() {
                f.lm_state = ev.state;
                f.lm_bit_rate = ev.bit_rate;
                f.current_frame = ev.frame;
            }
        }
        let received = f.current_frame.as_ref().map(|frame| {
            let n = frame.len().min(rx.len());
            rx[..n].copy_from_slice(&frame[..n]);
            n
        });
        ListenStatus {
            state: f.lm_state,
            received,
            bit_rate: f.lm_bit_rate,
        }
    }

    fn listen_set_state(&mut self, state: LmState) -> Result<()> {
        let mut f = self.borrow_mut();
        f.lm_state = state;
        f.current_frame = None;
        Ok(())
    }

    fn listen_sleep_start(&mut self, state: LmState) -> Result<()> {
        let mut f = self.borrow_mut();
        f.sleep_starts.push(state);
        f.lm_state = state;
        f.current_frame = None;
        Ok(())
    }

    fn listen_stop(&mut self) -> Result<()> {
        let mut f = self.borrow_mut();
        f.listen_active = false;
        f.lm_state = LmState::NotInit;
        f.current_frame = None;
        Ok(())
    }
}

impl WakeupMode for MockFrontend {
    fn wakeup_start(&mut self, config: Option<&WakeupConfig>) -> Result<()> {
        let mut f = self.borrow_mut();
        if f.wakeup_start_error {
            return Err(Error::Driver("wake-up not calibrated".into()));
        }
        f.wakeup_active = true;
        f.wakeup_configs.push(config.copied());
        Ok(())
    }

    fn wakeup_has_woke(&mut self) -> bool {
        let mut f = self.borrow_mut();
        match f.wake_after {
            Some(0) => true,
            Some(n) => {
                f.wake_after = Some(n - 1);
                false
            }
            None => false,
        }
    }

    fn wakeup_stop(&mut self) -> Result<()> {
        self.borrow_mut().wakeup_active = false;
        Ok(())
    }
}
