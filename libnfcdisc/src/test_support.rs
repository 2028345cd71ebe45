// libnfcdisc/src/test_support.rs
//! Test support helpers intended for use by unit and integration tests.
//!
//! They centralize the `MockFrontend` + `Engine` setup so tests across the
//! crate and the tests/ directory drive the engine the same way.
#![allow(dead_code)]

use crate::config::DiscoverParams;
use crate::device::{ListenDevice, NfcaListenDevice, NfcaType};
use crate::engine::{Engine, State};
use crate::transport::MockFrontend;
use crate::types::TechMask;

/// Upper bound of ticks `run_until` waits for a state
#[doc(hidden)]
pub const MAX_TICKS: usize = 200;

/// Engine owning a clone of `mock`, already initialized
#[doc(hidden)]
pub fn engine_with_mock(mock: &MockFrontend) -> Engine {
    let mut engine = Engine::new(Box::new(mock.clone()));
    if let Err(e) = engine.initialize() {
        panic!("mock initialization failed: {}", e);
    }
    engine
}

/// Poll until `poll` reports `target`. Panics after `MAX_TICKS`.
#[doc(hidden)]
pub fn run_until(engine: &mut Engine, target: State) {
    for _ in 0..MAX_TICKS {
        if engine.poll() == target {
            return;
        }
    }
    panic!("{} not reached, stuck in {}", target, engine.state());
}

/// Poll until `poll` reports `target` and return every state seen on the
/// way, the target included
#[doc(hidden)]
pub fn trace_until(engine: &mut Engine, target: State) -> Vec<State> {
    let mut seen = Vec::new();
    for _ in 0..MAX_TICKS {
        let st = engine.poll();
        if seen.last() != Some(&st) {
            seen.push(st);
        }
        if st == target {
            return seen;
        }
    }
    panic!("{} not reached, went through {:?}", target, seen);
}

/// NFC-A Type 2 tag with a 7-byte UID
#[doc(hidden)]
pub fn t2t_tag() -> ListenDevice {
    nfca_tag(NfcaType::T2t, &[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66])
}

/// NFC-A tag of any sub-type
#[doc(hidden)]
pub fn nfca_tag(kind: NfcaType, nfcid1: &[u8]) -> ListenDevice {
    match NfcaListenDevice::new(kind, nfcid1) {
        Ok(dev) => ListenDevice::NfcA(dev),
        Err(e) => panic!("bad NFCID1 fixture: {}", e),
    }
}

/// Start discovery with `params` on an initialized engine
#[doc(hidden)]
pub fn discover(engine: &mut Engine, params: DiscoverParams) {
    if let Err(e) = engine.discover(params) {
        panic!("discover rejected: {}", e);
    }
}

/// Engine with a single T2T tag activated over the raw RF interface
#[doc(hidden)]
pub fn activated_nfca() -> (Engine, MockFrontend) {
    let mock = MockFrontend::with_tags(vec![t2t_tag()]);
    let mut engine = engine_with_mock(&mock);
    discover(
        &mut engine,
        DiscoverParams::builder().techs(TechMask::POLL_A).build_unchecked(),
    );
    run_until(&mut engine, State::Activated);
    (engine, mock)
}

/// Engine in listen-only discovery for NFC-A, NFC-F and active P2P, with a
/// discovery period long enough for scripted remote pollers
#[doc(hidden)]
pub fn listening_engine() -> (Engine, MockFrontend) {
    listening_engine_with(DiscoverParams::builder())
}

/// `listening_engine` with extra parameters from `builder`
#[doc(hidden)]
pub fn listening_engine_with(builder: crate::config::DiscoverParamsBuilder) -> (Engine, MockFrontend) {
    let mock = MockFrontend::new();
    let mut engine = engine_with_mock(&mock);
    let params = builder
        .techs(TechMask::LISTEN_A | TechMask::LISTEN_F | TechMask::LISTEN_AP2P)
        .total_duration_ms(60_000)
        .build_unchecked();
    discover(&mut engine, params);
    (engine, mock)
}
