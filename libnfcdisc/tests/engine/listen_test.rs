#![cfg(feature = "listen")]

use std::task::Poll;

use crate::common::{Notifications, fixtures, init_logger};
use libnfcdisc::prelude::*;
use libnfcdisc::protocol::AtsParams;
use libnfcdisc::test_support::{
    discover, engine_with_mock, listening_engine, listening_engine_with, run_until,
};
use libnfcdisc::transport::{ListenEvent, MockFrontend};
use libnfcdisc::types::{CommMode, LmState, RfMode};

#[test]
fn rats_activates_iso_dep_card_emulation() {
    init_logger();
    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);

    assert_eq!(mock.borrow().ats, Some(AtsParams::default()));
    let rec = engine.active_device().unwrap();
    assert_eq!(rec.device_type(), DeviceType::PollNfcA);
    assert_eq!(rec.interface, Some(RfInterface::IsoDep));
    assert_eq!(rec.iso_dep().unwrap().fsx, 256);

    // First call only waits for the poller's first command
    let h = engine.data_exchange_start(&[], 0, TxRxFlags::DEFAULT).unwrap();
    assert!(engine.data_exchange_status(h).is_pending());
    let select = fixtures::select_ndef_apdu();
    mock.push_response(&select);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Ok(&select[..])));

    // Answer and wait for the next command
    mock.push_response(&[0x00, 0xb0, 0x00, 0x00, 0x0f]);
    let h = engine.data_exchange_start(&fixtures::SW_OK, 0, TxRxFlags::DEFAULT).unwrap();
    run_until(&mut engine, State::DataExchangeDone);
    assert_eq!(
        engine.data_exchange_status(h),
        Poll::Ready(Ok(&[0x00, 0xb0, 0x00, 0x00, 0x0f][..]))
    );
    assert_eq!(mock.borrow().sent, vec![(RfInterface::IsoDep, fixtures::SW_OK.to_vec())]);
}

#[test]
fn first_listener_exchange_must_not_send() {
    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);

    assert_eq!(
        engine.data_exchange_start(&fixtures::SW_OK, 0, TxRxFlags::DEFAULT),
        Err(Error::WrongState)
    );
    assert_eq!(engine.state(), State::Activated);
}

#[test]
fn nfca_atr_req_makes_passive_target() {
    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::nfca_atr_req()));
    run_until(&mut engine, State::Activated);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.device_type(), DeviceType::PollNfcA);
    assert_eq!(rec.interface, Some(RfInterface::NfcDep));
    assert_eq!(rec.nfcid.to_hex(), "c0c1c2c3c4c5c6c7c8c9");

    let f = mock.borrow();
    assert_eq!(f.lm_state, LmState::TargetA);
    let target = f.target_params.clone().unwrap();
    assert_eq!(target.comm_mode, CommMode::Passive);
    assert_eq!(target.to, 10);
    assert_eq!(target.ppt, 0x30);
}

#[test]
fn nfcf_atr_req_makes_passive_target() {
    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::ReadyF, &fixtures::nfcf_atr_req()).at(BitRate::Br212));
    run_until(&mut engine, State::Activated);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.device_type(), DeviceType::PollNfcF);
    assert_eq!(rec.interface, Some(RfInterface::NfcDep));
    assert_eq!(mock.borrow().lm_state, LmState::TargetF);
}

#[test]
fn t3t_first_command_is_returned_immediately() {
    let (mut engine, mock) = listening_engine();
    let check = fixtures::t3t_check();
    mock.push_listen_event(ListenEvent::frame(LmState::ReadyF, &check).at(BitRate::Br212));
    run_until(&mut engine, State::Activated);

    let h = engine.data_exchange_start(&[], 0, TxRxFlags::DEFAULT).unwrap();
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Ok(&check[..])));
    assert_eq!(engine.state(), State::DataExchangeDone);
}

#[test]
fn active_p2p_target_at_106() {
    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::Idle, &fixtures::nfca_atr_req()).at(BitRate::Br106));
    run_until(&mut engine, State::Activated);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.device_type(), DeviceType::PollAp2p);
    assert_eq!(rec.interface, Some(RfInterface::NfcDep));
    let f = mock.borrow();
    assert_eq!(f.modes, vec![(RfMode::ListenActiveP2p, BitRate::Br106)]);
    assert_eq!(f.target_params.as_ref().unwrap().comm_mode, CommMode::Active);
}

#[test]
fn active_p2p_target_at_424() {
    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::Idle, &fixtures::nfcf_atr_req()).at(BitRate::Br424));
    run_until(&mut engine, State::Activated);

    assert_eq!(engine.active_device().unwrap().device_type(), DeviceType::PollAp2p);
    assert_eq!(mock.borrow().modes, vec![(RfMode::ListenActiveP2p, BitRate::Br424)]);
}

#[test]
fn activation_reported_right_after_sak() {
    let (mut engine, mock) = listening_engine_with(DiscoverParams::builder().activate_after_sak(true));
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.interface, Some(RfInterface::RfRaw));
    assert!(mock.borrow().ats.is_none());

    let h = engine.data_exchange_start(&[], 0, TxRxFlags::DEFAULT).unwrap();
    assert_eq!(engine.state(), State::DataExchangeDone);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Ok(&fixtures::rats()[..])));
}

#[test]
fn sleep_during_exchange_then_woken_again() {
    let notes = Notifications::default();
    let (mut engine, mock) = listening_engine_with(DiscoverParams::builder().notify(notes.callback()));
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);

    let h = engine.data_exchange_start(&[], 0, TxRxFlags::DEFAULT).unwrap();
    mock.push_error(Error::SleepRequested);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Err(Error::SleepRequested)));
    assert_eq!(engine.state(), State::ListenSleep);
    assert_eq!(mock.borrow().sleep_starts, vec![LmState::SleepA]);
    // Reported again, without a second transition
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Err(Error::SleepRequested)));
    assert_eq!(notes.count(State::ListenSleep), 1);

    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);
    assert_eq!(notes.count(State::Activated), 2);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Err(Error::WrongState)));
}

#[test]
fn sleeping_listener_gives_up_after_discovery_period() {
    let notes = Notifications::default();
    let (mut engine, mock) = listening_engine_with(DiscoverParams::builder().notify(notes.callback()));
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);

    let h = engine.data_exchange_start(&[], 0, TxRxFlags::DEFAULT).unwrap();
    mock.push_error(Error::SleepRequested);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Err(Error::SleepRequested)));
    assert_eq!(engine.state(), State::ListenSleep);

    // The remote poller never wakes us up again
    mock.borrow_mut().now_ms += 120_000;
    run_until(&mut engine, State::StartDiscovery);
    assert!(!mock.borrow().listen_active);
    assert_eq!(notes.count(State::StartDiscovery), 1);
    assert!(engine.active_device().is_err());
}

#[test]
fn silent_field_times_out_and_restarts() {
    init_logger();
    let mock = MockFrontend::new();
    let notes = Notifications::default();
    let mut engine = engine_with_mock(&mock);
    discover(
        &mut engine,
        DiscoverParams::builder()
            .techs(TechMask::LISTEN_A)
            .total_duration_ms(10)
            .notify(notes.callback())
            .build()
            .unwrap(),
    );

    run_until(&mut engine, State::ListenCollAvoidance);
    assert!(mock.borrow().listen_active);
    run_until(&mut engine, State::StartDiscovery);
    assert!(!mock.borrow().listen_active);
    assert_eq!(notes.states(), vec![State::StartDiscovery]);
}

#[test]
fn field_lost_before_activation_restarts() {
    let notes = Notifications::default();
    let (mut engine, mock) = listening_engine_with(DiscoverParams::builder().notify(notes.callback()));
    mock.push_listen_event(ListenEvent::state(LmState::ReadyA));
    mock.push_listen_event(ListenEvent::state(LmState::PowerOff));

    run_until(&mut engine, State::StartDiscovery);
    assert_eq!(notes.states(), vec![State::StartDiscovery]);
    assert!(engine.active_device().is_err());
}
