use crate::common::{Notifications, fixtures, init_logger};
use libnfcdisc::device::ProtocolInfo;
use libnfcdisc::prelude::*;
use libnfcdisc::test_support::{discover, engine_with_mock, run_until};
use libnfcdisc::transport::MockFrontend;
use libnfcdisc::types::{CommMode, RfMode};

fn activate(mock: &MockFrontend, techs: TechMask) -> Engine {
    init_logger();
    let mut engine = engine_with_mock(mock);
    discover(&mut engine, DiscoverParams::builder().techs(techs).build().unwrap());
    run_until(&mut engine, State::Activated);
    engine
}

#[test]
fn t4t_gets_iso_dep_interface() {
    let mock = MockFrontend::with_tags(vec![fixtures::t4t()]);
    mock.borrow_mut().activation_ticks = 2;
    let engine = activate(&mock, TechMask::POLL_A);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.interface, Some(RfInterface::IsoDep));
    assert_eq!(rec.nfcid.to_hex(), "08123456");
    assert_eq!(rec.iso_dep().unwrap().fsx, 256);
}

#[test]
fn t1t_is_identified_by_rid_uid() {
    let mock = MockFrontend::with_tags(vec![fixtures::t1t()]);
    let engine = activate(&mock, TechMask::POLL_A);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.nfcid.as_bytes(), &[0x11, 0x22, 0x33, 0x44]);
    assert_eq!(rec.interface, Some(RfInterface::RfRaw));
}

#[test]
fn sleeping_nfca_device_is_woken_and_selected() {
    let dev = match fixtures::t2t() {
        ListenDevice::NfcA(a) => ListenDevice::NfcA(a.sleeping()),
        other => other,
    };
    let mock = MockFrontend::with_tags(vec![dev]);
    let engine = activate(&mock, TechMask::POLL_A);

    assert_eq!(mock.borrow().wakes, vec![Technology::NfcA]);
    assert_eq!(mock.borrow().selects, 1);
    let rec = engine.active_device().unwrap();
    assert!(!rec.listen_device().unwrap().is_sleep());
}

#[test]
fn nfca_nfc_dep_target_uses_atr_nfcid3() {
    let mock = MockFrontend::with_tags(vec![fixtures::nfca_dep()]);
    mock.borrow_mut().nfc_dep_peer = Some(fixtures::nfc_dep_peer(CommMode::Passive));
    let engine = activate(&mock, TechMask::POLL_A);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.interface, Some(RfInterface::NfcDep));
    assert_eq!(rec.nfcid.to_hex(), "a0a1a2a3a4a5a6a7a8a9");
    let atr = mock.borrow().atr_requests[0].clone();
    assert_eq!(atr.comm_mode, CommMode::Passive);
    assert_eq!(atr.lr, 3);
}

#[test]
fn nfc_dep_activation_failure_restarts_discovery() {
    let mock = MockFrontend::with_tags(vec![fixtures::nfca_dep()]);
    let mut engine = engine_with_mock(&mock);
    let notes = Notifications::default();
    discover(
        &mut engine,
        DiscoverParams::builder()
            .techs(TechMask::POLL_A)
            .notify(notes.callback())
            .build()
            .unwrap(),
    );

    run_until(&mut engine, State::StartDiscovery);
    assert_eq!(notes.states(), vec![State::StartDiscovery]);
    assert!(engine.active_device().is_err());
}

#[test]
fn iso_dep_activation_error_restarts_discovery() {
    let mock = MockFrontend::with_tags(vec![fixtures::t4t()]);
    mock.borrow_mut().activation_error = Some(Error::Timeout);
    let mut engine = engine_with_mock(&mock);
    discover(&mut engine, DiscoverParams::builder().techs(TechMask::POLL_A).build().unwrap());

    run_until(&mut engine, State::StartDiscovery);
    assert!(!mock.borrow().field_on);
}

#[test]
fn sleeping_nfcb_is_woken_once_then_attrib() {
    let dev = match fixtures::nfcb(true) {
        ListenDevice::NfcB(b) => ListenDevice::NfcB(b.sleeping()),
        other => other,
    };
    let mock = MockFrontend::with_tags(vec![dev]);
    let engine = activate(&mock, TechMask::POLL_B);

    assert_eq!(mock.borrow().wakes, vec![Technology::NfcB]);
    let rec = engine.active_device().unwrap();
    assert_eq!(rec.interface, Some(RfInterface::IsoDep));
    assert_eq!(rec.nfcid.as_bytes(), &[0x5a, 0x01, 0x02, 0x03]);
}

#[test]
fn nfcb_without_iso_support_stays_raw() {
    let mock = MockFrontend::with_tags(vec![fixtures::nfcb(false)]);
    let engine = activate(&mock, TechMask::POLL_B);
    assert_eq!(engine.active_device().unwrap().interface, Some(RfInterface::RfRaw));
}

#[test]
fn nfcf_nfc_dep_is_addressed_by_nfcid2() {
    let mock = MockFrontend::with_tags(vec![fixtures::nfcf_dep()]);
    mock.borrow_mut().nfc_dep_peer = Some(fixtures::nfc_dep_peer(CommMode::Passive));
    let engine = activate(&mock, TechMask::POLL_F);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.interface, Some(RfInterface::NfcDep));
    let f = mock.borrow();
    assert_eq!(f.atr_requests[0].nfcid.to_hex(), "01fe0a0b0c0d0e0f");
    assert!(f.inits.contains(&(Technology::NfcF, BitRate::Br212)));
}

#[test]
fn t3t_keeps_nfcid2() {
    let mock = MockFrontend::with_tags(vec![fixtures::t3t()]);
    let engine = activate(&mock, TechMask::POLL_F);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.interface, Some(RfInterface::RfRaw));
    assert_eq!(rec.nfcid.to_hex(), "012e3c4d5e6f7081");
    assert!(mock.borrow().atr_requests.is_empty());
}

#[test]
fn nfcv_and_st25tb_use_their_uid() {
    let mock = MockFrontend::with_tags(vec![fixtures::nfcv()]);
    let engine = activate(&mock, TechMask::POLL_V);
    assert_eq!(engine.active_device().unwrap().nfcid.to_hex(), "e004015012345678");

    let mock = MockFrontend::with_tags(vec![fixtures::st25tb()]);
    let engine = activate(&mock, TechMask::POLL_ST25TB);
    let rec = engine.active_device().unwrap();
    assert_eq!(rec.nfcid.to_hex(), "d002334455667788");
    assert_eq!(rec.device_type(), DeviceType::ListenSt25tb);
}

#[test]
fn active_p2p_detection_activates_and_ends_probing() {
    let mock = MockFrontend::with_tags(vec![fixtures::t2t()]);
    mock.borrow_mut().ap2p_peer = Some(fixtures::nfc_dep_peer(CommMode::Active));
    let engine = activate(&mock, TechMask::POLL_AP2P | TechMask::POLL_A);

    let f = mock.borrow();
    assert!(f.probes.is_empty());
    assert_eq!(f.modes, vec![(RfMode::PollActiveP2p, BitRate::Br424)]);
    assert_eq!(f.atr_requests[0].comm_mode, CommMode::Active);

    let rec = engine.active_device().unwrap();
    assert_eq!(rec.device_type(), DeviceType::ListenAp2p);
    assert_eq!(rec.interface, Some(RfInterface::NfcDep));
    assert_eq!(rec.nfcid.to_hex(), "a0a1a2a3a4a5a6a7a8a9");
    assert!(matches!(rec.protocol, ProtocolInfo::NfcDep(_)));
}
