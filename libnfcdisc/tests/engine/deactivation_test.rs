use crate::common::{Notifications, fixtures, init_logger};
use libnfcdisc::prelude::*;
use libnfcdisc::test_support::{activated_nfca, discover, engine_with_mock, run_until};
use libnfcdisc::transport::{Farewell, MockFrontend};
use libnfcdisc::types::CommMode;

fn activated_with(mock: &MockFrontend, builder: DiscoverParamsBuilder) -> Engine {
    init_logger();
    let mut engine = engine_with_mock(mock);
    discover(&mut engine, builder.build().unwrap());
    run_until(&mut engine, State::Activated);
    engine
}

#[test]
fn iso_dep_card_is_deselected() {
    let mock = MockFrontend::with_tags(vec![fixtures::t4t()]);
    let mut engine = activated_with(&mock, DiscoverParams::builder().techs(TechMask::POLL_A));
    engine.deactivate(false).unwrap();
    assert_eq!(mock.borrow().farewells, vec![Farewell::IsoDepDeselect]);
    assert_eq!(engine.state(), State::Idle);
}

#[test]
fn active_p2p_peer_is_released() {
    let mock = MockFrontend::new();
    mock.borrow_mut().ap2p_peer = Some(fixtures::nfc_dep_peer(CommMode::Active));
    let mut engine = activated_with(&mock, DiscoverParams::builder().techs(TechMask::POLL_AP2P));
    engine.deactivate(false).unwrap();
    assert_eq!(mock.borrow().farewells, vec![Farewell::NfcDepRelease]);
}

#[test]
fn passive_nfc_dep_target_is_deselected() {
    let mock = MockFrontend::with_tags(vec![fixtures::nfcf_dep()]);
    mock.borrow_mut().nfc_dep_peer = Some(fixtures::nfc_dep_peer(CommMode::Passive));
    let mut engine = activated_with(&mock, DiscoverParams::builder().techs(TechMask::POLL_F));
    engine.deactivate(false).unwrap();
    assert_eq!(mock.borrow().farewells, vec![Farewell::NfcDepDeselect]);
}

#[test]
fn raw_device_gets_no_farewell() {
    let (mut engine, mock) = activated_nfca();
    engine.deactivate(false).unwrap();
    assert!(mock.borrow().farewells.is_empty());
    assert_eq!(mock.borrow().field_off_count, 1);
}

#[test]
fn farewell_can_be_skipped() {
    let mock = MockFrontend::with_tags(vec![fixtures::t4t()]);
    let mut engine = activated_with(
        &mock,
        DiscoverParams::builder()
            .techs(TechMask::POLL_A)
            .skip_deactivation(true),
    );
    engine.deactivate(false).unwrap();
    assert!(mock.borrow().farewells.is_empty());
    assert!(!mock.borrow().field_on);
}

#[cfg(feature = "listen")]
#[test]
fn listener_role_sends_no_farewell() {
    use libnfcdisc::test_support::listening_engine;
    use libnfcdisc::transport::ListenEvent;
    use libnfcdisc::types::LmState;

    let (mut engine, mock) = listening_engine();
    mock.push_listen_event(ListenEvent::frame(LmState::ActiveA, &fixtures::rats()));
    run_until(&mut engine, State::Activated);
    engine.deactivate(false).unwrap();

    let f = mock.borrow();
    assert!(f.farewells.is_empty());
    assert!(!f.listen_active);
}

#[test]
fn discovery_can_be_stopped_before_activation() {
    let mock = MockFrontend::new();
    let mut engine = engine_with_mock(&mock);
    discover(
        &mut engine,
        DiscoverParams::builder().techs(TechMask::POLL_A).build().unwrap(),
    );
    run_until(&mut engine, State::PollTechDetect);
    engine.deactivate(false).unwrap();
    assert_eq!(engine.state(), State::Idle);
    assert!(!mock.borrow().field_on);

    // Idle engines accept a new run
    discover(
        &mut engine,
        DiscoverParams::builder().techs(TechMask::POLL_A).build().unwrap(),
    );
    assert_eq!(engine.state(), State::StartDiscovery);
}

#[test]
fn second_deactivation_is_wrong_state() {
    let (mut engine, _mock) = activated_nfca();
    engine.deactivate(false).unwrap();
    assert_eq!(engine.deactivate(true), Err(Error::WrongState));
}

#[test]
fn restart_is_notified_and_finds_the_tag_again() {
    let mock = MockFrontend::with_tags(vec![fixtures::t2t()]);
    let notes = Notifications::default();
    let mut engine = activated_with(
        &mock,
        DiscoverParams::builder()
            .techs(TechMask::POLL_A)
            .notify(notes.callback()),
    );

    engine.deactivate(true).unwrap();
    run_until(&mut engine, State::Activated);
    assert_eq!(
        notes.states(),
        vec![State::Activated, State::StartDiscovery, State::Activated]
    );
}
