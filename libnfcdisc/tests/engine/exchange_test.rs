use std::task::Poll;

use crate::common::{Notifications, fixtures, init_logger};
use libnfcdisc::prelude::*;
use libnfcdisc::test_support::{activated_nfca, discover, engine_with_mock, run_until};
use libnfcdisc::transport::MockFrontend;
use libnfcdisc::types::CommMode;

fn activated(dev: ListenDevice, techs: TechMask) -> (Engine, MockFrontend, Notifications) {
    init_logger();
    let mock = MockFrontend::with_tags(vec![dev]);
    mock.borrow_mut().nfc_dep_peer = Some(fixtures::nfc_dep_peer(CommMode::Passive));
    let notes = Notifications::default();
    let mut engine = engine_with_mock(&mock);
    discover(
        &mut engine,
        DiscoverParams::builder()
            .techs(techs)
            .notify(notes.callback())
            .build()
            .unwrap(),
    );
    run_until(&mut engine, State::Activated);
    (engine, mock, notes)
}

#[test]
fn iso_dep_apdu_round_trip() {
    let (mut engine, mock, _) = activated(fixtures::t4t(), TechMask::POLL_A);
    mock.push_response(&fixtures::SW_OK);

    let apdu = fixtures::select_ndef_apdu();
    let h = engine.data_exchange_start(&apdu, 0, TxRxFlags::DEFAULT).unwrap();
    assert_eq!(h.interface(), RfInterface::IsoDep);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Ok(&fixtures::SW_OK[..])));

    let f = mock.borrow();
    assert_eq!(f.sent, vec![(RfInterface::IsoDep, apdu)]);
    let chaining = f.last_chaining.unwrap();
    assert_eq!(chaining.fsx, 256);
    assert_eq!(chaining.did, 0);
}

#[test]
fn apdu_larger_than_buffer_is_refused() {
    let (mut engine, mock, _) = activated(fixtures::t4t(), TechMask::POLL_A);
    let apdu = vec![0u8; 1025];
    assert_eq!(
        engine.data_exchange_start(&apdu, 0, TxRxFlags::DEFAULT),
        Err(Error::NoMemory {
            capacity: 1024,
            required: 1025
        })
    );
    assert_eq!(engine.state(), State::Activated);
    assert!(mock.borrow().sent.is_empty());
}

#[test]
fn nfc_dep_uses_frame_size_from_pp() {
    let (mut engine, mock, _) = activated(fixtures::nfca_dep(), TechMask::POLL_A);
    mock.push_response(&[0xd5, 0x07, 0x00]);

    let h = engine.data_exchange_start(&[0x01, 0x02], 0, TxRxFlags::DEFAULT).unwrap();
    assert_eq!(h.interface(), RfInterface::NfcDep);
    run_until(&mut engine, State::DataExchangeDone);
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Ok(&[0xd5, 0x07, 0x00][..])));
    assert_eq!(mock.borrow().last_chaining.unwrap().fsx, 254);
}

#[test]
fn link_loss_then_restart() {
    let (mut engine, mock, notes) = activated(fixtures::t2t(), TechMask::POLL_A);
    mock.borrow_mut().exchange_ticks = 1;
    mock.push_response(&[0x00]);

    let h = engine.data_exchange_start(&[0x30, 0x04], 1_000, TxRxFlags::DEFAULT).unwrap();
    mock.drop_link();
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Err(Error::LinkLoss)));
    assert_eq!(engine.state(), State::DataExchangeDone);

    engine.deactivate(true).unwrap();
    assert_eq!(engine.poll(), State::StartDiscovery);
    assert_eq!(notes.count(State::StartDiscovery), 1);
    assert!(!mock.borrow().field_on);
}

#[test]
fn oversize_raw_reply_is_no_memory() {
    let (mut engine, mock) = activated_nfca();
    mock.push_response(&[0xaa; 300]);
    let h = engine.data_exchange_start(&[0x30, 0x00], 0, TxRxFlags::DEFAULT).unwrap();
    match engine.data_exchange_status(h) {
        Poll::Ready(Err(Error::NoMemory { required, .. })) => assert_eq!(required, 300),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn handle_is_stale_after_deactivation() {
    let (mut engine, mock) = activated_nfca();
    mock.push_response(&[0x00]);
    let h = engine.data_exchange_start(&[0x30, 0x00], 0, TxRxFlags::DEFAULT).unwrap();
    engine.deactivate(false).unwrap();
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Err(Error::WrongState)));
}

#[test]
fn poll_driven_completion_notifies_once() {
    let (mut engine, mock, notes) = activated(fixtures::t2t(), TechMask::POLL_A);
    mock.borrow_mut().exchange_ticks = 2;
    mock.push_response(&[0x01]);

    let h = engine.data_exchange_start(&[0x30, 0x00], 0, TxRxFlags::DEFAULT).unwrap();
    run_until(&mut engine, State::DataExchangeDone);
    for _ in 0..3 {
        engine.poll();
    }
    assert_eq!(engine.data_exchange_status(h), Poll::Ready(Ok(&[0x01][..])));
    assert_eq!(notes.count(State::DataExchangeDone), 1);
}

#[test]
fn next_exchange_from_done_state() {
    let (mut engine, mock) = activated_nfca();
    mock.push_response(&[0x01]);
    mock.push_response(&[0x02]);

    let first = engine.data_exchange_start(&[0x30, 0x00], 0, TxRxFlags::DEFAULT).unwrap();
    assert!(engine.data_exchange_status(first).is_ready());
    let second = engine.data_exchange_start(&[0x30, 0x04], 0, TxRxFlags::DEFAULT).unwrap();
    assert_eq!(engine.data_exchange_status(second), Poll::Ready(Ok(&[0x02][..])));
    assert_eq!(mock.sent_frames(), vec![vec![0x30, 0x00], vec![0x30, 0x04]]);
}
