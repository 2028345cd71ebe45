use std::task::Poll;

use crate::common::fixtures;
use libnfcdisc::config::{ListenConfig, WakeupConfig};
use libnfcdisc::prelude::*;
use libnfcdisc::protocol::TargetParams;
use libnfcdisc::transport::{ListenEvent, ListenMode, MockFrontend, NfcDepLayer, RadioDriver, WakeupMode};
use libnfcdisc::types::{CommMode, LmState};

#[test]
fn clones_share_the_field() {
    let mock = MockFrontend::new();
    let mut engine_side = mock.clone();
    engine_side.field_on_and_start_gt().unwrap();
    engine_side.worker();
    engine_side.worker();

    let f = mock.borrow();
    assert!(f.field_on);
    assert_eq!(f.now_ms, 2);
    assert_eq!(f.worker_calls, 2);
}

#[test]
fn target_activation_reports_initiator_nfcid3_and_ppi() {
    let mut mock = MockFrontend::new();
    let target = TargetParams {
        comm_mode: CommMode::Passive,
        nfcid3: Nfcid::default(),
        bst: 0,
        brt: 0,
        to: 10,
        ppt: 0x30,
        general_bytes: Vec::new(),
        oper_param: 0,
    };
    mock.nfcdep_listen_start_activation(&target, &fixtures::atr_req_body())
        .unwrap();

    match mock.nfcdep_listen_activation_status() {
        Poll::Ready(Ok(info)) => {
            assert_eq!(info.nfcid3.to_hex(), "c0c1c2c3c4c5c6c7c8c9");
            assert_eq!(info.frame_size(), 254);
            assert_eq!(info.general_bytes, fixtures::bytes("46666d010111"));
        }
        other => panic!("unexpected {:?}", other),
    }
    // Consumed by the first status poll
    assert!(matches!(
        mock.nfcdep_listen_activation_status(),
        Poll::Ready(Err(Error::Internal(_)))
    ));
}

#[test]
fn listen_event_keeps_its_bit_rate() {
    let mut mock = MockFrontend::new();
    mock.push_listen_event(ListenEvent::frame(LmState::Idle, &fixtures::nfcf_atr_req()).at(BitRate::Br424));
    let mut rx = [0u8; 64];

    // Nothing is reported before listen mode is started
    assert_eq!(mock.listen_state(&mut rx).state, LmState::NotInit);

    mock.listen_start(ListenMask::ACTIVE_P2P, &ListenConfig::default()).unwrap();
    let st = mock.listen_state(&mut rx);
    assert_eq!(st.state, LmState::Idle);
    assert_eq!(st.bit_rate, BitRate::Br424);
    assert_eq!(st.received, Some(fixtures::nfcf_atr_req().len()));

    mock.listen_stop().unwrap();
    assert!(!mock.borrow().listen_active);
}

#[test]
fn wakeup_records_custom_configuration() {
    let mut mock = MockFrontend::new();
    let cfg = WakeupConfig {
        period_ms: 300,
        ..WakeupConfig::default()
    };
    mock.wakeup_start(Some(&cfg)).unwrap();
    assert!(mock.borrow().wakeup_active);
    assert_eq!(mock.borrow().wakeup_configs, vec![Some(cfg)]);

    mock.borrow_mut().wakeup_start_error = true;
    assert!(matches!(mock.wakeup_start(None), Err(Error::Driver(_))));
}
