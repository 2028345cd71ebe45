// Discovery loop over the simulated front-end
//
// Two NFC-A tags are placed in the field. The notification callback asks
// the application to pick one, which is then read with a raw exchange and
// released. Run with `RUST_LOG=debug` to follow the state machine.

use std::cell::Cell;
use std::rc::Rc;
use std::task::Poll;

use libnfcdisc::device::NfcaType;
use libnfcdisc::prelude::*;
use libnfcdisc::test_support::nfca_tag;
use libnfcdisc::transport::MockFrontend;

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let mock = MockFrontend::with_tags(vec![
        nfca_tag(NfcaType::T2t, &[0x04, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66]),
        nfca_tag(NfcaType::T4t, &[0x08, 0x12, 0x34, 0x56]),
    ]);
    mock.push_response(&[0x03, 0x0c, 0xd1, 0x01, 0x08, 0x55, 0x01, 0x65, 0x78, 0x61]);

    let mut engine = Engine::new(Box::new(mock.clone()));
    engine.initialize()?;

    let select_pending = Rc::new(Cell::new(false));
    let flag = select_pending.clone();
    let params = DiscoverParams::builder()
        .techs(TechMask::POLL_A | TechMask::POLL_B | TechMask::POLL_F)
        .device_limit(4)
        .notify(move |st| {
            println!("-> {}", st);
            if st == State::PollSelect {
                flag.set(true);
            }
        })
        .build()?;
    engine.discover(params)?;

    loop {
        let st = engine.poll();
        if select_pending.replace(false) {
            for (i, dev) in engine.devices_found()?.iter().enumerate() {
                println!("  [{}] {}", i, dev);
            }
            engine.select(0)?;
        }
        if st == State::Activated {
            break;
        }
    }
    println!("activated: {}", engine.active_device()?);

    // READ 4 pages from page 4
    let h = engine.data_exchange_start(&[0x30, 0x04], 5_000, TxRxFlags::DEFAULT)?;
    let rx = loop {
        engine.poll();
        if let Poll::Ready(res) = engine.data_exchange_status(h) {
            break res?.to_vec();
        }
    };
    println!("read: {}", bytes_to_hex_spaced(&rx));

    engine.deactivate(false)?;
    println!("final state: {}", engine.state());
    Ok(())
}
