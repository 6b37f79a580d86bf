mod common;

use common::*;
use spsgrf::{
    spsgrf::{Event, Spsgrf, SpsgrfConfig},
    Command, State,
};

type Module = Spsgrf<FakeSpirit, FakeSdn, FakeIrq>;

fn module_with(chip: FakeSpirit) -> Module {
    Spsgrf::new(
        chip,
        FakeSdn::default(),
        FakeIrq { low: true },
        &mut NoDelay,
        &SpsgrfConfig::default(),
    )
    .unwrap()
}

fn fake<T>(module: &mut Module, f: impl FnOnce(&mut FakeSpirit) -> T) -> T {
    module.radio().with_interface(f)
}

#[test]
fn default_configuration() {
    let mut module = module_with(FakeSpirit::default());
    fake(&mut module, |f| {
        // GPIO3 drives the IRQ line
        assert_eq!(f.regs[0x02], 0x02);
        // TX done, RX ready, RX discarded, RX timeout
        assert_eq!(f.regs_at(0x90, 4), [0x20, 0x00, 0x00, 0x07]);
        // SQI check, no bit errors tolerated
        assert_eq!(f.regs[0x3A], 0x02);
        // -120dBm
        assert_eq!(f.regs[0x22], 20);
        // RX timeout stops on SQI
        assert_eq!(f.regs[0x50] & 0x40, 0x40);
        assert_eq!(f.regs_at(0x53, 2), [57, 248]);
        // broadcast, multicast, own address
        assert_eq!(f.regs_at(0x4C, 3), [0xFF, 0xEE, 0x44]);
        // only PA slot 0 in use
        assert_eq!(f.regs[0x18] & 0x07, 0);
    });
    let dbm = module.radio().pa_level_dbm(bilge::prelude::u3::new(0)).unwrap();
    assert!((dbm - 11.6).abs() < 1.0, "{dbm}");
    assert_eq!(module.radio().refresh_status().unwrap().state(), State::Ready);
    assert_eq!(module.poll_event().unwrap(), None);
}

#[test]
fn transmit() {
    let mut module = module_with(FakeSpirit::default());
    module.start_tx(0x12, b"hello").unwrap();

    fake(&mut module, |f| {
        assert_eq!(f.sent, [b"hello".to_vec()]);
        assert_eq!(f.regs[0x4B], 0x12);
        // payload plus the destination address
        assert_eq!(f.reg16(0x34), 6);
        assert!(f.commands.contains(&Command::FlushTxFifo));
        assert_eq!(f.commands.last(), Some(&Command::Tx));
        // TX power management workaround
        assert_eq!(f.regs[0xA5], 0x20);
        assert_eq!(f.regs[0xA9], 0x11);
    });

    assert_eq!(module.poll_event().unwrap(), Some(Event::TxDone));
    assert_eq!(module.poll_event().unwrap(), None);
}

#[test]
fn transmit_truncates_to_the_fifo() {
    let mut module = module_with(FakeSpirit::default());
    module.start_tx(0xFF, &[0x5A; 120]).unwrap();
    fake(&mut module, |f| {
        assert_eq!(f.sent[0].len(), 96);
        assert_eq!(f.reg16(0x34), 97);
    });
}

#[test]
fn receive() {
    let chip = FakeSpirit {
        incoming: Some(Packet {
            source: 0x21,
            destination: 0x44,
            payload: b"spirit".to_vec(),
        }),
        ..Default::default()
    };
    let mut module = module_with(chip);
    module.start_rx().unwrap();

    // RX power management workaround
    assert_eq!(fake(&mut module, |f| f.regs[0xA5]), 0x98);
    assert_eq!(module.poll_event().unwrap(), Some(Event::PacketReceived));
    assert_eq!(module.radio().received_length().unwrap(), 6);
    assert_eq!(module.radio().received_destination().unwrap(), 0x44);
    assert_eq!(module.radio().received_source().unwrap(), 0x21);

    let data = module.rx_data().unwrap();
    assert_eq!(&data[..], b"spirit");
    assert_eq!(module.radio().rx_fifo_len().unwrap(), 0);
}

#[test]
fn abort_from_rx() {
    let mut module = module_with(FakeSpirit::default());
    module.start_rx().unwrap();
    assert_eq!(module.radio().refresh_status().unwrap().state(), State::Rx);
    module.abort().unwrap();
    assert_eq!(module.radio().refresh_status().unwrap().state(), State::Ready);
    assert_eq!(
        fake(&mut module, |f| f.commands.last().copied()),
        Some(Command::Sabort)
    );
}

#[test]
fn wait_event_uses_the_pin() {
    let mut module = module_with(FakeSpirit::default());
    module.start_tx(0x01, &[1, 2, 3]).unwrap();
    assert_eq!(module.wait_event().unwrap(), Event::TxDone);
}
