//! SPI framing of the SPIRIT1 interface, checked against a mocked bus

mod common;

use embedded_hal_mock::eh1::{
    digital::{Mock as PinMock, State as PinState, Transaction as PinTransaction},
    spi::{Mock as SpiMock, Transaction as SpiTransaction},
};
use spsgrf::{registers, registers::Register, Command, Interface, SpiInterface, Spirit1, State};

/// Status word clocked out with every header: READY, XO on, RX FIFO empty
const READY: [u8; 2] = [0x02, 0x07];

fn write(addr: u8, data: &[u8]) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x00, addr], READY.to_vec()),
        SpiTransaction::write_vec(data.to_vec()),
        SpiTransaction::transaction_end(),
    ]
}

fn read(addr: u8, data: &[u8]) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x01, addr], READY.to_vec()),
        SpiTransaction::read_vec(data.to_vec()),
        SpiTransaction::transaction_end(),
    ]
}

fn command(cmd: Command) -> Vec<SpiTransaction<u8>> {
    vec![
        SpiTransaction::transaction_start(),
        SpiTransaction::transfer(vec![0x80, cmd as u8], READY.to_vec()),
        SpiTransaction::transaction_end(),
    ]
}

#[test]
fn register_write_frame() {
    let mut spi = SpiMock::new(&write(0x90, &[0x20, 0x00, 0x00, 0x07]));
    let mut iface = SpiInterface::new(spi.clone());
    let status = iface.register_write(0x90, &[0x20, 0x00, 0x00, 0x07]).unwrap();
    assert_eq!(status.state(), State::Ready);
    assert!(status.xo_on());
    assert!(status.rx_fifo_empty());
    spi.done();
}

#[test]
fn register_read_frame() {
    let mut spi = SpiMock::new(&read(0xF0, &[0x01, 0x30]));
    let mut iface = SpiInterface::new(spi.clone());
    let info = registers::DeviceInfo::read(&mut iface).unwrap();
    assert_eq!(info.part_number(), 0x01);
    assert_eq!(info.version(), 0x30);
    spi.done();
}

#[test]
fn command_frame() {
    let mut spi = SpiMock::new(&command(Command::FlushTxFifo));
    let mut iface = SpiInterface::new(spi.clone());
    iface.command(Command::FlushTxFifo).unwrap();
    spi.done();
}

#[test]
fn fifo_frames() {
    let mut expected = write(0xFF, &[1, 2, 3]);
    expected.extend(read(0xFF, &[4, 5]));
    let mut spi = SpiMock::new(&expected);
    let mut iface = SpiInterface::new(spi.clone());
    iface.fifo_write(&[1, 2, 3]).unwrap();
    let mut buf = [0; 2];
    iface.fifo_read(&mut buf).unwrap();
    assert_eq!(buf, [4, 5]);
    spi.done();
}

#[test]
fn modify_skips_unchanged_registers() {
    // QI with the SQI check already on
    let mut expected = read(0x3A, &[0x02]);
    expected.extend(read(0x3A, &[0x02]));
    expected.extend(write(0x3A, &[0x03]));
    let mut spi = SpiMock::new(&expected);
    let mut iface = SpiInterface::new(spi.clone());
    registers::QualityIndicators::modify(&mut iface, |r| r.set_sqi_enable(true)).unwrap();
    registers::QualityIndicators::modify(&mut iface, |r| r.set_pqi_enable(true)).unwrap();
    spi.done();
}

#[test]
fn init_over_spi() {
    let mut expected = command(Command::SoftReset);
    expected.extend(read(0xC0, &READY));
    expected.extend(read(0xF0, &[0x01, 0x30]));
    expected.extend(write(0xB2, &[0xCA]));
    expected.extend(write(0xA8, &[0x04]));
    expected.extend(read(0xA8, &[0x04]));
    expected.extend(write(0xA8, &[0x00]));
    let mut spi = SpiMock::new(&expected);
    let mut sdn = PinMock::new(&[
        PinTransaction::set(PinState::High),
        PinTransaction::set(PinState::Low),
    ]);
    let mut irq = PinMock::new(&[] as &[PinTransaction]);

    let radio = Spirit1::init(
        SpiInterface::new(spi.clone()),
        sdn.clone(),
        irq.clone(),
        50_000_000,
        &mut common::NoDelay,
    )
    .unwrap();
    assert_eq!(radio.xtal(), 50_000_000);
    assert_eq!(radio.status().state(), State::Ready);

    spi.done();
    sdn.done();
    irq.done();
}
