mod common;

use common::NoDelay;
use embedded_hal_mock::eh1::spi::{Mock as SpiMock, Transaction};
use spsgrf::nor::{
    mx25lm51245g::{self, GEOMETRY},
    selftest::{self, SelftestError, StatusSink, Step, PATTERN_LEN, TEST_ADDRESS},
    DeepPowerDown, EraseSize, FlashStatus, Geometry, MemoryMapped, Mx25lm51245g, NorError,
    NorFlash,
};

const ID: [u8; 3] = [0xC2, 0x85, 0x3A];

fn read_id(id: [u8; 3]) -> Vec<Transaction<u8>> {
    vec![
        Transaction::transaction_start(),
        Transaction::write_vec(vec![0x9F]),
        Transaction::read_vec(id.to_vec()),
        Transaction::transaction_end(),
    ]
}

fn status(sr: u8) -> Vec<Transaction<u8>> {
    vec![
        Transaction::transaction_start(),
        Transaction::write_vec(vec![0x05]),
        Transaction::read_vec(vec![sr]),
        Transaction::transaction_end(),
    ]
}

fn single(data: &[u8]) -> Vec<Transaction<u8>> {
    vec![
        Transaction::transaction_start(),
        Transaction::write_vec(data.to_vec()),
        Transaction::transaction_end(),
    ]
}

fn write_enable() -> Vec<Transaction<u8>> {
    let mut t = single(&[0x06]);
    t.extend(status(0x02));
    t
}

fn program(address: u32, len: usize) -> Vec<Transaction<u8>> {
    let [a3, a2, a1, a0] = address.to_be_bytes();
    let mut t = write_enable();
    t.extend([
        Transaction::transaction_start(),
        Transaction::write_vec(vec![0x12, a3, a2, a1, a0]),
        Transaction::write_vec(vec![0xAB; len]),
        Transaction::transaction_end(),
    ]);
    t.extend(status(0x00));
    t
}

fn flash_with(rest: Vec<Transaction<u8>>) -> (SpiMock<u8>, Mx25lm51245g<SpiMock<u8>, NoDelay>) {
    let mut expected = read_id(ID);
    expected.extend(rest);
    let spi = SpiMock::new(&expected);
    let flash = Mx25lm51245g::new(spi.clone(), NoDelay).unwrap();
    (spi, flash)
}

#[test]
fn checks_the_id() {
    let mut spi = SpiMock::new(&read_id([0xEF, 0x40, 0x18]));
    let res = Mx25lm51245g::new(spi.clone(), NoDelay);
    assert!(matches!(res, Err(NorError::UnexpectedId([0xEF, 0x40, 0x18]))));
    spi.done();
}

#[test]
fn reads_status() {
    let (mut spi, mut flash) = flash_with(status(0x83));
    let sr: FlashStatus = flash.status().unwrap();
    assert!(sr.wip() && sr.wel() && sr.srwd());
    spi.done();
}

#[test]
fn erases_a_sector() {
    let mut expected = write_enable();
    expected.extend(single(&[0x21, 0x00, 0x01, 0x20, 0x00]));
    expected.extend(status(0x03));
    expected.extend(status(0x00));
    let (mut spi, mut flash) = flash_with(expected);
    flash.erase_block(0x1_2000, EraseSize::Sector4K).unwrap();
    spi.done();
}

#[test]
fn erases_a_block() {
    let mut expected = write_enable();
    expected.extend(single(&[0xDC, 0x00, 0x01, 0x00, 0x00]));
    expected.extend(status(0x00));
    let (mut spi, mut flash) = flash_with(expected);
    flash.erase_block(0x1_0000, EraseSize::Block64K).unwrap();
    spi.done();
}

#[test]
fn splits_writes_on_pages() {
    let mut expected = program(0xF0, 16);
    expected.extend(program(0x100, 256));
    expected.extend(program(0x200, 28));
    let (mut spi, mut flash) = flash_with(expected);
    flash.write(0xF0, &[0xAB; 300]).unwrap();
    spi.done();
}

#[test]
fn reads_with_a_4_byte_address() {
    let expected = vec![
        Transaction::transaction_start(),
        Transaction::write_vec(vec![0x13, 0x01, 0x00, 0x00, 0x50]),
        Transaction::read_vec(vec![1, 2, 3, 4]),
        Transaction::transaction_end(),
    ];
    let (mut spi, mut flash) = flash_with(expected);
    let mut buf = [0; 4];
    flash.read(0x0100_0050, &mut buf).unwrap();
    assert_eq!(buf, [1, 2, 3, 4]);
    spi.done();
}

#[test]
fn rejects_accesses_past_the_end() {
    let (mut spi, mut flash) = flash_with(vec![]);
    let end = <Mx25lm51245g<SpiMock<u8>, NoDelay> as NorFlash>::CAPACITY;
    let mut buf = [0; 2];
    assert!(matches!(flash.read(end - 1, &mut buf), Err(NorError::OutOfBounds)));
    assert!(matches!(flash.write(end, &[0]), Err(NorError::OutOfBounds)));
    spi.done();
}

#[test]
fn reports_the_datasheet_geometry() {
    let (mut spi, flash) = flash_with(vec![]);
    assert_eq!(
        flash.geometry(),
        Geometry {
            capacity: 64 * 1024 * 1024,
            page_size: 256,
            sector_size: 4096,
            block_size: 65536,
        }
    );
    assert_eq!(mx25lm51245g::PAGE_SIZE, 256);
    spi.done();
}

#[test]
fn write_enable_must_latch() {
    let mut expected = single(&[0x06]);
    for _ in 0..16 {
        expected.extend(status(0x00));
    }
    let (mut spi, mut flash) = flash_with(expected);
    assert!(matches!(
        flash.erase_block(0, EraseSize::Sector4K),
        Err(NorError::WriteProtected)
    ));
    spi.done();
}

#[test]
fn program_times_out() {
    let mut expected = write_enable();
    expected.extend([
        Transaction::transaction_start(),
        Transaction::write_vec(vec![0x12, 0, 0, 0, 0]),
        Transaction::write_vec(vec![0xAB]),
        Transaction::transaction_end(),
    ]);
    // 5ms in 100us steps, plus the first poll
    for _ in 0..51 {
        expected.extend(status(0x01));
    }
    let (mut spi, mut flash) = flash_with(expected);
    assert!(matches!(flash.write(0, &[0xAB]), Err(NorError::Timeout)));
    spi.done();
}

#[test]
fn deep_power_down() {
    let mut expected = single(&[0xB9]);
    expected.extend(single(&[0xAB]));
    let (mut spi, mut flash) = flash_with(expected);
    flash.enter_deep_power_down().unwrap();
    flash.leave_deep_power_down().unwrap();
    spi.done();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RamError {
    Asleep,
}

/// Flash simulated in RAM, with NOR program semantics
struct RamFlash {
    mem: Vec<u8>,
    asleep: bool,
    /// Keeps answering in deep power down
    ignores_power_down: bool,
    /// Address whose bit 0 always reads back as 0
    stuck: Option<usize>,
}

impl RamFlash {
    fn new() -> Self {
        Self {
            mem: vec![0x00; Self::CAPACITY as usize],
            asleep: false,
            ignores_power_down: false,
            stuck: None,
        }
    }

    fn awake(&self) -> Result<(), RamError> {
        if self.asleep && !self.ignores_power_down {
            Err(RamError::Asleep)
        } else {
            Ok(())
        }
    }
}

impl NorFlash for RamFlash {
    type Error = RamError;

    const CAPACITY: u32 = 64 * 1024;
    const PAGE_SIZE: u32 = 256;

    fn erase_block(&mut self, address: u32, size: EraseSize) -> Result<(), Self::Error> {
        self.awake()?;
        let start = (address - address % size.bytes()) as usize;
        self.mem[start..start + size.bytes() as usize].fill(0xFF);
        Ok(())
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
        self.awake()?;
        let start = address as usize;
        for (m, d) in self.mem[start..start + data.len()].iter_mut().zip(data) {
            *m &= d;
        }
        Ok(())
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.awake()?;
        let start = address as usize;
        buf.copy_from_slice(&self.mem[start..start + buf.len()]);
        if let Some(stuck) = self.stuck {
            if let Some(b) = buf.get_mut(stuck.wrapping_sub(start)) {
                *b &= !0x01;
            }
        }
        Ok(())
    }

    fn status(&mut self) -> Result<FlashStatus, Self::Error> {
        self.awake()?;
        Ok(FlashStatus::default())
    }
}

impl DeepPowerDown for RamFlash {
    fn enter_deep_power_down(&mut self) -> Result<(), Self::Error> {
        self.asleep = true;
        Ok(())
    }

    fn leave_deep_power_down(&mut self) -> Result<(), Self::Error> {
        self.asleep = false;
        Ok(())
    }
}

impl MemoryMapped for RamFlash {
    fn memory_mapped(&mut self) -> Result<&[u8], Self::Error> {
        self.awake()?;
        Ok(&self.mem)
    }
}

const RAM_GEOMETRY: Geometry = Geometry {
    capacity: 64 * 1024,
    ..GEOMETRY
};

#[derive(Default)]
struct Log(Vec<String>);

impl StatusSink for Log {
    fn step(&mut self, name: &str) {
        self.0.push(name.to_string());
    }

    fn passed(&mut self) {
        self.0.push("ok".to_string());
    }

    fn failed(&mut self, reason: &str) {
        self.0.push(format!("failed: {reason}"));
    }
}

#[test]
fn selftest_passes() {
    let mut flash = RamFlash::new();
    let mut log = Log::default();
    selftest::run_memory_mapped(&mut flash, &RAM_GEOMETRY, &mut log).unwrap();

    let steps: Vec<_> = log.0.iter().step_by(2).map(String::as_str).collect();
    assert_eq!(
        steps,
        [
            "geometry",
            "erase",
            "write",
            "read",
            "memory mapped read",
            "enter deep power down",
            "read in deep power down",
            "leave deep power down",
            "read after wake up",
        ]
    );
    assert!(log.0.iter().skip(1).step_by(2).all(|s| s == "ok"));

    let start = TEST_ADDRESS as usize;
    assert_eq!(flash.mem[start..start + PATTERN_LEN], selftest::pattern());
    // the rest of the sector is erased
    assert_eq!(flash.mem[start - 1], 0xFF);
    assert_eq!(flash.mem[start + PATTERN_LEN], 0xFF);
    assert!(!flash.asleep);
}

#[test]
fn selftest_without_memory_mapping() {
    let mut flash = RamFlash::new();
    let mut log = Log::default();
    selftest::run(&mut flash, &RAM_GEOMETRY, &mut log).unwrap();
    assert_eq!(log.0.len(), 16);
    assert!(!log.0.iter().any(|s| s == "memory mapped read"));
    selftest::run(&mut flash, &RAM_GEOMETRY, &mut ()).unwrap();
}

#[test]
fn selftest_catches_a_flash_that_never_sleeps() {
    let mut flash = RamFlash::new();
    flash.ignores_power_down = true;
    let mut log = Log::default();
    let err = selftest::run(&mut flash, &RAM_GEOMETRY, &mut log).unwrap_err();
    assert_eq!(err, SelftestError::NotPoweredDown);
    assert_eq!(err.step(), Step::ReadInDeepPowerDown);
    assert_eq!(log.0.last().unwrap(), "failed: chip still answering");
}

#[test]
fn selftest_reports_the_bad_byte() {
    let mut flash = RamFlash::new();
    flash.stuck = Some(TEST_ADDRESS as usize + 5);
    let err = selftest::run(&mut flash, &RAM_GEOMETRY, &mut ()).unwrap_err();
    assert_eq!(
        err,
        SelftestError::Mismatch {
            step: Step::Read,
            offset: 5
        }
    );
}

#[test]
fn selftest_reports_flash_errors() {
    let mut flash = RamFlash::new();
    flash.asleep = true;
    let err = selftest::run(&mut flash, &RAM_GEOMETRY, &mut ()).unwrap_err();
    assert_eq!(
        err,
        SelftestError::Flash {
            step: Step::Erase,
            error: RamError::Asleep
        }
    );
}

#[test]
fn selftest_checks_the_geometry_first() {
    let mut flash = RamFlash::new();
    let mut log = Log::default();
    // a 64KiB part on a board expecting the 512Mbit one
    let err = selftest::run(&mut flash, &GEOMETRY, &mut log).unwrap_err();
    assert_eq!(err, SelftestError::Geometry(RAM_GEOMETRY));
    assert_eq!(err.step(), Step::Geometry);
    assert_eq!(log.0, ["geometry", "failed: unexpected geometry"]);
    // nothing was erased
    assert!(flash.mem.iter().all(|&b| b == 0x00));
}
