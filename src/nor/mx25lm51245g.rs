//! MX25LM51245G, 512Mbit octal NOR flash, driven in single line SPI mode
//!
//! Only the 4-byte address command set is used, so the whole array is
//! reachable without touching the address mode.

use embedded_hal::{
    delay::DelayNs,
    spi::{Operation, SpiDevice},
};
use fugit::MicrosDurationU32;

use super::{check_bounds, DeepPowerDown, EraseSize, FlashStatus, Geometry, NorError, NorFlash};

pub mod opcodes {
    pub const WRITE_ENABLE: u8 = 0x06;
    pub const READ_STATUS: u8 = 0x05;
    pub const READ_ID: u8 = 0x9F;
    /// 4KiB sector erase, 4-byte address
    pub const SECTOR_ERASE_4B: u8 = 0x21;
    /// 64KiB block erase, 4-byte address
    pub const BLOCK_ERASE_4B: u8 = 0xDC;
    pub const PAGE_PROGRAM_4B: u8 = 0x12;
    pub const READ_4B: u8 = 0x13;
    pub const DEEP_POWER_DOWN: u8 = 0xB9;
    pub const RELEASE_DEEP_POWER_DOWN: u8 = 0xAB;
}

/// Manufacturer (Macronix), memory type, density
pub const JEDEC_ID: [u8; 3] = [0xC2, 0x85, 0x3A];
pub const PAGE_SIZE: usize = 256;
pub const GEOMETRY: Geometry = Geometry {
    capacity: 64 * 1024 * 1024,
    page_size: PAGE_SIZE as u32,
    sector_size: 4096,
    block_size: 65536,
};

/// Deep power down entry, tDP
const DEEP_POWER_DOWN_ENTRY: MicrosDurationU32 = MicrosDurationU32::micros(10);
/// Deep power down release, tRES1
const DEEP_POWER_DOWN_RELEASE: MicrosDurationU32 = MicrosDurationU32::micros(30);
const POLL_INTERVAL: MicrosDurationU32 = MicrosDurationU32::micros(100);
/// Worst case 64KiB block erase is 2s
const ERASE_TIMEOUT: MicrosDurationU32 = MicrosDurationU32::millis(2500);
/// Worst case page program is 1.5ms
const PROGRAM_TIMEOUT: MicrosDurationU32 = MicrosDurationU32::millis(5);
const WEL_POLL_LIMIT: u32 = 16;

pub struct Mx25lm51245g<S: SpiDevice, D: DelayNs> {
    spi: S,
    delay: D,
}

impl<S: SpiDevice, D: DelayNs> Mx25lm51245g<S, D> {
    /// Takes ownership of the bus and checks the JEDEC ID
    pub fn new(spi: S, delay: D) -> Result<Self, NorError<S::Error>> {
        let mut flash = Self { spi, delay };
        let id = flash.read_id()?;
        info!("NOR flash ID {=[u8]:#04X}", &id[..]);
        if id != JEDEC_ID {
            return Err(NorError::UnexpectedId(id));
        }
        Ok(flash)
    }

    pub fn release(self) -> (S, D) {
        (self.spi, self.delay)
    }

    pub fn read_id(&mut self) -> Result<[u8; 3], NorError<S::Error>> {
        let mut id = [0; 3];
        self.spi
            .transaction(&mut [
                Operation::Write(&[opcodes::READ_ID]),
                Operation::Read(&mut id),
            ])
            .map_err(NorError::Bus)?;
        Ok(id)
    }

    fn command(&mut self, opcode: u8) -> Result<(), NorError<S::Error>> {
        trace!("NOR command {=u8:#04X}", opcode);
        self.spi.write(&[opcode]).map_err(NorError::Bus)
    }

    fn address_frame(opcode: u8, address: u32) -> [u8; 5] {
        let [a3, a2, a1, a0] = address.to_be_bytes();
        [opcode, a3, a2, a1, a0]
    }

    /// Sets the write enable latch and checks it took
    fn write_enable(&mut self) -> Result<(), NorError<S::Error>> {
        self.command(opcodes::WRITE_ENABLE)?;
        for _ in 0..WEL_POLL_LIMIT {
            if self.status()?.wel() {
                return Ok(());
            }
        }
        warn!("Write enable latch stuck low");
        Err(NorError::WriteProtected)
    }

    /// Polls the status register until the write in progress bit clears
    fn wait_ready(&mut self, timeout: MicrosDurationU32) -> Result<(), NorError<S::Error>> {
        let polls = timeout.ticks() / POLL_INTERVAL.ticks();
        for _ in 0..=polls {
            if !self.status()?.wip() {
                return Ok(());
            }
            self.delay.delay_us(POLL_INTERVAL.ticks());
        }
        warn!("NOR flash still busy after {=u32} us", timeout.ticks());
        Err(NorError::Timeout)
    }

    fn program_page(&mut self, address: u32, data: &[u8]) -> Result<(), NorError<S::Error>> {
        self.write_enable()?;
        let header = Self::address_frame(opcodes::PAGE_PROGRAM_4B, address);
        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Write(data)])
            .map_err(NorError::Bus)?;
        self.wait_ready(PROGRAM_TIMEOUT)
    }
}

impl<S: SpiDevice, D: DelayNs> NorFlash for Mx25lm51245g<S, D> {
    type Error = NorError<S::Error>;

    const CAPACITY: u32 = GEOMETRY.capacity;
    const PAGE_SIZE: u32 = GEOMETRY.page_size;

    fn erase_block(&mut self, address: u32, size: EraseSize) -> Result<(), Self::Error> {
        check_bounds(address, 1, Self::CAPACITY)?;
        debug!("Erasing {} at {=u32:#010X}", size, address);
        let opcode = match size {
            EraseSize::Sector4K => opcodes::SECTOR_ERASE_4B,
            EraseSize::Block64K => opcodes::BLOCK_ERASE_4B,
        };
        self.write_enable()?;
        self.spi
            .write(&Self::address_frame(opcode, address))
            .map_err(NorError::Bus)?;
        self.wait_ready(ERASE_TIMEOUT)
    }

    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error> {
        check_bounds(address, data.len(), Self::CAPACITY)?;
        let mut address = address;
        let mut data = data;
        while !data.is_empty() {
            let room = PAGE_SIZE - address as usize % PAGE_SIZE;
            let (chunk, rest) = data.split_at(room.min(data.len()));
            self.program_page(address, chunk)?;
            address += chunk.len() as u32;
            data = rest;
        }
        Ok(())
    }

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Self::Error> {
        check_bounds(address, buf.len(), Self::CAPACITY)?;
        let header = Self::address_frame(opcodes::READ_4B, address);
        self.spi
            .transaction(&mut [Operation::Write(&header), Operation::Read(buf)])
            .map_err(NorError::Bus)
    }

    fn status(&mut self) -> Result<FlashStatus, Self::Error> {
        let mut sr = [0];
        self.spi
            .transaction(&mut [
                Operation::Write(&[opcodes::READ_STATUS]),
                Operation::Read(&mut sr),
            ])
            .map_err(NorError::Bus)?;
        Ok(FlashStatus::from(sr[0]))
    }
}

impl<S: SpiDevice, D: DelayNs> DeepPowerDown for Mx25lm51245g<S, D> {
    fn enter_deep_power_down(&mut self) -> Result<(), Self::Error> {
        self.command(opcodes::DEEP_POWER_DOWN)?;
        self.delay.delay_us(DEEP_POWER_DOWN_ENTRY.ticks());
        Ok(())
    }

    fn leave_deep_power_down(&mut self) -> Result<(), Self::Error> {
        self.command(opcodes::RELEASE_DEEP_POWER_DOWN)?;
        self.delay.delay_us(DEEP_POWER_DOWN_RELEASE.ticks());
        Ok(())
    }
}
