//! NOR flash access, with a driver for the Macronix MX25LM51245G
//!
//! The traits cover what the board self-test needs, so it can run against
//! any part or a RAM-backed stand-in.

use bilge::prelude::*;

pub mod mx25lm51245g;
pub mod selftest;

pub use self::mx25lm51245g::Mx25lm51245g;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NorError<E> {
    /// SPI bus error
    Bus(E),
    /// The chip stayed busy past the operation timeout
    Timeout,
    /// The write enable latch didn't set
    WriteProtected,
    /// `RDID` returned another manufacturer or device
    UnexpectedId([u8; 3]),
    /// The access runs past the end of the array
    OutOfBounds,
}

/// Erase granularity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EraseSize {
    Sector4K,
    Block64K,
}

impl EraseSize {
    pub const fn bytes(&self) -> u32 {
        match self {
            EraseSize::Sector4K => 4096,
            EraseSize::Block64K => 65536,
        }
    }
}

/// Status register
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FlashStatus {
    /// Write in progress
    pub wip: bool,
    /// Write enable latch
    pub wel: bool,
    pub block_protect: u4,
    reserved: u1,
    /// Status register write disable
    pub srwd: bool,
}

/// Array layout as seen by the driver
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Geometry {
    pub capacity: u32,
    pub page_size: u32,
    pub sector_size: u32,
    pub block_size: u32,
}

pub trait NorFlash {
    type Error;

    /// Size of the array in bytes
    const CAPACITY: u32;
    /// Program granularity, writes never cross a page boundary
    const PAGE_SIZE: u32;

    fn geometry(&self) -> Geometry {
        Geometry {
            capacity: Self::CAPACITY,
            page_size: Self::PAGE_SIZE,
            sector_size: EraseSize::Sector4K.bytes(),
            block_size: EraseSize::Block64K.bytes(),
        }
    }

    /// Erases the block of `size` containing `address`
    fn erase_block(&mut self, address: u32, size: EraseSize) -> Result<(), Self::Error>;

    /// Programs erased memory, splitting on page boundaries as needed
    fn write(&mut self, address: u32, data: &[u8]) -> Result<(), Self::Error>;

    fn read(&mut self, address: u32, buf: &mut [u8]) -> Result<(), Self::Error>;

    fn status(&mut self) -> Result<FlashStatus, Self::Error>;
}

pub trait DeepPowerDown: NorFlash {
    /// Enters the lowest power state, the chip ignores everything but the release command
    fn enter_deep_power_down(&mut self) -> Result<(), Self::Error>;

    fn leave_deep_power_down(&mut self) -> Result<(), Self::Error>;
}

/// Flash mapped in the MCU address space, needs an octo-SPI controller
pub trait MemoryMapped: NorFlash {
    fn memory_mapped(&mut self) -> Result<&[u8], Self::Error>;
}

/// Checks that `len` bytes at `address` fit in a flash of `capacity` bytes
pub(crate) fn check_bounds<E>(address: u32, len: usize, capacity: u32) -> Result<(), NorError<E>> {
    let end = address as u64 + len as u64;
    if end > capacity as u64 {
        Err(NorError::OutOfBounds)
    } else {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_bits() {
        let status = FlashStatus::from(0x83_u8);
        assert!(status.wip());
        assert!(status.wel());
        assert!(status.srwd());
        assert_eq!(status.block_protect().value(), 0);
    }

    #[test]
    fn bounds() {
        assert_eq!(check_bounds::<()>(0, 4096, 4096), Ok(()));
        assert_eq!(check_bounds::<()>(1, 4096, 4096), Err(NorError::OutOfBounds));
        assert_eq!(check_bounds::<()>(u32::MAX, 2, u32::MAX), Err(NorError::OutOfBounds));
    }
}
