use crate::{commands::Command, status::Status};
use embedded_hal::spi::{Operation, SpiDevice};

/// Depth of each linear FIFO
pub const FIFO_SIZE: usize = 96;
/// Register address mapped to the linear FIFOs
pub const FIFO_ADDRESS: u8 = 0xFF;

pub trait Interface {
    type Error;
    /// Write one or more consecutive registers
    fn register_write(&mut self, addr: u8, buf: &[u8]) -> Result<Status, Self::Error>;
    /// Read one or more consecutive registers
    fn register_read(&mut self, addr: u8, buf: &mut [u8]) -> Result<Status, Self::Error>;
    /// Load the TX FIFO
    fn fifo_write(&mut self, buf: &[u8]) -> Result<Status, Self::Error>;
    /// Drain the RX FIFO
    fn fifo_read(&mut self, buf: &mut [u8]) -> Result<Status, Self::Error>;
    fn command(&mut self, cmd: Command) -> Result<Status, Self::Error>;
}

pub mod headers {
    /// Followed by the first register address, then the data
    pub const WRITE: u8 = 0x00;
    /// Followed by the first register address, then dummy bytes
    pub const READ: u8 = 0x01;
    /// Followed by the command code
    pub const COMMAND: u8 = 0x80;
}

pub struct SpiInterface<S: SpiDevice> {
    dev: S,
}

impl<S: SpiDevice> SpiInterface<S> {
    pub fn new(dev: S) -> Self {
        Self { dev }
    }

    /// Gives back the SPI device
    pub fn release(self) -> S {
        self.dev
    }

    fn write_frame(&mut self, header: u8, addr: u8, buf: &[u8]) -> Result<Status, S::Error> {
        let mut status = [0u8; 2];
        self.dev.transaction(&mut [
            Operation::Transfer(&mut status, &[header, addr]),
            Operation::Write(buf),
        ])?;
        Ok(Status::from_be_bytes(status))
    }

    fn read_frame(&mut self, header: u8, addr: u8, buf: &mut [u8]) -> Result<Status, S::Error> {
        let mut status = [0u8; 2];
        self.dev.transaction(&mut [
            Operation::Transfer(&mut status, &[header, addr]),
            Operation::Read(buf),
        ])?;
        Ok(Status::from_be_bytes(status))
    }
}

impl<S: SpiDevice> Interface for SpiInterface<S> {
    type Error = S::Error;

    fn register_write(&mut self, addr: u8, buf: &[u8]) -> Result<Status, Self::Error> {
        trace!("Register {=u8:#04X}, write {=[u8]:#04X}", addr, buf);
        self.write_frame(headers::WRITE, addr, buf)
    }

    fn register_read(&mut self, addr: u8, buf: &mut [u8]) -> Result<Status, Self::Error> {
        let status = self.read_frame(headers::READ, addr, buf)?;
        trace!("Register {=u8:#04X}, read {=[u8]:#04X}", addr, buf);
        Ok(status)
    }

    fn fifo_write(&mut self, buf: &[u8]) -> Result<Status, Self::Error> {
        debug_assert!(buf.len() <= FIFO_SIZE);
        trace!("FIFO write, {=usize} bytes", buf.len());
        self.write_frame(headers::WRITE, FIFO_ADDRESS, buf)
    }

    fn fifo_read(&mut self, buf: &mut [u8]) -> Result<Status, Self::Error> {
        trace!("FIFO read, {=usize} bytes", buf.len());
        self.read_frame(headers::READ, FIFO_ADDRESS, buf)
    }

    fn command(&mut self, cmd: Command) -> Result<Status, Self::Error> {
        trace!("Command {} ({=u8:#04X})", cmd, cmd as u8);
        let mut status = [0u8; 2];
        self.dev.transfer(&mut status, &[headers::COMMAND, cmd as u8])?;
        Ok(Status::from_be_bytes(status))
    }
}
