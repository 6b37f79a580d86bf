use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{registers, Command, Error, Interface, Result, Spirit1, FIFO_SIZE};

/// Almost full/empty thresholds of the linear FIFOs, in bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FifoThresholds {
    pub rx_almost_full: u7,
    pub rx_almost_empty: u7,
    pub tx_almost_full: u7,
    pub tx_almost_empty: u7,
}

impl From<FifoThresholds> for registers::FifoConfig {
    fn from(t: FifoThresholds) -> Self {
        Self::new(
            t.tx_almost_empty,
            t.tx_almost_full,
            t.rx_almost_empty,
            t.rx_almost_full,
        )
    }
}

impl From<registers::FifoConfig> for FifoThresholds {
    fn from(r: registers::FifoConfig) -> Self {
        Self {
            rx_almost_full: r.rx_almost_full(),
            rx_almost_empty: r.rx_almost_empty(),
            tx_almost_full: r.tx_almost_full(),
            tx_almost_empty: r.tx_almost_empty(),
        }
    }
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Bytes waiting in the RX FIFO
    pub fn rx_fifo_len(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::LinearFifoStatus>()?.rx_elements().value())
    }

    /// Bytes waiting in the TX FIFO
    pub fn tx_fifo_len(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::LinearFifoStatus>()?.tx_elements().value())
    }

    pub fn set_fifo_thresholds(&mut self, thresholds: FifoThresholds) -> Result<(), I, S, P> {
        self.write(registers::FifoConfig::from(thresholds))
    }

    pub fn fifo_thresholds(&mut self) -> Result<FifoThresholds, I, S, P> {
        Ok(self.read::<registers::FifoConfig>()?.into())
    }

    /// Loads bytes into the TX FIFO, at most [`FIFO_SIZE`]
    pub fn write_fifo(&mut self, data: &[u8]) -> Result<(), I, S, P> {
        if data.len() > FIFO_SIZE {
            return Err(Error::PayloadTooLong);
        }
        self.status = self.dev.fifo_write(data).map_err(Error::Interface)?;
        Ok(())
    }

    /// Reads `buf.len()` bytes from the RX FIFO
    pub fn read_fifo(&mut self, buf: &mut [u8]) -> Result<(), I, S, P> {
        self.status = self.dev.fifo_read(buf).map_err(Error::Interface)?;
        Ok(())
    }

    pub fn flush_tx_fifo(&mut self) -> Result<(), I, S, P> {
        self.command(Command::FlushTxFifo)?;
        Ok(())
    }

    pub fn flush_rx_fifo(&mut self) -> Result<(), I, S, P> {
        self.command(Command::FlushRxFifo)?;
        Ok(())
    }
}
