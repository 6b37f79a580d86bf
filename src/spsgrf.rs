//! SPSGRF-915 module: a SPIRIT1 with a 50MHz crystal and the IRQ line on GPIO3
//!
//! Brings the chip up with a working packet link configuration and offers a
//! minimal send/receive API on top of [`Spirit1`].

use bilge::prelude::*;
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use fugit::MicrosDurationU32;
use heapless::Vec;

use crate::{
    gpio::{Gpio, GpioConfig},
    packet::{AddressConfig, PacketBasicConfig},
    radio::RadioConfig,
    registers::Irq,
    timer::RxTimeoutStop,
    Command, Interface, Result, Spirit1, State, FIFO_SIZE,
};

/// Crystal mounted on the module
pub const XTAL_FREQUENCY: u32 = 50_000_000;

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SpsgrfConfig {
    pub xtal: u32,
    pub radio: RadioConfig,
    /// Output power, programmed in PA slot 0
    pub power_dbm: f32,
    pub packet: PacketBasicConfig,
    pub addresses: AddressConfig,
    /// Pin carrying the interrupt request to the MCU
    pub irq_gpio: Gpio,
    pub rx_timeout: MicrosDurationU32,
    pub rx_timeout_stop: RxTimeoutStop,
    /// Sync word bit errors tolerated, at most 3
    pub sqi_threshold: u8,
    pub rssi_threshold_dbm: i16,
}

impl Default for SpsgrfConfig {
    fn default() -> Self {
        Self {
            xtal: XTAL_FREQUENCY,
            radio: RadioConfig::default(),
            power_dbm: 11.6,
            packet: PacketBasicConfig::default(),
            addresses: AddressConfig::default(),
            irq_gpio: Gpio::Gpio3,
            rx_timeout: MicrosDurationU32::millis(700),
            rx_timeout_stop: RxTimeoutStop::SQI,
            sqi_threshold: 0,
            rssi_threshold_dbm: -120,
        }
    }
}

/// Outcome of a transmission or reception, decoded from the IRQ status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    TxDone,
    /// A packet is waiting in the RX FIFO
    PacketReceived,
    /// Dropped by the address or CRC filters
    PacketDiscarded,
    RxTimeout,
}

impl Event {
    /// Interrupts routed to the IRQ pin
    pub fn irqs() -> Irq {
        let mut irq = Irq::default();
        irq.set_tx_data_sent(true);
        irq.set_rx_data_ready(true);
        irq.set_rx_data_discarded(true);
        irq.set_rx_timeout(true);
        irq
    }

    pub fn from_irq(irq: Irq) -> Option<Self> {
        if irq.tx_data_sent() {
            Some(Event::TxDone)
        } else if irq.rx_data_ready() {
            Some(Event::PacketReceived)
        } else if irq.rx_data_discarded() {
            Some(Event::PacketDiscarded)
        } else if irq.rx_timeout() {
            Some(Event::RxTimeout)
        } else {
            None
        }
    }
}

pub struct Spsgrf<I: Interface, S: OutputPin, P: InputPin> {
    radio: Spirit1<I, S, P>,
}

impl<I: Interface, S: OutputPin, P: InputPin> Spsgrf<I, S, P> {
    /// Resets the chip and applies `config`, leaving it in READY with the event IRQs enabled
    pub fn new(
        dev: I,
        sdn: S,
        irq: P,
        delay: &mut impl DelayNs,
        config: &SpsgrfConfig,
    ) -> Result<Self, I, S, P> {
        let mut radio = Spirit1::init(dev, sdn, irq, config.xtal, delay)?;

        radio.radio_init(&config.radio)?;
        radio.set_pa_level_dbm(u3::new(0), config.power_dbm)?;
        radio.set_pa_max_index(u3::new(0))?;

        radio.packet_basic_init(&config.packet)?;
        radio.packet_addresses_init(&config.addresses)?;

        radio.configure_gpio(config.irq_gpio, GpioConfig::IRQ)?;
        radio.set_irq_mask(Event::irqs())?;
        radio.clear_irqs()?;

        radio.set_sqi_threshold(u2::new(config.sqi_threshold.min(3)))?;
        radio.set_sqi_check(true)?;
        radio.set_rssi_threshold_dbm(config.rssi_threshold_dbm)?;

        radio.set_rx_timeout_stop_condition(config.rx_timeout_stop)?;
        radio.set_rx_timeout(config.rx_timeout)?;

        info!("SPSGRF ready");
        Ok(Self { radio })
    }

    /// Access to the whole register API
    pub fn radio(&mut self) -> &mut Spirit1<I, S, P> {
        &mut self.radio
    }

    pub fn release(self) -> (I, S, P) {
        self.radio.release()
    }

    /// Brings the chip back to READY from wherever it is
    pub fn abort(&mut self) -> Result<(), I, S, P> {
        match self.radio.refresh_status()?.state() {
            State::Ready => return Ok(()),
            State::Tx | State::Rx | State::Lock => self.radio.command(Command::Sabort)?,
            _ => self.radio.command(Command::Ready)?,
        };
        self.radio.wait_for_state(State::Ready)
    }

    /// Sends `data` to `destination`, at most [`FIFO_SIZE`] bytes are sent
    ///
    /// Completion is signalled by [`Event::TxDone`].
    pub fn start_tx(&mut self, destination: u8, data: &[u8]) -> Result<(), I, S, P> {
        let data = &data[..data.len().min(FIFO_SIZE)];
        self.abort()?;
        self.radio.set_destination_address(destination)?;
        self.radio.flush_tx_fifo()?;
        self.radio.set_payload_length(data.len() as u16)?;
        self.radio.clear_irqs()?;
        self.radio.write_fifo(data)?;
        debug!("Sending {=usize} bytes to {=u8:#04X}", data.len(), destination);
        self.radio.command(Command::Tx)?;
        Ok(())
    }

    /// Starts listening, ends with a packet or the RX timeout
    pub fn start_rx(&mut self) -> Result<(), I, S, P> {
        self.abort()?;
        self.radio.flush_rx_fifo()?;
        self.radio.clear_irqs()?;
        self.radio.command(Command::Rx)?;
        Ok(())
    }

    /// Drains the RX FIFO
    pub fn rx_data(&mut self) -> Result<Vec<u8, FIFO_SIZE>, I, S, P> {
        let len = (self.radio.rx_fifo_len()? as usize).min(FIFO_SIZE);
        let mut buf = [0; FIFO_SIZE];
        self.radio.read_fifo(&mut buf[..len])?;
        self.radio.flush_rx_fifo()?;
        trace!("Read {=usize} bytes from the RX FIFO", len);
        Ok(buf.iter().take(len).copied().collect())
    }

    /// Reads and clears the IRQ status, without looking at the pin
    pub fn poll_event(&mut self) -> Result<Option<Event>, I, S, P> {
        let irq = self.radio.read_irqs()?;
        Ok(Event::from_irq(irq))
    }

    /// Blocks on the IRQ pin until an event fires
    pub fn wait_event(&mut self) -> Result<Event, I, S, P> {
        loop {
            let irq = self.radio.wait_for_irq(Event::irqs())?;
            if let Some(event) = Event::from_irq(irq) {
                return Ok(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_priority() {
        let mut irq = Irq::default();
        assert_eq!(Event::from_irq(irq), None);
        irq.set_rx_timeout(true);
        assert_eq!(Event::from_irq(irq), Some(Event::RxTimeout));
        irq.set_rx_data_ready(true);
        assert_eq!(Event::from_irq(irq), Some(Event::PacketReceived));
        irq.set_valid_sync(true);
        assert_eq!(Event::from_irq(irq), Some(Event::PacketReceived));
    }

    #[test]
    fn event_mask() {
        assert_eq!(u32::from(Event::irqs()), 0x2000_0007);
    }
}
