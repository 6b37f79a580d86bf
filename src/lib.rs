#![no_std]

#[macro_use]
mod fmt;

use embedded_hal::{
    delay::DelayNs,
    digital::{ErrorType, InputPin, OutputPin},
};
use registers::Register;

pub use self::commands::Command;
pub use self::interface::{Interface, SpiInterface, FIFO_SIZE};
pub use self::radio::RadioError;
pub use self::status::{State, Status};

pub mod aes;
pub mod calibration;
pub mod commands;
pub mod csma;
pub mod fifo;
pub mod gpio;
pub mod interface;
pub mod irq;
pub mod nor;
pub mod packet;
pub mod qi;
pub mod radio;
pub mod registers;
pub mod spsgrf;
pub mod status;
pub mod timer;

/// `DEVICE_INFO1` of every SPIRIT1
pub const PART_NUMBER: u8 = 0x01;

/// Number of status reads before giving up on a state transition
pub const STATE_POLL_LIMIT: u32 = 1000;
/// Number of `IRQ_STATUS` reads before giving up on an interrupt
pub const IRQ_POLL_LIMIT: u32 = 10_000;

#[derive(Debug, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<I, S, P> {
    /// SPI bus error
    Interface(I),
    /// Error driving the shutdown pin
    Sdn(S),
    /// Error reading the interrupt pin
    Irq(P),
    /// A radio parameter can't be represented
    Radio(RadioError),
    /// More data than fits in the linear FIFO
    PayloadTooLong,
    /// The synthesizer didn't lock while calibrating the VCO
    VcoLockFailed,
    /// The chip didn't reach the requested state, holds the last one seen
    StateTimeout(State),
    /// None of the awaited interrupts showed up in the status register
    IrqTimeout,
    /// `DEVICE_INFO` doesn't match a SPIRIT1
    UnexpectedDevice { part: u8, version: u8 },
}

impl<I, S, P> From<RadioError> for Error<I, S, P> {
    fn from(e: RadioError) -> Self {
        Error::Radio(e)
    }
}

pub type Result<T, I, S, P> = core::result::Result<
    T,
    Error<<I as Interface>::Error, <S as ErrorType>::Error, <P as ErrorType>::Error>,
>;

/// Last workaround applied by [`Spirit1::command`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) enum CommState {
    Idle,
    Tx,
    Rx,
}

pub struct Spirit1<I: Interface, S: OutputPin, P: InputPin> {
    dev: I,
    sdn: S,
    irq: P,
    xtal: u32,
    status: Status,
    comm_state: CommState,
    /// Carrier requested by the last radio configuration, drives the TX workaround
    desired_frequency: u32,
    /// Run the VCO calibration workaround whenever the base frequency changes
    vco_workaround: bool,
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Run a function with access to the interface
    pub fn with_interface<T>(&mut self, f: impl FnOnce(&mut I) -> T) -> T {
        f(&mut self.dev)
    }

    /// Gives back the interface and the pins
    pub fn release(self) -> (I, S, P) {
        (self.dev, self.sdn, self.irq)
    }

    /// Takes ownership of the interface and pins, power cycles and resets the chip
    ///
    /// `xtal` is the frequency of the crystal (or external reference) in Hz.
    pub fn init(dev: I, sdn: S, irq: P, xtal: u32, delay: &mut impl DelayNs) -> Result<Self, I, S, P> {
        let mut drv = Self {
            dev,
            sdn,
            irq,
            xtal,
            status: Status::default(),
            comm_state: CommState::Idle,
            desired_frequency: 0,
            vco_workaround: true,
        };
        drv.shutdown()?;
        delay.delay_ms(1);
        drv.wake()?;
        delay.delay_ms(2);

        drv.command(Command::SoftReset)?;
        delay.delay_ms(2);
        drv.wait_for_state(State::Ready)?;

        let info = drv.read::<registers::DeviceInfo>()?;
        info!(
            "SPIRIT1 part {=u8:#04X}, version {=u8:#04X}",
            info.part_number(),
            info.version()
        );
        if info.part_number() != PART_NUMBER {
            return Err(Error::UnexpectedDevice {
                part: info.part_number(),
                version: info.version(),
            });
        }

        drv.extra_current_workaround()?;
        Ok(drv)
    }

    /// Drives SDN high, the chip loses its configuration
    pub fn shutdown(&mut self) -> Result<(), I, S, P> {
        debug!("Entering shutdown");
        self.sdn.set_high().map_err(Error::Sdn)
    }

    /// Drives SDN low, the chip boots into READY
    pub fn wake(&mut self) -> Result<(), I, S, P> {
        debug!("Leaving shutdown");
        self.sdn.set_low().map_err(Error::Sdn)
    }

    /// Crystal frequency in Hz
    pub fn xtal(&self) -> u32 {
        self.xtal
    }

    /// Status word seen on the last command or refresh
    pub fn status(&self) -> Status {
        self.status
    }

    /// Reads `MC_STATE` into the cached status word
    pub fn refresh_status(&mut self) -> Result<Status, I, S, P> {
        self.status = self.read::<registers::McState>()?.status();
        Ok(self.status)
    }

    /// Sends a command strobe, applying the power management workarounds for TX and RX
    pub fn command(&mut self, cmd: Command) -> Result<Status, I, S, P> {
        match cmd {
            Command::Tx if self.status.state() != State::Tx => self.tx_workaround()?,
            Command::Rx if self.status.state() != State::Rx => self.rx_workaround()?,
            _ => {}
        }
        self.status = self.dev.command(cmd).map_err(Error::Interface)?;
        Ok(self.status)
    }

    /// Polls the state until it matches
    pub fn wait_for_state(&mut self, state: State) -> Result<(), I, S, P> {
        for _ in 0..STATE_POLL_LIMIT {
            if self.refresh_status()?.state() == state {
                debug!("Reached state {}", state);
                return Ok(());
            }
        }
        warn!("Timed out waiting for {}, stuck in {}", state, self.status.state());
        Err(Error::StateTimeout(self.status.state()))
    }

    pub fn part_number(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::DeviceInfo>()?.part_number())
    }

    pub fn version(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::DeviceInfo>()?.version())
    }

    /// Enables or disables the VCO calibration run after every base frequency change
    pub fn set_vco_calibration_workaround(&mut self, enabled: bool) {
        self.vco_workaround = enabled;
    }

    /// Use the XIN pin as reference clock input instead of a crystal
    pub fn set_external_reference(&mut self, external: bool) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| r.set_ext_ref(external))
    }

    pub fn external_reference(&mut self) -> Result<bool, I, S, P> {
        Ok(self.read::<registers::AnaFuncConf>()?.ext_ref())
    }

    pub fn set_battery_level_detector(
        &mut self,
        level: Option<registers::ana_func_conf::BatteryLevel>,
    ) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| {
            r.set_battery_level_detector(level.is_some());
            if let Some(level) = level {
                r.set_battery_level(level);
            }
        })
    }

    pub fn set_brown_out_detector(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| r.set_brown_out_detector(enabled))
    }

    pub fn set_high_power_mode(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| r.set_high_power_mode(enabled))
    }

    /// Tells the digital blocks whether they run from a 26MHz (instead of 24MHz) clock
    pub fn set_xtal_flag(&mut self, is_26mhz: bool) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| r.set_xtal_26mhz(is_26mhz))
    }

    /// Digital clock divider, halves the crystal frequency for the digital blocks
    pub fn set_digital_divider(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::XoRcoTest>(|r| r.set_pd_clkdiv(!enabled))
    }

    pub fn digital_divider(&mut self) -> Result<bool, I, S, P> {
        Ok(!self.read::<registers::XoRcoTest>()?.pd_clkdiv())
    }

    /// Synthesizer reference divider
    pub fn set_reference_divider(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::SynthConfig1>(|r| r.set_refdiv(enabled))
    }

    pub fn reference_divider(&mut self) -> Result<bool, I, S, P> {
        Ok(self.read::<registers::SynthConfig1>()?.refdiv())
    }

    /// Frequency of the digital clock in Hz
    pub fn digital_clock(&mut self) -> Result<u32, I, S, P> {
        let divider = self.digital_divider()?;
        Ok(radio::calc::digital_clock(self.xtal, divider))
    }

    fn extra_current_workaround(&mut self) -> Result<(), I, S, P> {
        use registers::addr;
        self.write_raw(addr::PM_TEST, &[0xCA])?;
        self.write_raw(addr::TEST_SELECT, &[0x04])?;
        // the read is part of the unlock sequence
        let mut tmp = [0];
        self.read_raw(addr::TEST_SELECT, &mut tmp)?;
        self.write_raw(addr::TEST_SELECT, &[0x00])?;
        Ok(())
    }

    fn tx_workaround(&mut self) -> Result<(), I, S, P> {
        use registers::{addr, pa_power::LoadCapacitor};
        if self.comm_state == CommState::Tx {
            return Ok(());
        }
        let cwc = if (150_000_000..=470_000_000).contains(&self.desired_frequency) {
            LoadCapacitor::Pf3_6
        } else {
            LoadCapacitor::Pf0
        };
        self.set_pa_load_capacitor(cwc)?;
        // VCO_L buffer on
        self.write_raw(addr::VCO_L_BUFFER, &[0x11])?;
        // SMPS switching frequency for TX
        self.write_raw(addr::PM_CONFIG1, &[0x20])?;
        self.comm_state = CommState::Tx;
        Ok(())
    }

    fn rx_workaround(&mut self) -> Result<(), I, S, P> {
        use registers::{addr, pa_power::LoadCapacitor};
        if self.comm_state == CommState::Rx {
            return Ok(());
        }
        self.write_raw(addr::PM_CONFIG1, &[0x98])?;
        self.set_pa_load_capacitor(LoadCapacitor::Pf0)?;
        self.comm_state = CommState::Rx;
        Ok(())
    }

    pub(crate) fn read<R: Register>(&mut self) -> Result<R, I, S, P> {
        R::read(&mut self.dev).map_err(Error::Interface)
    }

    pub(crate) fn write<R: Register>(&mut self, reg: R) -> Result<(), I, S, P> {
        reg.write(&mut self.dev).map_err(Error::Interface)?;
        Ok(())
    }

    pub(crate) fn modify<R: Register>(&mut self, f: impl FnMut(&mut R)) -> Result<(), I, S, P> {
        R::modify(&mut self.dev, f).map_err(Error::Interface)
    }

    pub(crate) fn write_raw(&mut self, addr: u8, buf: &[u8]) -> Result<(), I, S, P> {
        self.dev.register_write(addr, buf).map_err(Error::Interface)?;
        Ok(())
    }

    pub(crate) fn read_raw(&mut self, addr: u8, buf: &mut [u8]) -> Result<(), I, S, P> {
        self.dev.register_read(addr, buf).map_err(Error::Interface)?;
        Ok(())
    }
}
