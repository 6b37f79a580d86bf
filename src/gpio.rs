use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    registers::{self, addr, gpio_conf::GpioMode},
    Interface, Result, Spirit1,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Gpio {
    Gpio0,
    Gpio1,
    Gpio2,
    Gpio3,
}

impl Gpio {
    /// `GPIOx_CONF` registers are laid out from GPIO3 down to GPIO0
    pub const fn address(&self) -> u8 {
        addr::GPIO3_CONF + 3 - *self as u8
    }
}

/// Signals that can be routed to a GPIO configured as output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GpioOutput {
    /// Interrupt request, active low
    Irq = 0,
    PorInverted = 1,
    WakeUpTimerExpired = 2,
    LowBattery = 3,
    TxDataClock = 4,
    TxState = 5,
    TxFifoAlmostEmpty = 6,
    TxFifoAlmostFull = 7,
    RxData = 8,
    RxClock = 9,
    RxState = 10,
    RxFifoAlmostFull = 11,
    RxFifoAlmostEmpty = 12,
    Antenna = 13,
    ValidPreamble = 14,
    SyncDetected = 15,
    RssiAboveThreshold = 16,
    McuClock = 17,
    TxRxMode = 18,
    Vdd = 19,
    Gnd = 20,
    ExternalSmps = 21,
    Sleep = 22,
    Ready = 23,
    Lock = 24,
    WaitForLock = 25,
    WaitForLockTimer = 26,
    WaitForReady2 = 27,
    WaitForPmTimer = 28,
    WaitForVcoCalibration = 29,
    SynthFullCircuit = 30,
    WaitForRcoCalibration = 31,
}

/// Functions of a GPIO configured as input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum GpioInput {
    TxCommand = 0,
    RxCommand = 1,
    /// Data for direct modulation
    TxData = 2,
    WakeUp = 3,
    /// 34.7kHz clock for the low duty cycle timer
    ExternalClock = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GpioConfig {
    Analog,
    Input(GpioInput),
    Output {
        signal: GpioOutput,
        high_power: bool,
    },
}

impl GpioConfig {
    pub const IRQ: GpioConfig = GpioConfig::Output {
        signal: GpioOutput::Irq,
        high_power: false,
    };

    fn register(&self) -> registers::GpioConf {
        let (mode, select) = match *self {
            GpioConfig::Analog => (GpioMode::Analog, 0),
            GpioConfig::Input(f) => (GpioMode::DigitalInput, f as u8),
            GpioConfig::Output { signal, high_power } => (
                if high_power {
                    GpioMode::OutputHighPower
                } else {
                    GpioMode::OutputLowPower
                },
                signal as u8,
            ),
        };
        registers::GpioConf::new(mode, u5::new(select))
    }
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    pub fn configure_gpio(&mut self, gpio: Gpio, config: GpioConfig) -> Result<(), I, S, P> {
        debug!("{} set to {}", gpio, config);
        self.write_raw(gpio.address(), &[u8::from(config.register())])
    }

    /// Clock output for the host MCU, `None` turns it off
    pub fn set_mcu_clock(&mut self, clock: Option<registers::McuClockConf>) -> Result<(), I, S, P> {
        match clock {
            Some(mut conf) => {
                conf.set_enable(true);
                self.write(conf)
            }
            None => self.modify::<registers::McuClockConf>(|r| r.set_enable(false)),
        }
    }

    /// Routes the temperature sensor to GPIO0
    pub fn set_temperature_sensor(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| r.set_ts(enabled))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gpio_addresses() {
        assert_eq!(Gpio::Gpio3.address(), 0x02);
        assert_eq!(Gpio::Gpio0.address(), 0x05);
    }

    #[test]
    fn gpio_words() {
        assert_eq!(u8::from(GpioConfig::IRQ.register()), 0x02);
        let rx_state = GpioConfig::Output {
            signal: GpioOutput::RxState,
            high_power: true,
        };
        assert_eq!(u8::from(rx_state.register()), 0x53);
        let rx_almost_full = GpioConfig::Output {
            signal: GpioOutput::RxFifoAlmostFull,
            high_power: false,
        };
        assert_eq!(u8::from(rx_almost_full.register()), 0x5A);
        let tx_almost_empty = GpioConfig::Output {
            signal: GpioOutput::TxFifoAlmostEmpty,
            high_power: true,
        };
        assert_eq!(u8::from(tx_almost_empty.register()), 0x33);
        assert_eq!(
            u8::from(GpioConfig::Input(GpioInput::RxCommand).register()),
            0x09
        );
    }
}
