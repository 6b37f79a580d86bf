use embedded_hal::digital::{InputPin, OutputPin};
use fugit::MicrosDurationU32;

use crate::{
    registers::{self, addr},
    Command, Interface, Result, Spirit1,
};

/// One RX timeout tick is 1210 digital clock cycles, scaled to microseconds
const RX_TICK: u64 = 1210 * 1_000_000;
/// The wake-up timer runs from the 34.7kHz RC oscillator
const RCO_FREQUENCY: u64 = 34_700;
const WAKEUP_TICK: u64 = 1_000_000;

/// Register values of a prescaler/counter timer pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TimerSetting {
    pub prescaler: u8,
    pub counter: u8,
}

impl TimerSetting {
    /// Longest setting, also used when a request is out of range
    pub const MAX: TimerSetting = TimerSetting {
        prescaler: 255,
        counter: 255,
    };

    /// Finds the prescaler/counter pair closest to `target / tick` timer clock cycles
    ///
    /// Both values are scaled by the same factor so the search stays in integers.
    pub fn compute(target: u64, tick: u64) -> Self {
        let n = target / tick;
        if n / 255 > 253 {
            return Self::MAX;
        }
        // the prescaler can't go below 2
        let prescaler = n / 255 + 2;
        let mut counter = n / prescaler;
        let error = |c: u64| (c * prescaler * tick).abs_diff(target);
        if counter <= 254 && error(counter + 1) < error(counter) {
            counter += 1;
        }
        Self {
            prescaler: (prescaler - 1) as u8,
            counter: counter.saturating_sub(1).max(1) as u8,
        }
    }

    pub fn rx_timeout(duration: MicrosDurationU32, f_dig: u32) -> Self {
        Self::compute(duration.ticks() as u64 * f_dig as u64, RX_TICK)
    }

    pub fn wakeup(duration: MicrosDurationU32) -> Self {
        Self::compute(duration.ticks() as u64 * RCO_FREQUENCY, WAKEUP_TICK)
    }

    fn cycles(&self) -> u64 {
        (self.prescaler as u64 + 1) * self.counter as u64
    }

    pub fn rx_timeout_duration(&self, f_dig: u32) -> MicrosDurationU32 {
        MicrosDurationU32::from_ticks((self.cycles() * RX_TICK / f_dig as u64) as u32)
    }

    pub fn wakeup_duration(&self) -> MicrosDurationU32 {
        MicrosDurationU32::from_ticks((self.cycles() * WAKEUP_TICK / RCO_FREQUENCY) as u32)
    }
}

/// Conditions that stop the RX timeout timer
///
/// With none set the timer is never stopped, unless `all_required` is set,
/// in which case it is always stopped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxTimeoutStop {
    /// RSSI above the carrier sense threshold
    pub rssi: bool,
    /// Sync word quality above threshold
    pub sqi: bool,
    /// Preamble quality above threshold
    pub pqi: bool,
    /// All the selected conditions are required, instead of any
    pub all_required: bool,
}

impl RxTimeoutStop {
    pub const NEVER: RxTimeoutStop = RxTimeoutStop {
        rssi: false,
        sqi: false,
        pqi: false,
        all_required: false,
    };
    pub const ALWAYS: RxTimeoutStop = RxTimeoutStop {
        rssi: false,
        sqi: false,
        pqi: false,
        all_required: true,
    };
    pub const SQI: RxTimeoutStop = RxTimeoutStop {
        rssi: false,
        sqi: true,
        pqi: false,
        all_required: false,
    };
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Time spent in RX before giving up, if not stopped by the stop condition
    pub fn set_rx_timeout(&mut self, duration: MicrosDurationU32) -> Result<(), I, S, P> {
        let f_dig = self.digital_clock()?;
        let setting = TimerSetting::rx_timeout(duration, f_dig);
        debug!("RX timeout {=u32} us: {}", duration.ticks(), setting);
        self.set_rx_timeout_raw(setting)
    }

    /// Counter 0 disables the timeout
    pub fn set_rx_timeout_raw(&mut self, setting: TimerSetting) -> Result<(), I, S, P> {
        self.write_raw(addr::TIMERS5, &[setting.prescaler, setting.counter])
    }

    pub fn rx_timeout(&mut self) -> Result<MicrosDurationU32, I, S, P> {
        let mut buf = [0; 2];
        self.read_raw(addr::TIMERS5, &mut buf)?;
        let f_dig = self.digital_clock()?;
        Ok(TimerSetting {
            prescaler: buf[0],
            counter: buf[1],
        }
        .rx_timeout_duration(f_dig))
    }

    pub fn set_rx_timeout_stop_condition(&mut self, stop: RxTimeoutStop) -> Result<(), I, S, P> {
        self.modify::<registers::PacketFilterOptions>(|r| r.set_rx_timeout_and(stop.all_required))?;
        self.modify::<registers::Protocol2>(|r| {
            r.set_cs_timeout_mask(stop.rssi);
            r.set_sqi_timeout_mask(stop.sqi);
            r.set_pqi_timeout_mask(stop.pqi);
        })
    }

    /// Wake-up period of the low duty cycle mode
    pub fn set_wakeup_timer(&mut self, duration: MicrosDurationU32) -> Result<(), I, S, P> {
        self.set_wakeup_timer_raw(TimerSetting::wakeup(duration))
    }

    pub fn set_wakeup_timer_raw(&mut self, setting: TimerSetting) -> Result<(), I, S, P> {
        self.write_raw(addr::TIMERS3, &[setting.prescaler, setting.counter])
    }

    pub fn wakeup_timer(&mut self) -> Result<MicrosDurationU32, I, S, P> {
        let mut buf = [0; 2];
        self.read_raw(addr::TIMERS3, &mut buf)?;
        Ok(TimerSetting {
            prescaler: buf[0],
            counter: buf[1],
        }
        .wakeup_duration())
    }

    /// Wake-up period loaded on a sync word or an LDC reload strobe
    pub fn set_wakeup_reload(&mut self, duration: MicrosDurationU32) -> Result<(), I, S, P> {
        let setting = TimerSetting::wakeup(duration);
        self.write_raw(addr::TIMERS1, &[setting.prescaler, setting.counter])
    }

    pub fn set_ldc_mode(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol2>(|r| r.set_ldc_mode(enabled))
    }

    pub fn set_ldc_reload_on_sync(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol1>(|r| r.set_ldc_reload_on_sync(enabled))
    }

    /// Loads the reload values into the wake-up timer
    pub fn reload_ldc(&mut self) -> Result<(), I, S, P> {
        self.command(Command::LdcReload)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const F_DIG: u32 = 25_000_000;

    #[test]
    fn rx_timeout_700ms() {
        let setting = TimerSetting::rx_timeout(MicrosDurationU32::millis(700), F_DIG);
        assert_eq!(
            setting,
            TimerSetting {
                prescaler: 57,
                counter: 248
            }
        );
        assert_eq!(setting.rx_timeout_duration(F_DIG).ticks(), 696_185);
    }

    #[test]
    fn rx_timeout_short() {
        let setting = TimerSetting::rx_timeout(MicrosDurationU32::millis(1), F_DIG);
        assert_eq!(
            setting,
            TimerSetting {
                prescaler: 1,
                counter: 9
            }
        );
        // the counter never goes below one
        let setting = TimerSetting::rx_timeout(MicrosDurationU32::micros(0), F_DIG);
        assert_eq!(
            setting,
            TimerSetting {
                prescaler: 1,
                counter: 1
            }
        );
    }

    #[test]
    fn saturates() {
        assert_eq!(TimerSetting::rx_timeout(MicrosDurationU32::secs(10), F_DIG), TimerSetting::MAX);
        assert_eq!(TimerSetting::wakeup(MicrosDurationU32::secs(2)), TimerSetting::MAX);
        assert_eq!(TimerSetting::MAX.wakeup_duration().ticks(), 1_881_268);
    }

    #[test]
    fn wakeup() {
        let setting = TimerSetting::wakeup(MicrosDurationU32::secs(1));
        assert_eq!(
            setting,
            TimerSetting {
                prescaler: 137,
                counter: 250
            }
        );
        assert_eq!(setting.wakeup_duration().ticks(), 994_236);
        let setting = TimerSetting::wakeup(MicrosDurationU32::millis(50));
        assert_eq!(
            setting,
            TimerSetting {
                prescaler: 7,
                counter: 216
            }
        );
    }
}
