use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    radio::calc::{self, Vco},
    registers::{self, addr},
    Command, Error, Interface, Result, Spirit1, State, STATE_POLL_LIMIT,
};

/// VCO calibration words sampled while locked in TX and RX
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VcoWords {
    pub tx: u8,
    pub rx: u8,
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Calibrate the VCO automatically on every synthesizer lock
    pub fn set_vco_calibration(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol2>(|r| r.set_vco_calibration(enabled))
    }

    /// Calibrate the RC oscillator automatically when leaving standby
    pub fn set_rco_calibration(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol2>(|r| r.set_rco_calibration(enabled))
    }

    pub fn set_vco(&mut self, vco: Vco) -> Result<(), I, S, P> {
        self.select_vco(vco)
    }

    pub fn vco(&mut self) -> Result<Vco, I, S, P> {
        let reg = self.read::<registers::SynthConfig1>()?;
        Ok(if reg.vco_h_sel() { Vco::High } else { Vco::Low })
    }

    /// Result of the last VCO calibration
    pub fn vco_calibration_data(&mut self) -> Result<u7, I, S, P> {
        Ok(self.read::<registers::VcoCalibrOut>()?.vco_word())
    }

    pub fn set_vco_word_tx(&mut self, word: u7) -> Result<(), I, S, P> {
        self.modify::<registers::VcoCalibrTx>(|r| r.set_word(word))
    }

    pub fn vco_word_tx(&mut self) -> Result<u7, I, S, P> {
        Ok(self.read::<registers::VcoCalibrTx>()?.word())
    }

    pub fn set_vco_word_rx(&mut self, word: u7) -> Result<(), I, S, P> {
        self.modify::<registers::VcoCalibrRx>(|r| r.set_word(word))
    }

    pub fn vco_word_rx(&mut self) -> Result<u7, I, S, P> {
        Ok(self.read::<registers::VcoCalibrRx>()?.word())
    }

    /// Locks the synthesizer in TX and RX and stores the VCO words it settles on
    ///
    /// Crystals above 30MHz need the reference divider during calibration, it's
    /// enabled temporarily when off. A chip in STANDBY is brought to READY and
    /// back. Aborts with [`Error::VcoLockFailed`] if the synthesizer can't lock.
    pub fn vco_calibration_workaround(&mut self) -> Result<VcoWords, I, S, P> {
        let mut restore_base = None;
        if self.xtal > calc::DOUBLE_XTAL_THR && !self.reference_divider()? {
            let base = self.frequency_base()?;
            self.set_reference_divider(true)?;
            self.write_frequency_base(base)?;
            restore_base = Some(base);
        }

        // more VCO current while calibrating
        self.write_raw(addr::VCO_CONFIG, &[0x19])?;
        self.set_vco_calibration(true)?;

        let from_standby = self.refresh_status()?.state() == State::Standby;
        if from_standby {
            self.command(Command::Ready)?;
            self.wait_for_lock_state(State::Ready)?;
        }

        self.command(Command::LockTx)?;
        self.wait_for_lock_state(State::Lock)?;
        let tx = self.vco_calibration_data()?;
        self.command(Command::Ready)?;
        self.wait_for_lock_state(State::Ready)?;

        self.command(Command::LockRx)?;
        self.wait_for_lock_state(State::Lock)?;
        let rx = self.vco_calibration_data()?;
        self.command(Command::Ready)?;
        self.wait_for_lock_state(State::Ready)?;

        if from_standby {
            self.command(Command::Standby)?;
        }
        self.set_vco_calibration(false)?;

        if let Some(base) = restore_base {
            self.set_reference_divider(false)?;
            self.write_frequency_base(base)?;
        }
        self.write_raw(addr::VCO_CONFIG, &[0x11])?;

        self.set_vco_word_tx(tx)?;
        self.set_vco_word_rx(rx)?;
        let words = VcoWords {
            tx: tx.value(),
            rx: rx.value(),
        };
        debug!("VCO calibrated, {}", words);
        Ok(words)
    }

    /// Like [`Spirit1::wait_for_state`], but bails out when the lock fails
    fn wait_for_lock_state(&mut self, state: State) -> Result<(), I, S, P> {
        for _ in 0..STATE_POLL_LIMIT {
            match self.refresh_status()?.state() {
                State::LockFailed => {
                    warn!("VCO lock failed waiting for {}", state);
                    return Err(Error::VcoLockFailed);
                }
                s if s == state => return Ok(()),
                _ => {}
            }
        }
        Err(Error::StateTimeout(self.status.state()))
    }
}
