use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    registers::{
        self, addr, helper_traits::ToBeBytes, modulation::ModulationType, pa_power, Register,
    },
    status::State,
    CommState, Interface, Result, Spirit1,
};

pub mod calc;

use calc::{Band, Vco};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum RadioError {
    /// Outside of the four supported bands
    FrequencyOutOfRange,
    /// Doesn't fit in the 12 bit `FC_OFFSET` word
    OffsetOutOfRange,
    DatarateOutOfRange,
    DeviationOutOfRange,
    BandwidthOutOfRange,
    ChannelSpaceOutOfRange,
}

/// Physical layer configuration applied by [`Spirit1::radio_init`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RadioConfig {
    /// Crystal error, compensated through the frequency offset
    pub xtal_offset_ppm: i16,
    /// Base frequency in Hz, channel 0 sits here
    pub frequency_base: u32,
    /// Channel spacing in Hz
    pub channel_space: u32,
    pub channel_number: u8,
    pub modulation: ModulationType,
    /// Bits per second
    pub datarate: u32,
    /// Frequency deviation in Hz
    pub freq_deviation: u32,
    /// Channel filter bandwidth in Hz
    pub bandwidth: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            xtal_offset_ppm: 0,
            frequency_base: 915_000_000,
            channel_space: 20_000,
            channel_number: 0,
            modulation: ModulationType::Fsk,
            datarate: 38_400,
            freq_deviation: 20_000,
            bandwidth: 100_500,
        }
    }
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Configures the analog and digital radio blocks, then sets the base frequency
    ///
    /// Leaves the chip in READY.
    pub fn radio_init(&mut self, config: &RadioConfig) -> Result<(), I, S, P> {
        // VTUNE workaround
        self.write_raw(addr::SYNTH_CONFIG0, &[0xA0])?;

        self.command(crate::Command::Standby)?;
        self.wait_for_state(State::Standby)?;
        let divider = self.xtal >= calc::DOUBLE_XTAL_THR;
        self.set_digital_divider(divider)?;
        self.command(crate::Command::Ready)?;
        self.wait_for_state(State::Ready)?;

        let f_dig = calc::digital_clock(self.xtal, divider);
        let offset = calc::ppm_to_offset(config.xtal_offset_ppm as i32, config.frequency_base);
        let fc_offset = registers::FcOffset::from_word(calc::fc_offset_word(offset, self.xtal)?);
        let chspace = calc::channel_space_word(config.channel_space, self.xtal)?;
        self.desired_frequency = config.frequency_base;
        self.comm_state = CommState::Idle;

        // second order demodulator
        self.modify::<registers::DemConfig>(|r| r.set_dem_1st_order(false))?;

        let (dr_m, dr_e) = calc::datarate_word(config.datarate, f_dig)?;
        let (fdev_m, fdev_e) = calc::deviation_word(config.freq_deviation, self.xtal)?;
        let (bw_m, bw_e) = calc::bandwidth_word(config.bandwidth, f_dig)?;
        let clock_rec = self.read::<registers::Fdev>()?.clock_rec_pll();

        let if_ana = calc::if_offset_word(self.xtal);
        let if_dig = calc::if_offset_word(f_dig);
        self.write_raw(addr::IF_OFFSET_ANA, &[if_ana])?;
        self.set_xtal_flag(f_dig >= 25_000_000)?;
        self.write(registers::ChannelNumber::new(config.channel_number))?;

        // CHSPACE, IF_OFFSET_DIG, FC_OFFSET1..0
        let [off1, off0] = fc_offset.to_be_bytes();
        self.write_raw(registers::ChannelSpace::ADDRESS, &[chspace, if_dig, off1, off0])?;

        // MOD1..0, FDEV0, CHFLT
        let mut modulation = registers::Modulation::default();
        modulation.set_datarate_m(dr_m);
        modulation.set_datarate_e(dr_e);
        modulation.set_mod_type(config.modulation);
        let [mod1, mod0] = modulation.to_be_bytes();
        let fdev = registers::Fdev::new(fdev_m, clock_rec, fdev_e);
        let chflt = registers::ChannelFilter::new(bw_e, bw_m);
        self.write_raw(
            registers::Modulation::ADDRESS,
            &[mod1, mod0, u8::from(fdev), u8::from(chflt)],
        )?;

        self.set_afc_freeze_on_sync(true)?;
        // IQC correction
        self.write_raw(addr::IQC_CORRECTION, &[0x80, 0xE3])?;

        self.set_frequency_base(config.frequency_base)
    }

    /// Programs the synthesizer for a new base frequency
    ///
    /// Also selects the VCO and the charge pump current for the resulting
    /// channel centre, then runs the VCO calibration workaround if enabled.
    pub fn set_frequency_base(&mut self, base: u32) -> Result<(), I, S, P> {
        self.write_frequency_base(base)?;
        if self.vco_workaround {
            self.vco_calibration_workaround()?;
        }
        Ok(())
    }

    pub(crate) fn write_frequency_base(&mut self, base: u32) -> Result<(), I, S, P> {
        let refdiv = self.reference_divider()?;
        let (band, synt) = calc::synt_word(base, self.xtal, refdiv)?;
        let offset = self.frequency_offset()?;
        let space = self.channel_space()?;
        let channel = self.channel()?;
        let center = calc::channel_center(base, offset, space, channel);

        self.select_vco(calc::vco_select(center, band))?;
        let wcp = calc::charge_pump_word(center, band);
        debug!(
            "Base {=u32} Hz, SYNT {=u32:#X}, WCP {=u8}",
            base,
            synt.value(),
            wcp.value()
        );
        self.write(registers::Synt::new(band.code(), synt, wcp))
    }

    pub fn frequency_base(&mut self) -> Result<u32, I, S, P> {
        let synt = self.read::<registers::Synt>()?;
        let band = Band::from_code(synt.bs()).ok_or(crate::Error::Radio(RadioError::FrequencyOutOfRange))?;
        let refdiv = self.reference_divider()?;
        Ok(calc::frequency_from_synt(synt.synt(), band, self.xtal, refdiv))
    }

    pub fn set_channel(&mut self, channel: u8) -> Result<(), I, S, P> {
        self.write(registers::ChannelNumber::new(channel))
    }

    pub fn channel(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::ChannelNumber>()?.channel())
    }

    pub fn set_channel_space(&mut self, space: u32) -> Result<(), I, S, P> {
        let word = calc::channel_space_word(space, self.xtal)?;
        self.write(registers::ChannelSpace::new(word))
    }

    pub fn channel_space(&mut self) -> Result<u32, I, S, P> {
        let word = self.read::<registers::ChannelSpace>()?.word();
        Ok(calc::channel_space_from_word(word, self.xtal))
    }

    /// Frequency offset in Hz, applied to every channel
    pub fn set_frequency_offset(&mut self, offset: i32) -> Result<(), I, S, P> {
        let word = calc::fc_offset_word(offset, self.xtal)?;
        self.write(registers::FcOffset::from_word(word))
    }

    /// Frequency offset from a crystal error, relative to the current base frequency
    pub fn set_frequency_offset_ppm(&mut self, ppm: i16) -> Result<(), I, S, P> {
        let base = self.frequency_base()?;
        self.set_frequency_offset(calc::ppm_to_offset(ppm as i32, base))
    }

    pub fn frequency_offset(&mut self) -> Result<i32, I, S, P> {
        let word = self.read::<registers::FcOffset>()?.word();
        Ok(calc::fc_offset_from_word(word, self.xtal))
    }

    /// Centre of the current channel in Hz
    pub fn center_frequency(&mut self) -> Result<u32, I, S, P> {
        let base = self.frequency_base()?;
        let offset = self.frequency_offset()?;
        let space = self.channel_space()?;
        let channel = self.channel()?;
        Ok(calc::channel_center(base, offset, space, channel))
    }

    pub fn set_datarate(&mut self, rate: u32) -> Result<(), I, S, P> {
        let f_dig = self.digital_clock()?;
        let (m, e) = calc::datarate_word(rate, f_dig)?;
        self.modify::<registers::Modulation>(|r| {
            r.set_datarate_m(m);
            r.set_datarate_e(e);
        })
    }

    pub fn datarate(&mut self) -> Result<u32, I, S, P> {
        let f_dig = self.digital_clock()?;
        let reg = self.read::<registers::Modulation>()?;
        Ok(calc::datarate(reg.datarate_m(), reg.datarate_e(), f_dig))
    }

    pub fn set_frequency_deviation(&mut self, fdev: u32) -> Result<(), I, S, P> {
        let (m, e) = calc::deviation_word(fdev, self.xtal)?;
        self.modify::<registers::Fdev>(|r| {
            r.set_fdev_m(m);
            r.set_fdev_e(e);
        })
    }

    pub fn frequency_deviation(&mut self) -> Result<u32, I, S, P> {
        let reg = self.read::<registers::Fdev>()?;
        Ok(calc::deviation(reg.fdev_m(), reg.fdev_e(), self.xtal))
    }

    /// Channel filter bandwidth in Hz
    pub fn set_bandwidth(&mut self, bw: u32) -> Result<(), I, S, P> {
        let f_dig = self.digital_clock()?;
        let (m, e) = calc::bandwidth_word(bw, f_dig)?;
        self.write(registers::ChannelFilter::new(e, m))
    }

    pub fn bandwidth(&mut self) -> Result<u32, I, S, P> {
        let f_dig = self.digital_clock()?;
        let reg = self.read::<registers::ChannelFilter>()?;
        Ok(calc::bandwidth(reg.chflt_m(), reg.chflt_e(), f_dig))
    }

    pub fn set_modulation(&mut self, modulation: ModulationType) -> Result<(), I, S, P> {
        self.modify::<registers::Modulation>(|r| r.set_mod_type(modulation))
    }

    pub fn modulation(&mut self) -> Result<ModulationType, I, S, P> {
        Ok(self.read::<registers::Modulation>()?.mod_type())
    }

    /// Transmit an unmodulated carrier
    pub fn set_cw_mode(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Modulation>(|r| r.set_cw(enabled))
    }

    /// Raw value of one of the eight PA_POWER slots
    pub fn set_pa_level_raw(&mut self, index: u3, level: u8) -> Result<(), I, S, P> {
        self.write_raw(addr::PA_POWER1 - index.value(), &[level])
    }

    pub fn pa_level_raw(&mut self, index: u3) -> Result<u8, I, S, P> {
        let mut buf = [0];
        self.read_raw(addr::PA_POWER1 - index.value(), &mut buf)?;
        Ok(buf[0])
    }

    /// Sets one PA slot to an output power, using the fit for the current band
    pub fn set_pa_level_dbm(&mut self, index: u3, dbm: f32) -> Result<(), I, S, P> {
        let base = self.frequency_base()?;
        let level = calc::pa_level_from_dbm(dbm, base)?;
        debug!("PA slot {=u8}: {=f32} dBm, level {=u8}", index.value(), dbm, level);
        self.set_pa_level_raw(index, level)
    }

    pub fn pa_level_dbm(&mut self, index: u3) -> Result<f32, I, S, P> {
        let base = self.frequency_base()?;
        let level = self.pa_level_raw(index)?;
        Ok(calc::pa_level_to_dbm(level, base)?)
    }

    /// Last PA slot used, the only one when ramping is off
    pub fn set_pa_max_index(&mut self, index: u3) -> Result<(), I, S, P> {
        self.modify::<registers::PaPower0>(|r| r.set_level_max_index(index))
    }

    pub fn pa_max_index(&mut self) -> Result<u3, I, S, P> {
        Ok(self.read::<registers::PaPower0>()?.level_max_index())
    }

    /// Step through the PA slots at power up, each step lasting `(step + 1) / 8` bit periods
    pub fn set_pa_ramp(&mut self, step: Option<u2>) -> Result<(), I, S, P> {
        self.modify::<registers::PaPower0>(|r| {
            r.set_ramp_enable(step.is_some());
            if let Some(step) = step {
                r.set_ramp_step_width(step);
            }
        })
    }

    pub fn set_pa_load_capacitor(&mut self, cwc: pa_power::LoadCapacitor) -> Result<(), I, S, P> {
        self.modify::<registers::PaPower0>(|r| r.set_load_capacitor(cwc))
    }

    pub fn pa_load_capacitor(&mut self) -> Result<pa_power::LoadCapacitor, I, S, P> {
        Ok(self.read::<registers::PaPower0>()?.load_capacitor())
    }

    pub fn set_afc(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Afc2>(|r| r.set_enabled(enabled))
    }

    pub fn set_afc_freeze_on_sync(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Afc2>(|r| r.set_freeze_on_sync(enabled))
    }

    /// Close the AFC loop on the second conversion stage instead of the slicer
    pub fn set_afc_2nd_stage(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Afc2>(|r| r.set_mode_2nd_stage(enabled))
    }

    /// Frequency correction applied by the AFC to the last packet, raw two's complement word
    pub fn afc_correction(&mut self) -> Result<i8, I, S, P> {
        let mut buf = [0];
        self.read_raw(addr::AFC_CORR, &mut buf)?;
        Ok(buf[0] as i8)
    }

    pub(crate) fn select_vco(&mut self, vco: Vco) -> Result<(), I, S, P> {
        self.modify::<registers::SynthConfig1>(|r| {
            r.set_vco_h_sel(vco == Vco::High);
            r.set_vco_l_sel(vco == Vco::Low);
        })
    }
}
