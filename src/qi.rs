//! Link quality: preamble and sync quality indicators, RSSI and carrier sense

use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    radio::calc,
    registers::{self, rssi_filter::CarrierSenseMode},
    Interface, Result, Spirit1,
};

/// Link quality of the last received packet
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkQuality {
    pub rssi_dbm: f32,
    pub pqi: u8,
    pub sqi: u8,
    pub agc_word: u8,
    pub carrier_sense: bool,
}

impl From<registers::LinkQuality> for LinkQuality {
    fn from(r: registers::LinkQuality) -> Self {
        Self {
            rssi_dbm: calc::rssi_to_dbm(r.rssi_level()),
            pqi: r.pqi(),
            sqi: r.sqi().value(),
            agc_word: r.agc_word().value(),
            carrier_sense: r.cs(),
        }
    }
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Preamble quality threshold, `threshold` is multiplied by 4
    pub fn set_pqi_threshold(&mut self, threshold: u4) -> Result<(), I, S, P> {
        self.modify::<registers::QualityIndicators>(|r| r.set_pqi_th(threshold))
    }

    pub fn set_pqi_check(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::QualityIndicators>(|r| r.set_pqi_enable(enabled))
    }

    /// Sync word bit errors tolerated, 0 requires a perfect match
    pub fn set_sqi_threshold(&mut self, threshold: u2) -> Result<(), I, S, P> {
        self.modify::<registers::QualityIndicators>(|r| r.set_sqi_th(threshold))
    }

    pub fn set_sqi_check(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::QualityIndicators>(|r| r.set_sqi_enable(enabled))
    }

    pub fn quality_indicators(&mut self) -> Result<registers::QualityIndicators, I, S, P> {
        self.read()
    }

    /// Carrier sense threshold, clamped to the -130..=-2.5dBm register range
    pub fn set_rssi_threshold_dbm(&mut self, dbm: i16) -> Result<(), I, S, P> {
        self.write(registers::RssiThreshold::new(calc::rssi_threshold_word(dbm)))
    }

    pub fn rssi_threshold_dbm(&mut self) -> Result<f32, I, S, P> {
        let word = self.read::<registers::RssiThreshold>()?.word();
        Ok(calc::rssi_to_dbm(word))
    }

    pub fn set_carrier_sense_mode(&mut self, mode: CarrierSenseMode) -> Result<(), I, S, P> {
        self.modify::<registers::RssiFilter>(|r| r.set_cs_mode(mode))
    }

    pub fn carrier_sense_mode(&mut self) -> Result<CarrierSenseMode, I, S, P> {
        Ok(self.read::<registers::RssiFilter>()?.cs_mode())
    }

    /// RSSI filter gain, higher values average over more samples
    pub fn set_rssi_filter_gain(&mut self, gain: u4) -> Result<(), I, S, P> {
        self.modify::<registers::RssiFilter>(|r| r.set_rssi_flt(gain))
    }

    pub fn link_quality(&mut self) -> Result<LinkQuality, I, S, P> {
        Ok(self.read::<registers::LinkQuality>()?.into())
    }

    /// RSSI captured at the end of the last sync word
    pub fn rssi_dbm(&mut self) -> Result<f32, I, S, P> {
        Ok(calc::rssi_to_dbm(
            self.read::<registers::LinkQuality>()?.rssi_level(),
        ))
    }

    pub fn pqi(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::LinkQuality>()?.pqi())
    }

    pub fn sqi(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::LinkQuality>()?.sqi().value())
    }

    pub fn agc_word(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::LinkQuality>()?.agc_word().value())
    }

    /// RSSI currently above the carrier sense threshold
    pub fn carrier_sense(&mut self) -> Result<bool, I, S, P> {
        Ok(self.read::<registers::LinkQuality>()?.cs())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::helper_traits::FromBeBytes;

    #[test]
    fn link_quality_fields() {
        // LINK_QUALIF2, LINK_QUALIF1, LINK_QUALIF0, RSSI_LEVEL
        let raw = registers::LinkQuality::from_be_bytes([0x20, 0x85, 0x03, 0x28]);
        let lq = LinkQuality::from(raw);
        assert_eq!(lq.pqi, 0x20);
        assert_eq!(lq.sqi, 5);
        assert!(lq.carrier_sense);
        assert_eq!(lq.agc_word, 3);
        assert_eq!(lq.rssi_dbm, -110.0);
    }
}
