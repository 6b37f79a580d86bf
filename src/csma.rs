use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    registers::{self, csma::CcaPeriod},
    Interface, Result, Spirit1,
};

/// Carrier sense multiple access settings applied by [`Spirit1::csma_init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsmaConfig {
    /// Keep sensing the channel until it's free instead of backing off
    pub persistent: bool,
    pub cca_period: CcaPeriod,
    /// Carrier sense periods per channel assessment, at most 15
    pub cca_length: u8,
    /// Back-off cycles before giving up, at most 7
    pub max_backoffs: u8,
    pub backoff_seed: u16,
    /// Back-off unit prescaler, at most 63
    pub backoff_prescaler: u8,
}

impl Default for CsmaConfig {
    fn default() -> Self {
        Self {
            persistent: false,
            cca_period: CcaPeriod::Tbit64,
            cca_length: 3,
            max_backoffs: 5,
            backoff_seed: 0xFA21,
            backoff_prescaler: 32,
        }
    }
}

impl From<&CsmaConfig> for registers::CsmaConfig {
    fn from(c: &CsmaConfig) -> Self {
        Self::new(
            u3::new(c.max_backoffs.min(7)),
            u4::new(c.cca_length.min(15)),
            c.cca_period,
            u6::new(c.backoff_prescaler.min(63)),
            c.backoff_seed,
        )
    }
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Configures the channel assessment, CSMA itself stays as it was
    pub fn csma_init(&mut self, config: &CsmaConfig) -> Result<(), I, S, P> {
        let reg = registers::CsmaConfig::from(config);
        debug!("CSMA config {}", reg);
        self.write(reg)?;
        self.set_csma_persistent(config.persistent)
    }

    /// Runs a channel assessment before every transmission
    pub fn set_csma(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol1>(|r| r.set_csma_on(enabled))
    }

    pub fn csma_enabled(&mut self) -> Result<bool, I, S, P> {
        Ok(self.read::<registers::Protocol1>()?.csma_on())
    }

    pub fn set_csma_persistent(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol1>(|r| r.set_csma_persistent(enabled))
    }

    /// Reloads the back-off seed before every transmission
    pub fn set_csma_seed_reload(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol1>(|r| r.set_seed_reload(enabled))
    }

    pub fn csma_config(&mut self) -> Result<registers::CsmaConfig, I, S, P> {
        self.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::helper_traits::ToBeBytes;

    #[test]
    fn csma_register_layout() {
        let reg = registers::CsmaConfig::from(&CsmaConfig::default());
        // seed MSB, seed LSB, prescaler << 2 | period, length << 4 | max backoffs
        assert_eq!(reg.to_be_bytes(), [0xFA, 0x21, 0x80, 0x35]);
    }

    #[test]
    fn out_of_range_clamped() {
        let config = CsmaConfig {
            cca_length: 40,
            max_backoffs: 9,
            backoff_prescaler: 100,
            cca_period: CcaPeriod::Tbit512,
            ..Default::default()
        };
        let reg = registers::CsmaConfig::from(&config);
        assert_eq!(reg.to_be_bytes(), [0xFA, 0x21, 0xFF, 0xF7]);
    }
}
