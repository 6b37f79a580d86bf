use bilge::prelude::*;

/// Main controller state
#[bitsize(7)]
#[derive(FromBits, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum State {
    Ready = 0x03,
    Lock = 0x0F,
    /// The synthesizer failed to lock during VCO calibration
    LockFailed = 0x13,
    Protocol = 0x1F,
    XoSettling = 0x23,
    Rx = 0x33,
    Sleep = 0x36,
    PmSetup = 0x3D,
    Standby = 0x40,
    SynthCalibration = 0x4F,
    SynthSetup = 0x53,
    Tx = 0x5F,
    /// Transient or undocumented state
    #[fallback]
    Other,
}

/// Device status word
///
/// Shifted out on MISO while the header and address bytes of every SPI transaction
/// are being sent, also readable as the `MC_STATE1..0` registers.
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status {
    /// Crystal oscillator running
    pub xo_on: bool,
    pub state: State,
    /// RCO calibration error
    pub error_lock: bool,
    pub rx_fifo_empty: bool,
    pub tx_fifo_full: bool,
    /// Currently selected antenna
    pub ant_select: bool,
    reserved: u4,
}

impl Status {
    /// Builds the status from the two bytes clocked out by the chip, MSB first
    pub fn from_be_bytes(bytes: [u8; 2]) -> Self {
        Self::from(u16::from_be_bytes(bytes))
    }

    pub fn to_be_bytes(self) -> [u8; 2] {
        u16::from(self).to_be_bytes()
    }
}

impl Default for Status {
    fn default() -> Self {
        Self::new(false, State::Standby, false, true, false, false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ready_with_xo_running() {
        // MC_STATE1 = RX FIFO empty, MC_STATE0 = READY << 1 | XO_ON
        let status = Status::from_be_bytes([0x02, 0x07]);
        assert!(status.xo_on());
        assert_eq!(status.state(), State::Ready);
        assert!(status.rx_fifo_empty());
        assert!(!status.tx_fifo_full());
    }

    #[test]
    fn unknown_states_fall_back() {
        let status = Status::from_be_bytes([0x00, 0x7E]);
        assert_eq!(status.state(), State::Other);
    }

    #[test]
    fn lock_failure_code() {
        let status = Status::from_be_bytes([0x00, 0x13 << 1]);
        assert_eq!(status.state(), State::LockFailed);
        assert_eq!(status.to_be_bytes(), [0x00, 0x26]);
    }
}
