/// Command strobes
///
/// Sent after the [`COMMAND`](crate::interface::headers::COMMAND) header,
/// codes from the SPIRIT1 datasheet, section 9.5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Command {
    /// Start transmission, valid from READY
    Tx = 0x60,
    /// Start reception, valid from READY
    Rx = 0x61,
    /// Go to READY, valid from STANDBY, SLEEP and LOCK
    Ready = 0x62,
    /// Go to STANDBY, valid from READY
    Standby = 0x63,
    /// Go to SLEEP, valid from READY
    Sleep = 0x64,
    /// Go to LOCK with the RX synthesizer configuration
    LockRx = 0x65,
    /// Go to LOCK with the TX synthesizer configuration
    LockTx = 0x66,
    /// Exit from TX or RX states and go to READY
    Sabort = 0x67,
    /// Reload the LDC timer with the programmed value
    LdcReload = 0x68,
    /// Reload the packet sequence counter
    SequenceUpdate = 0x69,
    /// Start the encryption routine
    AesEncrypt = 0x6A,
    /// Start the key derivation routine
    AesKey = 0x6B,
    /// Start the decryption routine using the current key
    AesDecrypt = 0x6C,
    /// Start the key derivation and decryption routines
    AesKeyDecrypt = 0x6D,
    /// Reset the chip, all registers return to their default values
    SoftReset = 0x70,
    FlushRxFifo = 0x71,
    FlushTxFifo = 0x72,
}
