use bilge::prelude::*;

use crate::{interface::Interface, status::Status};
use helper_traits::*;

pub mod helper_traits {
    pub trait MemStorage {
        type ByteArray: AsRef<[u8]> + AsMut<[u8]> + Default;
    }
    pub trait ToBeBytes: MemStorage {
        fn to_be_bytes(self) -> Self::ByteArray;
    }
    pub trait FromBeBytes: MemStorage {
        fn from_be_bytes(val: Self::ByteArray) -> Self;
    }
}

/// A register, or a group of consecutive registers read and written together
///
/// Groups are big endian: the lowest address holds the most significant byte.
pub trait Register: Copy + Sized + PartialEq + FromBeBytes + ToBeBytes {
    const ADDRESS: u8;
    fn read<I: Interface>(iface: &mut I) -> Result<Self, I::Error> {
        let mut buf = Self::ByteArray::default();
        iface.register_read(Self::ADDRESS, buf.as_mut())?;
        Ok(Self::from_be_bytes(buf))
    }
    fn write<I: Interface>(self, iface: &mut I) -> Result<Status, I::Error> {
        iface.register_write(Self::ADDRESS, self.to_be_bytes().as_ref())
    }
    /// Read-modify-write, skipping the write if nothing changed
    fn modify<I: Interface>(iface: &mut I, mut f: impl FnMut(&mut Self)) -> Result<(), I::Error> {
        let mut reg = Self::read::<I>(iface)?;
        let copy = reg;
        f(&mut reg);
        if reg != copy {
            reg.write::<I>(iface)?;
        }
        Ok(())
    }
}

macro_rules! register_impl {
    ($type:ty, $inner:ty, $addr:literal) => {
        impl MemStorage for $type {
            type ByteArray = [u8; core::mem::size_of::<$inner>()];
        }
        impl FromBeBytes for $type {
            fn from_be_bytes(bytes: Self::ByteArray) -> Self {
                Self::from(<$inner>::from_be_bytes(bytes))
            }
        }
        impl ToBeBytes for $type {
            fn to_be_bytes(self) -> Self::ByteArray {
                <$inner>::from(self).to_be_bytes()
            }
        }
        impl Register for $type {
            const ADDRESS: u8 = $addr;
        }
    };
}

/// Addresses of registers without a dedicated type
pub mod addr {
    pub const GPIO3_CONF: u8 = 0x02;
    pub const IF_OFFSET_ANA: u8 = 0x07;
    /// `PA_POWER8..1` run down from here, one slot per ramp level
    pub const PA_POWER1: u8 = 0x17;
    pub const CLOCKREC: u8 = 0x23;
    pub const AGCCTRL2: u8 = 0x24;
    pub const ANT_SELECT_CONF: u8 = 0x27;
    pub const SYNC4: u8 = 0x36;
    pub const PCKT_FLT_GOALS_CONTROL_MASK: u8 = 0x42;
    pub const PCKT_FLT_GOALS_CONTROL_FIELD: u8 = 0x46;
    pub const PCKT_FLT_GOALS_SOURCE_MASK: u8 = 0x4A;
    /// Source address filter in RX, destination address in TX
    pub const PCKT_FLT_GOALS_SOURCE_ADDR: u8 = 0x4B;
    pub const PCKT_FLT_GOALS_BROADCAST: u8 = 0x4C;
    pub const PCKT_FLT_GOALS_MULTICAST: u8 = 0x4D;
    /// Own address, source field in TX and destination filter in RX
    pub const PCKT_FLT_GOALS_TX_ADDR: u8 = 0x4E;
    pub const PROTOCOL0: u8 = 0x52;
    pub const TIMERS5: u8 = 0x53;
    pub const TIMERS3: u8 = 0x55;
    pub const TIMERS1: u8 = 0x57;
    pub const RCO_VCO_CALIBR_IN2: u8 = 0x6D;
    pub const AES_KEY_IN: u8 = 0x70;
    pub const AES_DATA_IN: u8 = 0x80;
    pub const IQC_CORRECTION: u8 = 0x99;
    pub const SYNTH_CONFIG0: u8 = 0x9F;
    pub const VCO_CONFIG: u8 = 0xA1;
    pub const PM_CONFIG1: u8 = 0xA5;
    pub const TEST_SELECT: u8 = 0xA8;
    pub const VCO_L_BUFFER: u8 = 0xA9;
    pub const PM_TEST: u8 = 0xB2;
    pub const TX_PCKT_INFO: u8 = 0xC2;
    pub const RX_PCKT_INFO: u8 = 0xC3;
    pub const AFC_CORR: u8 = 0xC4;
    pub const AES_DATA_OUT: u8 = 0xD4;
}

pub mod ana_func_conf {
    use bilge::prelude::*;

    /// Battery level detector threshold
    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum BatteryLevel {
        #[default]
        V2_7 = 0b00,
        V2_5 = 0b01,
        V2_3 = 0b10,
        V2_1 = 0b11,
    }
}

register_impl!(AnaFuncConf, u16, 0x00);
/// Analog block configuration, `ANA_FUNC_CONF1..0`
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AnaFuncConf {
    /// Temperature sensor output on GPIO0
    pub ts: bool,
    pub battery_level_detector: bool,
    pub brown_out_detector: bool,
    pub high_power_mode: bool,
    /// Reference signal from the XIN pin instead of a crystal
    pub ext_ref: bool,
    pub aes_on: bool,
    /// Digital domain runs from a 26MHz (instead of 24MHz) clock
    pub xtal_26mhz: bool,
    reserved: u1,
    pub battery_level: ana_func_conf::BatteryLevel,
    /// Oscillator transconductance at startup
    pub gm_conf: u3,
    reserved: u3,
}

pub mod gpio_conf {
    use bilge::prelude::*;

    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum GpioMode {
        #[default]
        Analog = 0b00,
        DigitalInput = 0b01,
        /// Low current capability
        OutputLowPower = 0b10,
        /// High current capability
        OutputHighPower = 0b11,
    }
}

/// Configuration of one of the four GPIOs, `GPIOx_CONF`
///
/// The registers are laid out in reverse order starting from [`addr::GPIO3_CONF`].
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GpioConf {
    pub mode: gpio_conf::GpioMode,
    reserved: u1,
    /// Signal routed to or sampled from the pin
    pub select: u5,
}

register_impl!(McuClockConf, u8, 0x06);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct McuClockConf {
    /// Divider from the RCO (set) or XO (clear) clock
    pub rco_source: bool,
    /// Exponent of the clock ratio
    pub ratio_e: u4,
    /// Extra clock cycles provided to the MCU before switching to STANDBY
    pub clock_tail: u2,
    pub enable: bool,
}

register_impl!(Synt, u32, 0x08);
/// Synthesizer word, band select and charge pump, `SYNT3..0`
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Synt {
    /// Band select code
    pub bs: u3,
    pub synt: u26,
    /// VCO charge pump current word
    pub wcp: u3,
}

register_impl!(ChannelSpace, u8, 0x0C);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelSpace {
    /// Channel spacing in steps of f_xo / 2^15
    pub word: u8,
}

register_impl!(IfOffsetDig, u8, 0x0D);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IfOffsetDig {
    pub word: u8,
}

register_impl!(FcOffset, u16, 0x0E);
/// Carrier frequency offset, `FC_OFFSET1..0`
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FcOffset {
    /// Two's complement, in steps of f_xo / 2^18
    pub raw: u12,
    reserved: u4,
}

impl FcOffset {
    pub fn from_word(word: i16) -> Self {
        Self::new(u12::new(word as u16 & 0x0FFF))
    }
    pub fn word(&self) -> i16 {
        ((self.raw().value() << 4) as i16) >> 4
    }
}

pub mod pa_power {
    use bilge::prelude::*;

    /// Output stage additional load capacitance
    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum LoadCapacitor {
        #[default]
        Pf0 = 0b00,
        Pf1_2 = 0b01,
        Pf2_4 = 0b10,
        Pf3_6 = 0b11,
    }
}

register_impl!(PaPower0, u8, 0x18);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PaPower0 {
    /// Last PA_POWER slot used during ramping, or the only one when ramping is off
    pub level_max_index: u3,
    /// Duration of each ramp step, in 1/8 bit periods
    pub ramp_step_width: u2,
    pub ramp_enable: bool,
    pub load_capacitor: pa_power::LoadCapacitor,
}

pub mod modulation {
    use bilge::prelude::*;

    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum ModulationType {
        /// 2-FSK
        #[default]
        Fsk = 0b00,
        /// GFSK, gaussian filter bandwidth set by [`super::Modulation::bt_sel`]
        Gfsk = 0b01,
        AskOok = 0b10,
        Msk = 0b11,
    }
}

register_impl!(Modulation, u16, 0x1A);
/// Datarate and modulation, `MOD1..0`
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Modulation {
    pub datarate_e: u4,
    pub mod_type: modulation::ModulationType,
    /// GFSK BT 0.5 when set, 1 otherwise
    pub bt_sel: bool,
    /// Continuous wave (unmodulated carrier)
    pub cw: bool,
    pub datarate_m: u8,
}

register_impl!(Fdev, u8, 0x1C);
/// Frequency deviation, `FDEV0`
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Fdev {
    pub fdev_m: u3,
    /// PLL clock recovery when set, DLL otherwise
    pub clock_rec_pll: bool,
    pub fdev_e: u4,
}

register_impl!(ChannelFilter, u8, 0x1D);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelFilter {
    pub chflt_e: u4,
    pub chflt_m: u4,
}

register_impl!(Afc2, u8, 0x1E);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Afc2 {
    pub peak_detector_leakage: u5,
    /// Close loop on the 2nd conversion stage instead of the slicer
    pub mode_2nd_stage: bool,
    pub enabled: bool,
    /// Freeze the correction when the sync word is detected
    pub freeze_on_sync: bool,
}

pub mod rssi_filter {
    use bilge::prelude::*;

    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum CarrierSenseMode {
        /// Fixed threshold
        #[default]
        Static = 0b00,
        /// Threshold tracking the RSSI, 6dB above it
        Dynamic6Db = 0b01,
        Dynamic12Db = 0b10,
        Dynamic18Db = 0b11,
    }
}

register_impl!(RssiFilter, u8, 0x21);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiFilter {
    pub ook_peak_decay: u2,
    pub cs_mode: rssi_filter::CarrierSenseMode,
    /// Gain of the RSSI filter
    pub rssi_flt: u4,
}

register_impl!(RssiThreshold, u8, 0x22);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RssiThreshold {
    /// In 0.5dB steps above -130dBm
    pub word: u8,
}

pub mod packet_control {
    use bilge::prelude::*;

    #[bitsize(3)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum CrcMode {
        #[default]
        None = 0b000,
        /// 8 bit, polynomial 0x07
        Crc8 = 0b001,
        /// 16 bit, polynomial 0x8005
        Crc16_8005 = 0b010,
        /// 16 bit, polynomial 0x1021
        Crc16_1021 = 0b011,
        /// 24 bit, polynomial 0x864CBF
        Crc24 = 0b100,
        #[fallback]
        Reserved,
    }

    impl CrcMode {
        /// Length of the CRC field in bytes
        pub fn len(&self) -> u8 {
            match self {
                CrcMode::None | CrcMode::Reserved => 0,
                CrcMode::Crc8 => 1,
                CrcMode::Crc16_8005 | CrcMode::Crc16_1021 => 2,
                CrcMode::Crc24 => 3,
            }
        }
    }

    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum TxSource {
        /// Payload from the TX FIFO
        #[default]
        Normal = 0b00,
        /// Payload from GPIO
        Direct = 0b01,
        /// Pseudo-random bit sequence
        Pn9 = 0b10,
        Reserved = 0b11,
    }

    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum RxMode {
        #[default]
        Normal = 0b00,
        /// Payload to the RX FIFO, without packet handling
        DirectFifo = 0b01,
        /// Payload to GPIO
        DirectGpio = 0b10,
        Reserved = 0b11,
    }

    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum PacketFormat {
        #[default]
        Basic = 0b00,
        Reserved = 0b01,
        WMBus = 0b10,
        Stack = 0b11,
    }
}

register_impl!(PacketControl, u32, 0x30);
/// Packet handler configuration, `PCKTCTRL4..1`
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketControl {
    // PCKTCTRL1
    pub fec: bool,
    reserved: u1,
    pub tx_source: packet_control::TxSource,
    pub whitening: bool,
    pub crc_mode: packet_control::CrcMode,
    // PCKTCTRL2
    /// Variable length packets
    pub variable_length: bool,
    /// Sync word length in bytes, minus one
    pub sync_length: u2,
    /// Preamble length in bytes, minus one
    pub preamble_length: u5,
    // PCKTCTRL3
    /// Width of the length field in bits, minus one
    pub len_wid: u4,
    pub rx_mode: packet_control::RxMode,
    pub format: packet_control::PacketFormat,
    // PCKTCTRL4
    /// Control field length in bytes
    pub control_len: u3,
    /// Address field present (basic format)
    pub address_len: u2,
    reserved: u3,
}

register_impl!(PacketLength, u16, 0x34);
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketLength {
    /// Payload plus address and control fields, in bytes
    pub length: u16,
}

register_impl!(QualityIndicators, u8, 0x3A);
/// Quality indicator thresholds, `QI`
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct QualityIndicators {
    pub pqi_enable: bool,
    pub sqi_enable: bool,
    /// Preamble quality threshold, in steps of 4
    pub pqi_th: u4,
    /// Number of sync word bit errors tolerated
    pub sqi_th: u2,
}

register_impl!(FifoConfig, u32, 0x3E);
/// FIFO almost full/empty thresholds, `FIFO_CONFIG3..0`
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct FifoConfig {
    pub tx_almost_empty: u7,
    reserved: u1,
    pub tx_almost_full: u7,
    reserved: u1,
    pub rx_almost_empty: u7,
    reserved: u1,
    pub rx_almost_full: u7,
    reserved: u1,
}

register_impl!(PacketFilterOptions, u8, 0x4F);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketFilterOptions {
    /// Discard packets with a wrong CRC
    pub crc_check: bool,
    pub dest_vs_broadcast: bool,
    pub dest_vs_multicast: bool,
    pub dest_vs_my_address: bool,
    pub source_filtering: bool,
    pub control_filtering: bool,
    /// RX timeout stop conditions are ANDed (set) or ORed
    pub rx_timeout_and: bool,
    reserved: u1,
}

register_impl!(Protocol2, u8, 0x50);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Protocol2 {
    /// Low duty cycle mode
    pub ldc_mode: bool,
    pub vco_calibration: bool,
    pub rco_calibration: bool,
    pub tx_seq_num_reload: u2,
    /// RX timeout stop conditions
    pub pqi_timeout_mask: bool,
    pub sqi_timeout_mask: bool,
    pub cs_timeout_mask: bool,
}

register_impl!(Protocol1, u8, 0x51);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Protocol1 {
    /// Filter packets according to [`PacketFilterOptions`]
    pub auto_packet_filter: bool,
    pub csma_persistent: bool,
    pub csma_on: bool,
    /// Reload the CSMA back-off seed on every attempt
    pub seed_reload: bool,
    reserved: u2,
    pub piggybacking: bool,
    pub ldc_reload_on_sync: bool,
}

pub mod csma {
    use bilge::prelude::*;

    /// Carrier sense period, in bit periods
    #[bitsize(2)]
    #[derive(FromBits, Debug, Clone, Copy, Default, PartialEq, Eq)]
    #[cfg_attr(feature = "defmt", derive(defmt::Format))]
    pub enum CcaPeriod {
        #[default]
        Tbit64 = 0b00,
        Tbit128 = 0b01,
        Tbit256 = 0b10,
        Tbit512 = 0b11,
    }
}

register_impl!(CsmaConfig, u32, 0x64);
/// CSMA/CA configuration, `CSMA_CONFIG3..0`
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CsmaConfig {
    /// Maximum number of back-off cycles
    pub nbackoff_max: u3,
    reserved: u1,
    /// Number of carrier sense periods
    pub cca_length: u4,
    pub cca_period: csma::CcaPeriod,
    pub bu_prescaler: u6,
    /// Back-off counter seed
    pub bu_counter_seed: u16,
}

register_impl!(ChannelNumber, u8, 0x6C);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ChannelNumber {
    pub channel: u8,
}

register_impl!(VcoCalibrTx, u8, 0x6E);
/// VCO calibration word applied in TX, `RCO_VCO_CALIBR_IN1`
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VcoCalibrTx {
    pub word: u7,
    reserved: u1,
}

register_impl!(VcoCalibrRx, u8, 0x6F);
/// VCO calibration word applied in RX, `RCO_VCO_CALIBR_IN0`
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VcoCalibrRx {
    pub word: u7,
    reserved: u1,
}

register_impl!(IrqMask, u32, 0x90);
/// Interrupt mask registers, `IRQ_MASK3..0`
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqMask {
    pub irq: Irq,
}

register_impl!(IrqStatus, u32, 0xFA);
/// Interrupt status registers, `IRQ_STATUS3..0`, cleared on read
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IrqStatus {
    pub irq: Irq,
}

#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Irq {
    /// Packet received
    pub rx_data_ready: bool,
    /// Packet discarded by the filters
    pub rx_data_discarded: bool,
    pub tx_data_sent: bool,
    /// Maximum number of retransmissions reached
    pub max_re_tx_reached: bool,
    pub crc_error: bool,
    /// TX FIFO underflow/overflow
    pub tx_fifo_error: bool,
    /// RX FIFO underflow/overflow
    pub rx_fifo_error: bool,
    pub tx_fifo_almost_full: bool,
    pub tx_fifo_almost_empty: bool,
    pub rx_fifo_almost_full: bool,
    pub rx_fifo_almost_empty: bool,
    /// Maximum number of CSMA back-offs reached
    pub max_backoff_reached: bool,
    pub valid_preamble: bool,
    pub valid_sync: bool,
    pub rssi_above_threshold: bool,
    /// Wake-up timer expired in LDC mode
    pub wakeup_timeout_ldc: bool,
    pub ready: bool,
    /// STANDBY delayed by the MCU clock tail
    pub standby_delayed: bool,
    pub low_battery: bool,
    pub power_on_reset: bool,
    pub brown_out: bool,
    pub lock: bool,
    pub pm_count_expired: bool,
    pub xo_count_expired: bool,
    pub synth_lock_timeout: bool,
    pub synth_lock_startup: bool,
    pub synth_cal_timeout: bool,
    pub tx_start_time: bool,
    pub rx_start_time: bool,
    pub rx_timeout: bool,
    /// AES engine finished
    pub aes_end: bool,
    reserved: u1,
}

impl Irq {
    pub fn all() -> Self {
        Self::from(0x7FFF_FFFF_u32)
    }

    pub fn intersects(&self, other: Irq) -> bool {
        u32::from(*self) & u32::from(other) != 0
    }
}

impl core::ops::BitOr for Irq {
    type Output = Irq;
    fn bitor(self, rhs: Irq) -> Irq {
        Irq::from(u32::from(self) | u32::from(rhs))
    }
}

register_impl!(SynthConfig1, u8, 0x9E);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SynthConfig1 {
    reserved: u1,
    pub vco_h_sel: bool,
    pub vco_l_sel: bool,
    reserved: u4,
    /// Divide the reference clock by two
    pub refdiv: bool,
}

register_impl!(DemConfig, u8, 0xA3);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DemConfig {
    reserved: u1,
    /// First order demodulator, the second order one is used when clear
    pub dem_1st_order: bool,
    reserved: u6,
}

register_impl!(XoRcoTest, u8, 0xB4);
#[bitsize(8)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct XoRcoTest {
    reserved: u3,
    /// Disable the digital clock divider
    pub pd_clkdiv: bool,
    reserved: u4,
}

register_impl!(McState, u16, 0xC0);
/// Same content as the status word, `MC_STATE1..0`
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct McState {
    pub status: Status,
}

register_impl!(LinkQuality, u32, 0xC5);
/// Quality of the last received packet, `LINK_QUALIF2..0` and `RSSI_LEVEL`
#[bitsize(32)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkQuality {
    /// RSSI sampled at the end of the sync word
    pub rssi_level: u8,
    pub agc_word: u4,
    reserved: u4,
    /// Sync quality indicator
    pub sqi: u7,
    /// Carrier sense
    pub cs: bool,
    /// Preamble quality indicator
    pub pqi: u8,
}

register_impl!(RxPacketLength, u16, 0xC9);
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxPacketLength {
    pub length: u16,
}

register_impl!(RxAddress, u16, 0xD2);
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RxAddress {
    pub destination: u8,
    pub source: u8,
}

register_impl!(VcoCalibrOut, u16, 0xE4);
/// Calibration results, `RCO_VCO_CALIBR_OUT1..0`
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct VcoCalibrOut {
    pub vco_word: u7,
    reserved: u1,
    pub rfb_out: u4,
    pub rwt_out: u4,
}

register_impl!(LinearFifoStatus, u16, 0xE6);
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinearFifoStatus {
    pub rx_elements: u7,
    reserved: u1,
    pub tx_elements: u7,
    reserved: u1,
}

register_impl!(DeviceInfo, u16, 0xF0);
#[bitsize(16)]
#[derive(FromBits, DebugBits, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceInfo {
    pub version: u8,
    pub part_number: u8,
}
