//! Conversions between physical quantities and SPIRIT1 register words
//!
//! Everything here is pure. Frequencies are in Hz, the crystal frequency and
//! the divider settings are passed in explicitly.

use bilge::prelude::*;

use super::RadioError;

/// Above this the digital clock is the crystal frequency divided by two
pub const DOUBLE_XTAL_THR: u32 = 30_000_000;

pub const MIN_DATARATE: u32 = 100;
pub const MAX_DATARATE: u32 = 500_000;

/// Output level reported for a disabled or out of range PA slot
pub const PA_OFF_DBM: f32 = -130.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Band {
    /// 779-956 MHz
    High,
    /// 387-470 MHz
    Middle,
    /// 300-348 MHz
    Low,
    /// 150-174 MHz
    VeryLow,
}

impl Band {
    pub fn from_frequency(hz: u32) -> Result<Self, RadioError> {
        match hz {
            779_000_000..=956_000_000 => Ok(Band::High),
            387_000_000..=470_000_000 => Ok(Band::Middle),
            300_000_000..=348_000_000 => Ok(Band::Low),
            150_000_000..=174_000_000 => Ok(Band::VeryLow),
            _ => Err(RadioError::FrequencyOutOfRange),
        }
    }

    /// Band select factor B, the VCO runs at B times the carrier
    pub const fn factor(&self) -> u32 {
        match self {
            Band::High => 6,
            Band::Middle => 12,
            Band::Low => 16,
            Band::VeryLow => 32,
        }
    }

    /// Code stored in `SYNT0[2:0]`
    pub fn code(&self) -> u3 {
        u3::new(match self {
            Band::High => 1,
            Band::Middle => 3,
            Band::Low => 4,
            Band::VeryLow => 5,
        })
    }

    pub fn from_code(code: u3) -> Option<Self> {
        match code.value() {
            0 | 1 => Some(Band::High),
            3 => Some(Band::Middle),
            4 => Some(Band::Low),
            5 => Some(Band::VeryLow),
            _ => None,
        }
    }

    /// Carrier frequency above which the high VCO is used
    pub const fn vco_split(&self) -> u32 {
        match self {
            Band::High => 860_166_667,
            Band::Middle => 430_083_334,
            Band::Low => 322_562_500,
            Band::VeryLow => 161_281_250,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vco {
    Low,
    High,
}

pub fn vco_select(center: u32, band: Band) -> Vco {
    if center < band.vco_split() {
        Vco::Low
    } else {
        Vco::High
    }
}

pub const fn digital_clock(xtal: u32, divider: bool) -> u32 {
    if divider {
        xtal / 2
    } else {
        xtal
    }
}

fn synt_denominator(band: Band, refdiv: bool) -> u64 {
    let d = if refdiv { 2 } else { 1 };
    ((band.factor() / 2) as u64 * d) << 18
}

/// 26 bit synthesizer word for a base frequency
pub fn synt_word(base: u32, xtal: u32, refdiv: bool) -> Result<(Band, u26), RadioError> {
    let band = Band::from_frequency(base)?;
    let synt = base as u64 * synt_denominator(band, refdiv) / xtal as u64;
    Ok((band, u26::new(synt as u32 & 0x03FF_FFFF)))
}

pub fn frequency_from_synt(synt: u26, band: Band, xtal: u32, refdiv: bool) -> u32 {
    let den = synt_denominator(band, refdiv);
    ((synt.value() as u64 * xtal as u64 + den / 2) / den) as u32
}

const WCP_VCO_MHZ: [u64; 16] = [
    4644, 4708, 4772, 4836, 4902, 4966, 5030, 5095, 5161, 5232, 5303, 5375, 5448, 5519, 5592, 5663,
];

/// Charge pump current word for the VCO frequency the carrier needs
///
/// The VCO frequency is compared in whole MHz.
pub fn charge_pump_word(center: u32, band: Band) -> u3 {
    let vco = (center / 1_000_000) as u64 * band.factor() as u64;
    let last = WCP_VCO_MHZ.len() - 1;
    let idx = if vco >= WCP_VCO_MHZ[last] {
        last
    } else {
        let mut i = 0;
        while i < last && vco > WCP_VCO_MHZ[i] {
            i += 1;
        }
        if i != 0 && WCP_VCO_MHZ[i] - vco > vco - WCP_VCO_MHZ[i - 1] {
            i - 1
        } else {
            i
        }
    };
    u3::new((idx % 8) as u8)
}

pub fn channel_center(base: u32, offset: i32, space: u32, channel: u8) -> u32 {
    (base as i64 + offset as i64 + space as i64 * channel as i64) as u32
}

/// `CHSPACE`, rounded to the nearest step of `xtal / 2^15`
pub fn channel_space_word(space: u32, xtal: u32) -> Result<u8, RadioError> {
    let word = ((space as u64) << 16).saturating_add(xtal as u64) / (2 * xtal as u64);
    u8::try_from(word).map_err(|_| RadioError::ChannelSpaceOutOfRange)
}

pub fn channel_space_from_word(word: u8, xtal: u32) -> u32 {
    ((xtal as u64 * word as u64 + (1 << 14)) >> 15) as u32
}

/// `FC_OFFSET` word, truncated towards zero
pub fn fc_offset_word(offset: i32, xtal: u32) -> Result<i16, RadioError> {
    let word = ((offset as i64) << 18) / xtal as i64;
    match word {
        -2048..=2047 => Ok(word as i16),
        _ => Err(RadioError::OffsetOutOfRange),
    }
}

pub fn fc_offset_from_word(word: i16, xtal: u32) -> i32 {
    (word as i64 * xtal as i64 / (1 << 18)) as i32
}

pub fn ppm_to_offset(ppm: i32, base: u32) -> i32 {
    (ppm as i64 * base as i64 / 1_000_000) as i32
}

pub fn datarate(m: u8, e: u4, f_dig: u32) -> u32 {
    (((f_dig as u64 * (256 + m as u64)) << e.value()) >> 28) as u32
}

/// Mantissa and exponent of the closest datarate
pub fn datarate_word(rate: u32, f_dig: u32) -> Result<(u8, u4), RadioError> {
    if !(MIN_DATARATE..=MAX_DATARATE).contains(&rate) {
        return Err(RadioError::DatarateOutOfRange);
    }
    let e = (0..=15u8)
        .rev()
        .find(|e| rate >= f_dig >> (20 - e))
        .unwrap_or(0);
    let estimate = ((rate as i64) << (28 - e)) / f_dig as i64 - 256;
    let e = u4::new(e);
    let m = nearest(estimate, 255, |m| datarate(m as u8, e, f_dig), rate);
    Ok((m as u8, e))
}

/// Picks the candidate around `estimate` (within `0..=max`) whose value is
/// closest to `target`, the lower one on ties
fn nearest(estimate: i64, max: i64, value: impl Fn(i64) -> u32, target: u32) -> i64 {
    let mut best = estimate.clamp(0, max);
    for candidate in [estimate - 1, estimate, estimate + 1] {
        if !(0..=max).contains(&candidate) {
            continue;
        }
        if value(candidate).abs_diff(target) < value(best).abs_diff(target) {
            best = candidate;
        }
    }
    best
}

pub fn deviation(m: u3, e: u4, xtal: u32) -> u32 {
    (((xtal as u64 * (8 + m.value() as u64)) << e.value()) >> 19) as u32
}

pub fn max_deviation(xtal: u32) -> u32 {
    deviation(u3::new(7), u4::new(9), xtal)
}

/// Mantissa and exponent of the closest frequency deviation
pub fn deviation_word(fdev: u32, xtal: u32) -> Result<(u3, u4), RadioError> {
    if fdev == 0 || fdev > max_deviation(xtal) {
        return Err(RadioError::DeviationOutOfRange);
    }
    let e = (0..=9u8)
        .map(u4::new)
        .find(|e| fdev < deviation(u3::new(7), *e, xtal))
        .unwrap_or(u4::new(9));
    let mut m = (0..=7u8)
        .map(u3::new)
        .find(|m| fdev < deviation(*m, e, xtal))
        .unwrap_or(u3::new(7));
    if m.value() > 0 {
        let prev = u3::new(m.value() - 1);
        if fdev.abs_diff(deviation(prev, e, xtal)) < fdev.abs_diff(deviation(m, e, xtal)) {
            m = prev;
        }
    }
    Ok((m, e))
}

/// Channel filter bandwidths at a 26MHz digital clock, in 100Hz units,
/// indexed by `M + 9 * E`
const CHANNEL_FILTER_26M: [u16; 90] = [
    8001, 7951, 7684, 7368, 7051, 6709, 6423, 5867, 5414, //
    4509, 4259, 4032, 3808, 3621, 3417, 3254, 2945, 2703, //
    2247, 2124, 2015, 1900, 1807, 1706, 1624, 1471, 1350, //
    1123, 1062, 1005, 950, 903, 853, 812, 735, 675, //
    561, 530, 502, 474, 451, 426, 406, 367, 337, //
    280, 265, 251, 237, 225, 213, 202, 183, 168, //
    140, 132, 125, 118, 112, 106, 101, 91, 84, //
    70, 66, 62, 59, 56, 53, 50, 46, 42, //
    35, 33, 31, 29, 28, 26, 25, 23, 21, //
    17, 16, 15, 14, 14, 13, 12, 11, 10, //
];

fn filter_bandwidth(index: usize, f_dig: u32) -> u32 {
    (CHANNEL_FILTER_26M[index] as u64 * f_dig as u64 / 260_000) as u32
}

pub fn bandwidth(m: u4, e: u4, f_dig: u32) -> u32 {
    let index = (m.value() as usize + 9 * e.value() as usize).min(CHANNEL_FILTER_26M.len() - 1);
    filter_bandwidth(index, f_dig)
}

/// Narrowest and widest accepted requests at a 26MHz digital clock, in Hz
const BANDWIDTH_LIMITS_26M: (u64, u64) = (1_100, 800_100);

/// Mantissa and exponent of the closest channel filter bandwidth
pub fn bandwidth_word(bw: u32, f_dig: u32) -> Result<(u4, u4), RadioError> {
    let last = CHANNEL_FILTER_26M.len() - 1;
    let (min, max) = BANDWIDTH_LIMITS_26M;
    let scaled = bw as u64 * 26_000_000;
    if scaled < min * f_dig as u64 || scaled > max * f_dig as u64 {
        return Err(RadioError::BandwidthOutOfRange);
    }
    let mut i = 0;
    while i < last && bw < filter_bandwidth(i, f_dig) {
        i += 1;
    }
    let i = nearest(i as i64, last as i64, |i| filter_bandwidth(i as usize, f_dig), bw) as u8;
    Ok((u4::new(i % 9), u4::new(i / 9)))
}

/// Piecewise linear fit of the PA register against the output power,
/// `reg = a * dBm + b` over three segments
struct PowerFactors {
    a: [f32; 3],
    b: [f32; 3],
}

const POWER_FACTORS: [PowerFactors; 5] = [
    // 915MHz
    PowerFactors {
        a: [-2.11, -2.11, -2.00],
        b: [25.66, 25.66, 31.28],
    },
    // 868MHz
    PowerFactors {
        a: [-2.04, -2.04, -1.95],
        b: [23.45, 23.45, 27.66],
    },
    // 433MHz
    PowerFactors {
        a: [-3.48, -1.89, -1.92],
        b: [38.45, 27.66, 30.23],
    },
    // 315MHz
    PowerFactors {
        a: [-3.27, -1.80, -1.48],
        b: [35.43, 26.76, 28.31],
    },
    // 169MHz
    PowerFactors {
        a: [-4.18, -1.80, -1.80],
        b: [50.66, 30.04, 30.04],
    },
];

fn power_factors(center: u32) -> Result<&'static PowerFactors, RadioError> {
    Ok(&POWER_FACTORS[match Band::from_frequency(center)? {
        Band::High if center < 900_000_000 => 1,
        Band::High => 0,
        Band::Middle => 2,
        Band::Low => 3,
        Band::VeryLow => 4,
    }])
}

/// PA_POWER slot value for an output power at the given carrier
pub fn pa_level_from_dbm(dbm: f32, center: u32) -> Result<u8, RadioError> {
    let f = power_factors(center)?;
    let segment = |reg: f32| reg / f.a[1] - f.b[1] / f.a[1];
    let j = if dbm > 0.0 && segment(13.0) < dbm {
        0
    } else if dbm <= 0.0 && segment(40.0) > dbm {
        2
    } else {
        1
    };
    let reg = (f.a[j] * dbm + f.b[j]).clamp(1.0, 90.0);
    Ok(reg as u8)
}

pub fn pa_level_to_dbm(reg: u8, center: u32) -> Result<f32, RadioError> {
    let f = power_factors(center)?;
    if reg == 0 || reg > 90 {
        return Ok(PA_OFF_DBM);
    }
    let j = match reg {
        0..=12 => 0,
        13..=40 => 1,
        _ => 2,
    };
    let reg = reg as f32;
    Ok(reg / f.a[j] - f.b[j] / f.a[j])
}

/// IF offset word for the clock driving the block (the crystal for the
/// analog offset, the digital clock for the digital one)
pub fn if_offset_word(clock: u32) -> u8 {
    const NUM: u64 = 3 * 480_140 * 4096;
    let clock = clock as u64;
    ((2 * NUM + clock) / (2 * clock)).saturating_sub(64) as u8
}

pub fn rssi_to_dbm(reg: u8) -> f32 {
    reg as f32 / 2.0 - 130.0
}

pub fn rssi_threshold_word(dbm: i16) -> u8 {
    (2 * (dbm as i32 + 130)).clamp(0, 255) as u8
}
