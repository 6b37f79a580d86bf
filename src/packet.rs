//! BASIC packet format: preamble, sync word, optional length, address and
//! control fields, payload, optional CRC

use bilge::prelude::*;
use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    registers::{
        self, addr,
        packet_control::{CrcMode, PacketFormat},
    },
    Error, Interface, Result, Spirit1,
};

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PacketBasicConfig {
    /// Preamble length in bytes, 1 to 32
    pub preamble_length: u8,
    /// Sync word length in bytes, 1 to 4
    pub sync_length: u8,
    pub sync_words: u32,
    /// Length field sent with each packet, fixed length with `payload_length` otherwise
    pub variable_length: bool,
    /// Width of the length field in bits, 1 to 16
    pub length_width: u8,
    pub crc: CrcMode,
    /// Control field length in bytes, 0 to 4
    pub control_length: u8,
    /// Destination address byte
    pub address_field: bool,
    pub fec: bool,
    pub whitening: bool,
}

impl Default for PacketBasicConfig {
    fn default() -> Self {
        Self {
            preamble_length: 4,
            sync_length: 4,
            sync_words: 0x1A26_35A8,
            variable_length: true,
            length_width: 7,
            crc: CrcMode::Crc16_8005,
            control_length: 0,
            address_field: true,
            fec: false,
            whitening: true,
        }
    }
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AddressConfig {
    pub filter_my_address: bool,
    pub my_address: u8,
    pub filter_multicast: bool,
    pub multicast_address: u8,
    pub filter_broadcast: bool,
    pub broadcast_address: u8,
}

impl Default for AddressConfig {
    fn default() -> Self {
        Self {
            filter_my_address: false,
            my_address: 0x44,
            filter_multicast: false,
            multicast_address: 0xEE,
            filter_broadcast: false,
            broadcast_address: 0xFF,
        }
    }
}

/// Number of bits needed to hold the length of the longest packet
pub fn length_width(max_payload: u16, address_field: bool, control_length: u8) -> u8 {
    let len = max_payload as u32 + address_field as u32 + control_length as u32;
    (32 - len.leading_zeros()).max(1) as u8
}

/// `SYNC4..1` contents, unused leading registers are zeroed
fn sync_registers(sync_words: u32, sync_length: u8) -> [u8; 4] {
    let unused = 4 - sync_length as usize;
    let mut regs = [0; 4];
    for (i, reg) in regs.iter_mut().enumerate().skip(unused) {
        *reg = (sync_words >> (8 * i)) as u8;
    }
    regs
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Selects the BASIC packet format and configures its fields
    ///
    /// Out of range lengths are clamped.
    pub fn packet_basic_init(&mut self, config: &PacketBasicConfig) -> Result<(), I, S, P> {
        self.modify::<registers::Protocol1>(|r| r.set_auto_packet_filter(true))?;
        self.modify::<registers::PacketFilterOptions>(|r| {
            r.set_source_filtering(false);
            r.set_control_filtering(false);
        })?;

        let sync_length = config.sync_length.clamp(1, 4);
        let mut ctrl = registers::PacketControl::default();
        ctrl.set_address_len(u2::new(config.address_field as u8));
        ctrl.set_control_len(u3::new(config.control_length.min(4)));
        ctrl.set_format(PacketFormat::Basic);
        ctrl.set_len_wid(u4::new(config.length_width.clamp(1, 16) - 1));
        ctrl.set_preamble_length(u5::new(config.preamble_length.clamp(1, 32) - 1));
        ctrl.set_sync_length(u2::new(sync_length - 1));
        ctrl.set_variable_length(config.variable_length);
        ctrl.set_crc_mode(config.crc);
        ctrl.set_whitening(config.whitening);
        ctrl.set_fec(config.fec);
        debug!("Packet control {}", ctrl);
        self.write(ctrl)?;

        self.set_crc_filter(config.crc != CrcMode::None)?;
        self.write_raw(addr::SYNC4, &sync_registers(config.sync_words, sync_length))
    }

    pub fn packet_addresses_init(&mut self, config: &AddressConfig) -> Result<(), I, S, P> {
        self.modify::<registers::PacketFilterOptions>(|r| {
            r.set_dest_vs_my_address(config.filter_my_address);
            r.set_dest_vs_multicast(config.filter_multicast);
            r.set_dest_vs_broadcast(config.filter_broadcast);
        })?;
        self.write_raw(
            addr::PCKT_FLT_GOALS_BROADCAST,
            &[
                config.broadcast_address,
                config.multicast_address,
                config.my_address,
            ],
        )
    }

    pub fn packet_control(&mut self) -> Result<registers::PacketControl, I, S, P> {
        self.read::<registers::PacketControl>()
    }

    /// Bytes sent before the payload besides the length field
    fn packet_overhead(&mut self) -> Result<u16, I, S, P> {
        let ctrl = self.packet_control()?;
        Ok((ctrl.address_len().value() > 0) as u16 + ctrl.control_len().value() as u16)
    }

    /// Payload length of the next packet, the address and control fields are added
    pub fn set_payload_length(&mut self, len: u16) -> Result<(), I, S, P> {
        let overhead = self.packet_overhead()?;
        let total = len.checked_add(overhead).ok_or(Error::PayloadTooLong)?;
        self.write(registers::PacketLength::new(total))
    }

    pub fn payload_length(&mut self) -> Result<u16, I, S, P> {
        let overhead = self.packet_overhead()?;
        let len = self.read::<registers::PacketLength>()?.length();
        Ok(len.saturating_sub(overhead))
    }

    /// Sizes the length field for the longest payload expected
    pub fn set_variable_length_width(&mut self, max_payload: u16) -> Result<(), I, S, P> {
        let ctrl = self.packet_control()?;
        let bits = length_width(
            max_payload,
            ctrl.address_len().value() > 0,
            ctrl.control_len().value(),
        );
        self.modify::<registers::PacketControl>(|r| r.set_len_wid(u4::new(bits.min(16) - 1)))
    }

    /// Discard packets with a wrong CRC
    pub fn set_crc_filter(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::PacketFilterOptions>(|r| r.set_crc_check(enabled))
    }

    pub fn set_sync_words(&mut self, sync_words: u32) -> Result<(), I, S, P> {
        let len = self.packet_control()?.sync_length().value() + 1;
        self.write_raw(addr::SYNC4, &sync_registers(sync_words, len))
    }

    /// Destination address of transmitted packets
    pub fn set_destination_address(&mut self, address: u8) -> Result<(), I, S, P> {
        self.write_raw(addr::PCKT_FLT_GOALS_SOURCE_ADDR, &[address])
    }

    pub fn set_my_address(&mut self, address: u8) -> Result<(), I, S, P> {
        self.write_raw(addr::PCKT_FLT_GOALS_TX_ADDR, &[address])
    }

    /// Payload length of the last received packet
    pub fn received_length(&mut self) -> Result<u16, I, S, P> {
        let overhead = self.packet_overhead()?;
        let len = self.read::<registers::RxPacketLength>()?.length();
        Ok(len.saturating_sub(overhead))
    }

    /// Destination address of the last received packet
    pub fn received_destination(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::RxAddress>()?.destination())
    }

    /// Source address of the last received packet, needs a control field
    pub fn received_source(&mut self) -> Result<u8, I, S, P> {
        Ok(self.read::<registers::RxAddress>()?.source())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_words_layout() {
        assert_eq!(sync_registers(0x1A26_35A8, 4), [0xA8, 0x35, 0x26, 0x1A]);
        assert_eq!(sync_registers(0x1A26_35A8, 2), [0x00, 0x00, 0x26, 0x1A]);
    }

    #[test]
    fn length_field_width() {
        assert_eq!(length_width(96, true, 0), 7);
        assert_eq!(length_width(127, false, 0), 7);
        assert_eq!(length_width(127, true, 0), 8);
        assert_eq!(length_width(0, false, 0), 1);
        assert_eq!(length_width(1000, true, 4), 10);
    }
}
