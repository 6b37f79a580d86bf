//! Simulated SPIRIT1 register file and pins for the driver tests
#![allow(dead_code)]

use core::convert::Infallible;

use embedded_hal::{delay::DelayNs, digital};
use spsgrf::{Command, Interface, State, Status, FIFO_SIZE};

pub const IRQ_TX_DATA_SENT: u32 = 1 << 2;
pub const IRQ_RX_DATA_READY: u32 = 1 << 0;
pub const IRQ_AES_END: u32 = 1 << 30;

const MC_STATE: u8 = 0xC0;
const RX_PCKT_LEN: u8 = 0xC9;
const RX_ADDR_FIELD1: u8 = 0xD2;
const VCO_CALIBR_OUT0: u8 = 0xE5;
const LINEAR_FIFO_STATUS: u8 = 0xE6;
const IRQ_STATUS: u8 = 0xFA;
const AES_KEY_IN: usize = 0x70;
const AES_DATA_IN: usize = 0x80;
const AES_DATA_OUT: usize = 0xD4;

/// Incoming packet delivered on the next RX strobe
pub struct Packet {
    pub source: u8,
    pub destination: u8,
    pub payload: Vec<u8>,
}

pub struct FakeSpirit {
    pub regs: [u8; 256],
    pub state: State,
    /// Ignore state changing commands
    pub frozen: bool,
    /// LOCKTX/LOCKRX end in the lock failed state
    pub lock_fails: bool,
    pub vco_words: (u8, u8),
    pub irq_pending: u32,
    pub tx_fifo: Vec<u8>,
    pub rx_fifo: Vec<u8>,
    pub sent: Vec<Vec<u8>>,
    pub incoming: Option<Packet>,
    pub commands: Vec<Command>,
    pub writes: Vec<(u8, Vec<u8>)>,
}

impl Default for FakeSpirit {
    fn default() -> Self {
        let mut regs = [0; 256];
        // DEVICE_INFO1..0
        regs[0xF0] = 0x01;
        regs[0xF1] = 0x30;
        Self {
            regs,
            state: State::Ready,
            frozen: false,
            lock_fails: false,
            vco_words: (0x45, 0x46),
            irq_pending: 0,
            tx_fifo: Vec::new(),
            rx_fifo: Vec::new(),
            sent: Vec::new(),
            incoming: None,
            commands: Vec::new(),
            writes: Vec::new(),
        }
    }
}

fn xor_block(a: &[u8], b: &[u8]) -> Vec<u8> {
    a.iter().zip(b).map(|(x, y)| x ^ y).collect()
}

impl FakeSpirit {
    pub fn status(&self) -> Status {
        Status::new(
            true,
            self.state,
            false,
            self.rx_fifo.is_empty(),
            self.tx_fifo.len() >= FIFO_SIZE,
            false,
        )
    }

    pub fn reg16(&self, addr: u8) -> u16 {
        u16::from_be_bytes([self.regs[addr as usize], self.regs[addr as usize + 1]])
    }

    pub fn regs_at(&self, addr: u8, len: usize) -> &[u8] {
        &self.regs[addr as usize..addr as usize + len]
    }

    /// Addresses written, in order
    pub fn written(&self) -> Vec<u8> {
        self.writes.iter().map(|(a, _)| *a).collect()
    }

    fn read_byte(&self, addr: u8) -> u8 {
        let status = self.status().to_be_bytes();
        match addr {
            MC_STATE => status[0],
            0xC1 => status[1],
            LINEAR_FIFO_STATUS => self.tx_fifo.len() as u8,
            0xE7 => self.rx_fifo.len() as u8,
            IRQ_STATUS..=0xFD => self.irq_pending.to_be_bytes()[(addr - IRQ_STATUS) as usize],
            a => self.regs[a as usize],
        }
    }

    fn set_state(&mut self, state: State) {
        if !self.frozen {
            self.state = state;
        }
    }

    fn lock(&mut self, word: u8) {
        if self.lock_fails {
            self.set_state(State::LockFailed);
        } else {
            self.regs[VCO_CALIBR_OUT0 as usize] = word;
            self.set_state(State::Lock);
        }
    }

    fn aes(&mut self, out: Vec<u8>) {
        self.regs[AES_DATA_OUT..AES_DATA_OUT + 16].copy_from_slice(&out);
        self.irq_pending |= IRQ_AES_END;
    }

    fn receive(&mut self) {
        if let Some(packet) = self.incoming.take() {
            let len = packet.payload.len() as u16 + 1;
            self.regs[RX_PCKT_LEN as usize..RX_PCKT_LEN as usize + 2]
                .copy_from_slice(&len.to_be_bytes());
            self.regs[RX_ADDR_FIELD1 as usize] = packet.source;
            self.regs[RX_ADDR_FIELD1 as usize + 1] = packet.destination;
            self.rx_fifo = packet.payload;
            self.irq_pending |= IRQ_RX_DATA_READY;
            self.set_state(State::Ready);
        }
    }
}

impl Interface for FakeSpirit {
    type Error = Infallible;

    fn register_write(&mut self, addr: u8, buf: &[u8]) -> Result<Status, Self::Error> {
        self.writes.push((addr, buf.to_vec()));
        let start = addr as usize;
        self.regs[start..start + buf.len()].copy_from_slice(buf);
        Ok(self.status())
    }

    fn register_read(&mut self, addr: u8, buf: &mut [u8]) -> Result<Status, Self::Error> {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.read_byte(addr.wrapping_add(i as u8));
        }
        let touched = addr as usize..addr as usize + buf.len();
        if touched.contains(&(IRQ_STATUS as usize)) {
            self.irq_pending = 0;
        }
        Ok(self.status())
    }

    fn fifo_write(&mut self, buf: &[u8]) -> Result<Status, Self::Error> {
        self.tx_fifo.extend_from_slice(buf);
        Ok(self.status())
    }

    fn fifo_read(&mut self, buf: &mut [u8]) -> Result<Status, Self::Error> {
        let n = buf.len().min(self.rx_fifo.len());
        buf[..n].copy_from_slice(&self.rx_fifo[..n]);
        self.rx_fifo.drain(..n);
        Ok(self.status())
    }

    fn command(&mut self, cmd: Command) -> Result<Status, Self::Error> {
        self.commands.push(cmd);
        match cmd {
            Command::SoftReset | Command::Ready | Command::Sabort => self.set_state(State::Ready),
            Command::Standby => self.set_state(State::Standby),
            Command::Sleep => self.set_state(State::Sleep),
            Command::LockTx => self.lock(self.vco_words.0),
            Command::LockRx => self.lock(self.vco_words.1),
            Command::Tx => {
                self.sent.push(core::mem::take(&mut self.tx_fifo));
                self.irq_pending |= IRQ_TX_DATA_SENT;
            }
            Command::Rx => {
                self.set_state(State::Rx);
                self.receive();
            }
            Command::FlushTxFifo => self.tx_fifo.clear(),
            Command::FlushRxFifo => self.rx_fifo.clear(),
            Command::AesEncrypt | Command::AesKeyDecrypt | Command::AesDecrypt => {
                let out = xor_block(
                    &self.regs[AES_DATA_IN..AES_DATA_IN + 16],
                    &self.regs[AES_KEY_IN..AES_KEY_IN + 16],
                );
                self.aes(out)
            }
            Command::AesKey => {
                let out = self.regs[AES_KEY_IN..AES_KEY_IN + 16]
                    .iter()
                    .map(|b| !b)
                    .collect();
                self.aes(out)
            }
            _ => {}
        }
        Ok(self.status())
    }
}

/// Shutdown pin, remembers its level
#[derive(Default)]
pub struct FakeSdn {
    pub high: bool,
}

impl digital::ErrorType for FakeSdn {
    type Error = Infallible;
}

impl digital::OutputPin for FakeSdn {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}

/// IRQ pin stuck at a level
pub struct FakeIrq {
    pub low: bool,
}

impl digital::ErrorType for FakeIrq {
    type Error = Infallible;
}

impl digital::InputPin for FakeIrq {
    fn is_high(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.low)
    }

    fn is_low(&mut self) -> Result<bool, Self::Error> {
        Ok(self.low)
    }
}

pub struct NoDelay;

impl DelayNs for NoDelay {
    fn delay_ns(&mut self, _ns: u32) {}
}

pub type Radio = spsgrf::Spirit1<FakeSpirit, FakeSdn, FakeIrq>;

pub fn radio_with(fake: FakeSpirit) -> Radio {
    spsgrf::Spirit1::init(
        fake,
        FakeSdn::default(),
        FakeIrq { low: true },
        50_000_000,
        &mut NoDelay,
    )
    .unwrap()
}
