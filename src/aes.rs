//! AES-128 coprocessor
//!
//! The key and data registers hold blocks with the first byte at the highest
//! address, every transfer is reversed on the way in and out.

use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    registers::{self, addr, Irq},
    Command, Error, Interface, Result, Spirit1,
};

pub const BLOCK_SIZE: usize = 16;

pub type Block = [u8; BLOCK_SIZE];

/// Reverses the first `data.len()` bytes into a zero-padded register block
fn to_registers(data: &[u8]) -> Block {
    let mut regs = [0; BLOCK_SIZE];
    for (i, b) in data.iter().take(BLOCK_SIZE).enumerate() {
        regs[BLOCK_SIZE - 1 - i] = *b;
    }
    regs
}

fn from_registers(regs: &Block) -> Block {
    let mut data = *regs;
    data.reverse();
    data
}

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Powers the AES engine
    pub fn set_aes(&mut self, enabled: bool) -> Result<(), I, S, P> {
        self.modify::<registers::AnaFuncConf>(|r| r.set_aes_on(enabled))
    }

    pub fn aes_enabled(&mut self) -> Result<bool, I, S, P> {
        Ok(self.read::<registers::AnaFuncConf>()?.aes_on())
    }

    pub fn aes_write_key(&mut self, key: &Block) -> Result<(), I, S, P> {
        self.write_raw(addr::AES_KEY_IN, &to_registers(key))
    }

    pub fn aes_read_key(&mut self) -> Result<Block, I, S, P> {
        let mut regs = [0; BLOCK_SIZE];
        self.read_raw(addr::AES_KEY_IN, &mut regs)?;
        Ok(from_registers(&regs))
    }

    /// Loads up to 16 bytes of input, shorter data is zero-padded
    pub fn aes_write_data(&mut self, data: &[u8]) -> Result<(), I, S, P> {
        if data.len() > BLOCK_SIZE {
            return Err(Error::PayloadTooLong);
        }
        self.write_raw(addr::AES_DATA_IN, &to_registers(data))
    }

    pub fn aes_read_data(&mut self) -> Result<Block, I, S, P> {
        let mut regs = [0; BLOCK_SIZE];
        self.read_raw(addr::AES_DATA_OUT, &mut regs)?;
        Ok(from_registers(&regs))
    }

    /// Sends one of the AES strobes and waits for `AES_END`
    ///
    /// `AES_END` is only unmasked while the engine runs, the previous mask is
    /// restored afterwards.
    fn aes_run(&mut self, cmd: Command) -> Result<(), I, S, P> {
        let mut end = Irq::default();
        end.set_aes_end(true);
        let mask = self.irq_mask()?;
        self.set_irq_mask(mask | end)?;
        trace!("AES {}", cmd);
        let res = match self.command(cmd) {
            Ok(_) => self.poll_irq(end).map(|_| ()),
            Err(e) => Err(e),
        };
        self.set_irq_mask(mask)?;
        res
    }

    /// Encrypts `block` with the loaded key
    pub fn aes_encrypt_block(&mut self, block: &Block) -> Result<Block, I, S, P> {
        self.aes_write_data(block)?;
        self.aes_run(Command::AesEncrypt)?;
        self.aes_read_data()
    }

    /// Derives the decryption key of the loaded encryption key
    ///
    /// The result can be loaded back and used with [`Spirit1::aes_decrypt_block_derived`].
    pub fn aes_derive_decryption_key(&mut self) -> Result<Block, I, S, P> {
        self.aes_run(Command::AesKey)?;
        self.aes_read_data()
    }

    /// Decrypts `block`, deriving the decryption key from the loaded encryption key
    pub fn aes_decrypt_block(&mut self, block: &Block) -> Result<Block, I, S, P> {
        self.aes_write_data(block)?;
        self.aes_run(Command::AesKeyDecrypt)?;
        self.aes_read_data()
    }

    /// Decrypts `block` with an already derived decryption key loaded
    pub fn aes_decrypt_block_derived(&mut self, block: &Block) -> Result<Block, I, S, P> {
        self.aes_write_data(block)?;
        self.aes_run(Command::AesDecrypt)?;
        self.aes_read_data()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_order() {
        let regs = to_registers(&[1, 2, 3]);
        assert_eq!(regs[15], 1);
        assert_eq!(regs[13], 3);
        assert!(regs[..13].iter().all(|&b| b == 0));

        let block: Block = core::array::from_fn(|i| i as u8);
        assert_eq!(from_registers(&to_registers(&block)), block);
    }
}
