use embedded_hal::digital::{InputPin, OutputPin};

use crate::{
    registers::{self, Irq},
    Error, Interface, Result, Spirit1, IRQ_POLL_LIMIT,
};

impl<I: Interface, S: OutputPin, P: InputPin> Spirit1<I, S, P> {
    /// Replaces the whole interrupt mask, set bits are routed to the IRQ pin
    pub fn set_irq_mask(&mut self, irq: Irq) -> Result<(), I, S, P> {
        self.write(registers::IrqMask::new(irq))
    }

    pub fn irq_mask(&mut self) -> Result<Irq, I, S, P> {
        Ok(self.read::<registers::IrqMask>()?.irq())
    }

    pub fn enable_irqs(&mut self, irq: Irq) -> Result<(), I, S, P> {
        self.modify::<registers::IrqMask>(|r| r.set_irq(r.irq() | irq))
    }

    pub fn disable_irqs(&mut self, irq: Irq) -> Result<(), I, S, P> {
        self.modify::<registers::IrqMask>(|r| {
            r.set_irq(Irq::from(u32::from(r.irq()) & !u32::from(irq)))
        })
    }

    /// Reads the pending interrupts, which also clears them
    pub fn read_irqs(&mut self) -> Result<Irq, I, S, P> {
        let irq = self.read::<registers::IrqStatus>()?.irq();
        trace!("IRQ status {=u32:#010X}", u32::from(irq));
        Ok(irq)
    }

    pub fn clear_irqs(&mut self) -> Result<(), I, S, P> {
        self.read_irqs()?;
        Ok(())
    }

    /// True while the chip holds its IRQ output low
    pub fn irq_pending(&mut self) -> Result<bool, I, S, P> {
        self.irq.is_low().map_err(Error::Irq)
    }

    /// Spins on the IRQ pin until one of the requested interrupts fires
    ///
    /// Returns every interrupt that was pending, they are cleared.
    pub fn wait_for_irq(&mut self, irq: Irq) -> Result<Irq, I, S, P> {
        trace!("Waiting for IRQs {=u32:#010X}", u32::from(irq));
        loop {
            while !self.irq_pending()? {
                core::hint::spin_loop()
            }
            let firing = self.read_irqs()?;
            if firing.intersects(irq) {
                break Ok(firing);
            }
        }
    }

    /// Polls `IRQ_STATUS` until one of the requested interrupts is flagged
    ///
    /// Doesn't need the IRQ pin, but the interrupts must be unmasked.
    pub fn poll_irq(&mut self, irq: Irq) -> Result<Irq, I, S, P> {
        for _ in 0..IRQ_POLL_LIMIT {
            let firing = self.read_irqs()?;
            if firing.intersects(irq) {
                return Ok(firing);
            }
        }
        warn!("Timed out polling IRQs {=u32:#010X}", u32::from(irq));
        Err(Error::IrqTimeout)
    }
}
