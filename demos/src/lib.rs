#![no_std]

use defmt_rtt as _;
use embedded_hal::delay::DelayNs;
use panic_probe as _;

// same panicking *behavior* as `panic-probe` but doesn't print a panic message
// this prevents the panic message being printed *twice* when `defmt::panic` is invoked
#[defmt::panic_handler]
fn panic() -> ! {
    cortex_m::asm::udf()
}

/// Terminates the application and makes `probe-rs` exit with exit-code = 0
pub fn exit() -> ! {
    loop {
        cortex_m_semihosting::debug::exit(cortex_m_semihosting::debug::EXIT_SUCCESS);
    }
}

/// Busy-wait delay counting core cycles
pub struct CycleDelay {
    sysclk: u32,
}

impl CycleDelay {
    pub fn new(sysclk: u32) -> Self {
        Self { sysclk }
    }
}

impl DelayNs for CycleDelay {
    fn delay_ns(&mut self, ns: u32) {
        let cycles = self.sysclk as u64 * ns as u64 / 1_000_000_000;
        cortex_m::asm::delay(cycles as u32 + 1);
    }
}
