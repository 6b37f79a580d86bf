#![no_main]
#![no_std]

use stm32g4xx_hal as hal;
use spsgrf_demos::CycleDelay;

use spsgrf::nor::{mx25lm51245g, selftest::{self, StatusSink}, Mx25lm51245g, NorFlash};
use embedded_hal_bus::spi::ExclusiveDevice;
use hal::{prelude::*, stm32::Peripherals, pwr::PwrExt, rcc::{Config, SysClockSrc}, time::RateExtU32, spi};

/// Prints the self-test progress over RTT
struct Console;

impl StatusSink for Console {
    fn step(&mut self, name: &str) {
        defmt::info!("{=str}...", name);
    }

    fn passed(&mut self) {
        defmt::info!("  OK");
    }

    fn failed(&mut self, reason: &str) {
        defmt::error!("  FAILED: {=str}", reason);
    }
}

#[cortex_m_rt::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();
    let rcc = dp.RCC.constrain();
    let pwr = dp.PWR.constrain().freeze();
    let mut rcc = rcc.freeze(Config::new(SysClockSrc::HSE(24.MHz())), pwr);

    let gpiob = dp.GPIOB.split(&mut rcc);

    let sck = gpiob.pb13.into_alternate();
    let miso = gpiob.pb14.into_alternate();
    let mosi = gpiob.pb15.into_alternate();
    let mut cs = gpiob.pb12.into_push_pull_output();
    cs.set_high().unwrap();

    let spi_bus = dp.SPI2.spi((sck, miso, mosi), spi::MODE_0, 8.MHz(), &mut rcc);
    let device = ExclusiveDevice::new(spi_bus, cs, CycleDelay::new(24_000_000));
    let mut flash = Mx25lm51245g::new(device, CycleDelay::new(24_000_000)).unwrap();
    defmt::info!("Status register: {}", flash.status().unwrap());

    match selftest::run(&mut flash, &mx25lm51245g::GEOMETRY, &mut Console) {
        Ok(()) => defmt::info!("NOR self-test passed"),
        Err(e) => defmt::error!("NOR self-test failed at {=str}", e.step().name()),
    }

    spsgrf_demos::exit()
}
