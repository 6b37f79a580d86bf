#![no_main]
#![no_std]

use stm32g4xx_hal as hal;
use spsgrf_demos::CycleDelay;

use spsgrf::{
    spsgrf::{Event, Spsgrf, SpsgrfConfig},
    SpiInterface,
};
use embedded_hal::delay::DelayNs;
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use hal::{prelude::*, stm32::Peripherals, pwr::PwrExt, rcc::{Config, SysClockSrc}, time::RateExtU32, spi};

/// Address of the node listening with the `rx` demo
const DESTINATION: u8 = 0x44;

#[cortex_m_rt::entry]
fn main() -> ! {
    let dp = Peripherals::take().unwrap();
    let rcc = dp.RCC.constrain();
    let pwr = dp.PWR.constrain().freeze();
    let mut rcc = rcc.freeze(Config::new(SysClockSrc::HSE(24.MHz())), pwr);
    let mut delay = CycleDelay::new(24_000_000);

    let gpioa = dp.GPIOA.split(&mut rcc);
    let gpiob = dp.GPIOB.split(&mut rcc);
    let gpioc = dp.GPIOC.split(&mut rcc);

    let sck = gpioa.pa5.into_alternate();
    let miso = gpioa.pa6.into_alternate();
    let mosi = gpioa.pa7.into_alternate();

    let irq = gpioc.pc7.into_pull_up_input();
    let sdn = gpioa.pa10.into_push_pull_output();
    let mut cs = gpiob.pb6.into_push_pull_output();
    cs.set_high().unwrap();

    let spi_bus = dp.SPI1.spi((sck, miso, mosi), spi::MODE_0, 4.MHz(), &mut rcc);
    let interface = SpiInterface::new(ExclusiveDevice::new(spi_bus, cs, NoDelay));

    let config = SpsgrfConfig {
        addresses: spsgrf::packet::AddressConfig {
            my_address: 0x33,
            ..Default::default()
        },
        ..Default::default()
    };
    let mut module = Spsgrf::new(interface, sdn, irq, &mut delay, &config).unwrap();

    let mut counter = 0u8;
    loop {
        let mut msg = *b"hello spirit #0";
        msg[14] = b'0' + counter % 10;
        module.start_tx(DESTINATION, &msg).unwrap();
        match module.wait_event().unwrap() {
            Event::TxDone => defmt::info!("Sent {=[u8]:a}", &msg[..]),
            other => defmt::warn!("Unexpected event {}", other),
        }
        counter = counter.wrapping_add(1);
        delay.delay_ms(1000);
    }
}
