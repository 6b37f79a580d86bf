#![no_main]
#![no_std]

use stm32g4xx_hal as hal;
use spsgrf_demos::CycleDelay;

use spsgrf::{radio::RadioConfig, SpiInterface, Spirit1};
use embedded_hal_bus::spi::{ExclusiveDevice, NoDelay};
use hal::{prelude::*, stm32::Peripherals, pwr::PwrExt, rcc::{Config, SysClockSrc}, time::RateExtU32, spi};

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
    defmt::info!("SPI init done");
    let interface = SpiInterface::new(ExclusiveDevice::new(spi_bus, cs, NoDelay));

    let mut radio = Spirit1::init(interface, sdn, irq, 50_000_000, &mut delay).unwrap();
    radio.radio_init(&RadioConfig::default()).unwrap();

    defmt::info!("Digital clock: {=u32} Hz", radio.digital_clock().unwrap());
    defmt::info!("Base frequency: {=u32} Hz", radio.frequency_base().unwrap());
    defmt::info!("Channel spacing: {=u32} Hz", radio.channel_space().unwrap());
    defmt::info!("Datarate: {=u32} bps", radio.datarate().unwrap());
    defmt::info!("Deviation: {=u32} Hz", radio.frequency_deviation().unwrap());
    defmt::info!("Channel filter: {=u32} Hz", radio.bandwidth().unwrap());
    defmt::info!("State: {}", radio.refresh_status().unwrap().state());

    spsgrf_demos::exit()
}
