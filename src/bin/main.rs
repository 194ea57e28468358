#![no_std]
#![no_main]
#![deny(
    clippy::mem_forget,
    reason = "mem::forget is generally not safe to do with esp_hal types, especially those \
    holding buffers for the duration of a data transfer."
)]

use defmt::{info, warn};
use embassy_executor::Spawner;
use embassy_futures::select::{Either, select};
use embassy_time::{Duration, Ticker};
use esp_hal::{
    Config,
    clock::CpuClock,
    delay::Delay,
    gpio::{Level, Output, OutputConfig},
    timer::systimer::SystemTimer,
};
use hcsr04_ranger::{
    ECHO_TIMEOUT_US, RANGE_POLL_MS,
    drivers::hcsr04::{EchoCapture, Hcsr04},
    tasks::{PRESS_EVENTS, handle_button, watch_echo},
};
use panic_rtt_target as _;
use static_cell::StaticCell;

/// Echo edge capture shared between the watcher task and the sensor
static ECHO_CAPTURE: StaticCell<EchoCapture> = StaticCell::new();

// This creates a default app-descriptor required by the esp-idf bootloader.
// For more information see: <https://docs.espressif.com/projects/esp-idf/en/stable/esp32/api-reference/system/app_image_format.html#application-description>
esp_bootloader_esp_idf::esp_app_desc!();

#[esp_hal_embassy::main]
async fn main(spawner: Spawner) {
    #[cfg(all(feature = "rtt", feature = "defmt"))]
    rtt_target::rtt_init_defmt!();

    let peripherals = esp_hal::init(Config::default().with_cpu_clock(CpuClock::max()));
    let timer0 = SystemTimer::new(peripherals.SYSTIMER);
    esp_hal_embassy::init(timer0.alarm0);

    let capture: &'static EchoCapture = ECHO_CAPTURE.init(EchoCapture::new());

    spawner
        .spawn(handle_button(peripherals.GPIO9))
        .expect("Failed to spawn button task");
    spawner
        .spawn(watch_echo(peripherals.GPIO5, capture))
        .expect("Failed to spawn echo capture task");

    let trigger = Output::new(peripherals.GPIO4, Level::Low, OutputConfig::default());
    let mut sensor = Hcsr04::new(
        trigger,
        Delay::new(),
        capture,
        Duration::from_micros(ECHO_TIMEOUT_US),
    );

    info!("MAIN: starting ranging loop");
    let mut ranging = true;
    let mut poll = Ticker::every(Duration::from_millis(RANGE_POLL_MS));
    loop {
        match select(PRESS_EVENTS.receive(), poll.next()).await {
            Either::First(held) => {
                ranging ^= true;
                info!(
                    "MAIN: button held {} ms, ranging {}",
                    held.as_millis(),
                    ranging
                );
            }
            Either::Second(()) => {
                if !ranging {
                    continue;
                }
                let echo = sensor.measure().await.expect("trigger pin failed");
                if echo.out_of_range {
                    warn!("MAIN: no echo within {} us", echo.pulse_us);
                } else {
                    info!("MAIN: distance {} mm ({} us pulse)", echo.mm(), echo.pulse_us);
                }
            }
        }
    }
}
