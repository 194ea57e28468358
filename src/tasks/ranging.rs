use defmt::info;
use esp_hal::{
    gpio::{Input, InputConfig},
    peripherals::GPIO5,
};

use crate::drivers::hcsr04::EchoCapture;

/// Feed every echo edge into the shared capture. The sensor drives the
/// pin, so no pull is configured.
#[embassy_executor::task]
pub async fn watch_echo(echo_pin: GPIO5<'static>, capture: &'static EchoCapture) {
    let echo = Input::new(echo_pin, InputConfig::default());
    info!("RANGING: watching echo pin");
    if capture.watch(echo).await.is_err() {
        defmt::error!("RANGING: echo pin failed, task stopped");
    }
}
