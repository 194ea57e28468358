use defmt::{info, warn};
use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, channel::Channel};
use embassy_time::Duration;
use esp_hal::{
    gpio::{Input, InputConfig, Pull},
    peripherals::GPIO9,
};

use crate::{MAX_PENDING_PRESSES, MIN_PRESS_MS, drivers::button::Button};

/// Qualifying presses land here for the application to pick up, in order
pub static PRESS_EVENTS: Channel<CriticalSectionRawMutex, Duration, MAX_PENDING_PRESSES> =
    Channel::new();

fn queue_press(held: Duration) {
    if PRESS_EVENTS.try_send(held).is_err() {
        warn!("BUTTON: press queue full, dropping event");
    }
}

#[embassy_executor::task]
pub async fn handle_button(button_pin: GPIO9<'static>) {
    let input = Input::new(button_pin, InputConfig::default().with_pull(Pull::Up));
    let mut button = Button::new(input, Duration::from_millis(MIN_PRESS_MS as u64));
    button.on_pressed(queue_press);
    info!("BUTTON: watching for presses");
    if button.run().await.is_err() {
        defmt::error!("BUTTON: pin failed, task stopped");
    }
}
