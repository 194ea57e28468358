use embassy_time::{Duration, Instant};
use embedded_hal::digital::InputPin;
use embedded_hal_async::digital::Wait;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Released,
    Pressed,
}

/// Press/release state machine over millisecond timestamps.
///
/// Wired for a pull-up input: the pin going low starts a press, the pin
/// going high ends it. Edges that repeat the current state are dropped, so
/// duplicate interrupt deliveries cannot restart or cut short a press.
pub struct Debouncer {
    state: State,
    pressed_at_ms: u32,
    min_press_ms: u32,
}

impl Debouncer {
    pub const fn new(min_press_ms: u32) -> Self {
        Self {
            state: State::Released,
            pressed_at_ms: 0,
            min_press_ms,
        }
    }

    /// Feed one observed pin level. Returns the held duration in
    /// milliseconds once per release that outlasted the bounce threshold.
    ///
    /// Timestamps may wrap; deltas are computed with wrapping arithmetic.
    pub fn update(&mut self, is_low: bool, now_ms: u32) -> Option<u32> {
        match (self.state, is_low) {
            (State::Released, true) => {
                self.pressed_at_ms = now_ms;
                self.state = State::Pressed;
                None
            }
            (State::Pressed, false) => {
                self.state = State::Released;
                let held_ms = now_ms.wrapping_sub(self.pressed_at_ms);
                (held_ms >= self.min_press_ms).then_some(held_ms)
            }
            // Duplicate or out-of-order edge
            _ => None,
        }
    }
}

/// A debounced momentary button on one input pin
pub struct Button<P> {
    input: P,
    debounce: Debouncer,
    on_pressed: Option<fn(Duration)>,
}

impl<P> Button<P>
where
    P: Wait + InputPin,
{
    pub fn new(input: P, min_press: Duration) -> Self {
        Self {
            input,
            debounce: Debouncer::new(min_press.as_millis() as u32),
            on_pressed: None,
        }
    }

    /// Register the handler invoked with the held duration on every
    /// qualifying press. Replaces any previously registered handler.
    pub fn on_pressed(&mut self, handler: fn(Duration)) {
        self.on_pressed = Some(handler);
    }

    /// Wait for the next press that outlasts the bounce threshold and
    /// return how long it was held. Pin errors are returned unchanged.
    pub async fn wait_for_press(&mut self) -> Result<Duration, P::Error> {
        loop {
            self.input.wait_for_any_edge().await?;
            let now_ms = Instant::now().as_millis() as u32;
            let is_low = self.input.is_low()?;
            if let Some(held_ms) = self.debounce.update(is_low, now_ms) {
                return Ok(Duration::from_millis(held_ms as u64));
            }
        }
    }

    /// Run the button forever, invoking the registered handler per
    /// qualifying press. Returns only if the pin fails.
    pub async fn run(&mut self) -> Result<(), P::Error> {
        loop {
            let held = self.wait_for_press().await?;
            if let Some(handler) = self.on_pressed {
                handler(held);
            }
        }
    }
}
