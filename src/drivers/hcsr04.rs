use core::sync::atomic::{AtomicU32, Ordering};

use embassy_sync::{blocking_mutex::raw::CriticalSectionRawMutex, signal::Signal};
use embassy_time::{Duration, Instant, with_timeout};
use embedded_hal::{
    delay::DelayNs,
    digital::{InputPin, OutputPin},
};
use embedded_hal_async::digital::Wait;

/// The sensor wants the trigger held low this long before the pulse
const TRIGGER_SETTLE_US: u32 = 10;
/// Width of the trigger pulse itself
const TRIGGER_PULSE_US: u32 = 10;

fn now_us() -> u32 {
    Instant::now().as_micros() as u32
}

/// Echo edge timestamps, shared between the pin watcher and the
/// measuring task.
///
/// The watcher is the sole writer: a rising edge stores the pulse start, a
/// falling edge stores the pulse end and raises `done`. The measuring task
/// reads the timestamps only after `done` fires; the signal orders the
/// handoff. One cycle is in flight at a time, re-armed before every
/// trigger.
pub struct EchoCapture {
    pulse_start: AtomicU32,
    pulse_end: AtomicU32,
    done: Signal<CriticalSectionRawMutex, ()>,
}

impl EchoCapture {
    pub const fn new() -> Self {
        Self {
            pulse_start: AtomicU32::new(0),
            pulse_end: AtomicU32::new(0),
            done: Signal::new(),
        }
    }

    /// Start a fresh cycle: baseline the start timestamp, clear the end
    /// back to its unset sentinel, and drop any stale completion (a late
    /// echo from a timed-out cycle lands here and is forgotten).
    fn arm(&self, now_us: u32) {
        self.pulse_start.store(now_us, Ordering::Relaxed);
        self.pulse_end.store(0, Ordering::Relaxed);
        self.done.reset();
    }

    /// Record one echo edge. Runs on every edge of the echo pin; it does
    /// nothing beyond a timestamp store and, on the falling edge, the
    /// completion signal.
    pub fn record_edge(&self, echo_high: bool, now_us: u32) {
        if echo_high {
            self.pulse_start.store(now_us, Ordering::Relaxed);
        } else {
            self.pulse_end.store(now_us, Ordering::Relaxed);
            self.done.signal(());
        }
    }

    /// Watch the echo pin forever, feeding every edge into the capture.
    /// Returns only if the pin fails; the error is passed on unchanged.
    pub async fn watch<P>(&self, mut echo: P) -> Result<(), P::Error>
    where
        P: Wait + InputPin,
    {
        loop {
            echo.wait_for_any_edge().await?;
            let now = now_us();
            self.record_edge(echo.is_high()?, now);
        }
    }

    /// Pulse width of the armed cycle. Negative means the edges arrived
    /// out of order (stale start or a missed rising edge).
    fn delta_us(&self) -> i32 {
        let start = self.pulse_start.load(Ordering::Relaxed);
        let end = self.pulse_end.load(Ordering::Relaxed);
        end.wrapping_sub(start) as i32
    }
}

/// One ranging result.
///
/// When the echo never came back, or its edges were captured out of
/// order, `out_of_range` is set and `pulse_us` holds the configured
/// timeout, the widest pulse the driver will report. Unit conversions
/// apply either way.
#[derive(Debug, Clone, Copy, PartialEq, defmt::Format)]
pub struct Echo {
    pub out_of_range: bool,
    pub pulse_us: u32,
}

impl Echo {
    /// A cycle whose echo was lost: flagged, reported at the timeout width
    fn lost(timeout_us: u32) -> Self {
        Self {
            out_of_range: true,
            pulse_us: timeout_us,
        }
    }

    /// Distance in whole millimetres
    pub fn mm(&self) -> u32 {
        (self.pulse_us as u64 * 100 / 582) as u32
    }

    /// Distance in centimetres: half the round trip over the speed of
    /// sound (29.1 us/cm)
    pub fn cm(&self) -> f32 {
        (self.pulse_us as f32 / 2.0) / 29.1
    }
}

/// HC-SR04 ultrasonic rangefinder.
///
/// Owns the trigger pin; echo edges arrive through the shared
/// [`EchoCapture`], which a separate task feeds from the echo pin (see
/// `tasks::ranging`). Triggering blocks for ~20 us; waiting for the echo
/// suspends, so the rest of the system keeps running for up to the
/// configured timeout.
///
/// # Parameters
/// * `T` - The trigger output pin
/// * `D` - A blocking microsecond delay for the trigger sequencing
pub struct Hcsr04<'c, T, D> {
    trigger: T,
    delay: D,
    capture: &'c EchoCapture,
    echo_timeout: Duration,
    dist_filter: u32,
}

impl<'c, T, D> Hcsr04<'c, T, D>
where
    T: OutputPin,
    D: DelayNs,
{
    pub fn new(trigger: T, delay: D, capture: &'c EchoCapture, echo_timeout: Duration) -> Self {
        Self {
            trigger,
            delay,
            capture,
            echo_timeout,
            dist_filter: 0,
        }
    }

    /// Trigger the sensor and wait for the echo to complete.
    ///
    /// One measurement is in flight at a time; the exclusive borrow is
    /// what enforces it. Trigger pin errors are returned unchanged.
    pub async fn measure(&mut self) -> Result<Echo, T::Error> {
        self.capture.arm(now_us());

        self.trigger.set_low()?;
        self.delay.delay_us(TRIGGER_SETTLE_US);
        self.trigger.set_high()?;
        self.delay.delay_us(TRIGGER_PULSE_US);
        self.trigger.set_low()?;

        let timeout_us = self.echo_timeout.as_micros() as u32;
        match with_timeout(self.echo_timeout, self.capture.done.wait()).await {
            Ok(()) => {
                let delta = self.capture.delta_us();
                if delta < 0 {
                    return Ok(Echo::lost(timeout_us));
                }
                let delta = delta as u32;
                // Unit-gain fold: ends up tracking the newest sample
                self.dist_filter = self
                    .dist_filter
                    .wrapping_add(delta.wrapping_sub(self.dist_filter));
                Ok(Echo {
                    out_of_range: false,
                    pulse_us: delta,
                })
            }
            Err(_timed_out) => Ok(Echo::lost(timeout_us)),
        }
    }

    /// Measure once and convert to whole millimetres. The flag reports an
    /// out-of-range reading; the sentinel converts like any other pulse.
    pub async fn distance_mm(&mut self) -> Result<(bool, u32), T::Error> {
        let echo = self.measure().await?;
        Ok((echo.out_of_range, echo.mm()))
    }

    /// Measure once and convert to centimetres
    pub async fn distance_cm(&mut self) -> Result<(bool, f32), T::Error> {
        let echo = self.measure().await?;
        Ok((echo.out_of_range, echo.cm()))
    }

    /// The smoothed pulse width carried across measurements
    pub fn filtered_pulse_us(&self) -> u32 {
        self.dist_filter
    }
}
