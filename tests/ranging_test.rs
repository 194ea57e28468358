#![no_std]
#![no_main]

#[cfg(test)]
#[embedded_test::tests]
mod tests {
    use core::convert::Infallible;

    use embassy_futures::{block_on, join::join};
    use embassy_time::{Duration, Instant};
    use embedded_hal::{delay::DelayNs, digital::OutputPin};
    use esp_hal::timer::systimer::SystemTimer;
    use hcsr04_ranger::drivers::hcsr04::{Echo, EchoCapture, Hcsr04};

    struct TriggerMock;

    impl embedded_hal::digital::ErrorType for TriggerMock {
        type Error = Infallible;
    }

    impl OutputPin for TriggerMock {
        fn set_high(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
        fn set_low(&mut self) -> Result<(), Self::Error> {
            Ok(())
        }
    }

    struct DelayMock;

    impl DelayNs for DelayMock {
        fn delay_ns(&mut self, _ns: u32) {}
    }

    #[init]
    fn init() {
        rtt_target::rtt_init_defmt!();
        let peripherals = esp_hal::init(esp_hal::Config::default());
        let timer0 = SystemTimer::new(peripherals.SYSTIMER);
        esp_hal_embassy::init(timer0.alarm0);
    }

    #[test]
    fn pulse_width_converts_to_mm() {
        let echo = Echo {
            out_of_range: false,
            pulse_us: 5_820,
        };
        assert_eq!(echo.mm(), 1_000);
    }

    #[test]
    fn pulse_width_converts_to_cm() {
        let echo = Echo {
            out_of_range: false,
            pulse_us: 582,
        };
        let cm = echo.cm();
        assert!(cm > 9.999 && cm < 10.001);
    }

    #[test]
    fn measure_reports_echo_width() {
        static CAPTURE: EchoCapture = EchoCapture::new();
        let mut sensor = Hcsr04::new(
            TriggerMock,
            DelayMock,
            &CAPTURE,
            Duration::from_micros(30_000),
        );

        let (reading, ()) = block_on(join(sensor.measure(), async {
            CAPTURE.record_edge(true, 10_000);
            CAPTURE.record_edge(false, 12_000);
        }));
        let echo = reading.unwrap();

        assert!(!echo.out_of_range);
        assert_eq!(echo.pulse_us, 2_000);
        assert_eq!(sensor.filtered_pulse_us(), 2_000);
    }

    #[test]
    fn filter_tracks_newest_sample() {
        static CAPTURE: EchoCapture = EchoCapture::new();
        let mut sensor = Hcsr04::new(
            TriggerMock,
            DelayMock,
            &CAPTURE,
            Duration::from_micros(30_000),
        );

        let (reading, ()) = block_on(join(sensor.measure(), async {
            CAPTURE.record_edge(true, 1_000);
            CAPTURE.record_edge(false, 3_000);
        }));
        assert_eq!(reading.unwrap().pulse_us, 2_000);
        assert_eq!(sensor.filtered_pulse_us(), 2_000);

        let (reading, ()) = block_on(join(sensor.measure(), async {
            CAPTURE.record_edge(true, 10_000);
            CAPTURE.record_edge(false, 12_500);
        }));
        assert_eq!(reading.unwrap().pulse_us, 2_500);
        assert_eq!(sensor.filtered_pulse_us(), 2_500);
    }

    #[test]
    fn inverted_capture_is_out_of_range() {
        static CAPTURE: EchoCapture = EchoCapture::new();
        let mut sensor = Hcsr04::new(
            TriggerMock,
            DelayMock,
            &CAPTURE,
            Duration::from_micros(30_000),
        );

        // Falling stamp behind the rising stamp, as a missed edge leaves it
        let (reading, ()) = block_on(join(sensor.measure(), async {
            CAPTURE.record_edge(true, 12_000);
            CAPTURE.record_edge(false, 10_000);
        }));
        let echo = reading.unwrap();

        assert!(echo.out_of_range);
        assert_eq!(echo.pulse_us, 30_000);
    }

    #[test]
    fn no_echo_times_out_with_sentinel() {
        static CAPTURE: EchoCapture = EchoCapture::new();
        let mut sensor = Hcsr04::new(
            TriggerMock,
            DelayMock,
            &CAPTURE,
            Duration::from_micros(2_000),
        );

        let started = Instant::now();
        let echo = block_on(sensor.measure()).unwrap();

        assert!(echo.out_of_range);
        assert_eq!(echo.pulse_us, 2_000);
        assert!(started.elapsed() >= Duration::from_micros(2_000));
    }

    #[test]
    fn timeout_converts_like_any_pulse() {
        static CAPTURE: EchoCapture = EchoCapture::new();
        let mut sensor = Hcsr04::new(
            TriggerMock,
            DelayMock,
            &CAPTURE,
            Duration::from_micros(2_000),
        );

        let (out_of_range, mm) = block_on(sensor.distance_mm()).unwrap();
        assert!(out_of_range);
        assert_eq!(mm, 343);
    }

    #[test]
    fn late_echo_does_not_corrupt_next_cycle() {
        static CAPTURE: EchoCapture = EchoCapture::new();
        let mut sensor = Hcsr04::new(
            TriggerMock,
            DelayMock,
            &CAPTURE,
            Duration::from_micros(1_000),
        );

        let echo = block_on(sensor.measure()).unwrap();
        assert!(echo.out_of_range);

        // The echo finally lands after the cycle was abandoned
        CAPTURE.record_edge(false, 500);

        // Re-arming must discard it; with no new edges this times out too
        let echo = block_on(sensor.measure()).unwrap();
        assert!(echo.out_of_range);
    }
}
