//! Status LED blinking.

use embedded_hal::digital::{OutputPin, PinState};

use crate::timer::IntervalTimer;

/// Blinks the status LED at the interval chosen by the USB lifecycle.
///
/// Each due poll writes the current toggle state and then flips it, so the
/// first write after start-up drives the LED low.
pub struct StatusIndicator<O> {
    led: O,
    timer: IntervalTimer,
    level: bool,
}

impl<O: OutputPin> StatusIndicator<O> {
    #[must_use]
    pub fn new(led: O) -> Self {
        Self {
            led,
            timer: IntervalTimer::new(0),
            level: false,
        }
    }

    /// Run one pass of the blink task with the current interval.
    ///
    /// Returns `true` if the LED was written.
    pub fn poll(&mut self, now_ms: u32, interval_ms: u32) -> bool {
        self.timer.set_interval(interval_ms);
        if !self.timer.poll(now_ms) {
            return false;
        }
        let _ = self.led.set_state(PinState::from(self.level));
        self.level = !self.level;
        true
    }

    /// Drive the LED to a fixed level, bypassing the blink cadence.
    pub fn force(&mut self, on: bool) {
        let _ = self.led.set_state(PinState::from(on));
    }

    /// Timestamp of the last blink period start.
    #[must_use]
    pub fn last_toggle_ms(&self) -> u32 {
        self.timer.last_ms()
    }

    pub fn led(&self) -> &O {
        &self.led
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::convert::Infallible;
    use embedded_hal::digital::ErrorType;
    use std::vec::Vec;

    #[derive(Default)]
    struct RecordingLed {
        writes: Vec<bool>,
    }

    impl ErrorType for RecordingLed {
        type Error = Infallible;
    }

    impl OutputPin for RecordingLed {
        fn set_low(&mut self) -> Result<(), Self::Error> {
            self.writes.push(false);
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Self::Error> {
            self.writes.push(true);
            Ok(())
        }
    }

    #[test]
    fn test_toggles_once_every_ten_polls() {
        let mut indicator = StatusIndicator::new(RecordingLed::default());
        let mut toggles = Vec::new();

        for step in 1..=50u32 {
            let now = step * 100;
            if indicator.poll(now, 1000) {
                toggles.push((step, indicator.last_toggle_ms()));
            }
        }

        assert_eq!(toggles.len(), 5);
        for (i, (step, stamp)) in toggles.iter().enumerate() {
            assert_eq!(*step, (i as u32 + 1) * 10);
            assert_eq!(*stamp, (i as u32 + 1) * 1000);
        }
        assert_eq!(indicator.led().writes, [false, true, false, true, false]);
    }

    #[test]
    fn test_jitter_does_not_accumulate() {
        let mut indicator = StatusIndicator::new(RecordingLed::default());
        // Each poll lands 37 ms after the deadline.
        let mut stamps = Vec::new();
        for n in 1..=4u32 {
            assert!(indicator.poll(n * 1000 + 37, 1000));
            stamps.push(indicator.last_toggle_ms());
        }
        assert_eq!(stamps, [1000, 2000, 3000, 4000]);
    }

    #[test]
    fn test_zero_interval_is_disabled() {
        let mut indicator = StatusIndicator::new(RecordingLed::default());
        for now in (0..10_000).step_by(100) {
            assert!(!indicator.poll(now, 0));
        }
        assert!(indicator.led().writes.is_empty());
    }

    #[test]
    fn test_force_writes_level() {
        let mut indicator = StatusIndicator::new(RecordingLed::default());
        indicator.force(true);
        indicator.force(false);
        assert_eq!(indicator.led().writes, [true, false]);
    }
}
