//! Input sampler: turns active-low button lines into an [`InputSnapshot`].

use embedded_hal::digital::InputPin;

use crate::buttons::{Button, InputSnapshot};
use crate::config::BUTTON_COUNT;

/// Source of button snapshots.
///
/// Implemented by [`InputSampler`] for real pins; tests substitute scripted
/// sources.
pub trait SnapshotSource {
    /// Read every line once and return the pressed mask.
    fn sample(&mut self) -> InputSnapshot;
}

/// Samples the 12 button lines.
///
/// Pins must already be configured as inputs with the internal pull-up
/// enabled, so that an open switch reads high and a closed one reads low.
/// `pins[i]` is the line with mapping index `i` (see [`Button::ALL`]).
pub struct InputSampler<P> {
    pins: [P; BUTTON_COUNT],
}

impl<P: InputPin> InputSampler<P> {
    /// Create a sampler from pins ordered by mapping index.
    #[must_use]
    pub fn new(pins: [P; BUTTON_COUNT]) -> Self {
        Self { pins }
    }
}

impl<P: InputPin> SnapshotSource for InputSampler<P> {
    fn sample(&mut self) -> InputSnapshot {
        let mut snapshot = InputSnapshot::NONE;
        for (button, pin) in Button::ALL.iter().zip(self.pins.iter_mut()) {
            // Active low. A failed read counts as released.
            snapshot.set(*button, pin.is_low().unwrap_or(false));
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use core::cell::Cell;
    use core::convert::Infallible;
    use embedded_hal::digital::{ErrorKind, ErrorType};
    use std::rc::Rc;

    /// Pin whose level is driven by a shared word, one bit per line.
    struct WordPin {
        levels: Rc<Cell<u32>>,
        bit: u32,
    }

    impl ErrorType for WordPin {
        type Error = Infallible;
    }

    impl InputPin for WordPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.levels.get() & (1 << self.bit) != 0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            self.is_high().map(|high| !high)
        }
    }

    fn word_pins(levels: &Rc<Cell<u32>>) -> [WordPin; BUTTON_COUNT] {
        core::array::from_fn(|i| WordPin {
            levels: levels.clone(),
            bit: i as u32,
        })
    }

    #[test]
    fn test_all_level_combinations_are_inverted() {
        let levels = Rc::new(Cell::new(0));
        let mut sampler = InputSampler::new(word_pins(&levels));

        for raw in 0u32..(1 << BUTTON_COUNT) {
            levels.set(raw);
            let snapshot = sampler.sample();
            for i in 0..BUTTON_COUNT {
                let level_high = raw & (1 << i) != 0;
                let pressed = snapshot.raw() & (1 << i) != 0;
                assert_eq!(pressed, !level_high, "levels {raw:#05x}, line {i}");
            }
            assert_eq!(snapshot.raw() >> BUTTON_COUNT, 0);
        }
    }

    #[test]
    fn test_all_released_when_pulled_up() {
        let levels = Rc::new(Cell::new(0xFFF));
        let mut sampler = InputSampler::new(word_pins(&levels));
        assert!(sampler.sample().is_empty());
    }

    #[test]
    fn test_single_pressed_line() {
        let levels = Rc::new(Cell::new(0xFFF & !(1 << Button::Start.index())));
        let mut sampler = InputSampler::new(word_pins(&levels));
        assert_eq!(sampler.sample(), InputSnapshot::from(Button::Start));
    }

    struct FaultyPin;

    #[derive(Debug)]
    struct Fault;

    impl embedded_hal::digital::Error for Fault {
        fn kind(&self) -> ErrorKind {
            ErrorKind::Other
        }
    }

    impl ErrorType for FaultyPin {
        type Error = Fault;
    }

    impl InputPin for FaultyPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Err(Fault)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Err(Fault)
        }
    }

    #[test]
    fn test_read_failure_counts_as_released() {
        let mut sampler = InputSampler::new(core::array::from_fn(|_| FaultyPin));
        assert!(sampler.sample().is_empty());
    }
}
