//! Button lines and the input snapshot built from them.

use core::ops::{BitOr, BitOrAssign};

use crate::config::BUTTON_COUNT;

/// One of the physical button lines of the pad.
///
/// The discriminant is the line's mapping index, which is also the GPIO
/// number it is wired to and the bit it occupies in an [`InputSnapshot`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Button {
    A = 0,
    B = 1,
    X = 2,
    Y = 3,
    Up = 4,
    Down = 5,
    Left = 6,
    Right = 7,
    LB = 8,
    RB = 9,
    Select = 10,
    Start = 11,
}

impl Button {
    /// All lines in sampling order.
    pub const ALL: [Button; BUTTON_COUNT] = [
        Button::A,
        Button::B,
        Button::X,
        Button::Y,
        Button::Up,
        Button::Down,
        Button::Left,
        Button::Right,
        Button::LB,
        Button::RB,
        Button::Select,
        Button::Start,
    ];

    /// Mapping index of this line.
    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// GPIO number this line is wired to.
    #[inline]
    #[must_use]
    pub const fn pin(self) -> u8 {
        self as u8
    }

    #[inline]
    const fn mask(self) -> u32 {
        1 << (self as u32)
    }
}

/// Pressed state of every button line, captured in one sampling pass.
///
/// Bit *i* is set iff the line with mapping index *i* is pressed.
///
/// # Example
///
/// ```
/// use gamepad_core::{Button, InputSnapshot};
///
/// let snapshot = InputSnapshot::from(Button::A) | InputSnapshot::from(Button::Up);
/// assert!(snapshot.is_pressed(Button::A));
/// assert!(snapshot.is_pressed(Button::Up));
/// assert!(!snapshot.is_pressed(Button::B));
/// ```
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct InputSnapshot(pub u32);

impl InputSnapshot {
    /// No button pressed.
    pub const NONE: Self = Self(0);

    /// Check if the given line is pressed.
    #[inline]
    #[must_use]
    pub const fn is_pressed(self, button: Button) -> bool {
        self.0 & button.mask() != 0
    }

    /// Mark a line as pressed or released.
    #[inline]
    pub fn set(&mut self, button: Button, pressed: bool) {
        if pressed {
            self.0 |= button.mask();
        } else {
            self.0 &= !button.mask();
        }
    }

    /// Get the raw mask.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Check if no line is pressed.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl From<Button> for InputSnapshot {
    #[inline]
    fn from(button: Button) -> Self {
        Self(button.mask())
    }
}

impl BitOr for InputSnapshot {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for InputSnapshot {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl FromIterator<Button> for InputSnapshot {
    fn from_iter<I: IntoIterator<Item = Button>>(iter: I) -> Self {
        iter.into_iter()
            .fold(Self::NONE, |acc, button| acc | Self::from(button))
    }
}
