//! HID gamepad report encoding.
//!
//! A [`GamepadReport`] is built from an [`InputSnapshot`] and serialized as
//! `[hat, buttons]`. The transport prepends the report id, giving the 3-byte
//! input report declared by the firmware's HID report descriptor.

use core::ops::{BitOr, BitOrAssign};

use crate::buttons::{Button, InputSnapshot};

/// Hat switch position.
///
/// Values 1..=8 run clockwise from up; 0 lies outside the descriptor's
/// logical range and is reported by the host as the null (centered) state.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Hat {
    #[default]
    Centered = 0,
    Up = 1,
    UpRight = 2,
    Right = 3,
    DownRight = 4,
    Down = 5,
    DownLeft = 6,
    Left = 7,
    UpLeft = 8,
}

/// How simultaneous directional presses are resolved into one [`Hat`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DpadPolicy {
    /// Diagonals first (up+right, up+left, down+right, down+left), then
    /// up, down, left, right.
    DiagonalAware,
    /// Up, then down, then left, then right; the first pressed wins and
    /// diagonals collapse onto that cardinal.
    CardinalPriority,
}

impl DpadPolicy {
    /// Resolve the directional lines of `snapshot` into a hat position.
    #[must_use]
    pub fn resolve(self, snapshot: InputSnapshot) -> Hat {
        let up = snapshot.is_pressed(Button::Up);
        let down = snapshot.is_pressed(Button::Down);
        let left = snapshot.is_pressed(Button::Left);
        let right = snapshot.is_pressed(Button::Right);

        match self {
            DpadPolicy::DiagonalAware => match (up, down, left, right) {
                (true, _, _, true) => Hat::UpRight,
                (true, _, true, _) => Hat::UpLeft,
                (_, true, _, true) => Hat::DownRight,
                (_, true, true, _) => Hat::DownLeft,
                (true, _, _, _) => Hat::Up,
                (_, true, _, _) => Hat::Down,
                (_, _, true, _) => Hat::Left,
                (_, _, _, true) => Hat::Right,
                _ => Hat::Centered,
            },
            DpadPolicy::CardinalPriority => {
                if up {
                    Hat::Up
                } else if down {
                    Hat::Down
                } else if left {
                    Hat::Left
                } else if right {
                    Hat::Right
                } else {
                    Hat::Centered
                }
            }
        }
    }
}

/// Button bitfield of the gamepad report.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadButtons(pub u8);

impl GamepadButtons {
    pub const A: Self = Self(1 << 0);
    pub const B: Self = Self(1 << 1);
    pub const X: Self = Self(1 << 2);
    pub const Y: Self = Self(1 << 3);
    pub const LB: Self = Self(1 << 4);
    pub const RB: Self = Self(1 << 5);
    pub const SELECT: Self = Self(1 << 6);
    pub const START: Self = Self(1 << 7);

    /// No buttons pressed.
    pub const NONE: Self = Self(0);

    /// Output bit for each non-directional line, in report bit order.
    const MAP: [(Button, GamepadButtons); 8] = [
        (Button::A, Self::A),
        (Button::B, Self::B),
        (Button::X, Self::X),
        (Button::Y, Self::Y),
        (Button::LB, Self::LB),
        (Button::RB, Self::RB),
        (Button::Select, Self::SELECT),
        (Button::Start, Self::START),
    ];

    /// Check if the given button(s) are pressed.
    #[inline]
    #[must_use]
    pub const fn contains(self, buttons: GamepadButtons) -> bool {
        (self.0 & buttons.0) == buttons.0
    }

    /// Get the raw byte.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u8 {
        self.0
    }
}

impl From<InputSnapshot> for GamepadButtons {
    fn from(snapshot: InputSnapshot) -> Self {
        Self::MAP
            .iter()
            .filter(|(line, _)| snapshot.is_pressed(*line))
            .fold(Self::NONE, |acc, (_, bit)| acc | *bit)
    }
}

impl BitOr for GamepadButtons {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for GamepadButtons {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Gamepad input report payload (without the report id).
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GamepadReport {
    pub hat: Hat,
    pub buttons: GamepadButtons,
}

impl GamepadReport {
    /// Size of the payload in bytes.
    pub const SIZE: usize = 2;

    /// Encode a snapshot under the given d-pad policy.
    #[must_use]
    pub fn encode(snapshot: InputSnapshot, policy: DpadPolicy) -> Self {
        Self {
            hat: policy.resolve(snapshot),
            buttons: GamepadButtons::from(snapshot),
        }
    }

    /// Convert the report to bytes.
    #[must_use]
    pub fn as_bytes(&self) -> [u8; Self::SIZE] {
        [self.hat as u8, self.buttons.raw()]
    }
}

/// Report identifiers declared by the report descriptor, in send order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum ReportId {
    /// Output-only keyboard report carrying the host's lock LEDs.
    Keyboard = 1,
    Gamepad = 2,
}

impl ReportId {
    /// One past the last report id.
    pub const COUNT: u8 = 3;

    /// Look up a report id from its wire value.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            1 => Some(ReportId::Keyboard),
            2 => Some(ReportId::Gamepad),
            _ => None,
        }
    }

    /// Report to send after this one has completed, if any.
    #[must_use]
    pub const fn next(self) -> Option<Self> {
        let next = self as u8 + 1;
        if next < Self::COUNT {
            Self::from_raw(next)
        } else {
            None
        }
    }
}

/// HID report type of a control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ReportType {
    Input,
    Output,
    Feature,
}

/// Caps Lock bit of the keyboard LED output report.
pub const KEYBOARD_LED_CAPSLOCK: u8 = 1 << 1;

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTIONS: [Button; 4] = [Button::Up, Button::Down, Button::Left, Button::Right];

    fn snapshot(buttons: &[Button]) -> InputSnapshot {
        buttons.iter().copied().collect()
    }

    #[test]
    fn test_no_direction_is_centered() {
        // Every combination of the 8 non-directional lines.
        for bits in 0u32..(1 << 8) {
            let mut snap = InputSnapshot::NONE;
            for (i, (line, _)) in GamepadButtons::MAP.iter().enumerate() {
                snap.set(*line, bits & (1 << i) != 0);
            }
            assert_eq!(DpadPolicy::DiagonalAware.resolve(snap), Hat::Centered);
            assert_eq!(DpadPolicy::CardinalPriority.resolve(snap), Hat::Centered);
        }
    }

    #[test]
    fn test_single_directions() {
        let expected = [Hat::Up, Hat::Down, Hat::Left, Hat::Right];
        for (line, hat) in DIRECTIONS.iter().zip(expected) {
            assert_eq!(DpadPolicy::DiagonalAware.resolve((*line).into()), hat);
            assert_eq!(DpadPolicy::CardinalPriority.resolve((*line).into()), hat);
        }
    }

    #[test]
    fn test_diagonal_aware_diagonals() {
        let policy = DpadPolicy::DiagonalAware;
        assert_eq!(policy.resolve(snapshot(&[Button::Up, Button::Right])), Hat::UpRight);
        assert_eq!(policy.resolve(snapshot(&[Button::Up, Button::Left])), Hat::UpLeft);
        assert_eq!(policy.resolve(snapshot(&[Button::Down, Button::Right])), Hat::DownRight);
        assert_eq!(policy.resolve(snapshot(&[Button::Down, Button::Left])), Hat::DownLeft);
    }

    #[test]
    fn test_diagonal_aware_precedence() {
        let policy = DpadPolicy::DiagonalAware;
        // Up+Right is tested before Down alone.
        assert_eq!(
            policy.resolve(snapshot(&[Button::Up, Button::Right, Button::Down])),
            Hat::UpRight
        );
        // Up+Right is tested before Up+Left.
        assert_eq!(policy.resolve(snapshot(&DIRECTIONS)), Hat::UpRight);
        // Opposites without a diagonal fall back to cardinal order.
        assert_eq!(policy.resolve(snapshot(&[Button::Up, Button::Down])), Hat::Up);
        assert_eq!(policy.resolve(snapshot(&[Button::Left, Button::Right])), Hat::Left);
        assert_eq!(
            policy.resolve(snapshot(&[Button::Down, Button::Left, Button::Right])),
            Hat::DownRight
        );
    }

    #[test]
    fn test_cardinal_priority_order() {
        let policy = DpadPolicy::CardinalPriority;
        assert_eq!(policy.resolve(snapshot(&[Button::Up, Button::Down])), Hat::Up);
        assert_eq!(policy.resolve(snapshot(&[Button::Up, Button::Right])), Hat::Up);
        assert_eq!(policy.resolve(snapshot(&[Button::Down, Button::Left])), Hat::Down);
        assert_eq!(policy.resolve(snapshot(&[Button::Left, Button::Right])), Hat::Left);
        assert_eq!(policy.resolve(snapshot(&DIRECTIONS)), Hat::Up);
    }

    #[test]
    fn test_each_button_sets_only_its_bit() {
        for (k, (line, bit)) in GamepadButtons::MAP.iter().enumerate() {
            let buttons = GamepadButtons::from(InputSnapshot::from(*line));
            assert_eq!(buttons, *bit);
            assert_eq!(buttons.raw(), 1 << k);
        }
    }

    #[test]
    fn test_button_combinations_are_independent() {
        for bits in 0u32..(1 << 8) {
            let mut snap = InputSnapshot::NONE;
            for (i, (line, _)) in GamepadButtons::MAP.iter().enumerate() {
                snap.set(*line, bits & (1 << i) != 0);
            }
            // Directional lines never leak into the bitfield.
            let with_dpad = snap | snapshot(&DIRECTIONS);
            assert_eq!(u32::from(GamepadButtons::from(snap).raw()), bits);
            assert_eq!(u32::from(GamepadButtons::from(with_dpad).raw()), bits);
        }
    }

    #[test]
    fn test_report_bytes() {
        let report = GamepadReport::encode(
            snapshot(&[Button::Down, Button::Left, Button::A, Button::Start]),
            DpadPolicy::DiagonalAware,
        );
        assert_eq!(report.hat, Hat::DownLeft);
        assert!(report.buttons.contains(GamepadButtons::A | GamepadButtons::START));
        assert_eq!(report.as_bytes(), [6, 0b1000_0001]);
        assert_eq!(
            GamepadReport::encode(InputSnapshot::NONE, DpadPolicy::DiagonalAware).as_bytes(),
            [0, 0]
        );
    }

    #[test]
    fn test_report_id_sequence() {
        assert_eq!(ReportId::Keyboard.next(), Some(ReportId::Gamepad));
        assert_eq!(ReportId::Gamepad.next(), None);
        assert_eq!(ReportId::from_raw(0), None);
        assert_eq!(ReportId::from_raw(ReportId::COUNT), None);
    }
}
