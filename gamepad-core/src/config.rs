//! Compile-time configuration.
//!
//! The whole configuration of the device lives here: timing constants, USB
//! identity and the default encoding policies. Pin assignments are fixed by
//! [`Button::pin`](crate::buttons::Button::pin).

use crate::bridge::WakeupPolicy;
use crate::report::DpadPolicy;

// Status LED blink pattern

/// Blink interval while the device is not mounted (ms).
pub const BLINK_NOT_MOUNTED_MS: u32 = 250;

/// Blink interval while the device is mounted (ms).
pub const BLINK_MOUNTED_MS: u32 = 1000;

/// Blink interval while the bus is suspended (ms).
pub const BLINK_SUSPENDED_MS: u32 = 2500;

/// Blink interval meaning "blinking disabled".
pub const BLINK_DISABLED_MS: u32 = 0;

// Input polling

/// Interval between two sampling passes of the button lines (ms).
pub const HID_POLL_INTERVAL_MS: u32 = 10;

/// Number of button lines wired to the board.
pub const BUTTON_COUNT: usize = 12;

// USB

/// USB vendor ID - "pid.codes" open-source test VID.
pub const USB_VID: u16 = 0x1209;

/// USB product ID within the pid.codes range.
pub const USB_PID: u16 = 0x0002;

/// Manufacturer string descriptor.
pub const USB_MANUFACTURER: &str = "Rust Gamepad";

/// Product string descriptor.
pub const USB_PRODUCT: &str = "GPIO-to-Gamepad";

/// Serial number string descriptor.
pub const USB_SERIAL_NUMBER: &str = "001";

/// Endpoint polling interval requested from the host (ms).
pub const USB_HID_POLL_MS: u8 = 10;

// Policies

/// D-pad tie-break used when no other policy is selected.
pub const DEFAULT_DPAD_POLICY: DpadPolicy = DpadPolicy::DiagonalAware;

/// Wakeup/send interaction used when no other policy is selected.
pub const DEFAULT_WAKEUP_POLICY: WakeupPolicy = WakeupPolicy::Exclusive;
