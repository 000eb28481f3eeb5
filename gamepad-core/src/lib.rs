//! Platform-agnostic core of the GPIO-to-gamepad firmware.
//!
//! This crate holds everything that does not touch a specific chip or USB
//! driver: sampling the button lines, encoding the HID gamepad report,
//! blinking the status LED and following the USB lifecycle. It runs in
//! embedded `no_std` environments and on host for testing.
//!
//! # Overview
//!
//! - [`buttons`]: Button lines and pin mapping ([`Button`], [`InputSnapshot`])
//! - [`sampler`]: Active-low sampling over `embedded-hal` pins ([`InputSampler`])
//! - [`report`]: HID report encoding ([`GamepadReport`], [`Hat`], [`DpadPolicy`])
//! - [`timer`]: Drift-free interval gating ([`IntervalTimer`])
//! - [`indicator`]: Status LED blinking ([`StatusIndicator`])
//! - [`lifecycle`]: USB lifecycle state machine ([`Lifecycle`], [`UsbEvent`])
//! - [`transport`]: USB HID transport trait ([`HidTransport`])
//! - [`bridge`]: Cooperative tasks tying it together ([`GamepadBridge`])
//! - [`config`]: Compile-time constants
//!
//! # Scheduling
//!
//! Nothing here blocks or sleeps. The platform loop yields to the USB stack,
//! drains pending [`UsbEvent`]s into [`GamepadBridge::handle_event`] and
//! then calls [`GamepadBridge::poll`] with the current millisecond clock.
//! Each task compares the clock against its own [`IntervalTimer`] and
//! returns immediately when it is not due.
//!
//! # Example
//!
//! ```rust
//! use gamepad_core::{Button, DpadPolicy, GamepadReport, Hat, InputSnapshot};
//!
//! let snapshot: InputSnapshot = [Button::Up, Button::Left, Button::A].into_iter().collect();
//! let report = GamepadReport::encode(snapshot, DpadPolicy::DiagonalAware);
//! assert_eq!(report.hat, Hat::UpLeft);
//! assert_eq!(report.as_bytes(), [8, 0b0000_0001]);
//! ```
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Log through `defmt` instead of the `log` facade

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

mod fmt;

pub mod bridge;
pub mod buttons;
pub mod config;
pub mod indicator;
pub mod lifecycle;
pub mod report;
pub mod sampler;
pub mod timer;
pub mod transport;

// Re-export main types at crate root
pub use bridge::{GamepadBridge, HidOutcome, WakeupPolicy};
pub use buttons::{Button, InputSnapshot};
pub use indicator::StatusIndicator;
pub use lifecycle::{answer_get_report, Action, ConnectionState, Lifecycle, UsbEvent};
pub use report::{
    DpadPolicy, GamepadButtons, GamepadReport, Hat, ReportId, ReportType, KEYBOARD_LED_CAPSLOCK,
};
pub use sampler::{InputSampler, SnapshotSource};
pub use timer::IntervalTimer;
pub use transport::{HidTransport, TransportError};
