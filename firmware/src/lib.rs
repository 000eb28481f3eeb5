//! GPIO buttons to USB HID gamepad for RP2040.
//!
//! This crate provides the embedded side of the gamepad: the embassy-usb
//! HID interface and the compile-time policy selection. Sampling, report
//! encoding and lifecycle handling live in [`gamepad_core`].
//!
//! # Hardware Configuration
//!
//! | Function | GPIO | Description |
//! |----------|------|-------------|
//! | A        | 0    | Button, active low |
//! | B        | 1    | Button, active low |
//! | X        | 2    | Button, active low |
//! | Y        | 3    | Button, active low |
//! | Up       | 4    | D-pad, active low |
//! | Down     | 5    | D-pad, active low |
//! | Left     | 6    | D-pad, active low |
//! | Right    | 7    | D-pad, active low |
//! | LB       | 8    | Button, active low |
//! | RB       | 9    | Button, active low |
//! | Select   | 10   | Button, active low |
//! | Start    | 11   | Button, active low |
//! | LED      | 25   | On-board LED (status) |
//!
//! All button inputs use the internal pull-up; wire each switch to ground.
//!
//! # Architecture
//!
//! Two tasks share the thread-mode executor and never preempt each other:
//!
//! - **USB Task**: Runs the USB device stack and performs remote wakeup
//! - **Gamepad Task**: Drains bus events, blinks the status LED, samples the
//!   buttons every 10 ms and sends the report, then yields
//!
//! # Features
//!
//! - **`dev-panic`** (default): Use `panic-probe` for development (prints panic info via RTT)
//! - **`prod-panic`**: Use `panic-reset` for production (silent watchdog reset)
//! - **`dpad-cardinal`**: Resolve the d-pad by up/down/left/right priority instead of diagonals first
//! - **`wakeup-coexist`**: Send the report in the same pass that requests remote wakeup
//! - **`keyboard-led`**: Declare a keyboard LED report; host Caps Lock holds the status LED on
//!
//! # Re-exports
//!
//! This crate re-exports the public items of [`gamepad_core`] that the
//! binary needs, so it only has to depend on this crate.

#![no_std]

#[cfg(all(feature = "dev-panic", feature = "prod-panic"))]
compile_error!("Cannot enable both `dev-panic` and `prod-panic` features - they install conflicting panic handlers");

use gamepad_core::{DpadPolicy, WakeupPolicy};

// Re-export core types for convenience
pub use gamepad_core::{config, GamepadBridge, InputSampler};

pub mod usb_output;

pub use usb_output::{
    configure_usb_hid, GamepadRequestHandler, UsbEventHandler, UsbHidTransport, REMOTE_WAKEUP,
    USB_EVENTS, USB_STATUS,
};

/// D-pad tie-break compiled into this build.
#[cfg(feature = "dpad-cardinal")]
pub const DPAD_POLICY: DpadPolicy = DpadPolicy::CardinalPriority;
#[cfg(not(feature = "dpad-cardinal"))]
pub const DPAD_POLICY: DpadPolicy = config::DEFAULT_DPAD_POLICY;

/// Wakeup/send interaction compiled into this build.
#[cfg(feature = "wakeup-coexist")]
pub const WAKEUP_POLICY: WakeupPolicy = WakeupPolicy::Coexist;
#[cfg(not(feature = "wakeup-coexist"))]
pub const WAKEUP_POLICY: WakeupPolicy = config::DEFAULT_WAKEUP_POLICY;
