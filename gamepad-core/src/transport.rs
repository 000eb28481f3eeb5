//! USB HID transport trait and error types.

use core::future::Future;

use crate::report::ReportId;

/// Error type for transport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// USB/communication I/O error.
    Io,
    /// Device not ready (e.g., USB not enumerated or bus suspended).
    NotReady,
    /// Host has not enabled remote wakeup.
    Disabled,
}

/// Capabilities the application needs from the USB device stack.
///
/// This trait abstracts the HID interface so the sampling and lifecycle
/// logic can run against embassy-usb on target and against mocks on host.
///
/// # `no_std` Compatibility
///
/// All implementations must be `#![no_std]` compatible with no heap allocation.
pub trait HidTransport {
    /// Check if the interface can accept a new report without waiting.
    fn is_ready(&self) -> bool;

    /// Send one report tagged with `id`.
    ///
    /// The bridge polls the returned future once per pass and drops it if it
    /// is still pending, treating the endpoint as busy. Implementations must
    /// therefore be cancel-safe: a dropped send leaves no partial report
    /// behind. `Err(TransportError::NotReady)` is treated the same way.
    fn send_report(
        &mut self,
        id: ReportId,
        report: &[u8],
    ) -> impl Future<Output = Result<(), TransportError>>;

    /// Check if the host has configured the device.
    ///
    /// Consulted before a remote wakeup when the suspend has not been
    /// delivered as an event yet.
    fn is_mounted(&self) -> bool;

    /// Check if the bus is suspended.
    fn is_suspended(&self) -> bool;

    /// Ask the stack to signal remote wakeup to the host.
    fn request_remote_wakeup(&mut self) -> Result<(), TransportError>;
}
