//! USB HID gamepad interface on top of embassy-usb.
//!
//! The USB stack runs in its own task. Its callbacks never touch the
//! application state directly: bus events are posted to [`USB_EVENTS`] and
//! drained by the gamepad task, readiness is published through
//! [`USB_STATUS`], and remote wakeup requests travel back over
//! [`REMOTE_WAKEUP`].

use defmt::{debug, info, warn};
use embassy_rp::peripherals::USB;
use embassy_rp::usb::Driver;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use embassy_usb::class::hid::{
    Config, HidBootProtocol, HidSubclass, HidWriter, ReportId as HidReportId, RequestHandler,
    State,
};
use embassy_usb::control::OutResponse;
use embassy_usb::driver::EndpointError;
use embassy_usb::{Builder, Handler};
use gamepad_core::config::USB_HID_POLL_MS;
use gamepad_core::{
    answer_get_report, GamepadReport, HidTransport, ReportId, ReportType, TransportError,
    UsbEvent,
};
use heapless::Vec;
use portable_atomic::{AtomicBool, Ordering};

/// Largest report the interface writes, report id included.
pub const MAX_REPORT_LEN: usize = 8;

/// Gamepad input report length on the wire: id, hat, buttons.
pub const GAMEPAD_REPORT_LEN: usize = 1 + GamepadReport::SIZE;

const _: () = assert!(GAMEPAD_REPORT_LEN <= MAX_REPORT_LEN);

/// Depth of the event queue between the USB task and the gamepad task.
pub const EVENT_QUEUE_DEPTH: usize = 8;

/// USB driver type for the RP2040.
pub type UsbDriver<'d> = Driver<'d, USB>;

/// Bus events waiting for the gamepad task.
pub static USB_EVENTS: Channel<CriticalSectionRawMutex, UsbEvent, EVENT_QUEUE_DEPTH> =
    Channel::new();

/// Raised by the gamepad task to make the USB task signal remote wakeup.
pub static REMOTE_WAKEUP: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// Bus status as last reported by the USB stack.
pub static USB_STATUS: UsbStatus = UsbStatus::new();

fn post(event: UsbEvent) {
    if USB_EVENTS.try_send(event).is_err() {
        warn!("USB event queue full, event dropped");
    }
}

/// HID report descriptor: gamepad only.
///
/// Report 2: 8-bit hat switch (1..=8, 0 = null/centered) followed by
/// 8 one-bit buttons (A, B, X, Y, LB, RB, Select, Start).
#[cfg(not(feature = "keyboard-led"))]
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    //
    // --- Hat switch ---
    0x09, 0x39, //   Usage (Hat switch)
    0x15, 0x01, //   Logical Minimum (1)
    0x25, 0x08, //   Logical Maximum (8)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x65, 0x14, //   Unit (Degrees)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x45, 0x00, //   Physical Maximum (0)
    //
    // --- Buttons (8 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x08, //   Usage Maximum (Button 8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// HID report descriptor: keyboard LED output report plus gamepad.
///
/// Report 1 only carries the host's lock LEDs (output, 5 bits + padding).
/// Report 2 is the gamepad report described above.
#[cfg(feature = "keyboard-led")]
pub const REPORT_DESCRIPTOR: &[u8] = &[
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x06, // Usage (Keyboard)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x01, //   Report ID (1)
    //
    // --- LEDs (Num, Caps, Scroll, Compose, Kana) ---
    0x05, 0x08, //   Usage Page (LEDs)
    0x19, 0x01, //   Usage Minimum (Num Lock)
    0x29, 0x05, //   Usage Maximum (Kana)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x05, //   Report Count (5)
    0x91, 0x02, //   Output (Data, Variable, Absolute)
    0x75, 0x03, //   Report Size (3)
    0x95, 0x01, //   Report Count (1)
    0x91, 0x01, //   Output (Constant)
    0xC0, // End Collection
    //
    0x05, 0x01, // Usage Page (Generic Desktop)
    0x09, 0x05, // Usage (Gamepad)
    0xA1, 0x01, // Collection (Application)
    0x85, 0x02, //   Report ID (2)
    //
    // --- Hat switch ---
    0x09, 0x39, //   Usage (Hat switch)
    0x15, 0x01, //   Logical Minimum (1)
    0x25, 0x08, //   Logical Maximum (8)
    0x35, 0x00, //   Physical Minimum (0)
    0x46, 0x3B, 0x01, //   Physical Maximum (315)
    0x65, 0x14, //   Unit (Degrees)
    0x75, 0x08, //   Report Size (8)
    0x95, 0x01, //   Report Count (1)
    0x81, 0x42, //   Input (Data, Variable, Absolute, Null State)
    0x65, 0x00, //   Unit (None)
    0x45, 0x00, //   Physical Maximum (0)
    //
    // --- Buttons (8 buttons) ---
    0x05, 0x09, //   Usage Page (Button)
    0x19, 0x01, //   Usage Minimum (Button 1)
    0x29, 0x08, //   Usage Maximum (Button 8)
    0x15, 0x00, //   Logical Minimum (0)
    0x25, 0x01, //   Logical Maximum (1)
    0x75, 0x01, //   Report Size (1)
    0x95, 0x08, //   Report Count (8)
    0x81, 0x02, //   Input (Data, Variable, Absolute)
    //
    0xC0, // End Collection
];

/// Bus flags shared between the USB task and the transport.
pub struct UsbStatus {
    configured: AtomicBool,
    suspended: AtomicBool,
    remote_wakeup_enabled: AtomicBool,
}

impl UsbStatus {
    pub const fn new() -> Self {
        Self {
            configured: AtomicBool::new(false),
            suspended: AtomicBool::new(false),
            remote_wakeup_enabled: AtomicBool::new(false),
        }
    }

    #[inline]
    pub fn is_configured(&self) -> bool {
        self.configured.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.suspended.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn remote_wakeup_enabled(&self) -> bool {
        self.remote_wakeup_enabled.load(Ordering::Relaxed)
    }
}

impl Default for UsbStatus {
    fn default() -> Self {
        Self::new()
    }
}

/// Translates embassy-usb device callbacks into [`UsbEvent`]s.
pub struct UsbEventHandler {
    status: &'static UsbStatus,
}

impl UsbEventHandler {
    pub const fn new(status: &'static UsbStatus) -> Self {
        Self { status }
    }

    fn unmount(&mut self) {
        if self.status.configured.swap(false, Ordering::Relaxed) {
            post(UsbEvent::Unmounted);
        }
    }
}

impl Handler for UsbEventHandler {
    fn enabled(&mut self, enabled: bool) {
        if !enabled {
            self.status.suspended.store(false, Ordering::Relaxed);
            self.unmount();
        }
    }

    fn reset(&mut self) {
        self.status.remote_wakeup_enabled.store(false, Ordering::Relaxed);
        self.unmount();
    }

    fn configured(&mut self, configured: bool) {
        if configured {
            info!("USB configured");
            self.status.configured.store(true, Ordering::Relaxed);
            post(UsbEvent::Mounted);
        } else {
            self.unmount();
        }
    }

    fn suspended(&mut self, suspended: bool) {
        self.status.suspended.store(suspended, Ordering::Relaxed);
        if suspended {
            post(UsbEvent::Suspended {
                remote_wakeup_allowed: self.status.remote_wakeup_enabled(),
            });
        } else {
            post(UsbEvent::Resumed);
        }
    }

    fn remote_wakeup_enabled(&mut self, enabled: bool) {
        debug!("remote wakeup enabled: {}", enabled);
        self.status
            .remote_wakeup_enabled
            .store(enabled, Ordering::Relaxed);
    }
}

/// Split an embassy report id into its raw id and report type.
fn split_report_id(id: HidReportId) -> (u8, ReportType) {
    match id {
        HidReportId::In(raw) => (raw, ReportType::Input),
        HidReportId::Out(raw) => (raw, ReportType::Output),
        HidReportId::Feature(raw) => (raw, ReportType::Feature),
    }
}

/// HID request handler (GET_REPORT / SET_REPORT).
///
/// GET_REPORT is stalled. SET_REPORT payloads are queued as events.
pub struct GamepadRequestHandler;

impl RequestHandler for GamepadRequestHandler {
    fn get_report(&mut self, id: HidReportId, buf: &mut [u8]) -> Option<usize> {
        let (raw, kind) = split_report_id(id);
        match answer_get_report(raw, kind, buf) {
            0 => None,
            len => Some(len),
        }
    }

    fn set_report(&mut self, id: HidReportId, data: &[u8]) -> OutResponse {
        let (raw, kind) = split_report_id(id);
        post(UsbEvent::from_set_report(raw, kind, data));
        OutResponse::Accepted
    }

    fn set_idle_ms(&mut self, _id: Option<HidReportId>, _duration_ms: u32) {}

    fn get_idle_ms(&mut self, _id: Option<HidReportId>) -> Option<u32> {
        None
    }
}

/// USB HID transport.
///
/// Wraps an embassy-usb HID writer and the shared bus status.
pub struct UsbHidTransport<'d> {
    writer: HidWriter<'d, UsbDriver<'d>, MAX_REPORT_LEN>,
    status: &'d UsbStatus,
    wakeup: &'d Signal<CriticalSectionRawMutex, ()>,
}

impl<'d> UsbHidTransport<'d> {
    /// Create a new transport from the given HID writer.
    pub fn new(
        writer: HidWriter<'d, UsbDriver<'d>, MAX_REPORT_LEN>,
        status: &'d UsbStatus,
        wakeup: &'d Signal<CriticalSectionRawMutex, ()>,
    ) -> Self {
        Self {
            writer,
            status,
            wakeup,
        }
    }
}

impl HidTransport for UsbHidTransport<'_> {
    fn is_ready(&self) -> bool {
        self.status.is_configured() && !self.status.is_suspended()
    }

    async fn send_report(&mut self, id: ReportId, report: &[u8]) -> Result<(), TransportError> {
        let mut buf: Vec<u8, MAX_REPORT_LEN> = Vec::new();
        buf.push(id as u8).map_err(|_| TransportError::Io)?;
        buf.extend_from_slice(report)
            .map_err(|_| TransportError::Io)?;

        self.writer.write(&buf).await.map_err(|e| match e {
            EndpointError::Disabled => TransportError::NotReady,
            EndpointError::BufferOverflow => TransportError::Io,
        })
    }

    fn is_mounted(&self) -> bool {
        self.status.is_configured()
    }

    fn is_suspended(&self) -> bool {
        self.status.is_suspended()
    }

    fn request_remote_wakeup(&mut self) -> Result<(), TransportError> {
        if !self.status.remote_wakeup_enabled() {
            return Err(TransportError::Disabled);
        }
        self.wakeup.signal(());
        Ok(())
    }
}

/// Configure the USB HID class in the USB builder.
///
/// Returns the HID writer for use by the application.
pub fn configure_usb_hid<'d>(
    builder: &mut Builder<'d, UsbDriver<'d>>,
    state: &'d mut State<'d>,
    request_handler: &'d mut GamepadRequestHandler,
) -> HidWriter<'d, UsbDriver<'d>, MAX_REPORT_LEN> {
    let config = Config {
        report_descriptor: REPORT_DESCRIPTOR,
        request_handler: Some(request_handler),
        poll_ms: USB_HID_POLL_MS,
        max_packet_size: MAX_REPORT_LEN as u16,
        hid_subclass: HidSubclass::No,
        hid_boot_protocol: HidBootProtocol::None,
    };

    HidWriter::new(builder, state, config)
}
