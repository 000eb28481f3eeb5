//! USB lifecycle state machine.
//!
//! The USB stack reports what happened on the bus as [`UsbEvent`]s. The
//! [`Lifecycle`] state holder folds them through [`Lifecycle::transition`],
//! a pure function returning the next state and the [`Action`] the caller
//! has to carry out. How events are delivered (callback, channel, interrupt
//! hand-off) is up to the platform layer.

use heapless::Vec;

use crate::config::{
    BLINK_DISABLED_MS, BLINK_MOUNTED_MS, BLINK_NOT_MOUNTED_MS, BLINK_SUSPENDED_MS,
};
use crate::fmt::{debug, info};
use crate::report::{ReportId, ReportType, KEYBOARD_LED_CAPSLOCK};

/// Largest SET_REPORT payload kept from a control request.
pub const MAX_SET_REPORT_LEN: usize = 8;

/// Connection state of the device as seen from the bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectionState {
    NotMounted,
    Mounted,
    /// Bus suspended. Remembers whether the device was configured when the
    /// suspend hit, and whether the host allows remote wakeup.
    Suspended {
        mounted: bool,
        remote_wakeup_allowed: bool,
    },
}

impl ConnectionState {
    /// Status LED cadence for this state.
    #[must_use]
    pub const fn blink_interval_ms(self) -> u32 {
        match self {
            ConnectionState::NotMounted => BLINK_NOT_MOUNTED_MS,
            ConnectionState::Mounted => BLINK_MOUNTED_MS,
            ConnectionState::Suspended { .. } => BLINK_SUSPENDED_MS,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_suspended(self) -> bool {
        matches!(self, ConnectionState::Suspended { .. })
    }

    /// Configured by the host, suspended or not.
    #[inline]
    #[must_use]
    pub const fn is_mounted(self) -> bool {
        match self {
            ConnectionState::NotMounted => false,
            ConnectionState::Mounted => true,
            ConnectionState::Suspended { mounted, .. } => mounted,
        }
    }
}

/// Something the USB stack reported.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UsbEvent {
    /// Host selected a configuration.
    Mounted,
    /// Configuration dropped, bus reset or cable removed.
    Unmounted,
    /// Bus suspended. The device must drop to suspend current.
    Suspended { remote_wakeup_allowed: bool },
    Resumed,
    /// A report with this id finished transferring.
    ReportSent { id: u8 },
    GetReportRequested { id: u8, kind: ReportType },
    SetReportRequested {
        id: u8,
        kind: ReportType,
        data: Vec<u8, MAX_SET_REPORT_LEN>,
    },
}

impl UsbEvent {
    /// Build a SET_REPORT event, keeping at most [`MAX_SET_REPORT_LEN`]
    /// bytes of the payload.
    #[must_use]
    pub fn set_report(id: u8, kind: ReportType, data: &[u8]) -> Self {
        let kept = &data[..data.len().min(MAX_SET_REPORT_LEN)];
        // Cannot fail: `kept` fits the capacity.
        let data = Vec::from_slice(kept).unwrap_or_default();
        UsbEvent::SetReportRequested { id, kind, data }
    }

    /// Build a SET_REPORT event from a control transfer's data stage.
    ///
    /// Hosts differ on whether the data stage of a numbered report repeats
    /// the report id; a leading byte equal to a non-zero `id` is dropped so
    /// the payload always starts with the report body.
    #[must_use]
    pub fn from_set_report(id: u8, kind: ReportType, data: &[u8]) -> Self {
        let payload = match data.split_first() {
            Some((&first, rest)) if id != 0 && first == id => rest,
            _ => data,
        };
        Self::set_report(id, kind, payload)
    }
}

/// Side effect requested by a transition.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Action {
    None,
    /// Drive the status LED to a fixed level now.
    ForceIndicator(bool),
    /// Sample the buttons and send this report immediately.
    SendReport(ReportId),
    /// Answer a GET_REPORT with this many bytes; zero stalls the request.
    Reply(usize),
}

/// State holder for the connection state and the status LED cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Lifecycle {
    state: ConnectionState,
    blink_interval_ms: u32,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    /// Power-on state: not mounted, fast blink.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: ConnectionState::NotMounted,
            blink_interval_ms: BLINK_NOT_MOUNTED_MS,
        }
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> ConnectionState {
        self.state
    }

    /// Current blink interval; zero while the LED is held by the host.
    #[inline]
    #[must_use]
    pub const fn blink_interval_ms(&self) -> u32 {
        self.blink_interval_ms
    }

    const fn entering(state: ConnectionState) -> Self {
        Self {
            state,
            blink_interval_ms: state.blink_interval_ms(),
        }
    }

    /// Compute the state after `event` and the action it calls for.
    #[must_use]
    pub fn transition(self, event: &UsbEvent) -> (Self, Action) {
        match event {
            UsbEvent::Mounted => (Self::entering(ConnectionState::Mounted), Action::None),
            UsbEvent::Unmounted => (Self::entering(ConnectionState::NotMounted), Action::None),
            UsbEvent::Suspended {
                remote_wakeup_allowed,
            } => {
                let suspended = ConnectionState::Suspended {
                    mounted: self.state.is_mounted(),
                    remote_wakeup_allowed: *remote_wakeup_allowed,
                };
                (Self::entering(suspended), Action::None)
            }
            UsbEvent::Resumed => {
                let resumed = if self.state.is_mounted() {
                    ConnectionState::Mounted
                } else {
                    ConnectionState::NotMounted
                };
                (Self::entering(resumed), Action::None)
            }
            UsbEvent::ReportSent { id } => {
                let next = ReportId::from_raw(*id).and_then(ReportId::next);
                match next {
                    Some(next) => (self, Action::SendReport(next)),
                    None => (self, Action::None),
                }
            }
            UsbEvent::GetReportRequested { id, kind } => {
                (self, Action::Reply(answer_get_report(*id, *kind, &mut [])))
            }
            UsbEvent::SetReportRequested { id, kind, data } => {
                self.on_set_report(*id, *kind, data)
            }
        }
    }

    fn on_set_report(self, id: u8, kind: ReportType, data: &[u8]) -> (Self, Action) {
        if kind != ReportType::Output || ReportId::from_raw(id) != Some(ReportId::Keyboard) {
            return (self, Action::None);
        }
        let Some(&leds) = data.first() else {
            return (self, Action::None);
        };

        if leds & KEYBOARD_LED_CAPSLOCK != 0 {
            let held = Self {
                blink_interval_ms: BLINK_DISABLED_MS,
                ..self
            };
            (held, Action::ForceIndicator(true))
        } else {
            let released = Self {
                blink_interval_ms: BLINK_MOUNTED_MS,
                ..self
            };
            (released, Action::ForceIndicator(false))
        }
    }

    /// Apply `event` in place and return the resulting action.
    pub fn handle(&mut self, event: &UsbEvent) -> Action {
        let (next, action) = self.transition(event);
        if next.state != self.state {
            info!("usb: {:?} -> {:?}", self.state, next.state);
        }
        if next.blink_interval_ms != self.blink_interval_ms {
            debug!("blink interval {} ms", next.blink_interval_ms);
        }
        *self = next;
        action
    }
}

/// Answer a GET_REPORT request.
///
/// No report is readable over the control pipe; the zero length makes the
/// stack stall the request.
#[must_use]
pub fn answer_get_report(_id: u8, _kind: ReportType, _buf: &mut [u8]) -> usize {
    0
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec as StdVec;

    fn run(events: &[UsbEvent]) -> StdVec<u32> {
        let mut lifecycle = Lifecycle::new();
        let mut intervals = std::vec![lifecycle.blink_interval_ms()];
        for event in events {
            lifecycle.handle(event);
            intervals.push(lifecycle.blink_interval_ms());
        }
        intervals
    }

    const SUSPEND: UsbEvent = UsbEvent::Suspended {
        remote_wakeup_allowed: true,
    };

    #[test]
    fn test_mount_suspend_resume_intervals() {
        let intervals = run(&[UsbEvent::Mounted, SUSPEND, UsbEvent::Resumed]);
        assert_eq!(intervals, [250, 1000, 2500, 1000]);
    }

    #[test]
    fn test_resume_without_mount() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.handle(&SUSPEND);
        assert!(lifecycle.state().is_suspended());
        lifecycle.handle(&UsbEvent::Resumed);
        assert_eq!(lifecycle.state(), ConnectionState::NotMounted);
        assert_eq!(lifecycle.blink_interval_ms(), 250);
    }

    #[test]
    fn test_unmount_while_suspended() {
        let intervals = run(&[UsbEvent::Mounted, SUSPEND, UsbEvent::Unmounted, UsbEvent::Resumed]);
        assert_eq!(intervals, [250, 1000, 2500, 250, 250]);
    }

    #[test]
    fn test_suspend_records_wakeup_permission() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.handle(&UsbEvent::Mounted);
        lifecycle.handle(&UsbEvent::Suspended {
            remote_wakeup_allowed: false,
        });
        assert_eq!(
            lifecycle.state(),
            ConnectionState::Suspended {
                mounted: true,
                remote_wakeup_allowed: false,
            }
        );
        assert!(lifecycle.state().is_mounted());
    }

    #[test]
    fn test_capslock_holds_indicator() {
        let mut lifecycle = Lifecycle::new();
        lifecycle.handle(&UsbEvent::Mounted);

        let on = UsbEvent::set_report(1, ReportType::Output, &[KEYBOARD_LED_CAPSLOCK]);
        assert_eq!(lifecycle.handle(&on), Action::ForceIndicator(true));
        assert_eq!(lifecycle.blink_interval_ms(), 0);

        let off = UsbEvent::set_report(1, ReportType::Output, &[0x01]);
        assert_eq!(lifecycle.handle(&off), Action::ForceIndicator(false));
        assert_eq!(lifecycle.blink_interval_ms(), 1000);
    }

    #[test]
    fn test_set_report_ignored_cases() {
        let mounted = Lifecycle::new().transition(&UsbEvent::Mounted).0;
        let ignored = [
            // Empty payload.
            UsbEvent::set_report(1, ReportType::Output, &[]),
            // Not an output report.
            UsbEvent::set_report(1, ReportType::Feature, &[KEYBOARD_LED_CAPSLOCK]),
            // Not the keyboard report.
            UsbEvent::set_report(2, ReportType::Output, &[KEYBOARD_LED_CAPSLOCK]),
        ];
        for event in &ignored {
            assert_eq!(mounted.transition(event), (mounted, Action::None));
        }
    }

    #[test]
    fn test_set_report_truncates_payload() {
        let event = UsbEvent::set_report(1, ReportType::Output, &[0xAA; 64]);
        let UsbEvent::SetReportRequested { data, .. } = event else {
            panic!("wrong event");
        };
        assert_eq!(data.len(), MAX_SET_REPORT_LEN);
    }

    #[test]
    fn test_set_report_strips_leading_id() {
        let mounted = Lifecycle::new().transition(&UsbEvent::Mounted).0;

        // Id repeated in the data stage.
        let prefixed =
            UsbEvent::from_set_report(1, ReportType::Output, &[1, KEYBOARD_LED_CAPSLOCK]);
        assert_eq!(
            prefixed,
            UsbEvent::set_report(1, ReportType::Output, &[KEYBOARD_LED_CAPSLOCK])
        );
        assert_eq!(mounted.transition(&prefixed).1, Action::ForceIndicator(true));

        // Bare report body.
        let bare = UsbEvent::from_set_report(1, ReportType::Output, &[KEYBOARD_LED_CAPSLOCK]);
        assert_eq!(mounted.transition(&bare).1, Action::ForceIndicator(true));

        // Only the id: nothing left to act on.
        let id_only = UsbEvent::from_set_report(1, ReportType::Output, &[1]);
        assert_eq!(id_only, UsbEvent::set_report(1, ReportType::Output, &[]));
        assert_eq!(mounted.transition(&id_only), (mounted, Action::None));
    }

    #[test]
    fn test_set_report_keeps_body_for_unnumbered_reports() {
        let event = UsbEvent::from_set_report(0, ReportType::Output, &[0, 2]);
        assert_eq!(event, UsbEvent::set_report(0, ReportType::Output, &[0, 2]));
    }

    #[test]
    fn test_report_sent_cascades() {
        let lifecycle = Lifecycle::new();
        let (_, action) = lifecycle.transition(&UsbEvent::ReportSent { id: 1 });
        assert_eq!(action, Action::SendReport(ReportId::Gamepad));
        let (_, action) = lifecycle.transition(&UsbEvent::ReportSent { id: 2 });
        assert_eq!(action, Action::None);
        let (_, action) = lifecycle.transition(&UsbEvent::ReportSent { id: 0 });
        assert_eq!(action, Action::None);
    }

    #[test]
    fn test_get_report_stalls() {
        let (next, action) = Lifecycle::new().transition(&UsbEvent::GetReportRequested {
            id: 2,
            kind: ReportType::Input,
        });
        assert_eq!(action, Action::Reply(0));
        assert_eq!(next, Lifecycle::new());
    }
}
