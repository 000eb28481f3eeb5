//! GamepadBridge: connects the button lines to the USB HID transport.

use core::future::{poll_fn, Future};
use core::pin::pin;
use core::task::Poll;

use embedded_hal::digital::OutputPin;

use crate::buttons::InputSnapshot;
use crate::config::{DEFAULT_DPAD_POLICY, DEFAULT_WAKEUP_POLICY, HID_POLL_INTERVAL_MS};
use crate::fmt::{debug, trace, warn};
use crate::indicator::StatusIndicator;
use crate::lifecycle::{Action, ConnectionState, Lifecycle, UsbEvent};
use crate::report::{DpadPolicy, GamepadReport, ReportId};
use crate::sampler::SnapshotSource;
use crate::timer::IntervalTimer;
use crate::transport::{HidTransport, TransportError};

/// Whether a remote wakeup request replaces the report send of a pass.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum WakeupPolicy {
    /// While suspended, a pressed button requests a wakeup and nothing is
    /// sent in that pass.
    Exclusive,
    /// The wakeup request is followed by the usual ready-gated send.
    Coexist,
}

/// What one pass of the HID task did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum HidOutcome {
    /// Polling interval has not elapsed; nothing was sampled.
    Idle,
    /// Sampled, but the transport could not take a report.
    NotReady,
    /// Sampled and requested a remote wakeup instead of sending.
    WakeupRequested,
    /// Sampled and sent a report.
    Sent,
    /// Sampled, but the transport rejected the report.
    Failed(TransportError),
}

/// Runs the cooperative application tasks against a USB transport.
///
/// The bridge owns the lifecycle state holder; the platform layer feeds it
/// [`UsbEvent`]s via [`handle_event`](Self::handle_event) and calls
/// [`poll`](Self::poll) once per main-loop pass with the current time.
pub struct GamepadBridge<S, T, O> {
    source: S,
    transport: T,
    indicator: StatusIndicator<O>,
    lifecycle: Lifecycle,
    hid_timer: IntervalTimer,
    dpad: DpadPolicy,
    wakeup: WakeupPolicy,
}

impl<S: SnapshotSource, T: HidTransport, O: OutputPin> GamepadBridge<S, T, O> {
    /// Create a bridge using the default policies from [`config`](crate::config).
    pub fn new(source: S, transport: T, led: O) -> Self {
        Self {
            source,
            transport,
            indicator: StatusIndicator::new(led),
            lifecycle: Lifecycle::new(),
            hid_timer: IntervalTimer::new(HID_POLL_INTERVAL_MS),
            dpad: DEFAULT_DPAD_POLICY,
            wakeup: DEFAULT_WAKEUP_POLICY,
        }
    }

    /// Select the d-pad tie-break policy.
    #[must_use]
    pub fn with_dpad_policy(mut self, policy: DpadPolicy) -> Self {
        self.dpad = policy;
        self
    }

    /// Select how wakeup requests and report sends interact.
    #[must_use]
    pub fn with_wakeup_policy(mut self, policy: WakeupPolicy) -> Self {
        self.wakeup = policy;
        self
    }

    /// Run the indicator task, then the sampling-and-report task.
    pub async fn poll(&mut self, now_ms: u32) -> HidOutcome {
        self.poll_indicator(now_ms);
        self.poll_hid(now_ms).await
    }

    /// Blink the status LED if its interval has elapsed.
    pub fn poll_indicator(&mut self, now_ms: u32) -> bool {
        self.indicator
            .poll(now_ms, self.lifecycle.blink_interval_ms())
    }

    /// Sample the buttons and send a report if the polling interval has
    /// elapsed.
    pub async fn poll_hid(&mut self, now_ms: u32) -> HidOutcome {
        if !self.hid_timer.poll(now_ms) {
            return HidOutcome::Idle;
        }

        let snapshot = self.source.sample();
        trace!("buttons {:?}", snapshot);

        if self.wants_wakeup(snapshot) {
            match self.transport.request_remote_wakeup() {
                Ok(()) => debug!("remote wakeup requested"),
                Err(e) => warn!("remote wakeup refused: {:?}", e),
            }
            if self.wakeup == WakeupPolicy::Exclusive {
                return HidOutcome::WakeupRequested;
            }
        }

        self.send_chain(ReportId::Gamepad, snapshot).await
    }

    /// Feed one event from the USB stack through the lifecycle.
    ///
    /// Indicator overrides and report cascades are carried out before
    /// returning. The returned action lets the caller answer requests that
    /// need a reply (GET_REPORT).
    pub async fn handle_event(&mut self, event: &UsbEvent) -> Action {
        let action = self.lifecycle.handle(event);
        match action {
            Action::ForceIndicator(on) => self.indicator.force(on),
            Action::SendReport(id) => {
                let snapshot = self.source.sample();
                let _ = self.send_chain(id, snapshot).await;
            }
            Action::None | Action::Reply(_) => {}
        }
        action
    }

    fn wants_wakeup(&self, snapshot: InputSnapshot) -> bool {
        if snapshot.is_empty() || !self.transport.is_suspended() {
            return false;
        }
        match self.lifecycle.state() {
            ConnectionState::Suspended {
                remote_wakeup_allowed,
                ..
            } => remote_wakeup_allowed,
            // Suspend event not seen yet; only a configured device may wake
            // the host.
            _ => self.transport.is_mounted(),
        }
    }

    /// Send `first`, then keep following the report-complete cascade with
    /// freshly sampled input. Returns the outcome of the first send.
    async fn send_chain(&mut self, first: ReportId, snapshot: InputSnapshot) -> HidOutcome {
        let outcome = self.send_one(first, snapshot).await;
        let mut sent = first;
        let mut last = outcome;

        while last == HidOutcome::Sent {
            let Action::SendReport(next) = self
                .lifecycle
                .handle(&UsbEvent::ReportSent { id: sent as u8 })
            else {
                break;
            };
            let fresh = self.source.sample();
            last = self.send_one(next, fresh).await;
            sent = next;
        }

        outcome
    }

    async fn send_one(&mut self, id: ReportId, snapshot: InputSnapshot) -> HidOutcome {
        if !self.transport.is_ready() {
            return HidOutcome::NotReady;
        }
        let report = match id {
            ReportId::Gamepad => GamepadReport::encode(snapshot, self.dpad),
            // Output-only report, nothing to send.
            ReportId::Keyboard => return HidOutcome::Idle,
        };
        let bytes = report.as_bytes();
        match poll_once(self.transport.send_report(id, &bytes)).await {
            Some(Ok(())) => HidOutcome::Sent,
            Some(Err(TransportError::NotReady)) | None => {
                debug!("report {:?} deferred, endpoint busy", id);
                HidOutcome::NotReady
            }
            Some(Err(e)) => {
                warn!("report {:?} not sent: {:?}", id, e);
                HidOutcome::Failed(e)
            }
        }
    }

    /// Current lifecycle state holder.
    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Get a reference to the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Get a mutable reference to the transport.
    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// Get a reference to the snapshot source.
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get a mutable reference to the snapshot source.
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Get a reference to the status indicator.
    pub fn indicator(&self) -> &StatusIndicator<O> {
        &self.indicator
    }
}

/// Poll `fut` once with the caller's context and drop it if still pending.
///
/// A pass of the main loop must never wait on the host, so a send that
/// cannot finish right away is abandoned and retried with fresh input on
/// the next interval.
async fn poll_once<F: Future>(fut: F) -> Option<F::Output> {
    let mut fut = pin!(fut);
    poll_fn(|cx| match fut.as_mut().poll(cx) {
        Poll::Ready(out) => Poll::Ready(Some(out)),
        Poll::Pending => Poll::Ready(None),
    })
    .await
}
