//! Drift-free interval gate for the cooperative tasks.

/// Decides when a periodic task is due against a wrapping millisecond clock.
///
/// The reference timestamp advances by exactly one interval per run rather
/// than jumping to "now", so a late poll shortens the next wait instead of
/// shifting the whole cadence.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct IntervalTimer {
    last_ms: u32,
    interval_ms: u32,
}

impl IntervalTimer {
    /// Create a timer whose first period starts at t = 0.
    #[must_use]
    pub const fn new(interval_ms: u32) -> Self {
        Self {
            last_ms: 0,
            interval_ms,
        }
    }

    #[inline]
    #[must_use]
    pub const fn interval_ms(&self) -> u32 {
        self.interval_ms
    }

    /// Timestamp the current period started at.
    #[inline]
    #[must_use]
    pub const fn last_ms(&self) -> u32 {
        self.last_ms
    }

    /// Change the period. Takes effect from the current reference point.
    #[inline]
    pub fn set_interval(&mut self, interval_ms: u32) {
        self.interval_ms = interval_ms;
    }

    /// Whether a full interval has elapsed since the reference point.
    ///
    /// A zero interval is never due.
    #[inline]
    #[must_use]
    pub fn due(&self, now_ms: u32) -> bool {
        self.interval_ms != 0 && now_ms.wrapping_sub(self.last_ms) >= self.interval_ms
    }

    /// Move the reference point forward by one interval.
    #[inline]
    pub fn advance(&mut self) {
        self.last_ms = self.last_ms.wrapping_add(self.interval_ms);
    }

    /// Advance if due. Returns whether the task should run.
    #[inline]
    pub fn poll(&mut self, now_ms: u32) -> bool {
        if self.due(now_ms) {
            self.advance();
            true
        } else {
            false
        }
    }
}
