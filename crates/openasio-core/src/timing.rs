//! Timing Tracker and xrun accounting.
//!
//! [`TimingTracker::stamp`] runs once per period on the real-time thread,
//! immediately before the host callback. It samples a monotonic clock, forces
//! strict increase across periods, and drains the per-period xrun counters.
//!
//! Xrun counters are the only state written from both threads, so they are
//! plain atomics ([`XrunCounters`]). Per-period counts reset every stamp;
//! cumulative totals live alongside for the session to report.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::time::Instant;

/// Timing delivered to the host callback for one period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TimeInfo {
    /// Monotonic host time in nanoseconds; strictly increasing while running.
    pub host_time_ns: u64,
    /// Device clock in nanoseconds, `0` if the backend does not expose one.
    pub device_time_ns: u64,
    /// Output underruns since the previous period.
    pub underruns: u32,
    /// Input overruns since the previous period.
    pub overruns: u32,
}

impl TimeInfo {
    /// Whether the device clock is known.
    pub const fn has_device_time(&self) -> bool {
        self.device_time_ns != 0
    }

    /// Whether any xrun was recorded for this period.
    pub const fn had_xrun(&self) -> bool {
        self.underruns > 0 || self.overruns > 0
    }
}

/// Source of monotonic nanoseconds.
pub trait Clock: Send {
    /// Current time in nanoseconds since an arbitrary fixed origin.
    fn now_ns(&self) -> u64;
}

/// [`Clock`] backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    /// Clock whose origin is now.
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ns(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_nanos()).unwrap_or(u64::MAX)
    }
}

/// Cumulative xrun counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct XrunTotals {
    /// Output underruns.
    pub underruns: u64,
    /// Input overruns.
    pub overruns: u64,
}

/// Lock-free xrun counters shared between the dispatcher and the session.
#[derive(Debug, Default)]
pub struct XrunCounters {
    period_underruns: AtomicU32,
    period_overruns: AtomicU32,
    total_underruns: AtomicU64,
    total_overruns: AtomicU64,
}

impl XrunCounters {
    /// Zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one output underrun. Wait-free.
    #[inline]
    pub fn record_underrun(&self) {
        self.period_underruns.fetch_add(1, Ordering::Relaxed);
        self.total_underruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Records one input overrun. Wait-free.
    #[inline]
    pub fn record_overrun(&self) {
        self.period_overruns.fetch_add(1, Ordering::Relaxed);
        self.total_overruns.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns `(underruns, overruns)` since the last call and resets them.
    #[inline]
    pub fn take_period(&self) -> (u32, u32) {
        (
            self.period_underruns.swap(0, Ordering::AcqRel),
            self.period_overruns.swap(0, Ordering::AcqRel),
        )
    }

    /// Cumulative counts since the last [`reset`](Self::reset).
    pub fn totals(&self) -> XrunTotals {
        XrunTotals {
            underruns: self.total_underruns.load(Ordering::Relaxed),
            overruns: self.total_overruns.load(Ordering::Relaxed),
        }
    }

    /// Zeroes all counters. Call before a dispatcher starts.
    pub fn reset(&self) {
        self.period_underruns.store(0, Ordering::Relaxed);
        self.period_overruns.store(0, Ordering::Relaxed);
        self.total_underruns.store(0, Ordering::Relaxed);
        self.total_overruns.store(0, Ordering::Relaxed);
    }
}

/// Produces one [`TimeInfo`] per period.
#[derive(Debug)]
pub struct TimingTracker<C: Clock = MonotonicClock> {
    clock: C,
    last_host_ns: Option<u64>,
    xruns: Arc<XrunCounters>,
}

impl TimingTracker<MonotonicClock> {
    /// Tracker on a fresh [`MonotonicClock`].
    pub fn monotonic(xruns: Arc<XrunCounters>) -> Self {
        Self::new(MonotonicClock::new(), xruns)
    }
}

impl<C: Clock> TimingTracker<C> {
    /// Tracker reading `clock` and draining `xruns`.
    pub fn new(clock: C, xruns: Arc<XrunCounters>) -> Self {
        Self {
            clock,
            last_host_ns: None,
            xruns,
        }
    }

    /// Samples the clock and drains the period's xrun counts.
    ///
    /// Host time is strictly greater than the previous stamp even if the
    /// clock stalls or steps back. Real-time safe.
    #[inline]
    pub fn stamp(&mut self, device_time_ns: u64) -> TimeInfo {
        let now = self.clock.now_ns();
        let host_time_ns = match self.last_host_ns {
            Some(last) if now <= last => last.saturating_add(1),
            _ => now,
        };
        self.last_host_ns = Some(host_time_ns);
        let (underruns, overruns) = self.xruns.take_period();
        TimeInfo {
            host_time_ns,
            device_time_ns,
            underruns,
            overruns,
        }
    }

    /// Shared xrun counters.
    pub fn xruns(&self) -> &Arc<XrunCounters> {
        &self.xruns
    }
}
