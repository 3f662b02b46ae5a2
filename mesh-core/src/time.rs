//! Time APIs for obtaining the current time and calculating with points in time and durations.
//!
//! These APIs have millisecond resolution, matching the timescales the
//! routing layer actually cares about (a 500 ms sweep tick, a 5 s retry
//! interval, a 30 s route lifetime) rather than the microsecond resolution a
//! radio's air-time accounting would need.

use core::cell::Cell;
use core::fmt;
use core::ops::{Add, AddAssign, Sub, SubAssign};

/// A duration with millisecond resolution.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Duration(u32);

impl Duration {
    /// The zero duration.
    pub const ZERO: Self = Duration(0);

    /// Creates a [`Duration`] from a number of milliseconds.
    pub const fn from_millis(millis: u32) -> Self {
        Duration(millis)
    }

    /// Creates a [`Duration`] representing a number of seconds.
    pub const fn from_secs(secs: u32) -> Self {
        Duration(secs * 1_000)
    }

    /// Returns the number of whole seconds that fit in `self`.
    pub fn whole_secs(&self) -> u32 {
        self.0 / 1_000
    }

    /// Returns the number of milliseconds represented by `self`.
    pub fn as_millis(&self) -> u32 {
        self.0
    }
}

impl Add for Duration {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Duration(self.0.checked_add(rhs.0).expect("duration overflow"))
    }
}

impl AddAssign for Duration {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Duration {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Duration(self.0.checked_sub(rhs.0).expect("duration underflow"))
    }
}

impl SubAssign for Duration {
    fn sub_assign(&mut self, rhs: Self) {
        *self = *self - rhs;
    }
}

impl fmt::Display for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1_000 {
            let (secs, submilli) = (self.whole_secs(), self.0 % 1_000);
            if submilli == 0 {
                write!(f, "{}s", secs)
            } else {
                write!(f, "{}.{:03}s", secs, submilli)
            }
        } else {
            write!(f, "{}ms", self.0)
        }
    }
}

impl fmt::Debug for Duration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        <Self as fmt::Display>::fmt(self, f)
    }
}

/// A point in time, relative to an unspecified epoch.
///
/// `Instant`s are obtained from an implementation of [`Timer`]. Arithmetic
/// wraps around after about 49 days (the full range of a `u32` millisecond
/// counter); apart from that wraparound, time is monotonic.
#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Instant(u32);

impl Instant {
    /// The maximum gap between two `Instant`s that [`Instant::duration_since`]
    /// will treat as a well-formed, non-wrapped measurement.
    pub const MAX_TIME_BETWEEN: Duration = Duration(1_000 * 60 * 60); // 1 hour

    /// Creates an `Instant` from a raw millisecond count since an
    /// implementation-defined reference point. Only [`Timer`] implementations
    /// should call this.
    pub const fn from_raw_millis(millis: u32) -> Self {
        Instant(millis)
    }

    /// Returns the raw value this `Instant` was created from.
    pub const fn raw_millis(&self) -> u32 {
        self.0
    }

    /// Returns whether `self` is strictly before `other`.
    pub fn is_before(&self, other: Instant) -> bool {
        *self != other && other.duration_since(*self) != Duration::ZERO
    }

    /// Calculates the duration that has passed between `earlier` and `self`.
    ///
    /// Both `Instant`s must come from the same [`Timer`]. If `self` is
    /// actually earlier than `earlier`, the wrapping subtraction can produce
    /// a large spurious duration; callers within this crate never compare
    /// `Instant`s more than [`Instant::MAX_TIME_BETWEEN`] apart, so this is
    /// only asserted in debug builds rather than checked on every call.
    pub fn duration_since(&self, earlier: Instant) -> Duration {
        let millis_passed = self.0.wrapping_sub(earlier.0);
        debug_assert!(
            millis_passed <= Self::MAX_TIME_BETWEEN.0,
            "suspiciously large gap between instants: {}ms",
            millis_passed
        );
        Duration(millis_passed)
    }
}

impl Sub<Instant> for Instant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.duration_since(rhs)
    }
}

impl Add<Duration> for Instant {
    type Output = Self;

    fn add(self, d: Duration) -> Self {
        Instant(self.0.wrapping_add(d.as_millis()))
    }
}

impl AddAssign<Duration> for Instant {
    fn add_assign(&mut self, d: Duration) {
        *self = *self + d;
    }
}

impl fmt::Debug for Instant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t={}ms", self.0)
    }
}

/// Trait for time sources.
///
/// The platform must supply an implementation with millisecond accuracy.
pub trait Timer {
    /// Returns the current time.
    ///
    /// Must never move backwards, except when the underlying counter wraps.
    fn now(&self) -> Instant;
}

/// A [`Timer`] whose clock is advanced by hand.
///
/// Used by this crate's own test suite and available to downstream users who
/// want to drive [`crate::engine::Engine`] deterministically in their own
/// tests, without needing a real clock.
pub struct MockTimer(Cell<Instant>);

impl MockTimer {
    /// Creates a mock timer starting at `t=0`.
    pub fn new() -> Self {
        MockTimer(Cell::new(Instant::from_raw_millis(0)))
    }

    /// Moves the clock forward by `d`.
    pub fn advance(&self, d: Duration) {
        self.0.set(self.0.get() + d);
    }
}

impl Default for MockTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer for MockTimer {
    fn now(&self) -> Instant {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_since_basic() {
        let a = Instant::from_raw_millis(1_000);
        let b = Instant::from_raw_millis(1_500);
        assert_eq!(b.duration_since(a), Duration::from_millis(500));
    }

    #[test]
    fn mock_timer_advances() {
        let timer = MockTimer::new();
        let start = timer.now();
        timer.advance(Duration::from_secs(30));
        assert_eq!(timer.now().duration_since(start), Duration::from_secs(30));
    }
}
