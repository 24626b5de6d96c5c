//! Time primitives
//!
//! Frames carry millisecond timestamps: wall-clock for live ingestion,
//! recording-relative (or recorded wall-clock) for CSV logs. The bus keeps
//! time in nanoseconds, split into seconds and nanoseconds.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Nanoseconds per millisecond (frame time to bus time)
pub const NANOS_PER_MILLI: i64 = 1_000_000;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Frame timestamp in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0);

    #[inline]
    pub fn from_millis(millis: i64) -> Self {
        Timestamp(millis)
    }

    #[inline]
    pub fn as_millis(self) -> i64 {
        self.0
    }

    /// Bus-native time unit
    #[inline]
    pub fn as_nanos(self) -> i64 {
        self.0.saturating_mul(NANOS_PER_MILLI)
    }

    /// Current wall-clock time
    pub fn now() -> Self {
        let since_epoch = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO);
        Timestamp(since_epoch.as_millis() as i64)
    }

    /// Elapsed time from `earlier` to `self`, zero if `earlier` is later
    pub fn duration_since(self, earlier: Timestamp) -> Duration {
        Duration::from_millis(self.0.saturating_sub(earlier.0).max(0) as u64)
    }

    pub fn to_bus_time(self) -> BusTime {
        BusTime::from_nanos(self.as_nanos())
    }
}

/// Bus time stamp, seconds + nanoseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct BusTime {
    pub sec: i32,
    pub nanosec: u32,
}

impl BusTime {
    pub const MAX: BusTime = BusTime {
        sec: i32::MAX,
        nanosec: (NANOS_PER_SEC - 1) as u32,
    };
    pub const MIN: BusTime = BusTime {
        sec: i32::MIN,
        nanosec: 0,
    };

    /// Split nanoseconds. Seconds beyond the `i32` range clamp to the
    /// nearest representable stamp.
    pub fn from_nanos(nanos: i64) -> Self {
        let sec = nanos.div_euclid(NANOS_PER_SEC);
        match i32::try_from(sec) {
            Ok(sec) => BusTime {
                sec,
                nanosec: nanos.rem_euclid(NANOS_PER_SEC) as u32,
            },
            Err(_) if sec > 0 => BusTime::MAX,
            Err(_) => BusTime::MIN,
        }
    }

    pub fn as_nanos(self) -> i64 {
        self.sec as i64 * NANOS_PER_SEC + self.nanosec as i64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_millis_to_bus_time() {
        let ts = Timestamp::from_millis(1_700_000_123_456);
        assert_eq!(ts.as_nanos(), 1_700_000_123_456_000_000);

        let bus = ts.to_bus_time();
        assert_eq!(bus.sec, 1_700_000_123);
        assert_eq!(bus.nanosec, 456_000_000);
        assert_eq!(bus.as_nanos(), ts.as_nanos());
    }

    #[test]
    fn test_small_timestamps() {
        let bus = Timestamp::from_millis(100).to_bus_time();
        assert_eq!(bus, BusTime { sec: 0, nanosec: 100_000_000 });
    }

    #[test]
    fn test_out_of_range_seconds_clamp() {
        // 2040-01-01, past the i32 seconds range
        let late = Timestamp::from_millis(2_208_988_800_000).to_bus_time();
        assert_eq!(late, BusTime::MAX);

        assert_eq!(Timestamp::from_millis(i64::MAX).to_bus_time(), BusTime::MAX);
        assert_eq!(Timestamp::from_millis(i64::MIN).to_bus_time(), BusTime::MIN);

        let last = BusTime::from_nanos(i32::MAX as i64 * NANOS_PER_SEC);
        assert_eq!(last, BusTime { sec: i32::MAX, nanosec: 0 });
    }

    #[test]
    fn test_negative_millis() {
        let bus = Timestamp::from_millis(-1).to_bus_time();
        assert_eq!(bus, BusTime { sec: -1, nanosec: 999_000_000 });
    }

    #[test]
    fn test_duration_since() {
        let a = Timestamp::from_millis(100);
        let b = Timestamp::from_millis(250);
        assert_eq!(b.duration_since(a), Duration::from_millis(150));
        assert_eq!(a.duration_since(b), Duration::ZERO);
    }

    #[test]
    fn test_now_is_after_2020() {
        assert!(Timestamp::now().as_millis() > 1_577_836_800_000);
    }
}
