use chrono::{DateTime, Duration, Utc};

/// Bounds accepted for a session or class capacity
pub const MIN_CAPACITY: i32 = 1;
pub const MAX_CAPACITY: i32 = 1000;

/// Bounds accepted for a class duration, in minutes
pub const MIN_DURATION_MINUTES: i32 = 15;
pub const MAX_DURATION_MINUTES: i32 = 300;

/// Seats still open on a session, floored at zero
pub fn available_slots(max_capacity: i32, booked_slots: i32) -> i32 {
    (max_capacity - booked_slots).max(0)
}

pub fn is_full(max_capacity: i32, booked_slots: i32) -> bool {
    booked_slots >= max_capacity
}

pub fn valid_capacity(capacity: i32) -> bool {
    (MIN_CAPACITY..=MAX_CAPACITY).contains(&capacity)
}

pub fn valid_duration(minutes: i32) -> bool {
    (MIN_DURATION_MINUTES..=MAX_DURATION_MINUTES).contains(&minutes)
}

/// How long before a session starts a booking may still be cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CancellationPolicy {
    window: Duration,
}

impl CancellationPolicy {
    pub const DEFAULT_WINDOW_HOURS: i64 = 24;

    pub fn new(window_hours: i64) -> Self {
        Self {
            window: Duration::hours(window_hours),
        }
    }

    pub fn window_hours(&self) -> i64 {
        self.window.num_hours()
    }

    /// Latest instant at which a booking for a session starting at
    /// `start_time` may still be cancelled.
    pub fn deadline(&self, start_time: DateTime<Utc>) -> DateTime<Utc> {
        start_time - self.window
    }

    pub fn allows_cancellation(&self, now: DateTime<Utc>, start_time: DateTime<Utc>) -> bool {
        now <= self.deadline(start_time)
    }
}

impl Default for CancellationPolicy {
    fn default() -> Self {
        Self::new(Self::DEFAULT_WINDOW_HOURS)
    }
}

#[cfg(test)]
mod test {
    use crate::capacity::{CancellationPolicy, available_slots, valid_capacity, valid_duration};
    use chrono::{Duration, Utc};

    #[test]
    fn test_available_slots_floors_at_zero() {
        assert_eq!(available_slots(10, 3), 7);
        assert_eq!(available_slots(10, 10), 0);
        // transient over-booking during a cancellation race must not go negative
        assert_eq!(available_slots(10, 12), 0);
    }

    #[test]
    fn test_capacity_and_duration_bounds() {
        assert!(valid_capacity(1));
        assert!(valid_capacity(1000));
        assert!(!valid_capacity(0));
        assert!(!valid_capacity(1001));

        assert!(valid_duration(15));
        assert!(valid_duration(300));
        assert!(!valid_duration(14));
        assert!(!valid_duration(301));
    }

    #[test]
    fn test_cancellation_window_boundaries() {
        let policy = CancellationPolicy::default();
        let now = Utc::now();

        // 23h59m before start: too late
        let start = now + Duration::hours(23) + Duration::minutes(59);
        assert!(!policy.allows_cancellation(now, start));

        // 24h01m before start: allowed
        let start = now + Duration::hours(24) + Duration::minutes(1);
        assert!(policy.allows_cancellation(now, start));

        // exactly on the deadline: allowed
        let start = now + Duration::hours(24);
        assert!(policy.allows_cancellation(now, start));
    }

    #[test]
    fn test_configurable_window() {
        let policy = CancellationPolicy::new(2);
        let now = Utc::now();

        assert!(policy.allows_cancellation(now, now + Duration::hours(3)));
        assert!(!policy.allows_cancellation(now, now + Duration::hours(1)));
    }
}
