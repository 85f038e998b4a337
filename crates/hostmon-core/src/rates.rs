//! Shared rate computation for all counter-based samplers.
//!
//! This module is the single source of truth for turning cumulative
//! counters and tick pairs into per-second rates and durations. Every
//! stateful sampler (CPU, disk I/O, network) and the sampling session
//! delegate to these functions instead of re-implementing the
//! rollover / zero-elapsed guards.

/// Converts a cumulative counter pair into a per-second rate.
///
/// Returns `0.0` when `elapsed_secs <= 0` (same sample twice, clock
/// rollback) or when `current < previous` (counter rollover or provider
/// reset - treated conservatively as "no data", not wrap-aware math).
pub fn rate(current: u64, previous: u64, elapsed_secs: f64) -> f64 {
    if elapsed_secs <= 0.0 {
        return 0.0;
    }
    if current < previous {
        return 0.0;
    }
    (current - previous) as f64 / elapsed_secs
}

/// Converts a monotonic tick pair into elapsed seconds.
///
/// Returns `0.0` when `current_tick < previous_tick` (clock reset across
/// a reboot) or when `frequency == 0`.
pub fn elapsed_seconds(current_tick: u64, previous_tick: u64, frequency: u64) -> f64 {
    if current_tick < previous_tick || frequency == 0 {
        return 0.0;
    }
    (current_tick - previous_tick) as f64 / frequency as f64
}

/// Bytes/s to decimal megabits/s (1 Mbps = 1,000,000 bits/s).
pub fn bytes_per_sec_to_megabits(bytes_per_sec: f64) -> f64 {
    bytes_per_sec * 8.0 / 1_000_000.0
}

/// Bytes/s to decimal megabytes/s (1 MB/s = 1,000,000 bytes/s).
pub fn bytes_per_sec_to_megabytes(bytes_per_sec: f64) -> f64 {
    bytes_per_sec / 1_000_000.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rate_basic_division() {
        assert_eq!(rate(10_000_000, 0, 1.0), 10_000_000.0);
        assert_eq!(rate(1500, 500, 2.0), 500.0);
        assert_eq!(rate(100, 100, 1.0), 0.0);
    }

    #[test]
    fn rate_is_exact_for_valid_inputs() {
        let current = 987_654_321u64;
        let previous = 123_456_789u64;
        let elapsed = 3.5;
        assert_eq!(
            rate(current, previous, elapsed),
            (current - previous) as f64 / elapsed
        );
    }

    #[test]
    fn rate_zero_on_counter_regression() {
        // Rollover-like decrease is reported as "no data", never negative.
        assert_eq!(rate(100, 1000, 1.0), 0.0);
        assert_eq!(rate(0, u64::MAX, 10.0), 0.0);
    }

    #[test]
    fn rate_zero_on_nonpositive_elapsed() {
        assert_eq!(rate(1000, 0, 0.0), 0.0);
        assert_eq!(rate(1000, 0, -1.0), 0.0);
    }

    #[test]
    fn elapsed_seconds_basic() {
        assert_eq!(elapsed_seconds(5_000_000, 0, 10_000_000), 0.5);
        assert_eq!(elapsed_seconds(200, 100, 100), 1.0);
    }

    #[test]
    fn elapsed_seconds_zero_on_rollback() {
        assert_eq!(elapsed_seconds(100, 200, 100), 0.0);
    }

    #[test]
    fn elapsed_seconds_zero_on_zero_frequency() {
        assert_eq!(elapsed_seconds(200, 100, 0), 0.0);
    }

    #[test]
    fn unit_conversions_are_decimal() {
        assert_eq!(bytes_per_sec_to_megabits(1_000_000.0), 8.0);
        assert_eq!(bytes_per_sec_to_megabytes(2_500_000.0), 2.5);
        assert_eq!(bytes_per_sec_to_megabits(0.0), 0.0);
    }
}
