//! Human-readable value formatting shared by the output formats.

use std::time::SystemTime;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::rates;

/// Binary-base byte sizes: "512 B", "1.5 KB", "15.6 GB".
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KB", "MB", "GB", "TB", "PB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

/// Decimal megabits per second from a bytes-per-second rate.
pub fn format_bits_per_sec(bytes_per_sec: f64) -> String {
    format!("{:.2} Mbps", rates::bytes_per_sec_to_megabits(bytes_per_sec))
}

/// Decimal megabytes per second from a bytes-per-second rate.
pub fn format_bytes_per_sec(bytes_per_sec: f64) -> String {
    format!("{:.2} MB/s", rates::bytes_per_sec_to_megabytes(bytes_per_sec))
}

/// MHz as "x.xx GHz".
pub fn format_frequency_ghz(mhz: u64) -> String {
    format!("{:.2} GHz", mhz as f64 / 1000.0)
}

/// Wall-clock label for output: "2023-11-14T22:13:20Z".
pub fn iso8601_utc(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    #[test]
    fn bytes_use_binary_base() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(16 * 1024 * 1024), "16.0 MB");
        assert_eq!(format_bytes(16_777_216_000), "15.6 GB");
    }

    #[test]
    fn rates_use_decimal_base() {
        assert_eq!(format_bits_per_sec(1_000_000.0), "8.00 Mbps");
        assert_eq!(format_bytes_per_sec(2_500_000.0), "2.50 MB/s");
        assert_eq!(format_bits_per_sec(0.0), "0.00 Mbps");
    }

    #[test]
    fn frequency_in_ghz() {
        assert_eq!(format_frequency_ghz(2750), "2.75 GHz");
        assert_eq!(format_frequency_ghz(0), "0.00 GHz");
    }

    #[test]
    fn iso8601_known_instants() {
        assert_eq!(iso8601_utc(UNIX_EPOCH), "1970-01-01T00:00:00Z");
        let t = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert_eq!(iso8601_utc(t), "2023-11-14T22:13:20Z");
        // Leap-year day.
        let t = UNIX_EPOCH + Duration::from_secs(951_782_400);
        assert_eq!(iso8601_utc(t), "2000-02-29T00:00:00Z");
    }
}
