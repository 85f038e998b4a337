//! Snapshot data types.
//!
//! A [`SystemMetrics`] value is one sampling cycle's worth of data: every
//! requested metric family that collected successfully is `Some`, everything
//! else is `None`. Rates are derived values and are never persisted; the
//! cumulative counters (`total_*`) are what the state store writes out
//! between runs.

use serde::Serialize;

/// Per-core CPU statistics.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CoreStats {
    /// Logical processor ID (0-based).
    pub core_id: usize,
    /// Core usage percentage over the last sampling window (0.0 - 100.0).
    pub usage_percent: f64,
    /// Current core frequency in MHz (0 if unavailable).
    pub frequency_mhz: u64,
}

/// CPU usage and frequency information.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct CpuStats {
    /// Overall CPU usage across all cores (0.0 - 100.0).
    pub total_usage_percent: f64,
    /// Per-core statistics.
    pub cores: Vec<CoreStats>,
    /// Average frequency across all cores in MHz (0 if unavailable).
    pub average_frequency_mhz: u64,
}

/// Physical memory and swap statistics.
///
/// Collected in a single pass from `/proc/meminfo`; no sampling protocol
/// applies because none of these values are cumulative counters.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MemoryStats {
    pub total_bytes: u64,
    pub available_bytes: u64,
    pub used_bytes: u64,
    /// RAM usage percentage (0.0 - 100.0).
    pub usage_percent: f64,

    pub swap_total_bytes: u64,
    pub swap_free_bytes: u64,
    pub swap_used_bytes: u64,
    /// Swap usage percentage (0.0 - 100.0).
    pub swap_percent: f64,

    /// Page-cache size, when reported.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cached_bytes: Option<u64>,
}

/// Per-device disk statistics: space, I/O rates, and cumulative counters.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct DiskStats {
    /// Block device name (sda, nvme0n1, ...). Stable across samples.
    pub device_name: String,

    /// Filesystem capacity summed over this device's mounted filesystems.
    /// Zero when the device has no mounted filesystem.
    pub total_size_bytes: u64,
    pub used_bytes: u64,
    pub free_bytes: u64,

    /// Read throughput over the last sampling window (bytes/s).
    pub read_bytes_per_sec: f64,
    /// Write throughput over the last sampling window (bytes/s).
    pub write_bytes_per_sec: f64,
    /// Share of the window the device was busy with I/O (0.0 - 100.0).
    pub percent_busy: f64,

    /// Cumulative bytes read since boot. Persisted for cross-run rates.
    pub total_bytes_read: u64,
    /// Cumulative bytes written since boot. Persisted for cross-run rates.
    pub total_bytes_written: u64,
}

/// Per-interface network statistics.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct InterfaceStats {
    /// Interface name (eth0, enp3s0, wlan0, ...). Stable across samples.
    pub name: String,

    /// Operational state from `/sys/class/net/<name>/operstate`.
    pub is_connected: bool,
    /// Negotiated link speed in bits/s (0 if the driver does not report one).
    pub link_speed_bits_per_sec: u64,

    /// Receive throughput over the last sampling window (bytes/s).
    pub in_bytes_per_sec: f64,
    /// Transmit throughput over the last sampling window (bytes/s).
    pub out_bytes_per_sec: f64,

    /// Cumulative bytes received since boot. Persisted for cross-run rates.
    pub total_in_octets: u64,
    /// Cumulative bytes sent since boot. Persisted for cross-run rates.
    pub total_out_octets: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub in_errors: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub out_errors: Option<u64>,
}

/// One temperature sensor reading.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SensorReading {
    /// Sensor identifier (thermal zone type, e.g. "x86_pkg_temp").
    pub name: String,
    pub temp_celsius: i32,
    /// Hardware category: "CPU", "GPU", or "Other".
    pub hardware_type: String,
}

/// Temperature sensor statistics.
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TempStats {
    pub sensors: Vec<SensorReading>,
    /// Maximum CPU sensor temperature.
    pub max_cpu_temp_celsius: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_cpu_temp_celsius: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avg_cpu_temp_celsius: Option<i32>,
}

/// All metrics collected at one instant.
///
/// `timestamp` is an opaque monotonic tick from the [`crate::clock::Clock`]
/// that produced it; it drives rate computation and state persistence and is
/// deliberately excluded from serialized output (output carries a wall-clock
/// label instead).
#[derive(Clone, Serialize, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SystemMetrics {
    #[serde(skip_serializing)]
    pub timestamp: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<CpuStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<MemoryStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disks: Option<Vec<DiskStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network: Option<Vec<InterfaceStats>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<TempStats>,
}

impl SystemMetrics {
    /// True when no metric family collected successfully.
    pub fn is_empty(&self) -> bool {
        self.cpu.is_none()
            && self.memory.is_none()
            && self.disks.is_none()
            && self.network.is_none()
            && self.temperature.is_none()
    }
}
