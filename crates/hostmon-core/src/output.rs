//! Snapshot rendering: text (multi-line and single-line), JSON, CSV.

use std::fmt::Write as _;
use std::time::SystemTime;

use serde::Serialize;
use tracing::error;

use crate::collector::network::primary_interface;
use crate::collector::MetricSelection;
use crate::fmt::{
    format_bits_per_sec, format_bytes, format_bytes_per_sec, format_frequency_ghz, iso8601_utc,
};
use crate::model::SystemMetrics;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
    Csv,
}

/// Unit for network throughput in text output. CSV and JSON always carry
/// raw bytes/s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NetworkUnit {
    /// Decimal megabits per second.
    #[default]
    Bits,
    /// Decimal megabytes per second.
    Bytes,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub format: OutputFormat,
    /// Compact one-line text form for status bars.
    pub single_line: bool,
    pub net_unit: NetworkUnit,
    pub selection: MetricSelection,
}

/// Renders one snapshot. `with_csv_header` controls whether the CSV
/// header row precedes the data row; the other formats ignore it.
pub fn render(
    metrics: &SystemMetrics,
    opts: &OutputOptions,
    now: SystemTime,
    with_csv_header: bool,
) -> String {
    match opts.format {
        OutputFormat::Text if opts.single_line => render_line(metrics, opts),
        OutputFormat::Text => render_text(metrics, opts),
        OutputFormat::Json => render_json(metrics, now),
        OutputFormat::Csv => render_csv(metrics, opts, now, with_csv_header),
    }
}

fn rate_str(bytes_per_sec: f64, unit: NetworkUnit) -> String {
    match unit {
        NetworkUnit::Bits => format_bits_per_sec(bytes_per_sec),
        NetworkUnit::Bytes => format_bytes_per_sec(bytes_per_sec),
    }
}

/// Multi-line text: one block per family, `<`/`>` marking in/out and
/// read/write directions.
fn render_text(metrics: &SystemMetrics, opts: &OutputOptions) -> String {
    let mut out = String::new();

    if let Some(cpu) = &metrics.cpu {
        let _ = writeln!(
            out,
            "CPU: {:.1}% @ {}",
            cpu.total_usage_percent,
            format_frequency_ghz(cpu.average_frequency_mhz)
        );
        for core in &cpu.cores {
            let _ = writeln!(
                out,
                "  core{}: {:.1}% @ {}",
                core.core_id,
                core.usage_percent,
                format_frequency_ghz(core.frequency_mhz)
            );
        }
    }

    if let Some(mem) = &metrics.memory {
        let _ = write!(
            out,
            "RAM: {} / {} ({:.1}%)",
            format_bytes(mem.used_bytes),
            format_bytes(mem.total_bytes),
            mem.usage_percent
        );
        if mem.swap_total_bytes > 0 {
            let _ = write!(
                out,
                ", swap {} / {}",
                format_bytes(mem.swap_used_bytes),
                format_bytes(mem.swap_total_bytes)
            );
        }
        out.push('\n');
    }

    if let Some(disks) = &metrics.disks {
        for disk in disks {
            if opts.selection.disk {
                let _ = writeln!(
                    out,
                    "DISK {}: {} / {} used ({:.1}%)",
                    disk.device_name,
                    format_bytes(disk.used_bytes),
                    format_bytes(disk.total_size_bytes),
                    percent(disk.used_bytes, disk.total_size_bytes)
                );
            }
            if opts.selection.io {
                let _ = writeln!(
                    out,
                    "IO {}: < {} > {} ({:.1}% busy)",
                    disk.device_name,
                    format_bytes_per_sec(disk.read_bytes_per_sec),
                    format_bytes_per_sec(disk.write_bytes_per_sec),
                    disk.percent_busy
                );
            }
        }
    }

    if let Some(interfaces) = &metrics.network {
        for i in interfaces {
            let link = if i.is_connected {
                format!("up, {} Mbps", i.link_speed_bits_per_sec / 1_000_000)
            } else {
                "down".to_string()
            };
            let _ = writeln!(
                out,
                "NET {}: < {} > {} ({})",
                i.name,
                rate_str(i.in_bytes_per_sec, opts.net_unit),
                rate_str(i.out_bytes_per_sec, opts.net_unit),
                link
            );
        }
    }

    if let Some(temp) = &metrics.temperature {
        match (temp.min_cpu_temp_celsius, temp.avg_cpu_temp_celsius) {
            (Some(min), Some(avg)) => {
                let _ = writeln!(
                    out,
                    "TEMP: max {} C, min {} C, avg {} C",
                    temp.max_cpu_temp_celsius, min, avg
                );
            }
            _ => {
                let _ = writeln!(out, "TEMP: {} C", temp.max_cpu_temp_celsius);
            }
        }
        for sensor in &temp.sensors {
            let _ = writeln!(out, "  {}: {} C", sensor.name, sensor.temp_celsius);
        }
    }

    out
}

/// Compact single-line form: families joined by " | ", one disk and one
/// interface only.
fn render_line(metrics: &SystemMetrics, opts: &OutputOptions) -> String {
    let mut parts: Vec<String> = Vec::new();

    if let Some(cpu) = &metrics.cpu {
        parts.push(format!("CPU {:.0}%", cpu.total_usage_percent));
    }
    if let Some(mem) = &metrics.memory {
        parts.push(format!("RAM {:.0}%", mem.usage_percent));
    }
    if let Some(disks) = &metrics.disks
        && let Some(disk) = disks.first()
    {
        if opts.selection.disk {
            parts.push(format!(
                "{} {:.0}%",
                disk.device_name,
                percent(disk.used_bytes, disk.total_size_bytes)
            ));
        }
        if opts.selection.io {
            parts.push(format!(
                "{} <{} >{}",
                disk.device_name,
                format_bytes_per_sec(disk.read_bytes_per_sec),
                format_bytes_per_sec(disk.write_bytes_per_sec)
            ));
        }
    }
    if let Some(interfaces) = &metrics.network
        && let Some(i) = primary_interface(interfaces)
    {
        parts.push(format!(
            "{} <{} >{}",
            i.name,
            rate_str(i.in_bytes_per_sec, opts.net_unit),
            rate_str(i.out_bytes_per_sec, opts.net_unit)
        ));
    }
    if let Some(temp) = &metrics.temperature {
        parts.push(format!("{}C", temp.max_cpu_temp_celsius));
    }

    let mut line = parts.join(" | ");
    line.push('\n');
    line
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonEnvelope<'a> {
    schema_version: &'static str,
    timestamp: String,
    #[serde(flatten)]
    metrics: &'a SystemMetrics,
}

fn render_json(metrics: &SystemMetrics, now: SystemTime) -> String {
    let envelope = JsonEnvelope {
        schema_version: "1.0",
        timestamp: iso8601_utc(now),
        metrics,
    };
    match serde_json::to_string_pretty(&envelope) {
        Ok(mut json) => {
            json.push('\n');
            json
        }
        Err(e) => {
            error!(error = %e, "json serialization failed");
            String::new()
        }
    }
}

/// Flat CSV row per snapshot: first disk and primary interface only,
/// column set fixed by the metric selection so rows stay aligned across
/// a continuous run.
fn render_csv(
    metrics: &SystemMetrics,
    opts: &OutputOptions,
    now: SystemTime,
    with_header: bool,
) -> String {
    let mut columns: Vec<(&str, String)> = Vec::new();
    columns.push(("timestamp", iso8601_utc(now)));

    if opts.selection.cpu {
        let cpu = metrics.cpu.as_ref();
        columns.push((
            "cpuPercent",
            cpu.map(|c| format!("{:.1}", c.total_usage_percent))
                .unwrap_or_default(),
        ));
        columns.push((
            "cpuFrequencyMhz",
            cpu.map(|c| c.average_frequency_mhz.to_string())
                .unwrap_or_default(),
        ));
    }
    if opts.selection.ram {
        let mem = metrics.memory.as_ref();
        columns.push((
            "ramUsedBytes",
            mem.map(|m| m.used_bytes.to_string()).unwrap_or_default(),
        ));
        columns.push((
            "ramTotalBytes",
            mem.map(|m| m.total_bytes.to_string()).unwrap_or_default(),
        ));
        columns.push((
            "ramPercent",
            mem.map(|m| format!("{:.1}", m.usage_percent))
                .unwrap_or_default(),
        ));
    }

    let disk = metrics.disks.as_ref().and_then(|d| d.first());
    if opts.selection.disk {
        columns.push((
            "diskDevice",
            disk.map(|d| d.device_name.clone()).unwrap_or_default(),
        ));
        columns.push((
            "diskUsedBytes",
            disk.map(|d| d.used_bytes.to_string()).unwrap_or_default(),
        ));
        columns.push((
            "diskTotalBytes",
            disk.map(|d| d.total_size_bytes.to_string())
                .unwrap_or_default(),
        ));
    }
    if opts.selection.io {
        columns.push((
            "ioDevice",
            disk.map(|d| d.device_name.clone()).unwrap_or_default(),
        ));
        columns.push((
            "readBytesPerSec",
            disk.map(|d| format!("{:.1}", d.read_bytes_per_sec))
                .unwrap_or_default(),
        ));
        columns.push((
            "writeBytesPerSec",
            disk.map(|d| format!("{:.1}", d.write_bytes_per_sec))
                .unwrap_or_default(),
        ));
        columns.push((
            "percentBusy",
            disk.map(|d| format!("{:.1}", d.percent_busy))
                .unwrap_or_default(),
        ));
    }
    if opts.selection.net {
        let iface = metrics.network.as_ref().and_then(|n| primary_interface(n));
        columns.push((
            "interface",
            iface.map(|i| i.name.clone()).unwrap_or_default(),
        ));
        columns.push((
            "inBytesPerSec",
            iface
                .map(|i| format!("{:.1}", i.in_bytes_per_sec))
                .unwrap_or_default(),
        ));
        columns.push((
            "outBytesPerSec",
            iface
                .map(|i| format!("{:.1}", i.out_bytes_per_sec))
                .unwrap_or_default(),
        ));
    }
    if opts.selection.temp {
        columns.push((
            "maxCpuTempC",
            metrics
                .temperature
                .as_ref()
                .map(|t| t.max_cpu_temp_celsius.to_string())
                .unwrap_or_default(),
        ));
    }

    let mut out = String::new();
    if with_header {
        let header: Vec<&str> = columns.iter().map(|(name, _)| *name).collect();
        let _ = writeln!(out, "{}", header.join(","));
    }
    let row: Vec<String> = columns
        .into_iter()
        .map(|(_, value)| csv_escape(&value))
        .collect();
    let _ = writeln!(out, "{}", row.join(","));
    out
}

/// RFC 4180: quote fields containing comma, quote, or newline; double
/// embedded quotes.
fn csv_escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

fn percent(used: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        used as f64 / total as f64 * 100.0
    }
}
