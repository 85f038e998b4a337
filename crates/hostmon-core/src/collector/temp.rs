//! Temperature sampler over sysfs thermal zones.
//!
//! Thermal data is a capability, not a given: headless VMs and many
//! containers expose no zones at all. Probing happens once, up front,
//! and the outcome is carried in [`TempProbe`] so callers can report
//! "unavailable" with a concrete reason instead of failing every sample.

use std::path::{Path, PathBuf};

use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::{SensorReading, TempStats};

/// Result of probing for temperature sensors at startup.
pub enum TempProbe<F: FileSystem> {
    Available(ThermalZones<F>),
    /// No usable sensors; the string says why.
    Unavailable(String),
}

impl<F: FileSystem> TempProbe<F> {
    /// Probes `{sys_path}/class/thermal` for zones.
    pub fn probe(fs: F, sys_path: &str) -> Self {
        let thermal_path = Path::new(sys_path).join("class/thermal");
        let entries = match fs.read_dir(&thermal_path) {
            Ok(entries) => entries,
            Err(_) => {
                return TempProbe::Unavailable(format!(
                    "{} not present on this host",
                    thermal_path.display()
                ));
            }
        };

        let mut zones: Vec<PathBuf> = entries
            .into_iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with("thermal_zone"))
            })
            .collect();
        zones.sort();

        if zones.is_empty() {
            return TempProbe::Unavailable("no thermal zones found".to_string());
        }
        TempProbe::Available(ThermalZones { fs, zones })
    }

    pub fn is_available(&self) -> bool {
        matches!(self, TempProbe::Available(_))
    }

    /// Reads all zones, or explains why no reading is possible.
    pub fn sample(&self) -> Result<TempStats, CollectError> {
        match self {
            TempProbe::Available(zones) => zones.sample(),
            TempProbe::Unavailable(reason) => Err(CollectError::Unavailable(reason.clone())),
        }
    }
}

/// The set of thermal zone directories found at probe time.
pub struct ThermalZones<F: FileSystem> {
    fs: F,
    zones: Vec<PathBuf>,
}

impl<F: FileSystem> ThermalZones<F> {
    fn sample(&self) -> Result<TempStats, CollectError> {
        let mut sensors = Vec::new();
        for zone in &self.zones {
            // A zone that fails to read mid-run is skipped, not fatal;
            // drivers unload.
            let Ok(kind) = self.fs.read_to_string(&zone.join("type")) else {
                continue;
            };
            let Ok(raw) = self.fs.read_to_string(&zone.join("temp")) else {
                continue;
            };
            let Ok(millidegrees) = raw.trim().parse::<i64>() else {
                continue;
            };

            let name = kind.trim().to_string();
            sensors.push(SensorReading {
                hardware_type: classify(&name).to_string(),
                name,
                temp_celsius: (millidegrees as f64 / 1000.0).round() as i32,
            });
        }

        if sensors.is_empty() {
            return Err(CollectError::Unavailable(
                "all thermal zones failed to read".to_string(),
            ));
        }

        let cpu_temps: Vec<i32> = sensors
            .iter()
            .filter(|s| s.hardware_type == "CPU")
            .map(|s| s.temp_celsius)
            .collect();
        // Fall back to every sensor when none is recognizably CPU.
        let pool = if cpu_temps.is_empty() {
            sensors.iter().map(|s| s.temp_celsius).collect()
        } else {
            cpu_temps
        };

        let max = pool.iter().copied().max().unwrap_or(0);
        let (min, avg) = if pool.len() >= 2 {
            let min = pool.iter().copied().min().unwrap_or(0);
            let avg = (pool.iter().map(|&t| t as i64).sum::<i64>() as f64
                / pool.len() as f64)
                .round() as i32;
            (Some(min), Some(avg))
        } else {
            (None, None)
        };

        Ok(TempStats {
            sensors,
            max_cpu_temp_celsius: max,
            min_cpu_temp_celsius: min,
            avg_cpu_temp_celsius: avg,
        })
    }
}

/// Maps a thermal zone type string to a hardware category.
fn classify(zone_type: &str) -> &'static str {
    let lower = zone_type.to_ascii_lowercase();
    if lower.contains("cpu")
        || lower.contains("core")
        || lower.contains("pkg")
        || lower.contains("x86")
        || lower.contains("soc")
    {
        "CPU"
    } else if lower.contains("gpu") {
        "GPU"
    } else {
        "Other"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn temp_reads_zones_and_classifies() {
        let probe = TempProbe::probe(MockFs::typical_host(), "/sys");
        assert!(probe.is_available());

        let stats = probe.sample().unwrap();
        assert_eq!(stats.sensors.len(), 2);
        assert_eq!(stats.sensors[0].name, "x86_pkg_temp");
        assert_eq!(stats.sensors[0].hardware_type, "CPU");
        assert_eq!(stats.sensors[0].temp_celsius, 45);
        assert_eq!(stats.sensors[1].hardware_type, "Other");

        // Only the x86_pkg_temp sensor is CPU, so no min/avg pair.
        assert_eq!(stats.max_cpu_temp_celsius, 45);
        assert_eq!(stats.min_cpu_temp_celsius, None);
        assert_eq!(stats.avg_cpu_temp_celsius, None);
    }

    #[test]
    fn temp_aggregates_multiple_cpu_sensors() {
        let mut fs = MockFs::typical_host();
        fs.add_file("/sys/class/thermal/thermal_zone2/type", "cpu_thermal\n");
        fs.add_file("/sys/class/thermal/thermal_zone2/temp", "51000\n");

        let stats = TempProbe::probe(fs, "/sys").sample().unwrap();
        assert_eq!(stats.max_cpu_temp_celsius, 51);
        assert_eq!(stats.min_cpu_temp_celsius, Some(45));
        assert_eq!(stats.avg_cpu_temp_celsius, Some(48));
    }

    #[test]
    fn temp_unavailable_without_sysfs() {
        let probe = TempProbe::probe(MockFs::new(), "/sys");
        assert!(!probe.is_available());
        assert!(matches!(
            probe.sample(),
            Err(CollectError::Unavailable(_))
        ));
    }

    #[test]
    fn temp_skips_unreadable_zone() {
        let mut fs = MockFs::typical_host();
        fs.remove_file("/sys/class/thermal/thermal_zone1/temp");
        let stats = TempProbe::probe(fs, "/sys").sample().unwrap();
        assert_eq!(stats.sensors.len(), 1);
        assert_eq!(stats.sensors[0].name, "x86_pkg_temp");
    }

    #[test]
    fn temp_rounds_millidegrees() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/thermal/thermal_zone0/type", "acpitz\n");
        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "41499\n");
        let stats = TempProbe::probe(fs, "/sys").sample().unwrap();
        assert_eq!(stats.sensors[0].temp_celsius, 41);
    }
}
