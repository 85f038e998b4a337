//! Orchestrates the per-family samplers into whole-snapshot collection.
//!
//! Families are isolated from each other: a family that fails to
//! initialize or sample is logged and dropped from the snapshot, and the
//! remaining families still collect. Only the session-level clock is
//! load-bearing.

use std::time::Duration;

use tracing::warn;

use crate::clock::Clock;
use crate::collector::cpu::CpuSampler;
use crate::collector::disk::{DiskSampler, SpaceProvider};
use crate::collector::memory::MemorySampler;
use crate::collector::network::NetworkSampler;
use crate::collector::temp::TempProbe;
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::SystemMetrics;

/// Which metric families a run should collect.
///
/// Disk space (`disk`) and disk I/O (`io`) are selected independently but
/// share one sampler; the output layer decides which figures to show.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricSelection {
    pub cpu: bool,
    pub ram: bool,
    pub disk: bool,
    pub io: bool,
    pub net: bool,
    pub temp: bool,
}

impl MetricSelection {
    pub fn any(&self) -> bool {
        self.cpu || self.ram || self.disk || self.io || self.net || self.temp
    }

    pub fn wants_disk_sampler(&self) -> bool {
        self.disk || self.io
    }
}

pub struct MetricsCollector<F: FileSystem + Clone, C: Clock, S: SpaceProvider> {
    selection: MetricSelection,
    cpu: Option<CpuSampler<F>>,
    memory: Option<MemorySampler<F>>,
    disk: Option<DiskSampler<F, C, S>>,
    network: Option<NetworkSampler<F>>,
    temp: Option<TempProbe<F>>,
}

impl<F: FileSystem + Clone, C: Clock, S: SpaceProvider> MetricsCollector<F, C, S> {
    /// Builds the samplers for the selected families. `clock` and `space`
    /// are consumed by the disk sampler; they are unused for selections
    /// without disk or I/O.
    pub fn new(
        fs: F,
        clock: C,
        space: S,
        selection: MetricSelection,
        proc_path: &str,
        sys_path: &str,
        interface: Option<String>,
    ) -> Self {
        Self {
            selection,
            cpu: selection.cpu.then(|| CpuSampler::new(fs.clone(), proc_path)),
            memory: selection
                .ram
                .then(|| MemorySampler::new(fs.clone(), proc_path)),
            disk: selection
                .wants_disk_sampler()
                .then(|| DiskSampler::new(fs.clone(), clock, space, proc_path)),
            network: selection
                .net
                .then(|| NetworkSampler::new(fs.clone(), proc_path, sys_path, interface)),
            temp: selection.temp.then(|| {
                let probe = TempProbe::probe(fs, sys_path);
                if let TempProbe::Unavailable(reason) = &probe {
                    warn!(reason, "temperature sensors unavailable");
                }
                probe
            }),
        }
    }

    /// Takes the baseline pass for every counter-based family.
    ///
    /// A family that fails here is dropped for the rest of the run; the
    /// others proceed.
    pub fn initialize(&mut self) {
        if let Some(cpu) = &mut self.cpu
            && let Err(e) = cpu.initialize()
        {
            warn!(error = %e, "cpu sampler failed to initialize");
            self.cpu = None;
        }
        if let Some(disk) = &mut self.disk
            && let Err(e) = disk.initialize()
        {
            warn!(error = %e, "disk sampler failed to initialize");
            self.disk = None;
        }
        if let Some(network) = &mut self.network
            && let Err(e) = network.initialize()
        {
            warn!(error = %e, "network sampler failed to initialize");
            self.network = None;
        }
    }

    /// Minimum wait between the baseline pass and the first sample for
    /// the rates to be statistically meaningful.
    pub fn baseline_gap(&self) -> Duration {
        if self.selection.wants_disk_sampler() {
            Duration::from_millis(1000)
        } else if self.selection.cpu || self.selection.net {
            Duration::from_millis(100)
        } else {
            Duration::ZERO
        }
    }

    /// Access to the disk sampler, for cross-run baseline seeding.
    pub fn disk_sampler(&mut self) -> Option<&mut DiskSampler<F, C, S>> {
        self.disk.as_mut()
    }

    /// Collects every surviving family into one snapshot.
    ///
    /// Network stats carry raw counters only; the session turns them into
    /// rates against its previous snapshot.
    pub fn collect(&mut self, timestamp: u64) -> SystemMetrics {
        let mut metrics = SystemMetrics {
            timestamp,
            ..Default::default()
        };

        if let Some(cpu) = &mut self.cpu {
            match cpu.sample() {
                Ok(stats) => metrics.cpu = Some(stats),
                Err(e) => warn!(error = %e, "cpu collection failed"),
            }
        }
        if let Some(memory) = &self.memory {
            match memory.sample() {
                Ok(stats) => metrics.memory = Some(stats),
                Err(e) => warn!(error = %e, "memory collection failed"),
            }
        }
        if let Some(disk) = &mut self.disk {
            match disk.sample() {
                Ok(stats) => metrics.disks = Some(stats),
                Err(e) => warn!(error = %e, "disk collection failed"),
            }
        }
        if let Some(network) = &mut self.network {
            match network.sample() {
                Ok(stats) => metrics.network = Some(stats),
                Err(e) => warn!(error = %e, "network collection failed"),
            }
        }
        if let Some(temp) = &self.temp {
            match temp.sample() {
                Ok(stats) => metrics.temperature = Some(stats),
                Err(CollectError::Unavailable(_)) => {
                    // Already warned at probe time.
                }
                Err(e) => warn!(error = %e, "temperature collection failed"),
            }
        }

        metrics
    }

    /// Returns every sampler to the uninitialized state. Idempotent.
    pub fn cleanup(&mut self) {
        if let Some(cpu) = &mut self.cpu {
            cpu.cleanup();
        }
        if let Some(disk) = &mut self.disk {
            disk.cleanup();
        }
        if let Some(network) = &mut self.network {
            network.cleanup();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockClock, MockFs, MockSpace};

    fn all_metrics() -> MetricSelection {
        MetricSelection {
            cpu: true,
            ram: true,
            disk: true,
            io: true,
            net: true,
            temp: true,
        }
    }

    fn collector(
        fs: MockFs,
        selection: MetricSelection,
    ) -> MetricsCollector<MockFs, MockClock, MockSpace> {
        let mut space = MockSpace::new();
        space.add_mount("/", 100_000_000_000, 40_000_000_000);
        MetricsCollector::new(
            fs,
            MockClock::new(1_234_500, 100),
            space,
            selection,
            "/proc",
            "/sys",
            None,
        )
    }

    #[test]
    fn collects_all_selected_families() {
        let mut c = collector(MockFs::typical_host(), all_metrics());
        c.initialize();
        let metrics = c.collect(1_234_500);

        assert!(metrics.cpu.is_some());
        assert!(metrics.memory.is_some());
        assert!(metrics.disks.is_some());
        assert!(metrics.network.is_some());
        assert!(metrics.temperature.is_some());
        assert!(!metrics.is_empty());
    }

    #[test]
    fn unselected_families_stay_absent() {
        let selection = MetricSelection {
            ram: true,
            ..Default::default()
        };
        let mut c = collector(MockFs::typical_host(), selection);
        c.initialize();
        let metrics = c.collect(1_234_500);

        assert!(metrics.cpu.is_none());
        assert!(metrics.memory.is_some());
        assert!(metrics.disks.is_none());
        assert!(metrics.network.is_none());
        assert!(metrics.temperature.is_none());
    }

    #[test]
    fn one_family_failing_does_not_abort_the_rest() {
        let mut fs = MockFs::typical_host();
        fs.remove_file("/proc/stat");
        let mut c = collector(fs, all_metrics());
        c.initialize();
        let metrics = c.collect(1_234_500);

        assert!(metrics.cpu.is_none());
        assert!(metrics.memory.is_some());
        assert!(metrics.disks.is_some());
    }

    #[test]
    fn empty_snapshot_when_every_provider_is_gone() {
        let mut c = collector(MockFs::new(), all_metrics());
        c.initialize();
        let metrics = c.collect(0);
        assert!(metrics.is_empty());
    }

    #[test]
    fn baseline_gap_reflects_selection() {
        let c = collector(MockFs::typical_host(), all_metrics());
        assert_eq!(c.baseline_gap(), Duration::from_millis(1000));

        let cpu_only = MetricSelection {
            cpu: true,
            ..Default::default()
        };
        let c = collector(MockFs::typical_host(), cpu_only);
        assert_eq!(c.baseline_gap(), Duration::from_millis(100));

        let ram_only = MetricSelection {
            ram: true,
            ..Default::default()
        };
        let c = collector(MockFs::typical_host(), ram_only);
        assert_eq!(c.baseline_gap(), Duration::ZERO);
    }

    #[test]
    fn cleanup_then_reinitialize_behaves_like_first_time() {
        let mut c = collector(MockFs::typical_host(), all_metrics());
        c.initialize();
        c.cleanup();
        c.cleanup();
        c.initialize();
        assert!(!c.collect(1_234_500).is_empty());
    }
}
