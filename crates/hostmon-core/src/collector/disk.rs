//! Disk space and I/O sampler.
//!
//! Unlike the network sampler, this one hands out ready-made rates: state
//! is per physical device, partitions are folded into their parent disk,
//! and the whole windowing logic lives here. Cross-run continuity works by
//! seeding the baseline from persisted byte totals instead of a live
//! collection pass.

use std::collections::{BTreeMap, HashMap};
use std::ffi::CString;
use std::path::{Path, PathBuf};

use crate::clock::Clock;
use crate::collector::procfs::parser::{parse_diskstats, parse_mounts, SECTOR_SIZE};
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::DiskStats;
use crate::rates;

/// Capacity figures for one mounted filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub total_bytes: u64,
    pub free_bytes: u64,
}

/// Source of filesystem capacity figures, keyed by mount point.
///
/// Separate from [`FileSystem`] because capacity comes from a syscall,
/// not a readable file.
pub trait SpaceProvider {
    /// Capacity of the filesystem mounted at `mount_point`, or `None`
    /// when the query fails.
    fn space(&self, mount_point: &Path) -> Option<DiskSpace>;
}

/// Production provider backed by `statvfs(3)`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StatvfsSpace;

impl StatvfsSpace {
    pub fn new() -> Self {
        Self
    }
}

impl SpaceProvider for StatvfsSpace {
    fn space(&self, mount_point: &Path) -> Option<DiskSpace> {
        use std::os::unix::ffi::OsStrExt;

        let c_path = CString::new(mount_point.as_os_str().as_bytes()).ok()?;
        let mut vfs: libc::statvfs = unsafe { std::mem::zeroed() };
        if unsafe { libc::statvfs(c_path.as_ptr(), &mut vfs) } != 0 {
            return None;
        }
        let frsize = vfs.f_frsize as u64;
        Some(DiskSpace {
            total_bytes: vfs.f_blocks as u64 * frsize,
            // Space available to unprivileged users, matching what `df`
            // reports in its Avail column.
            free_bytes: vfs.f_bavail as u64 * frsize,
        })
    }
}

/// Baseline for one device: cumulative bytes, plus busy-time when the
/// baseline came from a live collection pass (a seeded baseline has no
/// busy-time history, so the first cross-run sample reports 0% busy).
#[derive(Debug, Clone, Copy)]
struct DeviceBaseline {
    read_bytes: u64,
    write_bytes: u64,
    io_ms: Option<u64>,
}

pub struct DiskSampler<F: FileSystem, C: Clock, S: SpaceProvider> {
    fs: F,
    clock: C,
    space: S,
    diskstats_path: PathBuf,
    mounts_path: PathBuf,
    prev: Option<(u64, HashMap<String, DeviceBaseline>)>,
}

impl<F: FileSystem, C: Clock, S: SpaceProvider> DiskSampler<F, C, S> {
    pub fn new(fs: F, clock: C, space: S, proc_path: &str) -> Self {
        Self {
            diskstats_path: Path::new(proc_path).join("diskstats"),
            mounts_path: Path::new(proc_path).join("mounts"),
            fs,
            clock,
            space,
            prev: None,
        }
    }

    /// Takes the discarded baseline collection pass.
    pub fn initialize(&mut self) -> Result<(), CollectError> {
        let ticks = self.clock.ticks()?;
        let baselines = self.read_baselines()?;
        self.prev = Some((ticks, baselines));
        Ok(())
    }

    /// Replaces the baseline with persisted totals from a previous run.
    ///
    /// `totals` maps device name to cumulative `(read, written)` bytes.
    /// Devices absent from `totals` fall out of the baseline and report
    /// zero rates on the next sample.
    pub fn seed_baseline(&mut self, ticks: u64, totals: &BTreeMap<String, (u64, u64)>) {
        let baselines = totals
            .iter()
            .map(|(device, &(read_bytes, write_bytes))| {
                (
                    device.clone(),
                    DeviceBaseline {
                        read_bytes,
                        write_bytes,
                        io_ms: None,
                    },
                )
            })
            .collect();
        self.prev = Some((ticks, baselines));
    }

    /// Computes per-device space and I/O rates over the window since the
    /// previous baseline, then slides the window forward.
    pub fn sample(&mut self) -> Result<Vec<DiskStats>, CollectError> {
        let (prev_ticks, prev) = self
            .prev
            .as_ref()
            .ok_or(CollectError::NotInitialized("disk"))?;

        let ticks = self.clock.ticks()?;
        let elapsed = rates::elapsed_seconds(ticks, *prev_ticks, self.clock.frequency());

        let content = self.fs.read_to_string(&self.diskstats_path)?;
        let counters = parse_diskstats(&content)?;
        let spaces = self.read_spaces(counters.iter().map(|c| c.device.as_str()));

        let mut stats = Vec::with_capacity(counters.len());
        let mut next = HashMap::with_capacity(counters.len());
        for dev in &counters {
            let read_bytes = dev.read_sectors * SECTOR_SIZE;
            let write_bytes = dev.write_sectors * SECTOR_SIZE;

            let (read_rate, write_rate, percent_busy) = match prev.get(&dev.device) {
                Some(base) => {
                    let busy = match base.io_ms {
                        Some(prev_ms) if elapsed > 0.0 => {
                            let delta_ms = dev.io_ms.saturating_sub(prev_ms) as f64;
                            (delta_ms / (elapsed * 1000.0) * 100.0).clamp(0.0, 100.0)
                        }
                        _ => 0.0,
                    };
                    (
                        rates::rate(read_bytes, base.read_bytes, elapsed),
                        rates::rate(write_bytes, base.write_bytes, elapsed),
                        busy,
                    )
                }
                // Device appeared since the baseline; no window to rate over.
                None => (0.0, 0.0, 0.0),
            };

            let space = spaces.get(&dev.device).copied().unwrap_or_default();
            stats.push(DiskStats {
                device_name: dev.device.clone(),
                total_size_bytes: space.0,
                used_bytes: space.0.saturating_sub(space.1),
                free_bytes: space.1,
                read_bytes_per_sec: read_rate,
                write_bytes_per_sec: write_rate,
                percent_busy,
                total_bytes_read: read_bytes,
                total_bytes_written: write_bytes,
            });

            next.insert(
                dev.device.clone(),
                DeviceBaseline {
                    read_bytes,
                    write_bytes,
                    io_ms: Some(dev.io_ms),
                },
            );
        }

        stats.sort_by(|a, b| a.device_name.cmp(&b.device_name));
        self.prev = Some((ticks, next));
        Ok(stats)
    }

    /// Drops the held baseline. Idempotent.
    pub fn cleanup(&mut self) {
        self.prev = None;
    }

    fn read_baselines(&self) -> Result<HashMap<String, DeviceBaseline>, CollectError> {
        let content = self.fs.read_to_string(&self.diskstats_path)?;
        let counters = parse_diskstats(&content)?;
        Ok(counters
            .into_iter()
            .map(|dev| {
                (
                    dev.device.clone(),
                    DeviceBaseline {
                        read_bytes: dev.read_sectors * SECTOR_SIZE,
                        write_bytes: dev.write_sectors * SECTOR_SIZE,
                        io_ms: Some(dev.io_ms),
                    },
                )
            })
            .collect())
    }

    /// Sums mounted-filesystem capacity per owning disk, in
    /// `(total, free)` bytes.
    fn read_spaces<'a>(
        &self,
        disks: impl Iterator<Item = &'a str>,
    ) -> HashMap<String, (u64, u64)> {
        let disks: Vec<&str> = disks.collect();
        let mut spaces: HashMap<String, (u64, u64)> = HashMap::new();

        let Ok(content) = self.fs.read_to_string(&self.mounts_path) else {
            return spaces;
        };
        for mount in parse_mounts(&content) {
            let Some(dev_name) = mount.device.strip_prefix("/dev/") else {
                continue;
            };
            let Some(disk) = owning_disk(&disks, dev_name) else {
                continue;
            };
            let Some(space) = self.space.space(Path::new(&mount.mount_point)) else {
                continue;
            };
            let entry = spaces.entry(disk.to_string()).or_default();
            entry.0 += space.total_bytes;
            entry.1 += space.free_bytes;
        }
        spaces
    }
}

/// Maps a mount's device name (possibly a partition) to the disk that
/// owns it: `sda1` -> `sda`, `nvme0n1p2` -> `nvme0n1`. The longest
/// matching disk wins so `nvme0n1p1` never matches a disk named `nvme0n1p`.
fn owning_disk<'a>(disks: &[&'a str], device: &str) -> Option<&'a str> {
    disks
        .iter()
        .filter(|disk| {
            device == **disk
                || device.strip_prefix(**disk).is_some_and(|rest| {
                    let rest = rest.strip_prefix('p').unwrap_or(rest);
                    !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit())
                })
        })
        .max_by_key(|disk| disk.len())
        .copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::{MockClock, MockFs, MockSpace};

    fn sampler_at(
        fs: MockFs,
        ticks: u64,
    ) -> DiskSampler<MockFs, MockClock, MockSpace> {
        let mut space = MockSpace::new();
        space.add_mount("/", 100_000_000_000, 40_000_000_000);
        DiskSampler::new(fs, MockClock::new(ticks, 100), space, "/proc")
    }

    #[test]
    fn disk_rates_over_known_window() {
        let mut sampler = sampler_at(MockFs::typical_host(), 1_234_500);
        sampler.initialize().unwrap();

        sampler.fs = MockFs::typical_host_later();
        sampler.clock.advance(1000);
        let stats = sampler.sample().unwrap();

        assert_eq!(stats.len(), 1);
        let sda = &stats[0];
        assert_eq!(sda.device_name, "sda");
        assert!((sda.read_bytes_per_sec - 1_048_576.0).abs() < 1e-6);
        assert!((sda.write_bytes_per_sec - 104_857.6).abs() < 1e-6);
        assert!((sda.percent_busy - 15.0).abs() < 1e-9);
        assert_eq!(sda.total_bytes_read, 820_480 * 512);
        assert_eq!(sda.total_bytes_written, 402_048 * 512);
    }

    #[test]
    fn disk_space_folds_partition_into_parent() {
        let mut sampler = sampler_at(MockFs::typical_host(), 1_234_500);
        sampler.initialize().unwrap();
        let stats = sampler.sample().unwrap();

        // sda1 is mounted at /, so sda carries its capacity.
        assert_eq!(stats[0].total_size_bytes, 100_000_000_000);
        assert_eq!(stats[0].free_bytes, 40_000_000_000);
        assert_eq!(stats[0].used_bytes, 60_000_000_000);
    }

    #[test]
    fn disk_seeded_baseline_gives_cross_run_rates() {
        let mut sampler = sampler_at(MockFs::typical_host_later(), 1_235_500);

        let mut totals = BTreeMap::new();
        totals.insert("sda".to_string(), (800_000u64 * 512, 400_000u64 * 512));
        sampler.seed_baseline(1_234_500, &totals);

        let stats = sampler.sample().unwrap();
        assert!((stats[0].read_bytes_per_sec - 1_048_576.0).abs() < 1e-6);
        assert!((stats[0].write_bytes_per_sec - 104_857.6).abs() < 1e-6);
        // No busy-time history in a seeded baseline.
        assert_eq!(stats[0].percent_busy, 0.0);
    }

    #[test]
    fn disk_reboot_reads_zero_rates() {
        let mut sampler = sampler_at(MockFs::typical_host_later(), 50_000);

        // Baseline ticks from before a reboot are ahead of the clock.
        let mut totals = BTreeMap::new();
        totals.insert("sda".to_string(), (800_000u64 * 512, 400_000u64 * 512));
        sampler.seed_baseline(1_234_500, &totals);

        let stats = sampler.sample().unwrap();
        assert_eq!(stats[0].read_bytes_per_sec, 0.0);
        assert_eq!(stats[0].write_bytes_per_sec, 0.0);
    }

    #[test]
    fn disk_sample_requires_initialize() {
        let mut sampler = sampler_at(MockFs::typical_host(), 1_234_500);
        assert!(matches!(
            sampler.sample(),
            Err(CollectError::NotInitialized("disk"))
        ));
        sampler.initialize().unwrap();
        sampler.cleanup();
        sampler.cleanup();
        assert!(sampler.sample().is_err());
    }

    #[test]
    fn owning_disk_matching() {
        let disks = vec!["sda", "nvme0n1", "mmcblk0"];
        assert_eq!(owning_disk(&disks, "sda1"), Some("sda"));
        assert_eq!(owning_disk(&disks, "sda"), Some("sda"));
        assert_eq!(owning_disk(&disks, "nvme0n1p2"), Some("nvme0n1"));
        assert_eq!(owning_disk(&disks, "mmcblk0p1"), Some("mmcblk0"));
        assert_eq!(owning_disk(&disks, "sdb1"), None);
        assert_eq!(owning_disk(&disks, "mapper/root"), None);
    }
}
