//! CPU usage and frequency sampler.
//!
//! Usage is derived from jiffies deltas in `/proc/stat`: the ratio of
//! busy to total jiffies over the window is the usage percentage, so no
//! wall clock is involved. The sampler keeps the previous snapshot and
//! slides it forward on every `sample()`.

use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::{parse_cpu_mhz, parse_stat_cpus, CpuTimes};
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::{CoreStats, CpuStats};

pub struct CpuSampler<F: FileSystem> {
    fs: F,
    stat_path: PathBuf,
    cpuinfo_path: PathBuf,
    prev: Option<Vec<CpuTimes>>,
}

impl<F: FileSystem> CpuSampler<F> {
    pub fn new(fs: F, proc_path: &str) -> Self {
        Self {
            stat_path: Path::new(proc_path).join("stat"),
            cpuinfo_path: Path::new(proc_path).join("cpuinfo"),
            fs,
            prev: None,
        }
    }

    /// Takes the discarded baseline snapshot.
    pub fn initialize(&mut self) -> Result<(), CollectError> {
        self.prev = Some(self.read_times()?);
        Ok(())
    }

    /// Computes usage over the window since the previous snapshot, then
    /// slides the window forward.
    pub fn sample(&mut self) -> Result<CpuStats, CollectError> {
        let prev = self
            .prev
            .as_ref()
            .ok_or(CollectError::NotInitialized("cpu"))?;
        let current = self.read_times()?;

        let frequencies = self.read_frequencies();

        let total_usage_percent = current
            .first()
            .zip(prev.first())
            .map(|(c, p)| usage_percent(c, p))
            .unwrap_or(0.0);

        let mut cores = Vec::new();
        for (cur, old) in current.iter().zip(prev.iter()).skip(1) {
            let Some(core_id) = cur.cpu_id else { continue };
            if old.cpu_id != Some(core_id) {
                continue;
            }
            cores.push(CoreStats {
                core_id,
                usage_percent: usage_percent(cur, old),
                frequency_mhz: frequencies.get(core_id).copied().unwrap_or(0),
            });
        }

        let average_frequency_mhz = if frequencies.is_empty() {
            0
        } else {
            frequencies.iter().sum::<u64>() / frequencies.len() as u64
        };

        self.prev = Some(current);
        Ok(CpuStats {
            total_usage_percent,
            cores,
            average_frequency_mhz,
        })
    }

    /// Drops the held snapshot. Idempotent.
    pub fn cleanup(&mut self) {
        self.prev = None;
    }

    fn read_times(&self) -> Result<Vec<CpuTimes>, CollectError> {
        let content = self.fs.read_to_string(&self.stat_path)?;
        Ok(parse_stat_cpus(&content)?)
    }

    /// Per-core MHz; empty when the architecture does not report it.
    fn read_frequencies(&self) -> Vec<u64> {
        match self.fs.read_to_string(&self.cpuinfo_path) {
            Ok(content) => parse_cpu_mhz(&content),
            Err(_) => Vec::new(),
        }
    }
}

/// Busy share of the jiffies delta, clamped to 0..=100.
fn usage_percent(current: &CpuTimes, previous: &CpuTimes) -> f64 {
    let total = current.total().saturating_sub(previous.total());
    if total == 0 {
        return 0.0;
    }
    let busy = current.busy().saturating_sub(previous.busy());
    (busy as f64 / total as f64 * 100.0).clamp(0.0, 100.0)
}
