//! Memory sampler.
//!
//! Memory is the one metric family with no cumulative counters, so there
//! is no initialize/sample protocol here: every call is an independent
//! point-in-time read of `/proc/meminfo`.

use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::parse_meminfo;
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;
use crate::model::MemoryStats;

pub struct MemorySampler<F: FileSystem> {
    fs: F,
    meminfo_path: PathBuf,
}

impl<F: FileSystem> MemorySampler<F> {
    pub fn new(fs: F, proc_path: &str) -> Self {
        Self {
            meminfo_path: Path::new(proc_path).join("meminfo"),
            fs,
        }
    }

    /// Reads current memory and swap figures.
    pub fn sample(&self) -> Result<MemoryStats, CollectError> {
        let content = self.fs.read_to_string(&self.meminfo_path)?;
        let info = parse_meminfo(&content)?;

        let total = info.mem_total * 1024;
        let available = info.mem_available * 1024;
        let used = total.saturating_sub(available);
        let usage_percent = if total > 0 {
            used as f64 / total as f64 * 100.0
        } else {
            0.0
        };

        let swap_total = info.swap_total * 1024;
        let swap_free = info.swap_free * 1024;
        let swap_used = swap_total.saturating_sub(swap_free);
        let swap_percent = if swap_total > 0 {
            swap_used as f64 / swap_total as f64 * 100.0
        } else {
            0.0
        };

        Ok(MemoryStats {
            total_bytes: total,
            available_bytes: available,
            used_bytes: used,
            usage_percent,
            swap_total_bytes: swap_total,
            swap_free_bytes: swap_free,
            swap_used_bytes: swap_used,
            swap_percent,
            cached_bytes: (info.cached > 0).then(|| info.cached * 1024),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collector::MockFs;

    #[test]
    fn memory_sample_from_typical_host() {
        let fs = MockFs::typical_host();
        let sampler = MemorySampler::new(fs, "/proc");
        let stats = sampler.sample().unwrap();

        assert_eq!(stats.total_bytes, 16_384_000 * 1024);
        assert_eq!(stats.available_bytes, 12_000_000 * 1024);
        assert_eq!(stats.used_bytes, 4_384_000 * 1024);
        let expected = 4_384_000.0 / 16_384_000.0 * 100.0;
        assert!((stats.usage_percent - expected).abs() < 1e-9);

        assert_eq!(stats.swap_total_bytes, 4_096_000 * 1024);
        assert_eq!(stats.swap_used_bytes, 0);
        assert_eq!(stats.swap_percent, 0.0);
        assert_eq!(stats.cached_bytes, Some(2_048_000 * 1024));
    }

    #[test]
    fn memory_sample_without_swap() {
        let mut fs = MockFs::new();
        fs.add_file(
            "/proc/meminfo",
            "MemTotal: 1000 kB\nMemFree: 400 kB\nMemAvailable: 600 kB\nSwapTotal: 0 kB\nSwapFree: 0 kB\n",
        );
        let stats = MemorySampler::new(fs, "/proc").sample().unwrap();
        assert_eq!(stats.swap_percent, 0.0);
        assert_eq!(stats.cached_bytes, None);
        assert!((stats.usage_percent - 40.0).abs() < 1e-9);
    }

    #[test]
    fn memory_sample_missing_provider_is_an_error() {
        let fs = MockFs::new();
        let sampler = MemorySampler::new(fs, "/proc");
        assert!(matches!(sampler.sample(), Err(CollectError::Io(_))));
    }
}
