//! In-memory test doubles: filesystem, clock, disk-space provider.
//!
//! `MockFs` simulates the `/proc` and `/sys` trees in memory so sampler
//! tests run anywhere; `MockClock` makes tick advancement explicit; and
//! `MockSpace` stands in for `statvfs`.

mod scenarios;

use std::collections::{HashMap, HashSet};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::clock::Clock;
use crate::collector::disk::{DiskSpace, SpaceProvider};
use crate::collector::traits::FileSystem;
use crate::collector::CollectError;

/// In-memory filesystem for testing.
#[derive(Debug, Clone, Default)]
pub struct MockFs {
    files: HashMap<PathBuf, String>,
    directories: HashSet<PathBuf>,
}

impl MockFs {
    /// Creates a new empty mock filesystem.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a file with the given content, creating parent directories.
    pub fn add_file(&mut self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref().to_path_buf();
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
        self.files.insert(path, content.into());
    }

    /// Adds an empty directory (and its parents).
    pub fn add_dir(&mut self, path: impl AsRef<Path>) {
        let path = path.as_ref().to_path_buf();
        let mut parent = path.parent();
        while let Some(p) = parent {
            if !p.as_os_str().is_empty() {
                self.directories.insert(p.to_path_buf());
            }
            parent = p.parent();
        }
        self.directories.insert(path);
    }

    /// Removes a file, simulating a provider that disappeared mid-run.
    pub fn remove_file(&mut self, path: impl AsRef<Path>) {
        self.files.remove(path.as_ref());
    }
}

impl FileSystem for MockFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("file not found: {:?}", path),
            )
        })
    }

    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(path) || self.directories.contains(path)
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        if !self.directories.contains(path) {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("directory not found: {:?}", path),
            ));
        }

        let mut entries = HashSet::new();
        for candidate in self.files.keys().chain(self.directories.iter()) {
            if let Some(parent) = candidate.parent()
                && parent == path
            {
                entries.insert(candidate.clone());
            }
        }

        let mut paths: Vec<PathBuf> = entries.into_iter().collect();
        paths.sort();
        Ok(paths)
    }
}

/// Test clock with an explicitly advanced tick counter. Clones share the
/// counter, so a sampler's clock and a session's clock stay in step.
#[derive(Clone)]
pub struct MockClock {
    ticks: Arc<AtomicU64>,
    frequency: u64,
}

impl MockClock {
    pub fn new(start_ticks: u64, frequency: u64) -> Self {
        Self {
            ticks: Arc::new(AtomicU64::new(start_ticks)),
            frequency,
        }
    }

    /// Moves the clock forward by `delta` ticks.
    pub fn advance(&self, delta: u64) {
        self.ticks.fetch_add(delta, Ordering::SeqCst);
    }

    pub fn set(&self, ticks: u64) {
        self.ticks.store(ticks, Ordering::SeqCst);
    }
}

impl Clock for MockClock {
    fn ticks(&self) -> Result<u64, CollectError> {
        Ok(self.ticks.load(Ordering::SeqCst))
    }

    fn frequency(&self) -> u64 {
        self.frequency
    }
}

/// Disk-space provider answering from a fixed mount-point table.
#[derive(Debug, Clone, Default)]
pub struct MockSpace {
    spaces: HashMap<PathBuf, DiskSpace>,
}

impl MockSpace {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_mount(&mut self, mount_point: impl AsRef<Path>, total: u64, free: u64) {
        self.spaces.insert(
            mount_point.as_ref().to_path_buf(),
            DiskSpace {
                total_bytes: total,
                free_bytes: free,
            },
        );
    }
}

impl SpaceProvider for MockSpace {
    fn space(&self, mount_point: &Path) -> Option<DiskSpace> {
        self.spaces.get(mount_point).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_fs_read_dir_lists_children_only() {
        let mut fs = MockFs::new();
        fs.add_file("/sys/class/thermal/thermal_zone0/type", "x86_pkg_temp\n");
        fs.add_file("/sys/class/thermal/thermal_zone0/temp", "45000\n");
        fs.add_dir("/sys/class/thermal/thermal_zone1");

        let entries = fs.read_dir(Path::new("/sys/class/thermal")).unwrap();
        assert_eq!(
            entries,
            vec![
                PathBuf::from("/sys/class/thermal/thermal_zone0"),
                PathBuf::from("/sys/class/thermal/thermal_zone1"),
            ]
        );
        assert!(fs.read_dir(Path::new("/sys/class/hwmon")).is_err());
    }

    #[test]
    fn mock_clock_advances() {
        let clock = MockClock::new(1000, 100);
        assert_eq!(clock.ticks().unwrap(), 1000);
        clock.advance(250);
        assert_eq!(clock.ticks().unwrap(), 1250);
        assert_eq!(clock.frequency(), 100);
    }
}
