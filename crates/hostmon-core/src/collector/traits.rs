//! Filesystem abstraction for the samplers.
//!
//! All provider reads (`/proc`, `/sys/class/net`, `/sys/class/thermal`) go
//! through the `FileSystem` trait so samplers can run against an in-memory
//! mock in tests and on non-Linux development hosts.

use std::io;
use std::path::{Path, PathBuf};

/// Abstraction for the read-only filesystem operations samplers need.
pub trait FileSystem: Send + Sync {
    /// Reads the entire contents of a file as a string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Checks if a path exists.
    fn exists(&self, path: &Path) -> bool;

    /// Lists entries in a directory.
    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>>;
}

/// Real filesystem implementation that delegates to `std::fs`.
#[derive(Debug, Default, Clone, Copy)]
pub struct RealFs;

impl RealFs {
    pub fn new() -> Self {
        Self
    }
}

impl FileSystem for RealFs {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn read_dir(&self, path: &Path) -> io::Result<Vec<PathBuf>> {
        let entries = std::fs::read_dir(path)?;
        let mut paths = Vec::new();
        for entry in entries {
            paths.push(entry?.path());
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn real_fs_reads_and_lists() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("uptime");
        let mut f = std::fs::File::create(&file).unwrap();
        writeln!(f, "100.00 400.00").unwrap();

        let fs = RealFs::new();
        assert!(fs.exists(&file));
        assert_eq!(fs.read_to_string(&file).unwrap(), "100.00 400.00\n");
        assert_eq!(fs.read_dir(dir.path()).unwrap(), vec![file]);
        assert!(!fs.exists(Path::new("/nonexistent/path/12345")));
    }
}
