//! Monotonic tick source for rate computation.
//!
//! Ticks are opaque `u64` values that only ever move forward within one
//! boot; `/proc/uptime` gives us that at centisecond resolution, and -
//! unlike `std::time::Instant` - the value is comparable across process
//! invocations, which is what makes cross-run rate computation possible.
//! A reboot resets the domain; the rate engine maps the resulting
//! "current < previous" to elapsed 0 rather than a negative duration.

use std::path::{Path, PathBuf};

use crate::collector::procfs::parser::parse_uptime_ticks;
use crate::collector::{CollectError, FileSystem};

/// A strictly increasing tick counter with a fixed frequency.
pub trait Clock {
    /// Current tick value. Ticks are only comparable to other ticks from
    /// the same clock domain (the same boot).
    fn ticks(&self) -> Result<u64, CollectError>;

    /// Ticks per second. Constant for the lifetime of the process.
    fn frequency(&self) -> u64;
}

/// Production clock backed by `/proc/uptime`.
#[derive(Clone)]
pub struct UptimeClock<F: FileSystem + Clone> {
    fs: F,
    path: PathBuf,
}

impl<F: FileSystem + Clone> UptimeClock<F> {
    /// Centiseconds per second.
    pub const FREQUENCY: u64 = 100;

    /// Creates the clock, probing `{proc_path}/uptime` once.
    ///
    /// Failure here is fatal for the caller: without a working clock no
    /// elapsed-time or rate computation is meaningful.
    pub fn new(fs: F, proc_path: &str) -> Result<Self, CollectError> {
        let path = Path::new(proc_path).join("uptime");
        let content = fs.read_to_string(&path)?;
        parse_uptime_ticks(&content)?;
        Ok(Self { fs, path })
    }
}

impl<F: FileSystem + Clone> Clock for UptimeClock<F> {
    fn ticks(&self) -> Result<u64, CollectError> {
        let content = self.fs.read_to_string(&self.path)?;
        Ok(parse_uptime_ticks(&content)?)
    }

    fn frequency(&self) -> u64 {
        Self::FREQUENCY
    }
}
