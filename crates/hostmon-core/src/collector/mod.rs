//! Metric samplers for Linux.
//!
//! Each metric family (CPU, memory, disk, network, temperature) has its own
//! sampler reading the `/proc` and `/sys` virtual filesystems through the
//! [`FileSystem`] trait, so everything is testable against [`MockFs`]
//! fixtures without a Linux host.
//!
//! The counter-based samplers (CPU, disk I/O, network) follow a common
//! protocol: `initialize()` acquires resources and takes a discarded
//! baseline collection pass, `sample()` computes rates against the
//! immediately preceding collection (a sliding window, not a since-start
//! average), and `cleanup()` is idempotent and returns the sampler to the
//! uninitialized state. Callers must leave a minimum gap between
//! `initialize()` and the first `sample()` for the output to be
//! statistically meaningful; shorter gaps degrade accuracy but never fail.

pub mod cpu;
pub mod disk;
pub mod memory;
pub mod mock;
pub mod network;
pub mod procfs;
pub mod temp;
pub mod traits;

#[allow(clippy::module_inception)]
mod collector;

pub use collector::{MetricSelection, MetricsCollector};
pub use cpu::CpuSampler;
pub use disk::{DiskSampler, SpaceProvider, StatvfsSpace};
pub use memory::MemorySampler;
pub use mock::{MockClock, MockFs, MockSpace};
pub use network::NetworkSampler;
pub use temp::{TempProbe, ThermalZones};
pub use traits::{FileSystem, RealFs};

/// Error type shared by the samplers and the clock.
#[derive(Debug)]
pub enum CollectError {
    /// I/O error reading a provider file.
    Io(std::io::Error),
    /// Parse error in provider data.
    Parse(String),
    /// `sample()` called before `initialize()`.
    NotInitialized(&'static str),
    /// The provider exists but cannot supply data (e.g. no sensors).
    Unavailable(String),
}

impl std::fmt::Display for CollectError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectError::Io(e) => write!(f, "I/O error: {}", e),
            CollectError::Parse(msg) => write!(f, "parse error: {}", msg),
            CollectError::NotInitialized(who) => {
                write!(f, "{} sampler not initialized", who)
            }
            CollectError::Unavailable(msg) => write!(f, "unavailable: {}", msg),
        }
    }
}

impl std::error::Error for CollectError {}

impl From<std::io::Error> for CollectError {
    fn from(e: std::io::Error) -> Self {
        CollectError::Io(e)
    }
}

impl From<procfs::parser::ParseError> for CollectError {
    fn from(e: procfs::parser::ParseError) -> Self {
        CollectError::Parse(e.detail().to_string())
    }
}
