//! Cross-run state persistence.
//!
//! One prior snapshot's cumulative counters live in a small line-oriented
//! text file under the system temp directory. Every load miss - missing
//! file, bad version, bad headers - is a cold start, never an error: the
//! caller synthesizes a baseline at the current tick instead. Save
//! failures are reported as `false` and logged; a snapshot that cannot be
//! persisted is still a valid snapshot.
//!
//! File format (UTF-8, one datum per line):
//!
//! ```text
//! VERSION 1.0
//! TIMESTAMP 1234500
//! NETWORK_eth0_IN 1000000
//! NETWORK_eth0_OUT 2000000
//! DISK_sda_READ 409600000
//! DISK_sda_WRITE 204800000
//! ```
//!
//! Device names pass through verbatim except for tab/CR/LF, which become
//! `_`. Names may therefore contain spaces and underscores; the parser
//! splits the value off at the *last* space and the field suffix at the
//! *last* underscore, so `NETWORK_Ethernet 2_IN 500` round-trips. A name
//! that itself ends in `_IN`/`_OUT`/`_READ`/`_WRITE` is ambiguous on read
//! and folds into the shorter name; documented quirk, kept for
//! compatibility with existing state files.

use std::collections::BTreeMap;
use std::env;
use std::fmt::Write as _;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::model::SystemMetrics;

/// Major version this build writes and accepts. Minor revisions are
/// additive and readable by any build with the same major.
const STATE_VERSION: &str = "1.0";

/// Cumulative octet counters for one interface.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NetworkTotals {
    pub in_octets: u64,
    pub out_octets: u64,
}

/// Cumulative byte counters for one disk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiskTotals {
    pub read_bytes: u64,
    pub write_bytes: u64,
}

/// The previous run's snapshot, as far as rate computation needs it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersistedState {
    /// Clock tick the counters were captured at.
    pub timestamp: u64,
    pub network: BTreeMap<String, NetworkTotals>,
    pub disk: BTreeMap<String, DiskTotals>,
}

impl PersistedState {
    /// Extracts the persistable counters from a collected snapshot.
    pub fn from_metrics(metrics: &SystemMetrics) -> Self {
        let mut state = PersistedState {
            timestamp: metrics.timestamp,
            ..Default::default()
        };
        if let Some(interfaces) = &metrics.network {
            for i in interfaces {
                state.network.insert(
                    i.name.clone(),
                    NetworkTotals {
                        in_octets: i.total_in_octets,
                        out_octets: i.total_out_octets,
                    },
                );
            }
        }
        if let Some(disks) = &metrics.disks {
            for d in disks {
                state.disk.insert(
                    d.device_name.clone(),
                    DiskTotals {
                        read_bytes: d.total_bytes_read,
                        write_bytes: d.total_bytes_written,
                    },
                );
            }
        }
        state
    }

    /// Disk totals as `(read, written)` pairs for baseline seeding.
    pub fn disk_totals(&self) -> BTreeMap<String, (u64, u64)> {
        self.disk
            .iter()
            .map(|(name, t)| (name.clone(), (t.read_bytes, t.write_bytes)))
            .collect()
    }
}

/// Reads and writes the state file.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// State file at `<temp_dir>/<app_name>.dat`.
    pub fn new(app_name: &str) -> Self {
        Self {
            path: env::temp_dir().join(format!("{}.dat", app_name)),
        }
    }

    /// State file at an explicit path.
    pub fn with_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the previous run's state. `None` is a cold start: missing or
    /// empty file, bad `VERSION` or `TIMESTAMP` header, or an
    /// incompatible major version. Malformed counter lines are skipped
    /// individually.
    pub fn load(&self) -> Option<PersistedState> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "no prior state");
                return None;
            }
        };
        let mut lines = content.lines();

        let version = lines.next()?.strip_prefix("VERSION ")?;
        let major: u32 = version.split('.').next()?.trim().parse().ok()?;
        if major != 1 {
            debug!(version, "state file version not supported, cold start");
            return None;
        }

        let timestamp: u64 = lines
            .next()?
            .strip_prefix("TIMESTAMP ")?
            .trim()
            .parse()
            .ok()?;

        let mut state = PersistedState {
            timestamp,
            ..Default::default()
        };
        for line in lines {
            if line.trim().is_empty() {
                continue;
            }
            if parse_counter_line(line, &mut state).is_none() {
                debug!(line, "skipping malformed state line");
            }
        }
        Some(state)
    }

    /// Overwrites the state file. Returns `false` on I/O failure.
    pub fn save(&self, state: &PersistedState) -> bool {
        let mut out = String::new();
        // Infallible writes to a String; the _ = keeps the must_use quiet.
        let _ = writeln!(out, "VERSION {}", STATE_VERSION);
        let _ = writeln!(out, "TIMESTAMP {}", state.timestamp);
        for (name, totals) in &state.network {
            let name = sanitize_key(name);
            let _ = writeln!(out, "NETWORK_{}_IN {}", name, totals.in_octets);
            let _ = writeln!(out, "NETWORK_{}_OUT {}", name, totals.out_octets);
        }
        for (name, totals) in &state.disk {
            let name = sanitize_key(name);
            let _ = writeln!(out, "DISK_{}_READ {}", name, totals.read_bytes);
            let _ = writeln!(out, "DISK_{}_WRITE {}", name, totals.write_bytes);
        }

        match fs::write(&self.path, out) {
            Ok(()) => true,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to save state");
                false
            }
        }
    }
}

/// Control characters would corrupt the line format; everything else -
/// spaces included - passes through verbatim.
fn sanitize_key(name: &str) -> String {
    name.replace(['\t', '\r', '\n'], "_")
}

/// One `PREFIX_<name>_<FIELD> <value>` line. Value splits off at the last
/// space, field at the last underscore, so names keep their spaces and
/// underscores.
fn parse_counter_line(line: &str, state: &mut PersistedState) -> Option<()> {
    let (key, value) = line.rsplit_once(' ')?;
    let value: u64 = value.parse().ok()?;

    if let Some(rest) = key.strip_prefix("NETWORK_") {
        let (name, field) = rest.rsplit_once('_')?;
        let entry = state.network.entry(name.to_string()).or_default();
        match field {
            "IN" => entry.in_octets = value,
            "OUT" => entry.out_octets = value,
            _ => return None,
        }
    } else if let Some(rest) = key.strip_prefix("DISK_") {
        let (name, field) = rest.rsplit_once('_')?;
        let entry = state.disk.entry(name.to_string()).or_default();
        match field {
            "READ" => entry.read_bytes = value,
            "WRITE" => entry.write_bytes = value,
            _ => return None,
        }
    } else {
        return None;
    }
    Some(())
}
