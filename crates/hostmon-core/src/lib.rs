//! hostmon-core - library behind the hostmon CLI.
//!
//! Provides:
//! - `model` - snapshot data types (CPU, memory, disk, network, temperature)
//! - `clock` - monotonic tick source for rate computation
//! - `rates` - pure delta/rate arithmetic shared by all counter-based samplers
//! - `collector` - per-family samplers reading `/proc` and `/sys`, with
//!   mocking support for tests
//! - `state` - one-snapshot cross-run persistence (the `.dat` state file)
//! - `session` - one-shot and continuous sampling orchestration
//! - `output` - text / JSON / CSV rendering of a snapshot
//! - `fmt` - shared human-unit formatting helpers

pub mod clock;
pub mod collector;
pub mod fmt;
pub mod model;
pub mod output;
pub mod rates;
pub mod session;
pub mod state;
