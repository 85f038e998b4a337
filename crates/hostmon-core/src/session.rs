//! The sampling session: wires the collectors, the state store, and the
//! output formats into one-shot and continuous runs.
//!
//! The session owns the cross-run story. In one-shot mode every
//! invocation loads the previous run's counters, samples once against
//! them, and saves the new counters back. In continuous mode the state
//! file is read once at startup and then the loop rates against its own
//! in-memory previous snapshot, persisting only on the way out.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::collector::disk::SpaceProvider;
use crate::collector::{CollectError, FileSystem, MetricsCollector};
use crate::model::SystemMetrics;
use crate::output::{self, OutputOptions};
use crate::rates;
use crate::state::{NetworkTotals, PersistedState, StateStore};

/// Cooperative cancellation flag, checked at iteration boundaries. The
/// in-flight iteration always completes before the loop exits.
#[derive(Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub output: OutputOptions,
    /// Delay between continuous-mode iterations.
    pub interval: Duration,
    pub continuous: bool,
    /// Overrides the collector's baseline gap; tests use `Some(ZERO)`.
    pub baseline_gap: Option<Duration>,
}

pub struct SamplingSession<F: FileSystem + Clone, C: Clock, S: SpaceProvider> {
    collector: MetricsCollector<F, C, S>,
    clock: C,
    store: StateStore,
    config: SessionConfig,
}

impl<F: FileSystem + Clone, C: Clock, S: SpaceProvider> SamplingSession<F, C, S> {
    pub fn new(
        collector: MetricsCollector<F, C, S>,
        clock: C,
        store: StateStore,
        config: SessionConfig,
    ) -> Self {
        Self {
            collector,
            clock,
            store,
            config,
        }
    }

    /// Runs the session to completion, writing rendered snapshots to
    /// `out`. Clock failures abort; everything else degrades and logs.
    pub fn run(&mut self, out: &mut impl Write, cancel: &CancelToken) -> Result<(), CollectError> {
        self.collector.initialize();

        // The baseline pass: rates from it are discarded, its counters
        // become the in-memory previous snapshot.
        let baseline_tick = self.clock.ticks()?;
        let baseline = self.collector.collect(baseline_tick);
        let mut prev_tick = baseline_tick;
        let mut prev_network = network_totals(&baseline);

        match self.store.load() {
            Some(state) => {
                debug!(timestamp = state.timestamp, "loaded prior state");
                if let Some(disk) = self.collector.disk_sampler() {
                    disk.seed_baseline(state.timestamp, &state.disk_totals());
                }
                prev_tick = state.timestamp;
                prev_network = state.network;
            }
            None => debug!("no prior state, cold start"),
        }

        let gap = self
            .config
            .baseline_gap
            .unwrap_or_else(|| self.collector.baseline_gap());
        sleep_with_cancel(gap, cancel);

        let mut last: Option<SystemMetrics> = None;
        let mut first_emit = true;
        // A failed write still goes through the persist-and-cleanup exit
        // below; only the error is deferred.
        let mut exit_err: Option<CollectError> = None;
        loop {
            match self.cycle(prev_tick, &prev_network) {
                Ok(metrics) => {
                    if !self.config.continuous && metrics.is_empty() {
                        // Nothing collected means nothing worth saving;
                        // clobbering the prior state would only hurt.
                        self.collector.cleanup();
                        return Err(CollectError::Unavailable(
                            "no metric family collected".to_string(),
                        ));
                    }
                    let rendered = output::render(
                        &metrics,
                        &self.config.output,
                        SystemTime::now(),
                        first_emit,
                    );
                    let written = out
                        .write_all(rendered.as_bytes())
                        .and_then(|()| out.flush());

                    prev_tick = metrics.timestamp;
                    prev_network = network_totals(&metrics);
                    last = Some(metrics);

                    if let Err(e) = written {
                        exit_err = Some(e.into());
                        break;
                    }
                    first_emit = false;
                }
                Err(e) if self.config.continuous => {
                    warn!(error = %e, "sampling cycle failed");
                }
                Err(e) => {
                    self.collector.cleanup();
                    return Err(e);
                }
            }

            if !self.config.continuous || cancel.is_cancelled() {
                break;
            }
            sleep_with_cancel(self.config.interval, cancel);
            if cancel.is_cancelled() {
                break;
            }
        }

        if let Some(metrics) = &last {
            if self.store.save(&PersistedState::from_metrics(metrics)) {
                debug!(path = %self.store.path().display(), "state saved");
            }
        }
        if self.config.continuous {
            info!("sampling stopped");
        }
        self.collector.cleanup();
        match exit_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// One collection pass with network rates applied against the given
    /// previous counters.
    fn cycle(
        &mut self,
        prev_tick: u64,
        prev_network: &BTreeMap<String, NetworkTotals>,
    ) -> Result<SystemMetrics, CollectError> {
        let tick = self.clock.ticks()?;
        let mut metrics = self.collector.collect(tick);
        apply_network_rates(&mut metrics, prev_tick, prev_network, self.clock.frequency());
        Ok(metrics)
    }
}

/// Cumulative octet counters per interface, for the next cycle's rates.
fn network_totals(metrics: &SystemMetrics) -> BTreeMap<String, NetworkTotals> {
    let mut totals = BTreeMap::new();
    if let Some(interfaces) = &metrics.network {
        for i in interfaces {
            totals.insert(
                i.name.clone(),
                NetworkTotals {
                    in_octets: i.total_in_octets,
                    out_octets: i.total_out_octets,
                },
            );
        }
    }
    totals
}

/// Turns raw octet counters into rates. An interface absent from the
/// previous counters keeps rate 0 for this sample only.
fn apply_network_rates(
    metrics: &mut SystemMetrics,
    prev_tick: u64,
    prev: &BTreeMap<String, NetworkTotals>,
    frequency: u64,
) {
    let elapsed = rates::elapsed_seconds(metrics.timestamp, prev_tick, frequency);
    let Some(interfaces) = &mut metrics.network else {
        return;
    };
    for i in interfaces {
        let Some(p) = prev.get(&i.name) else {
            continue;
        };
        i.in_bytes_per_sec = rates::rate(i.total_in_octets, p.in_octets, elapsed);
        i.out_bytes_per_sec = rates::rate(i.total_out_octets, p.out_octets, elapsed);
    }
}

/// Sleeps in short slices so cancellation cuts a long interval short.
fn sleep_with_cancel(duration: Duration, cancel: &CancelToken) {
    const SLICE: Duration = Duration::from_millis(100);

    let mut remaining = duration;
    while !remaining.is_zero() && !cancel.is_cancelled() {
        let step = remaining.min(SLICE);
        std::thread::sleep(step);
        remaining -= step;
    }
}
