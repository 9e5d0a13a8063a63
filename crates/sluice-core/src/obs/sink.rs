//! Event routing for runtime counters.
//!
//! Handlers emit `MetricsEvent`s; the active `MetricsSink` decides where
//! they land. Without a scoped override, events go to the global counters.
use crate::obs::metrics::{self, EventReport};
use std::{cell::RefCell, rc::Rc};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = RefCell::new(None);
}

///
/// CacheOutcome
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CacheOutcome {
    /// The cached resource already existed.
    Hit,
    /// The cached resource was created by this acquire.
    Init,
    /// The slot was in use; a fresh resource was created.
    Ephemeral,
}

///
/// TxPhase
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TxPhase {
    Begin,
    Commit,
    Rollback,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MetricsEvent {
    Acquire { outcome: CacheOutcome },
    Release { cached: bool },
    Transaction { phase: TxPhase },
    MigrationStep { start: u32, end: u32 },
    TableCreated { table: &'static str },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent);
}

/// GlobalMetricsSink
/// Default process-wide sink that writes into the global counters.
/// Acts as the concrete sink when no scoped override is installed.

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent) {
        metrics::with_state_mut(|m| {
            let ops = &mut m.ops;
            match event {
                MetricsEvent::Acquire { outcome } => match outcome {
                    CacheOutcome::Hit => ops.cache_hits = ops.cache_hits.saturating_add(1),
                    CacheOutcome::Init => ops.cache_inits = ops.cache_inits.saturating_add(1),
                    CacheOutcome::Ephemeral => {
                        ops.ephemeral_fallbacks = ops.ephemeral_fallbacks.saturating_add(1);
                    }
                },
                MetricsEvent::Release { cached: true } => {
                    ops.cached_releases = ops.cached_releases.saturating_add(1);
                }
                MetricsEvent::Release { cached: false } => {
                    ops.ephemeral_releases = ops.ephemeral_releases.saturating_add(1);
                }
                MetricsEvent::Transaction { phase } => match phase {
                    TxPhase::Begin => ops.tx_begins = ops.tx_begins.saturating_add(1),
                    TxPhase::Commit => ops.tx_commits = ops.tx_commits.saturating_add(1),
                    TxPhase::Rollback => ops.tx_rollbacks = ops.tx_rollbacks.saturating_add(1),
                },
                MetricsEvent::MigrationStep { .. } => {
                    ops.migration_steps = ops.migration_steps.saturating_add(1);
                }
                MetricsEvent::TableCreated { .. } => {
                    ops.tables_created = ops.tables_created.saturating_add(1);
                }
            }
        });
    }
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent) {
    let scoped = SINK_OVERRIDE.with(|cell| cell.borrow().clone());

    match scoped {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Route this thread's events to `sink` while `f` runs.
pub fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

/// Snapshot the global counters.
#[must_use]
pub fn metrics_report() -> EventReport {
    metrics::report()
}

pub fn metrics_reset_all() {
    metrics::reset_all();
}
