//! Counters for statement, query and transaction activity.
//!
//! Handlers and the hosting database report through `sink::record` only;
//! nothing outside this module touches the global counters.

pub(crate) mod metrics;
pub(crate) mod sink;

// re-exports
pub use metrics::{EventOps, EventReport};
pub use sink::{
    CacheOutcome, MetricsEvent, MetricsSink, TxPhase, metrics_report, metrics_reset_all,
    with_metrics_sink,
};
