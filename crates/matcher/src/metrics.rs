// Metrics hooks for the `matcher` crate.
//
// Callers install a global `MatchMetrics` implementation via
// [`set_match_metrics`]; the ranking and graph operations then report their
// latency and output sizes. This keeps instrumentation decoupled from any
// specific metrics backend.
use std::sync::{Arc, RwLock};
use std::time::Duration;

use once_cell::sync::OnceCell;

/// Metrics observer for exact-similarity operations.
pub trait MatchMetrics: Send + Sync {
    /// Record one ranking: `compared` documents were scored against the
    /// query and `hit_count` had non-zero similarity.
    fn record_rank(&self, latency: Duration, compared: usize, hit_count: usize);

    /// Record one pairwise-graph computation over `pairs` document pairs
    /// that produced `edges` edges.
    fn record_graph(&self, latency: Duration, pairs: usize, edges: usize);
}

fn metrics_lock() -> &'static RwLock<Option<Arc<dyn MatchMetrics>>> {
    static METRICS: OnceCell<RwLock<Option<Arc<dyn MatchMetrics>>>> = OnceCell::new();
    METRICS.get_or_init(|| RwLock::new(None))
}

pub(crate) fn metrics_recorder() -> Option<Arc<dyn MatchMetrics>> {
    let guard = metrics_lock()
        .read()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    guard.clone()
}

/// Install or clear the global match metrics recorder.
pub fn set_match_metrics(recorder: Option<Arc<dyn MatchMetrics>>) {
    let lock = metrics_lock();
    let mut guard = lock.write().unwrap_or_else(|poisoned| poisoned.into_inner());
    *guard = recorder;
}
