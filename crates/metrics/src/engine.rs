use prometheus::{IntCounter, IntGauge};

use crate::METRICS_ENABLED;

#[derive(Clone)]
struct Inner {
    pools_hydrated:          IntCounter,
    hydration_batch_failures: IntCounter,
    sync_logs_received:      IntCounter,
    sync_logs_deduplicated:  IntCounter,
    sync_logs_dispatched:    IntCounter,
    batch_reconnects:        IntCounter,
    connected_observers:     IntGauge
}

impl Default for Inner {
    fn default() -> Self {
        let pools_hydrated = prometheus::register_int_counter!(
            "arb_pools_hydrated_total",
            "pools whose reserves were successfully hydrated"
        )
        .unwrap();

        let hydration_batch_failures = prometheus::register_int_counter!(
            "arb_hydration_batch_failures_total",
            "hydration batches that failed and were skipped"
        )
        .unwrap();

        let sync_logs_received = prometheus::register_int_counter!(
            "arb_sync_logs_received_total",
            "Sync events received over all subscription batches"
        )
        .unwrap();

        let sync_logs_deduplicated = prometheus::register_int_counter!(
            "arb_sync_logs_deduplicated_total",
            "Sync events dropped as duplicate transaction hashes"
        )
        .unwrap();

        let sync_logs_dispatched = prometheus::register_int_counter!(
            "arb_sync_logs_dispatched_total",
            "Sync events successfully decoded and dispatched to the evaluator"
        )
        .unwrap();

        let batch_reconnects = prometheus::register_int_counter!(
            "arb_subscriber_batch_reconnects_total",
            "subscription batch reconnect attempts"
        )
        .unwrap();

        let connected_observers = prometheus::register_int_gauge!(
            "arb_broadcaster_connected_observers",
            "observers currently subscribed to rate updates"
        )
        .unwrap();

        Self {
            pools_hydrated,
            hydration_batch_failures,
            sync_logs_received,
            sync_logs_deduplicated,
            sync_logs_dispatched,
            batch_reconnects,
            connected_observers
        }
    }
}

/// Engine-wide counters, a no-op when metrics are disabled. Mirrors the
/// teacher's `ConsensusMetricsWrapper(Option<ConsensusMetrics>)` shape.
#[derive(Clone, Default)]
pub struct EngineMetricsWrapper(Option<Inner>);

pub type EngineMetrics = EngineMetricsWrapper;

impl EngineMetricsWrapper {
    pub fn new() -> Self {
        Self(METRICS_ENABLED.get().copied().unwrap_or_default().then(Inner::default))
    }

    pub fn pools_hydrated(&self, count: u64) {
        if let Some(this) = self.0.as_ref() {
            this.pools_hydrated.inc_by(count);
        }
    }

    pub fn hydration_batch_failed(&self) {
        if let Some(this) = self.0.as_ref() {
            this.hydration_batch_failures.inc();
        }
    }

    pub fn sync_log_received(&self) {
        if let Some(this) = self.0.as_ref() {
            this.sync_logs_received.inc();
        }
    }

    pub fn sync_log_deduplicated(&self) {
        if let Some(this) = self.0.as_ref() {
            this.sync_logs_deduplicated.inc();
        }
    }

    pub fn sync_log_dispatched(&self) {
        if let Some(this) = self.0.as_ref() {
            this.sync_logs_dispatched.inc();
        }
    }

    pub fn batch_reconnected(&self) {
        if let Some(this) = self.0.as_ref() {
            this.batch_reconnects.inc();
        }
    }

    pub fn observer_connected(&self) {
        if let Some(this) = self.0.as_ref() {
            this.connected_observers.inc();
        }
    }

    pub fn observer_disconnected(&self) {
        if let Some(this) = self.0.as_ref() {
            this.connected_observers.dec();
        }
    }
}
