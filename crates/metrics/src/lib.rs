//! Ambient Prometheus counters (§10.7), gated behind `METRICS_ENABLED` the
//! same way the teacher's `angstrom-metrics` gates its own counters.

mod exporter;
use std::sync::OnceLock;

pub use exporter::initialize_prometheus_metrics;

mod engine;
pub use engine::{EngineMetrics, EngineMetricsWrapper};

pub static METRICS_ENABLED: OnceLock<bool> = OnceLock::new();
