//! Process-wide ambient concerns shared by every component: tracing
//! initialization today, grounded on the teacher's `bin/testnet/src/cli/mod.rs`
//! `init_tracing`.

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

/// Installs the global tracing subscriber: an ANSI stdout layer plus a
/// non-blocking daily-rotated file layer writing to `log_file_name`. Returns
/// the file layer's `WorkerGuard`, which the caller must hold for the life of
/// the process — dropping it stops the background writer before buffered
/// lines are flushed.
///
/// `RUST_LOG` is honored when set; otherwise every workspace crate is
/// filtered to `INFO`.
pub fn init_tracing(log_file_name: &str) -> WorkerGuard {
    let stdout_layer = tracing_subscriber::fmt::layer().with_ansi(true).with_target(true);

    let file_appender = tracing_appender::rolling::daily(".", log_file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer =
        tracing_subscriber::fmt::layer().with_ansi(false).with_target(true).with_writer(non_blocking);

    let envfilter = filter::EnvFilter::builder().try_from_env().ok();

    if let Some(f) = envfilter {
        let _ = tracing_subscriber::registry().with(stdout_layer).with(file_layer).with(f).try_init();
    } else {
        let level = Level::INFO;
        let targets = filter::Targets::new()
            .with_target("arb_engine", level)
            .with_target("arb_store", level)
            .with_target("arb_hydrator", level)
            .with_target("arb_subscriber", level)
            .with_target("arb_evaluator", level)
            .with_target("arb_broadcaster", level)
            .with_target("arb_types", level);
        let _ = tracing_subscriber::registry()
            .with(stdout_layer)
            .with(file_layer)
            .with(targets)
            .try_init();
    }

    guard
}
