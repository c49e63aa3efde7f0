use std::{convert::Infallible, net::SocketAddr};

use hyper::{
    Body, Request, Response, Server,
    service::{make_service_fn, service_fn}
};
use prometheus::{Encoder, TextEncoder};

async fn serve_metrics(_req: Request<Body>) -> Result<Response<Body>, Infallible> {
    let metric_families = prometheus::gather();
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        tracing::error!(error = %e, "failed to encode prometheus metrics");
        return Ok(Response::builder().status(500).body(Body::empty()).unwrap());
    }

    Ok(Response::builder()
        .header("content-type", encoder.format_type())
        .body(Body::from(buffer))
        .unwrap())
}

/// Spawns a `/metrics` HTTP endpoint on `port`, serving whatever has been
/// registered through `prometheus::register_*!` so far. Runs for the life of
/// the process; the returned handle is intentionally not awaited by callers.
pub async fn initialize_prometheus_metrics(port: u16) -> eyre::Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let make_svc = make_service_fn(|_conn| async { Ok::<_, Infallible>(service_fn(serve_metrics)) });
    let server = Server::try_bind(&addr)?.serve(make_svc);

    tokio::spawn(async move {
        if let Err(e) = server.await {
            tracing::error!(error = %e, "prometheus exporter server exited");
        }
    });

    tracing::info!(%addr, "prometheus metrics exporter listening");
    Ok(())
}
