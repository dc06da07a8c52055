//! Prometheus exporter for the worker binary.
//!
//! Task counters are recorded by `voxreel-queue` and command timings by
//! `voxreel-media`; this module only installs the recorder.

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use crate::error::{WorkerError, WorkerResult};

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> WorkerResult<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| WorkerError::config_error(format!("metrics exporter: {}", e)))?;
    info!(addr = %addr, "Prometheus exporter listening");
    Ok(())
}
