//! Tracing setup and the per-request log line.
//!
//! Console output is compact and filtered by `RUST_LOG`. Errors go to a
//! daily text file and everything at `info` and above to a daily JSON file
//! under `LOG_DIR` (default `storage/logs`). Spans are exported over OTLP
//! when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.

use axum::{
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
};
use opentelemetry::{KeyValue, global, trace::TraceError};
use opentelemetry_otlp::WithExportConfig;
use opentelemetry_sdk::{
    Resource,
    propagation::TraceContextPropagator,
    runtime,
    trace::{self, Tracer},
};
use opentelemetry_semantic_conventions::resource::{SERVICE_NAME, SERVICE_VERSION};
use std::time::Instant;
use tracing::{Level, error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

/// Response header carrying the id logged for the request.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

fn status_level(status: u16) -> Level {
    match status {
        400..=499 => Level::WARN,
        500..=599 => Level::ERROR,
        _ => Level::INFO,
    }
}

pub async fn logging_middleware(req: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = req.method().clone();
    let matched_path = req
        .extensions()
        .get::<MatchedPath>()
        .map(|p| p.as_str().to_string())
        .unwrap_or_else(|| req.uri().path().to_string());

    let request_id = uuid::Uuid::new_v4().to_string();

    let mut response = next.run(req).await;
    let latency_ms = start.elapsed().as_millis();
    let status = response.status().as_u16();

    match status_level(status) {
        Level::ERROR => error!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms,
            "Server error"
        ),
        Level::WARN => warn!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms,
            "Client error"
        ),
        _ => info!(
            request_id = %request_id,
            method = %method,
            path = %matched_path,
            status,
            latency_ms,
            "Request completed"
        ),
    }

    if let Ok(value) = request_id.parse() {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }

    response
}

/// Batch OTLP exporter over gRPC, tagged with the crate name, version and
/// `ENVIRONMENT`.
fn init_tracer(endpoint: String) -> Result<Tracer, TraceError> {
    global::set_text_map_propagator(TraceContextPropagator::new());

    let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());
    let trace_config = trace::Config::default().with_resource(Resource::new([
        KeyValue::new(SERVICE_NAME, env!("CARGO_PKG_NAME")),
        KeyValue::new(SERVICE_VERSION, env!("CARGO_PKG_VERSION")),
        KeyValue::new("deployment.environment", environment),
    ]));

    opentelemetry_otlp::new_pipeline()
        .tracing()
        .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
        .with_trace_config(trace_config)
        .install_batch(runtime::Tokio)
}

/// Installs the global subscriber. Fails only when the log directory cannot
/// be created.
pub fn init_tracing() -> std::io::Result<()> {
    let log_dir = std::env::var("LOG_DIR").unwrap_or_else(|_| "storage/logs".to_string());
    std::fs::create_dir_all(&log_dir)?;

    let default_directives = format!(
        "{}=info,scolaris_cache=info,tower_http=warn,axum::rejection=trace",
        env!("CARGO_CRATE_NAME")
    );
    let console = fmt::layer()
        .compact()
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives)),
        );

    let errors_file = fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_file(true)
        .with_line_number(true)
        .with_writer(rolling::daily(&log_dir, "scolaris.log"))
        .with_filter(LevelFilter::ERROR);

    let json_file = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(rolling::daily(&log_dir, "scolaris.json"))
        .with_filter(LevelFilter::INFO);

    let registry = tracing_subscriber::registry()
        .with(console)
        .with(errors_file)
        .with(json_file);
    let (otel, otel_error) = match std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT") {
        Ok(endpoint) => match init_tracer(endpoint) {
            Ok(tracer) => (Some(tracing_opentelemetry::layer().with_tracer(tracer)), None),
            Err(e) => (None, Some(e)),
        },
        Err(_) => (None, None),
    };
    let exporting = otel.is_some();
    registry.with(otel).init();

    if let Some(e) = otel_error {
        warn!(error = %e, "OpenTelemetry exporter setup failed, spans stay local");
    }
    info!(log_dir = %log_dir, otlp = exporting, "Tracing initialized");
    Ok(())
}

pub fn shutdown_tracer() {
    global::shutdown_tracer_provider();
    info!("OpenTelemetry tracer shut down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_level() {
        assert_eq!(status_level(200), Level::INFO);
        assert_eq!(status_level(304), Level::INFO);
        assert_eq!(status_level(404), Level::WARN);
        assert_eq!(status_level(503), Level::ERROR);
    }
}
