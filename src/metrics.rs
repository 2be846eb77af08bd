use axum::{
    Router,
    extract::{MatchedPath, Request},
    middleware::Next,
    response::Response,
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;
use std::time::{Duration, Instant};

static OBSERVABILITY_ENABLED: OnceLock<bool> = OnceLock::new();

const UPKEEP_INTERVAL: Duration = Duration::from_secs(5);

/// `OBSERVABILITY_ENABLED`, on unless set to `false` or `0`.
pub fn is_observability_enabled() -> bool {
    *OBSERVABILITY_ENABLED.get_or_init(|| {
        std::env::var("OBSERVABILITY_ENABLED")
            .map(|v| v.to_lowercase() != "false" && v != "0")
            .unwrap_or(true)
    })
}

/// Installs the Prometheus recorder and its upkeep task. `Ok(None)` when
/// observability is disabled.
pub fn init_metrics() -> Result<Option<PrometheusHandle>, BuildError> {
    if !is_observability_enabled() {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full("http_request_duration_seconds".to_string()),
            &[
                0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0,
            ],
        )?
        .install_recorder()?;

    let upkeep = handle.clone();
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(UPKEEP_INTERVAL);
        loop {
            ticker.tick().await;
            upkeep.run_upkeep();
        }
    });

    Ok(Some(handle))
}

/// Keeps `http_requests_active` balanced even when the handler future is
/// dropped before completing.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        gauge!("http_requests_active").increment(1.0);
        InFlight
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        gauge!("http_requests_active").decrement(1.0);
    }
}

pub async fn metrics_middleware(req: Request, next: Next) -> Response {
    if !is_observability_enabled() {
        return next.run(req).await;
    }

    let method = req.method().as_str().to_owned();
    // Unmatched paths share one series.
    let route = req
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| "unmatched".to_owned(), |p| p.as_str().to_owned());

    let _in_flight = InFlight::enter();
    let started = Instant::now();
    let response = next.run(req).await;
    let elapsed = started.elapsed().as_secs_f64();

    let status = response.status().as_u16().to_string();
    counter!("http_requests_total", "method" => method.clone(), "path" => route.clone(), "status" => status)
        .increment(1);
    histogram!("http_request_duration_seconds", "method" => method, "path" => route).record(elapsed);

    response
}

pub fn metrics_router(handle: PrometheusHandle) -> Router {
    Router::new().route("/metrics", get(move || async move { handle.render() }))
}

fn when_enabled(record: impl FnOnce()) {
    if is_observability_enabled() {
        record();
    }
}

// Domain counters

pub fn track_school_registered() {
    when_enabled(|| counter!("schools_registered_total").increment(1));
}

/// `action` is one of `suspend`, `activate`, `pause`, `resume`, `extend`.
pub fn track_subscription_transition(action: &'static str) {
    when_enabled(|| counter!("subscription_transitions_total", "action" => action).increment(1));
}

pub fn track_grades_recorded(count: usize) {
    when_enabled(|| counter!("grades_recorded_total").increment(count as u64));
}

pub fn track_user_login_success(role: &str) {
    let role = role.to_owned();
    when_enabled(|| {
        counter!("user_logins_total", "role" => role, "status" => "success").increment(1)
    });
}

pub fn track_user_login_failure(reason: &'static str) {
    when_enabled(|| {
        counter!("user_logins_total", "role" => "unknown", "status" => "failure", "reason" => reason)
            .increment(1)
    });
}

pub fn track_jwt_issued() {
    when_enabled(|| counter!("jwt_tokens_issued_total").increment(1));
}

pub fn track_jwt_validation(valid: bool) {
    let status = if valid { "valid" } else { "invalid" };
    when_enabled(|| counter!("jwt_validations_total", "status" => status).increment(1));
}

pub fn track_authorization_check(allowed: bool, role: &str) {
    let status = if allowed { "allowed" } else { "denied" };
    let role = role.to_owned();
    when_enabled(|| {
        counter!("authorization_checks_total", "role" => role, "status" => status).increment(1)
    });
}

/// `kind` is `document` or `notification_media`.
pub fn track_upload(kind: &'static str, bytes: usize) {
    when_enabled(|| {
        counter!("uploads_total", "kind" => kind).increment(1);
        histogram!("upload_size_bytes", "kind" => kind).record(bytes as f64);
    });
}
