//! Prometheus metrics for the job server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return its render handle.
pub fn init_metrics() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Metric names as constants for consistency.
pub mod names {
    // HTTP metrics
    pub const HTTP_REQUESTS_TOTAL: &str = "reel_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "reel_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "reel_http_requests_in_flight";

    // Job metrics
    pub const JOBS_SUBMITTED_TOTAL: &str = "reel_jobs_submitted_total";
    pub const JOBS_COMPLETED_TOTAL: &str = "reel_jobs_completed_total";
    pub const JOBS_FAILED_TOTAL: &str = "reel_jobs_failed_total";
    pub const GENERATION_DURATION_SECONDS: &str = "reel_generation_duration_seconds";
}

/// Record an HTTP request.
pub fn record_http_request(method: &str, path: &str, status: u16, duration_secs: f64) {
    let labels = [
        ("method", method.to_string()),
        ("path", sanitize_path(path)),
        ("status", status.to_string()),
    ];

    counter!(names::HTTP_REQUESTS_TOTAL, &labels).increment(1);
    histogram!(names::HTTP_REQUEST_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record job submitted. `mode` is `async` or `sync`.
pub fn record_job_submitted(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_SUBMITTED_TOTAL, &labels).increment(1);
}

/// Record job completed along with its generation time.
pub fn record_job_completed(mode: &str, duration_secs: f64) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_COMPLETED_TOTAL, &labels).increment(1);
    histogram!(names::GENERATION_DURATION_SECONDS, &labels).record(duration_secs);
}

/// Record job failed.
pub fn record_job_failed(mode: &str) {
    let labels = [("mode", mode.to_string())];
    counter!(names::JOBS_FAILED_TOTAL, &labels).increment(1);
}

/// Collapse job ids in paths so labels stay bounded.
fn sanitize_path(path: &str) -> String {
    for prefix in ["/status/", "/download/"] {
        if let Some(rest) = path.strip_prefix(prefix) {
            if !rest.is_empty() {
                return format!("{}:job_id", prefix);
            }
        }
    }
    path.to_string()
}

/// Metrics middleware for HTTP requests.
pub async fn metrics_middleware(request: Request<Body>, next: Next) -> Response<Body> {
    let method = request.method().to_string();
    let path = request.uri().path().to_string();
    let start = Instant::now();

    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
    let response = next.run(request).await;
    gauge!(names::HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);

    let status = response.status().as_u16();
    record_http_request(&method, &path, status, start.elapsed().as_secs_f64());

    response
}
