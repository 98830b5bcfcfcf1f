//! Prometheus metrics for the API server.

use std::time::Instant;

use axum::body::Body;
use axum::http::{Request, Response};
use axum::middleware::Next;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder.
/// Returns a handle that can be used to render metrics.
pub fn init_metrics() -> PrometheusHandle {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
}

/// Metric names as constants for consistency.
pub mod names {
    pub const HTTP_REQUESTS_TOTAL: &str = "playline_http_requests_total";
    pub const HTTP_REQUEST_DURATION_SECONDS: &str = "playline_http_request_duration_seconds";
    pub const HTTP_REQUESTS_IN_FLIGHT: &str = "playline_http_requests_in_flight";

    pub const EVENTS_RECORDED_TOTAL: &str = "playline_events_recorded_total";
    pub const SESSIONS_OPENED_TOTAL: &str = "playline_sessions_opened_total";
    pub const AGGREGATES_SERVED_TOTAL: &str = "playline_aggregates_served_total";

    pub const RATE_LIMIT_HITS_TOTAL: &str = "playline_rate_limit_hits_total";
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

/// Record events accepted into a session.
pub fn record_events_recorded(count: u64) {
    counter!(names::EVENTS_RECORDED_TOTAL).increment(count);
}

/// Record an interaction session being opened.
pub fn record_session_opened() {
    counter!(names::SESSIONS_OPENED_TOTAL).increment(1);
}

/// Record an aggregate response.
pub fn record_aggregate_served() {
    counter!(names::AGGREGATES_SERVED_TOTAL).increment(1);
}

/// Record rate limit hit.
pub fn record_rate_limit_hit(endpoint: &str) {
    let labels = [("endpoint", endpoint.to_string())];
    counter!(names::RATE_LIMIT_HITS_TOTAL, &labels).increment(1);
}

/// Sanitize path for metrics labels (replace tokens and video ids).
fn sanitize_path(path: &str) -> String {
    let path = regex_lite::Regex::new(r"/sessions/[0-9a-f]{32}")
        .unwrap()
        .replace_all(path, "/sessions/:token");
    let path = regex_lite::Regex::new(r"/videos/[^/]+")
        .unwrap()
        .replace_all(&path, "/videos/:video_id");
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
    let duration = start.elapsed().as_secs_f64();

    record_http_request(&method, &path, status, duration);

    response
}
