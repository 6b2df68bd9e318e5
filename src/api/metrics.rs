use actix_web::HttpResponse;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static REQUEST_COUNT: AtomicU64 = AtomicU64::new(0);
static ERROR_COUNT: AtomicU64 = AtomicU64::new(0);
static ASSISTANT_MESSAGES: AtomicU64 = AtomicU64::new(0);
static CRISIS_EVENTS: AtomicU64 = AtomicU64::new(0);
static FLAGGED_MESSAGES: AtomicU64 = AtomicU64::new(0);

pub fn increment_request_count() {
    REQUEST_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_error_count() {
    ERROR_COUNT.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_assistant_messages() {
    ASSISTANT_MESSAGES.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_crisis_events() {
    CRISIS_EVENTS.fetch_add(1, Ordering::Relaxed);
}

pub fn increment_flagged_messages() {
    FLAGGED_MESSAGES.fetch_add(1, Ordering::Relaxed);
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct MetricsResponse {
    pub http_requests_total: u64,
    pub http_errors_total: u64,
    pub assistant_messages_total: u64,
    pub crisis_events_total: u64,
    pub flagged_forum_messages_total: u64,
}

impl MetricsResponse {
    pub fn snapshot() -> Self {
        Self {
            http_requests_total: REQUEST_COUNT.load(Ordering::Relaxed),
            http_errors_total: ERROR_COUNT.load(Ordering::Relaxed),
            assistant_messages_total: ASSISTANT_MESSAGES.load(Ordering::Relaxed),
            crisis_events_total: CRISIS_EVENTS.load(Ordering::Relaxed),
            flagged_forum_messages_total: FLAGGED_MESSAGES.load(Ordering::Relaxed),
        }
    }

    /// Prometheus text exposition format.
    pub fn render(&self) -> String {
        let counters = [
            ("http_requests_total", "Total number of HTTP requests", self.http_requests_total),
            ("http_errors_total", "Total number of HTTP errors", self.http_errors_total),
            ("assistant_messages_total", "Messages handled by the chat assistant", self.assistant_messages_total),
            ("crisis_events_total", "Crisis escalations triggered", self.crisis_events_total),
            ("flagged_forum_messages_total", "Forum posts flagged for concerning content", self.flagged_forum_messages_total),
        ];

        counters
            .iter()
            .map(|(name, help, value)| {
                format!("# HELP {name} {help}\n# TYPE {name} counter\n{name} {value}\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[utoipa::path(
    get,
    path = "/metrics",
    tag = "Health",
    responses(
        (status = 200, description = "System metrics in Prometheus text format", body = MetricsResponse)
    )
)]
pub async fn get_metrics() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(MetricsResponse::snapshot().render())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_exposes_every_counter() {
        let text = MetricsResponse {
            http_requests_total: 12,
            http_errors_total: 1,
            assistant_messages_total: 4,
            crisis_events_total: 2,
            flagged_forum_messages_total: 3,
        }
        .render();

        assert!(text.contains("# TYPE http_requests_total counter\nhttp_requests_total 12\n"));
        assert!(text.contains("crisis_events_total 2\n"));
        assert!(text.contains("flagged_forum_messages_total 3\n"));
        assert_eq!(text.matches("# HELP").count(), 5);
    }

    #[test]
    fn test_counters_only_grow() {
        let before = MetricsResponse::snapshot();
        increment_crisis_events();
        increment_flagged_messages();
        let after = MetricsResponse::snapshot();
        assert!(after.crisis_events_total > before.crisis_events_total);
        assert!(after.flagged_forum_messages_total > before.flagged_forum_messages_total);
    }
}
