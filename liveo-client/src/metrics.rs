//! Client metrics
//!
//! OpenTelemetry instruments for the transport and the results feed. They are
//! created only when the client is built with observability enabled; otherwise
//! nothing is recorded.
//!
//! # Metrics Collected
//!
//! - **liveo.client.connection.state**: 0 disconnected, 1 connecting, 2 open (gauge)
//! - **liveo.client.requests.total**: API requests by action and status (counter)
//! - **liveo.client.request.duration**: API request latency in seconds (histogram)
//! - **liveo.client.errors.total**: errors by kind (counter)
//! - **liveo.client.reconnection.attempts** / **.success** (counters)
//! - **liveo.client.events.received**: events by name (counter)
//! - **liveo.feed.deltas.applied** / **liveo.feed.rebases** (counters)

use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, Meter},
    KeyValue,
};

pub struct ClientMetrics {
    pub connection_state: Gauge<i64>,
    pub requests_total: Counter<u64>,
    pub request_duration: Histogram<f64>,
    pub errors_total: Counter<u64>,
    pub reconnection_attempts: Counter<u64>,
    pub reconnection_success: Counter<u64>,
    pub events_received: Counter<u64>,
    pub deltas_applied: Counter<u64>,
    pub rebases: Counter<u64>,
}

impl ClientMetrics {
    /// Instruments on the global meter provider, scoped to `service_name`
    pub fn new(service_name: impl Into<String>) -> Self {
        let name: &'static str = Box::leak(service_name.into().into_boxed_str());
        let meter = global::meter(name);
        Self::new_with_meter(&meter)
    }

    pub fn new_with_meter(meter: &Meter) -> Self {
        Self {
            connection_state: meter
                .i64_gauge("liveo.client.connection.state")
                .with_description("Connection state (0=disconnected, 1=connecting, 2=open)")
                .build(),
            requests_total: meter
                .u64_counter("liveo.client.requests.total")
                .with_description("Total number of API requests sent")
                .build(),
            request_duration: meter
                .f64_histogram("liveo.client.request.duration")
                .with_description("API request duration in seconds")
                .build(),
            errors_total: meter
                .u64_counter("liveo.client.errors.total")
                .with_description("Total number of errors encountered")
                .build(),
            reconnection_attempts: meter
                .u64_counter("liveo.client.reconnection.attempts")
                .with_description("Total number of reconnection attempts")
                .build(),
            reconnection_success: meter
                .u64_counter("liveo.client.reconnection.success")
                .with_description("Total number of successful reconnections")
                .build(),
            events_received: meter
                .u64_counter("liveo.client.events.received")
                .with_description("Total number of server events received")
                .build(),
            deltas_applied: meter
                .u64_counter("liveo.feed.deltas.applied")
                .with_description("Deltas reconciled onto the current snapshot")
                .build(),
            rebases: meter
                .u64_counter("liveo.feed.rebases")
                .with_description("Full result requests caused by unusable deltas")
                .build(),
        }
    }

    pub fn update_connection_state(&self, state: i64) {
        self.connection_state.record(state, &[]);
    }

    pub fn record_request(&self, action: &str, status: &str, duration_secs: f64) {
        let attributes = &[
            KeyValue::new("action", action.to_string()),
            KeyValue::new("status", status.to_string()),
        ];
        self.requests_total.add(1, attributes);
        self.request_duration.record(duration_secs, attributes);
    }

    pub fn record_error(&self, error_type: &str) {
        let attributes = &[KeyValue::new("error_type", error_type.to_string())];
        self.errors_total.add(1, attributes);
    }

    pub fn record_reconnection_attempt(&self) {
        self.reconnection_attempts.add(1, &[]);
    }

    pub fn record_reconnection_success(&self) {
        self.reconnection_success.add(1, &[]);
    }

    pub fn record_event(&self, name: &str) {
        let attributes = &[KeyValue::new("name", name.to_string())];
        self.events_received.add(1, attributes);
    }

    pub fn record_delta_applied(&self) {
        self.deltas_applied.add(1, &[]);
    }

    pub fn record_rebase(&self, reason: &str) {
        let attributes = &[KeyValue::new("reason", reason.to_string())];
        self.rebases.add(1, attributes);
    }
}
