use std::net::SocketAddr;

// ── RED metrics (request-driven) ────────────────────────────────

/// Counter: postings successfully reserved.
pub const RESERVATIONS_TOTAL: &str = "curbside_reservations_total";

/// Counter: reservation attempts that lost the conditional update.
pub const RESERVATION_CONFLICTS_TOTAL: &str = "curbside_reservation_conflicts_total";

/// Counter: leftover-fragment inserts that failed after a committed reservation.
pub const FRAGMENT_INSERT_FAILURES_TOTAL: &str = "curbside_fragment_insert_failures_total";

/// Counter: bookings created.
pub const BOOKINGS_TOTAL: &str = "curbside_bookings_total";

/// Counter: booking attempts rejected for overlapping an active booking.
pub const BOOKING_CONFLICTS_TOTAL: &str = "curbside_booking_conflicts_total";

/// Counter: bookings cancelled.
pub const BOOKINGS_CANCELLED_TOTAL: &str = "curbside_bookings_cancelled_total";

/// Histogram: availability query latency in seconds.
pub const AVAILABILITY_QUERY_DURATION_SECONDS: &str =
    "curbside_availability_query_duration_seconds";

/// Install the Prometheus metrics exporter on the given port, for the
/// embedding binary to call at startup. No-op if port is None.
pub fn init(port: Option<u16>) {
    let Some(port) = port else { return };
    let addr: SocketAddr = ([0, 0, 0, 0], port).into();
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .expect("failed to install Prometheus metrics exporter");
    tracing::info!("metrics endpoint: http://0.0.0.0:{port}/metrics");
}
