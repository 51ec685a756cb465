/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use actix_web_prom::{PrometheusMetrics, PrometheusMetricsBuilder};
use prometheus::{
    opts, register_histogram_vec, register_int_counter, register_int_counter_vec, HistogramVec,
    IntCounter, IntCounterVec,
};

pub static INCOMING_API: once_cell::sync::Lazy<HistogramVec> = once_cell::sync::Lazy::new(|| {
    register_histogram_vec!(
        opts!("http_request_duration_seconds", "Incoming API requests").into(),
        &["method", "handler", "status_code", "code", "version"]
    )
    .expect("Failed to register incoming API metrics")
});

pub static VIOLATIONS_SCORED: once_cell::sync::Lazy<IntCounterVec> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter_vec!(
            opts!("violations_scored", "Speed violations scored by risk level and zone"),
            &["risk_level", "zone_type"]
        )
        .expect("Failed to register violations scored metrics")
    });

pub static DEGRADED_FINE_CALCULATIONS: once_cell::sync::Lazy<IntCounter> =
    once_cell::sync::Lazy::new(|| {
        register_int_counter!(
            "degraded_fine_calculations",
            "Fine calculations that fell back to the flat base fine"
        )
        .expect("Failed to register degraded fine calculation metrics")
    });

pub static MERIT_UPDATES: once_cell::sync::Lazy<IntCounterVec> = once_cell::sync::Lazy::new(|| {
    register_int_counter_vec!(
        opts!("merit_updates", "Merit point ledger operations"),
        &["operation", "status"]
    )
    .expect("Failed to register merit update metrics")
});

/// Observes the duration of an incoming API request into `INCOMING_API`.
///
/// # Arguments
///
/// * `$method` - HTTP method.
/// * `$endpoint` - Route with path parameters replaced by placeholders.
/// * `$status` - HTTP status code of the response.
/// * `$code` - Error code of the response, `SUCCESS` otherwise.
/// * `$start` - `Instant` at which the request was received.
#[macro_export]
macro_rules! incoming_api {
    ($method:expr, $endpoint:expr, $status:expr, $code:expr, $start:expr) => {
        let duration = $start.elapsed().as_secs_f64();
        let version = std::env::var("DEPLOYMENT_VERSION").unwrap_or("DEV".to_string());
        INCOMING_API
            .with_label_values(&[$method, $endpoint, $status, $code, version.as_str()])
            .observe(duration);
    };
}

#[macro_export]
macro_rules! violation_scored {
    ($risk_level:expr, $zone_type:expr) => {
        VIOLATIONS_SCORED
            .with_label_values(&[$risk_level, $zone_type])
            .inc();
    };
}

#[macro_export]
macro_rules! merit_update {
    ($operation:expr, $status:expr) => {
        MERIT_UPDATES
            .with_label_values(&[$operation, $status])
            .inc();
    };
}

/// Builds the actix middleware exposing `/metrics` with the service metrics registered.
///
/// # Panics
///
/// * If the metrics builder fails or a collector is registered twice in the same registry.
pub fn prometheus_metrics() -> PrometheusMetrics {
    let prometheus = PrometheusMetricsBuilder::new("api")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus Metrics");

    prometheus
        .registry
        .register(Box::new(INCOMING_API.to_owned()))
        .expect("Failed to register incoming API metrics");

    prometheus
        .registry
        .register(Box::new(VIOLATIONS_SCORED.to_owned()))
        .expect("Failed to register violations scored metrics");

    prometheus
        .registry
        .register(Box::new(DEGRADED_FINE_CALCULATIONS.to_owned()))
        .expect("Failed to register degraded fine calculation metrics");

    prometheus
        .registry
        .register(Box::new(MERIT_UPDATES.to_owned()))
        .expect("Failed to register merit update metrics");

    prometheus
}
