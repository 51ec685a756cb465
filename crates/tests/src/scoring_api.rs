/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::sync::Arc;

use actix_web::{http::StatusCode, test, ResponseError};
use async_trait::async_trait;
use serde_json::{json, Value};
use violation_scoring_service::{
    common::{
        stores::{InMemoryDriverStore, ZoneStore},
        types::*,
        zones::{ZoneIndex, ZoneStatistics},
    },
    domain::types::ui::zone::ZonesWithinResponse,
    environment::AppState,
    tools::error::{AppError, ErrorBody},
};

use crate::harness::*;

struct UnreachableZoneStore;

#[async_trait]
impl ZoneStore for UnreachableZoneStore {
    async fn zone_index(&self) -> Result<Arc<ZoneIndex>, AppError> {
        Err(AppError::ZoneStoreUnavailable("connection refused".to_string()))
    }
}

fn fine_request(speed: f64, lat: f64, lon: f64) -> Value {
    json!({
        "speed": speed,
        "lat": lat,
        "lon": lon,
        "timestamp": "2024-03-12T12:00:00Z"
    })
}

#[actix_web::test]
async fn speeding_outside_zones_is_fined_on_risk_alone() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(fine_request(85.0, 7.2906, 80.6337))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let fine: FineResult = test::read_body_json(resp).await;
    assert!(fine.is_violation);
    assert!(!fine.geofencing.is_in_zone);
    assert_eq!(fine.base_fine, 2000);
    assert_eq!(fine.zone_multiplier, 1.0);
    assert_eq!(fine.speed_limit_used, SpeedInKmph(70.0));
    assert_eq!(fine.speed_over_limit, 15.0);

    // 0.3*0.25 + 0.4*0.15 + 0.2*0.2 + 0.6*0.1
    let risk = fine.risk_assessment.unwrap();
    assert_eq!(risk.risk_score, 0.235);
    assert_eq!(risk.risk_level, RiskLevel::Low);
    assert_eq!(fine.final_fine, 2000);
    assert_eq!(fine.merit_points_deduction, 7);
    assert!(!fine.degraded);
}

#[actix_web::test]
async fn speeding_at_a_university_doubles_the_fine() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(fine_request(85.0, 6.9022, 79.8600))
        .to_request();
    let fine: FineResult = test::call_and_read_body_json(&app, req).await;

    assert!(fine.geofencing.is_in_zone);
    let zone = fine.geofencing.zone.as_ref().unwrap();
    assert_eq!(zone.zone_type, ZoneType::University);
    assert_eq!(zone.distance_from_center, Meters(0.0));
    assert_eq!(fine.geofencing.multiplier, 2.0);
    assert_eq!(fine.speed_limit_used, SpeedInKmph(50.0));
    assert_eq!(fine.speed_over_limit, 35.0);
    assert_eq!(fine.final_fine, 6000);

    let breakdown = fine.fine_breakdown.unwrap();
    assert_eq!(breakdown.after_zone_multiplier, 4000);
    assert_eq!(breakdown.after_risk_multiplier, 6000);
}

#[actix_web::test]
async fn speed_under_the_limit_is_not_fined() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(fine_request(60.0, 7.2906, 80.6337))
        .to_request();
    let fine: FineResult = test::call_and_read_body_json(&app, req).await;

    assert!(!fine.is_violation);
    assert_eq!(fine.final_fine, 0);
    assert_eq!(fine.merit_points_deduction, 0);
}

#[actix_web::test]
async fn overlapping_zones_resolve_to_the_nearest_centre() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::get()
        .uri("/ui/zone?lat=6.9020&lon=79.8628")
        .to_request();
    let geofencing: GeofenceResult = test::call_and_read_body_json(&app, req).await;

    assert!(geofencing.is_in_zone);
    assert_eq!(geofencing.zone_type(), Some(ZoneType::School));
    assert_eq!(geofencing.multiplier, 3.0);
}

#[actix_web::test]
async fn known_driver_history_feeds_the_risk_score() {
    let driver = DriverRecord {
        merit_points: MeritPoints(15),
        total_violations: 8,
        average_risk_score: Some(0.7),
        ..DriverRecord::new(DriverId("DL-4471".to_string()), DriverKind::LicensedDriver)
    };
    let app = app(state(vec![driver])).await;

    let mut request = fine_request(85.0, 7.2906, 80.6337);
    request["driverId"] = json!("DL-4471");
    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(request)
        .to_request();
    let fine: FineResult = test::call_and_read_body_json(&app, req).await;

    let snapshot = fine.driver.unwrap();
    assert_eq!(snapshot.current_merit_points, MeritPoints(15));
    assert_eq!(
        snapshot.status,
        DriverStatus::LicensedDriver(LicenseStatus::Revoked)
    );

    // history = 0.4*0.85 + 0.3*0.8 + 0.3*0.7 = 0.79
    let features = fine.risk_assessment.unwrap().features.unwrap();
    assert!((features.driver_history - 0.79).abs() < 1e-9);
}

#[actix_web::test]
async fn vehicle_class_and_override_change_the_limit() {
    let app = app(state(vec![])).await;

    let mut request = fine_request(60.0, 7.2906, 80.6337);
    request["vehicleType"] = json!("heavy_vehicle");
    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(request)
        .to_request();
    let fine: FineResult = test::call_and_read_body_json(&app, req).await;
    assert!(fine.is_violation);
    assert_eq!(fine.speed_limit_used, SpeedInKmph(50.0));

    let mut request = fine_request(60.0, 6.9022, 79.8600);
    request["speedLimitOverride"] = json!(40.0);
    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(request)
        .to_request();
    let fine: FineResult = test::call_and_read_body_json(&app, req).await;
    assert_eq!(fine.speed_limit_used, SpeedInKmph(40.0));
    assert_eq!(fine.speed_over_limit, 20.0);
}

#[actix_web::test]
async fn unreachable_zone_store_degrades_to_the_base_fine() {
    let app = app(state_with(
        Arc::new(UnreachableZoneStore),
        Arc::new(InMemoryDriverStore::default()),
    ))
    .await;

    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(fine_request(85.0, 6.9022, 79.8600))
        .to_request();
    let fine: FineResult = test::call_and_read_body_json(&app, req).await;

    assert!(fine.degraded);
    assert!(fine.is_violation);
    assert!(!fine.geofencing.is_in_zone);
    assert_eq!(fine.speed_limit_used, SpeedInKmph(70.0));
    assert_eq!(fine.final_fine, 2000);
    assert_eq!(fine.merit_points_deduction, 5);
    assert!(fine.risk_assessment.is_none());

    let req = test::TestRequest::get()
        .uri("/ui/zone?lat=6.9022&lon=79.8600")
        .to_request();
    let geofencing: GeofenceResult = test::call_and_read_body_json(&app, req).await;
    assert!(!geofencing.is_in_zone);
    assert!(geofencing.closest_zone.is_none());

    let req = test::TestRequest::get()
        .uri("/internal/zones/stats")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[actix_web::test]
async fn invalid_readings_are_rejected() {
    let app = app(state(vec![])).await;

    let cases = [
        (fine_request(85.0, 95.0, 80.6337), "INVALID_GPS_DATA"),
        (fine_request(-4.0, 7.2906, 80.6337), "INVALID_SPEED"),
        (json!({ "lat": 7.2906, "lon": 80.6337 }), "UNPROCESSIBLE_REQUEST"),
    ];
    for (request, code) in cases {
        let req = test::TestRequest::post()
            .uri("/internal/violation/fine")
            .set_json(request)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY, "{code}");
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error_code, code);
    }

    let mut request = fine_request(85.0, 7.2906, 80.6337);
    request["speedLimitOverride"] = json!(-10.0);
    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(request)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn zone_lookup_rejects_invalid_coordinates() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::get()
        .uri("/ui/zone?lat=100.0&lon=79.86")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let req = test::TestRequest::get().uri("/ui/zone?lat=6.9").to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn bounding_box_lists_zones_inside_it() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::get()
        .uri("/ui/zones/within?minLat=6.89&minLon=79.85&maxLat=6.91&maxLon=79.87")
        .to_request();
    let within: ZonesWithinResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(within.count, 2);
    assert!(within
        .zones
        .iter()
        .all(|zone| zone.zone_type != ZoneType::Hospital));

    let req = test::TestRequest::get()
        .uri("/ui/zones/within?minLat=6.91&minLon=79.85&maxLat=6.89&maxLon=79.87")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn zone_statistics_group_by_type() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::get()
        .uri("/internal/zones/stats")
        .to_request();
    let stats: ZoneStatistics = test::call_and_read_body_json(&app, req).await;

    assert_eq!(stats.total, 3);
    assert_eq!(stats.by_type.len(), 3);
    let university = stats
        .by_type
        .iter()
        .find(|stats| stats.zone_type == ZoneType::University)
        .unwrap();
    assert_eq!(university.count, 1);
    assert_eq!(university.average_radius, Meters(500.0));
}

#[actix_web::test]
async fn risk_model_describes_its_weights() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::get()
        .uri("/internal/risk/model")
        .to_request();
    let model: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(model["modelType"], "Rule-based Risk Assessment");
    assert_eq!(model["features"].as_array().map(Vec::len), Some(6));
    assert_eq!(model["weights"]["speedViolation"], 0.25);
}

#[actix_web::test]
async fn healthcheck_without_redis_is_up() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::get().uri("/healthcheck").to_request();
    let body: Value = test::call_and_read_body_json(&app, req).await;

    assert_eq!(body["result"], "Service Is Up");
}

#[actix_web::test]
async fn oversized_requests_are_refused() {
    let app = app(AppState {
        max_allowed_req_size: 16,
        ..state(vec![])
    })
    .await;

    let req = test::TestRequest::post()
        .uri("/internal/violation/fine")
        .set_json(fine_request(85.0, 7.2906, 80.6337))
        .to_request();
    let err = test::try_call_service(&app, req).await.err().unwrap();

    let response = err.as_response_error().error_response();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}
