/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{http::StatusCode, test};
use chrono::{Duration, Utc};
use futures::future::join_all;
use serde_json::json;
use violation_scoring_service::{
    common::{merit::MeritStatus, types::*},
    domain::types::internal::merit::MeritUpdateResponse,
    tools::error::ErrorBody,
};

use crate::harness::*;

fn driver(id: &str, kind: DriverKind, points: u32) -> DriverRecord {
    DriverRecord {
        merit_points: MeritPoints(points),
        ..DriverRecord::new(DriverId(id.to_string()), kind)
    }
}

#[actix_web::test]
async fn first_deduction_opens_a_licensed_record() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::post()
        .uri("/internal/merit/deduct")
        .set_json(json!({ "driverId": "DL-1001", "violationId": "V-1001-1", "speedOverLimit": 25.0, "riskScore": 0.5 }))
        .to_request();
    let update: MeritUpdateResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(update.points, 20);
    assert_eq!(update.new_total, MeritPoints(80));
    assert_eq!(update.status, DriverStatus::LicensedDriver(LicenseStatus::Active));
    assert!(!update.mandatory_training_required);

    let req = test::TestRequest::post()
        .uri("/internal/merit/deduct")
        .set_json(json!({ "driverId": "DL-1001", "violationId": "V-1001-2", "speedOverLimit": 31.0 }))
        .to_request();
    let update: MeritUpdateResponse = test::call_and_read_body_json(&app, req).await;
    assert_eq!(update.points, 30);
    assert_eq!(update.new_total, MeritPoints(50));
    assert_eq!(update.status, DriverStatus::LicensedDriver(LicenseStatus::Warning));

    let req = test::TestRequest::get()
        .uri("/internal/merit/DL-1001")
        .to_request();
    let status: MeritStatus = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.current_points, MeritPoints(50));
    assert_eq!(status.total_violations, 2);
    assert_eq!(status.weeks_since_violation, 0);
    assert_eq!(status.potential_recovery, 0);
    assert!(status.last_violation_date.is_some());
}

#[actix_web::test]
async fn low_balances_require_training() {
    let app = app(state(vec![
        driver("DL-15", DriverKind::LicensedDriver, 15),
        driver("USR-15", DriverKind::UserProfile, 15),
    ]))
    .await;

    let req = test::TestRequest::get().uri("/internal/merit/DL-15").to_request();
    let status: MeritStatus = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.status, DriverStatus::LicensedDriver(LicenseStatus::Revoked));
    assert!(status.mandatory_training_required);
    assert!(status.status_message.contains("revoked"));
    assert!(!status.recommendations.is_empty());

    let req = test::TestRequest::get().uri("/internal/merit/USR-15").to_request();
    let status: MeritStatus = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.status, DriverStatus::UserProfile(DrivingStatus::Review));
    assert!(status.mandatory_training_required);
}

#[actix_web::test]
async fn user_profile_kind_is_kept_on_new_records() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::post()
        .uri("/internal/merit/deduct")
        .set_json(json!({ "driverId": "USR-7", "violationId": "V-7-1", "speedOverLimit": 5.0, "kind": "userProfile" }))
        .to_request();
    let update: MeritUpdateResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(update.new_total, MeritPoints(95));
    assert_eq!(update.status, DriverStatus::UserProfile(DrivingStatus::Active));
}

#[actix_web::test]
async fn restoration_is_capped_at_the_maximum() {
    let app = app(state(vec![driver("DL-2002", DriverKind::LicensedDriver, 90)])).await;

    let req = test::TestRequest::post()
        .uri("/internal/merit/restore")
        .set_json(json!({ "driverId": "DL-2002", "points": 20 }))
        .to_request();
    let update: MeritUpdateResponse = test::call_and_read_body_json(&app, req).await;

    assert_eq!(update.points, 10);
    assert_eq!(update.new_total, MeritPoints(100));
}

#[actix_web::test]
async fn recovery_credits_violation_free_weeks_once() {
    let three_weeks_ago = TimeStamp(Utc::now() - Duration::days(22));
    let record = DriverRecord {
        last_violation_date: Some(three_weeks_ago),
        total_violations: 1,
        ..driver("DL-3003", DriverKind::LicensedDriver, 90)
    };
    let app = app(state(vec![record])).await;

    let recover = || {
        test::TestRequest::post()
            .uri("/internal/merit/recover")
            .set_json(json!({ "driverId": "DL-3003" }))
            .to_request()
    };

    let update: MeritUpdateResponse = test::call_and_read_body_json(&app, recover()).await;
    assert_eq!(update.points, 6);
    assert_eq!(update.new_total, MeritPoints(96));

    let update: MeritUpdateResponse = test::call_and_read_body_json(&app, recover()).await;
    assert_eq!(update.points, 0);
    assert_eq!(update.new_total, MeritPoints(96));
}

#[actix_web::test]
async fn unknown_drivers_are_not_found() {
    let app = app(state(vec![])).await;

    let requests = [
        test::TestRequest::post()
            .uri("/internal/merit/restore")
            .set_json(json!({ "driverId": "ghost", "points": 5 }))
            .to_request(),
        test::TestRequest::post()
            .uri("/internal/merit/recover")
            .set_json(json!({ "driverId": "ghost" }))
            .to_request(),
        test::TestRequest::get().uri("/internal/merit/ghost").to_request(),
    ];

    for req in requests {
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: ErrorBody = test::read_body_json(resp).await;
        assert_eq!(body.error_code, "DRIVER_NOT_FOUND");
    }
}

#[actix_web::test]
async fn deduction_rejects_out_of_range_inputs() {
    let app = app(state(vec![])).await;

    for request in [
        json!({ "driverId": "DL-1", "violationId": "V-1", "speedOverLimit": -3.0 }),
        json!({ "driverId": "DL-1", "violationId": "V-1", "speedOverLimit": 12.0, "riskScore": 1.4 }),
        json!({ "driverId": "DL-1", "violationId": " ", "speedOverLimit": 12.0 }),
    ] {
        let req = test::TestRequest::post()
            .uri("/internal/merit/deduct")
            .set_json(request)
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }
}

#[actix_web::test]
async fn concurrent_deductions_are_all_applied() {
    let app = app(state(vec![driver("DL-4004", DriverKind::LicensedDriver, 100)])).await;

    let calls = (0..10).map(|i| {
        let req = test::TestRequest::post()
            .uri("/internal/merit/deduct")
            .set_json(json!({ "driverId": "DL-4004", "violationId": format!("V-4004-{i}"), "speedOverLimit": 8.0 }))
            .to_request();
        test::call_service(&app, req)
    });
    let responses = join_all(calls).await;
    assert!(responses.iter().all(|resp| resp.status() == StatusCode::OK));

    let req = test::TestRequest::get()
        .uri("/internal/merit/DL-4004")
        .to_request();
    let status: MeritStatus = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.current_points, MeritPoints(50));
    assert_eq!(status.total_violations, 10);
}

#[actix_web::test]
async fn repeated_violation_is_deducted_once() {
    let app = app(state(vec![driver("DL-5005", DriverKind::LicensedDriver, 100)])).await;

    let deduct = || {
        test::TestRequest::post()
            .uri("/internal/merit/deduct")
            .set_json(json!({ "driverId": "DL-5005", "violationId": "V-5005", "speedOverLimit": 25.0 }))
            .to_request()
    };

    let first: MeritUpdateResponse = test::call_and_read_body_json(&app, deduct()).await;
    assert_eq!(first.points, 20);
    assert_eq!(first.new_total, MeritPoints(80));
    assert!(!first.already_applied);

    let second: MeritUpdateResponse = test::call_and_read_body_json(&app, deduct()).await;
    assert_eq!(second.points, 20);
    assert_eq!(second.new_total, MeritPoints(80));
    assert!(second.already_applied);

    let req = test::TestRequest::get()
        .uri("/internal/merit/DL-5005")
        .to_request();
    let status: MeritStatus = test::call_and_read_body_json(&app, req).await;
    assert_eq!(status.current_points, MeritPoints(80));
    assert_eq!(status.total_violations, 1);
}

#[actix_web::test]
async fn deduction_requires_a_violation_id() {
    let app = app(state(vec![])).await;

    let req = test::TestRequest::post()
        .uri("/internal/merit/deduct")
        .set_json(json!({ "driverId": "DL-6006", "speedOverLimit": 25.0 }))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: ErrorBody = test::read_body_json(resp).await;
    assert_eq!(body.error_code, "UNPROCESSIBLE_REQUEST");
}
