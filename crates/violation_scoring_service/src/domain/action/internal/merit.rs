/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::web::Data;
use chrono::Utc;

use crate::{
    common::{
        merit::{driver_status, mandatory_training_required, MeritStatus},
        stores::MeritChange,
        types::*,
    },
    domain::types::internal::merit::*,
    environment::AppState,
    merit_update,
    tools::{error::AppError, logger::*, prometheus::MERIT_UPDATES},
};

pub async fn deduct_merit_points(
    data: Data<AppState>,
    request_body: DeductMeritRequest,
) -> Result<MeritUpdateResponse, AppError> {
    let DeductMeritRequest {
        driver_id,
        violation_id,
        speed_over_limit,
        risk_score,
        kind,
    } = request_body;

    if violation_id.0.trim().is_empty() {
        return Err(AppError::InvalidRequest("violationId must not be empty".to_string()));
    }
    if !speed_over_limit.is_finite() || speed_over_limit < 0.0 {
        return Err(AppError::InvalidRequest(format!(
            "speedOverLimit must be a non-negative number, got {speed_over_limit}"
        )));
    }
    if let Some(score) = risk_score {
        if !(0.0..=1.0).contains(&score) {
            return Err(AppError::InvalidRequest(format!(
                "riskScore must be within [0, 1], got {score}"
            )));
        }
    }

    let ledger = data.ledger;
    let now = TimeStamp(Utc::now());
    let kind = kind.unwrap_or_default();

    let result = data
        .drivers
        .update_driver(&driver_id, &|record: Option<DriverRecord>| {
            let record = record.unwrap_or_else(|| DriverRecord::new(driver_id.to_owned(), kind));
            let (updated, charge) =
                ledger.apply_confirmed_violation(&record, &violation_id, speed_over_limit, risk_score, &now);
            Ok((
                updated,
                MeritChange {
                    points: charge.outcome.points,
                    already_applied: charge.already_applied,
                },
            ))
        })
        .await;

    merit_update_response("deduct", result)
}

pub async fn restore_merit_points(
    data: Data<AppState>,
    request_body: RestoreMeritRequest,
) -> Result<MeritUpdateResponse, AppError> {
    let RestoreMeritRequest { driver_id, points } = request_body;
    let ledger = data.ledger;

    let result = data
        .drivers
        .update_driver(&driver_id, &|record: Option<DriverRecord>| {
            let record = record.ok_or_else(|| AppError::DriverNotFound(driver_id.0.to_owned()))?;
            let (updated, outcome) = ledger.apply_restoration(&record, points);
            Ok((
                updated,
                MeritChange {
                    points: outcome.points,
                    ..Default::default()
                },
            ))
        })
        .await;

    merit_update_response("restore", result)
}

pub async fn recover_merit_points(
    data: Data<AppState>,
    request_body: RecoverMeritRequest,
) -> Result<MeritUpdateResponse, AppError> {
    let RecoverMeritRequest { driver_id } = request_body;
    let ledger = data.ledger;
    let now = TimeStamp(Utc::now());

    let result = data
        .drivers
        .update_driver(&driver_id, &|record: Option<DriverRecord>| {
            let record = record.ok_or_else(|| AppError::DriverNotFound(driver_id.0.to_owned()))?;
            let (updated, outcome) = ledger.apply_recovery(&record, &now);
            Ok((
                updated,
                MeritChange {
                    points: outcome.recovered,
                    ..Default::default()
                },
            ))
        })
        .await;

    merit_update_response("recover", result)
}

pub async fn merit_status(data: Data<AppState>, driver_id: DriverId) -> Result<MeritStatus, AppError> {
    let record = data
        .drivers
        .get_driver(&driver_id)
        .await?
        .ok_or_else(|| AppError::DriverNotFound(driver_id.0.to_owned()))?;

    Ok(data.ledger.merit_status(&record, &TimeStamp(Utc::now())))
}

fn merit_update_response(
    operation: &str,
    result: Result<(DriverRecord, MeritChange), AppError>,
) -> Result<MeritUpdateResponse, AppError> {
    match result {
        Ok((record, MeritChange { points, already_applied })) => {
            if already_applied {
                merit_update!(operation, "ALREADY_APPLIED");
                warn!(
                    tag = "[Merit Update Repeated]",
                    operation = operation,
                    driver_id = %record.driver_id.0,
                    points = points
                );
            } else {
                merit_update!(operation, "SUCCESS");
            }
            let status = driver_status(&record.kind, record.merit_points);
            info!(
                tag = "[Merit Update]",
                operation = operation,
                driver_id = %record.driver_id.0,
                points = points,
                new_total = record.merit_points.0
            );
            Ok(MeritUpdateResponse {
                driver_id: record.driver_id,
                points,
                new_total: record.merit_points,
                status,
                mandatory_training_required: mandatory_training_required(&status),
                already_applied,
            })
        }
        Err(err) => {
            merit_update!(operation, err.code().as_str());
            Err(err)
        }
    }
}
