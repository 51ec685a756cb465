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
    common::types::*,
    domain::types::internal::violation::*,
    environment::AppState,
    tools::{error::AppError, logger::*},
};

pub async fn calculate_violation_fine(
    data: Data<AppState>,
    request_body: ViolationFineRequest,
) -> Result<FineResult, AppError> {
    let event = violation_event(request_body)?;

    let fine = data.fine_calculator.calculate_violation_fine(&event).await;

    info!(
        tag = "[Violation Fine]",
        driver_id = ?event.driver_id,
        is_violation = fine.is_violation,
        final_fine = fine.final_fine,
        degraded = fine.degraded
    );

    Ok(fine)
}

/// Rejects readings the scoring pipeline would otherwise silently tolerate.
fn violation_event(request_body: ViolationFineRequest) -> Result<ViolationEvent, AppError> {
    let SpeedInKmph(speed) = request_body.speed;
    if !speed.is_finite() || speed < 0.0 {
        return Err(AppError::InvalidSpeed(format!("{speed}")));
    }

    let point = Point {
        lat: request_body.lat,
        lon: request_body.lon,
    };
    if !point.is_valid() {
        return Err(AppError::InvalidGPSData(format!(
            "lat : {:?}, lon : {:?}",
            point.lat.0, point.lon.0
        )));
    }

    if let Some(SpeedInKmph(limit)) = request_body.speed_limit_override {
        if !limit.is_finite() || limit <= 0.0 {
            return Err(AppError::InvalidRequest(format!(
                "Speed limit override must be a positive number, got {limit}"
            )));
        }
    }

    Ok(ViolationEvent {
        speed: request_body.speed,
        point,
        timestamp: request_body
            .timestamp
            .unwrap_or_else(|| TimeStamp(Utc::now())),
        driver_id: request_body.driver_id,
        vehicle_type: request_body.vehicle_type,
        speed_limit_override: request_body.speed_limit_override,
        context: request_body.context,
        violation_type: request_body.violation_type,
    })
}
