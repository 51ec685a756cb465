/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::web::Data;

use crate::{
    common::types::*,
    domain::types::ui::zone::*,
    environment::AppState,
    tools::error::AppError,
};

pub async fn analyze_violation_location(
    data: Data<AppState>,
    ZoneQuery { lat, lon }: ZoneQuery,
) -> Result<GeofenceResult, AppError> {
    let point = valid_point(lat, lon)?;
    Ok(data.fine_calculator.analyze_violation_location(&point).await)
}

pub async fn zones_within(
    data: Data<AppState>,
    query: BoundingBoxQuery,
) -> Result<ZonesWithinResponse, AppError> {
    let min = valid_point(query.min_lat, query.min_lon)?;
    let max = valid_point(query.max_lat, query.max_lon)?;
    if min.lat.0 > max.lat.0 || min.lon.0 > max.lon.0 {
        return Err(AppError::InvalidRequest(
            "Bounding box minimum corner lies beyond its maximum corner".to_string(),
        ));
    }

    let zones = data
        .fine_calculator
        .resolver()
        .zones_within(&BoundingBox { min, max })
        .await?;

    Ok(ZonesWithinResponse {
        count: zones.len(),
        zones,
    })
}

fn valid_point(lat: f64, lon: f64) -> Result<Point, AppError> {
    let point = Point::new(lat, lon);
    if point.is_valid() {
        Ok(point)
    } else {
        Err(AppError::InvalidGPSData(format!("lat : {lat}, lon : {lon}")))
    }
}
