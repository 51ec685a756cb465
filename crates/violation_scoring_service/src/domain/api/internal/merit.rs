/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use actix_web::{
    get, post,
    web::{Data, Json, Path},
};

use crate::{
    common::{merit::MeritStatus, types::*},
    domain::{action::internal::*, types::internal::merit::*},
    environment::AppState,
    tools::error::AppError,
};

#[post("/internal/merit/deduct")]
async fn deduct_merit_points(
    data: Data<AppState>,
    param_obj: Json<DeductMeritRequest>,
) -> Result<Json<MeritUpdateResponse>, AppError> {
    let request_body = param_obj.into_inner();

    Ok(Json(merit::deduct_merit_points(data, request_body).await?))
}

#[post("/internal/merit/restore")]
async fn restore_merit_points(
    data: Data<AppState>,
    param_obj: Json<RestoreMeritRequest>,
) -> Result<Json<MeritUpdateResponse>, AppError> {
    let request_body = param_obj.into_inner();

    Ok(Json(merit::restore_merit_points(data, request_body).await?))
}

#[post("/internal/merit/recover")]
async fn recover_merit_points(
    data: Data<AppState>,
    param_obj: Json<RecoverMeritRequest>,
) -> Result<Json<MeritUpdateResponse>, AppError> {
    let request_body = param_obj.into_inner();

    Ok(Json(merit::recover_merit_points(data, request_body).await?))
}

#[get("/internal/merit/{driverId}")]
async fn merit_status(
    data: Data<AppState>,
    path: Path<String>,
) -> Result<Json<MeritStatus>, AppError> {
    let driver_id = DriverId(path.into_inner());

    Ok(Json(merit::merit_status(data, driver_id).await?))
}
