/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/

use actix_web::{
    http::{header::ContentType, StatusCode},
    HttpResponse, ResponseError,
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    pub error_message: String,
    pub error_code: String,
}

#[macros::add_error]
#[derive(Clone, PartialEq)]
pub enum AppError {
    InternalError(String),
    InvalidRequest(String),
    UnprocessibleRequest(String),
    LargePayloadSize(usize, usize),
    RequestTimeout,
    InvalidGPSData(String),
    InvalidSpeed(String),
    InvalidZone(String),
    InvalidDriverRecord(String),
    InvalidConfiguration(String),
    ZoneStoreUnavailable(String),
    DriverStoreUnavailable(String),
    DriverNotFound(String),
    MeritUpdateConflict(String),
    SerializationError(String),
    DeserializationError(String),
}

impl AppError {
    fn error_message(&self) -> ErrorBody {
        ErrorBody {
            error_message: self.message(),
            error_code: self.code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            AppError::InternalError(err) => err.to_string(),
            AppError::InvalidRequest(err) => err.to_string(),
            AppError::UnprocessibleRequest(err) => err.to_string(),
            AppError::LargePayloadSize(length, limit) => {
                format!("Content length ({length} Bytes) greater than allowed maximum limit : ({limit} Bytes)")
            }
            AppError::InvalidGPSData(err) => format!("Invalid GPS data : {err}"),
            AppError::InvalidSpeed(err) => format!("Invalid speed : {err}"),
            AppError::InvalidZone(err) => format!("Invalid sensitive zone : {err}"),
            AppError::InvalidDriverRecord(err) => format!("Malformed driver record : {err}"),
            AppError::InvalidConfiguration(err) => format!("Invalid configuration : {err}"),
            AppError::ZoneStoreUnavailable(err) => format!("Zone store unavailable : {err}"),
            AppError::DriverStoreUnavailable(err) => {
                format!("Driver store unavailable : {err}")
            }
            AppError::DriverNotFound(driver_id) => format!("Driver not found : {driver_id}"),
            AppError::MeritUpdateConflict(driver_id) => {
                format!("Concurrent merit point updates for driver {driver_id}, retries exhausted")
            }
            AppError::SerializationError(err) => err.to_string(),
            AppError::DeserializationError(err) => err.to_string(),
            AppError::RequestTimeout => "Request timed out".to_string(),
        }
    }

    pub fn code(&self) -> String {
        match self {
            AppError::InternalError(_) => "INTERNAL_ERROR",
            AppError::InvalidRequest(_) => "INVALID_REQUEST",
            AppError::UnprocessibleRequest(_) => "UNPROCESSIBLE_REQUEST",
            AppError::LargePayloadSize(_, _) => "LARGE_PAYLOAD_SIZE",
            AppError::RequestTimeout => "REQUEST_TIMEOUT",
            AppError::InvalidGPSData(_) => "INVALID_GPS_DATA",
            AppError::InvalidSpeed(_) => "INVALID_SPEED",
            AppError::InvalidZone(_) => "INVALID_ZONE",
            AppError::InvalidDriverRecord(_) => "INVALID_DRIVER_RECORD",
            AppError::InvalidConfiguration(_) => "INVALID_CONFIGURATION",
            AppError::ZoneStoreUnavailable(_) => "ZONE_STORE_UNAVAILABLE",
            AppError::DriverStoreUnavailable(_) => "DRIVER_STORE_UNAVAILABLE",
            AppError::DriverNotFound(_) => "DRIVER_NOT_FOUND",
            AppError::MeritUpdateConflict(_) => "MERIT_UPDATE_CONFLICT",
            AppError::SerializationError(_) => "SERIALIZATION_ERROR",
            AppError::DeserializationError(_) => "DESERIALIZATION_ERROR",
        }
        .to_string()
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .insert_header(ContentType::json())
            .json(self.error_message())
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::UnprocessibleRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::LargePayloadSize(_, _) => StatusCode::PAYLOAD_TOO_LARGE,
            AppError::RequestTimeout => StatusCode::REQUEST_TIMEOUT,
            AppError::InvalidGPSData(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidSpeed(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidZone(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidDriverRecord(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::InvalidConfiguration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::ZoneStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DriverStoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::DriverNotFound(_) => StatusCode::NOT_FOUND,
            AppError::MeritUpdateConflict(_) => StatusCode::CONFLICT,
            AppError::SerializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DeserializationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(error: serde_json::Error) -> Self {
        AppError::DeserializationError(error.to_string())
    }
}
