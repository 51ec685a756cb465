/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

use crate::common::types::*;

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct DeductMeritRequest {
    pub driver_id: DriverId,
    pub violation_id: ViolationId,
    pub speed_over_limit: f64,
    pub risk_score: Option<f64>,
    pub kind: Option<DriverKind>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RestoreMeritRequest {
    pub driver_id: DriverId,
    pub points: u32,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct RecoverMeritRequest {
    pub driver_id: DriverId,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MeritUpdateResponse {
    pub driver_id: DriverId,
    pub points: u32,
    pub new_total: MeritPoints,
    pub status: DriverStatus,
    pub mandatory_training_required: bool,
    #[serde(default)]
    pub already_applied: bool,
}
