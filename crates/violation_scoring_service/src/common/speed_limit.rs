/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

use super::types::*;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct VehicleSpeedLimits {
    pub motorcycle: f64,
    pub light_vehicle: f64,
    pub three_wheeler: f64,
    pub heavy_vehicle: f64,
}

impl Default for VehicleSpeedLimits {
    fn default() -> Self {
        VehicleSpeedLimits {
            motorcycle: 70.0,
            light_vehicle: 70.0,
            three_wheeler: 50.0,
            heavy_vehicle: 50.0,
        }
    }
}

impl VehicleSpeedLimits {
    pub fn limit_for(&self, vehicle_type: &VehicleType) -> f64 {
        match vehicle_type {
            VehicleType::Motorcycle => self.motorcycle,
            VehicleType::LightVehicle => self.light_vehicle,
            VehicleType::ThreeWheeler => self.three_wheeler,
            VehicleType::HeavyVehicle => self.heavy_vehicle,
        }
    }
}

/// Speed limits in km/h.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct SpeedLimitPolicy {
    pub sensitive_zone_limit: f64,
    pub default_limit: f64,
    pub vehicle_limits: VehicleSpeedLimits,
}

impl Default for SpeedLimitPolicy {
    fn default() -> Self {
        SpeedLimitPolicy {
            sensitive_zone_limit: 50.0,
            default_limit: 70.0,
            vehicle_limits: VehicleSpeedLimits::default(),
        }
    }
}

impl SpeedLimitPolicy {
    /// An explicit positive override wins. Otherwise the zone limit applies, tightened to the
    /// vehicle class limit when one is known.
    pub fn speed_limit(
        &self,
        is_in_zone: bool,
        vehicle_type: Option<&VehicleType>,
        explicit_limit: Option<&SpeedInKmph>,
    ) -> SpeedInKmph {
        if let Some(limit) = usable_override(explicit_limit) {
            return limit;
        }

        let zone_limit = if is_in_zone {
            self.sensitive_zone_limit
        } else {
            self.default_limit
        };

        SpeedInKmph(match vehicle_type {
            Some(vehicle_type) => zone_limit.min(self.vehicle_limits.limit_for(vehicle_type)),
            None => zone_limit,
        })
    }

    /// Limit used when geofencing could not run.
    pub fn fallback_limit(&self, explicit_limit: Option<&SpeedInKmph>) -> SpeedInKmph {
        usable_override(explicit_limit).unwrap_or(SpeedInKmph(self.default_limit))
    }
}

fn usable_override(explicit_limit: Option<&SpeedInKmph>) -> Option<SpeedInKmph> {
    explicit_limit
        .filter(|SpeedInKmph(limit)| limit.is_finite() && *limit > 0.0)
        .copied()
}
