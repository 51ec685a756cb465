/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{
    geofence::GeofenceResolver,
    merit::driver_status,
    risk::{RiskInput, RiskScorer},
    speed_limit::SpeedLimitPolicy,
    stores::DriverStore,
    types::*,
    utils::round_amount,
};
use crate::tools::{logger::*, prometheus::*};
use crate::violation_scored;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct FinePolicy {
    /// Flat fine for any violation, independent of how far the limit was exceeded.
    pub base_fine: u64,
}

impl Default for FinePolicy {
    fn default() -> Self {
        FinePolicy { base_fine: 2000 }
    }
}

/// Turns a speed reading into a fine, combining geofencing, speed limits, driver history
/// and the risk model.
#[derive(Clone)]
pub struct FineCalculator {
    resolver: GeofenceResolver,
    drivers: Arc<dyn DriverStore>,
    scorer: RiskScorer,
    speed_limits: SpeedLimitPolicy,
    fine_policy: FinePolicy,
}

impl FineCalculator {
    pub fn new(
        resolver: GeofenceResolver,
        drivers: Arc<dyn DriverStore>,
        scorer: RiskScorer,
        speed_limits: SpeedLimitPolicy,
        fine_policy: FinePolicy,
    ) -> Self {
        FineCalculator {
            resolver,
            drivers,
            scorer,
            speed_limits,
            fine_policy,
        }
    }

    #[macros::measure_duration]
    pub async fn calculate_violation_fine(&self, event: &ViolationEvent) -> FineResult {
        let geofencing = match self.resolver.try_analyze(&event.point).await {
            Ok(geofencing) => geofencing,
            Err(err) => {
                warn!(tag = "[Geofencing Failed]", error = %err.message(), "Falling back to base fine");
                return self.degraded_fine(event);
            }
        };

        let speed_limit = self.speed_limits.speed_limit(
            geofencing.is_in_zone,
            event.vehicle_type.as_ref(),
            event.speed_limit_override.as_ref(),
        );

        if !is_violation(&event.speed, &speed_limit) {
            return no_violation(event, speed_limit, geofencing);
        }

        let driver = self.driver_history(event.driver_id.as_ref()).await;

        let risk_assessment = self.scorer.score(
            &RiskInput {
                speed: event.speed,
                speed_limit,
                geofencing: &geofencing,
                timestamp: event.timestamp,
                traffic_density: event.context.traffic_density,
            },
            driver.as_ref(),
        );

        let base_fine = self.fine_policy.base_fine;
        let zone_multiplier = geofencing.multiplier;
        let risk_multiplier = risk_assessment.risk_multiplier;
        let after_zone_multiplier = round_amount(base_fine as f64 * zone_multiplier);
        let final_fine = round_amount(base_fine as f64 * zone_multiplier * risk_multiplier);

        let merit_points_deduction = self
            .scorer
            .merit_points_deduction(risk_assessment.risk_score, &event.violation_type);

        let zone_label = geofencing
            .zone_type()
            .map(|zone_type| zone_type.to_string())
            .unwrap_or_else(|| "none".to_string());
        violation_scored!(
            risk_assessment.risk_level.to_string().as_str(),
            zone_label.as_str()
        );

        let SpeedInKmph(speed) = event.speed;
        let SpeedInKmph(limit) = speed_limit;

        FineResult {
            is_violation: true,
            base_fine,
            zone_multiplier,
            risk_multiplier,
            final_fine,
            speed_limit_used: speed_limit,
            speed_over_limit: speed - limit,
            speed_difference: speed - limit,
            merit_points_deduction,
            geofencing,
            fine_breakdown: Some(FineBreakdown {
                base: base_fine,
                after_zone_multiplier,
                after_risk_multiplier: final_fine,
                zone_multiplier,
                risk_multiplier,
            }),
            risk_assessment: Some(risk_assessment),
            driver: driver.map(|driver| DriverSnapshot {
                status: driver_status(&driver.kind, driver.merit_points),
                driver_id: driver.driver_id,
                current_merit_points: driver.merit_points,
                total_violations: driver.total_violations,
            }),
            degraded: false,
        }
    }

    pub async fn analyze_violation_location(&self, point: &Point) -> GeofenceResult {
        self.resolver.analyze(point).await
    }

    pub fn resolver(&self) -> &GeofenceResolver {
        &self.resolver
    }

    pub fn scorer(&self) -> &RiskScorer {
        &self.scorer
    }

    // A failing driver store reads as "no history".
    async fn driver_history(&self, driver_id: Option<&DriverId>) -> Option<DriverRecord> {
        let driver_id = driver_id?;
        match self.drivers.get_driver(driver_id).await {
            Ok(driver) => driver,
            Err(err) => {
                warn!(tag = "[Driver History Unavailable]", driver_id = %driver_id.0, error = %err.message());
                None
            }
        }
    }

    fn degraded_fine(&self, event: &ViolationEvent) -> FineResult {
        DEGRADED_FINE_CALCULATIONS.inc();

        let speed_limit = self
            .speed_limits
            .fallback_limit(event.speed_limit_override.as_ref());
        let geofencing = GeofenceResult::outside_all_zones(None);

        if !is_violation(&event.speed, &speed_limit) {
            return FineResult {
                degraded: true,
                ..no_violation(event, speed_limit, geofencing)
            };
        }

        let base_fine = self.fine_policy.base_fine;
        let SpeedInKmph(speed) = event.speed;
        let SpeedInKmph(limit) = speed_limit;

        FineResult {
            is_violation: true,
            base_fine,
            zone_multiplier: 1.0,
            risk_multiplier: 1.0,
            final_fine: base_fine,
            speed_limit_used: speed_limit,
            speed_over_limit: speed - limit,
            speed_difference: speed - limit,
            merit_points_deduction: self
                .scorer
                .unscaled_merit_points_deduction(&event.violation_type),
            geofencing,
            risk_assessment: None,
            fine_breakdown: Some(FineBreakdown {
                base: base_fine,
                after_zone_multiplier: base_fine,
                after_risk_multiplier: base_fine,
                zone_multiplier: 1.0,
                risk_multiplier: 1.0,
            }),
            driver: None,
            degraded: true,
        }
    }
}

/// Non-finite or negative speeds never count as violations.
fn is_violation(SpeedInKmph(speed): &SpeedInKmph, SpeedInKmph(limit): &SpeedInKmph) -> bool {
    speed.is_finite() && *speed >= 0.0 && speed > limit
}

fn no_violation(event: &ViolationEvent, speed_limit: SpeedInKmph, geofencing: GeofenceResult) -> FineResult {
    let SpeedInKmph(speed) = event.speed;
    let SpeedInKmph(limit) = speed_limit;
    let speed_difference = if speed.is_finite() { speed - limit } else { 0.0 };

    FineResult {
        is_violation: false,
        base_fine: 0,
        zone_multiplier: geofencing.multiplier,
        risk_multiplier: 1.0,
        final_fine: 0,
        speed_limit_used: speed_limit,
        speed_over_limit: 0.0,
        speed_difference,
        merit_points_deduction: 0,
        geofencing,
        risk_assessment: None,
        fine_breakdown: None,
        driver: None,
        degraded: false,
    }
}
