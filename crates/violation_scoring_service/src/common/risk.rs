/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

use super::{types::*, utils::*};
use crate::tools::{error::AppError, logger::*};

pub const DEFAULT_DRIVER_HISTORY_RISK: f64 = 0.2;
pub const DEFAULT_AVERAGE_RISK_SCORE: f64 = 0.2;
pub const DEFAULT_RISK_SCORE: f64 = 0.3;

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(rename_all(serialize = "camelCase"))]
pub struct RiskWeights {
    pub speed_violation: f64,
    pub sensitive_zone: f64,
    pub time_of_day: f64,
    pub driver_history: f64,
    pub zone_type: f64,
    pub traffic_density: f64,
}

impl Default for RiskWeights {
    fn default() -> Self {
        RiskWeights {
            speed_violation: 0.25,
            sensitive_zone: 0.20,
            time_of_day: 0.15,
            driver_history: 0.20,
            zone_type: 0.10,
            traffic_density: 0.10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct RiskMultipliers {
    pub low: f64,
    pub medium: f64,
    pub high: f64,
}

impl Default for RiskMultipliers {
    fn default() -> Self {
        RiskMultipliers {
            low: 1.0,
            medium: 1.2,
            high: 1.5,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct MeritDeductionBase {
    pub speed: u32,
    pub reckless: u32,
    pub dangerous: u32,
}

impl Default for MeritDeductionBase {
    fn default() -> Self {
        MeritDeductionBase {
            speed: 5,
            reckless: 15,
            dangerous: 25,
        }
    }
}

impl MeritDeductionBase {
    pub fn for_violation(&self, violation_type: &ViolationType) -> u32 {
        match violation_type {
            ViolationType::Speed => self.speed,
            ViolationType::Reckless => self.reckless,
            ViolationType::Dangerous => self.dangerous,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct RiskPolicy {
    pub weights: RiskWeights,
    pub medium_threshold: f64,
    pub high_threshold: f64,
    pub multipliers: RiskMultipliers,
    /// km/h over the limit at which the speed feature saturates.
    pub speed_excess_ceiling: f64,
    pub merit_deduction_base: MeritDeductionBase,
    pub utc_offset_minutes: i32,
}

impl Default for RiskPolicy {
    fn default() -> Self {
        RiskPolicy {
            weights: RiskWeights::default(),
            medium_threshold: 0.3,
            high_threshold: 0.6,
            multipliers: RiskMultipliers::default(),
            speed_excess_ceiling: 50.0,
            merit_deduction_base: MeritDeductionBase::default(),
            utc_offset_minutes: 0,
        }
    }
}

/// What the scorer needs to know about a single violation.
pub struct RiskInput<'a> {
    pub speed: SpeedInKmph,
    pub speed_limit: SpeedInKmph,
    pub geofencing: &'a GeofenceResult,
    pub timestamp: TimeStamp,
    pub traffic_density: TrafficDensity,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ModelMetrics {
    pub model_type: String,
    pub version: String,
    pub features: Vec<String>,
    pub weights: RiskWeights,
    pub accuracy: String,
    pub last_trained: String,
}

/// Fixed-weight linear risk model.
#[derive(Debug, Clone, Default)]
pub struct RiskScorer {
    policy: RiskPolicy,
}

impl RiskScorer {
    pub fn new(policy: RiskPolicy) -> Self {
        RiskScorer { policy }
    }

    /// Never fails: anything that prevents feature extraction yields [`RiskScorer::default_assessment`].
    pub fn score(&self, input: &RiskInput, driver: Option<&DriverRecord>) -> RiskAssessment {
        match self.extract_features(input, driver) {
            Ok(features) => {
                let risk_score = self.weighted_score(&features);
                let risk_level = self.risk_level(risk_score);
                RiskAssessment {
                    features: Some(features),
                    risk_score,
                    risk_level,
                    risk_multiplier: self.risk_multiplier(&risk_level),
                    explanation: explain(&features, risk_score, &risk_level),
                }
            }
            Err(err) => {
                warn!(tag = "[Risk Assessment Fallback]", error = %err.message());
                self.default_assessment()
            }
        }
    }

    pub fn extract_features(
        &self,
        input: &RiskInput,
        driver: Option<&DriverRecord>,
    ) -> Result<RiskFeatures, AppError> {
        let SpeedInKmph(speed) = input.speed;
        let SpeedInKmph(limit) = input.speed_limit;
        if !speed.is_finite() || !limit.is_finite() {
            return Err(AppError::InvalidSpeed(format!(
                "speed {speed} km/h against limit {limit} km/h"
            )));
        }

        let speed_violation = ((speed - limit).max(0.0) / self.policy.speed_excess_ceiling).min(1.0);

        let (sensitive_zone, zone_type) = match input.geofencing.zone_type() {
            Some(zone_type) if input.geofencing.is_in_zone => (1.0, zone_type.severity()),
            _ => (0.0, 0.0),
        };

        let driver_history = match driver {
            Some(driver) => driver_history_risk(driver)?,
            None => DEFAULT_DRIVER_HISTORY_RISK,
        };

        Ok(RiskFeatures {
            speed_violation,
            sensitive_zone,
            zone_type,
            time_of_day: time_of_day_risk(local_hour(
                &input.timestamp,
                self.policy.utc_offset_minutes,
            )),
            driver_history,
            traffic_density: traffic_density_risk(&input.traffic_density),
        })
    }

    /// Weighted sum clamped to [0, 1] and rounded to 3 decimals.
    pub fn weighted_score(&self, features: &RiskFeatures) -> f64 {
        let weights = &self.policy.weights;
        let score = features.speed_violation * weights.speed_violation
            + features.sensitive_zone * weights.sensitive_zone
            + features.zone_type * weights.zone_type
            + features.time_of_day * weights.time_of_day
            + features.driver_history * weights.driver_history
            + features.traffic_density * weights.traffic_density;

        if score.is_nan() {
            return DEFAULT_RISK_SCORE;
        }
        round_to_decimals(score.clamp(0.0, 1.0), 3)
    }

    pub fn risk_level(&self, risk_score: f64) -> RiskLevel {
        if risk_score >= self.policy.high_threshold {
            RiskLevel::High
        } else if risk_score >= self.policy.medium_threshold {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn risk_multiplier(&self, risk_level: &RiskLevel) -> f64 {
        match risk_level {
            RiskLevel::Low => self.policy.multipliers.low,
            RiskLevel::Medium => self.policy.multipliers.medium,
            RiskLevel::High => self.policy.multipliers.high,
        }
    }

    pub fn default_assessment(&self) -> RiskAssessment {
        RiskAssessment {
            features: None,
            risk_score: DEFAULT_RISK_SCORE,
            risk_level: RiskLevel::Medium,
            risk_multiplier: self.policy.multipliers.medium,
            explanation: RiskExplanation {
                risk_level: "MEDIUM".to_string(),
                risk_score: "30%".to_string(),
                primary_factors: vec!["Unable to calculate detailed risk factors".to_string()],
                recommendation: "Standard processing with moderate caution.".to_string(),
            },
        }
    }

    /// `base x (1 + 2 x score)`, rounded. A score outside [0, 1] is clamped first.
    pub fn merit_points_deduction(&self, risk_score: f64, violation_type: &ViolationType) -> u32 {
        let base = self.policy.merit_deduction_base.for_violation(violation_type);
        let risk_score = if risk_score.is_nan() {
            DEFAULT_RISK_SCORE
        } else {
            risk_score.clamp(0.0, 1.0)
        };
        (base as f64 * (1.0 + 2.0 * risk_score)).round() as u32
    }

    pub fn unscaled_merit_points_deduction(&self, violation_type: &ViolationType) -> u32 {
        self.policy.merit_deduction_base.for_violation(violation_type)
    }

    pub fn model_metrics(&self) -> ModelMetrics {
        ModelMetrics {
            model_type: "Rule-based Risk Assessment".to_string(),
            version: "1.0".to_string(),
            features: vec![
                "speedViolation",
                "sensitiveZone",
                "timeOfDay",
                "driverHistory",
                "zoneType",
                "trafficDensity",
            ]
            .into_iter()
            .map(String::from)
            .collect(),
            weights: self.policy.weights,
            accuracy: "Not applicable (rule-based)".to_string(),
            last_trained: "Not applicable".to_string(),
        }
    }
}

pub fn time_of_day_risk(hour: u32) -> f64 {
    match hour {
        7..=9 | 17..=19 => 0.8,
        22..=23 | 0..=5 => 0.9,
        10..=16 => 0.4,
        _ => 0.6,
    }
}

pub fn traffic_density_risk(traffic_density: &TrafficDensity) -> f64 {
    match traffic_density {
        TrafficDensity::Light => 0.3,
        TrafficDensity::Moderate => 0.6,
        TrafficDensity::Heavy => 1.0,
    }
}

pub fn driver_history_risk(driver: &DriverRecord) -> Result<f64, AppError> {
    let MeritPoints(points) = driver.merit_points;
    if points > MAX_MERIT_POINTS {
        return Err(AppError::InvalidDriverRecord(format!(
            "{} has {points} merit points",
            driver.driver_id.0
        )));
    }

    let average_risk_score = driver
        .average_risk_score
        .unwrap_or(DEFAULT_AVERAGE_RISK_SCORE);
    if !(0.0..=1.0).contains(&average_risk_score) {
        return Err(AppError::InvalidDriverRecord(format!(
            "{} has average risk score {average_risk_score}",
            driver.driver_id.0
        )));
    }

    let merit_risk = (MAX_MERIT_POINTS - points) as f64 / MAX_MERIT_POINTS as f64;
    let frequency_risk = (driver.total_violations as f64 / 10.0).min(1.0);

    Ok(merit_risk * 0.4 + frequency_risk * 0.3 + average_risk_score * 0.3)
}

fn explain(features: &RiskFeatures, risk_score: f64, risk_level: &RiskLevel) -> RiskExplanation {
    let mut factors = Vec::new();

    if features.speed_violation > 0.6 {
        factors.push(format!(
            "High speed violation ({}+ km/h over limit)",
            (features.speed_violation * 50.0).round()
        ));
    }
    if features.sensitive_zone > 0.0 {
        factors.push("Violation in sensitive zone".to_string());
    }
    if features.time_of_day > 0.7 {
        factors.push("High-risk time period".to_string());
    }
    if features.driver_history > 0.6 {
        factors.push("Poor driving history".to_string());
    }
    if features.traffic_density > 0.7 {
        factors.push("Heavy traffic conditions".to_string());
    }
    factors.truncate(3);

    let recommendation = match risk_level {
        RiskLevel::High => "Immediate police attention required. Consider mandatory safety training.",
        RiskLevel::Medium => "Monitor driver behavior. Warning notice recommended.",
        RiskLevel::Low => "Standard processing. Routine violation.",
    };

    RiskExplanation {
        risk_level: risk_level.to_string().to_uppercase(),
        risk_score: format!("{}%", (risk_score * 100.0).round()),
        primary_factors: factors,
        recommendation: recommendation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at_hour(hour: u32) -> TimeStamp {
        TimeStamp(Utc.with_ymd_and_hms(2024, 3, 12, hour, 15, 0).unwrap())
    }

    fn outside() -> GeofenceResult {
        GeofenceResult::outside_all_zones(None)
    }

    fn inside(zone_type: ZoneType) -> GeofenceResult {
        GeofenceResult {
            is_in_zone: true,
            zone: Some(ZoneMatch {
                zone_type,
                name: "Zone".to_string(),
                distance_from_center: Meters(0.0),
                radius: Meters(500.0),
                multiplier: zone_type.fine_multiplier(),
            }),
            closest_zone: None,
            multiplier: zone_type.fine_multiplier(),
        }
    }

    fn input(speed: f64, limit: f64, geofencing: &GeofenceResult, hour: u32) -> RiskInput<'_> {
        RiskInput {
            speed: SpeedInKmph(speed),
            speed_limit: SpeedInKmph(limit),
            geofencing,
            timestamp: at_hour(hour),
            traffic_density: TrafficDensity::Moderate,
        }
    }

    #[test]
    fn time_of_day_buckets() {
        let expected = [
            (0, 0.9),
            (5, 0.9),
            (6, 0.6),
            (7, 0.8),
            (9, 0.8),
            (10, 0.4),
            (16, 0.4),
            (17, 0.8),
            (19, 0.8),
            (20, 0.6),
            (21, 0.6),
            (22, 0.9),
            (23, 0.9),
        ];
        for (hour, risk) in expected {
            assert_eq!(time_of_day_risk(hour), risk, "hour {hour}");
        }
    }

    #[test]
    fn features_for_moderate_violation_outside_zones() {
        let scorer = RiskScorer::default();
        let geofencing = outside();
        let features = scorer
            .extract_features(&input(85.0, 70.0, &geofencing, 12), None)
            .unwrap();

        assert_eq!(features.speed_violation, 0.3);
        assert_eq!(features.sensitive_zone, 0.0);
        assert_eq!(features.zone_type, 0.0);
        assert_eq!(features.time_of_day, 0.4);
        assert_eq!(features.driver_history, 0.2);
        assert_eq!(features.traffic_density, 0.6);
    }

    #[test]
    fn score_outside_zone_at_midday() {
        let scorer = RiskScorer::default();
        let geofencing = outside();
        let assessment = scorer.score(&input(85.0, 70.0, &geofencing, 12), None);

        // 0.3*0.25 + 0.4*0.15 + 0.2*0.2 + 0.6*0.1
        assert_eq!(assessment.risk_score, 0.235);
        assert_eq!(assessment.risk_level, RiskLevel::Low);
        assert_eq!(assessment.risk_multiplier, 1.0);
        assert_eq!(assessment.explanation.risk_level, "LOW");
        assert!(assessment.explanation.risk_score.ends_with('%'));
        assert!(assessment.explanation.primary_factors.is_empty());
    }

    #[test]
    fn score_in_hospital_zone_at_night() {
        let scorer = RiskScorer::default();
        let geofencing = inside(ZoneType::Hospital);
        let driver = DriverRecord {
            merit_points: MeritPoints(20),
            total_violations: 12,
            average_risk_score: Some(0.8),
            ..DriverRecord::new(DriverId("d".to_string()), DriverKind::LicensedDriver)
        };
        let assessment = scorer.score(&input(95.0, 50.0, &geofencing, 23), Some(&driver));
        let features = assessment.features.unwrap();

        assert_eq!(features.speed_violation, 0.9);
        assert_eq!(features.zone_type, 1.0);
        assert!((features.driver_history - 0.86).abs() < 1e-9);
        assert_eq!(assessment.risk_level, RiskLevel::High);
        assert_eq!(assessment.risk_multiplier, 1.5);
        assert_eq!(
            assessment.explanation.primary_factors,
            vec![
                "High speed violation (45+ km/h over limit)".to_string(),
                "Violation in sensitive zone".to_string(),
                "High-risk time period".to_string(),
            ]
        );
        assert_eq!(
            assessment.explanation.recommendation,
            "Immediate police attention required. Consider mandatory safety training."
        );
    }

    #[test]
    fn score_stays_in_unit_interval_and_levels_follow_thresholds() {
        let scorer = RiskScorer::default();
        let geofencing = inside(ZoneType::School);
        for speed in [0.0, 51.0, 80.0, 120.0, 400.0] {
            for hour in 0..24 {
                let assessment = scorer.score(&input(speed, 50.0, &geofencing, hour), None);
                assert!((0.0..=1.0).contains(&assessment.risk_score));
                assert_eq!(assessment.risk_level, scorer.risk_level(assessment.risk_score));
            }
        }
        assert_eq!(scorer.risk_level(0.299), RiskLevel::Low);
        assert_eq!(scorer.risk_level(0.3), RiskLevel::Medium);
        assert_eq!(scorer.risk_level(0.599), RiskLevel::Medium);
        assert_eq!(scorer.risk_level(0.6), RiskLevel::High);
    }

    #[test]
    fn heavy_weights_are_clamped() {
        let scorer = RiskScorer::new(RiskPolicy {
            weights: RiskWeights {
                speed_violation: 2.0,
                ..RiskWeights::default()
            },
            ..RiskPolicy::default()
        });
        let geofencing = outside();
        let assessment = scorer.score(&input(150.0, 50.0, &geofencing, 12), None);
        assert_eq!(assessment.risk_score, 1.0);
    }

    #[test]
    fn malformed_driver_record_falls_back_to_default() {
        let scorer = RiskScorer::default();
        let geofencing = outside();
        let driver = DriverRecord {
            merit_points: MeritPoints(140),
            ..DriverRecord::new(DriverId("d".to_string()), DriverKind::UserProfile)
        };
        let assessment = scorer.score(&input(85.0, 70.0, &geofencing, 12), Some(&driver));
        assert_eq!(assessment, scorer.default_assessment());
        assert_eq!(assessment.risk_score, 0.3);
        assert_eq!(assessment.risk_level, RiskLevel::Medium);
        assert_eq!(assessment.risk_multiplier, 1.2);
    }

    #[test]
    fn non_finite_speed_falls_back_to_default() {
        let scorer = RiskScorer::default();
        let geofencing = outside();
        let assessment = scorer.score(&input(f64::INFINITY, 70.0, &geofencing, 12), None);
        assert!(assessment.features.is_none());
        assert_eq!(assessment.risk_score, 0.3);
    }

    #[test]
    fn merit_deduction_scales_with_risk() {
        let scorer = RiskScorer::default();
        assert_eq!(scorer.merit_points_deduction(0.0, &ViolationType::Speed), 5);
        assert_eq!(scorer.merit_points_deduction(0.5, &ViolationType::Speed), 10);
        assert_eq!(scorer.merit_points_deduction(1.0, &ViolationType::Reckless), 45);
        assert_eq!(scorer.merit_points_deduction(0.235, &ViolationType::Dangerous), 37);
        assert_eq!(scorer.unscaled_merit_points_deduction(&ViolationType::Dangerous), 25);
    }

    #[test]
    fn model_metrics_list_every_weighted_feature() {
        let metrics = RiskScorer::default().model_metrics();
        assert_eq!(metrics.model_type, "Rule-based Risk Assessment");
        assert_eq!(metrics.features.len(), 6);
        assert_eq!(metrics.weights, RiskWeights::default());
    }
}
