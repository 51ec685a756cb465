/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use chrono::{DateTime, Utc};
use geo::{coord, Intersects, Rect};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString};

#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct DriverId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ViolationId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, Eq, Hash, PartialEq)]
pub struct ZoneId(pub String);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Latitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Copy)]
pub struct Longitude(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
pub struct Meters(pub f64);
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, PartialOrd, Copy)]
pub struct SpeedInKmph(pub f64);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord, Hash)]
pub struct TimeStamp(pub DateTime<Utc>);
#[derive(Deserialize, Serialize, Clone, Copy, Debug, Eq, PartialEq, PartialOrd, Ord)]
pub struct MeritPoints(pub u32);

pub const MAX_MERIT_POINTS: u32 = 100;
/// Confirmed violations remembered per driver for duplicate detection.
pub const APPLIED_VIOLATIONS_RETAINED: usize = 100;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub lat: Latitude,
    pub lon: Longitude,
}

impl Point {
    pub fn new(lat: f64, lon: f64) -> Self {
        Point {
            lat: Latitude(lat),
            lon: Longitude(lon),
        }
    }

    pub fn is_valid(&self) -> bool {
        let Latitude(lat) = self.lat;
        let Longitude(lon) = self.lon;
        lat.is_finite() && lon.is_finite() && (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lon)
    }
}

#[derive(
    Debug, Clone, Copy, EnumString, EnumIter, Display, Serialize, Deserialize, Eq, Hash, PartialEq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ZoneType {
    Hospital,
    School,
    University,
    Town,
    City,
}

impl ZoneType {
    pub fn fine_multiplier(&self) -> f64 {
        match self {
            ZoneType::Hospital | ZoneType::School => 3.0,
            ZoneType::University | ZoneType::Town | ZoneType::City => 2.0,
        }
    }

    /// Normalised severity used as the zone type risk feature.
    pub fn severity(&self) -> f64 {
        match self {
            ZoneType::Hospital | ZoneType::School => 1.0,
            ZoneType::University => 0.8,
            ZoneType::Town | ZoneType::City => 0.6,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SensitiveZone {
    pub id: ZoneId,
    pub name: String,
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub center: Point,
    pub radius: Meters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum VehicleType {
    Motorcycle,
    LightVehicle,
    ThreeWheeler,
    HeavyVehicle,
}

#[derive(
    Debug, Clone, Copy, Default, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrafficDensity {
    Light,
    #[default]
    Moderate,
    Heavy,
}

#[derive(
    Debug, Clone, Copy, Default, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum WeatherConditions {
    #[default]
    Clear,
    Rain,
    Fog,
    Storm,
}

#[derive(
    Debug, Clone, Copy, Default, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ViolationType {
    #[default]
    Speed,
    Reckless,
    Dangerous,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViolationContext {
    #[serde(default)]
    pub traffic_density: TrafficDensity,
    #[serde(default)]
    pub weather_conditions: WeatherConditions,
}

/// A single speed reading handed to the scoring pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ViolationEvent {
    pub speed: SpeedInKmph,
    pub point: Point,
    pub timestamp: TimeStamp,
    pub driver_id: Option<DriverId>,
    pub vehicle_type: Option<VehicleType>,
    pub speed_limit_override: Option<SpeedInKmph>,
    #[serde(default)]
    pub context: ViolationContext,
    #[serde(default)]
    pub violation_type: ViolationType,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneMatch {
    pub zone_type: ZoneType,
    pub name: String,
    pub distance_from_center: Meters,
    pub radius: Meters,
    pub multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ClosestZone {
    pub name: String,
    pub zone_type: ZoneType,
    pub distance: Meters,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeofenceResult {
    pub is_in_zone: bool,
    pub zone: Option<ZoneMatch>,
    pub closest_zone: Option<ClosestZone>,
    pub multiplier: f64,
}

impl GeofenceResult {
    pub fn outside_all_zones(closest_zone: Option<ClosestZone>) -> Self {
        GeofenceResult {
            is_in_zone: false,
            zone: None,
            closest_zone,
            multiplier: 1.0,
        }
    }

    pub fn zone_type(&self) -> Option<ZoneType> {
        self.zone.as_ref().map(|zone| zone.zone_type)
    }
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskFeatures {
    pub speed_violation: f64,
    pub sensitive_zone: f64,
    pub zone_type: f64,
    pub time_of_day: f64,
    pub driver_history: f64,
    pub traffic_density: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskExplanation {
    pub risk_level: String,
    pub risk_score: String,
    pub primary_factors: Vec<String>,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RiskAssessment {
    pub features: Option<RiskFeatures>,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub risk_multiplier: f64,
    pub explanation: RiskExplanation,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FineBreakdown {
    pub base: u64,
    pub after_zone_multiplier: u64,
    pub after_risk_multiplier: u64,
    pub zone_multiplier: f64,
    pub risk_multiplier: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverSnapshot {
    pub driver_id: DriverId,
    pub current_merit_points: MeritPoints,
    pub total_violations: u32,
    pub status: DriverStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FineResult {
    pub is_violation: bool,
    pub base_fine: u64,
    pub zone_multiplier: f64,
    pub risk_multiplier: f64,
    pub final_fine: u64,
    pub speed_limit_used: SpeedInKmph,
    pub speed_over_limit: f64,
    pub speed_difference: f64,
    pub merit_points_deduction: u32,
    pub geofencing: GeofenceResult,
    pub risk_assessment: Option<RiskAssessment>,
    pub fine_breakdown: Option<FineBreakdown>,
    pub driver: Option<DriverSnapshot>,
    pub degraded: bool,
}

/// Which status table a driver record is evaluated against.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum DriverKind {
    /// Self-registered application user, 100-scale driving status.
    UserProfile,
    /// Police-facing licence record.
    #[default]
    LicensedDriver,
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DrivingStatus {
    Active,
    Warning,
    Review,
    Suspended,
}

#[derive(Debug, Clone, Copy, EnumString, Display, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LicenseStatus {
    Active,
    Warning,
    Suspended,
    Revoked,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, Hash, PartialEq)]
#[serde(tag = "table", content = "status", rename_all = "camelCase")]
pub enum DriverStatus {
    UserProfile(DrivingStatus),
    LicensedDriver(LicenseStatus),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DriverRecord {
    pub driver_id: DriverId,
    #[serde(default)]
    pub kind: DriverKind,
    pub merit_points: MeritPoints,
    #[serde(default)]
    pub total_violations: u32,
    #[serde(default)]
    pub average_risk_score: Option<f64>,
    #[serde(default)]
    pub last_violation_date: Option<TimeStamp>,
    #[serde(default)]
    pub violation_free_weeks: u32,
    #[serde(default)]
    pub last_merit_recovery: Option<TimeStamp>,
    #[serde(default)]
    pub applied_violations: Vec<AppliedViolation>,
}

/// A confirmed violation already charged to a driver, oldest first on the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AppliedViolation {
    pub violation_id: ViolationId,
    pub points: u32,
}

impl DriverRecord {
    pub fn new(driver_id: DriverId, kind: DriverKind) -> Self {
        DriverRecord {
            driver_id,
            kind,
            merit_points: MeritPoints(MAX_MERIT_POINTS),
            total_violations: 0,
            average_risk_score: None,
            last_violation_date: None,
            violation_free_weeks: 0,
            last_merit_recovery: None,
            applied_violations: vec![],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Point,
    pub max: Point,
}

impl BoundingBox {
    /// Boundary points are inside the box.
    pub fn contains(&self, point: &Point) -> bool {
        let rect = Rect::new(
            coord! { x: self.min.lon.0, y: self.min.lat.0 },
            coord! { x: self.max.lon.0, y: self.max.lat.0 },
        );
        let Latitude(lat) = point.lat;
        let Longitude(lon) = point.lon;
        rect.intersects(&geo::point!(x: lon, y: lat))
    }
}
