/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use serde::{Deserialize, Serialize};

use super::{types::*, utils::whole_weeks_between};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct MeritPolicy {
    pub recovery_points_per_week: u32,
}

impl Default for MeritPolicy {
    fn default() -> Self {
        MeritPolicy {
            recovery_points_per_week: 2,
        }
    }
}

/// Points moved by one ledger operation and the balance after it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerOutcome {
    pub points: u32,
    pub new_total: MeritPoints,
}

/// Result of charging a confirmed violation. A repeated violation id keeps the
/// points charged the first time and leaves the record untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViolationCharge {
    pub outcome: LedgerOutcome,
    pub already_applied: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecoveryOutcome {
    pub recovered: u32,
    pub new_total: MeritPoints,
    pub weeks_since_violation: u32,
    pub credited_weeks: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeritStatus {
    pub driver_id: DriverId,
    pub current_points: MeritPoints,
    pub max_points: MeritPoints,
    pub status: DriverStatus,
    pub total_violations: u32,
    pub weeks_since_violation: u32,
    pub violation_free_weeks: u32,
    pub potential_recovery: u32,
    pub status_message: String,
    pub recommendations: Vec<String>,
    pub last_violation_date: Option<TimeStamp>,
    pub mandatory_training_required: bool,
}

/// Severity-banded deduction on km/h over the limit. NaN falls in the lowest band.
pub fn deduction_for(speed_over_limit: f64) -> u32 {
    match speed_over_limit {
        excess if excess > 30.0 => 30,
        excess if excess > 20.0 => 20,
        excess if excess > 10.0 => 10,
        _ => 5,
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MeritLedger {
    policy: MeritPolicy,
}

impl MeritLedger {
    pub fn new(policy: MeritPolicy) -> Self {
        MeritLedger { policy }
    }

    pub fn deduct(&self, MeritPoints(points): MeritPoints, speed_over_limit: f64) -> LedgerOutcome {
        let deducted = deduction_for(speed_over_limit);
        LedgerOutcome {
            points: deducted,
            new_total: MeritPoints(points.min(MAX_MERIT_POINTS).saturating_sub(deducted)),
        }
    }

    /// Credits `recovery_points_per_week` for every whole week elapsed since the last violation
    /// that has not been credited yet.
    pub fn recover(
        &self,
        MeritPoints(points): MeritPoints,
        last_violation_date: Option<&TimeStamp>,
        credited_weeks: u32,
        TimeStamp(now): &TimeStamp,
    ) -> RecoveryOutcome {
        let points = points.min(MAX_MERIT_POINTS);
        let weeks_since_violation = last_violation_date
            .map(|TimeStamp(last)| whole_weeks_between(last, now).clamp(0, u32::MAX as i64) as u32)
            .unwrap_or(0);

        if last_violation_date.is_none() || weeks_since_violation <= credited_weeks {
            return RecoveryOutcome {
                recovered: 0,
                new_total: MeritPoints(points),
                weeks_since_violation,
                credited_weeks,
            };
        }

        let recovered = (weeks_since_violation - credited_weeks)
            .saturating_mul(self.policy.recovery_points_per_week)
            .min(MAX_MERIT_POINTS - points);

        RecoveryOutcome {
            recovered,
            new_total: MeritPoints(points + recovered),
            weeks_since_violation,
            credited_weeks: weeks_since_violation,
        }
    }

    /// Re-credits a cancelled violation's deduction.
    pub fn restore(&self, MeritPoints(points): MeritPoints, amount: u32) -> LedgerOutcome {
        let points = points.min(MAX_MERIT_POINTS);
        let restored = amount.min(MAX_MERIT_POINTS - points);
        LedgerOutcome {
            points: restored,
            new_total: MeritPoints(points + restored),
        }
    }

    pub fn apply_confirmed_violation(
        &self,
        record: &DriverRecord,
        violation_id: &ViolationId,
        speed_over_limit: f64,
        risk_score: Option<f64>,
        now: &TimeStamp,
    ) -> (DriverRecord, ViolationCharge) {
        if let Some(applied) = record
            .applied_violations
            .iter()
            .find(|applied| applied.violation_id == *violation_id)
        {
            let charge = ViolationCharge {
                outcome: LedgerOutcome {
                    points: applied.points,
                    new_total: record.merit_points,
                },
                already_applied: true,
            };
            return (record.to_owned(), charge);
        }

        let outcome = self.deduct(record.merit_points, speed_over_limit);
        let total_violations = record.total_violations.saturating_add(1);

        let average_risk_score = match (risk_score.filter(|score| score.is_finite()), record.average_risk_score) {
            (Some(score), Some(average)) => {
                let previous = (total_violations - 1) as f64;
                Some(((average * previous + score.clamp(0.0, 1.0)) / total_violations as f64).clamp(0.0, 1.0))
            }
            (Some(score), None) => Some(score.clamp(0.0, 1.0)),
            (None, average) => average,
        };

        let mut applied_violations = record.applied_violations.to_owned();
        applied_violations.push(AppliedViolation {
            violation_id: violation_id.to_owned(),
            points: outcome.points,
        });
        let overflow = applied_violations.len().saturating_sub(APPLIED_VIOLATIONS_RETAINED);
        applied_violations.drain(..overflow);

        let updated = DriverRecord {
            merit_points: outcome.new_total,
            total_violations,
            average_risk_score,
            last_violation_date: Some(*now),
            violation_free_weeks: 0,
            applied_violations,
            ..record.to_owned()
        };

        (
            updated,
            ViolationCharge {
                outcome,
                already_applied: false,
            },
        )
    }

    pub fn apply_recovery(&self, record: &DriverRecord, now: &TimeStamp) -> (DriverRecord, RecoveryOutcome) {
        let outcome = self.recover(
            record.merit_points,
            record.last_violation_date.as_ref(),
            record.violation_free_weeks,
            now,
        );

        let updated = if outcome.recovered > 0 {
            DriverRecord {
                merit_points: outcome.new_total,
                violation_free_weeks: outcome.credited_weeks,
                last_merit_recovery: Some(*now),
                ..record.to_owned()
            }
        } else {
            record.to_owned()
        };

        (updated, outcome)
    }

    pub fn apply_restoration(&self, record: &DriverRecord, amount: u32) -> (DriverRecord, LedgerOutcome) {
        let outcome = self.restore(record.merit_points, amount);
        let updated = DriverRecord {
            merit_points: outcome.new_total,
            ..record.to_owned()
        };
        (updated, outcome)
    }

    pub fn merit_status(&self, record: &DriverRecord, now: &TimeStamp) -> MeritStatus {
        let recovery = self.recover(
            record.merit_points,
            record.last_violation_date.as_ref(),
            record.violation_free_weeks,
            now,
        );
        let status = driver_status(&record.kind, record.merit_points);

        MeritStatus {
            driver_id: record.driver_id.to_owned(),
            current_points: record.merit_points,
            max_points: MeritPoints(MAX_MERIT_POINTS),
            status,
            total_violations: record.total_violations,
            weeks_since_violation: recovery.weeks_since_violation,
            violation_free_weeks: record.violation_free_weeks,
            potential_recovery: recovery.recovered,
            status_message: status_message(&status, record.merit_points),
            recommendations: recommendations(record),
            last_violation_date: record.last_violation_date,
            mandatory_training_required: mandatory_training_required(&status),
        }
    }
}

pub fn driving_status(MeritPoints(points): MeritPoints) -> DrivingStatus {
    match points {
        50.. => DrivingStatus::Active,
        30..=49 => DrivingStatus::Warning,
        1..=29 => DrivingStatus::Review,
        0 => DrivingStatus::Suspended,
    }
}

pub fn license_status(MeritPoints(points): MeritPoints) -> LicenseStatus {
    match points {
        80.. => LicenseStatus::Active,
        50..=79 => LicenseStatus::Warning,
        20..=49 => LicenseStatus::Suspended,
        _ => LicenseStatus::Revoked,
    }
}

pub fn driver_status(kind: &DriverKind, points: MeritPoints) -> DriverStatus {
    match kind {
        DriverKind::UserProfile => DriverStatus::UserProfile(driving_status(points)),
        DriverKind::LicensedDriver => DriverStatus::LicensedDriver(license_status(points)),
    }
}

pub fn mandatory_training_required(status: &DriverStatus) -> bool {
    matches!(
        status,
        DriverStatus::UserProfile(DrivingStatus::Review | DrivingStatus::Suspended)
            | DriverStatus::LicensedDriver(LicenseStatus::Suspended | LicenseStatus::Revoked)
    )
}

pub fn status_message(status: &DriverStatus, MeritPoints(points): MeritPoints) -> String {
    match status {
        DriverStatus::UserProfile(DrivingStatus::Active)
        | DriverStatus::LicensedDriver(LicenseStatus::Active) => {
            format!("Your driving record is in good standing with {points} merit points.")
        }
        DriverStatus::UserProfile(DrivingStatus::Warning)
        | DriverStatus::LicensedDriver(LicenseStatus::Warning) => format!(
            "Warning: You have {points} merit points. Drive carefully to avoid further penalties."
        ),
        DriverStatus::UserProfile(DrivingStatus::Review) => format!(
            "Your license is flagged for review with {points} merit points. Contact DMT for guidance."
        ),
        DriverStatus::UserProfile(DrivingStatus::Suspended) => {
            "Your driving privileges are suspended. You have 0 merit points and must complete rehabilitation."
                .to_string()
        }
        DriverStatus::LicensedDriver(LicenseStatus::Suspended) => format!(
            "Your license is suspended with {points} merit points. Complete the mandatory safety training to reinstate it."
        ),
        DriverStatus::LicensedDriver(LicenseStatus::Revoked) => format!(
            "Your license is revoked with {points} merit points. Contact DMT to begin rehabilitation."
        ),
    }
}

pub fn recommendations(record: &DriverRecord) -> Vec<String> {
    let MeritPoints(points) = record.merit_points;
    let mut recommendations = Vec::new();

    if points < 30 {
        recommendations.push("Consider taking a defensive driving course");
        recommendations.push("Review Sri Lankan traffic rules and regulations");
    }
    if points < 50 {
        recommendations.push("Drive within speed limits at all times");
        recommendations.push("Be extra cautious in sensitive zones (schools, hospitals)");
    }
    if record.total_violations > 5 {
        recommendations.push("Consider using speed monitoring apps");
        recommendations.push("Plan routes to avoid high-traffic areas");
    }
    if record.violation_free_weeks >= 4 {
        recommendations.push("Great job! Keep up the safe driving to recover more points");
    }

    recommendations.into_iter().map(String::from).collect()
}
