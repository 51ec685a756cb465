/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::{fs, path::Path, str::FromStr};

use geojson::{feature::Id, Feature, GeoJson, Value};
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;

use super::{types::*, utils::distance_between_in_meters};
use crate::tools::{error::AppError, logger::*};

impl SensitiveZone {
    pub fn validate(&self) -> Result<(), AppError> {
        let Meters(radius) = self.radius;
        if !radius.is_finite() || radius <= 0.0 {
            return Err(AppError::InvalidZone(format!(
                "{} : radius must be a positive number of meters, got {radius}",
                self.id.0
            )));
        }
        if !self.center.is_valid() {
            return Err(AppError::InvalidZone(format!(
                "{} : center ({}, {}) is out of range",
                self.id.0, self.center.lat.0, self.center.lon.0
            )));
        }
        Ok(())
    }
}

/// Ordered, validated set of sensitive zones.
///
/// Store order is preserved: it decides the winner when two zones contain a point at
/// exactly the same distance.
#[derive(Debug, Clone, Default)]
pub struct ZoneIndex {
    zones: Vec<SensitiveZone>,
}

impl ZoneIndex {
    /// Builds the index, dropping zones that fail validation.
    pub fn new(zones: Vec<SensitiveZone>) -> Self {
        let zones = zones
            .into_iter()
            .filter(|zone| match zone.validate() {
                Ok(()) => true,
                Err(err) => {
                    warn!(tag = "[Zone Rejected]", error = %err.message());
                    false
                }
            })
            .collect();
        ZoneIndex { zones }
    }

    pub fn zones(&self) -> &[SensitiveZone] {
        &self.zones
    }

    pub fn len(&self) -> usize {
        self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// Nearest zone whose radius covers the point. A NaN distance never contains.
    pub fn containing(&self, point: &Point) -> Option<(&SensitiveZone, f64)> {
        self.zones
            .iter()
            .map(|zone| (zone, distance_between_in_meters(point, &zone.center)))
            .filter(|(zone, distance)| *distance <= zone.radius.0)
            .fold(None, nearest)
    }

    pub fn nearest(&self, point: &Point) -> Option<(&SensitiveZone, f64)> {
        self.zones
            .iter()
            .map(|zone| (zone, distance_between_in_meters(point, &zone.center)))
            .filter(|(_, distance)| !distance.is_nan())
            .fold(None, nearest)
    }

    /// Zones whose center lies inside the box, in store order.
    pub fn zones_within(&self, bbox: &BoundingBox) -> Vec<&SensitiveZone> {
        self.zones
            .iter()
            .filter(|zone| bbox.contains(&zone.center))
            .collect()
    }

    pub fn statistics(&self) -> ZoneStatistics {
        let by_type = ZoneType::iter()
            .filter_map(|zone_type| {
                let radii: Vec<f64> = self
                    .zones
                    .iter()
                    .filter(|zone| zone.zone_type == zone_type)
                    .map(|zone| zone.radius.0)
                    .collect();
                if radii.is_empty() {
                    return None;
                }
                Some(ZoneTypeStatistics {
                    zone_type,
                    count: radii.len(),
                    average_radius: Meters(radii.iter().sum::<f64>() / radii.len() as f64),
                })
            })
            .collect();

        ZoneStatistics {
            total: self.zones.len(),
            by_type,
        }
    }
}

// A candidate only replaces the current best when strictly nearer.
fn nearest<'a>(
    best: Option<(&'a SensitiveZone, f64)>,
    candidate: (&'a SensitiveZone, f64),
) -> Option<(&'a SensitiveZone, f64)> {
    match best {
        Some((_, best_distance)) if best_distance <= candidate.1 => best,
        _ => Some(candidate),
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneTypeStatistics {
    #[serde(rename = "type")]
    pub zone_type: ZoneType,
    pub count: usize,
    pub average_radius: Meters,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ZoneStatistics {
    pub total: usize,
    pub by_type: Vec<ZoneTypeStatistics>,
}

/// Reads every GeoJSON `FeatureCollection` in `config_path`, files taken in name order.
pub fn read_sensitive_zones(config_path: &str) -> Result<Vec<SensitiveZone>, AppError> {
    let entries = fs::read_dir(config_path).map_err(|err| {
        AppError::InvalidConfiguration(format!("Failed to read zone directory {config_path} : {err}"))
    })?;

    let mut paths = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|path| path.is_file())
        .collect::<Vec<_>>();
    paths.sort();

    let mut zones = Vec::new();
    for path in paths {
        let contents = fs::read_to_string(&path).map_err(|err| {
            AppError::InvalidConfiguration(format!("Failed to read {} : {err}", path.display()))
        })?;
        let mut parsed = parse_zone_collection(&source_name(&path), &contents)?;
        info!(tag = "[Zones Loaded]", file = %path.display(), count = parsed.len());
        zones.append(&mut parsed);
    }

    Ok(zones)
}

fn source_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().to_string())
        .unwrap_or_default()
}

/// Parses a `FeatureCollection` of Point features. Features that do not describe a zone
/// are logged and skipped, a document that is not a collection is an error.
pub fn parse_zone_collection(source: &str, geojson_str: &str) -> Result<Vec<SensitiveZone>, AppError> {
    let geojson = GeoJson::from_str(geojson_str)
        .map_err(|err| AppError::InvalidZone(format!("{source} : {err}")))?;

    let GeoJson::FeatureCollection(collection) = geojson else {
        return Err(AppError::InvalidZone(format!(
            "{source} : GeoJSON is not a FeatureCollection."
        )));
    };

    Ok(collection
        .features
        .iter()
        .enumerate()
        .filter_map(|(idx, feature)| match parse_zone_feature(source, idx, feature) {
            Ok(zone) => Some(zone),
            Err(err) => {
                warn!(tag = "[Zone Skipped]", error = %err.message());
                None
            }
        })
        .collect())
}

fn parse_zone_feature(source: &str, idx: usize, feature: &Feature) -> Result<SensitiveZone, AppError> {
    let invalid = |reason: &str| AppError::InvalidZone(format!("{source}[{idx}] : {reason}"));

    let center = match feature.geometry.as_ref().map(|geometry| &geometry.value) {
        Some(Value::Point(position)) if position.len() >= 2 => Point::new(position[1], position[0]),
        _ => return Err(invalid("geometry must be a Point")),
    };

    let name = feature
        .property("name")
        .and_then(|name| name.as_str())
        .ok_or_else(|| invalid("missing name"))?
        .to_string();

    let zone_type = feature
        .property("type")
        .and_then(|zone_type| zone_type.as_str())
        .and_then(|zone_type| ZoneType::from_str(&zone_type.to_lowercase()).ok())
        .ok_or_else(|| invalid("missing or unknown zone type"))?;

    let radius = feature
        .property("radius")
        .and_then(|radius| radius.as_f64())
        .ok_or_else(|| invalid("missing radius"))?;

    let id = match (&feature.id, feature.property("id")) {
        (Some(Id::String(id)), _) => id.to_owned(),
        (Some(Id::Number(id)), _) => id.to_string(),
        (None, Some(id)) => id
            .as_str()
            .map(|id| id.to_string())
            .unwrap_or_else(|| id.to_string()),
        (None, None) => format!("{source}-{idx}"),
    };

    let zone = SensitiveZone {
        id: ZoneId(id),
        name,
        zone_type,
        center,
        radius: Meters(radius),
        address: feature
            .property("address")
            .and_then(|address| address.as_str())
            .map(|address| address.to_string()),
    };

    zone.validate()?;

    Ok(zone)
}
