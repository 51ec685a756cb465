/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::sync::Arc;

use super::{stores::ZoneStore, types::*, zones::ZoneIndex};
use crate::tools::{error::AppError, logger::*};

/// Resolves GPS points against the sensitive zone catalogue.
#[derive(Clone)]
pub struct GeofenceResolver {
    store: Arc<dyn ZoneStore>,
}

impl GeofenceResolver {
    pub fn new(store: Arc<dyn ZoneStore>) -> Self {
        GeofenceResolver { store }
    }

    pub async fn find_containing_zone(&self, point: &Point) -> Result<Option<ZoneMatch>, AppError> {
        let index = self.store.zone_index().await?;
        Ok(containing_zone(&index, point))
    }

    pub async fn find_nearest_zone(&self, point: &Point) -> Result<Option<ClosestZone>, AppError> {
        let index = self.store.zone_index().await?;
        Ok(nearest_zone(&index, point))
    }

    pub async fn zones_within(&self, bbox: &BoundingBox) -> Result<Vec<SensitiveZone>, AppError> {
        self.store.zones_within(bbox).await
    }

    pub async fn zone_index(&self) -> Result<Arc<ZoneIndex>, AppError> {
        self.store.zone_index().await
    }

    /// Like [`GeofenceResolver::analyze`] but surfaces a failing zone store to the caller.
    pub async fn try_analyze(&self, point: &Point) -> Result<GeofenceResult, AppError> {
        let index = self.store.zone_index().await?;

        if let Some(zone) = containing_zone(&index, point) {
            return Ok(GeofenceResult {
                is_in_zone: true,
                multiplier: zone.multiplier,
                zone: Some(zone),
                closest_zone: None,
            });
        }

        Ok(GeofenceResult::outside_all_zones(nearest_zone(&index, point)))
    }

    /// Never fails: an unavailable zone store reads as "outside every zone".
    pub async fn analyze(&self, point: &Point) -> GeofenceResult {
        match self.try_analyze(point).await {
            Ok(result) => result,
            Err(err) => {
                warn!(tag = "[Geofencing Unavailable]", error = %err.message());
                GeofenceResult::outside_all_zones(None)
            }
        }
    }
}

fn containing_zone(index: &ZoneIndex, point: &Point) -> Option<ZoneMatch> {
    index.containing(point).map(|(zone, distance)| ZoneMatch {
        zone_type: zone.zone_type,
        name: zone.name.to_owned(),
        distance_from_center: Meters(distance),
        radius: zone.radius,
        multiplier: zone.zone_type.fine_multiplier(),
    })
}

fn nearest_zone(index: &ZoneIndex, point: &Point) -> Option<ClosestZone> {
    index.nearest(point).map(|(zone, distance)| ClosestZone {
        name: zone.name.to_owned(),
        zone_type: zone.zone_type,
        distance: Meters(distance),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::stores::InMemoryZoneStore;
    use async_trait::async_trait;

    struct UnreachableZoneStore;

    #[async_trait]
    impl ZoneStore for UnreachableZoneStore {
        async fn zone_index(&self) -> Result<Arc<ZoneIndex>, AppError> {
            Err(AppError::ZoneStoreUnavailable("connection refused".to_string()))
        }
    }

    fn zone(name: &str, zone_type: ZoneType, lat: f64, lon: f64, radius: f64) -> SensitiveZone {
        SensitiveZone {
            id: ZoneId(name.to_lowercase()),
            name: name.to_string(),
            zone_type,
            center: Point::new(lat, lon),
            radius: Meters(radius),
            address: None,
        }
    }

    fn resolver(zones: Vec<SensitiveZone>) -> GeofenceResolver {
        GeofenceResolver::new(Arc::new(InMemoryZoneStore::new(zones)))
    }

    #[tokio::test]
    async fn point_in_university_zone() {
        let resolver = resolver(vec![zone("Campus", ZoneType::University, 6.9022, 79.86, 500.0)]);
        let result = resolver.analyze(&Point::new(6.9022, 79.86)).await;

        assert!(result.is_in_zone);
        assert_eq!(result.multiplier, 2.0);
        let zone = result.zone.unwrap();
        assert_eq!(zone.zone_type, ZoneType::University);
        assert_eq!(zone.distance_from_center, Meters(0.0));
        assert_eq!(zone.radius, Meters(500.0));
        assert!(result.closest_zone.is_none());
    }

    #[tokio::test]
    async fn overlapping_zones_resolve_to_nearest_center() {
        let resolver = resolver(vec![
            zone("Town", ZoneType::Town, 6.9100, 79.8600, 3_000.0),
            zone("Hospital", ZoneType::Hospital, 6.9010, 79.8600, 400.0),
        ]);
        let point = Point::new(6.9000, 79.8600);

        let found = resolver.find_containing_zone(&point).await.unwrap().unwrap();
        assert_eq!(found.name, "Hospital");
        assert_eq!(found.multiplier, 3.0);
    }

    #[tokio::test]
    async fn outside_all_zones_reports_closest() {
        let resolver = resolver(vec![
            zone("Far", ZoneType::City, 7.2906, 80.6337, 1_000.0),
            zone("Near", ZoneType::School, 6.9300, 79.8600, 200.0),
        ]);
        let result = resolver.analyze(&Point::new(6.9000, 79.8600)).await;

        assert!(!result.is_in_zone);
        assert_eq!(result.multiplier, 1.0);
        assert!(result.zone.is_none());
        let closest = result.closest_zone.unwrap();
        assert_eq!(closest.name, "Near");
        assert!(closest.distance.0 > 3_000.0 && closest.distance.0 < 3_500.0);
    }

    #[tokio::test]
    async fn nearest_zone_ignores_radius() {
        let resolver = resolver(vec![
            zone("Far", ZoneType::City, 7.2906, 80.6337, 1_000.0),
            zone("Near", ZoneType::School, 6.9300, 79.8600, 200.0),
        ]);
        let point = Point::new(6.9000, 79.8600);

        assert!(resolver.find_containing_zone(&point).await.unwrap().is_none());
        let nearest = resolver.find_nearest_zone(&point).await.unwrap().unwrap();
        assert_eq!(nearest.zone_type, ZoneType::School);
        assert!(resolver.find_nearest_zone(&Point::new(f64::NAN, 0.0)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_catalogue_is_outside_without_closest_zone() {
        let result = resolver(vec![]).try_analyze(&Point::new(6.9, 79.86)).await.unwrap();
        assert_eq!(result, GeofenceResult::outside_all_zones(None));
    }

    #[tokio::test]
    async fn unreachable_store_degrades_in_analyze() {
        let resolver = GeofenceResolver::new(Arc::new(UnreachableZoneStore));
        let point = Point::new(6.9, 79.86);

        assert!(matches!(
            resolver.try_analyze(&point).await,
            Err(AppError::ZoneStoreUnavailable(_))
        ));
        assert_eq!(
            resolver.analyze(&point).await,
            GeofenceResult::outside_all_zones(None)
        );
    }

    #[tokio::test]
    async fn nan_coordinates_are_outside() {
        let resolver = resolver(vec![zone("Campus", ZoneType::University, 6.9, 79.86, 500.0)]);
        let result = resolver.analyze(&Point::new(f64::NAN, f64::NAN)).await;
        assert_eq!(result, GeofenceResult::outside_all_zones(None));
    }
}
