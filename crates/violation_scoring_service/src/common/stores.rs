/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::sync::Arc;

use async_trait::async_trait;
use rustc_hash::FxHashMap;
use tokio::sync::Mutex;

use super::{types::*, zones::ZoneIndex};
use crate::tools::error::AppError;

/// Read side of the sensitive zone catalogue.
#[async_trait]
pub trait ZoneStore: Send + Sync {
    async fn zone_index(&self) -> Result<Arc<ZoneIndex>, AppError>;

    async fn zones_within(&self, bbox: &BoundingBox) -> Result<Vec<SensitiveZone>, AppError> {
        Ok(self
            .zone_index()
            .await?
            .zones_within(bbox)
            .into_iter()
            .cloned()
            .collect())
    }
}

/// Outcome of an update closure: the record to write back along with a value for the caller.
pub type DriverUpdate<T> = Result<(DriverRecord, T), AppError>;

#[async_trait]
pub trait DriverStore: Send + Sync {
    async fn get_driver(&self, driver_id: &DriverId) -> Result<Option<DriverRecord>, AppError>;

    /// Atomic read-modify-write of a single driver record. `update` receives the stored record,
    /// or `None` for an unknown driver, and may run more than once on contended stores.
    async fn update_driver(
        &self,
        driver_id: &DriverId,
        update: &(dyn Fn(Option<DriverRecord>) -> DriverUpdate<MeritChange> + Send + Sync),
    ) -> Result<(DriverRecord, MeritChange), AppError>;
}

/// Points moved by a single ledger operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MeritChange {
    pub points: u32,
    pub already_applied: bool,
}

pub struct InMemoryZoneStore {
    index: Arc<ZoneIndex>,
}

impl InMemoryZoneStore {
    pub fn new(zones: Vec<SensitiveZone>) -> Self {
        InMemoryZoneStore {
            index: Arc::new(ZoneIndex::new(zones)),
        }
    }
}

#[async_trait]
impl ZoneStore for InMemoryZoneStore {
    async fn zone_index(&self) -> Result<Arc<ZoneIndex>, AppError> {
        Ok(self.index.clone())
    }
}

#[derive(Default)]
pub struct InMemoryDriverStore {
    drivers: Mutex<FxHashMap<DriverId, DriverRecord>>,
}

impl InMemoryDriverStore {
    pub fn new(drivers: Vec<DriverRecord>) -> Self {
        InMemoryDriverStore {
            drivers: Mutex::new(
                drivers
                    .into_iter()
                    .map(|driver| (driver.driver_id.to_owned(), driver))
                    .collect(),
            ),
        }
    }
}

#[async_trait]
impl DriverStore for InMemoryDriverStore {
    async fn get_driver(&self, driver_id: &DriverId) -> Result<Option<DriverRecord>, AppError> {
        Ok(self.drivers.lock().await.get(driver_id).cloned())
    }

    async fn update_driver(
        &self,
        driver_id: &DriverId,
        update: &(dyn Fn(Option<DriverRecord>) -> DriverUpdate<MeritChange> + Send + Sync),
    ) -> Result<(DriverRecord, MeritChange), AppError> {
        let mut drivers = self.drivers.lock().await;
        let (record, change) = update(drivers.get(driver_id).cloned())?;
        drivers.insert(driver_id.to_owned(), record.to_owned());
        Ok((record, change))
    }
}
