/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use std::sync::Arc;

use async_trait::async_trait;
use fred::{prelude::*, types::RedisConfig as RedisClientConfig};
use tokio::sync::RwLock;

use crate::{
    common::{
        stores::{DriverStore, DriverUpdate, MeritChange, ZoneStore},
        types::*,
        zones::ZoneIndex,
    },
    environment::RedisConfig,
    redis::keys::*,
    tools::{error::AppError, logger::*},
};

/// Sets `KEYS[1]` to `ARGV[2]` only if it still holds `ARGV[1]`; an empty `ARGV[1]` expects no key.
const COMPARE_AND_SET: &str = r#"
local current = redis.call('GET', KEYS[1])
if (current == false and ARGV[1] == '') or current == ARGV[1] then
    redis.call('SET', KEYS[1], ARGV[2])
    return 1
end
return 0
"#;

pub async fn new_redis_pool(cfg: &RedisConfig) -> Result<RedisPool, RedisError> {
    let url = format!("redis://{}:{}/{}", cfg.redis_host, cfg.redis_port, cfg.redis_partition);
    let pool = Builder::from_config(RedisClientConfig::from_url(&url)?)
        .set_policy(ReconnectPolicy::new_constant(
            cfg.reconnect_max_attempts,
            cfg.reconnect_delay,
        ))
        .build_pool(cfg.redis_pool_size)?;
    pool.init().await?;
    Ok(pool)
}

pub async fn health_check(pool: &RedisPool) -> Result<(), AppError> {
    let unavailable = |err: RedisError| AppError::InternalError(format!("Health check failed : {err}"));

    pool.next().set::<(), _, _>(
        health_check_key(),
        "violation-scoring-service-health-check",
        None,
        None,
        false,
    )
    .await
    .map_err(unavailable)?;

    let value: Option<String> = pool.next().get(health_check_key()).await.map_err(unavailable)?;
    if value.is_none() {
        return Err(AppError::InternalError(
            "Health check failed as cannot get key from redis".to_string(),
        ));
    }

    Ok(())
}

/// Zones written by the importer as a JSON array under a single key.
pub struct RedisZoneStore {
    pool: Arc<RedisPool>,
    cache: ZoneIndexCache,
}

impl RedisZoneStore {
    pub fn new(pool: Arc<RedisPool>) -> Self {
        RedisZoneStore {
            pool,
            cache: ZoneIndexCache::default(),
        }
    }
}

#[async_trait]
impl ZoneStore for RedisZoneStore {
    async fn zone_index(&self) -> Result<Arc<ZoneIndex>, AppError> {
        let zones: Option<String> = self
            .pool
            .next()
            .get(sensitive_zones_key())
            .await
            .map_err(|err| AppError::ZoneStoreUnavailable(err.to_string()))?;

        self.cache.index_for(zones).await
    }
}

struct CachedZoneIndex {
    raw: Option<String>,
    index: Arc<ZoneIndex>,
}

/// Parsed zone catalogue, rebuilt only when the stored JSON changes.
#[derive(Default)]
pub struct ZoneIndexCache {
    cached: RwLock<Option<CachedZoneIndex>>,
}

impl ZoneIndexCache {
    pub async fn index_for(&self, raw: Option<String>) -> Result<Arc<ZoneIndex>, AppError> {
        if let Some(cached) = self.cached.read().await.as_ref() {
            if cached.raw == raw {
                return Ok(cached.index.clone());
            }
        }

        let zones = match raw.as_deref() {
            Some(zones) => serde_json::from_str::<Vec<SensitiveZone>>(zones)
                .map_err(|err| AppError::ZoneStoreUnavailable(format!("Malformed zone catalogue : {err}")))?,
            None => Vec::new(),
        };
        let index = Arc::new(ZoneIndex::new(zones));
        info!(tag = "[Zone Catalogue Reloaded]", count = index.len());

        *self.cached.write().await = Some(CachedZoneIndex {
            raw,
            index: index.clone(),
        });

        Ok(index)
    }
}

/// Driver records as JSON strings, updated with an optimistic compare-and-set.
pub struct RedisDriverStore {
    pool: Arc<RedisPool>,
    max_retries: u32,
}

impl RedisDriverStore {
    pub fn new(pool: Arc<RedisPool>, max_retries: u32) -> Self {
        RedisDriverStore { pool, max_retries }
    }

    async fn get_raw(&self, driver_id: &DriverId) -> Result<Option<String>, AppError> {
        self.pool
            .next()
            .get(driver_record_key(driver_id))
            .await
            .map_err(|err| AppError::DriverStoreUnavailable(err.to_string()))
    }
}

/// `ARGV` for [`COMPARE_AND_SET`]: an absent record is expected as the empty string.
fn compare_and_set_args(expected: Option<String>, new: String) -> Vec<String> {
    vec![expected.unwrap_or_default(), new]
}

fn parse_record(raw: &str) -> Result<DriverRecord, AppError> {
    serde_json::from_str(raw).map_err(|err| AppError::InvalidDriverRecord(err.to_string()))
}

#[async_trait]
impl DriverStore for RedisDriverStore {
    async fn get_driver(&self, driver_id: &DriverId) -> Result<Option<DriverRecord>, AppError> {
        self.get_raw(driver_id)
            .await?
            .map(|raw| parse_record(&raw))
            .transpose()
    }

    async fn update_driver(
        &self,
        driver_id: &DriverId,
        update: &(dyn Fn(Option<DriverRecord>) -> DriverUpdate<MeritChange> + Send + Sync),
    ) -> Result<(DriverRecord, MeritChange), AppError> {
        let key = driver_record_key(driver_id);

        for attempt in 0..=self.max_retries {
            let current = self.get_raw(driver_id).await?;
            let record = current.as_deref().map(parse_record).transpose()?;
            let (updated, change) = update(record)?;
            let serialized = serde_json::to_string(&updated)
                .map_err(|err| AppError::SerializationError(err.to_string()))?;

            let swapped: i64 = self
                .pool
                .next()
                .eval(
                    COMPARE_AND_SET,
                    vec![key.to_owned()],
                    compare_and_set_args(current, serialized),
                )
                .await
                .map_err(|err| AppError::DriverStoreUnavailable(err.to_string()))?;

            if swapped == 1 {
                return Ok((updated, change));
            }

            debug!(tag = "[Merit Update Retry]", driver_id = %driver_id.0, attempt = attempt);
        }

        Err(AppError::MeritUpdateConflict(driver_id.0.to_owned()))
    }
}
