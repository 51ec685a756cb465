/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#![allow(clippy::expect_used)]

use std::{env::var, sync::Arc};

use fred::clients::RedisPool;
use serde::{Deserialize, Serialize};

use crate::{
    common::{
        fine::{FineCalculator, FinePolicy},
        geofence::GeofenceResolver,
        merit::{MeritLedger, MeritPolicy},
        risk::{RiskPolicy, RiskScorer},
        speed_limit::SpeedLimitPolicy,
        stores::{DriverStore, InMemoryDriverStore, InMemoryZoneStore, ZoneStore},
        zones::read_sensitive_zones,
    },
    redis::commands::{new_redis_pool, RedisDriverStore, RedisZoneStore},
    tools::logger::*,
};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub workers: usize,
    pub logger_cfg: LoggerConfig,
    pub redis_cfg: RedisConfig,
    pub zone_store: StoreBackend,
    pub driver_store: StoreBackend,
    pub request_timeout: u64,
    pub max_allowed_req_size: usize,
    pub log_unprocessible_req_body: Vec<String>,
    pub merit_update_retries: u32,
    pub scoring_policy: ScoringPolicy,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RedisConfig {
    pub redis_host: String,
    pub redis_port: u16,
    pub redis_pool_size: usize,
    pub redis_partition: usize,
    pub reconnect_max_attempts: u32,
    pub reconnect_delay: u32,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Redis,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub struct ScoringPolicy {
    pub fine: FinePolicy,
    pub speed_limits: SpeedLimitPolicy,
    pub risk: RiskPolicy,
    pub merit: MeritPolicy,
}

pub fn read_dhall_config(config_path: &str) -> Result<AppConfig, String> {
    let config = serde_dhall::from_file(config_path).parse::<AppConfig>();
    match config {
        Ok(config) => Ok(config),
        Err(e) => Err(format!("Error reading config: {}", e)),
    }
}

pub struct AppState {
    pub fine_calculator: FineCalculator,
    pub drivers: Arc<dyn DriverStore>,
    pub ledger: MeritLedger,
    pub redis: Option<Arc<RedisPool>>,
    pub request_timeout: u64,
    pub max_allowed_req_size: usize,
    pub log_unprocessible_req_body: Vec<String>,
}

impl AppState {
    pub async fn new(app_config: AppConfig) -> AppState {
        let needs_redis = app_config.zone_store == StoreBackend::Redis
            || app_config.driver_store == StoreBackend::Redis;

        let redis = if needs_redis {
            Some(Arc::new(
                new_redis_pool(&app_config.redis_cfg)
                    .await
                    .expect("Failed to create Redis connection pool"),
            ))
        } else {
            None
        };

        let zones: Arc<dyn ZoneStore> = match (&app_config.zone_store, &redis) {
            (StoreBackend::Redis, Some(pool)) => Arc::new(RedisZoneStore::new(pool.clone())),
            _ => {
                let geo_config_path = var("GEO_CONFIG").unwrap_or_else(|_| "./geo_config".to_string());
                let zones = read_sensitive_zones(&geo_config_path)
                    .expect("Failed to read sensitive zones from GEO_CONFIG");
                info!(tag = "[Sensitive Zones]", path = %geo_config_path, count = zones.len());
                Arc::new(InMemoryZoneStore::new(zones))
            }
        };

        let drivers: Arc<dyn DriverStore> = match (&app_config.driver_store, &redis) {
            (StoreBackend::Redis, Some(pool)) => Arc::new(RedisDriverStore::new(
                pool.clone(),
                app_config.merit_update_retries,
            )),
            _ => Arc::new(InMemoryDriverStore::default()),
        };

        AppState {
            redis,
            request_timeout: app_config.request_timeout,
            max_allowed_req_size: app_config.max_allowed_req_size,
            log_unprocessible_req_body: app_config.log_unprocessible_req_body,
            ..AppState::with_stores(zones, drivers, app_config.scoring_policy)
        }
    }

    /// State over the given stores with no Redis health dependency.
    pub fn with_stores(
        zones: Arc<dyn ZoneStore>,
        drivers: Arc<dyn DriverStore>,
        policy: ScoringPolicy,
    ) -> AppState {
        AppState {
            fine_calculator: FineCalculator::new(
                GeofenceResolver::new(zones),
                drivers.clone(),
                RiskScorer::new(policy.risk),
                policy.speed_limits,
                policy.fine,
            ),
            drivers,
            ledger: MeritLedger::new(policy.merit),
            redis: None,
            request_timeout: 5000,
            max_allowed_req_size: 512_000,
            log_unprocessible_req_body: vec![],
        }
    }
}
