/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
#[cfg(test)]
mod config;
#[cfg(test)]
mod merit_api;
#[cfg(test)]
mod scoring_api;

#[cfg(test)]
mod harness {
    use std::sync::Arc;

    use actix_http::Request;
    use actix_web::{
        body::MessageBody,
        dev::{Service, ServiceResponse},
        test,
        web::{Data, JsonConfig, QueryConfig},
        App, Error,
    };
    use violation_scoring_service::{
        common::{
            stores::{DriverStore, InMemoryDriverStore, InMemoryZoneStore, ZoneStore},
            types::*,
        },
        domain::api,
        environment::{AppState, ScoringPolicy},
        middleware::{CheckContentLength, RequestTimeout},
        tools::error::AppError,
    };

    pub fn zone(id: &str, zone_type: ZoneType, lat: f64, lon: f64, radius: f64) -> SensitiveZone {
        SensitiveZone {
            id: ZoneId(id.to_string()),
            name: id.to_string(),
            zone_type,
            center: Point::new(lat, lon),
            radius: Meters(radius),
            address: None,
        }
    }

    /// University first so that store order alone would pick it over the school.
    pub fn colombo_zones() -> Vec<SensitiveZone> {
        vec![
            zone("university-of-colombo", ZoneType::University, 6.9022, 79.8600, 500.0),
            zone("royal-college", ZoneType::School, 6.9020, 79.8630, 250.0),
            zone("national-hospital", ZoneType::Hospital, 6.9193, 79.8683, 300.0),
        ]
    }

    pub fn state_with(zones: Arc<dyn ZoneStore>, drivers: Arc<dyn DriverStore>) -> AppState {
        AppState::with_stores(zones, drivers, ScoringPolicy::default())
    }

    pub fn state(drivers: Vec<DriverRecord>) -> AppState {
        state_with(
            Arc::new(InMemoryZoneStore::new(colombo_zones())),
            Arc::new(InMemoryDriverStore::new(drivers)),
        )
    }

    pub async fn app(
        state: AppState,
    ) -> impl Service<Request, Response = ServiceResponse<impl MessageBody>, Error = Error> {
        test::init_service(
            App::new()
                .app_data(Data::new(state))
                .app_data(
                    JsonConfig::default().error_handler(|err, _| {
                        AppError::UnprocessibleRequest(err.to_string()).into()
                    }),
                )
                .app_data(
                    QueryConfig::default()
                        .error_handler(|err, _| AppError::InvalidRequest(err.to_string()).into()),
                )
                .wrap(CheckContentLength)
                .wrap(RequestTimeout)
                .configure(api::handler),
        )
        .await
    }
}
