/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
pub mod internal;
pub mod ui;

use actix_web::web::ServiceConfig;

pub fn handler(config: &mut ServiceConfig) {
    config
        .service(internal::violation::calculate_violation_fine)
        .service(ui::zone::analyze_violation_location)
        .service(ui::zone::zones_within)
        .service(internal::zone::zone_statistics)
        .service(internal::risk::model_metrics)
        .service(internal::merit::deduct_merit_points)
        .service(internal::merit::restore_merit_points)
        .service(internal::merit::recover_merit_points)
        .service(internal::merit::merit_status)
        .service(ui::healthcheck::health_check_status);
}
