/*  Copyright 2022-23, Juspay India Pvt Ltd
    This program is free software: you can redistribute it and/or modify it under the terms of the GNU Affero General Public License
    as published by the Free Software Foundation, either version 3 of the License, or (at your option) any later version. This program
    is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranty of MERCHANTABILITY
    or FITNESS FOR A PARTICULAR PURPOSE. See the GNU Affero General Public License for more details. You should have received a copy of
    the GNU Affero General Public License along with this program. If not, see <https://www.gnu.org/licenses/>.
*/
use violation_scoring_service::environment::{read_dhall_config, ScoringPolicy, StoreBackend};

#[test]
fn shipped_dhall_config_parses() {
    let config = read_dhall_config("../../dhall_config/violation_scoring_service.dhall")
        .expect("dhall config should parse");

    assert_eq!(config.zone_store, StoreBackend::InMemory);
    assert_eq!(config.scoring_policy.risk.utc_offset_minutes, 330);
    assert_eq!(
        config.scoring_policy.risk.weights,
        ScoringPolicy::default().risk.weights
    );
    assert_eq!(
        config.scoring_policy.speed_limits,
        ScoringPolicy::default().speed_limits
    );
    assert_eq!(config.scoring_policy.fine, ScoringPolicy::default().fine);
}
