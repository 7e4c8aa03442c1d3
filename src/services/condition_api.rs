//! Trait and types for the road-condition record supplier.

use std::collections::HashMap;

use anyhow::Result;
use serde::Deserialize;

use crate::analyzers::types::LaneInput;

/// A persisted road-condition report. Unknown columns are ignored.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RoadConditionRecord {
    pub road_id: String,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub road_name: Option<String>,
    #[serde(default)]
    pub severity: Option<String>,
}

/// Abstraction over the service that stores road-condition reports.
#[async_trait::async_trait]
pub trait ConditionApi {
    /// Records for the given road ids; roads without a record are simply absent.
    async fn road_conditions(&self, road_ids: &[String]) -> Result<Vec<RoadConditionRecord>>;
}

/// Fills in `condition` and `road_name` for lanes that lack them. Returns how many lanes changed.
pub fn apply_conditions(lanes: &mut [LaneInput], records: &[RoadConditionRecord]) -> usize {
    let by_road: HashMap<&str, &RoadConditionRecord> =
        records.iter().map(|r| (r.road_id.as_str(), r)).collect();

    let mut updated = 0;
    for lane in lanes.iter_mut() {
        let Some(record) = by_road.get(lane.id.as_str()) else {
            continue;
        };

        let mut changed = false;
        if lane.condition.is_none() && record.condition.is_some() {
            lane.condition = record.condition.clone();
            changed = true;
        }
        if lane.road_name.is_none() && record.road_name.is_some() {
            lane.road_name = record.road_name.clone();
            changed = true;
        }
        if changed {
            updated += 1;
        }
    }

    updated
}
