use std::collections::HashMap;

use crate::analyzers::road_id::parse_road_id;
use crate::analyzers::types::{HotspotResult, HotspotType, RoadAggregate};
use crate::analyzers::utility::ratio;

#[derive(Default)]
struct RoadTally {
    total: usize,
    hotspots: usize,
    coldspots: usize,
    hot_z_sum: f64,
}

/// Road a result belongs to: the explicit `road_id`, else parsed from the point id.
/// Results with neither are not attributable to any road.
fn road_key(r: &HotspotResult) -> Option<String> {
    match (&r.road_id, &r.id) {
        (Some(road), _) if !road.is_empty() => Some(road.clone()),
        (_, Some(id)) if !id.is_empty() => Some(parse_road_id(id)),
        _ => None,
    }
}

/// Folds point-level Gi* results into one [`RoadAggregate`] per road.
///
/// Sorted by hotspot count, then hot ratio, both descending. Roads that tie on
/// both keep the order in which they first appeared.
pub fn aggregate_hotspots_by_road(results: &[HotspotResult]) -> Vec<RoadAggregate> {
    let mut order: Vec<String> = Vec::new();
    let mut tallies: HashMap<String, RoadTally> = HashMap::new();

    for r in results {
        let Some(road_id) = road_key(r) else {
            continue;
        };

        let tally = tallies.entry(road_id.clone()).or_insert_with(|| {
            order.push(road_id);
            RoadTally::default()
        });

        tally.total += 1;
        match r.hotspot_type {
            HotspotType::Hotspot => {
                tally.hotspots += 1;
                tally.hot_z_sum += r.z_score;
            }
            HotspotType::Coldspot => tally.coldspots += 1,
            HotspotType::NotSignificant => {}
        }
    }

    let mut roads: Vec<RoadAggregate> = order
        .into_iter()
        .filter_map(|road_id| {
            let t = tallies.remove(&road_id)?;
            Some(RoadAggregate {
                total_points: t.total,
                hotspot_count: t.hotspots,
                coldspot_count: t.coldspots,
                avg_hot_z: if t.hotspots > 0 {
                    t.hot_z_sum / t.hotspots as f64
                } else {
                    0.0
                },
                hot_ratio: ratio(t.hotspots, t.total),
                road_id,
            })
        })
        .collect();

    roads.sort_by(|a, b| {
        b.hotspot_count
            .cmp(&a.hotspot_count)
            .then_with(|| b.hot_ratio.total_cmp(&a.hot_ratio))
    });

    roads
}
