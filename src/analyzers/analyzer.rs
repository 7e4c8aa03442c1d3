use serde::Serialize;
use tracing::{info, warn};

use crate::analyzers::aggregate::aggregate_hotspots_by_road;
use crate::analyzers::density::{DensityOptions, compute_kernel_density};
use crate::analyzers::hotspot::{HotspotOptions, compute_getis_ord_gi};
use crate::analyzers::interpret::{HotspotReport, interpret_hotspots};
use crate::analyzers::plan::{AnalysisPlan, plan_analysis};
use crate::analyzers::types::{DamagePoint, DensityGrid, HotspotResult, LaneInput, RoadAggregate};
use crate::config::AnalysisConfig;
use crate::geo::BoundingBox;

/// Severity assumed for a lane damage report that carries none.
pub const DEFAULT_REPORT_SEVERITY: f64 = 1.5;

pub const DEGRADED_NOTE: &str =
    "Data or resolution was reduced automatically to keep the analysis within its compute budget";

/// Severity multiplier for a lane's surveyed condition.
pub fn condition_weight(condition: Option<&str>) -> f64 {
    match condition {
        Some("Poor") => 1.8,
        Some("Fair") => 1.4,
        Some("Good") => 1.0,
        Some("Excellent") => 0.8,
        _ => 1.0,
    }
}

/// Per-lane facts reported alongside the analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadStat {
    pub id: String,
    pub name: Option<String>,
    pub condition: String,
    pub coord_count: usize,
    pub damage_count: usize,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoDataOutcome {
    pub road_stats: Vec<RoadStat>,
    pub summary: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AreaAnalysis {
    pub road_stats: Vec<RoadStat>,
    pub point_count: usize,
    pub used_point_count: usize,
    pub plan: AnalysisPlan,
    pub hotspots: Vec<HotspotResult>,
    pub report: HotspotReport,
    pub kernel: DensityGrid,
    pub road_hotspots: Vec<RoadAggregate>,
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum AreaOutcome {
    NoData(NoDataOutcome),
    Analyzed(Box<AreaAnalysis>),
}

/// Weighted damage points for a set of lanes, ids of the form `{lane}-d-{point}`.
pub fn damage_points_for_lanes(lanes: &[LaneInput]) -> Vec<DamagePoint> {
    lanes
        .iter()
        .flat_map(|lane| {
            let w = condition_weight(lane.condition.as_deref());
            lane.damage_points.iter().enumerate().map(move |(idx, p)| {
                let suffix = p.id.clone().unwrap_or_else(|| idx.to_string());
                DamagePoint {
                    id: Some(format!("{}-d-{}", lane.id, suffix)),
                    road_id: Some(lane.id.clone()),
                    lat: p.lat,
                    lng: p.lng,
                    value: Some(p.value.unwrap_or(DEFAULT_REPORT_SEVERITY) * w),
                }
            })
        })
        .collect()
}

pub fn road_stats(lanes: &[LaneInput]) -> Vec<RoadStat> {
    lanes
        .iter()
        .map(|l| RoadStat {
            id: l.id.clone(),
            name: l.road_name.clone(),
            condition: l.condition.clone().unwrap_or_else(|| "unknown".to_string()),
            coord_count: l.coordinates.len(),
            damage_count: l.damage_points.len(),
        })
        .collect()
}

/// Runs the full area pipeline over the selected lanes: adaptive plan,
/// hotspots, interpretation, kernel density and per-road aggregation.
#[tracing::instrument(skip(lanes, config), fields(lanes = lanes.len()))]
pub fn analyze_area(lanes: &[LaneInput], config: &AnalysisConfig) -> AreaOutcome {
    let stats = road_stats(lanes);
    let points = damage_points_for_lanes(lanes);

    let Some(bbox) = BoundingBox::from_positions(points.iter().map(|p| (p.lat, p.lng))) else {
        let poor = stats.iter().filter(|r| r.condition == "Poor").count();
        let fair = stats.iter().filter(|r| r.condition == "Fair").count();
        info!(roads = stats.len(), "No damage reports in selection");

        let suggestion = if poor > 0 {
            "Inspect the roads in poor condition on site"
        } else {
            "Road conditions in the selected area are good"
        };

        return AreaOutcome::NoData(NoDataOutcome {
            summary: format!(
                "Selected {} roads, no reported damage points.\nOf these: {poor} poor, {fair} fair.",
                stats.len()
            ),
            suggestions: vec![suggestion.to_string()],
            road_stats: stats,
        });
    };

    let plan = plan_analysis(&bbox, points.len(), config.max_ops);
    let used = plan.sample(&points);

    let hotspots = compute_getis_ord_gi(
        &used,
        &HotspotOptions {
            bandwidth_meters: plan.bandwidth,
            significance_z: config.significance_z,
        },
    );
    let report = interpret_hotspots(&hotspots);
    let kernel = compute_kernel_density(
        &used,
        &DensityOptions {
            bandwidth_meters: plan.bandwidth,
            cell_size_meters: plan.cell_size,
            bbox: Some(bbox),
            normalize: config.normalize,
            max_cells: config.max_cells,
        },
    );
    let road_hotspots = aggregate_hotspots_by_road(&hotspots);

    if plan.degraded {
        warn!(
            points = points.len(),
            used = used.len(),
            cell_size = plan.cell_size,
            "Area analysis ran at reduced resolution"
        );
    }

    info!(
        points = points.len(),
        hotspots = report.hotspot_count,
        coldspots = report.coldspot_count,
        health = report.health.level.label(),
        roads = road_hotspots.len(),
        "Area analysis complete"
    );

    AreaOutcome::Analyzed(Box::new(AreaAnalysis {
        road_stats: stats,
        point_count: points.len(),
        used_point_count: used.len(),
        note: plan.degraded.then(|| DEGRADED_NOTE.to_string()),
        plan,
        hotspots,
        report,
        kernel,
        road_hotspots,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::types::LatLng;

    fn lane(id: &str, condition: Option<&str>, damage: Vec<DamagePoint>) -> LaneInput {
        LaneInput {
            id: id.to_string(),
            road_name: Some(format!("Road {id}")),
            condition: condition.map(str::to_string),
            coordinates: vec![
                LatLng {
                    lat: 31.23,
                    lng: 121.47,
                },
                LatLng {
                    lat: 31.24,
                    lng: 121.47,
                },
            ],
            damage_points: damage,
        }
    }

    #[test]
    fn test_condition_weights() {
        assert_eq!(condition_weight(Some("Poor")), 1.8);
        assert_eq!(condition_weight(Some("Fair")), 1.4);
        assert_eq!(condition_weight(Some("Good")), 1.0);
        assert_eq!(condition_weight(Some("Excellent")), 0.8);
        assert_eq!(condition_weight(Some("whatever")), 1.0);
        assert_eq!(condition_weight(None), 1.0);
    }

    #[test]
    fn test_damage_points_ids_and_weights() {
        let lanes = vec![lane(
            "osm-7",
            Some("Poor"),
            vec![
                DamagePoint::new(31.23, 121.47).with_id("r1").with_value(2.0),
                DamagePoint::new(31.231, 121.47),
            ],
        )];
        let points = damage_points_for_lanes(&lanes);
        assert_eq!(points[0].id.as_deref(), Some("osm-7-d-r1"));
        assert_eq!(points[1].id.as_deref(), Some("osm-7-d-1"));
        assert!(points.iter().all(|p| p.road_id.as_deref() == Some("osm-7")));
        assert!((points[0].weight() - 3.6).abs() < 1e-12);
        assert!((points[1].weight() - 2.7).abs() < 1e-12);
    }

    #[test]
    fn test_no_damage_is_no_data() {
        let lanes = vec![lane("a", Some("Poor"), vec![]), lane("b", Some("Fair"), vec![])];
        match analyze_area(&lanes, &AnalysisConfig::default()) {
            AreaOutcome::NoData(out) => {
                assert_eq!(out.road_stats.len(), 2);
                assert!(out.summary.contains("1 poor, 1 fair"));
                assert!(out.suggestions[0].contains("poor condition"));
            }
            AreaOutcome::Analyzed(_) => panic!("expected no-data outcome"),
        }
    }

    #[test]
    fn test_area_pipeline_runs_all_stages() {
        let mut hot = Vec::new();
        for i in 0..10 {
            hot.push(DamagePoint::new(31.2304 + i as f64 * 0.00001, 121.4737).with_value(5.0));
        }
        let mut calm = Vec::new();
        for i in 0..10 {
            calm.push(DamagePoint::new(31.26 + i as f64 * 0.01, 121.52).with_value(1.0));
        }
        let lanes = vec![lane("hot", Some("Good"), hot), lane("calm", Some("Good"), calm)];

        let AreaOutcome::Analyzed(analysis) = analyze_area(&lanes, &AnalysisConfig::default())
        else {
            panic!("expected analysis");
        };
        assert_eq!(analysis.point_count, 20);
        assert_eq!(analysis.used_point_count, 20);
        assert_eq!(analysis.hotspots.len(), 20);
        assert_eq!(analysis.report.total, 20);
        assert_eq!(analysis.kernel.cells.len(), analysis.kernel.rows * analysis.kernel.cols);
        assert_eq!(analysis.road_hotspots[0].road_id, "hot");
        assert!(analysis.road_hotspots[0].hotspot_count > 0);
    }

    #[test]
    fn test_degraded_note_when_over_budget() {
        let damage: Vec<_> = (0..400)
            .map(|i| {
                DamagePoint::new(31.0 + (i % 20) as f64 * 0.01, 121.0 + (i / 20) as f64 * 0.01)
            })
            .collect();
        let lanes = vec![lane("wide", None, damage)];
        let config = AnalysisConfig {
            max_ops: 10_000,
            ..Default::default()
        };
        let AreaOutcome::Analyzed(analysis) = analyze_area(&lanes, &config) else {
            panic!("expected analysis");
        };
        assert!(analysis.plan.degraded);
        assert!(analysis.note.is_some());
        assert!(analysis.used_point_count <= analysis.point_count);
    }
}
