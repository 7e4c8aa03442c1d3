//! Turns per-point Gi* results into an area-level report: health grade,
//! narrative insights on three levels (area, point, road) and maintenance suggestions.

use serde::Serialize;

use crate::analyzers::grade::{AreaHealth, HealthLevel, grade_area};
use crate::analyzers::types::{HotspotResult, HotspotType};
use crate::analyzers::utility::{percent, ratio};

/// 99% two-tailed confidence.
pub const CRITICAL_Z: f64 = 2.58;
/// 95% two-tailed confidence.
pub const HIGH_Z: f64 = 1.96;

const STRUCTURAL_FAILURE_Z: f64 = 3.5;
const PIPELINE_FAILURE_Z: f64 = 3.0;
const COLDSPOT_NOTE_RATIO: f64 = 0.10;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Insights {
    pub area: Vec<String>,
    pub point: Vec<String>,
    pub line: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotReport {
    pub total: usize,
    pub hotspot_count: usize,
    pub coldspot_count: usize,
    pub normal_count: usize,
    pub hot_ratio: f64,
    pub cold_ratio: f64,
    pub avg_hot_z: f64,
    pub max_z: f64,
    pub critical_count: usize,
    pub high_count: usize,
    pub hotspots: Vec<HotspotResult>,
    pub coldspots: Vec<HotspotResult>,
    pub health: AreaHealth,
    pub summary_text: String,
    pub insights: Insights,
    pub maintenance_suggestions: Vec<String>,
    pub legacy_insights: Vec<String>,
}

impl HotspotReport {
    /// `true` when the input had no points at all.
    pub fn is_empty(&self) -> bool {
        self.total == 0
    }
}

pub fn interpret_hotspots(results: &[HotspotResult]) -> HotspotReport {
    let hotspots: Vec<HotspotResult> = results
        .iter()
        .filter(|r| r.hotspot_type == HotspotType::Hotspot)
        .cloned()
        .collect();
    let coldspots: Vec<HotspotResult> = results
        .iter()
        .filter(|r| r.hotspot_type == HotspotType::Coldspot)
        .cloned()
        .collect();

    let total = results.len();
    let normal_count = total - hotspots.len() - coldspots.len();
    let hot_ratio = ratio(hotspots.len(), total);
    let cold_ratio = ratio(coldspots.len(), total);

    let (avg_hot_z, max_z) = if hotspots.is_empty() {
        (0.0, 0.0)
    } else {
        let sum: f64 = hotspots.iter().map(|r| r.z_score).sum();
        let max = hotspots
            .iter()
            .map(|r| r.z_score)
            .fold(f64::NEG_INFINITY, f64::max);
        (sum / hotspots.len() as f64, max)
    };

    let health = grade_area(total, hotspots.len(), hot_ratio);

    let critical_count = hotspots.iter().filter(|r| r.z_score > CRITICAL_Z).count();
    let high_count = hotspots
        .iter()
        .filter(|r| r.z_score > HIGH_Z && r.z_score <= CRITICAL_Z)
        .count();

    let mut area = area_insights(health.level, total, hotspots.len(), hot_ratio);
    if !coldspots.is_empty() && cold_ratio > COLDSPOT_NOTE_RATIO {
        area.push(format!(
            "{} significant low-damage areas (coldspots) were also found; they can serve as a reference for maintenance practice.",
            coldspots.len()
        ));
    }

    let point = point_insights(hotspots.len(), critical_count, high_count, max_z);
    let line = vec![
        "See the per-road hotspot list for road-level detail; a higher z-score means more concentrated damage on that road.".to_string(),
    ];

    let summary_text = format!(
        "The area has {total} reported points: {} damage hotspots ({}%), {} low-damage coldspots and {normal_count} without significant clustering. Area health: {}{}.",
        hotspots.len(),
        percent(hot_ratio),
        coldspots.len(),
        health.level.label(),
        match health.score {
            Some(score) => format!(" ({score} points)"),
            None => String::new(),
        },
    );

    let legacy_insights = area.iter().chain(point.iter().take(2)).cloned().collect();

    HotspotReport {
        total,
        hotspot_count: hotspots.len(),
        coldspot_count: coldspots.len(),
        normal_count,
        hot_ratio,
        cold_ratio,
        avg_hot_z,
        max_z,
        critical_count,
        high_count,
        hotspots,
        coldspots,
        health,
        summary_text,
        insights: Insights { area, point, line },
        maintenance_suggestions: maintenance_suggestions(health.level),
        legacy_insights,
    }
}

fn area_insights(
    level: HealthLevel,
    total: usize,
    hotspot_count: usize,
    hot_ratio: f64,
) -> Vec<String> {
    let pct = percent(hot_ratio);

    if total == 0 {
        return vec![
            "No damage reports in this area; the pavement is in good condition or inspection data is missing.".to_string(),
        ];
    }

    match level {
        HealthLevel::Critical => vec![
            format!("{pct}% of reported points are strongly clustered, indicating systemic pavement failure in this area."),
            "Start a dedicated remediation plan; inspect underground utilities, subgrade and drainage first.".to_string(),
        ],
        HealthLevel::Poor => vec![
            format!("About {pct}% of points are damage hotspots; maintenance pressure in the area is high."),
            "Rank hotspots by concentration and dispatch repair crews in batches.".to_string(),
        ],
        HealthLevel::Fair => vec![
            format!("{hotspot_count} local hotspots ({pct}%); the area is under control but key roads need attention."),
            "Prioritise high z-score hotspots during routine patrols to stop damage from spreading.".to_string(),
        ],
        HealthLevel::Good => vec![
            format!("Only {hotspot_count} scattered hotspots; the pavement is in good overall condition."),
            "Handle these isolated hotspots within the routine maintenance plan.".to_string(),
        ],
        HealthLevel::Excellent => vec![
            "No significant damage hotspots; pavement health is excellent.".to_string(),
            "Keep the current maintenance frequency and inspect periodically.".to_string(),
        ],
    }
}

fn point_insights(
    hotspot_count: usize,
    critical_count: usize,
    high_count: usize,
    max_z: f64,
) -> Vec<String> {
    let mut insights = Vec::new();

    if critical_count > 0 {
        insights.push(format!(
            "{critical_count} extremely significant hotspots (>99% confidence); damage around them is unusually dense and likely caused by:"
        ));
        if max_z > STRUCTURAL_FAILURE_Z {
            insights.push(
                "• structural pavement failure (base subsidence, pumping or other deep defects)".to_string(),
            );
        }
        if max_z > PIPELINE_FAILURE_Z {
            insights.push("• leaking underground pipelines or drainage failure".to_string());
        }
        insights.push("• cumulative damage from heavy or overloaded vehicles".to_string());
        insights.push(
            "Survey these locations; use core sampling or ground-penetrating radar where needed.".to_string(),
        );
    }

    if high_count > 0 {
        insights.push(format!(
            "{high_count} further highly significant hotspots (95-99% confidence) show moderate clustering; treat them together with the remediation work."
        ));
    }

    if hotspot_count > 0 && critical_count == 0 {
        insights.push(format!(
            "All {hotspot_count} hotspots are of ordinary significance; clustering is under control."
        ));
        insights.push(
            "Repair in order of severity, starting with points that affect traffic safety.".to_string(),
        );
    }

    insights
}

fn maintenance_suggestions(level: HealthLevel) -> Vec<String> {
    let items: &[&str] = match level {
        HealthLevel::Critical | HealthLevel::Poor => &[
            "Activate the key-road emergency remediation plan and coordinate traffic diversion with the traffic police",
            "Commission a geotechnical survey of the extremely significant hotspot areas for subsurface defects",
            "Stock sufficient asphalt and cement-stabilised material for emergency repairs",
            "Re-inspect within 3 months of repair to evaluate its effect",
        ],
        HealthLevel::Fair => &[
            "Add hotspot areas to the monthly maintenance plan and handle them by priority",
            "Watch roads around hotspots to prevent damage from spreading",
            "Finish drainage inspection before the rainy season to reduce water damage",
        ],
        HealthLevel::Good | HealthLevel::Excellent => &[
            "Keep the routine inspection frequency and report problems promptly",
            "Apply maintenance experience from coldspot areas to other roads",
        ],
    };

    items.iter().map(|s| s.to_string()).collect()
}
