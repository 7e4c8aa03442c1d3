//! Single road segment triage: length, damage density, average severity and urgency.

use crate::analyzers::types::{DamagePoint, LaneSummary, LatLng, Urgency};
use crate::analyzers::utility::{mean, per_km};
use crate::geo::distance_meters;

const UNKNOWN: &str = "unknown";

/// Sums haversine distances between consecutive vertices.
pub fn polyline_length_meters(vertices: &[LatLng]) -> f64 {
    vertices
        .windows(2)
        .map(|w| distance_meters(w[0].lat, w[0].lng, w[1].lat, w[1].lng))
        .sum()
}

/// Triage of one road segment.
///
/// `condition` is the caller's categorical label (`Poor`, `Fair`, `Good`, `Excellent`);
/// `damage_points` must already be restricted to this road.
pub fn analyze_lane_summary(
    vertices: &[LatLng],
    condition: Option<&str>,
    road_name: Option<&str>,
    damage_points: &[DamagePoint],
) -> LaneSummary {
    let length = polyline_length_meters(vertices);
    let num_points = vertices.len();
    let density_per_km = per_km(num_points, length);
    let damage_density = per_km(damage_points.len(), length);

    let severities: Vec<f64> = damage_points.iter().map(DamagePoint::weight).collect();
    let avg_severity = mean(&severities);

    let cond = condition.filter(|c| !c.is_empty()).unwrap_or(UNKNOWN);
    let mut suggestions = Vec::new();

    let mut urgency = if cond == "Poor" || avg_severity > 2.5 {
        suggestions.push(
            "Obvious structural damage; schedule emergency handling within 7-15 days.".to_string(),
        );
        Urgency::High
    } else if cond == "Fair" || (damage_density > 10.0 && avg_severity > 1.5) {
        suggestions.push(
            "Moderate distress; add to the maintenance plan within 1-3 months.".to_string(),
        );
        Urgency::Medium
    } else if cond == "Good" || damage_density < 5.0 {
        suggestions.push("Road in good condition; keep routine inspection.".to_string());
        Urgency::Low
    } else {
        suggestions.push(
            "Condition unclear; verify on site against the reported damage points.".to_string(),
        );
        Urgency::Medium
    };

    if damage_density > 20.0 {
        suggestions.push(
            "Damage points are unusually dense (>20/km); there may be unrecorded severe defects, inspect closely.".to_string(),
        );
        urgency = urgency.max(Urgency::Medium);
    }

    if length < 200.0 && damage_density > 15.0 {
        suggestions.push(
            "Damage concentrated over a short distance is a safety risk; handle with priority.".to_string(),
        );
        urgency = urgency.max(Urgency::High);
    }

    LaneSummary {
        length_meters: length,
        num_points,
        density_per_km,
        damage_density_per_km: damage_density,
        avg_severity,
        condition: cond.to_string(),
        urgency,
        suggestions,
        summary: format!(
            "Road: {} ({:.2} km)",
            road_name.filter(|n| !n.is_empty()).unwrap_or(UNKNOWN),
            length / 1000.0
        ),
    }
}
