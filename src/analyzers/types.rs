//! Data types shared by the analyzers.

use serde::{Deserialize, Serialize};

use crate::geo::BoundingBox;

/// Severity weight assumed when a damage point carries none.
pub const DEFAULT_WEIGHT: f64 = 1.0;

/// A single reported or sampled damage observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DamagePoint {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "road_id")]
    pub road_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub value: Option<f64>,
}

impl DamagePoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self {
            id: None,
            road_id: None,
            lat,
            lng,
            value: None,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_road(mut self, road_id: impl Into<String>) -> Self {
        self.road_id = Some(road_id.into());
        self
    }

    pub fn with_value(mut self, value: f64) -> Self {
        self.value = Some(value);
        self
    }

    /// Damage mass of this point, defaulting to [`DEFAULT_WEIGHT`].
    pub fn weight(&self) -> f64 {
        self.value.unwrap_or(DEFAULT_WEIGHT)
    }
}

/// A polyline vertex.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

/// Gi* classification of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HotspotType {
    Hotspot,
    Coldspot,
    NotSignificant,
}

impl HotspotType {
    /// Classifies a z-score against a symmetric threshold (boundaries inclusive).
    pub fn classify(z: f64, threshold: f64) -> Self {
        if z >= threshold {
            HotspotType::Hotspot
        } else if z <= -threshold {
            HotspotType::Coldspot
        } else {
            HotspotType::NotSignificant
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HotspotType::Hotspot => "hotspot",
            HotspotType::Coldspot => "coldspot",
            HotspotType::NotSignificant => "not-significant",
        }
    }
}

/// Per-point statistical verdict.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotspotResult {
    pub id: Option<String>,
    pub road_id: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub hotspot_type: HotspotType,
}

/// Flat row used for CSV export of hotspot results.
#[derive(Debug, Serialize)]
pub struct HotspotRow<'a> {
    pub id: &'a str,
    pub road_id: &'a str,
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
    pub z_score: f64,
    pub p_value: f64,
    pub hotspot_type: &'static str,
}

impl<'a> From<&'a HotspotResult> for HotspotRow<'a> {
    fn from(r: &'a HotspotResult) -> Self {
        HotspotRow {
            id: r.id.as_deref().unwrap_or(""),
            road_id: r.road_id.as_deref().unwrap_or(""),
            lat: r.lat,
            lng: r.lng,
            value: r.value,
            z_score: r.z_score,
            p_value: r.p_value,
            hotspot_type: r.hotspot_type.as_str(),
        }
    }
}

/// Cluster membership rolled up per road.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadAggregate {
    pub road_id: String,
    pub total_points: usize,
    pub hotspot_count: usize,
    pub coldspot_count: usize,
    pub avg_hot_z: f64,
    pub hot_ratio: f64,
}

/// One density sample at a cell center.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityCell {
    pub lat: f64,
    pub lng: f64,
    pub value: f64,
}

/// Regular lattice of density samples, cells in row-major order (south to north, west to east).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DensityGrid {
    pub rows: usize,
    pub cols: usize,
    pub cell_size_meters: f64,
    pub bbox: Option<BoundingBox>,
    pub cells: Vec<DensityCell>,
    pub max_value: f64,
}

impl DensityGrid {
    pub fn empty() -> Self {
        DensityGrid {
            rows: 0,
            cols: 0,
            cell_size_meters: 0.0,
            bbox: None,
            cells: Vec::new(),
            max_value: 0.0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// Caller-facing triage label for a single road segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

/// Single-segment triage result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneSummary {
    pub length_meters: f64,
    pub num_points: usize,
    pub density_per_km: f64,
    pub damage_density_per_km: f64,
    pub avg_severity: f64,
    pub condition: String,
    pub urgency: Urgency,
    pub suggestions: Vec<String>,
    pub summary: String,
}

/// A road segment as delivered by the lane supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LaneInput {
    pub id: String,
    #[serde(default)]
    pub road_name: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub coordinates: Vec<LatLng>,
    #[serde(default)]
    pub damage_points: Vec<DamagePoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries_inclusive() {
        assert_eq!(HotspotType::classify(1.96, 1.96), HotspotType::Hotspot);
        assert_eq!(HotspotType::classify(-1.96, 1.96), HotspotType::Coldspot);
        assert_eq!(HotspotType::classify(1.9599, 1.96), HotspotType::NotSignificant);
        assert_eq!(HotspotType::classify(0.0, 1.96), HotspotType::NotSignificant);
    }

    #[test]
    fn test_damage_point_weight_default() {
        assert_eq!(DamagePoint::new(0.0, 0.0).weight(), 1.0);
        assert_eq!(DamagePoint::new(0.0, 0.0).with_value(2.5).weight(), 2.5);
    }

    #[test]
    fn test_damage_point_deserializes_optional_fields() {
        let p: DamagePoint = serde_json::from_str(r#"{"lat": 31.2, "lng": 121.4}"#).unwrap();
        assert_eq!(p, DamagePoint::new(31.2, 121.4));

        let p: DamagePoint =
            serde_json::from_str(r#"{"id":"a","roadId":"osm-1","lat":1,"lng":2,"value":3}"#)
                .unwrap();
        assert_eq!(p.road_id.as_deref(), Some("osm-1"));
        assert_eq!(p.weight(), 3.0);
    }

    #[test]
    fn test_hotspot_type_serializes_kebab_case() {
        let json = serde_json::to_string(&HotspotType::NotSignificant).unwrap();
        assert_eq!(json, "\"not-significant\"");
        assert_eq!(HotspotType::NotSignificant.as_str(), "not-significant");
    }

    #[test]
    fn test_urgency_ordering() {
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::Medium < Urgency::High);
        assert!(Urgency::High < Urgency::Critical);
    }

    #[test]
    fn test_empty_grid_serializes_null_bbox() {
        let json = serde_json::to_value(DensityGrid::empty()).unwrap();
        assert!(json["bbox"].is_null());
        assert_eq!(json["cells"].as_array().unwrap().len(), 0);
    }
}
