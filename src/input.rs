//! Loading damage points and lanes from JSON / CSV sources.

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::debug;

use crate::analyzers::types::{DamagePoint, LaneInput};
use crate::fetch::{BasicClient, fetch_bytes};

/// Decodes a JSON array of damage point records.
///
/// # Errors
///
/// Returns an error if the bytes are not a JSON array of `{lat, lng, ...}` objects.
pub fn parse_points_json(bytes: &[u8]) -> Result<Vec<DamagePoint>> {
    serde_json::from_slice(bytes).context("decoding damage points JSON")
}

/// Decodes a JSON array of lanes with their damage points.
pub fn parse_lanes_json(bytes: &[u8]) -> Result<Vec<LaneInput>> {
    serde_json::from_slice(bytes).context("decoding lanes JSON")
}

#[derive(Debug, Deserialize)]
struct PointRecord {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    road_id: Option<String>,
    lat: f64,
    lng: f64,
    #[serde(default)]
    value: Option<f64>,
}

/// Decodes CSV with headers `id,road_id,lat,lng,value`; empty cells are treated as absent.
pub fn parse_points_csv(bytes: &[u8]) -> Result<Vec<DamagePoint>> {
    let mut rdr = csv::Reader::from_reader(bytes);
    let mut points = Vec::new();

    for result in rdr.deserialize() {
        let record: PointRecord = result?;
        points.push(DamagePoint {
            id: record.id.filter(|s| !s.is_empty()),
            road_id: record.road_id.filter(|s| !s.is_empty()),
            lat: record.lat,
            lng: record.lng,
            value: record.value,
        });
    }

    debug!(count = points.len(), "Parsed CSV damage points");
    Ok(points)
}

/// Damage points from bytes, choosing CSV or JSON from the source name.
pub fn parse_points(source: &str, bytes: &[u8]) -> Result<Vec<DamagePoint>> {
    if source.ends_with(".csv") {
        parse_points_csv(bytes)
    } else {
        parse_points_json(bytes)
    }
}

/// Reads a local file, or fetches over HTTP when `source` is a URL.
#[tracing::instrument(fields(source = %source))]
pub async fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http") {
        let client = BasicClient::new()?;
        fetch_bytes(&client, source).await?
    } else {
        std::fs::read(source).with_context(|| format!("reading {source}"))?
    };
    debug!(bytes = bytes.len(), "Source loaded");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_points_json() {
        let json = br#"[
            {"id": "a", "roadId": "osm-1", "lat": 31.23, "lng": 121.47, "value": 2.5},
            {"lat": 31.24, "lng": 121.48}
        ]"#;
        let points = parse_points_json(json).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].road_id.as_deref(), Some("osm-1"));
        assert_eq!(points[1].weight(), 1.0);
    }

    #[test]
    fn test_parse_points_json_rejects_missing_coordinates() {
        assert!(parse_points_json(br#"[{"id": "a", "lat": 1.0}]"#).is_err());
        assert!(parse_points_json(b"not json").is_err());
    }

    #[test]
    fn test_parse_points_csv_with_empty_cells() {
        let csv = b"id,road_id,lat,lng,value\np1,osm-1,31.23,121.47,3\np2,,31.24,121.48,\n";
        let points = parse_points_csv(csv).unwrap();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].weight(), 3.0);
        assert_eq!(points[1].road_id, None);
        assert_eq!(points[1].value, None);
    }

    #[test]
    fn test_parse_points_by_extension() {
        let csv = b"id,road_id,lat,lng,value\np1,,1,2,\n";
        assert_eq!(parse_points("points.csv", csv).unwrap().len(), 1);
        assert!(parse_points("points.json", csv).is_err());
    }

    #[test]
    fn test_parse_lanes_json() {
        let json = br#"[{
            "id": "osm-9",
            "roadName": "Huaihai Rd",
            "condition": "Fair",
            "coordinates": [{"lat": 31.2, "lng": 121.4}, {"lat": 31.21, "lng": 121.4}],
            "damagePoints": [{"id": "r1", "lat": 31.205, "lng": 121.4, "value": 2}]
        }, {"id": "osm-10"}]"#;
        let lanes = parse_lanes_json(json).unwrap();
        assert_eq!(lanes.len(), 2);
        assert_eq!(lanes[0].damage_points.len(), 1);
        assert_eq!(lanes[0].coordinates.len(), 2);
        assert!(lanes[1].damage_points.is_empty());
        assert_eq!(lanes[1].condition, None);
    }

    #[tokio::test]
    async fn test_load_source_missing_file() {
        assert!(load_source("/nonexistent/points.json").await.is_err());
    }
}
