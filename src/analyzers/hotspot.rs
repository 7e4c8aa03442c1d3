//! Getis-Ord Gi* hotspot statistic with binary distance-band weights.

use tracing::debug;

use crate::analyzers::types::{DamagePoint, HotspotResult, HotspotType};
use crate::analyzers::utility::{mean, stddev};
use crate::geo::{distance_meters, std_normal_cdf};

pub const DEFAULT_HOTSPOT_BANDWIDTH_M: f64 = 500.0;
pub const DEFAULT_SIGNIFICANCE_Z: f64 = 1.96;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HotspotOptions {
    /// Neighbor distance band in meters.
    pub bandwidth_meters: f64,
    /// |z| at or above which a point is significant.
    pub significance_z: f64,
}

impl Default for HotspotOptions {
    fn default() -> Self {
        Self {
            bandwidth_meters: DEFAULT_HOTSPOT_BANDWIDTH_M,
            significance_z: DEFAULT_SIGNIFICANCE_Z,
        }
    }
}

impl HotspotOptions {
    pub fn with_bandwidth(bandwidth_meters: f64) -> Self {
        Self {
            bandwidth_meters,
            ..Default::default()
        }
    }
}

/// Computes the Gi* z-score, two-tailed p-value and classification for every point.
///
/// Each point's neighborhood includes the point itself. Cost is O(n²) distance
/// evaluations; callers bound it by subsampling (see [`crate::analyzers::plan`]).
/// Degenerate input (one point, zero variance, zero denominator) yields `z = 0`, `p = 1`.
pub fn compute_getis_ord_gi(
    points: &[DamagePoint],
    options: &HotspotOptions,
) -> Vec<HotspotResult> {
    let n = points.len();
    if n == 0 {
        return Vec::new();
    }

    let values: Vec<f64> = points.iter().map(DamagePoint::weight).collect();
    let mean_x = mean(&values);
    let s = stddev(&values, mean_x);
    let nf = n as f64;

    debug!(
        n,
        mean = mean_x,
        stddev = s,
        bandwidth = options.bandwidth_meters,
        "Computing Gi*"
    );

    points
        .iter()
        .zip(&values)
        .map(|(pi, &value)| {
            let mut sum_w = 0.0;
            let mut sum_wx = 0.0;
            let mut sum_w2 = 0.0;

            for (pj, &xj) in points.iter().zip(&values) {
                let d = distance_meters(pi.lat, pi.lng, pj.lat, pj.lng);
                let w = if d <= options.bandwidth_meters { 1.0 } else { 0.0 };
                sum_w += w;
                sum_wx += w * xj;
                sum_w2 += w * w;
            }

            let mut z = 0.0;
            let mut p_value = 1.0;
            if s > 0.0 && n > 1 {
                let numerator = sum_wx - mean_x * sum_w;
                let denom = s * ((nf * sum_w2 - sum_w * sum_w) / (nf - 1.0)).sqrt();
                if denom != 0.0 && denom.is_finite() {
                    z = numerator / denom;
                    p_value = two_tailed_p(z);
                }
            }

            HotspotResult {
                id: pi.id.clone(),
                road_id: pi.road_id.clone(),
                lat: pi.lat,
                lng: pi.lng,
                value,
                z_score: z,
                p_value,
                hotspot_type: HotspotType::classify(z, options.significance_z),
            }
        })
        .collect()
}

/// Two-tailed p-value for a z-score, clamped to `[0, 1]`.
pub fn two_tailed_p(z: f64) -> f64 {
    (2.0 * (1.0 - std_normal_cdf(z.abs()))).clamp(0.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cluster_and_far() -> Vec<DamagePoint> {
        let mut points = Vec::new();
        // ~1m apart, value 5
        for i in 0..10 {
            points.push(
                DamagePoint::new(31.2304 + i as f64 * 0.00001, 121.4737)
                    .with_id(format!("near-{i}"))
                    .with_value(5.0),
            );
        }
        // ~1.1km apart from each other, ~11km+ from the cluster
        for i in 0..10 {
            points.push(
                DamagePoint::new(31.33 + i as f64 * 0.01, 121.60)
                    .with_id(format!("far-{i}"))
                    .with_value(1.0),
            );
        }
        points
    }

    #[test]
    fn test_empty_points() {
        assert!(compute_getis_ord_gi(&[], &HotspotOptions::default()).is_empty());
    }

    #[test]
    fn test_single_point_is_not_significant() {
        let results = compute_getis_ord_gi(
            &[DamagePoint::new(31.0, 121.0).with_value(4.0)],
            &HotspotOptions::default(),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].z_score, 0.0);
        assert_eq!(results[0].p_value, 1.0);
        assert_eq!(results[0].hotspot_type, HotspotType::NotSignificant);
    }

    #[test]
    fn test_identical_values_give_zero_z() {
        let points: Vec<_> = (0..5)
            .map(|i| DamagePoint::new(31.0 + i as f64 * 0.001, 121.0))
            .collect();
        for r in compute_getis_ord_gi(&points, &HotspotOptions::default()) {
            assert_eq!(r.z_score, 0.0);
            assert_eq!(r.hotspot_type, HotspotType::NotSignificant);
        }
    }

    #[test]
    fn test_all_neighbors_gives_zero_denominator() {
        // Every point sees every other point: n*sumW2 - sumW^2 == 0.
        let points = vec![
            DamagePoint::new(31.0, 121.0).with_value(1.0),
            DamagePoint::new(31.0, 121.0).with_value(3.0),
            DamagePoint::new(31.0, 121.0).with_value(8.0),
        ];
        for r in compute_getis_ord_gi(&points, &HotspotOptions::default()) {
            assert_eq!(r.z_score, 0.0);
            assert_eq!(r.p_value, 1.0);
        }
    }

    #[test]
    fn test_dense_high_cluster_is_hotspot() {
        let results = compute_getis_ord_gi(&cluster_and_far(), &HotspotOptions::default());

        for r in results.iter().filter(|r| r.id.as_deref().unwrap().starts_with("near")) {
            assert!(r.z_score >= 1.96, "z = {}", r.z_score);
            assert_eq!(r.hotspot_type, HotspotType::Hotspot);
        }
        for r in results.iter().filter(|r| r.id.as_deref().unwrap().starts_with("far")) {
            assert_ne!(r.hotspot_type, HotspotType::Hotspot);
        }
    }

    #[test]
    fn test_classification_and_p_value_consistency() {
        let results = compute_getis_ord_gi(&cluster_and_far(), &HotspotOptions::default());
        for r in &results {
            assert!((0.0..=1.0).contains(&r.p_value));
            let expected = if r.z_score >= 1.96 {
                HotspotType::Hotspot
            } else if r.z_score <= -1.96 {
                HotspotType::Coldspot
            } else {
                HotspotType::NotSignificant
            };
            assert_eq!(r.hotspot_type, expected);
        }
    }

    #[test]
    fn test_custom_significance_threshold() {
        let options = HotspotOptions {
            significance_z: 100.0,
            ..Default::default()
        };
        let results = compute_getis_ord_gi(&cluster_and_far(), &options);
        assert!(results.iter().all(|r| r.hotspot_type == HotspotType::NotSignificant));
    }

    #[test]
    fn test_result_carries_point_fields() {
        let results = compute_getis_ord_gi(
            &[DamagePoint::new(1.0, 2.0).with_id("a").with_road("osm-1")],
            &HotspotOptions::default(),
        );
        assert_eq!(results[0].id.as_deref(), Some("a"));
        assert_eq!(results[0].road_id.as_deref(), Some("osm-1"));
        assert_eq!(results[0].value, 1.0);
    }

    #[test]
    fn test_two_tailed_p_range() {
        assert!((two_tailed_p(0.0) - 1.0).abs() < 1e-6);
        assert!(two_tailed_p(5.0) < 1e-6);
        assert_eq!(two_tailed_p(3.0), two_tailed_p(-3.0));
    }
}
