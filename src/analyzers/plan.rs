//! Adaptive bandwidth / resolution / sampling policy for area analysis.
//!
//! Keeps `cells * points` under an operation budget: first by coarsening the
//! grid (and widening the kernel with it), then by even-stride subsampling.

use serde::Serialize;
use tracing::{debug, warn};

use crate::analyzers::density::GridShape;
use crate::analyzers::types::DamagePoint;
use crate::analyzers::utility::clamp;
use crate::geo::BoundingBox;

pub const DEFAULT_MAX_OPS: usize = 5_000_000;
/// Floor on the number of points kept by subsampling.
pub const MIN_SAMPLE_POINTS: usize = 200;

const CELL_SIZE_CEILING_M: f64 = 400.0;
const CELL_GROWTH: f64 = 1.4;
const BANDWIDTH_GROWTH: f64 = 1.2;

/// Chosen analysis parameters for one selection.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisPlan {
    pub bandwidth: f64,
    pub cell_size: f64,
    pub rows: usize,
    pub cols: usize,
    /// Projected `cells * points` before subsampling.
    pub ops: usize,
    /// Set when the initial resolution was coarsened or points were subsampled.
    pub degraded: bool,
    /// Number of points to keep, when subsampling is required.
    pub sample_size: Option<usize>,
}

impl AnalysisPlan {
    /// Applies the plan's sampling to `points`.
    pub fn sample<'a>(&self, points: &'a [DamagePoint]) -> std::borrow::Cow<'a, [DamagePoint]> {
        match self.sample_size {
            Some(max) => std::borrow::Cow::Owned(even_stride_sample(points, max)),
            None => std::borrow::Cow::Borrowed(points),
        }
    }
}

fn shape(bbox: &BoundingBox, cell_size: f64) -> (usize, usize, usize) {
    let shape = GridShape::for_bbox(bbox, cell_size);
    let rows = shape.rows.max(1);
    let cols = shape.cols.max(1);
    (rows, cols, rows.saturating_mul(cols))
}

/// Picks bandwidth and cell size for `point_count` points over `bbox`.
pub fn plan_analysis(bbox: &BoundingBox, point_count: usize, max_ops: usize) -> AnalysisPlan {
    let diagonal = bbox.diagonal_meters();
    let diagonal = if diagonal.is_finite() { diagonal } else { 0.0 };

    let mut bandwidth = clamp(diagonal / 4.0, 80.0, 600.0);
    let mut cell_size = clamp(bandwidth / 3.0, 25.0, 200.0);
    let (mut rows, mut cols, mut cells) = shape(bbox, cell_size);
    let mut ops = cells.saturating_mul(point_count);
    let mut escalated = false;

    while ops > max_ops && cell_size < CELL_SIZE_CEILING_M {
        cell_size *= CELL_GROWTH;
        bandwidth = clamp(bandwidth * BANDWIDTH_GROWTH, 80.0, 800.0);
        (rows, cols, cells) = shape(bbox, cell_size);
        ops = cells.saturating_mul(point_count);
        escalated = true;
    }

    let mut sample_size = None;
    if ops > max_ops {
        let max_points = MIN_SAMPLE_POINTS.max(max_ops / cells);
        if max_points < point_count {
            sample_size = Some(max_points);
        }
    }

    let degraded = escalated || sample_size.is_some();
    if degraded {
        warn!(
            bandwidth,
            cell_size,
            ops,
            sample_size,
            "Analysis resolution degraded to stay within budget"
        );
    } else {
        debug!(bandwidth, cell_size, rows, cols, ops, "Analysis plan");
    }

    AnalysisPlan {
        bandwidth,
        cell_size,
        rows,
        cols,
        ops,
        degraded,
        sample_size,
    }
}

/// Deterministic subsample: `sampled[i] = points[floor(i * len / max_points)]`.
pub fn even_stride_sample(points: &[DamagePoint], max_points: usize) -> Vec<DamagePoint> {
    if max_points >= points.len() {
        return points.to_vec();
    }

    let factor = points.len() as f64 / max_points as f64;
    (0..max_points)
        .map(|i| points[(i as f64 * factor).floor() as usize].clone())
        .collect()
}
