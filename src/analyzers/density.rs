//! Gaussian kernel density over a regular lat/lng grid.

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use tracing::debug;

use crate::analyzers::types::{DamagePoint, DensityCell, DensityGrid};
use crate::geo::{BoundingBox, METERS_PER_DEG_LAT, distance_meters, meters_per_deg_lng};

pub const DEFAULT_DENSITY_BANDWIDTH_M: f64 = 100.0;
pub const DEFAULT_CELL_SIZE_M: f64 = 50.0;
pub const DEFAULT_MAX_CELLS: usize = 5000;
/// Padding applied around point extents when no bbox is given (~100 m).
pub const BBOX_PAD_DEG: f64 = 0.001;
/// Cell size growth factor while the grid exceeds `max_cells`.
pub const CELL_GROWTH: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DensityOptions {
    pub bandwidth_meters: f64,
    pub cell_size_meters: f64,
    pub bbox: Option<BoundingBox>,
    pub normalize: bool,
    pub max_cells: usize,
}

impl Default for DensityOptions {
    fn default() -> Self {
        Self {
            bandwidth_meters: DEFAULT_DENSITY_BANDWIDTH_M,
            cell_size_meters: DEFAULT_CELL_SIZE_M,
            bbox: None,
            normalize: true,
            max_cells: DEFAULT_MAX_CELLS,
        }
    }
}

/// Grid shape for a bbox at a given cell size.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridShape {
    pub rows: usize,
    pub cols: usize,
    pub d_lat: f64,
    pub d_lng: f64,
}

impl GridShape {
    pub fn for_bbox(bbox: &BoundingBox, cell_size_m: f64) -> Self {
        let d_lat = cell_size_m / METERS_PER_DEG_LAT;
        let d_lng = cell_size_m / meters_per_deg_lng(bbox.mean_lat());

        Self {
            rows: steps(bbox.lat_span(), d_lat),
            cols: steps(bbox.lng_span(), d_lng),
            d_lat,
            d_lng,
        }
    }

    pub fn cells(&self) -> usize {
        self.rows.saturating_mul(self.cols)
    }
}

fn steps(span: f64, step: f64) -> usize {
    let n = (span / step).ceil();
    if n.is_finite() && n > 0.0 { n as usize } else { 0 }
}

/// Computes a density surface over `options.bbox` (or the padded point extent).
///
/// The cell size grows by [`CELL_GROWTH`] until `rows * cols <= max_cells`.
/// Cost is O(cells * points); bounding total work is up to the caller.
pub fn compute_kernel_density(points: &[DamagePoint], options: &DensityOptions) -> DensityGrid {
    let Some(extent) = BoundingBox::from_positions(points.iter().map(|p| (p.lat, p.lng))) else {
        return DensityGrid::empty();
    };

    let bbox = options.bbox.unwrap_or_else(|| extent.padded(BBOX_PAD_DEG));
    let max_cells = options.max_cells.max(1);

    let mut cell_size = options.cell_size_meters;
    let mut shape = GridShape::for_bbox(&bbox, cell_size);
    while shape.cells() > max_cells {
        cell_size *= CELL_GROWTH;
        shape = GridShape::for_bbox(&bbox, cell_size);
    }

    debug!(
        rows = shape.rows,
        cols = shape.cols,
        cell_size,
        points = points.len(),
        "Density grid sized"
    );

    let two_h_sq = 2.0 * options.bandwidth_meters * options.bandwidth_meters;
    let mut cells = Vec::with_capacity(shape.cells());
    let mut max_value: f64 = 0.0;

    for r in 0..shape.rows {
        let lat = bbox.south + (r as f64 + 0.5) * shape.d_lat;
        for c in 0..shape.cols {
            let lng = bbox.west + (c as f64 + 0.5) * shape.d_lng;
            let value: f64 = points
                .iter()
                .map(|p| {
                    let d = distance_meters(lat, lng, p.lat, p.lng);
                    p.weight() * gaussian(d, two_h_sq)
                })
                .sum();

            max_value = max_value.max(value);
            cells.push(DensityCell { lat, lng, value });
        }
    }

    if options.normalize && max_value > 0.0 {
        for cell in &mut cells {
            cell.value /= max_value;
        }
        max_value = 1.0;
    }

    DensityGrid {
        rows: shape.rows,
        cols: shape.cols,
        cell_size_meters: cell_size,
        bbox: Some(bbox),
        cells,
        max_value,
    }
}

fn gaussian(d: f64, two_h_sq: f64) -> f64 {
    if two_h_sq > 0.0 {
        (-(d * d) / two_h_sq).exp()
    } else if d == 0.0 {
        1.0
    } else {
        0.0
    }
}

impl DensityGrid {
    /// Cells as a GeoJSON `FeatureCollection` of points with a `value` property.
    pub fn to_geojson(&self) -> FeatureCollection {
        let features = self
            .cells
            .iter()
            .map(|cell| {
                let mut properties = JsonObject::new();
                properties.insert("value".to_string(), cell.value.into());

                Feature {
                    bbox: None,
                    geometry: Some(Geometry::new(Value::Point(vec![cell.lng, cell.lat]))),
                    id: None,
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
