//! Spatial analysis of road damage reports.
//!
//! Gi* hotspot detection and its interpretation, per-road aggregation of
//! cluster membership, kernel density surfaces with an adaptive resolution
//! plan, and single-segment triage.

pub mod aggregate;
pub mod analyzer;
pub mod density;
pub mod grade;
pub mod hotspot;
pub mod interpret;
pub mod lane;
pub mod plan;
pub mod road_id;
pub mod types;
pub mod utility;
