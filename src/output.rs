//! Output formatting and persistence for analysis results.
//!
//! Supports pretty-printing, JSON and GeoJSON export (optionally gzipped), and CSV append.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{debug, info};

use crate::analyzers::types::DensityGrid;
use csv::WriterBuilder;
use std::fmt::Debug;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

pub const SCHEMA_VERSION: u8 = 1;

/// Envelope written around every exported analysis result.
#[derive(Serialize)]
pub struct Export<'a, T: Serialize> {
    pub schema_version: u8,
    pub generated_at: DateTime<Utc>,
    pub kind: &'static str,
    pub data: &'a T,
}

impl<'a, T: Serialize> Export<'a, T> {
    pub fn new(kind: &'static str, data: &'a T) -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            generated_at: Utc::now(),
            kind,
            data,
        }
    }
}

/// Logs a value using Rust's debug pretty-print format.
pub fn print_pretty(value: &impl Debug) {
    debug!("{:#?}", value);
}

/// Logs a value as pretty-printed JSON.
pub fn print_json(value: &impl Serialize) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Writes bytes to `path`, gzip-compressing when `path` ends in `.gz`.
fn write_bytes(path: &str, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let body = if path.ends_with(".gz") {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes)?;
        encoder.finish()?
    } else {
        bytes.to_vec()
    };

    std::fs::write(path, body).with_context(|| format!("writing {path}"))?;
    debug!(path, bytes = bytes.len(), "Output written");
    Ok(())
}

/// Serializes `value` as pretty JSON to `path`.
pub fn write_json(path: &str, value: &impl Serialize) -> Result<()> {
    write_bytes(path, &serde_json::to_vec_pretty(value)?)
}

/// Writes the density grid as a GeoJSON `FeatureCollection` of points.
pub fn write_geojson(path: &str, grid: &DensityGrid) -> Result<()> {
    write_bytes(path, &serde_json::to_vec(&grid.to_geojson())?)
}

/// Appends rows to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_records<T: Serialize>(
    path: &str,
    rows: impl IntoIterator<Item = T>,
) -> Result<usize> {
    let file_exists = Path::new(path).exists();
    debug!(path, file_exists, "Appending CSV records");

    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists) // IMPORTANT when appending
        .from_writer(file);

    let mut count = 0;
    for row in rows {
        writer.serialize(row)?;
        count += 1;
    }
    writer.flush()?;

    Ok(count)
}
