use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::{info, warn};

use crate::error::ExportError;
use crate::model::{Channel, GeoRecord, NeighborEntry, NeighborResult, NEIGHBOR_COUNT};

pub const DEFAULT_OUTPUT: &str = "ClosestPoints.csv";

pub const HEADER: [&str; 4 * NEIGHBOR_COUNT] = [
    "Lat1", "Lon1", "Distance1", "Same Channel 1",
    "Lat2", "Lon2", "Distance2", "Same Channel 2",
    "Lat3", "Lon3", "Distance3", "Same Channel 3",
];

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Format {
    #[default]
    Csv,
    Json,
}

/// Write `result` to `path`, one row per record of `records`.
///
/// Output goes to a sibling `.partial` file first and is renamed into place
/// only once fully written, so a failure never leaves a half-written file
/// at `path`. Returns the number of subject rows written.
pub fn export(
    result: &NeighborResult,
    records: &[GeoRecord],
    path: &Path,
    format: Format,
) -> Result<usize, ExportError> {
    let staging = staging_path(path);

    let written = File::create(&staging)
        .map_err(ExportError::from)
        .and_then(|file| {
            let mut writer = BufWriter::new(file);
            let rows = match format {
                Format::Csv => write_csv(result, records, &mut writer)?,
                Format::Json => write_json(result, records, &mut writer)?,
            };
            writer.flush()?;
            Ok(rows)
        });

    match written {
        Ok(rows) => {
            fs::rename(&staging, path)?;
            info!(path = %path.display(), rows, ?format, "closest points exported");
            Ok(rows)
        }
        Err(e) => {
            if fs::remove_file(&staging).is_ok() {
                warn!(path = %staging.display(), "removed partial export");
            }
            Err(e)
        }
    }
}

/// Fixed 12-column layout. Slots without a neighbor are left blank.
pub fn write_csv<W: Write>(
    result: &NeighborResult,
    records: &[GeoRecord],
    writer: W,
) -> Result<usize, ExportError> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    let mut rows = 0;
    for subject in records {
        let entries = result.get(subject.index).unwrap_or(&[]);
        let mut row: Vec<String> = Vec::with_capacity(HEADER.len());

        for entry in entries.iter().take(NEIGHBOR_COUNT) {
            let neighbor = &records[entry.neighbor];
            row.push(neighbor.latitude.to_string());
            row.push(neighbor.longitude.to_string());
            row.push(entry.distance.to_string());
            row.push(if entry.same_channel { "True" } else { "False" }.to_string());
        }
        row.resize(HEADER.len(), String::new());

        wtr.write_record(&row)?;
        rows += 1;
    }

    wtr.flush()?;
    Ok(rows)
}

#[derive(Serialize)]
struct SubjectReport<'a> {
    index: usize,
    latitude: f64,
    longitude: f64,
    channel: &'a Channel,
    neighbors: Vec<NeighborReport>,
}

#[derive(Serialize)]
struct NeighborReport {
    index: usize,
    latitude: f64,
    longitude: f64,
    distance: f64,
    same_channel: bool,
}

impl NeighborReport {
    fn new(entry: &NeighborEntry, records: &[GeoRecord]) -> Self {
        let neighbor = &records[entry.neighbor];
        Self {
            index: neighbor.index,
            latitude: neighbor.latitude,
            longitude: neighbor.longitude,
            distance: entry.distance,
            same_channel: entry.same_channel,
        }
    }
}

pub fn write_json<W: Write>(
    result: &NeighborResult,
    records: &[GeoRecord],
    writer: W,
) -> Result<usize, ExportError> {
    let report: Vec<SubjectReport> = records
        .iter()
        .map(|subject| SubjectReport {
            index: subject.index,
            latitude: subject.latitude,
            longitude: subject.longitude,
            channel: &subject.channel,
            neighbors: result
                .get(subject.index)
                .unwrap_or(&[])
                .iter()
                .map(|e| NeighborReport::new(e, records))
                .collect(),
        })
        .collect();

    serde_json::to_writer_pretty(writer, &report)?;
    Ok(report.len())
}

fn staging_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}
