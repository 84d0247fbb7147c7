//! Site and drive-path map rendering.
//!
//! Separate from the closest-points engine: it reads its own tables and
//! shares no types with [`crate::model`].

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use plotters::prelude::*;
use tracing::info;

use crate::error::MapError;

pub const DEFAULT_MAP_OUTPUT: &str = "map.png";

const SITE_COLUMNS: [&str; 3] = ["SiteName", "Lat", "Long"];
const PATH_COLUMNS: [&str; 2] = ["Latitude", "Longitude"];

const MARGIN_FRACTION: f64 = 0.05;
const MIN_SPAN_DEG: f64 = 0.01;
const SITE_RADIUS: i32 = 6;
const PATH_RADIUS: i32 = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct Site {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathPoint {
    pub latitude: f64,
    pub longitude: f64,
}

pub fn read_sites(path: &Path) -> Result<Vec<Site>, MapError> {
    read_sites_from(File::open(path)?)
}

/// Read a site table with `SiteName`, `Lat` and `Long` columns.
pub fn read_sites_from<R: Read>(reader: R) -> Result<Vec<Site>, MapError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let idx = required_columns(rdr.headers()?, &SITE_COLUMNS, "site info")?;

    let mut sites = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let line = row + 1;
        sites.push(Site {
            name: record.get(idx[0]).unwrap_or("").to_string(),
            latitude: coordinate(&record, idx[1], "site info", line, "Lat", 90.0)?,
            longitude: coordinate(&record, idx[2], "site info", line, "Long", 180.0)?,
        });
    }
    Ok(sites)
}

pub fn read_path(path: &Path) -> Result<Vec<PathPoint>, MapError> {
    read_path_from(File::open(path)?)
}

/// Read a drive-path table with `Latitude` and `Longitude` columns.
pub fn read_path_from<R: Read>(reader: R) -> Result<Vec<PathPoint>, MapError> {
    let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
    let idx = required_columns(rdr.headers()?, &PATH_COLUMNS, "path info")?;

    let mut points = Vec::new();
    for (row, record) in rdr.records().enumerate() {
        let record = record?;
        let line = row + 1;
        points.push(PathPoint {
            latitude: coordinate(&record, idx[0], "path info", line, "Latitude", 90.0)?,
            longitude: coordinate(&record, idx[1], "path info", line, "Longitude", 180.0)?,
        });
    }
    Ok(points)
}

fn required_columns(
    headers: &StringRecord,
    required: &[&'static str],
    kind: &'static str,
) -> Result<Vec<usize>, MapError> {
    let found: Vec<Option<usize>> = required
        .iter()
        .map(|name| headers.iter().position(|h| h == *name))
        .collect();

    let missing: Vec<String> = required
        .iter()
        .zip(&found)
        .filter(|(_, idx)| idx.is_none())
        .map(|(name, _)| name.to_string())
        .collect();

    if !missing.is_empty() {
        return Err(MapError::MissingColumns { kind, columns: missing });
    }
    Ok(found.into_iter().flatten().collect())
}

fn coordinate(
    record: &StringRecord,
    idx: usize,
    kind: &'static str,
    row: usize,
    column: &'static str,
    bound: f64,
) -> Result<f64, MapError> {
    let raw = record.get(idx).unwrap_or("");
    match raw.parse::<f64>() {
        Ok(v) if (-bound..=bound).contains(&v) => Ok(v),
        _ => Err(MapError::InvalidCoordinate { kind, row, column, value: raw.to_string() }),
    }
}

/// Lat/lon window shown on the map.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Bounds {
    /// Fit all `(lat, lon)` points with a small margin. No points gives a
    /// window centred on (0, 0).
    pub fn fit<I>(points: I) -> Self
    where
        I: IntoIterator<Item = (f64, f64)>,
    {
        let mut min_lat = f64::INFINITY;
        let mut max_lat = f64::NEG_INFINITY;
        let mut min_lon = f64::INFINITY;
        let mut max_lon = f64::NEG_INFINITY;

        for (lat, lon) in points {
            min_lat = min_lat.min(lat);
            max_lat = max_lat.max(lat);
            min_lon = min_lon.min(lon);
            max_lon = max_lon.max(lon);
        }

        if min_lat > max_lat {
            (min_lat, max_lat, min_lon, max_lon) = (0.0, 0.0, 0.0, 0.0);
        }

        let (min_lat, max_lat) = pad(min_lat, max_lat);
        let (min_lon, max_lon) = pad(min_lon, max_lon);
        Self { min_lat, max_lat, min_lon, max_lon }
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_lat + self.max_lat) / 2.0, (self.min_lon + self.max_lon) / 2.0)
    }
}

fn pad(min: f64, max: f64) -> (f64, f64) {
    let span = (max - min).max(MIN_SPAN_DEG);
    let mid = (min + max) / 2.0;
    let half = span * (0.5 + MARGIN_FRACTION);
    (mid - half, mid + half)
}

/// Accepts a handful of names or `#rrggbb`.
pub fn parse_color(raw: &str) -> Result<RGBColor, MapError> {
    let raw = raw.trim();
    if let Some(hex) = raw.strip_prefix('#') {
        if hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()) {
            let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
            if let (Ok(r), Ok(g), Ok(b)) = (channel(0), channel(2), channel(4)) {
                return Ok(RGBColor(r, g, b));
            }
        }
        return Err(MapError::Color(raw.to_string()));
    }

    let color = match raw.to_ascii_lowercase().as_str() {
        "red" => RED,
        "black" => BLACK,
        "blue" => BLUE,
        "green" => GREEN,
        "white" => WHITE,
        "yellow" => YELLOW,
        "cyan" => CYAN,
        "magenta" => MAGENTA,
        "orange" => RGBColor(255, 165, 0),
        "purple" => RGBColor(128, 0, 128),
        "gray" | "grey" => RGBColor(128, 128, 128),
        _ => return Err(MapError::Color(raw.to_string())),
    };
    Ok(color)
}

#[derive(Debug, Clone, Copy)]
pub struct MapStyle {
    pub site_color: RGBColor,
    pub path_color: RGBColor,
    pub width: u32,
    pub height: u32,
}

impl Default for MapStyle {
    fn default() -> Self {
        Self { site_color: RED, path_color: BLACK, width: 1200, height: 900 }
    }
}

/// Rasterize sites and path points to a PNG at `output`.
pub fn render(sites: &[Site], path: &[PathPoint], style: &MapStyle, output: &Path) -> Result<Bounds, MapError> {
    let bounds = Bounds::fit(
        sites
            .iter()
            .map(|s| (s.latitude, s.longitude))
            .chain(path.iter().map(|p| (p.latitude, p.longitude))),
    );

    let root = BitMapBackend::new(output, (style.width, style.height)).into_drawing_area();
    root.fill(&WHITE).map_err(render_err)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(10)
        .build_cartesian_2d(bounds.min_lon..bounds.max_lon, bounds.min_lat..bounds.max_lat)
        .map_err(render_err)?;

    chart
        .draw_series(std::iter::once(Rectangle::new(
            [(bounds.min_lon, bounds.min_lat), (bounds.max_lon, bounds.max_lat)],
            BLACK.stroke_width(1),
        )))
        .map_err(render_err)?;

    chart
        .draw_series(
            path.iter()
                .map(|p| Circle::new((p.longitude, p.latitude), PATH_RADIUS, style.path_color.filled())),
        )
        .map_err(render_err)?;

    chart
        .draw_series(
            sites
                .iter()
                .map(|s| Circle::new((s.longitude, s.latitude), SITE_RADIUS, style.site_color.filled())),
        )
        .map_err(render_err)?;
    chart
        .draw_series(
            sites
                .iter()
                .map(|s| Circle::new((s.longitude, s.latitude), SITE_RADIUS, BLACK.stroke_width(1))),
        )
        .map_err(render_err)?;

    root.present().map_err(render_err)?;

    info!(
        sites = sites.len(),
        path_points = path.len(),
        output = %output.display(),
        "map rendered"
    );
    Ok(bounds)
}

fn render_err<E: std::fmt::Display>(e: E) -> MapError {
    MapError::Render(e.to_string())
}
