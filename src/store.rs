use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::debug;

use crate::error::IngestError;
use crate::model::{Channel, GeoRecord};

pub const LAT_COLUMN: &str = "Lat";
pub const LON_COLUMN: &str = "Lon";
pub const CHANNEL_COLUMN: &str = "WiFi Channel";

const MAX_LATITUDE: f64 = 90.0;
const MAX_LONGITUDE: f64 = 180.0;

/// Validated records in ingestion order. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordStore {
    records: Vec<GeoRecord>,
}

impl RecordStore {
    /// Read and validate a points table from disk.
    pub fn load(path: &Path) -> Result<Self, IngestError> {
        let file = File::open(path)?;
        Self::read_from(file)
    }

    /// Read a points table with `Lat`, `Lon` and `WiFi Channel` columns.
    /// Any other columns are ignored.
    pub fn read_from<R: Read>(reader: R) -> Result<Self, IngestError> {
        let mut rdr = ReaderBuilder::new().trim(Trim::All).from_reader(reader);
        let headers = rdr.headers()?.clone();

        let (lat_idx, lon_idx, chan_idx) = locate_columns(&headers)?;
        debug!(columns = headers.len(), "points header accepted");

        let mut records = Vec::new();
        for (index, row) in rdr.records().enumerate() {
            let row = row?;
            let line = index + 1;

            let latitude = parse_coordinate(line, LAT_COLUMN, cell(&row, lat_idx), MAX_LATITUDE)?;
            let longitude = parse_coordinate(line, LON_COLUMN, cell(&row, lon_idx), MAX_LONGITUDE)?;

            let raw_channel = cell(&row, chan_idx);
            let channel = Channel::parse(raw_channel).ok_or_else(|| IngestError::InvalidChannel {
                row: line,
                value: raw_channel.to_string(),
            })?;

            records.push(GeoRecord::new(index, latitude, longitude, channel));
        }

        Ok(Self { records })
    }

    /// Build a store from in-memory points, validating them like file rows.
    pub fn from_points<I>(points: I) -> Result<Self, IngestError>
    where
        I: IntoIterator<Item = (f64, f64, Channel)>,
    {
        let mut records = Vec::new();
        for (index, (lat, lon, channel)) in points.into_iter().enumerate() {
            let line = index + 1;
            check_domain(line, LAT_COLUMN, lat, MAX_LATITUDE)?;
            check_domain(line, LON_COLUMN, lon, MAX_LONGITUDE)?;
            records.push(GeoRecord::new(index, lat, lon, channel));
        }
        Ok(Self { records })
    }

    pub fn records(&self) -> &[GeoRecord] {
        &self.records
    }

    pub fn get(&self, index: usize) -> Option<&GeoRecord> {
        self.records.get(index)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

fn locate_columns(headers: &StringRecord) -> Result<(usize, usize, usize), IngestError> {
    let find = |name: &str| headers.iter().position(|h| h == name);

    match (find(LAT_COLUMN), find(LON_COLUMN), find(CHANNEL_COLUMN)) {
        (Some(lat), Some(lon), Some(chan)) => Ok((lat, lon, chan)),
        (lat, lon, chan) => {
            let missing = [(LAT_COLUMN, lat), (LON_COLUMN, lon), (CHANNEL_COLUMN, chan)]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            Err(IngestError::MissingColumns(missing))
        }
    }
}

fn cell(row: &StringRecord, idx: usize) -> &str {
    row.get(idx).unwrap_or("")
}

fn parse_coordinate(row: usize, column: &'static str, raw: &str, bound: f64) -> Result<f64, IngestError> {
    let value = raw.parse::<f64>().map_err(|_| IngestError::InvalidCoordinate {
        row,
        column,
        value: raw.to_string(),
        bound,
    })?;
    check_domain(row, column, value, bound)?;
    Ok(value)
}

fn check_domain(row: usize, column: &'static str, value: f64, bound: f64) -> Result<(), IngestError> {
    // NaN fails the range check too.
    if (-bound..=bound).contains(&value) {
        Ok(())
    } else {
        Err(IngestError::InvalidCoordinate {
            row,
            column,
            value: value.to_string(),
            bound,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(text: &str) -> Result<RecordStore, IngestError> {
        RecordStore::read_from(text.as_bytes())
    }

    #[test]
    fn reads_rows_in_order() {
        let store = read("Lat,Lon,WiFi Channel\n1.5,2.5,6\n-3,4,#N/A\n").unwrap();
        assert_eq!(store.len(), 2);
        assert_eq!(store.records()[0], GeoRecord::new(0, 1.5, 2.5, Channel::Number(6)));
        assert_eq!(store.records()[1], GeoRecord::new(1, -3.0, 4.0, Channel::Unknown));
    }

    #[test]
    fn ignores_extra_columns_and_whitespace() {
        let store = read("SSID, Lat , Lon ,WiFi Channel,Notes\nhome, 10 , 20 , 11 ,x\n").unwrap();
        assert_eq!(store.records(), &[GeoRecord::new(0, 10.0, 20.0, Channel::Number(11))]);
    }

    #[test]
    fn header_only_is_empty() {
        let store = read("Lat,Lon,WiFi Channel\n").unwrap();
        assert!(store.is_empty());
    }

    #[test]
    fn reports_every_missing_column() {
        match read("Lat\n1\n") {
            Err(IngestError::MissingColumns(cols)) => assert_eq!(cols, vec!["Lon", "WiFi Channel"]),
            other => panic!("expected missing columns, got {:?}", other),
        }
    }

    #[test]
    fn rejects_out_of_range_longitude() {
        match read("Lat,Lon,WiFi Channel\n0,0,1\n0,180.5,1\n") {
            Err(IngestError::InvalidCoordinate { row, column, value, .. }) => {
                assert_eq!(row, 2);
                assert_eq!(column, "Lon");
                assert_eq!(value, "180.5");
            }
            other => panic!("expected invalid coordinate, got {:?}", other),
        }
    }

    #[test]
    fn rejects_non_numeric_and_non_finite_coordinates() {
        assert!(matches!(
            read("Lat,Lon,WiFi Channel\nabc,0,1\n"),
            Err(IngestError::InvalidCoordinate { column: "Lat", .. })
        ));
        assert!(matches!(
            read("Lat,Lon,WiFi Channel\nNaN,0,1\n"),
            Err(IngestError::InvalidCoordinate { column: "Lat", .. })
        ));
        assert!(matches!(
            read("Lat,Lon,WiFi Channel\n0,inf,1\n"),
            Err(IngestError::InvalidCoordinate { column: "Lon", .. })
        ));
    }

    #[test]
    fn rejects_bad_channel() {
        match read("Lat,Lon,WiFi Channel\n0,0,N/A\n") {
            Err(IngestError::InvalidChannel { row, value }) => {
                assert_eq!(row, 1);
                assert_eq!(value, "N/A");
            }
            other => panic!("expected invalid channel, got {:?}", other),
        }
    }

    #[test]
    fn from_points_validates_domain() {
        assert!(RecordStore::from_points(vec![(0.0, 0.0, Channel::Unknown)]).is_ok());
        assert!(matches!(
            RecordStore::from_points(vec![(91.0, 0.0, Channel::Unknown)]),
            Err(IngestError::InvalidCoordinate { row: 1, column: "Lat", .. })
        ));
    }
}
