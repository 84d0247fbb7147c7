use serde::{Serialize, Serializer};
use std::fmt;

/// How many neighbors are kept per subject.
pub const NEIGHBOR_COUNT: usize = 3;

/// Literal marking a record with no WiFi channel assigned.
pub const UNKNOWN_CHANNEL: &str = "#N/A";

/// WiFi channel of a record. Only ever compared for equality.
///
/// Two `Unknown` channels compare equal, the same way two `#N/A` cells
/// compare equal as plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Number(i64),
    Unknown,
}

impl Channel {
    /// Parse a raw `WiFi Channel` cell. Returns `None` for anything that is
    /// neither an integer nor the `#N/A` marker.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        if raw == UNKNOWN_CHANNEL {
            return Some(Channel::Unknown);
        }
        raw.parse::<i64>().ok().map(Channel::Number)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Channel::Number(n) => write!(f, "{}", n),
            Channel::Unknown => f.write_str(UNKNOWN_CHANNEL),
        }
    }
}

impl Serialize for Channel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Channel::Number(n) => serializer.serialize_i64(*n),
            Channel::Unknown => serializer.serialize_str(UNKNOWN_CHANNEL),
        }
    }
}

/// One ingested point. Coordinates are validated before a record is built.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct GeoRecord {
    /// 0-based position in the ingested sequence
    pub index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub channel: Channel,
}

impl GeoRecord {
    pub fn new(index: usize, latitude: f64, longitude: f64, channel: Channel) -> Self {
        Self { index, latitude, longitude, channel }
    }
}

/// A neighbor of some subject record, referenced by index.
#[derive(Serialize, Debug, Clone, Copy, PartialEq)]
pub struct NeighborEntry {
    pub neighbor: usize,
    pub distance: f64,
    pub same_channel: bool,
}

/// Ranked neighbors for every subject, addressed by subject index.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NeighborResult {
    rows: Vec<Vec<NeighborEntry>>,
}

impl NeighborResult {
    pub fn new(rows: Vec<Vec<NeighborEntry>>) -> Self {
        Self { rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&[NeighborEntry]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Subjects in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &[NeighborEntry])> {
        self.rows.iter().enumerate().map(|(i, row)| (i, row.as_slice()))
    }
}
