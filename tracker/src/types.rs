use serde::Serialize;
use std::fmt;

pub type EntityId = String;

/// Number of hourly snapshots published upstream, `00.json` through `23.json`.
pub const SNAPSHOT_HOURS: u8 = 24;

pub const MS_PER_HOUR: i64 = 3_600_000;

/// How many hours in the past a snapshot represents. Always within `0..SNAPSHOT_HOURS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HourOffset(u8);

impl HourOffset {
    pub fn new(hours: u8) -> Option<Self> {
        (hours < SNAPSHOT_HOURS).then_some(HourOffset(hours))
    }

    pub fn all() -> impl Iterator<Item = HourOffset> {
        (0..SNAPSHOT_HOURS).map(HourOffset)
    }

    pub fn hours(&self) -> u8 {
        self.0
    }

    pub fn file_name(&self) -> String {
        format!("{:02}.json", self.0)
    }

    /// Absolute time of the snapshot given the time the run started.
    pub fn timestamp_ms(&self, now_ms: i64) -> i64 {
        now_ms - i64::from(self.0) * MS_PER_HOUR
    }
}

impl fmt::Display for HourOffset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}", self.0)
    }
}

/// One validated element of a snapshot array.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionRecord {
    /// Position of the element within its snapshot array, 0-based.
    pub position_index: usize,
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TrajectoryPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: f64,
    /// Milliseconds since the unix epoch.
    pub time: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Trajectory {
    pub id: EntityId,
    pub path: Vec<TrajectoryPoint>,
    pub color: &'static str,
    #[serde(skip)]
    pub position_index: usize,
}
