//! Validation of raw snapshot payloads into position records.
//!
//! Upstream publishes each hour as an array of `[lat, lon, alt, ...]` arrays.
//! Nothing about the payload is trusted: every element is validated on its
//! own and anything malformed is dropped without affecting its neighbours.

use crate::metrics_defs::SNAPSHOT_POINTS_DISCARDED;
use crate::types::PositionRecord;
use serde_json::Value;
use shared::counter;

/// Minimum number of fields in a point: latitude, longitude and altitude.
const MIN_POINT_FIELDS: usize = 3;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum PointError {
    #[error("point is not an array")]
    NotAnArray,
    #[error("point has {0} fields, expected at least 3")]
    TooShort(usize),
    #[error("latitude is not numeric")]
    NonNumericLatitude,
    #[error("longitude is not numeric")]
    NonNumericLongitude,
}

impl PointError {
    fn reason(&self) -> &'static str {
        match self {
            PointError::NotAnArray => "not_an_array",
            PointError::TooShort(_) => "too_short",
            PointError::NonNumericLatitude => "latitude",
            PointError::NonNumericLongitude => "longitude",
        }
    }
}

/// Validates the element found at `position_index` of a snapshot array.
///
/// A bad altitude is not an error: it falls back to `0.0`.
pub fn validate_point(position_index: usize, element: &Value) -> Result<PositionRecord, PointError> {
    let fields = element.as_array().ok_or(PointError::NotAnArray)?;

    if fields.len() < MIN_POINT_FIELDS {
        return Err(PointError::TooShort(fields.len()));
    }

    // Booleans are rejected: `true` is not a coordinate.
    let lat = fields[0].as_f64().ok_or(PointError::NonNumericLatitude)?;
    let lon = fields[1].as_f64().ok_or(PointError::NonNumericLongitude)?;
    let alt = fields[2].as_f64().unwrap_or(0.0);

    Ok(PositionRecord {
        position_index,
        lat,
        lon,
        alt,
    })
}

/// Extracts every valid position record from a snapshot payload.
///
/// A missing payload or one that is not an array yields no records.
pub fn parse_snapshot(payload: Option<&Value>) -> Vec<PositionRecord> {
    let Some(payload) = payload else {
        return Vec::new();
    };

    let Some(elements) = payload.as_array() else {
        tracing::warn!("Snapshot payload is not an array, ignoring it");
        return Vec::new();
    };

    elements
        .iter()
        .enumerate()
        .filter_map(|(i, element)| match validate_point(i, element) {
            Ok(record) => Some(record),
            Err(e) => {
                counter!(SNAPSHOT_POINTS_DISCARDED, "reason" => e.reason()).increment(1);
                tracing::debug!(position_index = i, "Discarding point: {e}");
                None
            }
        })
        .collect()
}
