use crate::types::{EntityId, HourOffset, PositionRecord, Trajectory, TrajectoryPoint};
use std::collections::HashMap;

/// Display colors, assigned cyclically by position index.
pub const PALETTE: [&str; 6] = [
    "#00ffea", "#ff0055", "#ccff00", "#bf00ff", "#00ccff", "#ffaa00",
];

pub fn color_for(position_index: usize) -> &'static str {
    PALETTE[position_index % PALETTE.len()]
}

/// Balloons have no identity upstream. The position in the snapshot array is
/// all there is, so the same index in different hours is the same balloon.
pub fn entity_id(position_index: usize) -> EntityId {
    format!("WB-{}", position_index + 1)
}

/// Collects position records from every snapshot of one run into trajectories.
///
/// Points are appended in ingestion order; sorting happens when the
/// trajectories are finalized, so snapshots can be ingested in any order.
pub struct TrajectoryAggregator {
    now_ms: i64,
    trajectories: HashMap<EntityId, Trajectory>,
}

impl TrajectoryAggregator {
    /// `now_ms` is the time the run started. Hour `h` is stamped `h` hours before it.
    pub fn new(now_ms: i64) -> Self {
        TrajectoryAggregator {
            now_ms,
            trajectories: HashMap::new(),
        }
    }

    pub fn ingest(&mut self, offset: HourOffset, records: &[PositionRecord]) {
        let time = offset.timestamp_ms(self.now_ms);

        for record in records {
            let trajectory = self
                .trajectories
                .entry(entity_id(record.position_index))
                .or_insert_with_key(|id| Trajectory {
                    id: id.clone(),
                    path: Vec::new(),
                    color: color_for(record.position_index),
                    position_index: record.position_index,
                });

            trajectory.path.push(TrajectoryPoint {
                lat: record.lat,
                lon: record.lon,
                alt: record.alt,
                time,
            });
        }
    }

    pub fn len(&self) -> usize {
        self.trajectories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trajectories.is_empty()
    }

    pub fn into_trajectories(self) -> HashMap<EntityId, Trajectory> {
        self.trajectories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn record(position_index: usize, lat: f64) -> PositionRecord {
        PositionRecord {
            position_index,
            lat,
            lon: lat + 1.0,
            alt: 15.0,
        }
    }

    fn hour(h: u8) -> HourOffset {
        HourOffset::new(h).unwrap()
    }

    #[test]
    fn test_entity_id_and_color() {
        assert_eq!(entity_id(0), "WB-1");
        assert_eq!(entity_id(41), "WB-42");

        assert_eq!(color_for(0), "#00ffea");
        assert_eq!(color_for(5), "#ffaa00");
        assert_eq!(color_for(6), "#00ffea");
        assert_eq!(color_for(13), color_for(1));
    }

    #[test]
    fn test_ingest_single_snapshot() {
        let mut aggregator = TrajectoryAggregator::new(NOW);
        aggregator.ingest(hour(0), &[record(0, 10.0), record(2, 30.0)]);
        assert_eq!(aggregator.len(), 2);

        let trajectories = aggregator.into_trajectories();
        let first = &trajectories["WB-1"];
        assert_eq!(first.color, "#00ffea");
        assert_eq!(
            first.path,
            vec![TrajectoryPoint {
                lat: 10.0,
                lon: 11.0,
                alt: 15.0,
                time: NOW,
            }]
        );

        let third = &trajectories["WB-3"];
        assert_eq!(third.color, "#ccff00");
        assert_eq!(third.position_index, 2);
        assert!(!trajectories.contains_key("WB-2"));
    }

    #[test]
    fn test_same_index_across_hours() {
        let mut aggregator = TrajectoryAggregator::new(NOW);
        aggregator.ingest(hour(0), &[record(0, 10.0)]);
        aggregator.ingest(hour(1), &[record(0, 9.0)]);
        aggregator.ingest(hour(23), &[record(0, 8.0)]);

        let trajectories = aggregator.into_trajectories();
        assert_eq!(trajectories.len(), 1);

        let times: Vec<i64> = trajectories["WB-1"].path.iter().map(|p| p.time).collect();
        assert_eq!(times, vec![NOW, NOW - 3_600_000, NOW - 23 * 3_600_000]);
    }

    #[test]
    fn test_points_from_one_snapshot_share_timestamp() {
        let mut aggregator = TrajectoryAggregator::new(NOW);
        aggregator.ingest(hour(4), &[record(0, 1.0), record(1, 2.0), record(7, 3.0)]);

        let trajectories = aggregator.into_trajectories();
        for trajectory in trajectories.values() {
            assert_eq!(trajectory.path[0].time, NOW - 4 * 3_600_000);
        }
    }

    #[test]
    fn test_empty_snapshot() {
        let mut aggregator = TrajectoryAggregator::new(NOW);
        aggregator.ingest(hour(0), &[]);
        assert!(aggregator.is_empty());
    }
}
