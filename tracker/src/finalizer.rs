use crate::types::{EntityId, Trajectory};
use std::collections::HashMap;

/// Turns aggregated trajectories into the response list.
///
/// Each path is sorted oldest first and trajectories without points are
/// dropped. The list is ordered by position index so identical inputs always
/// serialize identically.
pub fn finalize(trajectories: HashMap<EntityId, Trajectory>) -> Vec<Trajectory> {
    let mut result: Vec<Trajectory> = trajectories
        .into_values()
        .filter_map(|mut trajectory| {
            // Stable, so points sharing a timestamp keep their ingestion order
            trajectory.path.sort_by_key(|point| point.time);
            (!trajectory.path.is_empty()).then_some(trajectory)
        })
        .collect();

    result.sort_by_key(|trajectory| trajectory.position_index);
    result
}
