use crate::aggregator::TrajectoryAggregator;
use crate::fetcher::{SourceFetcher, SourceSnapshot};
use crate::finalizer::finalize;
use crate::metrics_defs::{PIPELINE_DURATION, PIPELINE_TRAJECTORIES};
use crate::snapshot::parse_snapshot;
use crate::types::Trajectory;
use shared::histogram;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Fetches every snapshot and rebuilds the trajectories from scratch.
///
/// Runs share nothing but the http client, so concurrent requests are
/// independent of each other.
#[derive(Clone)]
pub struct Pipeline {
    fetcher: SourceFetcher,
}

impl Pipeline {
    pub fn new(fetcher: SourceFetcher) -> Self {
        Pipeline { fetcher }
    }

    pub async fn run(&self) -> Vec<Trajectory> {
        self.run_at(now_ms()).await
    }

    /// Same as `run` with the reference time pinned.
    pub async fn run_at(&self, now_ms: i64) -> Vec<Trajectory> {
        let started = Instant::now();

        let snapshots = self.fetcher.fetch_all().await;
        let trajectories = build_trajectories(now_ms, &snapshots);

        histogram!(PIPELINE_DURATION).record(started.elapsed().as_secs_f64());
        histogram!(PIPELINE_TRAJECTORIES).record(trajectories.len() as f64);

        trajectories
    }
}

/// Parses, aggregates and finalizes already fetched snapshots.
pub fn build_trajectories(now_ms: i64, snapshots: &[SourceSnapshot]) -> Vec<Trajectory> {
    let mut aggregator = TrajectoryAggregator::new(now_ms);
    let mut available = 0;
    let mut accepted = 0;

    for snapshot in snapshots {
        if snapshot.payload.is_some() {
            available += 1;
        }

        let records = parse_snapshot(snapshot.payload.as_ref());
        accepted += records.len();
        aggregator.ingest(snapshot.offset, &records);
    }

    let trajectories = finalize(aggregator.into_trajectories());

    tracing::info!(
        sources = snapshots.len(),
        available,
        accepted,
        trajectories = trajectories.len(),
        "Built trajectories"
    );

    trajectories
}

fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or_default()
}
