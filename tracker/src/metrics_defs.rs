//! Metrics definitions for the tracker.

use shared::metrics_defs::{MetricDef, MetricType};

pub const SOURCE_FETCH: MetricDef = MetricDef {
    name: "source.fetch",
    metric_type: MetricType::Counter,
    description: "Snapshot fetches. Tagged with outcome.",
};

pub const SNAPSHOT_POINTS_DISCARDED: MetricDef = MetricDef {
    name: "snapshot.points.discarded",
    metric_type: MetricType::Counter,
    description: "Snapshot elements dropped by validation. Tagged with reason.",
};

pub const PIPELINE_DURATION: MetricDef = MetricDef {
    name: "pipeline.duration",
    metric_type: MetricType::Histogram,
    description: "Time to fetch and aggregate all snapshots in seconds",
};

pub const PIPELINE_TRAJECTORIES: MetricDef = MetricDef {
    name: "pipeline.trajectories",
    metric_type: MetricType::Histogram,
    description: "Number of trajectories returned by a pipeline run",
};

pub const ALL_METRICS: &[MetricDef] = &[
    SOURCE_FETCH,
    SNAPSHOT_POINTS_DISCARDED,
    PIPELINE_DURATION,
    PIPELINE_TRAJECTORIES,
];
