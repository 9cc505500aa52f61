//! Rebuilds balloon flight paths from the hourly Windborne snapshots.
//!
//! Every request fetches the last 24 hourly snapshots, validates their points
//! and stitches them into one trajectory per array position.

pub mod aggregator;
pub mod api;
pub mod config;
pub mod fetcher;
pub mod finalizer;
pub mod metrics_defs;
pub mod pipeline;
pub mod snapshot;
pub mod types;

use fetcher::SourceFetcher;
use pipeline::Pipeline;

#[derive(thiserror::Error, Debug)]
pub enum TrackerError {
    #[error("invalid config: {0}")]
    InvalidConfig(#[from] config::ValidationError),
    #[error("could not build http client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("api error: {0}")]
    Api(#[from] api::ApiError),
}

/// Builds the pipeline for a validated config. The http client is pooled and
/// shared by every run.
pub fn build_pipeline(config: &config::Config) -> Result<Pipeline, TrackerError> {
    config.validate()?;
    let client = reqwest::Client::builder().build()?;
    Ok(Pipeline::new(SourceFetcher::new(client, &config.source)))
}

pub async fn run(config: config::Config) -> Result<(), TrackerError> {
    let pipeline = build_pipeline(&config)?;
    tracing::info!(base_url = %config.source.base_url, "Starting tracker");
    api::serve(&config.listener, &config.cors, pipeline).await?;
    Ok(())
}
