// src/bin/run_pipeline.rs
use anyhow::Context;
use log::info;
use std::sync::Arc;

use treasury_auction_ingest::config::Settings;
use treasury_auction_ingest::models::{RunType, UpdateStatus};
use treasury_auction_ingest::services::cache::SnapshotCache;
use treasury_auction_ingest::services::db::DbStore;
use treasury_auction_ingest::services::pipeline::Pipeline;
use treasury_auction_ingest::services::treasury::{FetchClient, FetchQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let settings = Settings::from_env()?;
    let store = Arc::new(DbStore::new(&settings.database_url).await?);
    store.ensure_schema().await?;

    let pipeline = Pipeline::new(
        store,
        FetchClient::new(settings.api_base.clone())?,
        SnapshotCache::new(settings.cache_path.clone()),
        FetchQuery::from_settings(&settings),
    );

    info!("Running manual ingestion...");
    let report = pipeline.run(RunType::Manual).await.context("could not record run")?;
    println!("Pipeline result: {:?}", report);

    if report.status == UpdateStatus::Failed {
        anyhow::bail!(report.error.unwrap_or_else(|| "run failed".to_string()));
    }
    Ok(())
}
