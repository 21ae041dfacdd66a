use anyhow::Context;
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

use treasury_auction_ingest::config::Settings;
use treasury_auction_ingest::handlers::SharedStore;
use treasury_auction_ingest::routes;
use treasury_auction_ingest::services::cache::SnapshotCache;
use treasury_auction_ingest::services::db::DbStore;
use treasury_auction_ingest::services::pipeline::Pipeline;
use treasury_auction_ingest::services::scheduler::Scheduler;
use treasury_auction_ingest::services::treasury::{FetchClient, FetchQuery};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let settings = Settings::from_env().context("failed to read settings")?;

    let store = Arc::new(
        DbStore::new(&settings.database_url)
            .await
            .context("failed to connect to database")?,
    );
    store.ensure_schema().await.context("failed to create schema")?;

    let client = FetchClient::new(settings.api_base.clone())?;
    let pipeline = Arc::new(Pipeline::new(
        store.clone(),
        client,
        SnapshotCache::new(settings.cache_path.clone()),
        FetchQuery::from_settings(&settings),
    ));

    let scheduler = Arc::new(Scheduler::new(pipeline, settings.cron_expression()));
    // Keep the handle alive for as long as the server runs.
    let _jobs = scheduler.clone().start().await?;

    let initial = scheduler.clone();
    tokio::spawn(async move {
        initial.initial_load().await;
    });

    let addr: SocketAddr = ([0, 0, 0, 0], settings.port).into();
    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET"]);

    let shared: SharedStore = store;
    let api = routes::routes(shared).with(cors);

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
