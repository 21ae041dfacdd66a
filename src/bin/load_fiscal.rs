// src/bin/load_fiscal.rs
use anyhow::Context;
use std::env;
use std::path::PathBuf;

use treasury_auction_ingest::config::Settings;
use treasury_auction_ingest::services::db::DbStore;
use treasury_auction_ingest::services::fiscal::{load_fiscal_csv, load_fiscal_directory};

/// Usage: `load_fiscal [DIR | SCORES_CSV]`. A directory loads articles, scores
/// and phrases; a single file loads daily scores only.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));

    let settings = Settings::from_env()?;
    let store = DbStore::new(&settings.database_url).await?;
    store.ensure_schema().await?;

    if path.is_dir() {
        let load = load_fiscal_directory(&store, &path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        println!(
            "Articles: {} ({} skipped), indices: {} ({} skipped), phrases: {} ({} skipped)",
            load.articles.loaded,
            load.articles.skipped,
            load.indices.loaded,
            load.indices.skipped,
            load.phrases.loaded,
            load.phrases.skipped
        );
        println!(
            "Table counts: fiscal_articles={} fiscal_policy_indices={} top_phrases={}",
            load.counts.articles, load.counts.indices, load.counts.phrases
        );
    } else {
        let summary = load_fiscal_csv(&store, &path)
            .await
            .with_context(|| format!("failed to load {}", path.display()))?;
        println!(
            "Fiscal indices loaded: {} ({} skipped)",
            summary.loaded, summary.skipped
        );
    }
    Ok(())
}
