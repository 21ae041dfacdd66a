// src/services/pipeline.rs
use log::{error, info, warn};
use std::sync::Arc;

use crate::error::Result;
use crate::models::{RawAuction, RunCounts, RunType, UpdateStatus};
use crate::services::cache::SnapshotCache;
use crate::services::normalize::{normalize, NormalizedAuction};
use crate::services::store::{AuctionStore, UpdateOutcome};
use crate::services::treasury::{FetchClient, FetchQuery};
use crate::services::writer::UpsertWriter;

/// Where a run's records came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordSource {
    Network,
    Snapshot,
}

/// Result of one fetch -> normalize -> upsert run, as recorded in the audit log.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub update_id: i64,
    pub status: UpdateStatus,
    pub source: Option<RecordSource>,
    pub counts: RunCounts,
    pub error: Option<String>,
}

pub struct Pipeline<S: AuctionStore + ?Sized> {
    store: Arc<S>,
    client: FetchClient,
    cache: SnapshotCache,
    query: FetchQuery,
}

impl<S: AuctionStore + ?Sized> Pipeline<S> {
    pub fn new(store: Arc<S>, client: FetchClient, cache: SnapshotCache, query: FetchQuery) -> Self {
        Pipeline {
            store,
            client,
            cache,
            query,
        }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Runs one ingestion. Failures inside the run are recorded on the audit
    /// row and reported as a `Failed` report; only a failure to write the
    /// audit row itself is returned as an error.
    pub async fn run(&self, run_type: RunType) -> Result<RunReport> {
        let update_id = self.store.begin_update(run_type).await?;
        info!("Starting {} ingestion run (update {})", run_type.as_str(), update_id);

        let mut counts = RunCounts::default();
        let mut source = None;

        let result = self.ingest(run_type, &mut counts, &mut source).await;

        // Read back from the store so a failed run never reports a date it did not write.
        let last_auction_date = match self.store.latest_auction_date().await {
            Ok(date) => date,
            Err(e) => {
                warn!("Could not read latest auction date: {}", e);
                None
            }
        };

        let (status, error_message) = match &result {
            Ok(()) => (UpdateStatus::Success, None),
            Err(e) => (UpdateStatus::Failed, Some(e.to_string())),
        };

        let outcome = UpdateOutcome {
            status,
            counts: counts.clone(),
            last_auction_date,
            error_message: error_message.clone(),
        };
        self.store.finish_update(update_id, &outcome).await?;

        match &error_message {
            None => info!(
                "Pipeline completed: fetched={} inserted={} updated={} unchanged={} bound_violations={} rejected={}",
                counts.records_fetched,
                counts.records_inserted,
                counts.records_updated,
                counts.records_unchanged,
                counts.bound_violations,
                counts.records_rejected
            ),
            Some(e) => error!(
                "Pipeline failed after fetched={} inserted={} updated={}: {}",
                counts.records_fetched, counts.records_inserted, counts.records_updated, e
            ),
        }

        Ok(RunReport {
            update_id,
            status,
            source,
            counts,
            error: error_message,
        })
    }

    async fn ingest(
        &self,
        run_type: RunType,
        counts: &mut RunCounts,
        source: &mut Option<RecordSource>,
    ) -> Result<()> {
        let (records, from) = self.acquire(run_type).await?;
        *source = Some(from);
        counts.records_fetched = records.len() as i64;

        let batch = self.normalize_all(&records, counts);

        UpsertWriter::new(self.store.clone())
            .apply_batch(&batch, counts)
            .await?;

        if from == RecordSource::Network {
            if let Err(e) = self.cache.store(&records).await {
                warn!("Failed to write snapshot {}: {}", self.cache.path().display(), e);
            }
        }
        Ok(())
    }

    /// Cold-start runs reuse the snapshot when one exists; every other run
    /// goes to the network.
    async fn acquire(&self, run_type: RunType) -> Result<(Vec<RawAuction>, RecordSource)> {
        if run_type == RunType::Initial {
            match self.cache.load().await {
                Ok(Some(records)) => return Ok((records, RecordSource::Snapshot)),
                Ok(None) => {}
                Err(e) => warn!("Cache load failed: {}", e),
            }
        }
        let records = self.client.fetch_all(&self.query).await?;
        Ok((records, RecordSource::Network))
    }

    fn normalize_all(&self, records: &[RawAuction], counts: &mut RunCounts) -> Vec<NormalizedAuction> {
        let mut batch = Vec::with_capacity(records.len());
        for raw in records {
            match normalize(raw) {
                Ok(normalized) => batch.push(normalized),
                Err(e) => {
                    warn!("Skipping record: {}", e);
                    counts.records_rejected += 1;
                }
            }
        }
        batch
    }
}
