// src/services/scheduler.rs
use log::{error, info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::Result;
use crate::models::RunType;
use crate::services::pipeline::{Pipeline, RunReport};
use crate::services::store::AuctionStore;

/// Idle/Running flag. At most one guard exists at a time.
#[derive(Debug, Clone, Default)]
pub struct RunLatch {
    running: Arc<AtomicBool>,
}

impl RunLatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Idle -> Running. `None` when a run is already in progress.
    pub fn try_begin(&self) -> Option<RunGuard> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard {
                running: self.running.clone(),
            })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Returns the latch to Idle when dropped, however the run ended.
#[derive(Debug)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

#[derive(Debug)]
pub enum TriggerOutcome {
    /// Another run held the latch; nothing was done.
    Skipped,
    /// The run finished and was audited (its status may still be `failed`).
    Finished(RunReport),
    /// The run could not even be audited.
    Aborted(String),
}

pub struct Scheduler<S: AuctionStore + ?Sized + 'static> {
    pipeline: Arc<Pipeline<S>>,
    latch: RunLatch,
    cron: String,
}

impl<S: AuctionStore + ?Sized + 'static> Scheduler<S> {
    pub fn new(pipeline: Arc<Pipeline<S>>, cron: impl Into<String>) -> Self {
        Scheduler {
            pipeline,
            latch: RunLatch::new(),
            cron: cron.into(),
        }
    }

    pub fn latch(&self) -> &RunLatch {
        &self.latch
    }

    /// Runs the pipeline unless a run is already in progress. Never panics or
    /// propagates: every outcome leaves the scheduler Idle.
    pub async fn trigger(&self, run_type: RunType) -> TriggerOutcome {
        let _guard = match self.latch.try_begin() {
            Some(guard) => guard,
            None => {
                warn!("Skipping {} run: previous run still in progress", run_type.as_str());
                return TriggerOutcome::Skipped;
            }
        };

        match self.pipeline.run(run_type).await {
            Ok(report) => TriggerOutcome::Finished(report),
            Err(e) => {
                error!("Update failed: {}", e);
                TriggerOutcome::Aborted(e.to_string())
            }
        }
    }

    /// Runs once at start-up when the store holds no auctions yet.
    pub async fn initial_load(&self) -> Option<TriggerOutcome> {
        info!("Checking if initial data load is needed...");
        match self.pipeline.store().auction_count().await {
            Ok(0) => {
                info!("Database is empty, running initial load...");
                Some(self.trigger(RunType::Initial).await)
            }
            Ok(count) => {
                info!("Database has {} auctions, skipping initial load", count);
                None
            }
            Err(e) => {
                warn!("Initial load check failed ({}), running initial load anyway", e);
                Some(self.trigger(RunType::Initial).await)
            }
        }
    }

    /// Registers the daily job and starts the cron scheduler. The returned
    /// handle must be kept alive for the job to keep firing.
    pub async fn start(self: Arc<Self>) -> Result<JobScheduler> {
        let scheduler = JobScheduler::new().await?;
        let this = self.clone();

        let job = Job::new_async(self.cron.as_str(), move |_uuid, _lock| {
            let this = this.clone();
            Box::pin(async move {
                info!("Starting scheduled treasury data update...");
                match this.trigger(RunType::Scheduled).await {
                    TriggerOutcome::Finished(report) => {
                        info!("Update completed with status {}", report.status.as_str())
                    }
                    TriggerOutcome::Skipped => {}
                    TriggerOutcome::Aborted(e) => error!("Scheduled update aborted: {}", e),
                }
            })
        })?;

        scheduler.add(job).await?;
        scheduler.start().await?;
        info!("Scheduler started. Daily updates scheduled with cron '{}' (UTC)", self.cron);
        Ok(scheduler)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latch_admits_one_run_at_a_time() {
        let latch = RunLatch::new();
        let guard = latch.try_begin().expect("idle latch admits a run");
        assert!(latch.is_running());
        assert!(latch.try_begin().is_none());

        drop(guard);
        assert!(!latch.is_running());
        assert!(latch.try_begin().is_some());
    }

    #[test]
    fn clones_share_state() {
        let latch = RunLatch::new();
        let other = latch.clone();
        let _guard = latch.try_begin().unwrap();
        assert!(other.try_begin().is_none());
    }

    #[tokio::test]
    async fn concurrent_attempts_admit_exactly_one() {
        let latch = RunLatch::new();
        let mut handles = Vec::new();
        for _ in 0..8 {
            let latch = latch.clone();
            handles.push(tokio::spawn(async move { latch.try_begin() }));
        }
        let mut admitted = Vec::new();
        for handle in handles {
            if let Some(guard) = handle.await.unwrap() {
                admitted.push(guard);
            }
        }
        assert_eq!(admitted.len(), 1);
    }
}
