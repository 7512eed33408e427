//! In-memory registry of analysis runs.
//!
//! Each job runs the pipeline on its own tokio task. The store keeps the
//! job's public state plus a cancellation handle; the handle is dropped once
//! the run ends. Only the newest `retained` finished jobs are kept.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use adscope_pipeline::{Pipeline, PipelineFailure, PipelineReport};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{watch, RwLock};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub brand: String,
    pub region: String,
    pub max_items: usize,
    pub status: JobStatus,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub finished_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<PipelineReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<PipelineFailure>,
}

struct JobEntry {
    job: Job,
    cancel: Option<watch::Sender<bool>>,
}

/// Outcome of a cancellation request.
#[derive(Debug)]
pub enum CancelOutcome {
    Requested(Job),
    AlreadyFinished(Job),
    NotFound,
}

const DEFAULT_RETAINED: usize = 100;

#[derive(Clone)]
pub struct JobStore {
    inner: Arc<RwLock<HashMap<Uuid, JobEntry>>>,
    retained: usize,
}

impl Default for JobStore {
    fn default() -> Self {
        Self::with_retention(DEFAULT_RETAINED)
    }
}

/// Parameters for one analysis run.
#[derive(Debug, Clone)]
pub struct JobRequest {
    pub brand: String,
    pub region: String,
    pub max_items: usize,
    pub timeout: Duration,
}

/// Resolves when `rx` flips to `true`. Never resolves if the sender is gone.
async fn cancelled(mut rx: watch::Receiver<bool>) {
    let requested = rx.wait_for(|flag| *flag).await.is_ok();
    if !requested {
        std::future::pending::<()>().await;
    }
}

impl JobStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that keeps at most `retained` finished jobs.
    #[must_use]
    pub fn with_retention(retained: usize) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            retained,
        }
    }

    /// Registers a job and starts its run in the background.
    pub async fn spawn(&self, pipeline: Arc<Pipeline>, request: JobRequest) -> Job {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        let job = Job {
            id: Uuid::new_v4(),
            brand: request.brand.trim().to_string(),
            region: request.region.clone(),
            max_items: request.max_items,
            status: JobStatus::Running,
            created_at: Utc::now(),
            finished_at: None,
            report: None,
            failure: None,
        };

        self.inner.write().await.insert(
            job.id,
            JobEntry {
                job: job.clone(),
                cancel: Some(cancel_tx),
            },
        );

        let store = self.clone();
        let id = job.id;
        let timeout = request.timeout;
        tokio::spawn(async move {
            let stop = async move {
                tokio::select! {
                    () = cancelled(cancel_rx) => {}
                    () = tokio::time::sleep(timeout) => {
                        tracing::warn!(%id, timeout_secs = timeout.as_secs(), "analysis timed out");
                    }
                }
            };
            let outcome = pipeline
                .run_until(&request.brand, &request.region, request.max_items, stop)
                .await;
            store.finish(id, outcome).await;
        });

        tracing::info!(id = %job.id, brand = %job.brand, "analysis job started");
        job
    }

    pub async fn get(&self, id: Uuid) -> Option<Job> {
        self.inner.read().await.get(&id).map(|entry| entry.job.clone())
    }

    /// Asks a running job to stop. The job reaches `cancelled` asynchronously.
    pub async fn cancel(&self, id: Uuid) -> CancelOutcome {
        let guard = self.inner.read().await;
        let Some(entry) = guard.get(&id) else {
            return CancelOutcome::NotFound;
        };
        match (&entry.cancel, entry.job.status) {
            (Some(tx), JobStatus::Running) => {
                // A send error means the run already ended; `finish` will settle the state.
                let _ = tx.send(true);
                tracing::info!(%id, "analysis cancellation requested");
                CancelOutcome::Requested(entry.job.clone())
            }
            _ => CancelOutcome::AlreadyFinished(entry.job.clone()),
        }
    }

    async fn finish(&self, id: Uuid, outcome: Result<PipelineReport, PipelineFailure>) {
        let mut guard = self.inner.write().await;
        let Some(entry) = guard.get_mut(&id) else {
            return;
        };
        entry.cancel = None;
        entry.job.finished_at = Some(Utc::now());
        match outcome {
            Ok(report) => {
                tracing::info!(%id, creatives = report.analyzed.len(), "analysis job completed");
                entry.job.status = JobStatus::Completed;
                entry.job.report = Some(report);
            }
            Err(failure) => {
                entry.job.status = if failure.is_cancelled() {
                    JobStatus::Cancelled
                } else {
                    JobStatus::Failed
                };
                tracing::warn!(%id, stage = %failure.stage, detail = %failure.detail, "analysis job did not complete");
                entry.job.failure = Some(failure);
            }
        }
        evict_finished(&mut guard, self.retained);
    }
}

/// Drops the oldest finished jobs until at most `retained` remain.
fn evict_finished(jobs: &mut HashMap<Uuid, JobEntry>, retained: usize) {
    let mut finished: Vec<(DateTime<Utc>, Uuid)> = jobs
        .values()
        .filter_map(|entry| entry.job.finished_at.map(|at| (at, entry.job.id)))
        .collect();
    if finished.len() <= retained {
        return;
    }
    finished.sort_unstable();
    let excess = finished.len() - retained;
    for (_, id) in finished.into_iter().take(excess) {
        jobs.remove(&id);
        tracing::debug!(%id, "evicted finished analysis job");
    }
}

#[cfg(test)]
mod tests {
    use adscope_core::{JudgmentOracle, OracleError, RawAdRecord, ScrapeOracle, ScrapeRequest};
    use adscope_pipeline::PipelineSettings;
    use async_trait::async_trait;

    use super::*;

    struct OneAdScraper;

    #[async_trait]
    impl ScrapeOracle for OneAdScraper {
        async fn scrape(&self, _: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
            Ok(vec![RawAdRecord::new("a1", "Buy Now", "Sale")])
        }
    }

    struct StalledScraper;

    #[async_trait]
    impl ScrapeOracle for StalledScraper {
        async fn scrape(&self, _: &ScrapeRequest) -> Result<Vec<RawAdRecord>, OracleError> {
            std::future::pending().await
        }
    }

    struct FixedJudge;

    #[async_trait]
    impl JudgmentOracle for FixedJudge {
        async fn judge(&self, _: &str) -> Result<String, OracleError> {
            Ok(r#"{"hook_type": "urgency", "funnel_stage": "BOFU", "score": 7}"#.to_string())
        }
    }

    fn pipeline(scraper: Arc<dyn ScrapeOracle>) -> Arc<Pipeline> {
        Arc::new(Pipeline::new(scraper, Arc::new(FixedJudge), PipelineSettings::default()))
    }

    fn request(brand: &str) -> JobRequest {
        JobRequest {
            brand: brand.to_string(),
            region: "ALL".to_string(),
            max_items: 5,
            timeout: Duration::from_secs(60),
        }
    }

    async fn wait_until_settled(store: &JobStore, id: Uuid) -> Job {
        for _ in 0..200 {
            let job = store.get(id).await.expect("job present");
            if job.status != JobStatus::Running {
                return job;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("job {id} never settled");
    }

    fn finished_entry(finished_at: DateTime<Utc>) -> JobEntry {
        JobEntry {
            job: Job {
                id: Uuid::new_v4(),
                brand: "Acme".to_string(),
                region: "ALL".to_string(),
                max_items: 5,
                status: JobStatus::Completed,
                created_at: finished_at,
                finished_at: Some(finished_at),
                report: None,
                failure: None,
            },
            cancel: None,
        }
    }

    #[test]
    fn evict_finished_drops_oldest_first() {
        let now = Utc::now();
        let mut jobs = HashMap::new();
        let mut ids = Vec::new();
        for minutes in [30, 20, 10] {
            let entry = finished_entry(now - chrono::Duration::minutes(minutes));
            ids.push(entry.job.id);
            jobs.insert(entry.job.id, entry);
        }

        evict_finished(&mut jobs, 2);

        assert_eq!(jobs.len(), 2);
        assert!(!jobs.contains_key(&ids[0]));
        assert!(jobs.contains_key(&ids[1]));
        assert!(jobs.contains_key(&ids[2]));
    }

    #[test]
    fn evict_finished_keeps_running_jobs() {
        let mut jobs = HashMap::new();
        let mut running = finished_entry(Utc::now());
        running.job.status = JobStatus::Running;
        running.job.finished_at = None;
        let running_id = running.job.id;
        jobs.insert(running_id, running);

        evict_finished(&mut jobs, 0);

        assert!(jobs.contains_key(&running_id));
    }

    #[tokio::test]
    async fn store_keeps_only_newest_finished_jobs() {
        let store = JobStore::with_retention(2);
        let pipeline = pipeline(Arc::new(OneAdScraper));

        let mut ids = Vec::new();
        for brand in ["Acme", "Globex", "Initech"] {
            let job = store.spawn(Arc::clone(&pipeline), request(brand)).await;
            let settled = wait_until_settled(&store, job.id).await;
            assert_eq!(settled.status, JobStatus::Completed);
            ids.push(job.id);
        }

        assert!(store.get(ids[0]).await.is_none());
        assert!(store.get(ids[1]).await.is_some());
        assert!(store.get(ids[2]).await.is_some());
    }

    #[tokio::test]
    async fn running_job_survives_eviction() {
        let store = JobStore::with_retention(1);
        let running = store
            .spawn(pipeline(Arc::new(StalledScraper)), request("Acme"))
            .await;

        let done = pipeline(Arc::new(OneAdScraper));
        for brand in ["Globex", "Initech"] {
            let job = store.spawn(Arc::clone(&done), request(brand)).await;
            wait_until_settled(&store, job.id).await;
        }

        let job = store.get(running.id).await.expect("running job kept");
        assert_eq!(job.status, JobStatus::Running);
        assert!(matches!(store.cancel(running.id).await, CancelOutcome::Requested(_)));
    }
}
