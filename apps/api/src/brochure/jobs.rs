//! In-memory job registry for asynchronous brochure requests.
//!
//! Jobs move pending → processing → completed | failed and are never removed
//! while the process lives.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{error, info};
use uuid::Uuid;

use crate::brochure::generator::{BrochureArtifact, BrochureGenerator, BrochureRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

#[derive(Debug, Clone, Serialize)]
pub struct JobRecord {
    pub job_id: Uuid,
    pub hotel_name: String,
    pub location: String,
    pub layout: String,
    pub status: JobStatus,
    pub message: Option<String>,
    pub artifact: Option<BrochureArtifact>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct JobStore {
    jobs: Arc<RwLock<HashMap<Uuid, JobRecord>>>,
}

impl JobStore {
    pub async fn create(&self, request: &BrochureRequest) -> JobRecord {
        let now = Utc::now();
        let record = JobRecord {
            job_id: Uuid::new_v4(),
            hotel_name: request.hotel_name.clone(),
            location: request.location.clone(),
            layout: request.layout.as_str().to_string(),
            status: JobStatus::Pending,
            message: None,
            artifact: None,
            created_at: now,
            updated_at: now,
        };
        self.jobs.write().await.insert(record.job_id, record.clone());
        record
    }

    pub async fn get(&self, job_id: Uuid) -> Option<JobRecord> {
        self.jobs.read().await.get(&job_id).cloned()
    }

    pub async fn mark_processing(&self, job_id: Uuid) {
        self.update(job_id, |job| job.status = JobStatus::Processing)
            .await;
    }

    pub async fn complete(&self, job_id: Uuid, artifact: BrochureArtifact) {
        self.update(job_id, |job| {
            job.status = JobStatus::Completed;
            job.message = Some(format!("Brochure written to {}", artifact.path.display()));
            job.artifact = Some(artifact);
        })
        .await;
    }

    pub async fn fail(&self, job_id: Uuid, message: String) {
        self.update(job_id, |job| {
            job.status = JobStatus::Failed;
            job.message = Some(message);
        })
        .await;
    }

    /// Stores `record` as is, replacing any job with the same id.
    #[cfg(test)]
    pub async fn insert(&self, record: JobRecord) {
        self.jobs.write().await.insert(record.job_id, record);
    }

    async fn update(&self, job_id: Uuid, apply: impl FnOnce(&mut JobRecord)) {
        if let Some(job) = self.jobs.write().await.get_mut(&job_id) {
            apply(job);
            job.updated_at = Utc::now();
        }
    }
}

/// Drives one job through the pipeline, recording each transition.
pub async fn run_job(
    jobs: JobStore,
    generator: Arc<BrochureGenerator>,
    job_id: Uuid,
    request: BrochureRequest,
) {
    jobs.mark_processing(job_id).await;
    info!("Job {job_id} processing");

    match generator.generate(&request).await {
        Ok(artifact) => {
            info!("Job {job_id} completed: {}", artifact.path.display());
            jobs.complete(job_id, artifact).await;
        }
        Err(e) => {
            error!("Job {job_id} failed: {e}");
            jobs.fail(job_id, e.to_string()).await;
        }
    }
}
