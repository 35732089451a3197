// THEORY:
// The analysis queue moves full-image analyses off the caller's task. A single
// dispatcher hands tasks round-robin to a fixed pool of workers; each worker
// runs the CPU-bound pipeline on the blocking thread pool and records the
// outcome. Job states are kept in a bounded FIFO cache so a long-running
// service does not accumulate finished reports forever.
//
// Callers either fire and poll (`submit` + `status`) or wait for the report
// directly (`analyze`), which rides the same workers with a oneshot reply.

use crate::core_modules::fifo_cache::FifoCache;
use crate::error::QueueError;
use crate::pipeline::{AnalysisPipeline, AnalysisReport};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::{RwLock, mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

pub const DEFAULT_MAX_TRACKED_JOBS: usize = 256;

/// Raw bytes of one uploaded image plus what the client told us about it.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub image_id: Uuid,
    pub filename: String,
    pub content_type: String,
    pub bytes: Arc<[u8]>,
    pub uploaded_at: DateTime<Utc>,
}

impl ImageUpload {
    pub fn new(filename: impl Into<String>, content_type: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        Self {
            image_id: Uuid::new_v4(),
            filename: filename.into(),
            content_type: content_type.into(),
            bytes: bytes.into(),
            uploaded_at: Utc::now(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

/// Lifecycle of a queued analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Processing,
    Completed { report: Box<AnalysisReport> },
    Failed { message: String },
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(self, JobStatus::Completed { .. } | JobStatus::Failed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct QueueConfig {
    pub workers: usize,
    pub max_tracked_jobs: usize,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            workers: num_cpus::get(),
            max_tracked_jobs: DEFAULT_MAX_TRACKED_JOBS,
        }
    }
}

struct AnalysisTask {
    job_id: Uuid,
    upload: ImageUpload,
    seed: u64,
    reply: Option<oneshot::Sender<JobStatus>>,
}

type JobTable = Arc<RwLock<FifoCache<Uuid, JobStatus>>>;

pub struct AnalysisQueue {
    task_sender: mpsc::UnboundedSender<AnalysisTask>,
    jobs: JobTable,
    handles: Vec<JoinHandle<()>>,
    worker_count: usize,
}

impl AnalysisQueue {
    /// Spawns the dispatcher and workers. Must be called inside a Tokio runtime.
    pub fn new(pipeline: Arc<AnalysisPipeline>, config: QueueConfig) -> Self {
        let worker_count = config.workers.max(1);
        let jobs: JobTable = Arc::new(RwLock::new(FifoCache::new(config.max_tracked_jobs)));
        let (task_sender, mut task_receiver) = mpsc::unbounded_channel::<AnalysisTask>();
        let mut handles = Vec::with_capacity(worker_count + 1);

        let (worker_senders, worker_receivers): (Vec<_>, Vec<_>) = (0..worker_count)
            .map(|_| mpsc::unbounded_channel::<AnalysisTask>())
            .unzip();

        // Dispatcher
        handles.push(tokio::spawn(async move {
            let mut worker_idx = 0;
            while let Some(task) = task_receiver.recv().await {
                if worker_senders[worker_idx].send(task).is_err() {
                    tracing::error!(worker_idx, "analysis worker is gone");
                }
                worker_idx = (worker_idx + 1) % worker_senders.len();
            }
        }));

        // Workers
        for mut worker_receiver in worker_receivers {
            let pipeline = pipeline.clone();
            let jobs = jobs.clone();
            handles.push(tokio::spawn(async move {
                while let Some(task) = worker_receiver.recv().await {
                    Self::run_task(&pipeline, &jobs, task).await;
                }
            }));
        }

        tracing::info!(workers = worker_count, "analysis queue started");

        Self {
            task_sender,
            jobs,
            handles,
            worker_count,
        }
    }

    async fn run_task(pipeline: &Arc<AnalysisPipeline>, jobs: &JobTable, task: AnalysisTask) {
        let AnalysisTask { job_id, upload, seed, reply } = task;
        Self::update(jobs, job_id, JobStatus::Processing).await;

        let pipeline = pipeline.clone();
        let result = tokio::task::spawn_blocking(move || {
            pipeline.analyze_bytes(upload.image_id, &upload.bytes, &upload.content_type, seed)
        })
        .await;

        let status = match result {
            Ok(Ok(report)) => JobStatus::Completed {
                report: Box::new(report),
            },
            Ok(Err(e)) => {
                tracing::warn!(%job_id, error = %e, "analysis rejected input");
                JobStatus::Failed { message: e.to_string() }
            }
            Err(e) => {
                tracing::error!(%job_id, error = %e, "analysis task aborted");
                JobStatus::Failed {
                    message: "analysis task aborted".to_string(),
                }
            }
        };

        Self::update(jobs, job_id, status.clone()).await;
        if let Some(reply) = reply {
            let _ = reply.send(status);
        }
    }

    /// Updates a tracked job. Jobs already evicted from tracking stay evicted.
    async fn update(jobs: &JobTable, job_id: Uuid, status: JobStatus) {
        if let Some(slot) = jobs.write().await.get_mut(&job_id) {
            *slot = status;
        }
    }

    pub fn worker_count(&self) -> usize {
        self.worker_count
    }

    /// Queues an analysis and returns its job id immediately.
    pub async fn submit(&self, upload: ImageUpload, seed: u64) -> Result<Uuid, QueueError> {
        self.enqueue(upload, seed, None).await
    }

    /// Queues an analysis and waits for its report.
    pub async fn analyze(&self, upload: ImageUpload, seed: u64) -> Result<AnalysisReport, QueueError> {
        let (reply, result) = oneshot::channel();
        self.enqueue(upload, seed, Some(reply)).await?;
        match result.await.map_err(|_| QueueError::WorkerGone)? {
            JobStatus::Completed { report } => Ok(*report),
            JobStatus::Failed { message } => Err(QueueError::Failed(message)),
            JobStatus::Queued | JobStatus::Processing => Err(QueueError::WorkerGone),
        }
    }

    async fn enqueue(
        &self,
        upload: ImageUpload,
        seed: u64,
        reply: Option<oneshot::Sender<JobStatus>>,
    ) -> Result<Uuid, QueueError> {
        let job_id = Uuid::new_v4();
        let evicted = self.jobs.write().await.put(job_id, JobStatus::Queued);
        if !evicted.is_empty() {
            tracing::debug!(count = evicted.len(), "evicted tracked analysis jobs");
        }
        tracing::info!(%job_id, image_id = %upload.image_id, "analysis queued");

        let task = AnalysisTask {
            job_id,
            upload,
            seed,
            reply,
        };
        if self.task_sender.send(task).is_err() {
            self.jobs.write().await.remove(&job_id);
            return Err(QueueError::Closed);
        }
        Ok(job_id)
    }

    pub async fn status(&self, job_id: &Uuid) -> Option<JobStatus> {
        self.jobs.read().await.get(job_id).cloned()
    }

    /// Stops accepting work and waits for in-flight jobs to finish.
    pub async fn shutdown(self) {
        let AnalysisQueue { task_sender, handles, .. } = self;
        drop(task_sender);
        for handle in handles {
            let _ = handle.await;
        }
    }
}
