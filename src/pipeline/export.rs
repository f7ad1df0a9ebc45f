//! The export retry engine — the centre of the pipeline.
//!
//! Per (document, tab) job the state machine is:
//!
//! ```text
//! Requested ─▶ Exported ─▶ Valid ─▶ Done
//!                  │
//!                  └─▶ TooSmall ─▶ Deleting ─▶ Requested   (bounded)
//! ```
//!
//! The export endpoint occasionally returns a truncated rendition under
//! load, so each uploaded artifact is validated against a minimum byte size.
//! An undersized artifact is deleted and the cycle restarts with a freshly
//! exported body (the previous body is not reusable after an upload). The
//! reference system looped forever; here attempts are bounded and backed
//! off exponentially, and exhaustion is a terminal, inspectable outcome.
//!
//! ## Quota asymmetry
//!
//! Only the artifact create and delete calls go through the shared
//! [`RateLimiter`]; the export GET does not count against the provider
//! quota and is dispatched directly.
//!
//! ## Failure containment
//!
//! `run_job` always returns a [`JobResult`] — no error ever propagates to
//! the orchestrator, so one bad sheet cannot take down its siblings.

use crate::config::RunConfig;
use crate::error::JobError;
use crate::limiter::RateLimiter;
use crate::output::{JobOutcome, JobResult};
use crate::remote::{DocumentService, OutputFolder, SheetTab, SourceDocument};
use std::time::Instant;
use tokio::time::{sleep, Duration};
use tracing::{debug, warn};

/// The unit of work: one tab of one document, targeting one output folder.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub document: SourceDocument,
    pub tab: SheetTab,
    pub folder: OutputFolder,
}

impl ExportJob {
    /// The artifact name: `<tab title>.pdf`.
    fn artifact_name(&self) -> String {
        format!("{}.pdf", self.tab.title)
    }
}

/// Drive one job through the retry state machine until a valid artifact is
/// in place, a remote call fails, or the attempt budget runs out.
pub async fn run_job(
    service: &dyn DocumentService,
    limiter: &RateLimiter,
    job: ExportJob,
    config: &RunConfig,
) -> JobResult {
    let start = Instant::now();
    let name = job.artifact_name();
    let mut deletes = 0u32;
    let mut last_size = 0u64;

    for attempt in 1..=config.max_attempts {
        if attempt > 1 {
            let backoff = config.retry_backoff_ms * 2u64.pow(attempt - 2);
            warn!(
                tab = %job.tab.title,
                attempt,
                max = config.max_attempts,
                backoff_ms = backoff,
                "export undersized, retrying"
            );
            sleep(Duration::from_millis(backoff)).await;
        }

        // Requested → Exported: a fresh rendition every cycle.
        let body = match service.export_tab_pdf(&job.document.id, job.tab.tab_id).await {
            Ok(b) => b,
            Err(e) => {
                return settle(
                    &job,
                    start,
                    attempt,
                    deletes,
                    JobOutcome::Failed(JobError::ExportFailed {
                        tab: job.tab.title.clone(),
                        attempt,
                        detail: e.to_string(),
                    }),
                );
            }
        };

        // Exported → Valid | TooSmall: the upload is quota-sensitive.
        let created = match limiter
            .schedule(|| service.upload_pdf(&name, &job.folder.id, body))
            .await
        {
            Ok(c) => c,
            Err(e) => {
                return settle(
                    &job,
                    start,
                    attempt,
                    deletes,
                    JobOutcome::Failed(JobError::UploadFailed {
                        tab: job.tab.title.clone(),
                        attempt,
                        detail: e.to_string(),
                    }),
                );
            }
        };

        if created.byte_size >= config.min_valid_size {
            debug!(
                tab = %job.tab.title,
                artifact_id = %created.artifact_id,
                byte_size = created.byte_size,
                attempts = attempt,
                "sheet converted"
            );
            return settle(
                &job,
                start,
                attempt,
                deletes,
                JobOutcome::Done {
                    artifact_id: created.artifact_id,
                    byte_size: created.byte_size,
                },
            );
        }

        // TooSmall → Deleting: drop the runt before the next cycle.
        last_size = created.byte_size;
        if let Err(e) = limiter
            .schedule(|| service.delete_file(&created.artifact_id))
            .await
        {
            return settle(
                &job,
                start,
                attempt,
                deletes,
                JobOutcome::Failed(JobError::DeleteFailed {
                    tab: job.tab.title.clone(),
                    artifact_id: created.artifact_id,
                    detail: e.to_string(),
                }),
            );
        }
        deletes += 1;
    }

    settle(
        &job,
        start,
        config.max_attempts,
        deletes,
        JobOutcome::Failed(JobError::RetryExhausted {
            tab: job.tab.title.clone(),
            attempts: config.max_attempts,
            last_size,
        }),
    )
}

fn settle(
    job: &ExportJob,
    start: Instant,
    attempts: u32,
    deletes: u32,
    outcome: JobOutcome,
) -> JobResult {
    if let JobOutcome::Failed(ref e) = outcome {
        warn!(tab = %job.tab.title, error = %e, "export job failed");
    }
    JobResult {
        document: job.document.clone(),
        tab: job.tab.clone(),
        attempts,
        deletes,
        duration_ms: start.elapsed().as_millis() as u64,
        outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::remote::ExportAttempt;
    use async_trait::async_trait;
    use bytes::Bytes;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const MIN: u64 = 10 * 1024;

    /// A service whose export bodies follow a per-test script of sizes; the
    /// upload reports exactly the body length it received, like Drive does.
    struct ScriptedService {
        export_sizes: Mutex<VecDeque<usize>>,
        fail_export: bool,
        fail_delete: bool,
        exports: AtomicUsize,
        uploads: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl ScriptedService {
        fn with_sizes(sizes: &[usize]) -> Self {
            Self {
                export_sizes: Mutex::new(sizes.iter().copied().collect()),
                fail_export: false,
                fail_delete: false,
                exports: AtomicUsize::new(0),
                uploads: AtomicUsize::new(0),
                deletes: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentService for ScriptedService {
        async fn list_spreadsheets(
            &self,
            _folder: &str,
            _page_size: u32,
        ) -> Result<Vec<SourceDocument>, RemoteError> {
            unimplemented!()
        }
        async fn list_tabs(&self, _id: &str) -> Result<Vec<SheetTab>, RemoteError> {
            unimplemented!()
        }
        async fn find_folder(
            &self,
            _name: &str,
            _parent: &str,
        ) -> Result<Option<OutputFolder>, RemoteError> {
            unimplemented!()
        }
        async fn create_folder(
            &self,
            _name: &str,
            _parent: &str,
        ) -> Result<OutputFolder, RemoteError> {
            unimplemented!()
        }

        async fn export_tab_pdf(&self, _id: &str, _tab: i64) -> Result<Bytes, RemoteError> {
            self.exports.fetch_add(1, Ordering::SeqCst);
            if self.fail_export {
                return Err(RemoteError::Transport("connection reset".into()));
            }
            let size = self
                .export_sizes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(MIN as usize + 1);
            Ok(Bytes::from(vec![0u8; size]))
        }

        async fn upload_pdf(
            &self,
            _name: &str,
            _parent: &str,
            body: Bytes,
        ) -> Result<ExportAttempt, RemoteError> {
            let n = self.uploads.fetch_add(1, Ordering::SeqCst);
            Ok(ExportAttempt {
                artifact_id: format!("artifact-{n}"),
                byte_size: body.len() as u64,
            })
        }

        async fn delete_file(&self, _id: &str) -> Result<(), RemoteError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            if self.fail_delete {
                return Err(RemoteError::Status {
                    status: 500,
                    body: "backend".into(),
                });
            }
            Ok(())
        }
    }

    fn job() -> ExportJob {
        ExportJob {
            document: SourceDocument {
                id: "doc-1".into(),
                name: "Budget".into(),
            },
            tab: SheetTab {
                title: "Q3".into(),
                tab_id: 7,
            },
            folder: OutputFolder { id: "out-1".into() },
        }
    }

    fn config(max_attempts: u32) -> RunConfig {
        RunConfig::builder()
            .source_folder_id("src")
            .dest_folder_id("dst")
            .max_attempts(max_attempts)
            .build()
            .unwrap()
    }

    fn no_limit() -> RateLimiter {
        RateLimiter::new(Duration::ZERO)
    }

    #[tokio::test]
    async fn first_valid_export_completes_in_one_attempt() {
        let service = ScriptedService::with_sizes(&[MIN as usize]);
        let result = run_job(&service, &no_limit(), job(), &config(5)).await;

        match result.outcome {
            JobOutcome::Done { byte_size, .. } => assert!(byte_size >= MIN),
            other => panic!("expected Done, got {other:?}"),
        }
        assert_eq!(result.attempts, 1);
        assert_eq!(result.deletes, 0);
        assert_eq!(service.deletes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn k_undersized_then_valid_takes_k_plus_one_attempts() {
        let k = 2;
        let service = ScriptedService::with_sizes(&[100, 200, MIN as usize + 5]);
        let result = run_job(&service, &no_limit(), job(), &config(5)).await;

        assert!(result.outcome.is_done());
        assert_eq!(result.attempts, (k + 1) as u32);
        assert_eq!(result.deletes, k as u32);
        assert_eq!(service.exports.load(Ordering::SeqCst), k + 1);
        assert_eq!(service.deletes.load(Ordering::SeqCst), k);
    }

    #[tokio::test(start_paused = true)]
    async fn one_byte_short_is_deleted_and_retried_once() {
        let service = ScriptedService::with_sizes(&[MIN as usize - 1, MIN as usize]);
        let result = run_job(&service, &no_limit(), job(), &config(5)).await;

        assert!(result.outcome.is_done());
        assert_eq!(result.attempts, 2);
        assert_eq!(result.deletes, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn always_undersized_exhausts_the_attempt_budget() {
        let service = ScriptedService::with_sizes(&[50, 50, 50, 50, 50, 50, 50, 50]);
        let result = run_job(&service, &no_limit(), job(), &config(3)).await;

        match result.outcome {
            JobOutcome::Failed(JobError::RetryExhausted {
                attempts,
                last_size,
                ..
            }) => {
                assert_eq!(attempts, 3);
                assert_eq!(last_size, 50);
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
        assert_eq!(result.attempts, 3);
        assert_eq!(result.deletes, 3);
        assert_eq!(service.exports.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn export_transport_failure_is_contained_in_the_result() {
        let mut service = ScriptedService::with_sizes(&[]);
        service.fail_export = true;
        let result = run_job(&service, &no_limit(), job(), &config(5)).await;

        assert!(matches!(
            result.outcome,
            JobOutcome::Failed(JobError::ExportFailed { attempt: 1, .. })
        ));
        assert_eq!(service.uploads.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn delete_failure_terminates_the_job() {
        let mut service = ScriptedService::with_sizes(&[100]);
        service.fail_delete = true;
        let result = run_job(&service, &no_limit(), job(), &config(5)).await;

        assert!(matches!(
            result.outcome,
            JobOutcome::Failed(JobError::DeleteFailed { .. })
        ));
        // The runt was never successfully deleted, so no delete is counted.
        assert_eq!(result.deletes, 0);
    }

    #[tokio::test]
    async fn artifact_is_named_after_the_tab() {
        let j = job();
        assert_eq!(j.artifact_name(), "Q3.pdf");
    }
}
