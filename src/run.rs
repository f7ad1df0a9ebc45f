//! The orchestrator: list, fan out, settle, report.
//!
//! One run is a two-level structured fan-out. Documents are processed
//! concurrently; within each document the folder mirror and the tab
//! enumeration start together and are joined before any export begins (a
//! tab cannot be exported before its folder exists). Each tab then becomes
//! one export job, and every job across every document shares the single
//! [`RateLimiter`].
//!
//! The join is "wait for all, tolerate partial failure": a failed mirror,
//! tab listing, or job becomes data in the returned [`RunOutput`], never an
//! early abort of sibling branches. Only the initial source-folder listing
//! is fatal.

use crate::config::RunConfig;
use crate::error::Sheets2PdfError;
use crate::limiter::RateLimiter;
use crate::output::{DocumentReport, RunOutput, RunStats};
use crate::pipeline::export::{self, ExportJob};
use crate::pipeline::{list, mirror, tabs};
use crate::remote::{DocumentService, SourceDocument};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};

/// Convert every sheet of every spreadsheet in the source folder.
///
/// This is the primary entry point for the library.
///
/// # Returns
/// `Ok(RunOutput)` once every branch has settled, even if some documents or
/// jobs failed (check `output.stats`). Use [`RunOutput::into_result`] for
/// strict semantics.
///
/// # Errors
/// Returns `Err(Sheets2PdfError)` only when the run cannot start at all —
/// in practice, when listing the source folder fails.
pub async fn run(
    service: Arc<dyn DocumentService>,
    config: &RunConfig,
) -> Result<RunOutput, Sheets2PdfError> {
    let start = Instant::now();
    info!(
        source = %config.source_folder_id,
        dest = %config.dest_folder_id,
        "starting conversion run"
    );

    let documents = list::list_documents(service.as_ref(), config).await?;
    if let Some(cb) = &config.progress_callback {
        cb.on_run_start(documents.len());
    }

    let limiter = Arc::new(RateLimiter::from_millis(config.min_dispatch_interval_ms));

    let reports: Vec<DocumentReport> = stream::iter(documents.into_iter().map(|document| {
        let service = Arc::clone(&service);
        let limiter = Arc::clone(&limiter);
        async move { process_document(service, limiter, document, config).await }
    }))
    .buffer_unordered(config.document_concurrency)
    .collect()
    .await;

    let stats = RunStats::collect(&reports, start.elapsed());
    info!(
        documents = stats.documents,
        jobs_done = stats.jobs_done,
        jobs_failed = stats.jobs_failed,
        elapsed_ms = stats.elapsed_ms,
        "conversion run settled"
    );
    if let Some(cb) = &config.progress_callback {
        cb.on_run_complete(stats.jobs_done, stats.jobs_failed);
    }

    Ok(RunOutput { reports, stats })
}

/// Mirror the folder and enumerate the tabs in parallel, then fan out one
/// export job per tab. Always returns a report; failures stay inside it.
async fn process_document(
    service: Arc<dyn DocumentService>,
    limiter: Arc<RateLimiter>,
    document: SourceDocument,
    config: &RunConfig,
) -> DocumentReport {
    if let Some(cb) = &config.progress_callback {
        cb.on_document_start(&document.name);
    }

    let (mirrored, tab_list) = tokio::join!(
        mirror::mirror_folder(service.as_ref(), &document, config),
        tabs::enumerate_tabs(service.as_ref(), &document),
    );

    let mirrored = match mirrored {
        Ok(m) => m,
        Err(e) => {
            warn!(document = %document.name, error = %e, "document skipped");
            return settle_document(config, document, None, false, Some(e), Vec::new());
        }
    };
    let tab_list = match tab_list {
        Ok(t) => t,
        Err(e) => {
            warn!(document = %document.name, error = %e, "document skipped");
            return settle_document(
                config,
                document,
                Some(mirrored.folder),
                mirrored.created,
                Some(e),
                Vec::new(),
            );
        }
    };

    let jobs = stream::iter(tab_list.into_iter().map(|tab| {
        let service = Arc::clone(&service);
        let limiter = Arc::clone(&limiter);
        let job = ExportJob {
            document: document.clone(),
            tab,
            folder: mirrored.folder.clone(),
        };
        async move {
            let result = export::run_job(service.as_ref(), &limiter, job, config).await;
            if let Some(cb) = &config.progress_callback {
                match &result.outcome {
                    crate::output::JobOutcome::Done { byte_size, .. } => cb.on_job_done(
                        &result.document.name,
                        &result.tab.title,
                        *byte_size,
                        result.attempts,
                    ),
                    crate::output::JobOutcome::Failed(e) => {
                        cb.on_job_failed(&result.document.name, &result.tab.title, &e.to_string())
                    }
                }
            }
            result
        }
    }))
    .buffer_unordered(config.job_concurrency)
    .collect()
    .await;

    settle_document(
        config,
        document,
        Some(mirrored.folder),
        mirrored.created,
        None,
        jobs,
    )
}

fn settle_document(
    config: &RunConfig,
    document: SourceDocument,
    folder: Option<crate::remote::OutputFolder>,
    folder_created: bool,
    error: Option<crate::error::JobError>,
    jobs: Vec<crate::output::JobResult>,
) -> DocumentReport {
    let report = DocumentReport {
        document,
        folder,
        folder_created,
        error,
        jobs,
    };
    if let Some(cb) = &config.progress_callback {
        cb.on_document_settled(&report.document.name, report.jobs_done(), report.jobs_failed());
    }
    report
}
