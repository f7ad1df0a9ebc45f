//! Structured results of a conversion run.
//!
//! The reference system only reported failures through logs; here every
//! (document, tab) job settles into a [`JobResult`] and every document into
//! a [`DocumentReport`], so partial failure is inspectable data rather than
//! something to grep for. [`RunOutput::into_result`] is for callers who want
//! "any failure is an error" semantics instead.

use crate::error::{JobError, Sheets2PdfError};
use crate::remote::{OutputFolder, SheetTab, SourceDocument};
use serde::Serialize;
use std::time::Duration;

/// Terminal state of one (document, tab) export job.
#[derive(Debug, Clone, Serialize)]
pub enum JobOutcome {
    /// A validated artifact is in place.
    Done { artifact_id: String, byte_size: u64 },
    /// The job terminated without a valid artifact.
    Failed(JobError),
}

impl JobOutcome {
    pub fn is_done(&self) -> bool {
        matches!(self, JobOutcome::Done { .. })
    }
}

/// One settled export job, with enough counters to audit the retry engine.
#[derive(Debug, Clone, Serialize)]
pub struct JobResult {
    pub document: SourceDocument,
    pub tab: SheetTab,
    /// Export+upload cycles performed (1 when the first artifact was valid).
    pub attempts: u32,
    /// Undersized artifacts deleted along the way.
    pub deletes: u32,
    pub duration_ms: u64,
    pub outcome: JobOutcome,
}

/// Everything that happened for one source document.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentReport {
    pub document: SourceDocument,
    /// The mirrored output folder, when mirroring succeeded.
    pub folder: Option<OutputFolder>,
    /// Whether the folder was freshly created (false when reused or absent).
    pub folder_created: bool,
    /// A document-level failure (mirror or tab enumeration); when set, no
    /// jobs were attempted.
    pub error: Option<JobError>,
    pub jobs: Vec<JobResult>,
}

impl DocumentReport {
    pub fn jobs_done(&self) -> usize {
        self.jobs.iter().filter(|j| j.outcome.is_done()).count()
    }

    pub fn jobs_failed(&self) -> usize {
        self.jobs.len() - self.jobs_done()
    }
}

/// Aggregate counters for one run.
#[derive(Debug, Clone, Serialize)]
pub struct RunStats {
    pub documents: usize,
    /// Documents whose mirror or tab enumeration failed.
    pub documents_failed: usize,
    pub folders_created: usize,
    pub jobs_total: usize,
    pub jobs_done: usize,
    pub jobs_failed: usize,
    pub total_attempts: u64,
    pub total_deletes: u64,
    pub elapsed_ms: u64,
}

impl RunStats {
    pub(crate) fn collect(reports: &[DocumentReport], elapsed: Duration) -> Self {
        let jobs_total = reports.iter().map(|r| r.jobs.len()).sum();
        let jobs_done = reports.iter().map(DocumentReport::jobs_done).sum();
        Self {
            documents: reports.len(),
            documents_failed: reports.iter().filter(|r| r.error.is_some()).count(),
            folders_created: reports.iter().filter(|r| r.folder_created).count(),
            jobs_total,
            jobs_done,
            jobs_failed: jobs_total - jobs_done,
            total_attempts: reports
                .iter()
                .flat_map(|r| &r.jobs)
                .map(|j| u64::from(j.attempts))
                .sum(),
            total_deletes: reports
                .iter()
                .flat_map(|r| &r.jobs)
                .map(|j| u64::from(j.deletes))
                .sum(),
            elapsed_ms: elapsed.as_millis() as u64,
        }
    }
}

/// The full manifest of a run: per-document reports plus aggregates.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutput {
    pub reports: Vec<DocumentReport>,
    pub stats: RunStats,
}

impl RunOutput {
    /// Treat any partial failure as an error.
    ///
    /// Returns `self` unchanged when every document was prepared and every
    /// job completed; otherwise a [`Sheets2PdfError::PartialFailure`]
    /// carrying the counts.
    pub fn into_result(self) -> Result<RunOutput, Sheets2PdfError> {
        if self.stats.jobs_failed == 0 && self.stats.documents_failed == 0 {
            Ok(self)
        } else {
            Err(Sheets2PdfError::PartialFailure {
                failed_jobs: self.stats.jobs_failed,
                failed_documents: self.stats.documents_failed,
                total_jobs: self.stats.jobs_total,
            })
        }
    }

    /// Iterate over every failed job in the run, with its document report.
    pub fn failed_jobs(&self) -> impl Iterator<Item = &JobResult> {
        self.reports
            .iter()
            .flat_map(|r| &r.jobs)
            .filter(|j| !j.outcome.is_done())
    }
}
