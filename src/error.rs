//! Error types for the sheets2pdf library.
//!
//! Three layers reflect three distinct failure scopes:
//!
//! * [`Sheets2PdfError`] — **Fatal**: the run cannot proceed at all (no
//!   stored credential, the source-folder listing failed, invalid config).
//!   Returned as `Err(Sheets2PdfError)` from [`crate::run::run`].
//!
//! * [`JobError`] — **Non-fatal**: one document could not be prepared
//!   (folder mirror or tab enumeration failed) or one (document, tab) export
//!   job failed. Stored inside [`crate::output::DocumentReport`] /
//!   [`crate::output::JobResult`] so callers can inspect partial success
//!   rather than losing the whole run to one bad sheet.
//!
//! * [`RemoteError`] — the raw transport layer underneath both: an HTTP
//!   status, a connection failure, or an unparseable response body. Pipeline
//!   stages classify it into one of the above at their boundary.
//!
//! The separation lets callers decide their own tolerance: abort on the
//! first failed job, log and continue, or collect everything for a post-run
//! report via [`crate::output::RunOutput`].

use std::path::PathBuf;
use thiserror::Error;

/// All fatal errors returned by the sheets2pdf library.
///
/// Per-document and per-job failures use [`JobError`] and are stored in the
/// run manifest rather than propagated here.
#[derive(Debug, Error)]
pub enum Sheets2PdfError {
    /// No stored OAuth token was found at the configured path.
    #[error("no stored credential at '{token_path}'\nRun `sheets2pdf auth-url`, authorise in the browser, then `sheets2pdf exchange <CODE>`.")]
    CredentialMissing { token_path: PathBuf },

    /// Listing the source folder failed; with no documents there is no work.
    #[error("failed to list spreadsheets in the source folder")]
    Listing {
        #[source]
        source: RemoteError,
    },

    /// The OAuth code exchange or token decode failed.
    #[error("authorisation failed: {detail}")]
    Auth { detail: String },

    /// Could not read or write the persisted token file.
    #[error("token store I/O failed for '{path}': {source}")]
    TokenStore {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Some jobs or documents failed while others succeeded.
    ///
    /// Returned by [`crate::output::RunOutput::into_result`] when the caller
    /// wants to treat any partial failure as an error.
    #[error("{failed_jobs}/{total_jobs} export jobs failed ({failed_documents} documents could not be prepared)")]
    PartialFailure {
        failed_jobs: usize,
        failed_documents: usize,
        total_jobs: usize,
    },

    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// A non-fatal error scoped to one document or one (document, tab) job.
///
/// Stored in [`crate::output::DocumentReport::error`] for document-level
/// failures and in [`crate::output::JobOutcome::Failed`] for job-level ones.
/// The overall run continues regardless.
#[derive(Debug, Clone, Error, serde::Serialize, serde::Deserialize)]
pub enum JobError {
    /// Creating (or looking up) the document's output folder failed.
    #[error("'{document}': output folder could not be mirrored: {detail}")]
    MirrorFailed { document: String, detail: String },

    /// Fetching the spreadsheet metadata to enumerate its tabs failed.
    #[error("'{document}': tab enumeration failed: {detail}")]
    TabListFailed { document: String, detail: String },

    /// The PDF export GET failed on the given attempt.
    #[error("'{tab}': export request failed on attempt {attempt}: {detail}")]
    ExportFailed {
        tab: String,
        attempt: u32,
        detail: String,
    },

    /// Uploading the exported PDF into the output folder failed.
    #[error("'{tab}': artifact upload failed on attempt {attempt}: {detail}")]
    UploadFailed {
        tab: String,
        attempt: u32,
        detail: String,
    },

    /// Deleting an undersized artifact failed; the runt is left behind.
    #[error("'{tab}': could not delete undersized artifact {artifact_id}: {detail}")]
    DeleteFailed {
        tab: String,
        artifact_id: String,
        detail: String,
    },

    /// Every attempt produced an undersized artifact.
    ///
    /// The remote export endpoint occasionally returns a truncated rendition
    /// under load; after `attempts` tries the job gives up rather than loop
    /// forever. `last_size` is the byte size of the final undersized artifact.
    #[error("'{tab}': export still undersized after {attempts} attempts (last artifact was {last_size} bytes)")]
    RetryExhausted {
        tab: String,
        attempts: u32,
        last_size: u64,
    },
}

/// A failure talking to the remote service.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// The service answered with a non-success HTTP status.
    #[error("remote service returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The request never completed (connection, TLS, timeout).
    #[error("transport error: {0}")]
    Transport(String),

    /// The response arrived but did not have the expected shape.
    #[error("unexpected response shape: {0}")]
    Decode(String),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::Decode(e.to_string())
        } else {
            RemoteError::Transport(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_failure_display() {
        let e = Sheets2PdfError::PartialFailure {
            failed_jobs: 1,
            failed_documents: 0,
            total_jobs: 10,
        };
        let msg = e.to_string();
        assert!(msg.contains("1/10"), "got: {msg}");
    }

    #[test]
    fn retry_exhausted_display() {
        let e = JobError::RetryExhausted {
            tab: "Q3 revenue".into(),
            attempts: 5,
            last_size: 412,
        };
        let msg = e.to_string();
        assert!(msg.contains("Q3 revenue"));
        assert!(msg.contains("5 attempts"));
        assert!(msg.contains("412 bytes"));
    }

    #[test]
    fn credential_missing_mentions_the_fix() {
        let e = Sheets2PdfError::CredentialMissing {
            token_path: PathBuf::from("/tmp/token.json"),
        };
        assert!(e.to_string().contains("auth-url"));
    }

    #[test]
    fn listing_error_carries_source() {
        use std::error::Error as _;
        let e = Sheets2PdfError::Listing {
            source: RemoteError::Status {
                status: 403,
                body: "quota".into(),
            },
        };
        assert!(e.source().is_some());
        assert!(e.source().unwrap().to_string().contains("403"));
    }

    #[test]
    fn job_error_round_trips_through_json() {
        let e = JobError::UploadFailed {
            tab: "Sheet1".into(),
            attempt: 2,
            detail: "HTTP 500".into(),
        };
        let json = serde_json::to_string(&e).unwrap();
        let back: JobError = serde_json::from_str(&json).unwrap();
        assert!(matches!(back, JobError::UploadFailed { attempt: 2, .. }));
    }
}
