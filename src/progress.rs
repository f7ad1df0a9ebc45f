//! Progress-callback trait for run-level and per-job events.
//!
//! Inject an [`Arc<dyn RunProgressCallback>`] via
//! [`crate::config::RunConfigBuilder::progress_callback`] to receive
//! real-time events as the orchestrator fans out across documents and tabs.
//!
//! Callbacks rather than channels keep the integration point least-invasive:
//! callers can forward events to a terminal progress bar, a broadcast
//! channel, or a database row without the library knowing how the host
//! application communicates. The trait is `Send + Sync` because jobs for
//! different documents settle concurrently.

use std::sync::Arc;

/// Called by the orchestrator as the run progresses.
///
/// All methods have default no-op implementations so callers only override
/// what they care about. Document and job events may fire concurrently from
/// different tasks; implementations must synchronise shared mutable state.
pub trait RunProgressCallback: Send + Sync {
    /// Called once after listing, before any document is processed.
    fn on_run_start(&self, total_documents: usize) {
        let _ = total_documents;
    }

    /// Called when a document's folder mirror + tab enumeration begin.
    fn on_document_start(&self, document: &str) {
        let _ = document;
    }

    /// Called when every job of a document has settled (or the document
    /// could not be prepared at all).
    fn on_document_settled(&self, document: &str, jobs_done: usize, jobs_failed: usize) {
        let _ = (document, jobs_done, jobs_failed);
    }

    /// Called when one (document, tab) job completes with a valid artifact.
    fn on_job_done(&self, document: &str, tab: &str, byte_size: u64, attempts: u32) {
        let _ = (document, tab, byte_size, attempts);
    }

    /// Called when one (document, tab) job terminates without a valid
    /// artifact.
    fn on_job_failed(&self, document: &str, tab: &str, error: &str) {
        let _ = (document, tab, error);
    }

    /// Called once after every branch has settled.
    fn on_run_complete(&self, jobs_done: usize, jobs_failed: usize) {
        let _ = (jobs_done, jobs_failed);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl RunProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::RunConfig`].
pub type ProgressCallback = Arc<dyn RunProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingCallback {
        done: AtomicUsize,
        failed: AtomicUsize,
    }

    impl RunProgressCallback for CountingCallback {
        fn on_job_done(&self, _d: &str, _t: &str, _size: u64, _attempts: u32) {
            self.done.fetch_add(1, Ordering::SeqCst);
        }
        fn on_job_failed(&self, _d: &str, _t: &str, _e: &str) {
            self.failed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_run_start(2);
        cb.on_document_start("Budget");
        cb.on_job_done("Budget", "Sheet1", 20_480, 1);
        cb.on_job_failed("Budget", "Sheet2", "export failed");
        cb.on_document_settled("Budget", 1, 1);
        cb.on_run_complete(1, 1);
    }

    #[test]
    fn counting_callback_receives_events() {
        let counting = Arc::new(CountingCallback {
            done: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
        });
        let cb: Arc<dyn RunProgressCallback> = counting.clone();
        cb.on_job_done("a", "t1", 11_000, 1);
        cb.on_job_done("a", "t2", 12_000, 2);
        cb.on_job_failed("b", "t1", "boom");
        assert_eq!(counting.done.load(Ordering::SeqCst), 2);
        assert_eq!(counting.failed.load(Ordering::SeqCst), 1);
    }
}
