//! Configuration for a conversion run.
//!
//! All run behaviour is controlled through [`RunConfig`], built via its
//! [`RunConfigBuilder`]. Keeping every knob in one struct makes it trivial
//! to share the config across concurrent jobs, log it, and diff two runs to
//! understand why their outputs differ. The CLI layer maps environment
//! variables onto the builder; the library itself never reads the
//! environment.

use crate::error::Sheets2PdfError;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Reference minimum interval between quota-sensitive dispatches.
pub const DEFAULT_MIN_DISPATCH_INTERVAL_MS: u64 = 110;

/// An exported sheet smaller than this is treated as a truncated rendition.
pub const DEFAULT_MIN_VALID_SIZE: u64 = 10 * 1024;

/// Reference listing page size.
pub const DEFAULT_PAGE_SIZE: u32 = 30;

/// What to do when the destination already holds a folder with the source
/// document's name.
///
/// The reference system never checks: every run creates a fresh folder, so
/// re-runs duplicate. That stays the default; `ReuseExisting` is the
/// deliberate opt-in for idempotent-ish re-runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FolderPolicy {
    /// Always create a new folder, even when one of that name exists.
    #[default]
    AlwaysCreate,
    /// Look up `(name, destination root)` first and reuse a match.
    ReuseExisting,
}

/// Configuration for one conversion run.
///
/// Built via [`RunConfig::builder()`].
///
/// # Example
/// ```rust
/// use sheets2pdf::RunConfig;
///
/// let config = RunConfig::builder()
///     .source_folder_id("1AbCsourceFolder")
///     .dest_folder_id("1AbCdestFolder")
///     .max_attempts(3)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct RunConfig {
    /// Drive folder id holding the source spreadsheets.
    pub source_folder_id: String,

    /// Drive folder id under which output folders are mirrored.
    pub dest_folder_id: String,

    /// Minimum interval between quota-sensitive dispatches. Default: 110 ms.
    ///
    /// Only the artifact create and delete calls count against the shared
    /// per-user quota; the export GET bypasses the limiter.
    pub min_dispatch_interval_ms: u64,

    /// Minimum artifact byte size to accept an export. Default: 10 KiB.
    ///
    /// The export endpoint occasionally returns a truncated or placeholder
    /// rendition under load; byte size is the cheap proxy for "the export
    /// actually rendered content".
    pub min_valid_size: u64,

    /// Listing page size cap. Default: 30.
    pub page_size: u32,

    /// Maximum export attempts per job before `RetryExhausted`. Default: 5.
    ///
    /// The reference system retried forever; a sheet that always exports
    /// undersized would loop until quota exhaustion. Bounding the attempts
    /// turns that pathology into an inspectable per-job failure.
    pub max_attempts: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s. Backoff keeps N
    /// concurrent retrying jobs from re-hitting an overloaded export
    /// endpoint in lockstep.
    pub retry_backoff_ms: u64,

    /// How many documents are processed concurrently. Default: 4.
    pub document_concurrency: usize,

    /// How many tabs per document are exported concurrently. Default: 8.
    ///
    /// The rate limiter is the real gate on remote write traffic; this knob
    /// only bounds in-flight export downloads and memory for their bodies.
    pub job_concurrency: usize,

    /// Duplicate-folder behaviour on re-runs. Default: [`FolderPolicy::AlwaysCreate`].
    pub folder_policy: FolderPolicy,

    /// Optional progress callback; `None` means no events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            source_folder_id: String::new(),
            dest_folder_id: String::new(),
            min_dispatch_interval_ms: DEFAULT_MIN_DISPATCH_INTERVAL_MS,
            min_valid_size: DEFAULT_MIN_VALID_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            max_attempts: 5,
            retry_backoff_ms: 500,
            document_concurrency: 4,
            job_concurrency: 8,
            folder_policy: FolderPolicy::default(),
            progress_callback: None,
        }
    }
}

impl fmt::Debug for RunConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunConfig")
            .field("source_folder_id", &self.source_folder_id)
            .field("dest_folder_id", &self.dest_folder_id)
            .field("min_dispatch_interval_ms", &self.min_dispatch_interval_ms)
            .field("min_valid_size", &self.min_valid_size)
            .field("page_size", &self.page_size)
            .field("max_attempts", &self.max_attempts)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("document_concurrency", &self.document_concurrency)
            .field("job_concurrency", &self.job_concurrency)
            .field("folder_policy", &self.folder_policy)
            .field(
                "progress_callback",
                &self.progress_callback.as_ref().map(|_| "<dyn RunProgressCallback>"),
            )
            .finish()
    }
}

impl RunConfig {
    /// Create a new builder for `RunConfig`.
    pub fn builder() -> RunConfigBuilder {
        RunConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`RunConfig`].
#[derive(Debug)]
pub struct RunConfigBuilder {
    config: RunConfig,
}

impl RunConfigBuilder {
    pub fn source_folder_id(mut self, id: impl Into<String>) -> Self {
        self.config.source_folder_id = id.into();
        self
    }

    pub fn dest_folder_id(mut self, id: impl Into<String>) -> Self {
        self.config.dest_folder_id = id.into();
        self
    }

    pub fn min_dispatch_interval_ms(mut self, ms: u64) -> Self {
        self.config.min_dispatch_interval_ms = ms;
        self
    }

    pub fn min_valid_size(mut self, bytes: u64) -> Self {
        self.config.min_valid_size = bytes.max(1);
        self
    }

    pub fn page_size(mut self, n: u32) -> Self {
        self.config.page_size = n.clamp(1, 1000);
        self
    }

    pub fn max_attempts(mut self, n: u32) -> Self {
        self.config.max_attempts = n.max(1);
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn document_concurrency(mut self, n: usize) -> Self {
        self.config.document_concurrency = n.max(1);
        self
    }

    pub fn job_concurrency(mut self, n: usize) -> Self {
        self.config.job_concurrency = n.max(1);
        self
    }

    pub fn folder_policy(mut self, policy: FolderPolicy) -> Self {
        self.config.folder_policy = policy;
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<RunConfig, Sheets2PdfError> {
        let c = &self.config;
        if c.source_folder_id.is_empty() {
            return Err(Sheets2PdfError::InvalidConfig(
                "source folder id must not be empty".into(),
            ));
        }
        if c.dest_folder_id.is_empty() {
            return Err(Sheets2PdfError::InvalidConfig(
                "destination folder id must not be empty".into(),
            ));
        }
        if c.max_attempts == 0 {
            return Err(Sheets2PdfError::InvalidConfig(
                "max_attempts must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}
