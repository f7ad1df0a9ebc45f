//! # sheets2pdf
//!
//! Convert a Google Drive folder of Sheets spreadsheets into per-sheet PDF
//! renditions, mirrored into a destination Drive folder.
//!
//! ## Why this crate?
//!
//! Drive's export endpoint renders one tab at a time and, under load,
//! sometimes returns a truncated placeholder instead of the real rendition.
//! A naive batch script either hammers the API into quota errors or quietly
//! stores broken PDFs. This crate does the batch conversion properly:
//! outbound write traffic is paced through a shared rate limiter, every
//! uploaded artifact is size-validated, undersized artifacts are deleted and
//! re-exported with bounded backoff, and the whole fan-out settles into a
//! structured per-job manifest instead of a log pile.
//!
//! ## Pipeline Overview
//!
//! ```text
//! source folder
//!  │
//!  ├─ 1. List     non-trashed spreadsheets (id + name)
//!  ├─ 2. Mirror   one output folder per document  ─┐ run concurrently,
//!  ├─ 3. Tabs     sheet titles + numeric tab ids  ─┘ joined per document
//!  ├─ 4. Export   per tab: PDF GET → upload → size check → retry
//!  └─ 5. Report   RunOutput { per-document reports, aggregate stats }
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheets2pdf::{run, DriveClient, RunConfig};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = RunConfig::builder()
//!         .source_folder_id("1AbC...sourceFolder")
//!         .dest_folder_id("1AbC...destFolder")
//!         .build()?;
//!
//!     let client = Arc::new(DriveClient::new("ya29.access-token")?);
//!     let output = run(client, &config).await?;
//!     println!(
//!         "{}/{} sheets converted in {} ms",
//!         output.stats.jobs_done, output.stats.jobs_total, output.stats.elapsed_ms
//!     );
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `sheets2pdf` binary (clap + anyhow + tracing-subscriber + indicatif) |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! sheets2pdf = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod auth;
pub mod config;
pub mod error;
pub mod limiter;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod remote;
pub mod run;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use auth::{AuthConfig, AuthProvider, StoredToken};
pub use config::{
    FolderPolicy, RunConfig, RunConfigBuilder, DEFAULT_MIN_DISPATCH_INTERVAL_MS,
    DEFAULT_MIN_VALID_SIZE, DEFAULT_PAGE_SIZE,
};
pub use error::{JobError, RemoteError, Sheets2PdfError};
pub use limiter::RateLimiter;
pub use output::{DocumentReport, JobOutcome, JobResult, RunOutput, RunStats};
pub use progress::{NoopProgressCallback, ProgressCallback, RunProgressCallback};
pub use remote::{
    DocumentService, DriveClient, ExportAttempt, OutputFolder, SheetTab, SourceDocument,
};
pub use run::run;
