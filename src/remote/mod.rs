//! Remote document-service boundary.
//!
//! [`DocumentService`] is the crate's seam to the outside world: everything
//! the pipeline needs from the remote side — listing, tab metadata, folder
//! creation, the PDF export GET, artifact upload and delete — behind one
//! object-safe async trait. [`DriveClient`] is the production implementation
//! against the Google Drive v3 / Sheets v4 REST APIs; tests substitute
//! scripted mocks.
//!
//! Rate limiting is deliberately *not* applied here. The trait exposes raw
//! calls, and the export engine routes the quota-sensitive ones (upload,
//! delete) through the shared [`crate::limiter::RateLimiter`]. Keeping the
//! limiter out of the client preserves the asymmetry of the reference
//! system, where the export GET is unthrottled.

pub mod client;
pub mod types;

pub use client::DriveClient;
pub use types::{ExportAttempt, OutputFolder, SheetTab, SourceDocument};

use crate::error::RemoteError;
use async_trait::async_trait;
use bytes::Bytes;

/// Everything the conversion pipeline needs from the remote service.
///
/// All methods are quota-agnostic: callers decide which of them go through
/// the rate limiter. Implementations must be `Send + Sync` because jobs for
/// many documents run concurrently over one shared instance.
#[async_trait]
pub trait DocumentService: Send + Sync {
    /// List non-trashed spreadsheet documents whose parent is `folder_id`,
    /// projected to id + name, at most `page_size` of them.
    async fn list_spreadsheets(
        &self,
        folder_id: &str,
        page_size: u32,
    ) -> Result<Vec<SourceDocument>, RemoteError>;

    /// List the tabs (title + numeric id) of one spreadsheet document.
    async fn list_tabs(&self, document_id: &str) -> Result<Vec<SheetTab>, RemoteError>;

    /// Find an existing folder named `name` under `parent_id`, if any.
    ///
    /// Only consulted by the `ReuseExisting` folder policy; the default
    /// policy never looks and always creates.
    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<OutputFolder>, RemoteError>;

    /// Create a folder named `name` under `parent_id`.
    async fn create_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<OutputFolder, RemoteError>;

    /// Export one tab of a spreadsheet as PDF and return the raw bytes.
    ///
    /// Every call produces a fresh rendition — the remote endpoint sometimes
    /// returns a truncated body under load, which is exactly why the caller
    /// validates sizes and retries.
    async fn export_tab_pdf(&self, document_id: &str, tab_id: i64) -> Result<Bytes, RemoteError>;

    /// Upload a PDF body as `name` into `parent_id`, returning the created
    /// artifact id and the server-reported byte size.
    async fn upload_pdf(
        &self,
        name: &str,
        parent_id: &str,
        body: Bytes,
    ) -> Result<ExportAttempt, RemoteError>;

    /// Delete an artifact by id.
    async fn delete_file(&self, file_id: &str) -> Result<(), RemoteError>;
}
