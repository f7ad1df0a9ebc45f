//! Google Drive / Sheets REST client.
//!
//! Implements [`DocumentService`] over plain `reqwest` calls:
//!
//! * Drive v3 (`files.list`, `files.create`, `files.delete`) for listing,
//!   folder mirroring, and artifact lifecycle;
//! * Sheets v4 (`spreadsheets.get`) for tab enumeration;
//! * the docs.google.com export endpoint for the per-tab PDF rendition.
//!
//! The client holds a bearer token that is read-only for the whole run; the
//! OAuth exchange that produced it lives in [`crate::auth`].

use async_trait::async_trait;
use bytes::Bytes;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

use crate::error::RemoteError;
use crate::remote::types::{
    CreatedFileResponse, ExportAttempt, FileListResponse, OutputFolder, SheetTab, SourceDocument,
    SpreadsheetResponse,
};
use crate::remote::DocumentService;

const DRIVE_API_BASE: &str = "https://www.googleapis.com/drive/v3";
const DRIVE_UPLOAD_BASE: &str = "https://www.googleapis.com/upload/drive/v3";
const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4";
const EXPORT_BASE: &str = "https://docs.google.com";

const FOLDER_MIME: &str = "application/vnd.google-apps.folder";
const SPREADSHEET_MIME: &str = "application/vnd.google-apps.spreadsheet";

/// Per-request timeout. Export downloads of dense sheets can take a while;
/// everything else finishes far sooner.
const REQUEST_TIMEOUT_SECS: u64 = 120;

/// How much of an error body to keep in [`RemoteError::Status`]. Google API
/// error payloads front-load the useful part.
const ERROR_BODY_LIMIT: usize = 512;

/// Production [`DocumentService`] over the Google REST APIs.
pub struct DriveClient {
    http: reqwest::Client,
    access_token: String,
}

impl DriveClient {
    /// Create a client around an already-obtained OAuth access token.
    pub fn new(access_token: impl Into<String>) -> Result<Self, RemoteError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(RemoteError::from)?;
        Ok(Self {
            http,
            access_token: access_token.into(),
        })
    }

    /// Reuse an existing `reqwest::Client` (connection pool sharing).
    pub fn with_http(http: reqwest::Client, access_token: impl Into<String>) -> Self {
        Self {
            http,
            access_token: access_token.into(),
        }
    }

    /// Turn a non-success response into [`RemoteError::Status`], keeping a
    /// truncated body for diagnostics.
    async fn check(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let mut body = response.text().await.unwrap_or_default();
        if body.len() > ERROR_BODY_LIMIT {
            body.truncate(ERROR_BODY_LIMIT);
        }
        Err(RemoteError::Status {
            status: status.as_u16(),
            body,
        })
    }

    /// Run a Drive `files.list` query projected to `id, name`.
    async fn list_files(&self, query: &str, page_size: u32) -> Result<Vec<SourceDocument>, RemoteError> {
        let response = self
            .http
            .get(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[
                ("q", query),
                ("pageSize", &page_size.to_string()),
                ("fields", "files(id, name)"),
            ])
            .send()
            .await?;
        let list: FileListResponse = Self::check(response).await?.json().await?;
        Ok(list
            .files
            .into_iter()
            .map(|f| SourceDocument {
                id: f.id,
                name: f.name,
            })
            .collect())
    }
}

#[async_trait]
impl DocumentService for DriveClient {
    async fn list_spreadsheets(
        &self,
        folder_id: &str,
        page_size: u32,
    ) -> Result<Vec<SourceDocument>, RemoteError> {
        let query = format!(
            "'{folder_id}' in parents and mimeType='{SPREADSHEET_MIME}' and trashed=false"
        );
        debug!(folder_id, page_size, "listing source spreadsheets");
        self.list_files(&query, page_size).await
    }

    async fn list_tabs(&self, document_id: &str) -> Result<Vec<SheetTab>, RemoteError> {
        let response = self
            .http
            .get(format!("{SHEETS_API_BASE}/spreadsheets/{document_id}"))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "sheets.properties(title,sheetId)")])
            .send()
            .await?;
        let meta: SpreadsheetResponse = Self::check(response).await?.json().await?;
        Ok(meta
            .sheets
            .into_iter()
            .map(|s| SheetTab {
                title: s.properties.title,
                tab_id: s.properties.sheet_id,
            })
            .collect())
    }

    async fn find_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<Option<OutputFolder>, RemoteError> {
        // Single quotes inside a name would break the query string.
        let escaped = name.replace('\'', "\\'");
        let query = format!(
            "'{parent_id}' in parents and mimeType='{FOLDER_MIME}' and name='{escaped}' and trashed=false"
        );
        let matches = self.list_files(&query, 1).await?;
        Ok(matches.into_iter().next().map(|f| OutputFolder { id: f.id }))
    }

    async fn create_folder(
        &self,
        name: &str,
        parent_id: &str,
    ) -> Result<OutputFolder, RemoteError> {
        let metadata = serde_json::json!({
            "name": name,
            "mimeType": FOLDER_MIME,
            "parents": [parent_id],
        });
        let response = self
            .http
            .post(format!("{DRIVE_API_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[("fields", "id")])
            .json(&metadata)
            .send()
            .await?;
        let created: CreatedFileResponse = Self::check(response).await?.json().await?;
        debug!(name, folder_id = %created.id, "created output folder");
        Ok(OutputFolder { id: created.id })
    }

    async fn export_tab_pdf(&self, document_id: &str, tab_id: i64) -> Result<Bytes, RemoteError> {
        let url = format!(
            "{EXPORT_BASE}/spreadsheets/d/{document_id}/export?exportFormat=pdf&format=pdf&gid={tab_id}"
        );
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        let bytes = Self::check(response).await?.bytes().await?;
        debug!(document_id, tab_id, bytes = bytes.len(), "exported tab PDF");
        Ok(bytes)
    }

    async fn upload_pdf(
        &self,
        name: &str,
        parent_id: &str,
        body: Bytes,
    ) -> Result<ExportAttempt, RemoteError> {
        let metadata = serde_json::json!({
            "name": name,
            "parents": [parent_id],
        });
        let (content_type, payload) = multipart_related(&metadata, &body)
            .map_err(|e| RemoteError::Decode(format!("upload metadata: {e}")))?;

        let response = self
            .http
            .post(format!("{DRIVE_UPLOAD_BASE}/files"))
            .bearer_auth(&self.access_token)
            .query(&[("uploadType", "multipart"), ("fields", "id, size")])
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(payload)
            .send()
            .await?;
        let created: CreatedFileResponse = Self::check(response).await?.json().await?;

        let byte_size = created
            .size
            .as_deref()
            .ok_or_else(|| RemoteError::Decode("create response missing size".into()))?
            .parse::<u64>()
            .map_err(|e| RemoteError::Decode(format!("unparseable artifact size: {e}")))?;

        Ok(ExportAttempt {
            artifact_id: created.id,
            byte_size,
        })
    }

    async fn delete_file(&self, file_id: &str) -> Result<(), RemoteError> {
        let response = self
            .http
            .delete(format!("{DRIVE_API_BASE}/files/{file_id}"))
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Assemble a `multipart/related` upload body: a JSON metadata part followed
/// by the PDF media part, per the Drive multipart-upload protocol.
///
/// The boundary is derived from the current clock so a PDF body containing
/// the literal marker is vanishingly unlikely.
fn multipart_related(
    metadata: &serde_json::Value,
    media: &[u8],
) -> Result<(String, Vec<u8>), serde_json::Error> {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    let boundary = format!("sheets2pdf-{nanos:x}");

    let meta_json = serde_json::to_vec(metadata)?;
    let mut payload = Vec::with_capacity(media.len() + meta_json.len() + 256);
    payload.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    payload.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    payload.extend_from_slice(&meta_json);
    payload.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    payload.extend_from_slice(b"Content-Type: application/pdf\r\n\r\n");
    payload.extend_from_slice(media);
    payload.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

    let content_type = format!("multipart/related; boundary={boundary}");
    Ok((content_type, payload))
}
