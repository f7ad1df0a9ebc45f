//! Domain and wire types for the remote document service.
//!
//! The domain types (`SourceDocument`, `SheetTab`, `OutputFolder`,
//! `ExportAttempt`) are what the pipeline works with; the wire types mirror
//! the Google Drive v3 / Sheets v4 JSON shapes and stay private to this
//! module tree.

use serde::{Deserialize, Serialize};

// ── Domain types ─────────────────────────────────────────────────────────

/// A spreadsheet document discovered under the source folder.
///
/// Immutable once listed; lives for one orchestration run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub id: String,
    pub name: String,
}

/// One tab within a [`SourceDocument`].
///
/// `tab_id` is the authoritative key for export addressing — titles are not
/// guaranteed unique across tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTab {
    pub title: String,
    pub tab_id: i64,
}

/// A remote folder created (or reused) under the destination root, named
/// after its source document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputFolder {
    pub id: String,
}

/// The result of one export-and-upload cycle: the created artifact and the
/// server-reported byte size the validity check runs against.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportAttempt {
    pub artifact_id: String,
    pub byte_size: u64,
}

// ── Drive v3 wire types ──────────────────────────────────────────────────

/// `files.list` response, trimmed to the fields we request.
///
/// See: https://developers.google.com/drive/api/v3/reference/files/list
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileListResponse {
    #[serde(default)]
    pub files: Vec<FileResource>,
}

/// A file resource projected to `id, name`.
#[derive(Debug, Deserialize)]
pub(crate) struct FileResource {
    pub id: String,
    pub name: String,
}

/// `files.create` response when `fields=id,size` is requested.
///
/// Drive reports `size` as a decimal string, and omits it entirely for
/// folders.
#[derive(Debug, Deserialize)]
pub(crate) struct CreatedFileResponse {
    pub id: String,
    #[serde(default)]
    pub size: Option<String>,
}

// ── Sheets v4 wire types ─────────────────────────────────────────────────

/// `spreadsheets.get` response with `fields=sheets.properties(title,sheetId)`.
#[derive(Debug, Deserialize)]
pub(crate) struct SpreadsheetResponse {
    #[serde(default)]
    pub sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SheetEntry {
    pub properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SheetProperties {
    pub title: String,
    pub sheet_id: i64,
}
