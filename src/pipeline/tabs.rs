//! Per-document sheet-tab enumeration.

use crate::error::JobError;
use crate::remote::{DocumentService, SheetTab, SourceDocument};
use tracing::debug;

/// List the tabs of one spreadsheet document.
///
/// The reference system logged enumeration failures and handed `undefined`
/// downstream, which read as "zero sheets". Here a failure is an explicit
/// per-document [`JobError::TabListFailed`] that the orchestrator records on
/// the document's report; an empty `Vec` genuinely means the document has no
/// tabs.
pub async fn enumerate_tabs(
    service: &dyn DocumentService,
    document: &SourceDocument,
) -> Result<Vec<SheetTab>, JobError> {
    let tabs = service
        .list_tabs(&document.id)
        .await
        .map_err(|e| JobError::TabListFailed {
            document: document.name.clone(),
            detail: e.to_string(),
        })?;
    debug!(document = %document.name, tabs = tabs.len(), "enumerated sheet tabs");
    Ok(tabs)
}
