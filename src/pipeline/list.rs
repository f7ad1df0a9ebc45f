//! Source-folder enumeration.

use crate::config::RunConfig;
use crate::error::Sheets2PdfError;
use crate::remote::{DocumentService, SourceDocument};
use tracing::{debug, info};

/// List the candidate spreadsheets under the configured source folder.
///
/// A listing failure aborts the whole run — with no document list there is
/// no work to fan out — so this is the one stage whose error propagates as
/// [`Sheets2PdfError::Listing`].
pub async fn list_documents(
    service: &dyn DocumentService,
    config: &RunConfig,
) -> Result<Vec<SourceDocument>, Sheets2PdfError> {
    let documents = service
        .list_spreadsheets(&config.source_folder_id, config.page_size)
        .await
        .map_err(|source| Sheets2PdfError::Listing { source })?;

    if documents.is_empty() {
        info!("no spreadsheets found in the source folder");
    } else {
        info!(count = documents.len(), "found spreadsheets to convert");
        for document in &documents {
            debug!(id = %document.id, name = %document.name, "candidate document");
        }
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RemoteError;
    use crate::remote::{ExportAttempt, OutputFolder, SheetTab};
    use async_trait::async_trait;
    use bytes::Bytes;

    struct StubLister {
        result: Result<Vec<SourceDocument>, ()>,
    }

    #[async_trait]
    impl DocumentService for StubLister {
        async fn list_spreadsheets(
            &self,
            _folder_id: &str,
            _page_size: u32,
        ) -> Result<Vec<SourceDocument>, RemoteError> {
            self.result.clone().map_err(|_| RemoteError::Status {
                status: 403,
                body: "rate limit".into(),
            })
        }
        async fn list_tabs(&self, _id: &str) -> Result<Vec<SheetTab>, RemoteError> {
            unimplemented!()
        }
        async fn find_folder(
            &self,
            _name: &str,
            _parent: &str,
        ) -> Result<Option<OutputFolder>, RemoteError> {
            unimplemented!()
        }
        async fn create_folder(
            &self,
            _name: &str,
            _parent: &str,
        ) -> Result<OutputFolder, RemoteError> {
            unimplemented!()
        }
        async fn export_tab_pdf(&self, _id: &str, _tab: i64) -> Result<Bytes, RemoteError> {
            unimplemented!()
        }
        async fn upload_pdf(
            &self,
            _name: &str,
            _parent: &str,
            _body: Bytes,
        ) -> Result<ExportAttempt, RemoteError> {
            unimplemented!()
        }
        async fn delete_file(&self, _id: &str) -> Result<(), RemoteError> {
            unimplemented!()
        }
    }

    fn config() -> RunConfig {
        RunConfig::builder()
            .source_folder_id("src")
            .dest_folder_id("dst")
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn returns_the_listed_documents() {
        let service = StubLister {
            result: Ok(vec![SourceDocument {
                id: "d1".into(),
                name: "Budget".into(),
            }]),
        };
        let docs = list_documents(&service, &config()).await.unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].name, "Budget");
    }

    #[tokio::test]
    async fn listing_failure_is_fatal() {
        let service = StubLister { result: Err(()) };
        let err = list_documents(&service, &config()).await.unwrap_err();
        assert!(matches!(err, Sheets2PdfError::Listing { .. }));
    }
}
