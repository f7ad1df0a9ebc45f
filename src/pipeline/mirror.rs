//! Output-folder mirroring.

use crate::config::{FolderPolicy, RunConfig};
use crate::error::JobError;
use crate::remote::{DocumentService, OutputFolder, SourceDocument};
use tracing::debug;

/// A mirrored folder plus whether this run created it.
#[derive(Debug, Clone)]
pub struct Mirror {
    pub folder: OutputFolder,
    pub created: bool,
}

/// Ensure an output folder for `document` exists under the destination root.
///
/// Under the default [`FolderPolicy::AlwaysCreate`] this creates a new
/// folder every run with no uniqueness check, so a re-run produces a second
/// folder with the same name — faithful to the reference system.
/// [`FolderPolicy::ReuseExisting`] looks up `(name, destination root)` first
/// and reuses a match.
pub async fn mirror_folder(
    service: &dyn DocumentService,
    document: &SourceDocument,
    config: &RunConfig,
) -> Result<Mirror, JobError> {
    let as_mirror_error = |detail: String| JobError::MirrorFailed {
        document: document.name.clone(),
        detail,
    };

    if config.folder_policy == FolderPolicy::ReuseExisting {
        let existing = service
            .find_folder(&document.name, &config.dest_folder_id)
            .await
            .map_err(|e| as_mirror_error(e.to_string()))?;
        if let Some(folder) = existing {
            debug!(document = %document.name, folder_id = %folder.id, "reusing output folder");
            return Ok(Mirror {
                folder,
                created: false,
            });
        }
    }

    let folder = service
        .create_folder(&document.name, &config.dest_folder_id)
        .await
        .map_err(|e| as_mirror_error(e.to_string()))?;
    Ok(Mirror {
        folder,
        created: true,
    })
}
