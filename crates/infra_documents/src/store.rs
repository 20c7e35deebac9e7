//! Invoice artifact storage

use std::path::{Path, PathBuf};

use tracing::debug;

use core_kernel::BillId;

use crate::error::DocumentError;

/// Writes invoice PDFs as `<dir>/<bill_id>.pdf`
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn file_name(bill_id: &BillId) -> String {
        format!("{}.pdf", bill_id)
    }

    pub fn path_for(&self, bill_id: &BillId) -> PathBuf {
        self.dir.join(Self::file_name(bill_id))
    }

    /// Writes the artifact, replacing any earlier copy
    pub async fn write(&self, bill_id: &BillId, bytes: &[u8]) -> Result<PathBuf, DocumentError> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.path_for(bill_id);
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), size = bytes.len(), "Invoice artifact written");
        Ok(path)
    }
}
