use async_trait::async_trait;
use pharmaclear_dashboard::{ReportDocument, ReportSink};
use std::path::PathBuf;

/// Writes reports into a directory on disk
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }
}

#[async_trait]
impl ReportSink for DirectorySink {
    async fn save(&self, document: &ReportDocument) -> std::io::Result<String> {
        tokio::fs::create_dir_all(&self.directory).await?;

        let path = self.directory.join(&document.file_name);
        tokio::fs::write(&path, &document.bytes).await?;

        tracing::debug!("Wrote {} bytes to {}", document.bytes.len(), path.display());
        Ok(path.display().to_string())
    }
}
