use axum::extract::Multipart;
use axum::extract::multipart::MultipartError;
use std::path::Path;
use tempfile::TempPath;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Form field the uploaded file is expected under.
pub const FILE_FIELD: &str = "file";

#[derive(Debug, Error)]
pub enum ReceiveError {
    #[error("{0}")]
    Multipart(#[from] MultipartError),

    #[error("Failed to store upload: {0}")]
    Io(#[from] std::io::Error),
}

/// An uploaded file spooled to disk for the duration of one request.
///
/// The file is removed when the upload is dropped, including when the
/// request future is cancelled mid-flight.
#[derive(Debug)]
pub struct TempUpload {
    pub path: TempPath,
    pub original_name: String,
    pub content_type: Option<String>,
    pub size: u64,
}

impl TempUpload {
    /// Spool the first `file` field to a fresh `uploads_dir/upload-*` file.
    ///
    /// Returns `Ok(None)` when the form carries no file. A partially written
    /// file is removed before an error is returned.
    pub async fn receive(
        multipart: &mut Multipart,
        uploads_dir: &Path,
    ) -> Result<Option<Self>, ReceiveError> {
        while let Some(mut field) = multipart.next_field().await? {
            if field.name() != Some(FILE_FIELD) {
                continue;
            }
            // A plain text field named `file` is not an upload
            let Some(original_name) = field.file_name().map(str::to_string) else {
                continue;
            };
            let content_type = field.content_type().map(str::to_string);

            let (file, path) = tempfile::Builder::new()
                .prefix("upload-")
                .tempfile_in(uploads_dir)?
                .into_parts();
            let mut file = tokio::fs::File::from_std(file);
            let mut size = 0u64;

            // `path` is dropped on any early return, which deletes the file
            while let Some(chunk) = field.chunk().await? {
                file.write_all(&chunk).await?;
                size += chunk.len() as u64;
            }
            file.flush().await?;

            debug!(%original_name, size, path = %path.display(), "Upload stored");
            return Ok(Some(Self {
                path,
                original_name,
                content_type,
                size,
            }));
        }

        Ok(None)
    }

    /// Remove the spooled file. Failures are logged and otherwise ignored.
    pub fn discard(self) {
        let path = self.path.to_path_buf();
        if let Err(error) = self.path.close() {
            warn!(path = %path.display(), %error, "Failed to remove upload");
        }
    }
}
