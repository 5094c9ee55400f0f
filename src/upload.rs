use bytes::Bytes;
use std::path::Path;
use thiserror::Error;

pub const ACCEPTED_MEDIA_TYPES: [&str; 4] =
    ["audio/mpeg", "audio/wav", "audio/x-wav", "audio/wave"];

/// Largest upload accepted by the client: 20 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 20 * 1024 * 1024;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid file type. Only MP3 and WAV are allowed.")]
    UnsupportedType(String),

    #[error("File too large. Max 20 MB allowed.")]
    TooLarge(u64),
}

/// A file picked by the user, before it is sent anywhere.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    pub name: String,
    pub media_type: String,
    pub bytes: Bytes,
}

impl UploadCandidate {
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: impl Into<Bytes>,
    ) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk. When `media_type` is not given it is guessed
    /// from the extension, falling back to `application/octet-stream`.
    pub async fn from_path(path: &Path, media_type: Option<&str>) -> anyhow::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .ok_or_else(|| anyhow::anyhow!("Path has no file name: {}", path.display()))?;
        let media_type = match media_type {
            Some(media_type) => media_type.to_string(),
            None => mime_guess::from_path(path)
                .first_or_octet_stream()
                .essence_str()
                .to_string(),
        };

        Ok(Self::new(name, media_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Reject anything that is not MP3/WAV or exceeds [`MAX_UPLOAD_BYTES`].
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !is_accepted_media_type(&self.media_type) {
            return Err(ValidationError::UnsupportedType(self.media_type.clone()));
        }
        if self.size() > MAX_UPLOAD_BYTES {
            return Err(ValidationError::TooLarge(self.size()));
        }
        Ok(())
    }
}

/// Compare on the type essence only, so `audio/wav; codecs=1` still matches.
pub fn is_accepted_media_type(media_type: &str) -> bool {
    let essence = media_type.split(';').next().unwrap_or("").trim();
    ACCEPTED_MEDIA_TYPES
        .iter()
        .any(|accepted| accepted.eq_ignore_ascii_case(essence))
}
