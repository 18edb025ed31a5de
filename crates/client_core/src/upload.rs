use std::path::{Path, PathBuf};

use base64::{engine::general_purpose::STANDARD, Engine as _};
use shared::domain::Category;
use thiserror::Error;

pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Please select an image file")]
    NoFile,
    #[error("File size must be less than 10MB")]
    TooLarge { size_bytes: u64 },
    #[error("Invalid file type. Only JPEG, PNG, GIF, and WebP are allowed.")]
    UnsupportedType { mime_type: String },
    #[error("Title is required")]
    MissingTitle,
    #[error("failed to read '{path}': {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectedFile {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SelectedFile {
    /// Wraps in-memory bytes; the MIME type is guessed from the file name.
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        let filename = filename.into();
        let mime_type = mime_guess::from_path(&filename)
            .first_or_octet_stream()
            .essence_str()
            .to_string();
        Self {
            filename,
            mime_type,
            bytes,
        }
    }

    /// Reads and checks a file picked by the user. Oversized files are
    /// rejected from their metadata, before any content is read.
    pub async fn read(path: &Path) -> Result<Self, UploadError> {
        let read_error = |source| UploadError::Read {
            path: path.to_path_buf(),
            source,
        };
        let size_bytes = tokio::fs::metadata(path).await.map_err(read_error)?.len();
        if size_bytes > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge { size_bytes });
        }

        let bytes = tokio::fs::read(path).await.map_err(read_error)?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let file = Self::new(filename, bytes);
        file.check()?;
        Ok(file)
    }

    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// Size first, then type.
    pub fn check(&self) -> Result<(), UploadError> {
        if self.size_bytes() > MAX_UPLOAD_BYTES {
            return Err(UploadError::TooLarge {
                size_bytes: self.size_bytes(),
            });
        }
        if !ALLOWED_MIME_TYPES.contains(&self.mime_type.as_str()) {
            return Err(UploadError::UnsupportedType {
                mime_type: self.mime_type.clone(),
            });
        }
        Ok(())
    }

    /// `name.png (12.50 KB)`
    pub fn describe(&self) -> String {
        format!(
            "{} ({:.2} KB)",
            self.filename,
            self.size_bytes() as f64 / 1024.0
        )
    }

    pub fn preview_data_url(&self) -> String {
        format!(
            "data:{};base64,{}",
            self.mime_type,
            STANDARD.encode(&self.bytes)
        )
    }
}

/// Upload form contents as typed by the user.
#[derive(Debug, Clone, Default)]
pub struct UploadDraft {
    pub file: Option<SelectedFile>,
    pub title: String,
    pub description: String,
    /// Comma separated.
    pub tags: String,
    pub category: Category,
}

impl UploadDraft {
    pub fn validate(self) -> Result<ValidatedUpload, UploadError> {
        let file = self.file.ok_or(UploadError::NoFile)?;
        file.check()?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(UploadError::MissingTitle);
        }

        Ok(ValidatedUpload {
            filename: file.filename,
            mime_type: file.mime_type,
            bytes: file.bytes,
            title: title.to_string(),
            description: self.description.trim().to_string(),
            tags: split_tags(&self.tags),
            category: self.category,
        })
    }
}

pub fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

#[derive(Debug, Clone)]
pub struct ValidatedUpload {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub title: String,
    pub description: String,
    pub tags: Vec<String>,
    pub category: Category,
}

impl ValidatedUpload {
    pub fn tags_field(&self) -> String {
        self.tags.join(",")
    }
}
