use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt"];

pub const ALLOWED_MIME_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

/// A file the user picked, described before any bytes are read or sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadCandidate {
    pub name: String,
    pub size: u64,
    pub mime: String,
}

impl UploadCandidate {
    pub fn new(name: impl Into<String>, size: u64, mime: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            size,
            mime: mime.into(),
        }
    }

    /// Describe a local file from its metadata; the MIME type comes from the extension.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let meta = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();
        let mime = mime_for_extension(&extension_of(&name))
            .unwrap_or("application/octet-stream")
            .to_string();
        Ok(Self {
            name,
            size: meta.len(),
            mime,
        })
    }

    /// Same file, described by the number of bytes actually held.
    pub fn with_size(&self, size: u64) -> Self {
        Self {
            size,
            ..self.clone()
        }
    }

    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}

pub fn mime_for_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "pdf" => Some("application/pdf"),
        "doc" => Some("application/msword"),
        "docx" => {
            Some("application/vnd.openxmlformats-officedocument.wordprocessingml.document")
        }
        "txt" => Some("text/plain"),
        _ => None,
    }
}

/// Size first, then type. Either the MIME type or the extension must be allowed,
/// since some pickers report Word files as `application/octet-stream`.
pub fn validate_file(file: &UploadCandidate) -> Result<(), ValidationError> {
    if file.size > MAX_FILE_SIZE {
        return Err(ValidationError::FileTooLarge {
            name: file.name.clone(),
        });
    }
    let mime_ok = ALLOWED_MIME_TYPES.contains(&file.mime.to_lowercase().as_str());
    let ext_ok = ALLOWED_EXTENSIONS.contains(&file.extension().as_str());
    if !mime_ok && !ext_ok {
        return Err(ValidationError::UnsupportedFileType {
            name: file.name.clone(),
        });
    }
    Ok(())
}

/// Human-readable size, e.g. `1.5 KB`.
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];
    if bytes == 0 {
        return "0 Bytes".to_string();
    }
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    format!("{} {}", text, UNITS[unit])
}
