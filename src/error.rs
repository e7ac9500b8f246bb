use crate::api::ApiError;
use serde::{Serialize, Serializer};

/// Local checks that stop an action before any request is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("File {name} is too large. Maximum size is 50MB.")]
    FileTooLarge { name: String },
    #[error("File {name} is not a supported type. Allowed types: PDF, DOC, DOCX, TXT.")]
    UnsupportedFileType { name: String },
    #[error("{0} is required")]
    MissingField(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,
    #[error("Passwords do not match")]
    PasswordMismatch,
    #[error("Message cannot be empty")]
    EmptyMessage,
    #[error("Please describe your case before sending a request")]
    EmptyCaseDescription,
    #[error("You cannot connect with yourself")]
    SelfConnection,
    #[error("No messages to export")]
    NothingToExport,
    #[error("Access denied. Lawyers only.")]
    LawyersOnly,
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    /// An identical action is already in flight; it is rejected, not queued.
    #[error("{0}")]
    Busy(&'static str),
    #[error("Please log in to continue")]
    NotAuthenticated,
    #[error("Settings error: {0}")]
    Settings(#[from] rusqlite::Error),
    #[error("Unknown setting key: {0}")]
    UnknownSetting(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_too_large_message() {
        let err = ValidationError::FileTooLarge {
            name: "deed.pdf".into(),
        };
        assert_eq!(
            err.to_string(),
            "File deed.pdf is too large. Maximum size is 50MB."
        );
    }

    #[test]
    fn test_app_error_serializes_as_message() {
        let err = AppError::from(ValidationError::MissingField("Email"));
        assert_eq!(
            serde_json::to_string(&err).unwrap(),
            "\"Email is required\""
        );
    }
}
