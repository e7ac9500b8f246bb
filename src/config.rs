//! Runtime configuration: where local state lives and which backend to talk to.
//!
//! The base URL is resolved as `LEGAL_ASSIST_API_URL` > stored `api_base_url`
//! setting > [`DEFAULT_BASE_URL`].

use crate::api::DEFAULT_BASE_URL;
use crate::db::{Database, KEY_API_BASE_URL, KEY_EXPORT_DIR, KEY_PAGE_SIZE};
use crate::error::Result;
use directories::ProjectDirs;
use std::path::PathBuf;

pub const APP_ID: &str = "legal-assist";
pub const API_URL_ENV: &str = "LEGAL_ASSIST_API_URL";
pub const DEFAULT_PAGE_SIZE: u32 = 10;
/// Upper bound the backend applies to `per_page`.
pub const MAX_PAGE_SIZE: u32 = 50;

/// Platform data directory, falling back to the working directory.
pub fn default_data_dir() -> PathBuf {
    match ProjectDirs::from("", "", APP_ID) {
        Some(dirs) => dirs.data_dir().to_path_buf(),
        None => {
            tracing::warn!("Could not determine platform directories, using current directory");
            PathBuf::from(".")
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub export_dir: PathBuf,
    pub page_size: u32,
}

impl AppConfig {
    pub fn load(db: &Database) -> Result<Self> {
        let env_url = std::env::var(API_URL_ENV).ok();
        Self::resolve(db, env_url)
    }

    fn resolve(db: &Database, env_url: Option<String>) -> Result<Self> {
        let api_base_url = match env_url.filter(|v| !v.trim().is_empty()) {
            Some(url) => url,
            None => db
                .get_setting(KEY_API_BASE_URL)?
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        };

        let export_dir = db
            .get_setting(KEY_EXPORT_DIR)?
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));

        let page_size = match db.get_setting(KEY_PAGE_SIZE)? {
            Some(raw) => match raw.parse::<u32>() {
                Ok(n) if n > 0 => n.min(MAX_PAGE_SIZE),
                _ => {
                    tracing::warn!(value = %raw, "Ignoring invalid page_size setting");
                    DEFAULT_PAGE_SIZE
                }
            },
            None => DEFAULT_PAGE_SIZE,
        };

        tracing::debug!(api = %api_base_url, page_size, "Configuration resolved");
        Ok(Self {
            api_base_url,
            export_dir,
            page_size,
        })
    }
}
