use crate::error::{AppError, Result};
use rusqlite::{params, Connection};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

pub const DB_FILE_NAME: &str = "legal-assist.db";

pub const KEY_API_BASE_URL: &str = "api_base_url";
pub const KEY_SESSION_COOKIE: &str = "session_cookie";
pub const KEY_EXPORT_DIR: &str = "export_dir";
pub const KEY_PAGE_SIZE: &str = "page_size";

pub const SETTING_KEYS: &[&str] = &[
    KEY_API_BASE_URL,
    KEY_SESSION_COOKIE,
    KEY_EXPORT_DIR,
    KEY_PAGE_SIZE,
];

const SECRET_KEYS: &[&str] = &[KEY_SESSION_COOKIE];

/// Local preferences store. Server entities are never cached here.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn new(app_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(app_dir)?;
        let conn = Connection::open(app_dir.join(DB_FILE_NAME))?;
        Self::with_connection(conn)
    }

    pub fn in_memory() -> Result<Self> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self> {
        let db = Self {
            conn: Mutex::new(conn),
        };
        db.migrate()?;
        Ok(db)
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn migrate(&self) -> Result<()> {
        let conn = self.lock();
        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL,
                updated_at TEXT NOT NULL DEFAULT (datetime('now'))
            );
            ",
        )?;
        Ok(())
    }

    pub fn get_setting(&self, key: &str) -> Result<Option<String>> {
        let conn = self.lock();
        let result = conn.query_row(
            "SELECT value FROM settings WHERE key = ?1",
            params![key],
            |row| row.get(0),
        );
        match result {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        if !SETTING_KEYS.contains(&key) {
            return Err(AppError::UnknownSetting(key.to_string()));
        }
        let conn = self.lock();
        conn.execute(
            "INSERT OR REPLACE INTO settings (key, value, updated_at) VALUES (?1, ?2, datetime('now'))",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn delete_setting(&self, key: &str) -> Result<()> {
        let conn = self.lock();
        conn.execute("DELETE FROM settings WHERE key = ?1", params![key])?;
        Ok(())
    }

    /// All stored settings, with secrets masked for display.
    pub fn list_settings(&self) -> Result<HashMap<String, String>> {
        let mut map = HashMap::new();
        for key in SETTING_KEYS {
            if let Some(value) = self.get_setting(key)? {
                map.insert(key.to_string(), mask_secret(key, &value));
            }
        }
        Ok(map)
    }
}

fn mask_secret(key: &str, value: &str) -> String {
    if !SECRET_KEYS.contains(&key) {
        return value.to_string();
    }
    let chars: Vec<char> = value.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "********".to_string()
    }
}
