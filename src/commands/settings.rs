use crate::error::AppError;
use crate::AppState;
use std::collections::HashMap;
use tauri::State;

/// Stored settings with the session cookie masked.
#[tauri::command]
pub fn get_settings(state: State<'_, AppState>) -> Result<HashMap<String, String>, AppError> {
    state.db.list_settings()
}

/// Takes effect on next start; the running client keeps its base URL.
#[tauri::command]
pub fn set_setting(state: State<'_, AppState>, key: String, value: String) -> Result<(), AppError> {
    state.db.set_setting(&key, &value)
}

#[tauri::command]
pub fn delete_setting(state: State<'_, AppState>, key: String) -> Result<(), AppError> {
    state.db.delete_setting(&key)
}
