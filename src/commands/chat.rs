use crate::chat::{QuickAnswer, RenderedMessage, SessionListView};
use crate::error::AppError;
use crate::models::{Category, ChatSession};
use crate::AppState;
use std::path::PathBuf;
use tauri::State;

#[tauri::command]
pub async fn list_sessions(state: State<'_, AppState>) -> Result<Vec<ChatSession>, AppError> {
    state.chat.load_sessions().await
}

#[tauri::command]
pub fn render_sessions(state: State<'_, AppState>) -> SessionListView {
    state.chat.render_sessions()
}

#[tauri::command]
pub async fn create_session(
    state: State<'_, AppState>,
    title: Option<String>,
) -> Result<ChatSession, AppError> {
    state.chat.create_session(title.as_deref()).await
}

#[tauri::command]
pub async fn select_session(
    state: State<'_, AppState>,
    id: i64,
) -> Result<Vec<RenderedMessage>, AppError> {
    state.chat.select_session(id).await
}

#[tauri::command]
pub fn new_chat(state: State<'_, AppState>) {
    state.chat.new_chat();
}

#[tauri::command]
pub async fn send_message(
    state: State<'_, AppState>,
    content: String,
) -> Result<RenderedMessage, AppError> {
    state.chat.send_message(&content).await
}

#[tauri::command]
pub async fn delete_session(state: State<'_, AppState>, id: i64) -> Result<(), AppError> {
    state.chat.delete_session(id).await
}

#[tauri::command]
pub fn export_transcript(
    state: State<'_, AppState>,
    dest_dir: Option<String>,
) -> Result<String, AppError> {
    let dir = dest_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.export_dir.clone());
    let path = state.chat.export_transcript(&dir)?;
    Ok(path.display().to_string())
}

#[tauri::command]
pub async fn legal_categories(state: State<'_, AppState>) -> Result<Vec<Category>, AppError> {
    state.chat.legal_categories().await
}

#[tauri::command]
pub async fn quick_question(
    state: State<'_, AppState>,
    question: String,
) -> Result<QuickAnswer, AppError> {
    state.chat.quick_question(&question).await
}
