use crate::api::UploadProgress;
use crate::documents::{DocumentStats, DocumentView};
use crate::error::AppError;
use crate::models::{AnalysisStatus, Document};
use crate::AppState;
use serde::Serialize;
use std::path::PathBuf;
use tauri::{Emitter, State};

const UPLOAD_PROGRESS_EVENT: &str = "upload-progress";

#[derive(Clone, Serialize)]
struct UploadProgressEvent {
    file: String,
    sent: u64,
    total: u64,
    percent: u8,
}

impl UploadProgressEvent {
    fn new(file: &str, p: UploadProgress) -> Self {
        Self {
            file: file.to_string(),
            sent: p.sent,
            total: p.total,
            percent: p.percent(),
        }
    }
}

#[tauri::command]
pub async fn list_documents(state: State<'_, AppState>) -> Result<Vec<Document>, AppError> {
    state.documents.load_documents().await
}

/// Cards for the current list; never hits the network.
#[tauri::command]
pub fn render_documents(
    state: State<'_, AppState>,
    query: Option<String>,
    status: Option<AnalysisStatus>,
) -> DocumentView {
    state
        .documents
        .render(query.as_deref().unwrap_or(""), status)
}

#[tauri::command]
pub fn document_stats(state: State<'_, AppState>) -> DocumentStats {
    state.documents.stats()
}

#[tauri::command]
pub async fn upload_document(
    app: tauri::AppHandle,
    state: State<'_, AppState>,
    file_path: String,
) -> Result<Document, AppError> {
    let path = PathBuf::from(&file_path);
    let file = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("unknown")
        .to_string();
    state
        .documents
        .upload_path(&path, move |p: UploadProgress| {
            if let Err(e) = app.emit(UPLOAD_PROGRESS_EVENT, UploadProgressEvent::new(&file, p)) {
                tracing::warn!(file = %file, error = %e, "Failed to emit upload progress");
            }
        })
        .await
}

#[tauri::command]
pub async fn get_document(state: State<'_, AppState>, id: i64) -> Result<Document, AppError> {
    state.documents.get_document(id).await
}

#[tauri::command]
pub async fn delete_document(state: State<'_, AppState>, id: i64) -> Result<(), AppError> {
    state.documents.delete_document(id).await
}

#[tauri::command]
pub async fn reanalyze_document(
    state: State<'_, AppState>,
    id: i64,
) -> Result<Document, AppError> {
    state.documents.reanalyze(id).await
}

#[tauri::command]
pub async fn download_document(
    state: State<'_, AppState>,
    id: i64,
    dest_dir: Option<String>,
) -> Result<String, AppError> {
    let dir = dest_dir
        .map(PathBuf::from)
        .unwrap_or_else(|| state.config.export_dir.clone());
    let path = state.documents.download(id, &dir).await?;
    Ok(path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_event_payload() {
        let event = UploadProgressEvent::new("lease.pdf", UploadProgress { sent: 512, total: 2048 });
        assert_eq!(
            serde_json::to_value(event).unwrap(),
            serde_json::json!({"file": "lease.pdf", "sent": 512, "total": 2048, "percent": 25})
        );
    }
}
