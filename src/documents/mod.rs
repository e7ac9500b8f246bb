pub mod validate;

pub use validate::{format_file_size, validate_file, UploadCandidate, MAX_FILE_SIZE};

use crate::api::{Ack, ApiClient, UploadProgress};
use crate::error::{AppError, Result};
use crate::models::{AnalysisStatus, Document};
use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

const SUMMARY_PREVIEW_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct StatusBadge {
    pub label: &'static str,
    pub class: &'static str,
    pub icon: &'static str,
}

pub fn status_badge(status: AnalysisStatus) -> StatusBadge {
    match status {
        AnalysisStatus::Pending => StatusBadge {
            label: "Pending",
            class: "bg-warning",
            icon: "fa-clock",
        },
        AnalysisStatus::Processing => StatusBadge {
            label: "Processing",
            class: "bg-info",
            icon: "fa-spinner fa-spin",
        },
        AnalysisStatus::Completed => StatusBadge {
            label: "Completed",
            class: "bg-success",
            icon: "fa-check-circle",
        },
        AnalysisStatus::Failed => StatusBadge {
            label: "Failed",
            class: "bg-danger",
            icon: "fa-exclamation-triangle",
        },
        AnalysisStatus::Unknown => StatusBadge {
            label: "Unknown",
            class: "bg-secondary",
            icon: "fa-question-circle",
        },
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DocumentCard {
    pub id: i64,
    pub title: String,
    pub summary_preview: Option<String>,
    pub status: AnalysisStatus,
    pub badge: StatusBadge,
    pub size_label: Option<String>,
    pub created_at: Option<String>,
    pub can_reanalyze: bool,
}

impl DocumentCard {
    pub fn from_document(doc: &Document) -> Self {
        let summary_preview = doc.summary.as_deref().map(|s| {
            let mut preview: String = s.chars().take(SUMMARY_PREVIEW_CHARS).collect();
            if s.chars().count() > SUMMARY_PREVIEW_CHARS {
                preview.push_str("...");
            }
            preview
        });
        Self {
            id: doc.id,
            title: doc.display_title().to_string(),
            summary_preview,
            status: doc.analysis_status,
            badge: status_badge(doc.analysis_status),
            size_label: doc.file_size.map(format_file_size),
            created_at: doc.created_at.clone(),
            can_reanalyze: matches!(
                doc.analysis_status,
                AnalysisStatus::Completed | AnalysisStatus::Failed
            ),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum DocumentView {
    /// Nothing uploaded yet, or nothing matched the filter.
    Empty { filtered: bool },
    Cards(Vec<DocumentCard>),
    Failed(String),
}

#[derive(Debug, Clone, Copy, Serialize, Default, PartialEq, Eq)]
pub struct DocumentStats {
    pub total: usize,
    pub pending: usize,
    pub processing: usize,
    pub completed: usize,
    pub failed: usize,
}

/// Case-insensitive match on title or summary, optionally narrowed by status.
pub fn filter_documents(
    documents: &[Document],
    query: &str,
    status: Option<AnalysisStatus>,
) -> Vec<Document> {
    let needle = query.trim().to_lowercase();
    documents
        .iter()
        .filter(|d| status.map_or(true, |s| d.analysis_status == s))
        .filter(|d| {
            needle.is_empty()
                || d.display_title().to_lowercase().contains(&needle)
                || d
                    .summary
                    .as_deref()
                    .is_some_and(|s| s.to_lowercase().contains(&needle))
        })
        .cloned()
        .collect()
}

pub fn document_stats(documents: &[Document]) -> DocumentStats {
    let mut stats = DocumentStats {
        total: documents.len(),
        ..Default::default()
    };
    for doc in documents {
        match doc.analysis_status {
            AnalysisStatus::Pending => stats.pending += 1,
            AnalysisStatus::Processing => stats.processing += 1,
            AnalysisStatus::Completed => stats.completed += 1,
            AnalysisStatus::Failed => stats.failed += 1,
            AnalysisStatus::Unknown => {}
        }
    }
    stats
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct DocumentResponse {
    document: Document,
}

/// Clears the in-flight flag however the upload ends.
struct UploadGuard<'a>(&'a AtomicBool);

impl Drop for UploadGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub const UPLOAD_BUSY_MESSAGE: &str =
    "An upload is already in progress. Please wait for it to finish.";

/// Document page state: the user's documents and the upload pipeline.
pub struct DocumentManager {
    api: ApiClient,
    session: SessionState,
    documents: Mutex<Vec<Document>>,
    last_error: Mutex<Option<String>>,
    upload_in_progress: AtomicBool,
}

impl DocumentManager {
    pub fn new(api: ApiClient, session: SessionState) -> Self {
        Self {
            api,
            session,
            documents: Mutex::new(Vec::new()),
            last_error: Mutex::new(None),
            upload_in_progress: AtomicBool::new(false),
        }
    }

    pub fn is_uploading(&self) -> bool {
        self.upload_in_progress.load(Ordering::SeqCst)
    }

    pub fn documents(&self) -> Vec<Document> {
        self.documents
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.last_error
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn replace_documents(&self, docs: Vec<Document>, error: Option<String>) {
        *self.documents.lock().unwrap_or_else(PoisonError::into_inner) = docs;
        *self.last_error.lock().unwrap_or_else(PoisonError::into_inner) = error;
    }

    /// Re-fetch the authoritative list. On failure the list is emptied so a
    /// stale grid is never shown.
    pub async fn load_documents(&self) -> Result<Vec<Document>> {
        match self.api.get::<DocumentsResponse>("/documents").await {
            Ok(resp) => {
                tracing::debug!(count = resp.documents.len(), "Documents loaded");
                self.replace_documents(resp.documents.clone(), None);
                Ok(resp.documents)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load documents");
                self.replace_documents(Vec::new(), Some(e.to_string()));
                Err(e.into())
            }
        }
    }

    pub fn filter_documents(&self, query: &str) -> Vec<Document> {
        filter_documents(&self.documents(), query, None)
    }

    pub fn stats(&self) -> DocumentStats {
        document_stats(&self.documents())
    }

    pub fn render(&self, query: &str, status: Option<AnalysisStatus>) -> DocumentView {
        if let Some(err) = self.last_error() {
            return DocumentView::Failed(err);
        }
        let docs = filter_documents(&self.documents(), query, status);
        if docs.is_empty() {
            let filtered = !query.trim().is_empty() || status.is_some();
            return DocumentView::Empty { filtered };
        }
        DocumentView::Cards(docs.iter().map(DocumentCard::from_document).collect())
    }

    fn begin_upload(&self) -> Result<UploadGuard<'_>> {
        if self
            .upload_in_progress
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Upload rejected: another upload is in progress");
            return Err(AppError::Busy(UPLOAD_BUSY_MESSAGE));
        }
        Ok(UploadGuard(&self.upload_in_progress))
    }

    /// Validate and upload in-memory bytes. Validation failures and concurrent
    /// attempts never reach the network.
    pub async fn upload<F>(
        &self,
        file: &UploadCandidate,
        bytes: Vec<u8>,
        on_progress: F,
    ) -> Result<Document>
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.session.require_user()?;
        let _guard = self.begin_upload()?;
        validate_file(file)?;
        validate_file(&file.with_size(bytes.len() as u64))?;
        self.send_upload(file, bytes, on_progress).await
    }

    /// Upload a local file. The file is validated from its metadata before
    /// its contents are read.
    pub async fn upload_path<F>(&self, path: &Path, on_progress: F) -> Result<Document>
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        self.session.require_user()?;
        let _guard = self.begin_upload()?;
        let file = UploadCandidate::from_path(path)?;
        validate_file(&file)?;
        let bytes = tokio::fs::read(path).await?;
        // The file may have grown since its metadata was read.
        let file = file.with_size(bytes.len() as u64);
        validate_file(&file)?;
        self.send_upload(&file, bytes, on_progress).await
    }

    async fn send_upload<F>(
        &self,
        file: &UploadCandidate,
        bytes: Vec<u8>,
        on_progress: F,
    ) -> Result<Document>
    where
        F: Fn(UploadProgress) + Send + Sync + 'static,
    {
        let resp: DocumentResponse = self
            .api
            .upload("/documents/upload", &file.name, &file.mime, bytes, on_progress)
            .await
            .map_err(|e| {
                tracing::error!(file = %file.name, error = %e, "Upload failed");
                e
            })?;
        tracing::info!(
            document_id = resp.document.id,
            file = %file.name,
            status = resp.document.analysis_status.as_str(),
            "Document uploaded"
        );
        self.refresh_after_mutation().await;
        Ok(resp.document)
    }

    async fn refresh_after_mutation(&self) {
        if let Err(e) = self.load_documents().await {
            tracing::warn!(error = %e, "Could not refresh documents after change");
        }
    }

    pub async fn get_document(&self, id: i64) -> Result<Document> {
        let resp: DocumentResponse = self.api.get(&format!("/documents/{id}")).await?;
        Ok(resp.document)
    }

    pub async fn delete_document(&self, id: i64) -> Result<()> {
        let _: Ack = self.api.delete(&format!("/documents/{id}")).await?;
        tracing::info!(document_id = id, "Document deleted");
        self.refresh_after_mutation().await;
        Ok(())
    }

    /// Send the document back through the analysis pipeline.
    pub async fn reanalyze(&self, id: i64) -> Result<Document> {
        let resp: DocumentResponse = self
            .api
            .post(&format!("/documents/{id}/analyze"), &serde_json::json!({}))
            .await?;
        tracing::info!(
            document_id = id,
            status = resp.document.analysis_status.as_str(),
            "Document re-analyzed"
        );
        self.refresh_after_mutation().await;
        Ok(resp.document)
    }

    /// Download the original file into `dest_dir`, keeping its uploaded name.
    pub async fn download(&self, id: i64, dest_dir: &Path) -> Result<PathBuf> {
        let doc = self.get_document(id).await?;
        let bytes = self
            .api
            .get_bytes(&format!("/documents/{id}/download"))
            .await?;
        let name = Path::new(doc.display_title())
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| format!("document-{id}").into());
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(name);
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(document_id = id, path = %path.display(), "Document downloaded");
        Ok(path)
    }
}
