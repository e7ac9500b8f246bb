use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserType {
    /// A client seeking legal help. The backend calls this `user`.
    #[default]
    #[serde(rename = "user", alias = "client")]
    Client,
    Lawyer,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct User {
    pub id: i64,
    pub name: String,
    /// Stripped by the backend on public lawyer profiles.
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, alias = "phone")]
    pub phone_no: Option<String>,
    #[serde(default)]
    pub user_type: UserType,
    #[serde(default)]
    pub degree: Option<String>,
    #[serde(default)]
    pub college: Option<String>,
    #[serde(default)]
    pub qualifications: Option<String>,
    #[serde(default)]
    pub social_media: Option<String>,
    #[serde(default)]
    pub profile_pic_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    /// Present on featured listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_count: Option<u32>,
    /// Present on directory listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_connections: Option<u32>,
}

fn default_true() -> bool {
    true
}

impl User {
    pub fn is_lawyer(&self) -> bool {
        self.user_type == UserType::Lawyer
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AnalysisStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
    #[serde(other)]
    Unknown,
}

impl AnalysisStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AnalysisStatus::Pending => "pending",
            AnalysisStatus::Processing => "processing",
            AnalysisStatus::Completed => "completed",
            AnalysisStatus::Failed => "failed",
            AnalysisStatus::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Document {
    pub id: i64,
    #[serde(default)]
    pub filename: String,
    #[serde(default)]
    pub original_filename: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub file_size: Option<u64>,
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default, rename = "processing_status", alias = "analysis_status")]
    pub analysis_status: AnalysisStatus,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_points: Vec<String>,
    #[serde(default, alias = "analysis")]
    pub legal_analysis: Option<String>,
    #[serde(default)]
    pub processed: bool,
    #[serde(default)]
    pub owner_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Document {
    /// Title shown on cards: explicit title, then the uploaded name, then the stored name.
    pub fn display_title(&self) -> &str {
        self.title
            .as_deref()
            .or(self.original_filename.as_deref())
            .unwrap_or(&self.filename)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatSession {
    pub id: i64,
    #[serde(rename = "session_title", alias = "title")]
    pub title: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub message_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    User,
    Assistant,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct MessageMetadata {
    #[serde(default)]
    pub sources: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ChatMessage {
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub session_id: Option<i64>,
    pub message_type: MessageType,
    pub content: String,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub metadata: MessageMetadata,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionStatus {
    #[default]
    Pending,
    Accepted,
    Declined,
}

impl ConnectionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionStatus::Pending => "pending",
            ConnectionStatus::Accepted => "accepted",
            ConnectionStatus::Declined => "declined",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Connection {
    pub id: i64,
    pub client_id: i64,
    pub lawyer_id: i64,
    #[serde(default)]
    pub connection_status: ConnectionStatus,
    #[serde(default)]
    pub case_description: Option<String>,
    #[serde(default)]
    pub urgent: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub client_name: Option<String>,
    #[serde(default)]
    pub lawyer_name: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
    pub total: u64,
    pub pages: u32,
}

/// Legal category or lawyer specialization; both endpoints share this shape.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub examples: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct LawyerStats {
    #[serde(default)]
    pub total_requests: u64,
    #[serde(default)]
    pub pending_requests: u64,
    #[serde(default)]
    pub accepted_connections: u64,
    #[serde(default)]
    pub recent_connections: Vec<Connection>,
}
