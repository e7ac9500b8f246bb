use crate::api::{Ack, ApiClient, ApiError};
use crate::error::{AppError, Result, ValidationError};
use crate::models::{Category, ChatMessage, ChatSession, MessageMetadata, MessageType};
use crate::session::SessionState;
use chrono::{Local, NaiveDateTime};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};

const SESSION_TITLE_CHARS: usize = 50;

pub const SEND_BUSY_MESSAGE: &str = "Please wait for the assistant to reply.";

struct Formatter {
    bold: Regex,
    italic: Regex,
    legal_ref: Regex,
}

fn formatter() -> &'static Formatter {
    static FORMATTER: OnceLock<Formatter> = OnceLock::new();
    FORMATTER.get_or_init(|| Formatter {
        bold: Regex::new(r"\*\*(.+?)\*\*").expect("bold pattern is valid"),
        italic: Regex::new(r"\*(.+?)\*").expect("italic pattern is valid"),
        legal_ref: Regex::new(r"\b((?:Section|Article) \d+[A-Z]?)").expect("reference pattern is valid"),
    })
}

/// Escape text for insertion into the webview's HTML.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Presentational markup for an assistant reply: `**bold**`, `*italic*`,
/// line breaks, and highlighted "Section N" / "Article N" references.
/// The content is escaped first; only these tags are ever emitted.
pub fn format_message(content: &str) -> String {
    let f = formatter();
    let escaped = escape_html(content);
    let text = f.bold.replace_all(&escaped, "<strong>$1</strong>");
    let text = f.italic.replace_all(&text, "<em>$1</em>");
    let text = f
        .legal_ref
        .replace_all(&text, r#"<span class="legal-reference">$1</span>"#);
    text.replace('\n', "<br>")
}

fn display_time(created_at: Option<&str>) -> String {
    created_at
        .and_then(|ts| NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f").ok())
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| Local::now().format("%H:%M").to_string())
}

/// A message as it is shown: what export reads from.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderedMessage {
    pub sender: &'static str,
    pub message_type: MessageType,
    pub html: String,
    pub text: String,
    pub time: String,
    pub sources: Vec<String>,
}

impl RenderedMessage {
    pub fn from_message(msg: &ChatMessage) -> Self {
        let (sender, html) = match msg.message_type {
            MessageType::User => ("You", escape_html(&msg.content).replace('\n', "<br>")),
            MessageType::Assistant => ("Legal Assistant", format_message(&msg.content)),
        };
        Self {
            sender,
            message_type: msg.message_type,
            html,
            text: msg.content.clone(),
            time: display_time(msg.created_at.as_deref()),
            sources: msg.metadata.sources.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum SessionListView {
    Empty,
    Sessions(Vec<SessionItem>),
    Failed(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct SessionItem {
    pub id: i64,
    pub title: String,
    pub message_count: u32,
    pub updated_at: Option<String>,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuickAnswer {
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SessionsResponse {
    #[serde(default)]
    sessions: Vec<ChatSession>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    session: ChatSession,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    ai_response: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct CategoriesResponse {
    #[serde(default)]
    categories: Vec<Category>,
}

#[derive(Default)]
struct ChatState {
    sessions: Vec<ChatSession>,
    sessions_error: Option<String>,
    current_session: Option<i64>,
    rendered: Vec<RenderedMessage>,
}

struct InFlightGuard<'a>(&'a AtomicBool);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Chat page state: the session list and the active conversation.
pub struct ChatManager {
    api: ApiClient,
    session: SessionState,
    state: Mutex<ChatState>,
    request_in_flight: AtomicBool,
}

impl ChatManager {
    pub fn new(api: ApiClient, session: SessionState) -> Self {
        Self {
            api,
            session,
            state: Mutex::new(ChatState::default()),
            request_in_flight: AtomicBool::new(false),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, ChatState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn current_session(&self) -> Option<i64> {
        self.state().current_session
    }

    pub fn sessions(&self) -> Vec<ChatSession> {
        self.state().sessions.clone()
    }

    pub fn messages(&self) -> Vec<RenderedMessage> {
        self.state().rendered.clone()
    }

    pub fn is_sending(&self) -> bool {
        self.request_in_flight.load(Ordering::SeqCst)
    }

    /// Fetch the session list. A failure empties it and records the error,
    /// so the failure panel replaces any previous list.
    pub async fn load_sessions(&self) -> Result<Vec<ChatSession>> {
        match self.api.get::<SessionsResponse>("/chatbot/sessions").await {
            Ok(resp) => {
                let mut state = self.state();
                state.sessions = resp.sessions.clone();
                state.sessions_error = None;
                Ok(resp.sessions)
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to load chat sessions");
                let mut state = self.state();
                state.sessions.clear();
                state.sessions_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    pub fn render_sessions(&self) -> SessionListView {
        let state = self.state();
        if let Some(err) = &state.sessions_error {
            return SessionListView::Failed(err.clone());
        }
        if state.sessions.is_empty() {
            return SessionListView::Empty;
        }
        SessionListView::Sessions(
            state
                .sessions
                .iter()
                .map(|s| SessionItem {
                    id: s.id,
                    title: s.title.clone(),
                    message_count: s.message_count,
                    updated_at: s.updated_at.clone(),
                    active: state.current_session == Some(s.id),
                })
                .collect(),
        )
    }

    pub async fn create_session(&self, title: Option<&str>) -> Result<ChatSession> {
        self.session.require_user()?;
        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Chat Session {}", Local::now().format("%Y-%m-%d %H:%M")));
        let resp: SessionResponse = self
            .api
            .post("/chatbot/sessions", &serde_json::json!({ "title": title }))
            .await?;
        tracing::info!(session_id = resp.session.id, "Chat session created");
        {
            let mut state = self.state();
            state.current_session = Some(resp.session.id);
            state.rendered.clear();
        }
        self.refresh_sessions().await;
        Ok(resp.session)
    }

    /// Make `id` the active session and load its messages.
    pub async fn select_session(&self, id: i64) -> Result<Vec<RenderedMessage>> {
        let resp: MessagesResponse = self
            .api
            .get(&format!("/chatbot/sessions/{id}/messages"))
            .await
            .map_err(|e| {
                tracing::error!(session_id = id, error = %e, "Failed to load messages");
                e
            })?;
        let rendered: Vec<RenderedMessage> =
            resp.messages.iter().map(RenderedMessage::from_message).collect();
        let mut state = self.state();
        state.current_session = Some(id);
        state.rendered = rendered.clone();
        Ok(rendered)
    }

    /// Start a blank conversation; the session itself is created on first send.
    pub fn new_chat(&self) {
        let mut state = self.state();
        state.current_session = None;
        state.rendered.clear();
    }

    fn append(&self, msg: &ChatMessage) {
        self.state().rendered.push(RenderedMessage::from_message(msg));
    }

    /// Send `content` to the active session, creating one first when none is
    /// selected. The reply is awaited whole and appended.
    pub async fn send_message(&self, content: &str) -> Result<RenderedMessage> {
        let content = content.trim();
        if content.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        self.session.require_user()?;
        if self
            .request_in_flight
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::warn!("Send rejected: a reply is still pending");
            return Err(AppError::Busy(SEND_BUSY_MESSAGE));
        }
        let _guard = InFlightGuard(&self.request_in_flight);

        let session_id = match self.current_session() {
            Some(id) => id,
            None => self.create_session(Some(&session_title_from(content))).await?.id,
        };

        self.append(&ChatMessage {
            id: None,
            session_id: Some(session_id),
            message_type: MessageType::User,
            content: content.to_string(),
            created_at: None,
            metadata: MessageMetadata::default(),
        });

        let result: std::result::Result<ChatReply, ApiError> = self
            .api
            .post(
                &format!("/chatbot/sessions/{session_id}/chat"),
                &serde_json::json!({ "message": content }),
            )
            .await;

        let outcome = match result {
            Ok(reply) => {
                tracing::info!(session_id, "Assistant replied");
                self.append(&reply.ai_response);
                Ok(RenderedMessage::from_message(&reply.ai_response))
            }
            Err(e) => {
                tracing::error!(session_id, error = %e, "Chat request failed");
                // The backend stores an apology when the model is unavailable.
                if let ApiError::Api { body, .. } = &e {
                    if let Some(fallback) = body
                        .get("error_response")
                        .and_then(|v| serde_json::from_value::<ChatMessage>(v.clone()).ok())
                    {
                        self.append(&fallback);
                    }
                }
                Err(e.into())
            }
        };
        self.refresh_sessions().await;
        outcome
    }

    pub async fn delete_session(&self, id: i64) -> Result<()> {
        let _: Ack = self
            .api
            .delete(&format!("/chatbot/sessions/{id}"))
            .await?;
        tracing::info!(session_id = id, "Chat session deleted");
        {
            let mut state = self.state();
            if state.current_session == Some(id) {
                state.current_session = None;
                state.rendered.clear();
            }
        }
        self.refresh_sessions().await;
        Ok(())
    }

    async fn refresh_sessions(&self) {
        if let Err(e) = self.load_sessions().await {
            tracing::warn!(error = %e, "Could not refresh chat sessions");
        }
    }

    pub async fn legal_categories(&self) -> Result<Vec<Category>> {
        let resp: CategoriesResponse = self.api.get("/chatbot/legal-categories").await?;
        Ok(resp.categories)
    }

    /// One-off question outside any session.
    pub async fn quick_question(&self, question: &str) -> Result<QuickAnswer> {
        let question = question.trim();
        if question.is_empty() {
            return Err(ValidationError::EmptyMessage.into());
        }
        let answer: QuickAnswer = self
            .api
            .post(
                "/chatbot/quick-question",
                &serde_json::json!({ "question": question }),
            )
            .await?;
        Ok(answer)
    }

    /// Text transcript of the messages currently shown. Not re-fetched, so it
    /// reflects exactly what the user sees.
    pub fn transcript(&self) -> Result<String> {
        let state = self.state();
        if state.rendered.is_empty() {
            return Err(ValidationError::NothingToExport.into());
        }
        let title = state
            .current_session
            .and_then(|id| state.sessions.iter().find(|s| s.id == id))
            .map(|s| s.title.clone())
            .unwrap_or_else(|| "New conversation".to_string());

        let mut out = String::new();
        out.push_str("Legal Assistant Chat Transcript\n");
        out.push_str(&format!("Session: {title}\n"));
        out.push_str(&format!(
            "Exported: {}\n",
            Local::now().format("%Y-%m-%d %H:%M")
        ));
        out.push_str(&"=".repeat(40));
        out.push_str("\n\n");
        for msg in &state.rendered {
            out.push_str(&format!("[{}] {}:\n{}\n", msg.time, msg.sender, msg.text));
            if !msg.sources.is_empty() {
                out.push_str(&format!("Sources: {}\n", msg.sources.join(", ")));
            }
            out.push('\n');
        }
        Ok(out)
    }

    pub fn export_transcript(&self, dest_dir: &Path) -> Result<PathBuf> {
        let text = self.transcript()?;
        let label = self
            .current_session()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "new".to_string());
        std::fs::create_dir_all(dest_dir)?;
        let path = dest_dir.join(format!(
            "legal-chat-{label}-{}.txt",
            Local::now().format("%Y-%m-%d")
        ));
        std::fs::write(&path, text)?;
        tracing::info!(path = %path.display(), "Transcript exported");
        Ok(path)
    }
}

fn session_title_from(message: &str) -> String {
    let mut title: String = message.chars().take(SESSION_TITLE_CHARS).collect();
    if message.chars().count() > SESSION_TITLE_CHARS {
        title.push_str("...");
    }
    title
}
