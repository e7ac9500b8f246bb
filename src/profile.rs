use crate::api::{Ack, ApiClient};
use crate::error::{Result, ValidationError};
use crate::models::{Connection, Document, User};
use crate::session::{validate_new_password, SessionState};
use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const RECENT_DOCUMENTS: usize = 5;

/// Editable profile fields. `None` leaves the stored value alone.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_media: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    fn validate(&self) -> std::result::Result<(), ValidationError> {
        match &self.name {
            Some(name) if name.trim().is_empty() => Err(ValidationError::MissingField("Name")),
            _ => Ok(()),
        }
    }

    /// Trimmed copy; lawyer-only fields are dropped for clients.
    fn for_user(&self, user: &User) -> Self {
        let mut update = self.clone();
        update.name = update.name.map(|n| n.trim().to_string());
        if !user.is_lawyer() {
            update.degree = None;
            update.college = None;
            update.qualifications = None;
        }
        update
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ActivityItem {
    pub label: String,
    pub at: String,
    /// Not backed by any server record.
    pub mock: bool,
}

/// Everything the profile page shows in one go.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileOverview {
    pub user: User,
    pub recent_activity: Vec<ActivityItem>,
    pub recent_documents: Vec<Document>,
    pub connection_requests: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct DocumentsResponse {
    #[serde(default)]
    documents: Vec<Document>,
}

#[derive(Debug, Deserialize)]
struct ConnectionsResponse {
    #[serde(default)]
    connections: Vec<Connection>,
}

#[derive(Serialize)]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

fn parse_timestamp(ts: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(ts) {
        return Some(dt.with_timezone(&Local));
    }
    NaiveDateTime::parse_from_str(ts, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Local.from_utc_datetime(&naive))
}

/// Activity feed: account creation, if known, and a fabricated last login a
/// few hours back. The login entry is flagged `mock`.
pub fn recent_activity(user: &User, now: DateTime<Local>) -> Vec<ActivityItem> {
    let hours_ago = rand::thread_rng().gen_range(1..=24);
    let mut items = vec![ActivityItem {
        label: "Last login".to_string(),
        at: (now - Duration::hours(hours_ago))
            .format("%Y-%m-%d %H:%M")
            .to_string(),
        mock: true,
    }];
    if let Some(created) = user.created_at.as_deref().and_then(parse_timestamp) {
        items.push(ActivityItem {
            label: "Account created".to_string(),
            at: created.format("%Y-%m-%d %H:%M").to_string(),
            mock: false,
        });
    }
    items
}

/// Profile view and edits for the signed-in user.
pub struct ProfileManager {
    api: ApiClient,
    session: SessionState,
}

impl ProfileManager {
    pub fn new(api: ApiClient, session: SessionState) -> Self {
        Self { api, session }
    }

    pub async fn load_profile(&self) -> Result<User> {
        self.session.require_user()?;
        let resp: UserResponse = self.api.get("/auth/profile").await?;
        self.session.set_user(resp.user.clone());
        Ok(resp.user)
    }

    /// Send the changed fields and adopt the server's copy of the user.
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User> {
        let user = self.session.require_user()?;
        update.validate()?;
        let body = update.for_user(&user);
        let resp: UserResponse = self.api.put("/auth/profile", &body).await.map_err(|e| {
            tracing::error!(user_id = user.id, error = %e, "Profile update failed");
            e
        })?;
        tracing::info!(user_id = resp.user.id, "Profile updated");
        self.session.set_user(resp.user.clone());
        Ok(resp.user)
    }

    /// Checked locally first: every field present, confirmation matching,
    /// minimum length.
    pub async fn change_password(&self, current: &str, new: &str, confirm: &str) -> Result<()> {
        let user = self.session.require_user()?;
        if current.is_empty() {
            return Err(ValidationError::MissingField("Current password").into());
        }
        validate_new_password(new, confirm)?;
        let _: Ack = self
            .api
            .put(
                "/auth/change-password",
                &PasswordChange {
                    current_password: current,
                    new_password: new,
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(user_id = user.id, error = %e, "Password change failed");
                e
            })?;
        tracing::info!(user_id = user.id, "Password changed");
        Ok(())
    }

    pub async fn recent_documents(&self) -> Result<Vec<Document>> {
        let resp: DocumentsResponse = self.api.get("/documents").await?;
        Ok(resp.documents.into_iter().take(RECENT_DOCUMENTS).collect())
    }

    pub async fn connection_requests(&self) -> Result<Vec<Connection>> {
        let resp: ConnectionsResponse = self.api.get("/lawyers/connections").await?;
        Ok(resp.connections)
    }

    /// Profile plus side panels. A failing side panel is logged and shown
    /// empty; only the profile itself is required.
    pub async fn overview(&self) -> Result<ProfileOverview> {
        let user = self.load_profile().await?;
        let (documents, connections) =
            futures::join!(self.recent_documents(), self.connection_requests());
        let recent_documents = documents.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load recent documents");
            Vec::new()
        });
        let connection_requests = connections.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Could not load connection requests");
            Vec::new()
        });
        Ok(ProfileOverview {
            recent_activity: recent_activity(&user, Local::now()),
            user,
            recent_documents,
            connection_requests,
        })
    }
}
