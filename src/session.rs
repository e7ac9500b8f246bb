use crate::api::{Ack, ApiClient};
use crate::error::{AppError, Result, ValidationError};
use crate::models::{User, UserType};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, OnceLock, PoisonError, RwLock};

pub const MIN_PASSWORD_LEN: usize = 6;

/// The signed-in user, shared by every manager of one client.
///
/// Cloning hands out another handle to the same record.
#[derive(Debug, Clone, Default)]
pub struct SessionState {
    current: Arc<RwLock<Option<User>>>,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_user(&self) -> Option<User> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn current_user_id(&self) -> Option<i64> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|u| u.id)
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user_id().is_some()
    }

    pub fn set_user(&self, user: User) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(user);
    }

    pub fn clear(&self) {
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub fn require_user(&self) -> Result<User> {
        self.current_user().ok_or(AppError::NotAuthenticated)
    }
}

fn email_pattern() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}

pub fn validate_email(email: &str) -> std::result::Result<(), ValidationError> {
    if email.trim().is_empty() {
        return Err(ValidationError::MissingField("Email"));
    }
    if !email_pattern().is_match(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    Ok(())
}

pub fn validate_new_password(
    password: &str,
    confirm: &str,
) -> std::result::Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::MissingField("Password"));
    }
    if password != confirm {
        return Err(ValidationError::PasswordMismatch);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing, default)]
    pub confirm_password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone_no: Option<String>,
    pub user_type: UserType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degree: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub college: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qualifications: Option<String>,
}

impl RegisterRequest {
    pub fn validate(&self) -> std::result::Result<(), ValidationError> {
        if self.name.trim().is_empty() {
            return Err(ValidationError::MissingField("Name"));
        }
        validate_email(&self.email)?;
        validate_new_password(&self.password, &self.confirm_password)
    }

    /// Lawyer-only fields are dropped for clients, as the backend ignores them.
    fn normalized(&self) -> Self {
        let mut req = self.clone();
        req.name = req.name.trim().to_string();
        req.email = req.email.trim().to_lowercase();
        if req.user_type != UserType::Lawyer {
            req.degree = None;
            req.college = None;
            req.qualifications = None;
        }
        req
    }
}

#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: User,
}

#[derive(Debug, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    authenticated: bool,
    #[serde(default)]
    user: Option<User>,
}

/// Login, registration, logout and session verification.
#[derive(Debug, Clone)]
pub struct AuthManager {
    api: ApiClient,
    session: SessionState,
}

impl AuthManager {
    pub fn new(api: ApiClient, session: SessionState) -> Self {
        Self { api, session }
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Populate the session from the server, as done once on start.
    pub async fn verify(&self) -> Result<Option<User>> {
        let resp: VerifyResponse = self.api.get("/auth/verify").await?;
        match resp.user.filter(|_| resp.authenticated) {
            Some(user) => {
                tracing::debug!(user_id = user.id, "Session verified");
                self.session.set_user(user.clone());
                Ok(Some(user))
            }
            None => {
                self.session.clear();
                Ok(None)
            }
        }
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<User> {
        validate_email(email)?;
        if password.is_empty() {
            return Err(ValidationError::MissingField("Password").into());
        }
        let body = LoginRequest {
            email: email.trim().to_lowercase(),
            password: password.to_string(),
        };
        let resp: AuthResponse = self.api.post("/auth/login", &body).await.map_err(|e| {
            tracing::error!(error = %e, "Login failed");
            e
        })?;
        tracing::info!(user_id = resp.user.id, "Logged in");
        self.session.set_user(resp.user.clone());
        Ok(resp.user)
    }

    pub async fn register(&self, request: &RegisterRequest) -> Result<User> {
        request.validate()?;
        let resp: AuthResponse = self
            .api
            .post("/auth/register", &request.normalized())
            .await?;
        tracing::info!(user_id = resp.user.id, "Registered");
        self.session.set_user(resp.user.clone());
        Ok(resp.user)
    }

    /// Clears the local session even when the server call fails.
    pub async fn logout(&self) -> Result<()> {
        let result: std::result::Result<Ack, _> =
            self.api.post("/auth/logout", &serde_json::json!({})).await;
        self.session.clear();
        match result {
            Ok(_) => {
                tracing::info!("Logged out");
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "Logout request failed; local session cleared");
                Err(e.into())
            }
        }
    }
}
