mod upload;

pub use upload::UploadProgress;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::{Client, Method, Url};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::sync::Arc;

pub const DEFAULT_BASE_URL: &str = "http://localhost:5000/api";

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// Non-2xx status or an envelope with `success: false`.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        body: Value,
    },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid base URL: {0}")]
    BaseUrl(String),
}

impl ApiError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Api { status, .. } => Some(*status),
            ApiError::Http(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl Serialize for ApiError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

/// Envelope with no payload beyond the optional message.
#[derive(Debug, Clone, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: Option<String>,
}

/// Thin JSON client over the legal-services REST backend.
///
/// Every call shares one cookie jar, so a login on one manager authenticates
/// the rest. Responses use the `{success, message?, ...payload}` envelope.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    jar: Arc<Jar>,
}

impl ApiClient {
    pub fn new(base_url: &str) -> Result<Self, ApiError> {
        let base_url = base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url).map_err(|e| ApiError::BaseUrl(format!("{base_url}: {e}")))?;
        let jar = Arc::new(Jar::default());
        let http = Client::builder()
            .cookie_provider(jar.clone())
            .user_agent(concat!("legal-assist/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url,
            jar,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, endpoint: &str) -> String {
        if endpoint.starts_with('/') {
            format!("{}{}", self.base_url, endpoint)
        } else {
            format!("{}/{}", self.base_url, endpoint)
        }
    }

    fn origin(&self) -> Option<Url> {
        Url::parse(&self.base_url).ok()
    }

    /// Cookie header currently held for the API origin, if any.
    pub fn export_cookies(&self) -> Option<String> {
        let url = self.origin()?;
        self.jar
            .cookies(&url)
            .and_then(|v| v.to_str().ok().map(str::to_string))
    }

    /// Restore cookies previously captured with [`ApiClient::export_cookies`].
    pub fn import_cookies(&self, header: &str) {
        let Some(url) = self.origin() else {
            return;
        };
        for pair in header.split(';').map(str::trim).filter(|p| !p.is_empty()) {
            self.jar.add_cookie_str(pair, &url);
        }
    }

    /// Issue a request and decode the envelope into `T`.
    ///
    /// The payload fields sit beside `success`, so `T` is deserialized from the
    /// whole body.
    pub async fn request<T, B>(
        &self,
        method: Method,
        endpoint: &str,
        body: Option<&B>,
    ) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        tracing::debug!(%method, endpoint, "API request");
        let mut req = self.http.request(method, self.url(endpoint));
        if let Some(body) = body {
            req = req.json(body);
        }
        let resp = req.send().await?;
        decode_envelope(resp).await
    }

    pub async fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::GET, endpoint, None).await
    }

    pub async fn post<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::POST, endpoint, Some(body)).await
    }

    pub async fn put<T, B>(&self, endpoint: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.request(Method::PUT, endpoint, Some(body)).await
    }

    pub async fn delete<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.request::<T, Value>(Method::DELETE, endpoint, None).await
    }

    /// Fetch a raw body, e.g. a document download. Error bodies are still
    /// read as envelopes so the server message is kept.
    pub async fn get_bytes(&self, endpoint: &str) -> Result<Vec<u8>, ApiError> {
        tracing::debug!(endpoint, "API download");
        let resp = self.http.get(self.url(endpoint)).send().await?;
        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);
            return Err(api_error(status.as_u16(), body));
        }
        Ok(resp.bytes().await?.to_vec())
    }
}

/// Message used when the server gives none.
fn fallback_message(status: u16) -> String {
    format!("Request failed with status {status}")
}

fn api_error(status: u16, body: Value) -> ApiError {
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| fallback_message(status));
    ApiError::Api {
        status,
        message,
        body,
    }
}

pub(crate) async fn decode_envelope<T: DeserializeOwned>(
    resp: reqwest::Response,
) -> Result<T, ApiError> {
    let status = resp.status();
    let text = resp.text().await?;
    let body: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        match serde_json::from_str(&text) {
            Ok(v) => v,
            Err(e) if status.is_success() => return Err(ApiError::Parse(e.to_string())),
            Err(_) => Value::Null,
        }
    };

    let envelope_ok = body
        .get("success")
        .and_then(Value::as_bool)
        .unwrap_or(true);
    if !status.is_success() || !envelope_ok {
        return Err(api_error(status.as_u16(), body));
    }

    serde_json::from_value(body).map_err(|e| ApiError::Parse(e.to_string()))
}
