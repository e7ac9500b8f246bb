use crate::api::ApiClient;
use crate::error::{AppError, Result, ValidationError};
use crate::models::{Category, Connection, ConnectionStatus, LawyerStats, Pagination, User};
use crate::session::SessionState;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, PoisonError};

/// Pages shown on each side of the current one in the pagination bar.
const PAGE_WINDOW_RADIUS: u32 = 2;

/// Keyword table for tagging lawyers from their free-text credentials.
const SPECIALIZATION_KEYWORDS: &[(&str, &[&str])] = &[
    ("criminal", &["criminal", "bail", "crpc", "ipc", "prosecution"]),
    ("civil", &["civil", "contract", "dispute", "cpc"]),
    ("family", &["family", "divorce", "custody", "matrimonial", "maintenance"]),
    ("corporate", &["corporate", "company", "merger", "compliance", "business"]),
    (
        "intellectual_property",
        &["intellectual property", "patent", "trademark", "copyright"],
    ),
    ("tax", &["tax", "gst", "income tax"]),
    ("labor", &["labor", "labour", "employment", "industrial"]),
    ("real_estate", &["real estate", "property", "land", "rera"]),
];

/// Specialization ids guessed from degree and qualifications. A heuristic
/// only: the backend stores no structured specialization.
pub fn infer_specializations(lawyer: &User) -> Vec<&'static str> {
    let text = [lawyer.degree.as_deref(), lawyer.qualifications.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase();
    if text.is_empty() {
        return Vec::new();
    }
    SPECIALIZATION_KEYWORDS
        .iter()
        .filter(|(_, words)| words.iter().any(|w| text.contains(w)))
        .map(|(id, _)| *id)
        .collect()
}

/// A viewer may request a connection only when none exists yet and they are
/// not looking at their own profile.
pub fn can_connect(
    existing: Option<ConnectionStatus>,
    viewer_id: Option<i64>,
    lawyer_id: i64,
) -> bool {
    existing.is_none() && viewer_id != Some(lawyer_id)
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ExperienceBucket {
    #[serde(rename = "0-5")]
    Junior,
    #[serde(rename = "5-10")]
    Mid,
    #[serde(rename = "10+")]
    Senior,
}

impl ExperienceBucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExperienceBucket::Junior => "0-5",
            ExperienceBucket::Mid => "5-10",
            ExperienceBucket::Senior => "10+",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    Name,
    Experience,
    Connections,
}

impl SortKey {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Experience => "experience",
            SortKey::Connections => "connections",
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct SearchParams {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub specialization: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub experience: Option<ExperienceBucket>,
    #[serde(default)]
    pub sort: Option<SortKey>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub per_page: Option<u32>,
}

impl SearchParams {
    /// Non-empty filters in a fixed order, URL-encoded. Page 1 is implied
    /// and left out.
    pub fn to_query_string(&self) -> String {
        let text = |v: &Option<String>| {
            v.as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        let pairs: [(&str, Option<String>); 7] = [
            ("q", text(&self.query)),
            ("specialization", text(&self.specialization)),
            ("location", text(&self.location)),
            ("experience", self.experience.map(|e| e.as_str().to_string())),
            ("sort", self.sort.map(|s| s.as_str().to_string())),
            ("page", self.page.filter(|p| *p > 1).map(|p| p.to_string())),
            ("per_page", self.per_page.map(|p| p.to_string())),
        ];
        pairs
            .iter()
            .filter_map(|(k, v)| {
                v.as_ref()
                    .map(|v| format!("{k}={}", urlencoding::encode(v)))
            })
            .collect::<Vec<_>>()
            .join("&")
    }

    fn endpoint(&self, path: &str) -> String {
        let qs = self.to_query_string();
        if qs.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{qs}")
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct PageLink {
    pub page: u32,
    pub active: bool,
}

/// Pagination bar built from the server's metadata alone.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PageWindow {
    pub links: Vec<PageLink>,
    pub prev: Option<u32>,
    pub next: Option<u32>,
}

impl PageWindow {
    pub fn from_pagination(p: &Pagination) -> Self {
        let pages = p.pages.max(1);
        let current = p.page.clamp(1, pages);
        let start = current.saturating_sub(PAGE_WINDOW_RADIUS).max(1);
        let end = (current + PAGE_WINDOW_RADIUS).min(pages);
        Self {
            links: (start..=end)
                .map(|page| PageLink {
                    page,
                    active: page == current,
                })
                .collect(),
            prev: (current > 1).then(|| current - 1),
            next: (current < pages).then(|| current + 1),
        }
    }

    pub fn active_page(&self) -> Option<u32> {
        self.links.iter().find(|l| l.active).map(|l| l.page)
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LawyerCard {
    pub lawyer: User,
    pub specializations: Vec<&'static str>,
}

impl LawyerCard {
    fn from_user(lawyer: &User) -> Self {
        Self {
            specializations: infer_specializations(lawyer),
            lawyer: lawyer.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum LawyerView {
    Empty,
    Results {
        cards: Vec<LawyerCard>,
        total: u64,
        window: PageWindow,
    },
    Failed(String),
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LawyerProfile {
    pub lawyer: User,
    pub connection_status: Option<ConnectionStatus>,
    pub specializations: Vec<&'static str>,
    pub can_connect: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionResponse {
    Accepted,
    Declined,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConnectRequest<'a> {
    pub lawyer_id: i64,
    pub case_description: &'a str,
    pub urgent: bool,
}

#[derive(Debug, Deserialize)]
struct LawyerPage {
    #[serde(default)]
    lawyers: Vec<User>,
    pagination: Pagination,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    lawyer: User,
    #[serde(default)]
    connection_status: Option<ConnectionStatus>,
}

#[derive(Debug, Deserialize)]
struct ConnectionResponseBody {
    connection: Connection,
}

#[derive(Debug, Deserialize)]
struct ConnectionsResponse {
    #[serde(default)]
    connections: Vec<Connection>,
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    stats: LawyerStats,
}

#[derive(Debug, Deserialize)]
struct FeaturedResponse {
    #[serde(default)]
    featured_lawyers: Vec<User>,
}

#[derive(Debug, Deserialize)]
struct SpecializationsResponse {
    #[serde(default)]
    specializations: Vec<Category>,
}

#[derive(Default)]
struct SearchState {
    params: SearchParams,
    lawyers: Vec<User>,
    pagination: Option<Pagination>,
    error: Option<String>,
}

/// Lawyer search and the client/lawyer connection workflow.
pub struct LawyerManager {
    api: ApiClient,
    session: SessionState,
    search: Mutex<SearchState>,
    connections: Mutex<Vec<Connection>>,
}

impl LawyerManager {
    pub fn new(api: ApiClient, session: SessionState) -> Self {
        Self {
            api,
            session,
            search: Mutex::new(SearchState::default()),
            connections: Mutex::new(Vec::new()),
        }
    }

    fn search_state(&self) -> std::sync::MutexGuard<'_, SearchState> {
        self.search.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn pagination(&self) -> Option<Pagination> {
        self.search_state().pagination
    }

    pub fn results(&self) -> Vec<User> {
        self.search_state().lawyers.clone()
    }

    pub fn connections(&self) -> Vec<Connection> {
        self.connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Run a search. Results and page counts are whatever the server returns
    /// for the requested page.
    pub async fn search(&self, params: SearchParams) -> Result<Vec<User>> {
        let endpoint = params.endpoint("/lawyers/search");
        match self.api.get::<LawyerPage>(&endpoint).await {
            Ok(page) => {
                tracing::info!(
                    count = page.lawyers.len(),
                    page = page.pagination.page,
                    pages = page.pagination.pages,
                    "Lawyer search complete"
                );
                let mut state = self.search_state();
                state.params = params;
                state.lawyers = page.lawyers.clone();
                state.pagination = Some(page.pagination);
                state.error = None;
                Ok(page.lawyers)
            }
            Err(e) => {
                tracing::error!(error = %e, "Lawyer search failed");
                let mut state = self.search_state();
                state.lawyers.clear();
                state.pagination = None;
                state.error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    /// Repeat the last search on another page.
    pub async fn go_to_page(&self, page: u32) -> Result<Vec<User>> {
        let mut params = self.search_state().params.clone();
        params.page = Some(page);
        self.search(params).await
    }

    pub fn render(&self) -> LawyerView {
        let state = self.search_state();
        if let Some(err) = &state.error {
            return LawyerView::Failed(err.clone());
        }
        match state.pagination {
            Some(p) if !state.lawyers.is_empty() => LawyerView::Results {
                cards: state.lawyers.iter().map(LawyerCard::from_user).collect(),
                total: p.total,
                window: PageWindow::from_pagination(&p),
            },
            _ => LawyerView::Empty,
        }
    }

    pub async fn lawyer_profile(&self, lawyer_id: i64) -> Result<LawyerProfile> {
        let resp: ProfileResponse = self
            .api
            .get(&format!("/lawyers/profile/{lawyer_id}"))
            .await?;
        let viewer = self.session.current_user_id();
        Ok(LawyerProfile {
            specializations: infer_specializations(&resp.lawyer),
            can_connect: can_connect(resp.connection_status, viewer, resp.lawyer.id),
            connection_status: resp.connection_status,
            lawyer: resp.lawyer,
        })
    }

    /// Ask a lawyer to take a case. The case description must not be blank.
    pub async fn connect(
        &self,
        lawyer_id: i64,
        case_description: &str,
        urgent: bool,
    ) -> Result<Connection> {
        let user = self.session.require_user()?;
        let case_description = case_description.trim();
        if case_description.is_empty() {
            return Err(ValidationError::EmptyCaseDescription.into());
        }
        if user.id == lawyer_id {
            return Err(ValidationError::SelfConnection.into());
        }
        let resp: ConnectionResponseBody = self
            .api
            .post(
                "/lawyers/connect",
                &ConnectRequest {
                    lawyer_id,
                    case_description,
                    urgent,
                },
            )
            .await
            .map_err(|e| {
                tracing::error!(lawyer_id, error = %e, "Connection request failed");
                e
            })?;
        tracing::info!(lawyer_id, connection_id = resp.connection.id, "Connection requested");
        self.refresh_connections().await;
        Ok(resp.connection)
    }

    pub async fn load_connections(&self) -> Result<Vec<Connection>> {
        let resp: ConnectionsResponse = self.api.get("/lawyers/connections").await?;
        *self
            .connections
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = resp.connections.clone();
        Ok(resp.connections)
    }

    async fn refresh_connections(&self) {
        if let Err(e) = self.load_connections().await {
            tracing::warn!(error = %e, "Could not refresh connections");
        }
    }

    /// Pending requests addressed to the signed-in lawyer.
    pub fn pending_requests(&self) -> Vec<Connection> {
        let me = self.session.current_user_id();
        self.connections()
            .into_iter()
            .filter(|c| {
                c.connection_status == ConnectionStatus::Pending && Some(c.lawyer_id) == me
            })
            .collect()
    }

    pub async fn respond(
        &self,
        connection_id: i64,
        response: ConnectionResponse,
    ) -> Result<Connection> {
        let user = self.session.require_user()?;
        if !user.is_lawyer() {
            return Err(ValidationError::LawyersOnly.into());
        }
        let resp: ConnectionResponseBody = self
            .api
            .put(
                &format!("/lawyers/connections/{connection_id}/respond"),
                &serde_json::json!({ "response": response }),
            )
            .await?;
        tracing::info!(
            connection_id,
            status = resp.connection.connection_status.as_str(),
            "Connection request answered"
        );
        self.refresh_connections().await;
        Ok(resp.connection)
    }

    pub async fn stats(&self) -> Result<LawyerStats> {
        match self.session.current_user() {
            Some(u) if u.is_lawyer() => {}
            Some(_) => return Err(ValidationError::LawyersOnly.into()),
            None => return Err(AppError::NotAuthenticated),
        }
        let resp: StatsResponse = self.api.get("/lawyers/stats").await?;
        Ok(resp.stats)
    }

    pub async fn featured(&self) -> Result<Vec<User>> {
        let resp: FeaturedResponse = self.api.get("/lawyers/featured").await?;
        Ok(resp.featured_lawyers)
    }

    pub async fn specializations(&self) -> Result<Vec<Category>> {
        let resp: SpecializationsResponse = self.api.get("/lawyers/specializations").await?;
        Ok(resp.specializations)
    }

    /// Public directory listing; returns the page and its metadata.
    pub async fn directory(&self, page: u32, per_page: Option<u32>) -> Result<(Vec<User>, Pagination)> {
        let params = SearchParams {
            page: Some(page),
            per_page,
            ..SearchParams::default()
        };
        let resp: LawyerPage = self.api.get(&params.endpoint("/lawyers/directory")).await?;
        Ok((resp.lawyers, resp.pagination))
    }
}
