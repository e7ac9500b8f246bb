#![allow(dead_code)]

//! In-process stand-in for the legal-services backend.

use axum::extract::{Multipart, Path, Query, RawQuery, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use legal_assist_lib::api::ApiClient;
use legal_assist_lib::session::{AuthManager, SessionState};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

pub const PASSWORD: &str = "secret1";
pub const CLIENT_EMAIL: &str = "asha@example.com";
pub const LAWYER_EMAIL: &str = "mehta@example.com";
pub const CLIENT_ID: i64 = 1;
pub const LAWYER_ID: i64 = 5;

pub const AI_APOLOGY: &str =
    "I'm sorry, I'm having trouble processing your request right now. Please try again later.";

#[derive(Default)]
pub struct Mock {
    pub hits: AtomicUsize,
    pub upload_hits: AtomicUsize,
    pub hold_uploads: AtomicBool,
    pub upload_gate: Notify,
    pub fail_sessions: AtomicBool,
    pub ai_down: AtomicBool,
    pub last_search_query: Mutex<Option<String>>,
    pub chat_bodies: Mutex<Vec<Value>>,
    documents: Mutex<Vec<Value>>,
    files: Mutex<HashMap<i64, Vec<u8>>>,
    sessions: Mutex<Vec<Value>>,
    messages: Mutex<Vec<Value>>,
    connections: Mutex<Vec<Value>>,
    profile_overrides: Mutex<HashMap<i64, Value>>,
    next_id: AtomicI64,
}

impl Mock {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    fn hit(&self) {
        self.hits.fetch_add(1, Ordering::SeqCst);
    }

    fn next_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 100
    }

    pub fn seed_document(&self, title: &str, summary: &str, status: &str) -> i64 {
        let id = self.next_id();
        self.documents.lock().unwrap().insert(
            0,
            json!({
                "id": id,
                "filename": format!("{id}.pdf"),
                "original_filename": title,
                "file_size": 2048,
                "content_type": "application/pdf",
                "summary": summary,
                "key_points": [],
                "processed": status == "completed",
                "processing_status": status,
                "owner_id": CLIENT_ID,
                "created_at": "2024-05-01T10:00:00"
            }),
        );
        id
    }

    pub fn document_count(&self) -> usize {
        self.documents.lock().unwrap().len()
    }
}

fn users() -> Vec<Value> {
    vec![
        json!({
            "id": CLIENT_ID,
            "name": "Asha Rao",
            "email": CLIENT_EMAIL,
            "phone_no": "9810000000",
            "user_type": "user",
            "created_at": "2024-01-10T08:00:00",
            "is_active": true
        }),
        json!({
            "id": LAWYER_ID,
            "name": "Adv. R. Mehta",
            "email": LAWYER_EMAIL,
            "user_type": "lawyer",
            "degree": "LLB",
            "college": "Delhi University",
            "qualifications": "Criminal defence, bail and appeals",
            "created_at": "2023-06-01T08:00:00",
            "is_active": true
        }),
    ]
}

fn user_by_id(mock: &Mock, id: i64) -> Option<Value> {
    let mut user = users().into_iter().find(|u| u["id"] == id)?;
    if let Some(Value::Object(over)) = mock.profile_overrides.lock().unwrap().get(&id) {
        for (k, v) in over {
            user[k] = v.clone();
        }
    }
    Some(user)
}

fn caller(headers: &HeaderMap) -> Option<i64> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|p| p.trim().strip_prefix("session="))
        .find_map(|v| v.parse().ok())
}

fn ok(status: StatusCode, mut body: Value) -> Response {
    body["success"] = json!(true);
    (status, Json(body)).into_response()
}

fn fail(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({"success": false, "message": message}))).into_response()
}

fn logged_in(user: Value) -> Response {
    let cookie = format!("session={}; Path=/; HttpOnly", user["id"]);
    (
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(json!({"success": true, "message": "Login successful", "user": user})),
    )
        .into_response()
}

type Shared = State<Arc<Mock>>;

async fn login(State(mock): Shared, Json(body): Json<Value>) -> Response {
    mock.hit();
    let user = users()
        .into_iter()
        .find(|u| u["email"] == body["email"] && body["password"] == PASSWORD);
    match user {
        Some(user) => logged_in(user),
        None => fail(StatusCode::UNAUTHORIZED, "Invalid email or password"),
    }
}

async fn register(State(mock): Shared, Json(body): Json<Value>) -> Response {
    mock.hit();
    if users().iter().any(|u| u["email"] == body["email"]) {
        return fail(StatusCode::CONFLICT, "Email already registered");
    }
    logged_in(json!({
        "id": 9,
        "name": body["name"],
        "email": body["email"],
        "user_type": body["user_type"],
        "degree": body.get("degree").cloned().unwrap_or(Value::Null),
        "is_active": true
    }))
}

async fn logout(State(mock): Shared) -> Response {
    mock.hit();
    (
        StatusCode::OK,
        [(header::SET_COOKIE, "session=; Path=/; Max-Age=0")],
        Json(json!({"success": true, "message": "Logout successful"})),
    )
        .into_response()
}

async fn verify(State(mock): Shared, headers: HeaderMap) -> Response {
    mock.hit();
    match caller(&headers).and_then(|id| user_by_id(&mock, id)) {
        Some(user) => ok(StatusCode::OK, json!({"authenticated": true, "user": user})),
        None => ok(StatusCode::OK, json!({"authenticated": false})),
    }
}

async fn get_profile(State(mock): Shared, headers: HeaderMap) -> Response {
    mock.hit();
    match caller(&headers).and_then(|id| user_by_id(&mock, id)) {
        Some(user) => ok(StatusCode::OK, json!({"user": user})),
        None => fail(StatusCode::UNAUTHORIZED, "Authentication required"),
    }
}

async fn put_profile(State(mock): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.hit();
    let Some(id) = caller(&headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    mock.profile_overrides.lock().unwrap().insert(id, body);
    let user = user_by_id(&mock, id);
    ok(StatusCode::OK, json!({"message": "Profile updated successfully", "user": user}))
}

async fn change_password(State(mock): Shared, Json(body): Json<Value>) -> Response {
    mock.hit();
    if body["current_password"] != PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Current password is incorrect");
    }
    ok(StatusCode::OK, json!({"message": "Password changed successfully"}))
}

async fn list_documents(State(mock): Shared) -> Response {
    mock.hit();
    let docs = mock.documents.lock().unwrap().clone();
    ok(StatusCode::OK, json!({"documents": docs}))
}

async fn upload(State(mock): Shared, mut multipart: Multipart) -> Response {
    mock.hit();
    mock.upload_hits.fetch_add(1, Ordering::SeqCst);
    if mock.hold_uploads.load(Ordering::SeqCst) {
        mock.upload_gate.notified().await;
    }
    let mut received = None;
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("file") {
            let name = field.file_name().unwrap_or("upload").to_string();
            let mime = field.content_type().unwrap_or("").to_string();
            let bytes = field.bytes().await.unwrap_or_default().to_vec();
            received = Some((name, mime, bytes));
        }
    }
    let Some((name, mime, bytes)) = received else {
        return fail(StatusCode::BAD_REQUEST, "No file provided");
    };
    let id = mock.next_id();
    let doc = json!({
        "id": id,
        "filename": format!("{id}_{name}"),
        "original_filename": name,
        "file_size": bytes.len(),
        "content_type": mime,
        "summary": null,
        "key_points": [],
        "processed": false,
        "processing_status": "processing",
        "owner_id": CLIENT_ID,
        "created_at": "2024-05-02T09:00:00"
    });
    mock.files.lock().unwrap().insert(id, bytes);
    mock.documents.lock().unwrap().insert(0, doc.clone());
    ok(
        StatusCode::CREATED,
        json!({"message": "Document uploaded successfully", "document": doc}),
    )
}

fn find_document(mock: &Mock, id: i64) -> Option<Value> {
    mock.documents
        .lock()
        .unwrap()
        .iter()
        .find(|d| d["id"] == id)
        .cloned()
}

async fn get_document(State(mock): Shared, Path(id): Path<i64>) -> Response {
    mock.hit();
    match find_document(&mock, id) {
        Some(doc) => ok(StatusCode::OK, json!({"document": doc})),
        None => fail(StatusCode::NOT_FOUND, "Document not found"),
    }
}

async fn delete_document(State(mock): Shared, Path(id): Path<i64>) -> Response {
    mock.hit();
    let mut docs = mock.documents.lock().unwrap();
    let before = docs.len();
    docs.retain(|d| d["id"] != id);
    if docs.len() == before {
        return fail(StatusCode::NOT_FOUND, "Document not found");
    }
    ok(StatusCode::OK, json!({"message": "Document deleted successfully"}))
}

async fn analyze_document(State(mock): Shared, Path(id): Path<i64>) -> Response {
    mock.hit();
    let mut docs = mock.documents.lock().unwrap();
    let Some(doc) = docs.iter_mut().find(|d| d["id"] == id) else {
        return fail(StatusCode::NOT_FOUND, "Document not found");
    };
    doc["processing_status"] = json!("completed");
    doc["processed"] = json!(true);
    doc["summary"] = json!("Lease of residential premises for 11 months");
    doc["key_points"] = json!(["Rent due on the 5th", "Two months deposit"]);
    let doc = doc.clone();
    ok(StatusCode::OK, json!({"message": "Document analyzed", "document": doc}))
}

async fn download_document(State(mock): Shared, Path(id): Path<i64>) -> Response {
    mock.hit();
    match mock.files.lock().unwrap().get(&id) {
        Some(bytes) => (StatusCode::OK, bytes.clone()).into_response(),
        None => fail(StatusCode::NOT_FOUND, "File not found"),
    }
}

async fn list_sessions(State(mock): Shared) -> Response {
    mock.hit();
    if mock.fail_sessions.load(Ordering::SeqCst) {
        return fail(StatusCode::INTERNAL_SERVER_ERROR, "Failed to fetch chat sessions");
    }
    let sessions = mock.sessions.lock().unwrap().clone();
    ok(StatusCode::OK, json!({"sessions": sessions}))
}

async fn create_session(State(mock): Shared, Json(body): Json<Value>) -> Response {
    mock.hit();
    let id = mock.next_id();
    let session = json!({
        "id": id,
        "session_title": body["title"],
        "created_at": "2024-05-01T10:00:00",
        "updated_at": "2024-05-01T10:00:00",
        "message_count": 0
    });
    mock.sessions.lock().unwrap().insert(0, session.clone());
    ok(StatusCode::CREATED, json!({"session": session}))
}

async fn session_messages(State(mock): Shared, Path(id): Path<i64>) -> Response {
    mock.hit();
    let session = mock
        .sessions
        .lock()
        .unwrap()
        .iter()
        .find(|s| s["id"] == id)
        .cloned();
    let Some(session) = session else {
        return fail(StatusCode::NOT_FOUND, "Chat session not found");
    };
    let messages: Vec<Value> = mock
        .messages
        .lock()
        .unwrap()
        .iter()
        .filter(|m| m["session_id"] == id)
        .cloned()
        .collect();
    ok(StatusCode::OK, json!({"messages": messages, "session": session}))
}

fn store_message(mock: &Mock, session_id: i64, kind: &str, content: &str, sources: Value) -> Value {
    let msg = json!({
        "id": mock.next_id(),
        "session_id": session_id,
        "message_type": kind,
        "content": content,
        "created_at": "2024-05-01T10:15:00",
        "metadata": {"sources": sources}
    });
    mock.messages.lock().unwrap().push(msg.clone());
    if let Some(s) = mock
        .sessions
        .lock()
        .unwrap()
        .iter_mut()
        .find(|s| s["id"] == session_id)
    {
        let count = s["message_count"].as_u64().unwrap_or(0) + 1;
        s["message_count"] = json!(count);
    }
    msg
}

async fn chat(State(mock): Shared, Path(id): Path<i64>, Json(body): Json<Value>) -> Response {
    mock.hit();
    mock.chat_bodies.lock().unwrap().push(body.clone());
    let content = body["message"].as_str().unwrap_or_default().to_string();
    let user_message = store_message(&mock, id, "user", &content, json!([]));
    if mock.ai_down.load(Ordering::SeqCst) {
        let apology = store_message(&mock, id, "assistant", AI_APOLOGY, json!([]));
        return (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({
                "success": false,
                "message": "AI service temporarily unavailable",
                "user_message": user_message,
                "error_response": apology
            })),
        )
            .into_response();
    }
    let reply = store_message(
        &mock,
        id,
        "assistant",
        "**Bail** may be sought under Section 437 of the CrPC.\nSee also Article 21.",
        json!(["CrPC", "Constitution of India"]),
    );
    ok(
        StatusCode::OK,
        json!({"user_message": user_message, "ai_response": reply}),
    )
}

async fn delete_session(State(mock): Shared, Path(id): Path<i64>) -> Response {
    mock.hit();
    mock.sessions.lock().unwrap().retain(|s| s["id"] != id);
    mock.messages.lock().unwrap().retain(|m| m["session_id"] != id);
    ok(StatusCode::OK, json!({"message": "Chat session deleted successfully"}))
}

async fn legal_categories(State(mock): Shared) -> Response {
    mock.hit();
    ok(
        StatusCode::OK,
        json!({"categories": [
            {"id": "criminal", "name": "Criminal Law", "description": "Offences and bail",
             "examples": ["Bail application", "FIR"]},
            {"id": "family", "name": "Family Law", "description": "Marriage and custody"}
        ]}),
    )
}

async fn quick_question(State(mock): Shared, Json(body): Json<Value>) -> Response {
    mock.hit();
    ok(
        StatusCode::OK,
        json!({
            "question": body["question"],
            "response": "An FIR is a First Information Report.",
            "sources": ["CrPC Section 154"]
        }),
    )
}

fn public_lawyer(id: i64) -> Value {
    json!({
        "id": id,
        "name": format!("Lawyer {id}"),
        "user_type": "lawyer",
        "degree": "LLB",
        "qualifications": "Criminal trials and bail",
        "is_active": true
    })
}

async fn search_lawyers(
    State(mock): Shared,
    RawQuery(raw): RawQuery,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    mock.hit();
    *mock.last_search_query.lock().unwrap() = raw;
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let per_page: u32 = params
        .get("per_page")
        .and_then(|p| p.parse().ok())
        .unwrap_or(10)
        .min(50);
    let total = 25u32;
    let pages = total.div_ceil(per_page);
    let start = (page - 1) * per_page;
    let end = (start + per_page).min(total);
    let lawyers: Vec<Value> = (start..end).map(|i| public_lawyer(1000 + i as i64)).collect();
    ok(
        StatusCode::OK,
        json!({
            "lawyers": lawyers,
            "pagination": {"page": page, "per_page": per_page, "total": total, "pages": pages}
        }),
    )
}

fn connection_for(mock: &Mock, client: i64, lawyer: i64) -> Option<Value> {
    mock.connections
        .lock()
        .unwrap()
        .iter()
        .find(|c| c["client_id"] == client && c["lawyer_id"] == lawyer)
        .cloned()
}

async fn lawyer_profile(State(mock): Shared, headers: HeaderMap, Path(id): Path<i64>) -> Response {
    mock.hit();
    let lawyer = user_by_id(&mock, id).filter(|u| u["user_type"] == "lawyer");
    let Some(mut lawyer) = lawyer else {
        return fail(StatusCode::NOT_FOUND, "Lawyer not found");
    };
    if let Some(fields) = lawyer.as_object_mut() {
        fields.remove("email");
    }
    let me = caller(&headers);
    let status = match me {
        Some(me) if me != id => connection_for(&mock, me, id).map(|c| c["connection_status"].clone()),
        _ => None,
    };
    ok(
        StatusCode::OK,
        json!({"lawyer": lawyer, "connection_status": status}),
    )
}

async fn connect(State(mock): Shared, headers: HeaderMap, Json(body): Json<Value>) -> Response {
    mock.hit();
    let Some(me) = caller(&headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let Some(lawyer_id) = body["lawyer_id"].as_i64() else {
        return fail(StatusCode::BAD_REQUEST, "Lawyer ID is required");
    };
    if lawyer_id == me {
        return fail(StatusCode::BAD_REQUEST, "Cannot connect with yourself");
    }
    if let Some(existing) = connection_for(&mock, me, lawyer_id) {
        let msg = format!(
            "Connection already exists with status: {}",
            existing["connection_status"].as_str().unwrap_or("")
        );
        return fail(StatusCode::CONFLICT, &msg);
    }
    let connection = json!({
        "id": mock.next_id(),
        "client_id": me,
        "lawyer_id": lawyer_id,
        "case_description": body["case_description"],
        "urgent": body["urgent"],
        "connection_status": "pending",
        "created_at": "2024-05-03T12:00:00",
        "client_name": user_by_id(&mock, me).map(|u| u["name"].clone()),
        "lawyer_name": user_by_id(&mock, lawyer_id).map(|u| u["name"].clone())
    });
    mock.connections.lock().unwrap().push(connection.clone());
    ok(
        StatusCode::CREATED,
        json!({"message": "Connection request sent successfully", "connection": connection}),
    )
}

async fn connections(State(mock): Shared, headers: HeaderMap) -> Response {
    mock.hit();
    let Some(me) = caller(&headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let list: Vec<Value> = mock
        .connections
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c["client_id"] == me || c["lawyer_id"] == me)
        .cloned()
        .collect();
    ok(StatusCode::OK, json!({"connections": list}))
}

async fn respond(
    State(mock): Shared,
    headers: HeaderMap,
    Path(id): Path<i64>,
    Json(body): Json<Value>,
) -> Response {
    mock.hit();
    let me = caller(&headers);
    let response = body["response"].as_str().unwrap_or_default().to_string();
    if response != "accepted" && response != "declined" {
        return fail(
            StatusCode::BAD_REQUEST,
            "Response must be either \"accepted\" or \"declined\"",
        );
    }
    let mut conns = mock.connections.lock().unwrap();
    let Some(conn) = conns
        .iter_mut()
        .find(|c| c["id"] == id && Some(c["lawyer_id"].as_i64().unwrap_or(0)) == me)
    else {
        return fail(StatusCode::NOT_FOUND, "Connection request not found");
    };
    if conn["connection_status"] != "pending" {
        return fail(StatusCode::CONFLICT, "Connection already answered");
    }
    conn["connection_status"] = json!(response);
    let conn = conn.clone();
    ok(
        StatusCode::OK,
        json!({"message": format!("Connection request {response}"), "connection": conn}),
    )
}

async fn stats(State(mock): Shared, headers: HeaderMap) -> Response {
    mock.hit();
    let Some(me) = caller(&headers) else {
        return fail(StatusCode::UNAUTHORIZED, "Authentication required");
    };
    let mine: Vec<Value> = mock
        .connections
        .lock()
        .unwrap()
        .iter()
        .filter(|c| c["lawyer_id"] == me)
        .cloned()
        .collect();
    let count = |s: &str| mine.iter().filter(|c| c["connection_status"] == s).count();
    ok(
        StatusCode::OK,
        json!({"stats": {
            "total_requests": mine.len(),
            "pending_requests": count("pending"),
            "accepted_connections": count("accepted"),
            "recent_connections": mine.iter().take(5).collect::<Vec<_>>()
        }}),
    )
}

async fn featured(State(mock): Shared) -> Response {
    mock.hit();
    let mut lawyer = public_lawyer(LAWYER_ID);
    lawyer["connection_count"] = json!(3);
    ok(StatusCode::OK, json!({"featured_lawyers": [lawyer]}))
}

async fn specializations(State(mock): Shared) -> Response {
    mock.hit();
    ok(
        StatusCode::OK,
        json!({"specializations": [
            {"id": "criminal", "name": "Criminal Law", "description": "Criminal defense, prosecution, bail matters"},
            {"id": "tax", "name": "Tax Law", "description": "Income tax, GST, tax planning"}
        ]}),
    )
}

async fn directory(State(mock): Shared, Query(params): Query<HashMap<String, String>>) -> Response {
    mock.hit();
    let page: u32 = params.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let mut lawyer = public_lawyer(LAWYER_ID);
    lawyer["total_connections"] = json!(4);
    ok(
        StatusCode::OK,
        json!({
            "lawyers": [lawyer],
            "pagination": {"page": page, "per_page": 12, "total": 1, "pages": 1}
        }),
    )
}

fn router(mock: Arc<Mock>) -> Router {
    let api = Router::new()
        .route("/auth/login", post(login))
        .route("/auth/register", post(register))
        .route("/auth/logout", post(logout))
        .route("/auth/verify", get(verify))
        .route("/auth/profile", get(get_profile).put(put_profile))
        .route("/auth/change-password", put(change_password))
        .route("/documents", get(list_documents))
        .route("/documents/upload", post(upload))
        .route("/documents/:id", get(get_document).delete(delete_document))
        .route("/documents/:id/analyze", post(analyze_document))
        .route("/documents/:id/download", get(download_document))
        .route("/chatbot/sessions", get(list_sessions).post(create_session))
        .route("/chatbot/sessions/:id", axum::routing::delete(delete_session))
        .route("/chatbot/sessions/:id/messages", get(session_messages))
        .route("/chatbot/sessions/:id/chat", post(chat))
        .route("/chatbot/legal-categories", get(legal_categories))
        .route("/chatbot/quick-question", post(quick_question))
        .route("/lawyers/search", get(search_lawyers))
        .route("/lawyers/profile/:id", get(lawyer_profile))
        .route("/lawyers/connect", post(connect))
        .route("/lawyers/connections", get(connections))
        .route("/lawyers/connections/:id/respond", put(respond))
        .route("/lawyers/stats", get(stats))
        .route("/lawyers/featured", get(featured))
        .route("/lawyers/specializations", get(specializations))
        .route("/lawyers/directory", get(directory));
    Router::new().nest("/api", api).with_state(mock)
}

/// Serve a fresh backend on an ephemeral port; returns its `/api` base URL.
pub async fn spawn_backend() -> (String, Arc<Mock>) {
    let mock = Arc::new(Mock::default());
    let app = router(mock.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("serve app");
    });
    (format!("http://{addr}/api"), mock)
}

/// A separate client (own cookie jar) signed in as `email`.
pub async fn signed_in(base_url: &str, email: &str) -> (ApiClient, SessionState) {
    let api = ApiClient::new(base_url).expect("api client");
    let session = SessionState::new();
    AuthManager::new(api.clone(), session.clone())
        .login(email, PASSWORD)
        .await
        .expect("login");
    (api, session)
}

/// Poll until `cond` holds or a second passes.
pub async fn wait_for(cond: impl Fn() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}
