mod common;

use common::{signed_in, spawn_backend, AI_APOLOGY, CLIENT_EMAIL};
use legal_assist_lib::chat::{ChatManager, SessionListView};
use legal_assist_lib::error::AppError;
use legal_assist_lib::models::MessageType;
use pretty_assertions::assert_eq;
use std::sync::atomic::Ordering;
use std::sync::Arc;

async fn manager() -> (ChatManager, Arc<common::Mock>) {
    let (base, mock) = spawn_backend().await;
    let (api, session) = signed_in(&base, CLIENT_EMAIL).await;
    (ChatManager::new(api, session), mock)
}

#[tokio::test]
async fn first_message_creates_a_session() {
    let (chat, mock) = manager().await;
    assert_eq!(chat.current_session(), None);

    let question = "What are my options for bail after an arrest for a non-bailable offence in Delhi?";
    let reply = chat.send_message(question).await.unwrap();

    let session_id = chat.current_session().expect("session created");
    let sessions = chat.sessions();
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0].id, session_id);
    assert_eq!(
        sessions[0].title,
        format!("{}...", question.chars().take(50).collect::<String>())
    );
    assert_eq!(sessions[0].message_count, 2);

    assert_eq!(reply.message_type, MessageType::Assistant);
    assert!(reply.html.starts_with("<strong>Bail</strong>"));
    assert!(reply
        .html
        .contains(r#"<span class="legal-reference">Section 437</span>"#));
    assert_eq!(reply.sources, vec!["CrPC", "Constitution of India"]);

    let shown = chat.messages();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[0].sender, "You");
    assert_eq!(shown[0].text, question);

    let bodies = mock.chat_bodies.lock().unwrap().clone();
    assert_eq!(bodies, vec![serde_json::json!({"message": question})]);
}

#[tokio::test]
async fn unavailable_assistant_appends_server_fallback() {
    let (chat, mock) = manager().await;
    mock.ai_down.store(true, Ordering::SeqCst);

    let err = chat.send_message("Is a verbal contract valid?").await.unwrap_err();
    match &err {
        AppError::Api(api) => assert_eq!(api.status(), Some(503)),
        other => panic!("unexpected error {other:?}"),
    }
    assert_eq!(err.to_string(), "AI service temporarily unavailable");

    let shown = chat.messages();
    assert_eq!(shown.len(), 2);
    assert_eq!(shown[1].sender, "Legal Assistant");
    assert_eq!(shown[1].text, AI_APOLOGY);
    assert!(!chat.is_sending());
}

#[tokio::test]
async fn history_export_and_delete() {
    let (chat, _mock) = manager().await;
    let session = chat.create_session(Some("Tenancy questions")).await.unwrap();
    chat.send_message("Can my landlord keep the deposit?").await.unwrap();

    chat.new_chat();
    assert!(chat.messages().is_empty());

    let history = chat.select_session(session.id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].time, "10:15");

    let dir = tempfile::tempdir().unwrap();
    let path = chat.export_transcript(dir.path()).unwrap();
    let name = path.file_name().unwrap().to_str().unwrap().to_string();
    assert!(name.starts_with(&format!("legal-chat-{}-", session.id)));
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.contains("Session: Tenancy questions"));
    assert!(text.contains("[10:15] You:\nCan my landlord keep the deposit?"));
    assert!(text.contains("Sources: CrPC, Constitution of India"));

    chat.delete_session(session.id).await.unwrap();
    assert_eq!(chat.current_session(), None);
    assert!(chat.sessions().is_empty());
    assert!(matches!(chat.render_sessions(), SessionListView::Empty));
}

#[tokio::test]
async fn failed_session_list_replaces_previous_list() {
    let (chat, mock) = manager().await;
    chat.create_session(Some("Property")).await.unwrap();
    assert_eq!(chat.sessions().len(), 1);

    mock.fail_sessions.store(true, Ordering::SeqCst);
    let err = chat.load_sessions().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to fetch chat sessions");
    assert!(chat.sessions().is_empty());
    assert_eq!(
        chat.render_sessions(),
        SessionListView::Failed("Failed to fetch chat sessions".into())
    );
}

#[tokio::test]
async fn categories_and_quick_question() {
    let (chat, _mock) = manager().await;
    let categories = chat.legal_categories().await.unwrap();
    assert_eq!(categories.len(), 2);
    assert_eq!(categories[0].examples, vec!["Bail application", "FIR"]);
    assert!(categories[1].examples.is_empty());

    let answer = chat.quick_question("What is an FIR?").await.unwrap();
    assert_eq!(answer.question, "What is an FIR?");
    assert_eq!(answer.sources, vec!["CrPC Section 154"]);
    assert_eq!(chat.current_session(), None);
}
