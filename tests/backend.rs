use axum::body::{ Body, Bytes };
use axum::extract::Path;
use axum::http::{ header, StatusCode };
use axum::response::{ IntoResponse, Response };
use axum::routing::{ get, post };
use axum::{ Json, Router };
use futures::stream::{ self, StreamExt };
use serde_json::{ json, Value };
use std::io;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::watch;

use milo_client::api::{ ApiError, MiloClient };
use milo_client::classify::relevance::ScoreTier;
use milo_client::classify::{ classify, AlumniTable, DataCategory, ParsedBlock };
use milo_client::config::ClientConfig;
use milo_client::models::stream::StreamEvent;
use milo_client::one_shot;
use milo_client::session::{ ChatSession, SessionError, TurnOutcome };

const COMPANIES_REPLY: &str =
    "**Companies to Consider**\n```json\n{\"companies\": [{\"name\": \"Stripe\", \"domain\": \"stripe.com\", \"relevance\": \"High\"}, {\"name\": \"Plaid\", \"domain\": \"plaid.com\", \"relevance\": 72.5},]}\n```";

fn sse(records: &[Value]) -> Vec<String> {
    records.iter().map(|r| format!("data: {}\n\n", r)).collect()
}

/// Splits `text` into pieces of at most `size` bytes without breaking characters.
fn pieces(text: &str, size: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in text.chars() {
        if current.len() + ch.len_utf8() > size {
            out.push(std::mem::take(&mut current));
        }
        current.push(ch);
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn event_stream(chunks: Vec<String>) -> Response {
    let body = stream::iter(chunks.into_iter().map(|c| Ok::<_, io::Error>(Bytes::from(c))));
    ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(body)).into_response()
}

async fn chat_stream(Json(req): Json<Value>) -> Response {
    let message = req["message"].as_str().unwrap_or_default().to_string();
    match message.as_str() {
        "fail" => (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response(),
        "error" => {
            let mut records: Vec<Value> = vec![json!({"content": "Partial"})];
            records.push(json!({"error": "model overloaded"}));
            records.push(json!({"content": "never shown"}));
            event_stream(sse(&records))
        }
        "hang" => {
            let first = stream::iter(vec![Ok::<_, io::Error>(Bytes::from("data: {\"content\": \"Partial\"}\n\n"))]);
            let body = first.chain(stream::pending());
            ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(body)).into_response()
        }
        "silent" => event_stream(sse(&[json!({"content": "No goodbye"})])),
        "slow" => {
            tokio::time::sleep(Duration::from_secs(30)).await;
            event_stream(sse(&[json!({"done": true})]))
        }
        "emoji-error" =>
            event_stream(sse(&[json!({"content": "Checking ❌ entries"}), json!({"error": "upstream ❌ refused"})])),
        "companies" => {
            let mut records: Vec<Value> = pieces(COMPANIES_REPLY, 17)
                .into_iter()
                .map(|p| json!({"content": p}))
                .collect();
            records.push(json!({"done": true}));
            // Split the wire bytes too, so records straddle reads.
            let wire = sse(&records).concat();
            let mut chunks = Vec::new();
            let bytes = wire.as_bytes();
            for piece in bytes.chunks(23) {
                chunks.push(piece.to_vec());
            }
            let body = stream::iter(chunks.into_iter().map(|c| Ok::<_, io::Error>(Bytes::from(c))));
            ([(header::CONTENT_TYPE, "text/event-stream")], Body::from_stream(body)).into_response()
        }
        other => {
            let records = vec![
                json!({"content": format!("You said: {}", other)}),
                json!({"done": true}),
                json!({"content": "after done"})
            ];
            event_stream(sse(&records))
        }
    }
}

async fn history(Path(session_id): Path<String>) -> Json<Value> {
    Json(
        json!({
        "messages": [
            {"role": "user", "content": "Where should I apply?", "timestamp": "2024-05-01T12:00:00.123456"},
            {"id": "a1", "role": "assistant", "content": COMPANIES_REPLY, "timestamp": "2024-05-01T12:00:05Z"}
        ],
        "session_info": {"session_id": session_id, "current_step": 2, "message_count": 2}
    })
    )
}

async fn session_info(Path(session_id): Path<String>) -> Response {
    if session_id == "missing" {
        return StatusCode::NOT_FOUND.into_response();
    }
    Json(
        json!({
        "session_id": session_id,
        "current_step": 3,
        "student_interests": ["fintech"],
        "career_paths": [],
        "message_count": 6,
        "created_at": "2024-05-01T12:00:00",
        "last_updated": "2024-05-01T12:10:00"
    })
    ).into_response()
}

async fn clear_session(Path(session_id): Path<String>) -> StatusCode {
    if session_id == "missing" { StatusCode::NOT_FOUND } else { StatusCode::OK }
}

async fn sessions() -> Json<Value> {
    Json(json!({"sessions": {"default": {"session_id": "default"}, "other": {"session_id": "other"}}}))
}

async fn health() -> Json<Value> {
    Json(json!({"status": "healthy"}))
}

async fn analyze(Json(req): Json<Value>) -> Json<Value> {
    Json(
        json!({
        "analysis": {"target_companies": ["Stripe"], "target_roles": ["PM"], "industry": "Fintech"},
        "target_company_alumni": [{"name": "Ada Lovelace", "position": "PM", "company": "Stripe"}],
        "career_paths": [],
        "people_to_contact": [],
        "action_plan": {"plan": format!("Plan for {}", req["user_input"].as_str().unwrap_or_default())},
        "success_odds": 74
    })
    )
}

async fn spawn_backend() -> SocketAddr {
    let app = Router::new()
        .route("/chat/stream", post(chat_stream))
        .route("/chat/history/{session_id}", get(history))
        .route("/chat/session/{session_id}", get(session_info).delete(clear_session))
        .route("/chat/sessions", get(sessions))
        .route("/health", get(health))
        .route("/analyze", post(analyze));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn client() -> MiloClient {
    let addr = spawn_backend().await;
    MiloClient::new(&ClientConfig::new(&format!("http://{}", addr)).unwrap()).unwrap()
}

async fn client_with_idle_timeout(idle: Duration) -> MiloClient {
    let addr = spawn_backend().await;
    let mut config = ClientConfig::new(&format!("http://{}", addr)).unwrap();
    config.stream_idle_timeout = Some(idle);
    MiloClient::new(&config).unwrap()
}

fn no_cancel() -> watch::Receiver<bool> {
    let (_tx, rx) = watch::channel(false);
    rx
}

#[tokio::test]
async fn streamed_reply_is_assembled_and_classified() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let mut seen = 0;
    let outcome = session
        .send(&client, "companies", &mut no_cancel(), |_, _| {
            seen += 1;
        }).await
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Completed);
    assert!(seen > 2);
    assert!(!session.is_streaming());
    let (reply, block) = session.last_block().unwrap();
    assert_eq!(reply.content, COMPANIES_REPLY);
    let ParsedBlock::Companies(companies) = block else {
        panic!("expected companies");
    };
    assert_eq!(companies.len(), 2);
    assert_eq!(companies[0].display_score(), 95);
    assert_eq!(companies[0].score_tier(), ScoreTier::Top);
    assert_eq!(companies[1].display_score(), 73);
    assert_eq!(companies[1].score_tier(), ScoreTier::Mid);
}

#[tokio::test]
async fn records_after_done_are_ignored() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let outcome = session.send(&client, "hello", &mut no_cancel(), |_, _| {}).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(session.messages()[1].content, "You said: hello");
    assert_eq!(classify(&session.messages()[1]), ParsedBlock::Markdown);
}

#[tokio::test]
async fn error_record_marks_the_reply() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let mut terminal = Vec::new();
    let outcome = session
        .send(&client, "error", &mut no_cancel(), |_, event| {
            if event.is_terminal() {
                terminal.push(event.clone());
            }
        }).await
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(terminal, vec![StreamEvent::Error("model overloaded".into())]);
    assert_eq!(
        session.messages()[1].content,
        "Partial\n\n❌ **Error:** model overloaded\n\nPlease try again."
    );
}

#[tokio::test]
async fn server_error_status_fails_the_turn() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let outcome = session.send(&client, "fail", &mut no_cancel(), |_, _| {}).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed);
    let content = &session.messages()[1].content;
    assert!(content.starts_with("❌ **Error:** HTTP error! status: 500"), "{}", content);
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn unreachable_backend_fails_the_turn() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    let client = MiloClient::new(&ClientConfig::new(&format!("http://{}", addr)).unwrap()).unwrap();

    let mut session = ChatSession::new("default");
    let outcome = session.send(&client, "hello", &mut no_cancel(), |_, _| {}).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Failed);
    assert!(session.messages()[1].content.starts_with("❌ **Error:** Failed to reach chat server"));

    let resp = client.analyze("quant roles").await;
    assert!(resp.is_fallback());
    assert_eq!(resp.processed_query.unwrap().original_query, "quant roles");
}

#[tokio::test]
async fn stream_ending_without_done_completes() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let outcome = session.send(&client, "silent", &mut no_cancel(), |_, _| {}).await.unwrap();
    assert_eq!(outcome, TurnOutcome::Completed);
    assert_eq!(session.messages()[1].content, "No goodbye");
    assert!(session.begin_turn("next").is_ok());
}

#[tokio::test]
async fn cancelling_keeps_what_arrived() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let (tx, mut rx) = watch::channel(false);
    let mut first_chunk = Some(tx);
    let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            session.send(&client, "hang", &mut rx, |_, event| {
                if matches!(event, StreamEvent::Content(_)) {
                    if let Some(tx) = first_chunk.take() {
                        tx.send(true).unwrap();
                    }
                }
            })
        ).await
        .expect("cancel should end the turn")
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Cancelled);
    assert_eq!(session.messages()[1].content, "Partial");
    assert!(!session.is_streaming());
}

#[tokio::test]
async fn history_replaces_the_transcript() {
    let client = client().await;
    let messages = client.chat_history("default").await.unwrap();
    assert_eq!(messages.len(), 2);
    assert!(!messages[0].id.is_empty());
    assert_eq!(messages[1].id, "a1");

    let mut session = ChatSession::new("default");
    session.load_history(messages).unwrap();
    let (_, block) = session.last_block().unwrap();
    assert_eq!(block.kind(), "companies");
}

#[tokio::test]
async fn session_endpoints() {
    let client = client().await;

    let info = client.session_info("default").await.unwrap();
    assert_eq!(info.current_step, 3);
    assert_eq!(info.student_interests, vec!["fintech"]);

    let err = client.session_info("missing").await.unwrap_err();
    assert!(matches!(err, ApiError::Status { status, .. } if status.as_u16() == 404));

    let sessions = client.list_sessions().await.unwrap();
    assert_eq!(sessions.len(), 2);
    assert!(sessions.contains_key("other"));

    let health = client.health().await.unwrap();
    assert_eq!(health["status"], "healthy");
}

#[tokio::test]
async fn reset_clears_local_transcript_only_on_success() {
    let client = client().await;

    let mut session = ChatSession::new("default");
    session.send(&client, "hello", &mut no_cancel(), |_, _| {}).await.unwrap();
    session.reset(&client).await.unwrap();
    assert!(session.messages().is_empty());

    let mut session = ChatSession::new("missing");
    session.send(&client, "hello", &mut no_cancel(), |_, _| {}).await.unwrap();
    let err = session.reset(&client).await.unwrap_err();
    assert!(matches!(err, SessionError::Api(ApiError::Status { .. })));
    assert_eq!(session.messages().len(), 2);
}

#[tokio::test]
async fn analyze_returns_backend_data() {
    let client = client().await;
    let resp = client.analyze("fintech PM").await;
    assert!(!resp.is_fallback());
    assert_eq!(resp.analysis.industry, "Fintech");
    assert_eq!(resp.success_odds, 74.0);
    assert_eq!(resp.action_plan.plan, "Plan for fintech PM");
    assert_eq!(resp.target_company_alumni[0].company, "Stripe");
}

#[tokio::test]
async fn alumni_reply_from_history_shape() {
    let mut session = ChatSession::new("default");
    let id = session.begin_turn("alumni?").unwrap();
    session.apply(
        &id,
        &StreamEvent::Content(
            "**Yale Alumni at Companies**\nSome context\n```json\n[{\"name\":\"A\",\"current_role\":\"SWE\",\"current_company\":\"G\"},{\"name\":\"B\"}]\n```".into()
        )
    );
    session.apply(&id, &StreamEvent::Done);
    let (_, block) = session.last_block().unwrap();
    let ParsedBlock::Alumni { narrative, table: AlumniTable::Rows(rows) } = block else {
        panic!("expected alumni rows");
    };
    assert_eq!(narrative, "**Yale Alumni at Companies**\nSome context\n");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].current_company, "G");
    assert_eq!(DataCategory::Alumni.error_message(), "Error loading alumni data");
}

#[tokio::test]
async fn cancel_applies_while_waiting_for_headers() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let (tx, mut rx) = watch::channel(false);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        tx.send(true).unwrap();
    });

    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        session.send(&client, "slow", &mut rx, |_, _| {})
    ).await
        .expect("cancel should end the turn before headers arrive")
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Cancelled);
    assert_eq!(session.messages()[1].content, "");
    assert!(!session.is_streaming());
    assert!(session.begin_turn("next").is_ok());
}

#[tokio::test]
async fn cancel_already_requested_skips_the_wait() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let (_tx, mut rx) = watch::channel(true);
    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        session.send(&client, "slow", &mut rx, |_, _| {})
    ).await
        .expect("cancel should end the turn")
        .unwrap();
    assert_eq!(outcome, TurnOutcome::Cancelled);
}

#[tokio::test]
async fn idle_timeout_covers_the_header_wait() {
    let client = client_with_idle_timeout(Duration::from_millis(200)).await;
    let mut session = ChatSession::new("default");
    let outcome = tokio::time::timeout(
        Duration::from_secs(3),
        session.send(&client, "slow", &mut no_cancel(), |_, _| {})
    ).await
        .expect("idle timeout should fail the turn")
        .unwrap();

    assert_eq!(outcome, TurnOutcome::Failed);
    assert!(session.messages()[1].content.starts_with("❌ **Error:** Stream timed out"));
}

#[tokio::test]
async fn one_shot_renders_structured_reply() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let mut out = Vec::new();
    one_shot(&client, &mut session, "companies", &mut out).await.unwrap();

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.starts_with(COMPANIES_REPLY));
    assert!(printed.contains("── COMPANIES TO CONSIDER ──"));
    assert!(printed.contains("MATCH 95 ●●●● (strong)"));
    assert!(printed.contains("Apply: https://plaid.com/careers"));
}

#[tokio::test]
async fn one_shot_plain_reply_is_echoed_once() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let mut out = Vec::new();
    one_shot(&client, &mut session, "hello", &mut out).await.unwrap();
    assert_eq!(String::from_utf8(out).unwrap(), "You said: hello\n");
}

#[tokio::test]
async fn one_shot_failure_is_an_error() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let mut out = Vec::new();
    let result = one_shot(&client, &mut session, "fail", &mut out).await;
    assert!(result.is_err());
    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("❌ **Error:** HTTP error! status: 500"), "{}", printed);
}

#[tokio::test]
async fn failure_notice_comes_from_the_error_event() {
    let client = client().await;
    let mut session = ChatSession::new("default");
    let mut out = Vec::new();
    assert!(one_shot(&client, &mut session, "emoji-error", &mut out).await.is_err());

    let printed = String::from_utf8(out).unwrap();
    assert_eq!(printed, "Checking ❌ entries\n❌ **Error:** upstream ❌ refused\n\nPlease try again.\n");
}
