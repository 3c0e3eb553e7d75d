use pretty_assertions::assert_eq;
use recollect_rs_config::RecollectConfig;
use recollect_rs_core::{ChatSession, CoreError, ResponseGenerator, TurnController};
use recollect_rs_protocol::{AuthenticatedUser, ChatMessage, Role};
use recollect_rs_test_utils::{FailingModel, FailingTool, RecordingTransport, StreamingModel, StubTool};
use recollect_rs_tools::{Tool, ToolRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn controller(model: Arc<StreamingModel>, config: &RecollectConfig) -> TurnController {
    TurnController::from_config(ResponseGenerator::new(model), config).expect("controller")
}

fn session(user: Option<&str>, tools: Vec<Arc<dyn Tool>>) -> ChatSession {
    ChatSession::new(
        user.map(AuthenticatedUser::new),
        Arc::new(ToolRegistry::from_tools(tools)),
    )
}

#[tokio::test]
async fn plain_chat_with_empty_registry() {
    let model = Arc::new(StreamingModel::new(["Hi", " there", "!"]));
    let turns = controller(model.clone(), &RecollectConfig::default());
    let session = session(None, Vec::new());
    let transport = RecordingTransport::new();

    let outcome = turns
        .handle_message(&session, "Hello", &transport)
        .await
        .expect("turn");

    assert_eq!(model.last_request(), Some(vec![ChatMessage::user("Hello")]));
    assert_eq!(transport.tokens(), vec!["Hi", " there", "!"]);
    assert_eq!(transport.finals(), vec!["Hi there!"]);
    assert_eq!(outcome.content, "Hi there!");
    assert_eq!(outcome.error, None);
    assert!(outcome.memory_write.is_none());
}

#[tokio::test]
async fn retrieved_memory_is_injected_first() {
    let search = StubTool::new("search_memory_nodes").with_result(json!({
        "nodes": [{ "name": "Tea", "summary": "likes tea" }]
    }));
    let model = Arc::new(StreamingModel::new(["You like tea."]));
    let turns = controller(model.clone(), &RecollectConfig::default());
    let session = session(Some("alice"), vec![Arc::new(search.clone())]);
    let transport = RecordingTransport::new();

    turns
        .handle_message(&session, "What do I like?", &transport)
        .await
        .expect("turn");

    let messages = model.last_request().expect("request");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].role, Role::System);
    assert!(messages[0].content.contains("likes tea"));
    assert_eq!(messages[1], ChatMessage::user("What do I like?"));
    assert_eq!(search.calls()[0]["group_ids"], json!(["user-alice"]));
}

#[tokio::test]
async fn streamed_tokens_concatenate_to_final_content() {
    let deltas = ["The", " quick", " brown", " fox", "."];
    let model = Arc::new(StreamingModel::new(deltas));
    let turns = controller(model, &RecollectConfig::default());
    let transport = RecordingTransport::new();

    let outcome = turns
        .handle_message(&session(None, Vec::new()), "Tell me", &transport)
        .await
        .expect("turn");

    assert_eq!(transport.streamed(), outcome.content);
    assert_eq!(transport.finals(), vec![outcome.content.clone()]);
}

#[tokio::test]
async fn user_message_is_written_to_memory() {
    let add = StubTool::new("add_memory");
    let model = Arc::new(StreamingModel::new(["Noted."]));
    let turns = controller(model, &RecollectConfig::default());
    let session = session(Some("a b!c"), vec![Arc::new(add.clone())]);

    let outcome = turns
        .handle_message(&session, "I like tea", &RecordingTransport::new())
        .await
        .expect("turn");
    outcome.memory_write.expect("write").await.expect("join");

    let calls = add.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["episode_body"], json!("I like tea"));
    assert_eq!(calls[0]["group_id"], json!("user-a-b-c"));
}

#[tokio::test]
async fn failing_memory_write_does_not_change_reply() {
    let add = FailingTool::new("add_memory", "write refused");
    let model = Arc::new(StreamingModel::new(["Fine."]));
    let turns = controller(model, &RecollectConfig::default());
    let transport = RecordingTransport::new();

    let outcome = turns
        .handle_message(
            &session(None, vec![Arc::new(add.clone())]),
            "Hello",
            &transport,
        )
        .await
        .expect("turn");
    outcome.memory_write.expect("write").await.expect("join");

    assert_eq!(outcome.content, "Fine.");
    assert_eq!(outcome.error, None);
    assert_eq!(transport.finals(), vec!["Fine."]);
    assert_eq!(add.call_count(), 1);
}

#[tokio::test]
async fn disabled_memory_skips_tools() {
    let search = StubTool::new("search_memory_nodes").with_result(json!("likes tea"));
    let add = StubTool::new("add_memory");
    let mut config = RecollectConfig::default();
    config.memory.enabled = false;
    let model = Arc::new(StreamingModel::new(["ok"]));
    let turns = controller(model, &config);

    let outcome = turns
        .handle_message(
            &session(None, vec![Arc::new(search.clone()), Arc::new(add.clone())]),
            "Hello",
            &RecordingTransport::new(),
        )
        .await
        .expect("turn");

    assert!(outcome.memory_write.is_none());
    assert!(search.calls().is_empty());
    assert!(add.calls().is_empty());
}

#[tokio::test]
async fn model_failure_is_reported_as_message() {
    let add = StubTool::new("add_memory");
    let turns = TurnController::from_config(
        ResponseGenerator::new(Arc::new(FailingModel::new("connection refused"))),
        &RecollectConfig::default(),
    )
    .expect("controller");
    let transport = RecordingTransport::new();

    let outcome = turns
        .handle_message(&session(None, vec![Arc::new(add.clone())]), "Hello", &transport)
        .await
        .expect("turn");

    assert!(transport.tokens().is_empty());
    let finals = transport.finals();
    assert_eq!(finals.len(), 1);
    assert!(finals[0].starts_with("Error: "));
    assert!(finals[0].contains("connection refused"));
    assert!(outcome.error.is_some());
    assert!(outcome.memory_write.is_none());
    assert!(add.calls().is_empty());
}

#[tokio::test]
async fn mid_stream_failure_keeps_partial_reply() {
    let model = Arc::new(StreamingModel::new(["Half"]).failing_after("reset by peer"));
    let turns = controller(model, &RecollectConfig::default());
    let transport = RecordingTransport::new();
    let session = session(None, Vec::new());

    let outcome = turns
        .handle_message(&session, "Hello", &transport)
        .await
        .expect("turn");

    let tokens = transport.tokens();
    assert_eq!(tokens[0], "Half");
    assert!(tokens[1].starts_with("\n\nError: "));
    assert_eq!(transport.streamed(), outcome.content);
    assert!(outcome.content.starts_with("Half\n\nError: "));
    assert!(outcome.content.contains("reset by peer"));
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn history_window_forwards_prior_turns() {
    let mut config = RecollectConfig::default();
    config.history.max_messages = 2;
    config.prompt.system_prompt = Some("Be brief.".to_string());
    let model = Arc::new(StreamingModel::new(["ok"]));
    let turns = controller(model.clone(), &config);
    let session = session(None, Vec::new());
    let transport = RecordingTransport::new();

    turns
        .handle_message(&session, "first", &transport)
        .await
        .expect("first");
    turns
        .handle_message(&session, "second", &transport)
        .await
        .expect("second");

    assert_eq!(
        model.last_request(),
        Some(vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("first"),
            ChatMessage::assistant("ok"),
            ChatMessage::user("second"),
        ])
    );
}

#[tokio::test]
async fn default_config_keeps_turns_independent() {
    let model = Arc::new(StreamingModel::new(["ok"]));
    let turns = controller(model.clone(), &RecollectConfig::default());
    let session = session(None, Vec::new());
    let transport = RecordingTransport::new();

    turns.handle_message(&session, "first", &transport).await.expect("first");
    turns.handle_message(&session, "second", &transport).await.expect("second");

    assert_eq!(model.requests().len(), 2);
    assert_eq!(model.last_request(), Some(vec![ChatMessage::user("second")]));
}

#[tokio::test]
async fn closed_transport_is_the_only_error() {
    let model = Arc::new(StreamingModel::new(["Hi"]));
    let turns = controller(model, &RecollectConfig::default());
    let err = turns
        .handle_message(&session(None, Vec::new()), "Hello", &RecordingTransport::closed())
        .await
        .unwrap_err();
    assert!(matches!(err, CoreError::Transport(_)));
}

#[tokio::test]
async fn reply_is_sent_while_memory_write_is_pending() {
    let mut config = RecollectConfig::default();
    config.memory.timeout_ms = 60_000;
    let add = StubTool::new("add_memory").with_delay(Duration::from_secs(2));
    let model = Arc::new(StreamingModel::new(["ok"]));
    let turns = controller(model, &config);
    let transport = RecordingTransport::new();

    let outcome = turns
        .handle_message(&session(None, vec![Arc::new(add)]), "remember this", &transport)
        .await
        .expect("turn");

    assert_eq!(transport.finals(), vec!["ok"]);
    let write = outcome.memory_write.expect("write");
    assert!(!write.is_finished());
    write.abort();
}

#[tokio::test]
async fn undelivered_reply_is_not_stored() {
    let mut config = RecollectConfig::default();
    config.history.max_messages = 4;
    let add = StubTool::new("add_memory");
    let model = Arc::new(StreamingModel::new(["Hi"]));
    let turns = controller(model, &config);
    let session = session(None, vec![Arc::new(add.clone())]);

    let err = turns
        .handle_message(&session, "Hello", &RecordingTransport::rejecting_final())
        .await
        .unwrap_err();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(matches!(err, CoreError::Transport(_)));
    assert!(add.calls().is_empty());
    assert!(session.history().is_empty());
}

#[tokio::test]
async fn transcript_is_bounded_by_history_window() {
    let model = Arc::new(StreamingModel::new(["ok"]));
    let transport = RecordingTransport::new();

    let independent = session(None, Vec::new());
    let turns = controller(model.clone(), &RecollectConfig::default());
    for _ in 0..50 {
        turns
            .handle_message(&independent, "again", &transport)
            .await
            .expect("turn");
    }
    assert!(independent.history().is_empty());

    let mut config = RecollectConfig::default();
    config.history.max_messages = 2;
    let windowed = session(None, Vec::new());
    let turns = controller(model, &config);
    for text in ["one", "two", "three"] {
        turns
            .handle_message(&windowed, text, &transport)
            .await
            .expect("turn");
    }
    assert_eq!(
        windowed.history(),
        vec![ChatMessage::user("three"), ChatMessage::assistant("ok")]
    );
}
