use pretty_assertions::assert_eq;
use recollect_rs_config::{CapturePolicyConfig, MemoryConfig};
use recollect_rs_memory::{CapturePolicy, MemoryWriter};
use recollect_rs_protocol::MemoryNamespace;
use recollect_rs_test_utils::{FailingTool, StubTool};
use recollect_rs_tools::{Tool, ToolRegistry};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

fn writer_with(tools: Vec<Arc<dyn Tool>>, config: &MemoryConfig) -> MemoryWriter {
    let policy = CapturePolicy::from_config(&config.capture).expect("policy");
    MemoryWriter::new(
        Arc::new(ToolRegistry::from_tools(tools)),
        config,
        Arc::new(policy),
    )
}

#[tokio::test]
async fn missing_add_tool_is_a_noop() {
    let writer = writer_with(Vec::new(), &MemoryConfig::default());
    assert!(
        writer
            .record("I like tea", &MemoryNamespace::anonymous())
            .is_none()
    );
}

#[tokio::test]
async fn records_user_message_as_episode() {
    let add = StubTool::new("add_memory").with_result(json!("Episode queued"));
    let writer = writer_with(vec![Arc::new(add.clone())], &MemoryConfig::default());

    let handle = writer
        .record("I like tea", &MemoryNamespace::new("user-alice"))
        .expect("spawned");
    handle.await.expect("join");

    let calls = add.calls();
    assert_eq!(calls.len(), 1);
    let args = &calls[0];
    assert_eq!(args["episode_body"], json!("I like tea"));
    assert_eq!(args["group_id"], json!("user-alice"));
    assert_eq!(args["source"], json!("message"));
    assert_eq!(args["source_description"], json!("chat user message"));
    assert!(
        args["name"]
            .as_str()
            .expect("name")
            .starts_with("chat-message-")
    );
}

#[tokio::test]
async fn failing_add_tool_is_swallowed() {
    let add = FailingTool::new("add_memory", "write refused");
    let writer = writer_with(vec![Arc::new(add.clone())], &MemoryConfig::default());

    let handle = writer
        .record("I like tea", &MemoryNamespace::anonymous())
        .expect("spawned");
    assert!(handle.await.is_ok());
    assert_eq!(add.call_count(), 1);
}

#[tokio::test]
async fn slow_add_tool_times_out_quietly() {
    let add = StubTool::new("add_memory").with_delay(Duration::from_millis(500));
    let config = MemoryConfig {
        timeout_ms: 20,
        ..MemoryConfig::default()
    };
    let writer = writer_with(vec![Arc::new(add)], &config);
    let handle = writer
        .record("I like tea", &MemoryNamespace::anonymous())
        .expect("spawned");
    assert!(handle.await.is_ok());
}

#[tokio::test]
async fn capture_policy_filters_and_redacts() {
    let add = StubTool::new("add_memory");
    let config = MemoryConfig {
        capture: CapturePolicyConfig {
            deny_patterns: vec!["(?i)password".to_string()],
            redact_patterns: vec![r"\b\d{16}\b".to_string()],
            ..CapturePolicyConfig::default()
        },
        ..MemoryConfig::default()
    };
    let writer = writer_with(vec![Arc::new(add.clone())], &config);
    let namespace = MemoryNamespace::anonymous();

    assert!(writer.record("my password is hunter2", &namespace).is_none());
    writer
        .record("card 4111111111111111 is mine", &namespace)
        .expect("spawned")
        .await
        .expect("join");

    let calls = add.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0]["episode_body"], json!("card [REDACTED] is mine"));
}
