//! Tests for layered configuration loading.

use super::*;
use pretty_assertions::assert_eq;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write_json5(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("dir");
    }
    fs::write(path, contents).expect("write");
}

fn options_for(root: &Path, cwd: &Path) -> LayeredConfigOptions {
    LayeredConfigOptions {
        cwd: cwd.to_path_buf(),
        user_config_path: Some(root.join("home/.recollect/recollect.json5")),
        runtime_paths: Vec::new(),
    }
}

#[test]
fn parse_minimal_config() {
    let config = RecollectConfig::load_from_str("{}").expect("config");
    assert_eq!(config.model.name, "gpt-3.5-turbo");
    assert_eq!(config.memory.search_tool, "search_memory_nodes");
    assert_eq!(config.memory.add_tool, "add_memory");
    assert_eq!(config.memory.max_query_chars, 200);
    assert_eq!(config.memory.max_nodes, 5);
    assert_eq!(config.history.max_messages, 0);
    assert!(!config.auth.enabled);
    assert_eq!(config.sessions.max_sessions, 1000);
    assert_eq!(config.sessions.idle_timeout_secs, 3600);
}

#[test]
fn parses_session_limits_and_rejects_zero_capacity() {
    let config =
        RecollectConfig::load_from_str("{ sessions: { max_sessions: 5, idle_timeout_secs: 0 } }")
            .expect("config");
    assert_eq!(config.sessions.max_sessions, 5);
    assert_eq!(config.sessions.idle_timeout_secs, 0);

    let err = RecollectConfig::load_from_str("{ sessions: { max_sessions: 0 } }").unwrap_err();
    assert!(format!("{err}").contains("sessions.max_sessions"));
}

#[test]
fn rejects_unknown_top_level_key() {
    let err = RecollectConfig::load_from_str("{ unexpected: true }").unwrap_err();
    assert!(format!("{err}").contains("unknown key"));
}

#[test]
fn rejects_unknown_nested_capture_key() {
    let json5 = r#"{ memory: { capture: { capture_tool_output: true } } }"#;
    let err = RecollectConfig::load_from_str(json5).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("memory.capture.capture_tool_output"), "{msg}");
}

#[test]
fn rejects_wrong_field_type() {
    let json5 = r#"{ memory: { max_nodes: "five" } }"#;
    let err = RecollectConfig::load_from_str(json5).unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("memory.max_nodes"), "{msg}");
}

#[test]
fn rejects_query_limit_above_cap() {
    let json5 = r#"{ memory: { max_query_chars: 500 } }"#;
    let err = RecollectConfig::load_from_str(json5).unwrap_err();
    assert!(format!("{err}").contains("memory.max_query_chars"));
}

#[test]
fn rejects_auth_without_users() {
    let json5 = r#"{ auth: { enabled: true } }"#;
    let err = RecollectConfig::load_from_str(json5).unwrap_err();
    assert!(format!("{err}").contains("no users"));
}

#[test]
fn rejects_blank_memory_command() {
    let json5 = r#"{ memory: { command: "  " } }"#;
    let err = RecollectConfig::load_from_str(json5).unwrap_err();
    assert!(format!("{err}").contains("memory.command"));
}

#[test]
fn parses_full_memory_section() {
    let json5 = r#"{
        // graph memory over stdio
        memory: {
            command: "uvx",
            args: ["graphiti-mcp"],
            env: { NEO4J_URI: "bolt://localhost:7687" },
            max_query_chars: 120,
            capture: { deny_patterns: ["password"], max_episode_chars: 4000 },
        },
        auth: { enabled: true, users: { alice: "wonderland" } },
    }"#;
    let config = RecollectConfig::load_from_str(json5).expect("config");
    assert_eq!(config.memory.command.as_deref(), Some("uvx"));
    assert_eq!(config.memory.args, vec!["graphiti-mcp".to_string()]);
    assert_eq!(
        config.memory.env.get("NEO4J_URI").map(String::as_str),
        Some("bolt://localhost:7687")
    );
    assert_eq!(config.memory.max_query_chars, 120);
    assert_eq!(config.memory.capture.deny_patterns, vec!["password"]);
    assert_eq!(config.memory.capture.max_episode_chars, Some(4000));
    assert_eq!(
        config.auth.users.get("alice").map(String::as_str),
        Some("wonderland")
    );
}

#[test]
fn layered_config_prefers_runtime_over_cwd_over_user() {
    let temp = TempDir::new().expect("tmp");
    let root = temp.path();
    let cwd = root.join("project");
    fs::create_dir_all(&cwd).expect("cwd");

    write_json5(
        &root.join("home/.recollect/recollect.json5"),
        r#"{ model: { name: "user-model", temperature: 0.2 }, server: { bind: "0.0.0.0:9000" } }"#,
    );
    write_json5(
        &cwd.join("recollect.json5"),
        r#"{ model: { name: "cwd-model" }, history: { max_messages: 4 } }"#,
    );
    let runtime = root.join("runtime.json5");
    write_json5(&runtime, r#"{ history: { max_messages: 2 } }"#);

    let options = options_for(root, &cwd).with_runtime_path(&runtime);
    let layered = RecollectConfig::load_layered_with_options(options).expect("layered");

    assert_eq!(layered.layers.len(), 3);
    assert_eq!(layered.layers[0].source, ConfigLayerSource::User);
    assert_eq!(layered.layers[2].source, ConfigLayerSource::Runtime);
    assert_eq!(layered.config.model.name, "cwd-model");
    assert_eq!(layered.config.model.temperature, Some(0.2));
    assert_eq!(layered.config.history.max_messages, 2);
    assert_eq!(layered.config.server.bind, "0.0.0.0:9000");
}

#[test]
fn missing_optional_layers_yield_defaults() {
    let temp = TempDir::new().expect("tmp");
    let layered =
        RecollectConfig::load_layered_with_options(options_for(temp.path(), temp.path()))
            .expect("layered");
    assert!(layered.layers.is_empty());
    assert_eq!(layered.config.server.bind, "127.0.0.1:8000");
}

#[test]
fn missing_runtime_layer_is_an_error() {
    let temp = TempDir::new().expect("tmp");
    let options = options_for(temp.path(), temp.path())
        .with_runtime_path(temp.path().join("absent.json5"));
    let err = RecollectConfig::load_layered_with_options(options).unwrap_err();
    match err {
        ConfigError::ReadFailed { path, .. } => assert!(path.ends_with("absent.json5")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn invalid_layer_reports_its_label() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path();
    write_json5(&cwd.join("recollect.json5"), r#"{ server: { port: 80 } }"#);
    let err = RecollectConfig::load_layered_with_options(options_for(temp.path(), cwd))
        .unwrap_err();
    let msg = format!("{err}");
    assert!(msg.contains("cwd("), "{msg}");
    assert!(msg.contains("server.port"), "{msg}");
}

#[test]
fn same_file_for_user_and_cwd_loads_once() {
    let temp = TempDir::new().expect("tmp");
    let cwd = temp.path().join("home/.recollect");
    write_json5(&cwd.join("recollect.json5"), r#"{ model: { name: "shared" } }"#);
    let layered = RecollectConfig::load_layered_with_options(options_for(temp.path(), &cwd))
        .expect("layered");
    assert_eq!(layered.layers.len(), 1);
    assert_eq!(layered.config.model.name, "shared");
}
