//! Schema validation helpers for Recollect JSON5 configuration.

use crate::ConfigError;
use serde_json::{Map, Value};

/// Expected JSON shape for a leaf config field.
#[derive(Debug, Clone, Copy)]
enum FieldKind {
    String,
    /// String or explicit `null`.
    OptionalString,
    Bool,
    Integer,
    /// Number or explicit `null`.
    OptionalNumber,
    StringArray,
    StringMap,
}

const MODEL_FIELDS: &[(&str, FieldKind)] = &[
    ("base_url", FieldKind::String),
    ("name", FieldKind::String),
    ("api_key", FieldKind::OptionalString),
    ("temperature", FieldKind::OptionalNumber),
    ("connect_timeout_secs", FieldKind::Integer),
];

const MEMORY_FIELDS: &[(&str, FieldKind)] = &[
    ("enabled", FieldKind::Bool),
    ("command", FieldKind::OptionalString),
    ("args", FieldKind::StringArray),
    ("env", FieldKind::StringMap),
    ("search_tool", FieldKind::String),
    ("add_tool", FieldKind::String),
    ("max_query_chars", FieldKind::Integer),
    ("max_nodes", FieldKind::Integer),
    ("timeout_ms", FieldKind::Integer),
];

const CAPTURE_FIELDS: &[(&str, FieldKind)] = &[
    ("capture", FieldKind::Bool),
    ("deny_patterns", FieldKind::StringArray),
    ("redact_patterns", FieldKind::StringArray),
    ("max_episode_chars", FieldKind::OptionalNumber),
];

const HISTORY_FIELDS: &[(&str, FieldKind)] = &[("max_messages", FieldKind::Integer)];

const PROMPT_FIELDS: &[(&str, FieldKind)] = &[("system_prompt", FieldKind::OptionalString)];

const AUTH_FIELDS: &[(&str, FieldKind)] = &[
    ("enabled", FieldKind::Bool),
    ("users", FieldKind::StringMap),
];

const SERVER_FIELDS: &[(&str, FieldKind)] = &[("bind", FieldKind::String)];

const SESSION_FIELDS: &[(&str, FieldKind)] = &[
    ("max_sessions", FieldKind::Integer),
    ("idle_timeout_secs", FieldKind::Integer),
];

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(value: &Value, layer: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    let allowed = [
        "$schema", "model", "memory", "history", "prompt", "auth", "server", "sessions",
    ];
    ensure_allowed_keys(map, &allowed, layer, "")?;

    if let Some(value) = map.get("$schema") {
        check_field(value, FieldKind::String, layer, "$schema")?;
    }
    if let Some(value) = map.get("model") {
        validate_section(value, MODEL_FIELDS, &[], layer, "model")?;
    }
    if let Some(value) = map.get("memory") {
        validate_memory(value, layer, "memory")?;
    }
    for (key, fields) in [
        ("history", HISTORY_FIELDS),
        ("prompt", PROMPT_FIELDS),
        ("auth", AUTH_FIELDS),
        ("server", SERVER_FIELDS),
        ("sessions", SESSION_FIELDS),
    ] {
        if let Some(value) = map.get(key) {
            validate_section(value, fields, &[], layer, key)?;
        }
    }
    Ok(())
}

/// Validate the "memory" block, including its nested capture policy.
fn validate_memory(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = validate_section(value, MEMORY_FIELDS, &["capture"], layer, path)?;
    if let Some(capture) = map.get("capture") {
        validate_section(
            capture,
            CAPTURE_FIELDS,
            &[],
            layer,
            &join_path(path, "capture"),
        )?;
    }
    Ok(())
}

/// Validate an object whose keys are leaf fields plus optional nested sections.
fn validate_section<'a>(
    value: &'a Value,
    fields: &[(&str, FieldKind)],
    nested: &[&str],
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    let map = expect_object(value, layer, path)?;
    for key in map.keys() {
        let known = fields.iter().any(|(name, _)| name == key) || nested.contains(&key.as_str());
        if !known {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    for (name, kind) in fields {
        if let Some(value) = map.get(*name) {
            check_field(value, *kind, layer, &join_path(path, name))?;
        }
    }
    Ok(map)
}

/// Check a leaf value against its expected kind.
fn check_field(value: &Value, kind: FieldKind, layer: &str, path: &str) -> Result<(), ConfigError> {
    let (ok, expected) = match kind {
        FieldKind::String => (value.is_string(), "expected string"),
        FieldKind::OptionalString => (value.is_string() || value.is_null(), "expected string"),
        FieldKind::Bool => (value.is_boolean(), "expected bool"),
        FieldKind::Integer => (value.is_u64(), "expected non-negative integer"),
        FieldKind::OptionalNumber => (value.is_number() || value.is_null(), "expected number"),
        FieldKind::StringArray => return validate_string_array(value, layer, path),
        FieldKind::StringMap => return validate_string_map(value, layer, path),
    };
    if ok {
        Ok(())
    } else {
        Err(invalid_field(layer, path, expected))
    }
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Validate that a value is an array of strings.
fn validate_string_array(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let Value::Array(arr) = value else {
        return Err(invalid_field(layer, path, "expected array"));
    };
    for (idx, entry) in arr.iter().enumerate() {
        if !entry.is_string() {
            return Err(invalid_field(
                layer,
                &format!("{path}[{idx}]"),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Validate that a value is an object of string values.
fn validate_string_map(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    for (key, entry) in map {
        if !entry.is_string() {
            return Err(invalid_field(
                layer,
                &join_path(path, key),
                "expected string",
            ));
        }
    }
    Ok(())
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    match map.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid_field(layer, &join_path(path, key), "unknown key")),
        None => Ok(()),
    }
}

fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
