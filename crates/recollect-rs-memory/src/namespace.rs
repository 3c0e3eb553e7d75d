//! Mapping from session identity to a memory namespace.

use recollect_rs_protocol::{AuthenticatedUser, MemoryNamespace};

const USER_PREFIX: &str = "user-";

/// Derive the namespace for a session.
///
/// ASCII alphanumerics are kept and every other character becomes `-`, so
/// distinct usernames may share a namespace (`a b` and `a-b`). Sessions
/// without an identity, or with an empty username, use `anonymous`.
pub fn resolve_namespace(identity: Option<&AuthenticatedUser>) -> MemoryNamespace {
    let Some(user) = identity.filter(|user| !user.username.is_empty()) else {
        return MemoryNamespace::anonymous();
    };
    let sanitized: String = user
        .username
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() { ch } else { '-' })
        .collect();
    MemoryNamespace::new(format!("{USER_PREFIX}{sanitized}"))
}
