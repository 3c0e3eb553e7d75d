//! Credential verification for chat logins.

use async_trait::async_trait;
use log::debug;
use recollect_rs_config::AuthConfig;
use recollect_rs_protocol::AuthenticatedUser;
use std::collections::HashMap;

/// Checks a username/password pair.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// `None` means the credentials were rejected.
    async fn verify(&self, username: &str, password: &str) -> Option<AuthenticatedUser>;
}

/// Verifies against a fixed username to password map.
#[derive(Clone, Default)]
pub struct StaticCredentials {
    users: HashMap<String, Vec<u8>>,
}

impl StaticCredentials {
    pub fn new(users: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|(user, password)| (user, password.into_bytes()))
                .collect(),
        }
    }

    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(config.users.clone())
    }
}

impl std::fmt::Debug for StaticCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticCredentials")
            .field("users", &self.users.len())
            .finish()
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentials {
    async fn verify(&self, username: &str, password: &str) -> Option<AuthenticatedUser> {
        if username.is_empty() || password.is_empty() {
            return None;
        }
        let Some(expected) = self.users.get(username) else {
            debug!("login rejected, unknown user (username={})", username);
            return None;
        };
        if constant_time_eq(expected, password.as_bytes()) {
            Some(AuthenticatedUser::new(username))
        } else {
            debug!("login rejected, wrong password (username={})", username);
            None
        }
    }
}

/// Compare two byte strings without short-circuiting on the first mismatch.
fn constant_time_eq(expected: &[u8], provided: &[u8]) -> bool {
    if expected.len() != provided.len() {
        return false;
    }
    expected
        .iter()
        .zip(provided)
        .fold(0u8, |acc, (a, b)| acc | (a ^ b))
        == 0
}
