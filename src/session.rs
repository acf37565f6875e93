// Session state: the login token and the separately supplied administrative
// token. Neither is validated or expired locally; the server is the only
// judge, and an invalid token only shows up as a failed call.

use crate::error::{ClientError, ClientResult};
use crate::user::Role;

/// Number of token characters shown back to the operator.
const PREVIEW_LEN: usize = 20;

/// Explicit session passed into every directory operation.
#[derive(Debug, Clone, Default)]
pub struct Session {
    auth_token: Option<String>,
    admin_token: Option<String>,
    current_user: Option<String>,
    role: Option<Role>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a successful login.
    pub fn authenticated(&mut self, username: &str, token: Option<String>, role: Option<Role>) {
        self.current_user = Some(username.to_string());
        self.auth_token = token;
        self.role = role;
    }

    /// Store the administrative token. No check against the server.
    pub fn set_admin_token(&mut self, token: &str) {
        self.admin_token = Some(token.to_string());
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user.is_some()
    }

    pub fn has_admin_token(&self) -> bool {
        self.admin_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Token required by list/add/update/delete.
    pub fn admin_token(&self) -> ClientResult<&str> {
        match self.admin_token.as_deref() {
            Some(t) if !t.is_empty() => Ok(t),
            _ => Err(ClientError::Unauthorized),
        }
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    pub fn current_user(&self) -> Option<&str> {
        self.current_user.as_deref()
    }

    pub fn role(&self) -> Option<Role> {
        self.role
    }

    /// First characters of the admin token followed by an ellipsis.
    pub fn admin_token_preview(&self) -> Option<String> {
        self.admin_token
            .as_deref()
            .map(|t| format!("{}...", t.chars().take(PREVIEW_LEN).collect::<String>()))
    }
}
