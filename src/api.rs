// Directory operations: one method per remote SOAP method. Each operation
// checks the session for the token it needs, builds the call parameters,
// goes through the envelope codec and the transport, and turns the flat
// result mapping into a typed outcome.

use crate::config::Settings;
use crate::envelope::{self, CallParams, CallResult};
use crate::error::{ClientError, ClientResult};
use crate::session::Session;
use crate::transport::{HealthStatus, HttpTransport, Transport};
use crate::user::{Role, User, UserUpdate};

/// SOAP client for the user directory.
#[derive(Clone)]
pub struct DirectoryClient<T = HttpTransport> {
    transport: T,
}

impl DirectoryClient<HttpTransport> {
    /// Create a client talking HTTP to the server named in `settings`.
    pub fn from_settings(settings: &Settings) -> ClientResult<Self> {
        Ok(DirectoryClient::new(HttpTransport::new(settings)?))
    }
}

impl<T: Transport> DirectoryClient<T> {
    pub fn new(transport: T) -> Self {
        DirectoryClient { transport }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send one call and decode its `<method>Response` element.
    pub fn call(&self, method: &str, params: &CallParams) -> ClientResult<CallResult> {
        tracing::debug!(method, fields = params.iter().count(), "soap call");
        let request = envelope::encode(method, params);
        let response = self.transport.post_envelope(method, request)?;
        let result = envelope::decode(&response, method).map_err(|e| {
            tracing::warn!(method, error = %e, "could not decode soap response");
            e
        })?;
        Ok(result)
    }

    /// Like `call`, but a result without `success == "true"` becomes
    /// `ClientError::Domain` carrying the server message.
    fn call_checked(&self, method: &str, params: &CallParams) -> ClientResult<CallResult> {
        let result = self.call(method, params)?;
        if result.is_success() {
            Ok(result)
        } else {
            tracing::info!(method, message = result.message(), "server rejected the call");
            Err(ClientError::Domain(result.message().to_string()))
        }
    }

    /// `authenticateUser`. On success the session keeps the token, the
    /// username and the reported role. Both credentials are sent trimmed.
    pub fn login(&self, session: &mut Session, username: &str, password: &str) -> ClientResult<Option<Role>> {
        let username = username.trim();
        let password = password.trim();
        if username.is_empty() {
            return Err(ClientError::Validation("username is required".into()));
        }
        if password.is_empty() {
            return Err(ClientError::Validation("password is required".into()));
        }

        let params = CallParams::new()
            .with("username", username)
            .with("password", password);
        let result = self.call_checked("authenticateUser", &params)?;

        let role = result.get("role").and_then(|r| r.parse::<Role>().ok());
        let token = result.get("token").filter(|t| !t.is_empty()).map(str::to_string);
        session.authenticated(username, token, role);
        tracing::info!(username, role = ?role, "authenticated");
        Ok(role)
    }

    /// `listUsers`. The user list travels as JSON inside the `users` field.
    pub fn list_users(&self, session: &Session) -> ClientResult<Vec<User>> {
        let token = session.admin_token()?;
        let params = CallParams::new().with("token", token);
        let result = self.call_checked("listUsers", &params)?;

        let users: Vec<User> = match result.get("users") {
            Some(json) if !json.trim().is_empty() => serde_json::from_str(json)?,
            _ => Vec::new(),
        };
        tracing::debug!(count = users.len(), "users listed");
        Ok(users)
    }

    /// `addUser`. Returns the new user's id when the server sends one.
    pub fn add_user(&self, session: &Session, username: &str, password: &str, role: Role) -> ClientResult<Option<i64>> {
        let token = session.admin_token()?;
        let params = CallParams::new()
            .with("token", token)
            .with("username", username)
            .with("password", password)
            .with("role", role);
        let result = self.call_checked("addUser", &params)?;
        Ok(result.get("userId").and_then(|id| id.trim().parse().ok()))
    }

    /// `updateUser`. Only the fields set in `update` are sent.
    pub fn update_user(&self, session: &Session, user_id: i64, update: UserUpdate) -> ClientResult<()> {
        let token = session.admin_token()?;
        let params = CallParams::new()
            .with("token", token)
            .with("userId", user_id)
            .with_opt("username", update.username)
            .with_opt("password", update.password)
            .with_opt("role", update.role);
        self.call_checked("updateUser", &params)?;
        Ok(())
    }

    /// `deleteUser`.
    pub fn delete_user(&self, session: &Session, user_id: i64) -> ClientResult<()> {
        let token = session.admin_token()?;
        let params = CallParams::new().with("token", token).with("userId", user_id);
        self.call_checked("deleteUser", &params)?;
        Ok(())
    }

    /// `GET /api/health`.
    pub fn health(&self) -> ClientResult<HealthStatus> {
        Ok(self.transport.health()?)
    }

    /// Whether the SOAP endpoint publishes a service description (WSDL).
    pub fn probe_service_description(&self) -> ClientResult<bool> {
        let text = self.transport.service_description()?;
        Ok(text.contains("WSDL") || text.contains("definitions"))
    }
}
