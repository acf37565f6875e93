// Directory data model: the user snapshot returned by `listUsers` and the
// role enumeration shared by add/update.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access level of a directory user. Uppercase on the wire.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    /// Read only.
    #[default]
    Visiteur,
    /// Read and write.
    Editeur,
    /// Everything, including directory management.
    Admin,
}

impl Role {
    pub const ALL: [Role; 3] = [Role::Visiteur, Role::Editeur, Role::Admin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Visiteur => "VISITEUR",
            Role::Editeur => "EDITEUR",
            Role::Admin => "ADMIN",
        }
    }

    /// Short description used by the role picker.
    pub fn describe(&self) -> &'static str {
        match self {
            Role::Visiteur => "VISITEUR (read only)",
            Role::Editeur => "EDITEUR (read + write)",
            Role::Admin => "ADMIN (all rights)",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown role `{0}`")]
pub struct UnknownRole(String);

impl FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "VISITEUR" => Ok(Role::Visiteur),
            "EDITEUR" => Ok(Role::Editeur),
            "ADMIN" => Ok(Role::Admin),
            _ => Err(UnknownRole(s.to_string())),
        }
    }
}

impl From<Role> for crate::envelope::ParamValue {
    fn from(role: Role) -> Self {
        crate::envelope::ParamValue::Text(role.as_str().to_string())
    }
}

/// One entry of the JSON list embedded in the `users` field of
/// `listUsersResponse`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub role: Role,
    #[serde(rename = "createdAt")]
    pub created_at: String,
}

impl User {
    /// `dd/mm/YYYY HH:MM` rendering of `created_at`, or the raw value when it
    /// is not RFC 3339.
    pub fn created_display(&self) -> String {
        chrono::DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
            .unwrap_or_else(|_| self.created_at.clone())
    }
}

/// Fields to change on an existing user; `None` leaves the field untouched
/// and is not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserUpdate {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn users_deserialize_from_server_json() {
        let json = r#"[{"id":1,"username":"a","role":"ADMIN","createdAt":"2024-01-01T00:00:00Z"},
                       {"id":2,"username":"b","role":"VISITEUR","createdAt":"2024-03-05T10:20:00.000Z"}]"#;
        let users: Vec<User> = serde_json::from_str(json).unwrap();

        assert_eq!(users.len(), 2);
        assert_eq!(users[0].id, 1);
        assert_eq!(users[0].role, Role::Admin);
        assert_eq!(users[1].created_at, "2024-03-05T10:20:00.000Z");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let json = r#"{"id":1,"username":"a","role":"ROOT","createdAt":"x"}"#;
        assert!(serde_json::from_str::<User>(json).is_err());
        assert!("root".parse::<Role>().is_err());
    }

    #[test]
    fn role_parses_case_insensitively() {
        assert_eq!("editeur".parse::<Role>().unwrap(), Role::Editeur);
        assert_eq!(" ADMIN ".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::default(), Role::Visiteur);
        assert_eq!(Role::Admin.to_string(), "ADMIN");
    }

    #[test]
    fn created_display_formats_timestamps() {
        let mut user = User {
            id: 1,
            username: "a".into(),
            role: Role::Admin,
            created_at: "2024-01-02T03:04:00Z".into(),
        };
        assert_eq!(user.created_display(), "02/01/2024 03:04");

        user.created_at = "yesterday".into();
        assert_eq!(user.created_display(), "yesterday");
    }
}
