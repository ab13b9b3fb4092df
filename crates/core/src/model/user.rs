use serde::{Deserialize, Serialize};
use std::fmt;

use crate::model::ids::UserId;

/// Account role as reported by the profile endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    User,
    Admin,
    Supervisor,
    Other(String),
}

impl Role {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "user" => Role::User,
            "admin" => Role::Admin,
            "supervisor" => Role::Supervisor,
            _ => Role::Other(raw.trim().to_string()),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
            Role::Supervisor => "supervisor",
            Role::Other(raw) => raw,
        }
    }

    /// Roles that land on the management dashboard after login.
    #[must_use]
    pub fn is_staff(&self) -> bool {
        matches!(self, Role::Admin | Role::Supervisor)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Role {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Role {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Role::parse(&raw))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Token pair issued by the login and refresh endpoints.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    access_token: String,
    refresh_token: String,
}

impl Credentials {
    #[must_use]
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }

    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    #[must_use]
    pub fn refresh_token(&self) -> &str {
        &self.refresh_token
    }

    /// Both tokens present; mirrors the "logged in" check done on startup.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_parsing_keeps_unknown_values() {
        assert_eq!(Role::parse("Admin"), Role::Admin);
        assert_eq!(Role::parse("user"), Role::User);
        assert_eq!(Role::parse("grader"), Role::Other("grader".into()));
        assert!(Role::Supervisor.is_staff());
        assert!(!Role::User.is_staff());
    }

    #[test]
    fn credentials_debug_hides_tokens() {
        let creds = Credentials::new("secret-access", "secret-refresh");
        let shown = format!("{creds:?}");
        assert!(!shown.contains("secret"));
        assert!(creds.is_complete());
        assert!(!Credentials::new("a", "").is_complete());
    }
}
