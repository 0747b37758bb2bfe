use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

/// Platform role carried by every account and every session token.
///
/// Serialized as upper-case strings (`"ADMIN"`, `"TUTOR"`, `"STUDENT"`)
/// to match the stored and wire representation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Tutor,
    Student,
}

impl Role {
    /// All roles, in no particular order.
    pub const ALL: [Role; 3] = [Role::Admin, Role::Tutor, Role::Student];

    /// Upper-case string form, as stored and sent on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Tutor => "TUTOR",
            Role::Student => "STUDENT",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error for role parsing failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown role: {0}")]
pub struct RoleParseError(pub String);

impl FromStr for Role {
    type Err = RoleParseError;

    /// Parse a role, case-insensitively.
    ///
    /// Import rows arrive in arbitrary casing and are normalized to the
    /// canonical upper-case form here.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Ok(Role::Admin),
            "TUTOR" => Ok(Role::Tutor),
            "STUDENT" => Ok(Role::Student),
            other => Err(RoleParseError(other.to_string())),
        }
    }
}
