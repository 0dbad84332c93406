//! Account roles.
//!
//! The persisted role names must match the seed data in
//! `20261001000002_create_roles_table.sql`. `guest` is never persisted: it is
//! the role of an anonymous or guest-session viewer.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_LECTURER: &str = "lecturer";
pub const ROLE_STUDENT: &str = "student";
pub const ROLE_GUEST: &str = "guest";

/// The role a viewer acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Guest,
    Student,
    Lecturer,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Guest => ROLE_GUEST,
            Role::Student => ROLE_STUDENT,
            Role::Lecturer => ROLE_LECTURER,
            Role::Admin => ROLE_ADMIN,
        }
    }

    /// Resolve a role name from the `roles` table.
    ///
    /// Unknown names resolve to `None`; callers treat that as an
    /// unauthenticated viewer rather than guessing a privilege level.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ROLE_GUEST => Some(Role::Guest),
            ROLE_STUDENT => Some(Role::Student),
            ROLE_LECTURER => Some(Role::Lecturer),
            ROLE_ADMIN => Some(Role::Admin),
            _ => None,
        }
    }

    /// Lecturers and admins review submissions and see the full queue.
    pub fn is_staff(self) -> bool {
        matches!(self, Role::Lecturer | Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
