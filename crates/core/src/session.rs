use serde::{Deserialize, Serialize};
use std::fmt;

/// The two identities a run authenticates as (serialized as lowercase strings).
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Student,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Student => "student",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Credential {
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Bearer token issued by a successful login.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user_id: Option<String>,
}

/// One session slot per role. A later login for the same role replaces the earlier one.
#[derive(Debug, Default)]
pub struct Sessions {
    admin: Option<Session>,
    student: Option<Session>,
}

impl Sessions {
    fn slot(&self, role: Role) -> &Option<Session> {
        match role {
            Role::Admin => &self.admin,
            Role::Student => &self.student,
        }
    }

    fn slot_mut(&mut self, role: Role) -> &mut Option<Session> {
        match role {
            Role::Admin => &mut self.admin,
            Role::Student => &mut self.student,
        }
    }

    pub fn store(&mut self, role: Role, token: String, user_id: Option<String>) {
        *self.slot_mut(role) = Some(Session { token, user_id });
    }

    pub fn get(&self, role: Role) -> Option<&Session> {
        self.slot(role).as_ref()
    }

    pub fn token(&self, role: Role) -> Option<&str> {
        self.get(role).map(|s| s.token.as_str())
    }

    pub fn user_id(&self, role: Role) -> Option<&str> {
        self.get(role).and_then(|s| s.user_id.as_deref())
    }

    pub fn has_token(&self, role: Role) -> bool {
        self.slot(role).is_some()
    }
}

/// Registration fields synthesized for a student from their email address.
#[derive(Debug, Clone, PartialEq)]
pub struct StudentProfile {
    pub student_id: String,
    pub first_name: String,
    pub last_name: String,
}

impl StudentProfile {
    /// `jane.doe@school.ng` becomes `jane.doe` / `Jane` / `Doe`; without a dot in the
    /// local part the last name is `Student`.
    pub fn from_email(email: &str) -> Self {
        let local = email.split('@').next().unwrap_or_default();
        let mut parts = local.split('.');
        let first = parts.next().unwrap_or_default();
        let (first_name, last_name) = match parts.next() {
            Some(last) => (capitalize(first), capitalize(last)),
            None => (capitalize(local), "Student".to_string()),
        };
        Self {
            student_id: local.to_string(),
            first_name,
            last_name,
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(head) => head
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
        None => String::new(),
    }
}
