//! Core access-control types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthzError;

/// Unique entity identifier (user, student record, shift, ...)
pub type EntityId = String;

macro_rules! string_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            /// Every variant, in declaration order (test and bench enumeration)
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => stringify!($variant)),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = AuthzError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $(stringify!($variant) => Ok($name::$variant),)+
                    other => Err(AuthzError::InvalidInput(format!(
                        "unknown {} '{}'",
                        stringify!($name).to_lowercase(),
                        other
                    ))),
                }
            }
        }
    };
}

string_enum! {
    /// Role tag held by a subject
    Role { SysAdmin, OrgAdmin, HospitalManager, Preceptor, Student, Supervisor }
}

string_enum! {
    /// Domain noun under access control
    Resource {
        Hospital, Student, School, Course, Classes, Document, Shift,
        Preceptor, Supervisor, HospitalManager, User,
    }
}

string_enum! {
    /// Operation on a resource
    Action { Create, Read, Update, Delete, Approve, Compile }
}

string_enum! {
    /// Scope qualifier narrowing a grant
    ///
    /// - `Own`: the resource is the requester's own or directly linked to them
    /// - `Managed`: the requester administers a broader scope containing it
    /// - `Students`: reached through the students the requester supervises
    Modifier { Own, Managed, Students }
}

/// Resolved requester: role set plus the record id behind each held role
///
/// Each per-role id is `Some` only when the subject holds that role. Built once
/// per identity-cache miss and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    /// Subject identifier (token `sub`)
    pub subject_id: EntityId,

    /// Held roles, in stored order
    pub roles: Vec<Role>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub student_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hospital_manager_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preceptor_id: Option<EntityId>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub supervisor_id: Option<EntityId>,
}

impl UserContext {
    /// Create a context with no roles
    pub fn new(subject_id: impl Into<EntityId>) -> Self {
        Self {
            subject_id: subject_id.into(),
            roles: Vec::new(),
            student_id: None,
            hospital_manager_id: None,
            preceptor_id: None,
            supervisor_id: None,
        }
    }

    /// Grant a role that has no backing record
    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    /// Grant a role together with its record id
    pub fn with_role_record(mut self, role: Role, record_id: impl Into<EntityId>) -> Self {
        let record_id = Some(record_id.into());
        match role {
            Role::Student => self.student_id = record_id,
            Role::HospitalManager => self.hospital_manager_id = record_id,
            Role::Preceptor => self.preceptor_id = record_id,
            Role::Supervisor => self.supervisor_id = record_id,
            Role::SysAdmin | Role::OrgAdmin => {}
        }
        self.with_role(role)
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }

    /// Record id backing `role`, if the subject holds it
    pub fn record_id(&self, role: Role) -> Option<&str> {
        match role {
            Role::Student => self.student_id.as_deref(),
            Role::HospitalManager => self.hospital_manager_id.as_deref(),
            Role::Preceptor => self.preceptor_id.as_deref(),
            Role::Supervisor => self.supervisor_id.as_deref(),
            Role::SysAdmin | Role::OrgAdmin => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enum_round_trip_names() {
        assert_eq!("HospitalManager".parse::<Role>().unwrap(), Role::HospitalManager);
        assert_eq!(Resource::Classes.to_string(), "Classes");
        assert_eq!("Compile".parse::<Action>().unwrap(), Action::Compile);
        assert!("Janitor".parse::<Role>().is_err());
        assert!("Spaceship".parse::<Resource>().is_err());
    }

    #[test]
    fn test_user_context_records() {
        let user = UserContext::new("user-1")
            .with_role_record(Role::Student, "student-1")
            .with_role(Role::OrgAdmin)
            .with_role(Role::OrgAdmin);

        assert_eq!(user.roles, vec![Role::Student, Role::OrgAdmin]);
        assert_eq!(user.record_id(Role::Student), Some("student-1"));
        assert_eq!(user.record_id(Role::Preceptor), None);
        assert!(user.has_role(Role::OrgAdmin));
        assert!(!user.has_role(Role::SysAdmin));
    }
}
