//! Permission grant table
//!
//! Per-role, ordered lists of permission literals. A literal is either the
//! universal wildcard `*` or `Resource:Action_Modifier`, e.g. `Student:Read_Own`.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{AuthzError, Result};
use crate::types::{Action, Modifier, Resource, Role};

/// Single permission literal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PermissionGrant {
    /// Full access; no resolver is consulted
    Wildcard,

    /// Scoped grant that needs an ownership resolver to take effect
    Scoped {
        resource: Resource,
        action: Action,
        modifier: Modifier,
    },
}

impl PermissionGrant {
    pub fn scoped(resource: Resource, action: Action, modifier: Modifier) -> Self {
        PermissionGrant::Scoped {
            resource,
            action,
            modifier,
        }
    }
}

impl fmt::Display for PermissionGrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PermissionGrant::Wildcard => f.write_str("*"),
            PermissionGrant::Scoped {
                resource,
                action,
                modifier,
            } => write!(f, "{}:{}_{}", resource, action, modifier),
        }
    }
}

impl FromStr for PermissionGrant {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        if s == "*" {
            return Ok(PermissionGrant::Wildcard);
        }

        let invalid = |reason: &str| AuthzError::InvalidGrant(format!("'{}': {}", s, reason));

        let (resource, rest) = s.split_once(':').ok_or_else(|| invalid("missing ':'"))?;
        let (action, modifier) = rest.split_once('_').ok_or_else(|| invalid("missing '_'"))?;

        Ok(PermissionGrant::Scoped {
            resource: resource.parse().map_err(|_| invalid("unknown resource"))?,
            action: action.parse().map_err(|_| invalid("unknown action"))?,
            modifier: modifier.parse().map_err(|_| invalid("unknown modifier"))?,
        })
    }
}

impl Serialize for PermissionGrant {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PermissionGrant {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let literal = String::deserialize(deserializer)?;
        literal.parse().map_err(serde::de::Error::custom)
    }
}

/// Immutable role → grants mapping, built once at startup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTable {
    grants: HashMap<Role, Vec<PermissionGrant>>,
}

impl GrantTable {
    /// Empty table: every check denies
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a role's grant list, replacing any previous one
    pub fn with_role(mut self, role: Role, grants: Vec<PermissionGrant>) -> Self {
        self.grants.insert(role, grants);
        self
    }

    /// Parse role names and literals, e.g. from a config file
    pub fn from_literals(literals: &HashMap<String, Vec<String>>) -> Result<Self> {
        let mut table = Self::new();
        for (role, grants) in literals {
            let role: Role = role
                .parse()
                .map_err(|_| AuthzError::InvalidGrant(format!("unknown role '{}'", role)))?;
            let grants = grants
                .iter()
                .map(|literal| literal.parse())
                .collect::<Result<Vec<PermissionGrant>>>()?;
            table.grants.insert(role, grants);
        }
        Ok(table)
    }

    /// The practicum's standard grants
    pub fn standard() -> Self {
        use Action::*;
        use Modifier::*;

        let crud = [Create, Read, Update, Delete];
        let scoped = |resource: Resource, actions: &[Action], modifier: Modifier| {
            actions
                .iter()
                .map(move |&action| PermissionGrant::scoped(resource, action, modifier))
                .collect::<Vec<_>>()
        };

        let org_admin: Vec<PermissionGrant> = [
            Resource::Document,
            Resource::Student,
            Resource::Hospital,
            Resource::School,
            Resource::Course,
            Resource::Classes,
        ]
        .into_iter()
        .flat_map(|resource| scoped(resource, &crud, Managed))
        .chain(scoped(Resource::Document, &[Approve], Managed))
        .collect();

        let hospital_manager = [
            scoped(Resource::Student, &[Read], Own),
            scoped(Resource::Shift, &crud, Own),
            scoped(Resource::Document, &[Read, Approve], Managed),
            scoped(Resource::Classes, &[Read], Managed),
        ]
        .concat();

        let preceptor = [
            scoped(Resource::Shift, &[Read, Update], Own),
            scoped(Resource::Hospital, &[Read], Own),
            scoped(Resource::Student, &[Read], Own),
        ]
        .concat();

        let student = [
            scoped(Resource::Document, &[Create, Read, Update, Compile], Own),
            scoped(Resource::Classes, &[Read], Own),
            scoped(Resource::Shift, &[Read], Own),
            scoped(Resource::Student, &[Read, Update], Own),
        ]
        .concat();

        let supervisor = [
            scoped(Resource::Student, &[Read], Own),
            scoped(Resource::Classes, &[Read], Own),
            scoped(Resource::Document, &[Read, Approve], Students),
        ]
        .concat();

        Self::new()
            .with_role(Role::SysAdmin, vec![PermissionGrant::Wildcard])
            .with_role(Role::OrgAdmin, org_admin)
            .with_role(Role::HospitalManager, hospital_manager)
            .with_role(Role::Preceptor, preceptor)
            .with_role(Role::Student, student)
            .with_role(Role::Supervisor, supervisor)
    }

    /// Grants for `role`; empty when the role has none
    pub fn grants_for(&self, role: Role) -> &[PermissionGrant] {
        self.grants.get(&role).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_wildcard(&self, role: Role) -> bool {
        self.grants_for(role).contains(&PermissionGrant::Wildcard)
    }

    /// Modifiers under which `role` may perform `action` on `resource`, in grant order
    pub fn modifiers_for(&self, role: Role, resource: Resource, action: Action) -> Vec<Modifier> {
        let mut modifiers = Vec::new();
        for grant in self.grants_for(role) {
            if let PermissionGrant::Scoped {
                resource: r,
                action: a,
                modifier,
            } = *grant
            {
                if r == resource && a == action && !modifiers.contains(&modifier) {
                    modifiers.push(modifier);
                }
            }
        }
        modifiers
    }

    /// Every (role, grant) pair in the table
    pub fn iter(&self) -> impl Iterator<Item = (Role, &PermissionGrant)> {
        self.grants
            .iter()
            .flat_map(|(role, grants)| grants.iter().map(move |grant| (*role, grant)))
    }
}
