//! Access decision types

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::grants::PermissionGrant;
use crate::types::{Action, Resource, Role};

/// Why a decision came out the way it did
///
/// Carries no repository error text; failures are only distinguishable in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionReason {
    /// A held role carries the universal wildcard
    Wildcard,

    /// A scoped grant matched and its resolver placed the resource in scope
    Resolved,

    /// No held role has a grant for this resource and action
    NoGrant,

    /// Grants exist but no resolver placed the resource in scope
    NotInScope,

    /// The caller cancelled the check
    Cancelled,
}

/// Outcome of one permission check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Unique decision ID
    pub id: String,

    pub allowed: bool,

    pub reason: DecisionReason,

    pub resource: Resource,

    pub action: Action,

    /// Role whose grant allowed the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,

    /// Grant that allowed the request
    #[serde(skip_serializing_if = "Option::is_none")]
    pub grant: Option<PermissionGrant>,

    /// Decision timestamp (milliseconds since epoch)
    pub timestamp: i64,
}

impl AccessDecision {
    pub fn allow(resource: Resource, action: Action, role: Role, grant: PermissionGrant) -> Self {
        let reason = match grant {
            PermissionGrant::Wildcard => DecisionReason::Wildcard,
            PermissionGrant::Scoped { .. } => DecisionReason::Resolved,
        };

        Self {
            role: Some(role),
            grant: Some(grant),
            ..Self::new(true, reason, resource, action)
        }
    }

    pub fn deny(resource: Resource, action: Action, reason: DecisionReason) -> Self {
        Self::new(false, reason, resource, action)
    }

    fn new(allowed: bool, reason: DecisionReason, resource: Resource, action: Action) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            allowed,
            reason,
            resource,
            action,
            role: None,
            grant: None,
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Modifier;

    #[test]
    fn test_allow_decision() {
        let grant = PermissionGrant::scoped(Resource::Student, Action::Read, Modifier::Own);
        let decision = AccessDecision::allow(Resource::Student, Action::Read, Role::Student, grant);

        assert!(decision.allowed);
        assert_eq!(decision.reason, DecisionReason::Resolved);
        assert_eq!(decision.role, Some(Role::Student));
        assert!(!decision.id.is_empty());
    }

    #[test]
    fn test_deny_serializes_without_grant() {
        let decision = AccessDecision::deny(Resource::Shift, Action::Read, DecisionReason::NoGrant);
        let json = serde_json::to_value(&decision).unwrap();

        assert_eq!(json["allowed"], false);
        assert_eq!(json["reason"], "no_grant");
        assert!(json.get("grant").is_none());
    }
}
