//! Permission decision engine
//!
//! Answers "may this requester perform this action on this resource instance?"
//! by walking the requester's roles against the grant table and consulting the
//! ownership resolver registered for each matching scoped grant.
//!
//! Every failure path inside a check (resolver error, timeout, panic,
//! cancellation, missing resolver) denies. Nothing is mutated.

pub mod decision;

pub use decision::{AccessDecision, DecisionReason};

use futures::future::join_all;
use futures::FutureExt;
use serde::Deserialize;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{AuthzError, Result};
use crate::grants::{GrantTable, PermissionGrant};
use crate::repository::AccessRepository;
use crate::resolvers::{OwnershipResolver, ResolverRegistry};
use crate::types::{Action, Modifier, Resource, Role, UserContext};

/// Engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Deadline for a single resolver call, in milliseconds
    #[serde(default = "default_resolver_timeout_ms")]
    pub resolver_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            resolver_timeout_ms: default_resolver_timeout_ms(),
        }
    }
}

impl EngineConfig {
    pub fn resolver_timeout(&self) -> Duration {
        Duration::from_millis(self.resolver_timeout_ms)
    }
}

fn default_resolver_timeout_ms() -> u64 { 2_000 }

/// Permission decision engine
///
/// # Pipeline
///
/// ```text
/// roles (stored order) ─► wildcard? ──────────────────────► allow
///                          │
///                          └► scoped grants for (resource, action)
///                               └► resolver(role, resource, modifier)
///                                    true ─► allow   false/error/timeout ─► next
/// exhausted ─► deny
/// ```
pub struct PermissionEngine {
    grants: Arc<GrantTable>,
    resolvers: Arc<ResolverRegistry>,
    repository: Arc<dyn AccessRepository>,
    config: EngineConfig,
}

impl PermissionEngine {
    /// Create an engine over an immutable grant table and resolver registry
    ///
    /// Scoped grants without a resolver are logged here and deny at check time.
    pub fn new(
        grants: Arc<GrantTable>,
        resolvers: Arc<ResolverRegistry>,
        repository: Arc<dyn AccessRepository>,
        config: EngineConfig,
    ) -> Self {
        for (role, grant) in resolvers.unresolved(&grants) {
            warn!(role = %role, grant = %grant, "Grant has no ownership resolver and will always deny");
        }

        debug!(
            resolvers = resolvers.len(),
            resolver_timeout_ms = config.resolver_timeout_ms,
            "PermissionEngine initialized"
        );

        Self {
            grants,
            resolvers,
            repository,
            config,
        }
    }

    /// Engine with the standard grant table and resolvers
    pub fn standard(repository: Arc<dyn AccessRepository>) -> Self {
        Self::new(
            Arc::new(GrantTable::standard()),
            Arc::new(ResolverRegistry::standard()),
            repository,
            EngineConfig::default(),
        )
    }

    pub fn grants(&self) -> &GrantTable {
        &self.grants
    }

    /// Whether `requester` may perform `action` on the `resource` instance `resource_id`
    pub async fn has_permission(
        &self,
        requester: &UserContext,
        resource: Resource,
        action: Action,
        resource_id: &str,
    ) -> bool {
        self.decide(requester, resource, action, resource_id)
            .await
            .allowed
    }

    /// [`Self::has_permission`] that gives up (denying) once `cancel` fires
    pub async fn has_permission_cancellable(
        &self,
        requester: &UserContext,
        resource: Resource,
        action: Action,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> bool {
        self.decide_cancellable(requester, resource, action, resource_id, cancel)
            .await
            .allowed
    }

    /// Full decision, with the granting role and literal for audit
    pub async fn decide(
        &self,
        requester: &UserContext,
        resource: Resource,
        action: Action,
        resource_id: &str,
    ) -> AccessDecision {
        self.decide_cancellable(requester, resource, action, resource_id, &CancellationToken::new())
            .await
    }

    pub async fn decide_cancellable(
        &self,
        requester: &UserContext,
        resource: Resource,
        action: Action,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> AccessDecision {
        let mut granted = false;

        for &role in &requester.roles {
            if self.grants.has_wildcard(role) {
                debug!(subject = %requester.subject_id, role = %role, "Wildcard grant");
                return AccessDecision::allow(resource, action, role, PermissionGrant::Wildcard);
            }

            for modifier in self.grants.modifiers_for(role, resource, action) {
                granted = true;

                let Some(resolver) = self.resolvers.get(role, resource, modifier) else {
                    warn!(
                        role = %role, resource = %resource, modifier = %modifier,
                        "No resolver registered, denying branch"
                    );
                    continue;
                };

                match self.run_resolver(resolver.as_ref(), requester, resource_id, cancel).await {
                    Ok(true) => {
                        debug!(
                            subject = %requester.subject_id,
                            role = %role,
                            resource = %resource,
                            action = %action,
                            resource_id,
                            resolver = resolver.name(),
                            "Access granted"
                        );
                        let grant = PermissionGrant::scoped(resource, action, modifier);
                        return AccessDecision::allow(resource, action, role, grant);
                    }
                    Ok(false) => {}
                    Err(AuthzError::Cancelled) => {
                        debug!(subject = %requester.subject_id, "Permission check cancelled");
                        return AccessDecision::deny(resource, action, DecisionReason::Cancelled);
                    }
                    Err(e) => {
                        warn!(
                            role = %role,
                            resource = %resource,
                            modifier = %modifier,
                            resource_id,
                            resolver = resolver.name(),
                            error = %e,
                            "Ownership resolver failed, denying branch"
                        );
                    }
                }
            }
        }

        let reason = if granted {
            DecisionReason::NotInScope
        } else {
            DecisionReason::NoGrant
        };
        debug!(
            subject = %requester.subject_id,
            resource = %resource,
            action = %action,
            resource_id,
            ?reason,
            "Access denied"
        );
        AccessDecision::deny(resource, action, reason)
    }

    /// Ids from `resource_ids` the requester may act on, in input order
    ///
    /// Checks are independent and run concurrently.
    pub async fn filter_permitted(
        &self,
        requester: &UserContext,
        resource: Resource,
        action: Action,
        resource_ids: &[String],
    ) -> Vec<String> {
        let checks = resource_ids
            .iter()
            .map(|id| self.has_permission(requester, resource, action, id));
        let verdicts = join_all(checks).await;

        resource_ids
            .iter()
            .zip(verdicts)
            .filter_map(|(id, allowed)| allowed.then(|| id.clone()))
            .collect()
    }

    /// Roles of `requester` with any grant at all for (resource, action)
    pub fn granting_roles(
        &self,
        requester: &UserContext,
        resource: Resource,
        action: Action,
    ) -> Vec<(Role, Vec<Modifier>)> {
        requester
            .roles
            .iter()
            .filter_map(|&role| {
                if self.grants.has_wildcard(role) {
                    return Some((role, Vec::new()));
                }
                let modifiers = self.grants.modifiers_for(role, resource, action);
                (!modifiers.is_empty()).then_some((role, modifiers))
            })
            .collect()
    }

    async fn run_resolver(
        &self,
        resolver: &dyn OwnershipResolver,
        requester: &UserContext,
        resource_id: &str,
        cancel: &CancellationToken,
    ) -> Result<bool> {
        let call = AssertUnwindSafe(resolver.owns(requester, resource_id, self.repository.as_ref()))
            .catch_unwind();

        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(AuthzError::Cancelled),
            outcome = tokio::time::timeout(self.config.resolver_timeout(), call) => match outcome {
                Ok(Ok(result)) => result,
                Ok(Err(_)) => Err(AuthzError::Internal("resolver panicked".to_string())),
                Err(_) => Err(AuthzError::ResolverTimeout),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::InMemoryRepository;

    #[tokio::test]
    async fn test_engine_creation() {
        let engine = PermissionEngine::standard(Arc::new(InMemoryRepository::default()));
        assert!(engine.grants().has_wildcard(Role::SysAdmin));
        assert_eq!(engine.config.resolver_timeout(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_granting_roles() {
        let engine = PermissionEngine::standard(Arc::new(InMemoryRepository::default()));
        let user = UserContext::new("u-1")
            .with_role(Role::OrgAdmin)
            .with_role_record(Role::Student, "stu-1");

        let roles = engine.granting_roles(&user, Resource::Document, Action::Read);
        assert_eq!(
            roles,
            vec![
                (Role::OrgAdmin, vec![Modifier::Managed]),
                (Role::Student, vec![Modifier::Own]),
            ]
        );
        assert!(engine
            .granting_roles(&user, Resource::Shift, Action::Delete)
            .is_empty());
    }
}
