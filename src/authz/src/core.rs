//! Wiring of token manager, identity cache and decision engine

use practicum_token::{TokenManager, TokenPair, TokenPayload};
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::AccessConfig;
use crate::engine::PermissionEngine;
use crate::error::{AuthzError, Result};
use crate::identity::IdentityResolver;
use crate::repository::AccessRepository;
use crate::resolvers::ResolverRegistry;
use crate::types::{Action, Resource, UserContext};

/// The access core as the HTTP layer consumes it
///
/// ```text
/// token ─► TokenManager::verify ─► IdentityResolver::resolve ─► UserContext
///                                                                   │
///                          PermissionEngine::has_permission ◄───────┘
/// ```
pub struct AccessCore {
    tokens: TokenManager,
    identities: IdentityResolver,
    engine: PermissionEngine,
}

impl AccessCore {
    /// Build every component from configuration
    ///
    /// Fails only on misconfiguration (secret, algorithm, durations, grants).
    pub fn from_config(config: AccessConfig, repository: Arc<dyn AccessRepository>) -> Result<Self> {
        let grants = config.grant_table()?;
        let tokens = TokenManager::new(config.token)?;
        let identities = IdentityResolver::new(Arc::clone(&repository), config.identity_cache);
        let engine = PermissionEngine::new(
            Arc::new(grants),
            Arc::new(ResolverRegistry::standard()),
            repository,
            config.engine,
        );

        info!("AccessCore initialized");

        Ok(Self {
            tokens,
            identities,
            engine,
        })
    }

    pub fn tokens(&self) -> &TokenManager {
        &self.tokens
    }

    pub fn identities(&self) -> &IdentityResolver {
        &self.identities
    }

    pub fn engine(&self) -> &PermissionEngine {
        &self.engine
    }

    /// Verify `token` and resolve its subject
    ///
    /// [`AuthzError::TokenInvalid`] and [`AuthzError::IdentityNotFound`] are
    /// authentication failures. A repository outage surfaces as
    /// [`AuthzError::IdentityUnavailable`], which carries no repository detail.
    pub async fn authenticate(&self, token: &str) -> Result<Arc<UserContext>> {
        let claims = self.tokens.verify(token).ok_or(AuthzError::TokenInvalid)?;
        debug!(subject = %claims.sub, "Token verified");
        self.identities.resolve(&claims.sub).await
    }

    /// Authenticate then authorize in one step
    pub async fn authorize(
        &self,
        token: &str,
        resource: Resource,
        action: Action,
        resource_id: &str,
    ) -> Result<bool> {
        let requester = self.authenticate(token).await?;
        Ok(self
            .engine
            .has_permission(&requester, resource, action, resource_id)
            .await)
    }

    /// Issue an access/refresh pair for `identity`
    pub fn issue_tokens(&self, identity: &TokenPayload) -> Result<TokenPair> {
        Ok(self.tokens.generate_token_pair(identity)?)
    }
}
