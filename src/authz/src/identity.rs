//! Identity resolution with a bounded, TTL-limited cache
//!
//! Maps a verified token subject to a [`UserContext`]. Capacity eviction (least
//! recently used) and time eviction (TTL from insertion) trigger independently.

use lru::LruCache;
use parking_lot::Mutex;
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

use crate::error::{AuthzError, Result};
use crate::repository::{AccessRepository, IdentityRecord};
use crate::types::{Role, UserContext};

/// Identity cache configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityCacheConfig {
    /// Maximum number of cached subjects
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Time-to-live of a cached subject, in seconds
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

impl Default for IdentityCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

impl IdentityCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

fn default_capacity() -> usize { 500 }
fn default_ttl_secs() -> u64 { 30 * 60 }

/// Cached entry with TTL
struct CachedIdentity {
    context: Arc<UserContext>,
    cached_at: Instant,
}

impl CachedIdentity {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.cached_at.elapsed() > ttl
    }
}

/// Identity cache statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IdentityCacheStats {
    pub hits: usize,
    pub misses: usize,
    pub expirations: usize,
    pub entries: usize,
    pub capacity: usize,
}

impl IdentityCacheStats {
    /// Calculate cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Resolves subjects to user contexts, caching the result
///
/// The lock is never held across the repository call: two concurrent misses for
/// the same subject both hit the repository and the later insert wins. Entries
/// are derived data, so either is correct.
pub struct IdentityResolver {
    repository: Arc<dyn AccessRepository>,
    cache: Mutex<LruCache<String, CachedIdentity>>,
    ttl: Duration,
    capacity: usize,
    hits: AtomicUsize,
    misses: AtomicUsize,
    expirations: AtomicUsize,
}

impl IdentityResolver {
    pub fn new(repository: Arc<dyn AccessRepository>, config: IdentityCacheConfig) -> Self {
        let capacity = NonZeroUsize::new(config.capacity).unwrap_or(NonZeroUsize::MIN);

        Self {
            repository,
            cache: Mutex::new(LruCache::new(capacity)),
            ttl: config.ttl(),
            capacity: capacity.get(),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            expirations: AtomicUsize::new(0),
        }
    }

    /// Resolve `subject_id`, from cache when fresh
    ///
    /// # Errors
    ///
    /// - [`AuthzError::IdentityNotFound`] when the repository has no such subject.
    ///   This is an authentication failure.
    /// - [`AuthzError::IdentityUnavailable`] when the lookup itself fails. The
    ///   repository error is logged here and not carried in the returned error.
    ///   This is not an authentication failure; the caller should retry later.
    pub async fn resolve(&self, subject_id: &str) -> Result<Arc<UserContext>> {
        if let Some(context) = self.cached(subject_id) {
            return Ok(context);
        }

        let record = match self.repository.find_identity(subject_id).await {
            Ok(record) => record,
            Err(e) => {
                warn!(subject = subject_id, error = %e, "Identity lookup failed");
                return Err(AuthzError::IdentityUnavailable);
            }
        };
        let Some(record) = record else {
            info!(subject = subject_id, "Identity not found");
            return Err(AuthzError::IdentityNotFound(subject_id.to_string()));
        };

        let context = Arc::new(build_context(subject_id, record));
        self.cache.lock().put(
            subject_id.to_string(),
            CachedIdentity {
                context: Arc::clone(&context),
                cached_at: Instant::now(),
            },
        );

        Ok(context)
    }

    /// Drop a subject so the next resolve reloads it (e.g. after a role change)
    pub fn invalidate(&self, subject_id: &str) -> bool {
        self.cache.lock().pop(subject_id).is_some()
    }

    /// Drop every cached subject
    pub fn clear(&self) {
        self.cache.lock().clear();
    }

    pub fn stats(&self) -> IdentityCacheStats {
        IdentityCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            entries: self.cache.lock().len(),
            capacity: self.capacity,
        }
    }

    fn cached(&self, subject_id: &str) -> Option<Arc<UserContext>> {
        let mut cache = self.cache.lock();

        let lookup = cache
            .get(subject_id)
            .map(|entry| (!entry.is_expired(self.ttl)).then(|| Arc::clone(&entry.context)));

        match lookup {
            Some(Some(context)) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(subject = subject_id, "Identity cache hit");
                return Some(context);
            }
            Some(None) => {
                cache.pop(subject_id);
                self.expirations.fetch_add(1, Ordering::Relaxed);
            }
            None => {}
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        debug!(subject = subject_id, "Identity cache miss");
        None
    }
}

/// Keep known roles in stored order; attach record ids only for held roles.
fn build_context(subject_id: &str, record: IdentityRecord) -> UserContext {
    let mut context = UserContext::new(subject_id);

    for name in &record.roles {
        let role = match name.parse::<Role>() {
            Ok(role) => role,
            Err(_) => {
                warn!(subject = subject_id, role = %name, "Ignoring unknown role");
                continue;
            }
        };

        let record_id = match role {
            Role::Student => record.student_id.clone(),
            Role::HospitalManager => record.hospital_manager_id.clone(),
            Role::Preceptor => record.preceptor_id.clone(),
            Role::Supervisor => record.supervisor_id.clone(),
            Role::SysAdmin | Role::OrgAdmin => None,
        };

        context = match record_id {
            Some(id) => context.with_role_record(role, id),
            None => context.with_role(role),
        };
    }

    context
}
