//! # Practicum Access Core
//!
//! Identity and access core of the clinical-internship administration platform.
//!
//! ## Features
//!
//! - **Identity resolution** from verified token subjects, with a bounded TTL cache
//! - **Grant table** of per-role permission literals (`Resource:Action_Modifier`, `*`)
//! - **Ownership resolvers** that place a resource instance inside a requester's
//!   scope by walking domain relationships (shift → hospital → managers, ...)
//! - **Decision engine** that fails closed: errors, timeouts and gaps all deny
//!
//! ## Example
//!
//! ```rust
//! use practicum_authz::{
//!     repository::InMemoryRepository, Action, PermissionEngine, Resource, Role, UserContext,
//! };
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() {
//!     let engine = PermissionEngine::standard(Arc::new(InMemoryRepository::default()));
//!
//!     let student = UserContext::new("user-1").with_role_record(Role::Student, "student-1");
//!
//!     assert!(engine.has_permission(&student, Resource::Student, Action::Read, "student-1").await);
//!     assert!(!engine.has_permission(&student, Resource::Student, Action::Read, "student-2").await);
//! }
//! ```

pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod grants;
pub mod identity;
pub mod repository;
pub mod resolvers;
pub mod types;

// Re-export commonly used types
pub use types::{Action, EntityId, Modifier, Resource, Role, UserContext};
pub use engine::{AccessDecision, DecisionReason, EngineConfig, PermissionEngine};
pub use grants::{GrantTable, PermissionGrant};
pub use identity::{IdentityCacheConfig, IdentityCacheStats, IdentityResolver};
pub use repository::{AccessRepository, InMemoryRepository};
pub use resolvers::{OwnershipResolver, Relation, ResolverRegistry};
pub use config::AccessConfig;
pub use core::AccessCore;
pub use error::{AuthzError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
