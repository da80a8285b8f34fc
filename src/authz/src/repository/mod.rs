//! Relationship repository consumed by the access core
//!
//! Each method fetches exactly one relation path and returns plain identifiers,
//! so ownership predicates can be evaluated in memory. `Ok(None)` means the
//! starting entity does not exist.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::EntityId;

pub mod memory;

pub use memory::{InMemoryRepository, RepositoryFixture};

/// Role names and per-role record ids for one subject
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    /// Role names as stored; unknown names are ignored on resolution
    #[serde(default)]
    pub roles: Vec<String>,

    #[serde(default)]
    pub student_id: Option<EntityId>,

    #[serde(default)]
    pub hospital_manager_id: Option<EntityId>,

    #[serde(default)]
    pub preceptor_id: Option<EntityId>,

    #[serde(default)]
    pub supervisor_id: Option<EntityId>,
}

/// A shift with the ids needed to judge who may see it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftLink {
    pub shift_id: EntityId,
    pub hospital_id: EntityId,
    pub preceptor_id: Option<EntityId>,
    /// Hospital-manager record ids of the hosting hospital
    pub manager_ids: Vec<EntityId>,
}

/// student → class → course → supervisor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentPath {
    pub class_id: Option<EntityId>,
    pub supervisor_id: Option<EntityId>,
    pub shift_ids: Vec<EntityId>,
}

/// class → course → supervisor
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassPath {
    pub course_id: Option<EntityId>,
    pub supervisor_id: Option<EntityId>,
}

/// document → student → class → course → supervisor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPath {
    pub student_id: EntityId,
    pub class_id: Option<EntityId>,
    pub supervisor_id: Option<EntityId>,
}

/// Read-only relationship queries
#[async_trait]
pub trait AccessRepository: Send + Sync {
    /// Role set and per-role record ids of a subject
    async fn find_identity(&self, subject_id: &str) -> Result<Option<IdentityRecord>>;

    /// All shifts of a student
    async fn student_shifts(&self, student_id: &str) -> Result<Option<Vec<ShiftLink>>>;

    /// One shift
    async fn shift(&self, shift_id: &str) -> Result<Option<ShiftLink>>;

    /// Preceptor ids with at least one shift at the hospital
    async fn hospital_preceptors(&self, hospital_id: &str) -> Result<Option<Vec<EntityId>>>;

    /// A student's class, supervising user and shift ids
    async fn student_path(&self, student_id: &str) -> Result<Option<StudentPath>>;

    /// A class's course and supervisor
    async fn class_path(&self, class_id: &str) -> Result<Option<ClassPath>>;

    /// Hospital-manager ids of every hospital hosting a shift of a class's students
    async fn class_hospital_managers(&self, class_id: &str) -> Result<Option<Vec<EntityId>>>;

    /// A document's owning student and that student's supervisor chain
    async fn document_path(&self, document_id: &str) -> Result<Option<DocumentPath>>;

    /// Hospital-manager ids of every hospital hosting a shift of the document's student
    async fn document_hospital_managers(&self, document_id: &str) -> Result<Option<Vec<EntityId>>>;
}
