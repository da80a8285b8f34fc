//! Ownership resolvers
//!
//! A resolver decides whether one resource instance falls inside the scope a
//! grant gives a requester. Each built-in makes a single repository call for the
//! relation path it needs, then checks ids in memory.
//!
//! # Example
//!
//! ```rust
//! use practicum_authz::grants::GrantTable;
//! use practicum_authz::resolvers::ResolverRegistry;
//!
//! let registry = ResolverRegistry::standard();
//! assert!(registry.unresolved(&GrantTable::standard()).is_empty());
//! ```

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::Result;
use crate::grants::{GrantTable, PermissionGrant};
use crate::repository::AccessRepository;
use crate::types::{Modifier, Resource, Role, UserContext};

/// Scope predicate for one (role, resource, modifier)
#[async_trait]
pub trait OwnershipResolver: Send + Sync {
    /// Whether `resource_id` is inside `requester`'s scope
    async fn owns(
        &self,
        requester: &UserContext,
        resource_id: &str,
        repository: &dyn AccessRepository,
    ) -> Result<bool>;

    /// Short name for logs
    fn name(&self) -> &'static str;
}

/// Built-in relationship predicates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// Always in scope. Used by OrgAdmin `Managed` grants, which carry no
    /// organizational scoping yet.
    Unconditional,

    /// Student has a shift at a hospital the requester manages
    ManagedHospitalStudent,
    /// Shift's hospital is managed by the requester
    ManagedHospitalShift,
    /// Document's student has a shift at a hospital the requester manages
    ManagedHospitalDocument,
    /// Some student of the class has a shift at a hospital the requester manages
    ManagedHospitalClass,

    /// Student has a shift precepted by the requester
    PrecepteeStudent,
    /// Shift is precepted by the requester
    PreceptedShift,
    /// Requester precepts at least one shift at the hospital
    PreceptedHospital,

    /// Document belongs to the requesting student
    OwnDocument,
    /// Requesting student is enrolled in the class
    OwnClass,
    /// Shift is on the requesting student's list
    OwnShift,
    /// Target is the requesting student's own record
    OwnStudentRecord,

    /// Student's class → course is supervised by the requester
    SupervisedStudent,
    /// Class → course is supervised by the requester
    SupervisedClass,
    /// Document's student → class → course is supervised by the requester
    SupervisedStudentDocument,
}

#[async_trait]
impl OwnershipResolver for Relation {
    async fn owns(
        &self,
        requester: &UserContext,
        resource_id: &str,
        repository: &dyn AccessRepository,
    ) -> Result<bool> {
        use Relation::*;

        let manager = requester.hospital_manager_id.as_deref();
        let preceptor = requester.preceptor_id.as_deref();
        let student = requester.student_id.as_deref();
        let supervisor = requester.supervisor_id.as_deref();

        match self {
            Unconditional => Ok(true),

            ManagedHospitalStudent => {
                let Some(manager) = manager else { return Ok(false) };
                let shifts = repository.student_shifts(resource_id).await?;
                Ok(shifts.is_some_and(|shifts| {
                    shifts.iter().any(|shift| contains(&shift.manager_ids, manager))
                }))
            }
            ManagedHospitalShift => {
                let Some(manager) = manager else { return Ok(false) };
                let shift = repository.shift(resource_id).await?;
                Ok(shift.is_some_and(|shift| contains(&shift.manager_ids, manager)))
            }
            ManagedHospitalDocument => {
                let Some(manager) = manager else { return Ok(false) };
                let managers = repository.document_hospital_managers(resource_id).await?;
                Ok(managers.is_some_and(|ids| contains(&ids, manager)))
            }
            ManagedHospitalClass => {
                let Some(manager) = manager else { return Ok(false) };
                let managers = repository.class_hospital_managers(resource_id).await?;
                Ok(managers.is_some_and(|ids| contains(&ids, manager)))
            }

            PrecepteeStudent => {
                let Some(preceptor) = preceptor else { return Ok(false) };
                let shifts = repository.student_shifts(resource_id).await?;
                Ok(shifts.is_some_and(|shifts| {
                    shifts
                        .iter()
                        .any(|shift| shift.preceptor_id.as_deref() == Some(preceptor))
                }))
            }
            PreceptedShift => {
                let Some(preceptor) = preceptor else { return Ok(false) };
                let shift = repository.shift(resource_id).await?;
                Ok(shift.is_some_and(|shift| shift.preceptor_id.as_deref() == Some(preceptor)))
            }
            PreceptedHospital => {
                let Some(preceptor) = preceptor else { return Ok(false) };
                let preceptors = repository.hospital_preceptors(resource_id).await?;
                Ok(preceptors.is_some_and(|ids| contains(&ids, preceptor)))
            }

            OwnDocument => {
                let Some(student) = student else { return Ok(false) };
                let path = repository.document_path(resource_id).await?;
                Ok(path.is_some_and(|path| path.student_id == student))
            }
            OwnClass => {
                let Some(student) = student else { return Ok(false) };
                let path = repository.student_path(student).await?;
                Ok(path.is_some_and(|path| path.class_id.as_deref() == Some(resource_id)))
            }
            OwnShift => {
                let Some(student) = student else { return Ok(false) };
                let path = repository.student_path(student).await?;
                Ok(path.is_some_and(|path| contains(&path.shift_ids, resource_id)))
            }
            OwnStudentRecord => Ok(student == Some(resource_id)),

            SupervisedStudent => {
                let Some(supervisor) = supervisor else { return Ok(false) };
                let path = repository.student_path(resource_id).await?;
                Ok(path.is_some_and(|path| path.supervisor_id.as_deref() == Some(supervisor)))
            }
            SupervisedClass => {
                let Some(supervisor) = supervisor else { return Ok(false) };
                let path = repository.class_path(resource_id).await?;
                Ok(path.is_some_and(|path| path.supervisor_id.as_deref() == Some(supervisor)))
            }
            SupervisedStudentDocument => {
                let Some(supervisor) = supervisor else { return Ok(false) };
                let path = repository.document_path(resource_id).await?;
                Ok(path.is_some_and(|path| path.supervisor_id.as_deref() == Some(supervisor)))
            }
        }
    }

    fn name(&self) -> &'static str {
        use Relation::*;

        match self {
            Unconditional => "unconditional",
            ManagedHospitalStudent => "managed_hospital_student",
            ManagedHospitalShift => "managed_hospital_shift",
            ManagedHospitalDocument => "managed_hospital_document",
            ManagedHospitalClass => "managed_hospital_class",
            PrecepteeStudent => "preceptee_student",
            PreceptedShift => "precepted_shift",
            PreceptedHospital => "precepted_hospital",
            OwnDocument => "own_document",
            OwnClass => "own_class",
            OwnShift => "own_shift",
            OwnStudentRecord => "own_student_record",
            SupervisedStudent => "supervised_student",
            SupervisedClass => "supervised_class",
            SupervisedStudentDocument => "supervised_student_document",
        }
    }
}

fn contains(ids: &[String], id: &str) -> bool {
    ids.iter().any(|candidate| candidate == id)
}

/// Registry key
pub type ResolverKey = (Role, Resource, Modifier);

/// Immutable (role, resource, modifier) → resolver index
#[derive(Clone, Default)]
pub struct ResolverRegistry {
    resolvers: HashMap<ResolverKey, Arc<dyn OwnershipResolver>>,
}

impl fmt::Debug for ResolverRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut entries: Vec<_> = self
            .resolvers
            .iter()
            .map(|((role, resource, modifier), resolver)| {
                format!("{}/{}/{} => {}", role, resource, modifier, resolver.name())
            })
            .collect();
        entries.sort();
        f.debug_list().entries(entries).finish()
    }
}

impl ResolverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `resolver` for (role, resource, modifier), replacing any previous one
    pub fn register(
        mut self,
        role: Role,
        resource: Resource,
        modifier: Modifier,
        resolver: Arc<dyn OwnershipResolver>,
    ) -> Self {
        self.resolvers.insert((role, resource, modifier), resolver);
        self
    }

    fn relation(self, role: Role, resource: Resource, modifier: Modifier, relation: Relation) -> Self {
        self.register(role, resource, modifier, Arc::new(relation))
    }

    /// Resolvers matching every scoped literal of [`GrantTable::standard`]
    pub fn standard() -> Self {
        use Modifier::*;

        let mut registry = Self::new();

        for resource in [
            Resource::Document,
            Resource::Student,
            Resource::Hospital,
            Resource::School,
            Resource::Course,
            Resource::Classes,
        ] {
            registry = registry.relation(Role::OrgAdmin, resource, Managed, Relation::Unconditional);
        }

        registry
            .relation(Role::HospitalManager, Resource::Student, Own, Relation::ManagedHospitalStudent)
            .relation(Role::HospitalManager, Resource::Shift, Own, Relation::ManagedHospitalShift)
            .relation(Role::HospitalManager, Resource::Document, Managed, Relation::ManagedHospitalDocument)
            .relation(Role::HospitalManager, Resource::Classes, Managed, Relation::ManagedHospitalClass)
            .relation(Role::Preceptor, Resource::Student, Own, Relation::PrecepteeStudent)
            .relation(Role::Preceptor, Resource::Shift, Own, Relation::PreceptedShift)
            .relation(Role::Preceptor, Resource::Hospital, Own, Relation::PreceptedHospital)
            .relation(Role::Student, Resource::Document, Own, Relation::OwnDocument)
            .relation(Role::Student, Resource::Classes, Own, Relation::OwnClass)
            .relation(Role::Student, Resource::Shift, Own, Relation::OwnShift)
            .relation(Role::Student, Resource::Student, Own, Relation::OwnStudentRecord)
            .relation(Role::Supervisor, Resource::Student, Own, Relation::SupervisedStudent)
            .relation(Role::Supervisor, Resource::Classes, Own, Relation::SupervisedClass)
            .relation(Role::Supervisor, Resource::Document, Students, Relation::SupervisedStudentDocument)
    }

    pub fn get(&self, role: Role, resource: Resource, modifier: Modifier) -> Option<&Arc<dyn OwnershipResolver>> {
        self.resolvers.get(&(role, resource, modifier))
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }

    /// Scoped literals in `grants` with no registered resolver. These deny.
    pub fn unresolved(&self, grants: &GrantTable) -> Vec<(Role, PermissionGrant)> {
        let mut missing: Vec<(Role, PermissionGrant)> = grants
            .iter()
            .filter(|(role, grant)| match grant {
                PermissionGrant::Wildcard => false,
                PermissionGrant::Scoped {
                    resource, modifier, ..
                } => self.get(*role, *resource, *modifier).is_none(),
            })
            .map(|(role, grant)| (role, *grant))
            .collect();
        missing.sort_by_key(|(role, grant)| (*role, grant.to_string()));
        missing
    }
}
