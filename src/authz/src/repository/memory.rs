//! In-memory repository over a serde-loadable fixture

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use super::{
    AccessRepository, ClassPath, DocumentPath, IdentityRecord, ShiftLink, StudentPath,
};
use crate::error::{AuthzError, Result};
use crate::types::EntityId;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudentRow {
    #[serde(default)]
    pub class_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassRow {
    #[serde(default)]
    pub course_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CourseRow {
    #[serde(default)]
    pub supervisor_id: Option<EntityId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HospitalRow {
    #[serde(default)]
    pub manager_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftRow {
    pub student_id: EntityId,
    pub hospital_id: EntityId,
    #[serde(default)]
    pub preceptor_id: Option<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRow {
    pub student_id: EntityId,
}

/// Plain rows keyed by id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryFixture {
    #[serde(default)]
    pub users: HashMap<EntityId, IdentityRecord>,
    #[serde(default)]
    pub students: HashMap<EntityId, StudentRow>,
    #[serde(default)]
    pub classes: HashMap<EntityId, ClassRow>,
    #[serde(default)]
    pub courses: HashMap<EntityId, CourseRow>,
    #[serde(default)]
    pub hospitals: HashMap<EntityId, HospitalRow>,
    #[serde(default)]
    pub shifts: HashMap<EntityId, ShiftRow>,
    #[serde(default)]
    pub documents: HashMap<EntityId, DocumentRow>,
}

impl RepositoryFixture {
    /// Load a JSON fixture file
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        use anyhow::Context;

        let contents = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read fixture {}", path.as_ref().display()))?;
        serde_json::from_str(&contents).context("Failed to parse fixture")
    }

    fn shift_link(&self, shift_id: &str, shift: &ShiftRow) -> ShiftLink {
        ShiftLink {
            shift_id: shift_id.to_string(),
            hospital_id: shift.hospital_id.clone(),
            preceptor_id: shift.preceptor_id.clone(),
            manager_ids: self
                .hospitals
                .get(&shift.hospital_id)
                .map(|h| h.manager_ids.clone())
                .unwrap_or_default(),
        }
    }

    fn shifts_of<'a>(&'a self, student_id: &'a str) -> impl Iterator<Item = (&'a EntityId, &'a ShiftRow)> {
        self.shifts
            .iter()
            .filter(move |(_, shift)| shift.student_id == student_id)
    }

    fn supervisor_of_class(&self, class_id: &str) -> Option<EntityId> {
        self.classes
            .get(class_id)
            .and_then(|class| class.course_id.as_ref())
            .and_then(|course_id| self.courses.get(course_id))
            .and_then(|course| course.supervisor_id.clone())
    }

    fn managers_for_students<'a>(&self, student_ids: impl Iterator<Item = &'a str>) -> Vec<EntityId> {
        let mut managers: Vec<EntityId> = Vec::new();
        for student_id in student_ids {
            for (_, shift) in self.shifts_of(student_id) {
                if let Some(hospital) = self.hospitals.get(&shift.hospital_id) {
                    for manager in &hospital.manager_ids {
                        if !managers.contains(manager) {
                            managers.push(manager.clone());
                        }
                    }
                }
            }
        }
        managers
    }
}

/// Repository backed by a [`RepositoryFixture`]
///
/// Counts calls and can be switched into a failing or slow mode, which is how
/// tests exercise the engine's fail-closed paths.
pub struct InMemoryRepository {
    data: Arc<RwLock<RepositoryFixture>>,
    calls: AtomicUsize,
    failing: AtomicBool,
    latency: parking_lot::Mutex<Option<Duration>>,
}

impl InMemoryRepository {
    pub fn new(fixture: RepositoryFixture) -> Self {
        Self {
            data: Arc::new(RwLock::new(fixture)),
            calls: AtomicUsize::new(0),
            failing: AtomicBool::new(false),
            latency: parking_lot::Mutex::new(None),
        }
    }

    /// Number of repository calls served so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail with a database error
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Delay every subsequent call
    pub fn set_latency(&self, latency: Option<Duration>) {
        *self.latency.lock() = latency;
    }

    /// Apply a mutation to the underlying rows
    pub async fn update<F: FnOnce(&mut RepositoryFixture)>(&self, f: F) {
        let mut data = self.data.write().await;
        f(&mut data);
    }

    async fn enter(&self) -> Result<tokio::sync::RwLockReadGuard<'_, RepositoryFixture>> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if self.failing.load(Ordering::SeqCst) {
            return Err(AuthzError::DatabaseError("connection refused".to_string()));
        }

        Ok(self.data.read().await)
    }
}

impl Default for InMemoryRepository {
    fn default() -> Self {
        Self::new(RepositoryFixture::default())
    }
}

#[async_trait]
impl AccessRepository for InMemoryRepository {
    async fn find_identity(&self, subject_id: &str) -> Result<Option<IdentityRecord>> {
        let data = self.enter().await?;
        Ok(data.users.get(subject_id).cloned())
    }

    async fn student_shifts(&self, student_id: &str) -> Result<Option<Vec<ShiftLink>>> {
        let data = self.enter().await?;
        if !data.students.contains_key(student_id) {
            return Ok(None);
        }

        Ok(Some(
            data.shifts_of(student_id)
                .map(|(id, shift)| data.shift_link(id, shift))
                .collect(),
        ))
    }

    async fn shift(&self, shift_id: &str) -> Result<Option<ShiftLink>> {
        let data = self.enter().await?;
        Ok(data
            .shifts
            .get(shift_id)
            .map(|shift| data.shift_link(shift_id, shift)))
    }

    async fn hospital_preceptors(&self, hospital_id: &str) -> Result<Option<Vec<EntityId>>> {
        let data = self.enter().await?;
        if !data.hospitals.contains_key(hospital_id) {
            return Ok(None);
        }

        let mut preceptors: Vec<EntityId> = data
            .shifts
            .values()
            .filter(|shift| shift.hospital_id == hospital_id)
            .filter_map(|shift| shift.preceptor_id.clone())
            .collect();
        preceptors.sort();
        preceptors.dedup();
        Ok(Some(preceptors))
    }

    async fn student_path(&self, student_id: &str) -> Result<Option<StudentPath>> {
        let data = self.enter().await?;
        let Some(student) = data.students.get(student_id) else {
            return Ok(None);
        };

        Ok(Some(StudentPath {
            class_id: student.class_id.clone(),
            supervisor_id: student
                .class_id
                .as_deref()
                .and_then(|class_id| data.supervisor_of_class(class_id)),
            shift_ids: data.shifts_of(student_id).map(|(id, _)| id.clone()).collect(),
        }))
    }

    async fn class_path(&self, class_id: &str) -> Result<Option<ClassPath>> {
        let data = self.enter().await?;
        let Some(class) = data.classes.get(class_id) else {
            return Ok(None);
        };

        Ok(Some(ClassPath {
            course_id: class.course_id.clone(),
            supervisor_id: data.supervisor_of_class(class_id),
        }))
    }

    async fn class_hospital_managers(&self, class_id: &str) -> Result<Option<Vec<EntityId>>> {
        let data = self.enter().await?;
        if !data.classes.contains_key(class_id) {
            return Ok(None);
        }

        let students = data
            .students
            .iter()
            .filter(|(_, student)| student.class_id.as_deref() == Some(class_id))
            .map(|(id, _)| id.as_str());
        Ok(Some(data.managers_for_students(students)))
    }

    async fn document_path(&self, document_id: &str) -> Result<Option<DocumentPath>> {
        let data = self.enter().await?;
        let Some(document) = data.documents.get(document_id) else {
            return Ok(None);
        };

        let class_id = data
            .students
            .get(&document.student_id)
            .and_then(|student| student.class_id.clone());
        let supervisor_id = class_id
            .as_deref()
            .and_then(|class_id| data.supervisor_of_class(class_id));

        Ok(Some(DocumentPath {
            student_id: document.student_id.clone(),
            class_id,
            supervisor_id,
        }))
    }

    async fn document_hospital_managers(&self, document_id: &str) -> Result<Option<Vec<EntityId>>> {
        let data = self.enter().await?;
        let Some(document) = data.documents.get(document_id) else {
            return Ok(None);
        };

        Ok(Some(
            data.managers_for_students(std::iter::once(document.student_id.as_str())),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> RepositoryFixture {
        let mut f = RepositoryFixture::default();
        f.courses.insert("course-1".into(), CourseRow { supervisor_id: Some("sup-1".into()) });
        f.classes.insert("class-1".into(), ClassRow { course_id: Some("course-1".into()) });
        f.students.insert("stu-1".into(), StudentRow { class_id: Some("class-1".into()) });
        f.hospitals.insert("hosp-1".into(), HospitalRow { manager_ids: vec!["hm-1".into()] });
        f.shifts.insert(
            "shift-1".into(),
            ShiftRow {
                student_id: "stu-1".into(),
                hospital_id: "hosp-1".into(),
                preceptor_id: Some("pre-1".into()),
            },
        );
        f.documents.insert("doc-1".into(), DocumentRow { student_id: "stu-1".into() });
        f
    }

    #[tokio::test]
    async fn test_relation_paths() {
        let repo = InMemoryRepository::new(fixture());

        let path = repo.student_path("stu-1").await.unwrap().unwrap();
        assert_eq!(path.supervisor_id.as_deref(), Some("sup-1"));
        assert_eq!(path.shift_ids, vec!["shift-1".to_string()]);

        let shift = repo.shift("shift-1").await.unwrap().unwrap();
        assert_eq!(shift.manager_ids, vec!["hm-1".to_string()]);

        let doc = repo.document_path("doc-1").await.unwrap().unwrap();
        assert_eq!(doc.supervisor_id.as_deref(), Some("sup-1"));

        assert_eq!(
            repo.class_hospital_managers("class-1").await.unwrap(),
            Some(vec!["hm-1".to_string()])
        );
        assert_eq!(
            repo.hospital_preceptors("hosp-1").await.unwrap(),
            Some(vec!["pre-1".to_string()])
        );
        assert_eq!(repo.calls(), 5);
    }

    #[tokio::test]
    async fn test_missing_entities() {
        let repo = InMemoryRepository::new(fixture());
        assert!(repo.student_shifts("nobody").await.unwrap().is_none());
        assert!(repo.document_hospital_managers("doc-x").await.unwrap().is_none());
        assert!(repo.find_identity("ghost").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_failing_mode() {
        let repo = InMemoryRepository::new(fixture());
        repo.set_failing(true);
        assert!(matches!(
            repo.shift("shift-1").await,
            Err(AuthzError::DatabaseError(_))
        ));
    }

    #[test]
    fn test_fixture_from_json() {
        let fixture: RepositoryFixture = serde_json::from_str(
            r#"{
                "users": {"u-1": {"roles": ["Student"], "student_id": "stu-1"}},
                "students": {"stu-1": {"class_id": null}}
            }"#,
        )
        .unwrap();
        assert_eq!(fixture.users["u-1"].roles, vec!["Student".to_string()]);
        assert!(fixture.shifts.is_empty());
    }
}
