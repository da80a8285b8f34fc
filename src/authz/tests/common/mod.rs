//! Shared fixture: two hospitals, one supervised course, three students

#![allow(dead_code)]

use practicum_authz::repository::{
    memory::{ClassRow, CourseRow, DocumentRow, HospitalRow, ShiftRow, StudentRow},
    IdentityRecord, InMemoryRepository, RepositoryFixture,
};
use practicum_authz::{Role, UserContext};
use std::sync::Arc;

pub fn fixture() -> RepositoryFixture {
    let mut f = RepositoryFixture::default();

    f.hospitals.insert("hosp-1".into(), HospitalRow { manager_ids: vec!["hm-1".into()] });
    f.hospitals.insert("hosp-2".into(), HospitalRow { manager_ids: vec!["hm-2".into()] });

    f.courses.insert("course-1".into(), CourseRow { supervisor_id: Some("sup-1".into()) });
    f.classes.insert("class-1".into(), ClassRow { course_id: Some("course-1".into()) });
    f.classes.insert("class-2".into(), ClassRow { course_id: None });

    f.students.insert("stu-1".into(), StudentRow { class_id: Some("class-1".into()) });
    f.students.insert("stu-2".into(), StudentRow { class_id: Some("class-2".into()) });
    // Enrolled but never scheduled.
    f.students.insert("stu-3".into(), StudentRow { class_id: Some("class-1".into()) });

    f.shifts.insert(
        "shift-1".into(),
        ShiftRow {
            student_id: "stu-1".into(),
            hospital_id: "hosp-1".into(),
            preceptor_id: Some("pre-1".into()),
        },
    );
    f.shifts.insert(
        "shift-2".into(),
        ShiftRow {
            student_id: "stu-2".into(),
            hospital_id: "hosp-2".into(),
            preceptor_id: Some("pre-2".into()),
        },
    );

    f.documents.insert("doc-1".into(), DocumentRow { student_id: "stu-1".into() });
    f.documents.insert("doc-2".into(), DocumentRow { student_id: "stu-2".into() });

    let user = |roles: &[&str]| IdentityRecord {
        roles: roles.iter().map(|r| r.to_string()).collect(),
        ..Default::default()
    };

    f.users.insert("admin".into(), user(&["SysAdmin"]));
    f.users.insert("org".into(), user(&["OrgAdmin"]));
    f.users.insert(
        "manager".into(),
        IdentityRecord {
            hospital_manager_id: Some("hm-1".into()),
            ..user(&["HospitalManager"])
        },
    );
    f.users.insert(
        "preceptor".into(),
        IdentityRecord {
            preceptor_id: Some("pre-1".into()),
            ..user(&["Preceptor"])
        },
    );
    f.users.insert(
        "student".into(),
        IdentityRecord {
            student_id: Some("stu-1".into()),
            ..user(&["Student"])
        },
    );
    f.users.insert(
        "supervisor".into(),
        IdentityRecord {
            supervisor_id: Some("sup-1".into()),
            ..user(&["Supervisor"])
        },
    );
    f.users.insert("janitor".into(), user(&["Janitor"]));

    f
}

pub fn repository() -> Arc<InMemoryRepository> {
    Arc::new(InMemoryRepository::new(fixture()))
}

pub fn manager() -> UserContext {
    UserContext::new("manager").with_role_record(Role::HospitalManager, "hm-1")
}

pub fn preceptor() -> UserContext {
    UserContext::new("preceptor").with_role_record(Role::Preceptor, "pre-1")
}

pub fn student() -> UserContext {
    UserContext::new("student").with_role_record(Role::Student, "stu-1")
}

pub fn supervisor() -> UserContext {
    UserContext::new("supervisor").with_role_record(Role::Supervisor, "sup-1")
}
