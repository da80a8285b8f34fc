//! Permission check and identity resolution benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use practicum_authz::repository::{
    memory::{ClassRow, CourseRow, DocumentRow, HospitalRow, ShiftRow, StudentRow},
    IdentityRecord, InMemoryRepository, RepositoryFixture,
};
use practicum_authz::{
    Action, IdentityCacheConfig, IdentityResolver, PermissionEngine, Resource, Role, UserContext,
};
use std::sync::Arc;
use tokio::runtime::Runtime;

/// `count` students spread over ten hospitals, one shift and one document each
fn create_fixture(count: usize) -> RepositoryFixture {
    let mut f = RepositoryFixture::default();

    f.courses.insert("course-0".into(), CourseRow { supervisor_id: Some("sup-0".into()) });
    f.classes.insert("class-0".into(), ClassRow { course_id: Some("course-0".into()) });

    for h in 0..10 {
        f.hospitals.insert(
            format!("hosp-{}", h),
            HospitalRow { manager_ids: vec![format!("hm-{}", h)] },
        );
    }

    for i in 0..count {
        f.students.insert(format!("stu-{}", i), StudentRow { class_id: Some("class-0".into()) });
        f.shifts.insert(
            format!("shift-{}", i),
            ShiftRow {
                student_id: format!("stu-{}", i),
                hospital_id: format!("hosp-{}", i % 10),
                preceptor_id: Some(format!("pre-{}", i % 25)),
            },
        );
        f.documents.insert(format!("doc-{}", i), DocumentRow { student_id: format!("stu-{}", i) });
        f.users.insert(
            format!("user-{}", i),
            IdentityRecord {
                roles: vec!["Student".into()],
                student_id: Some(format!("stu-{}", i)),
                ..Default::default()
            },
        );
    }

    f
}

fn bench_permission_check(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let mut group = c.benchmark_group("permission_check");

    for student_count in [100, 1_000, 10_000].iter() {
        let engine = PermissionEngine::standard(Arc::new(InMemoryRepository::new(create_fixture(*student_count))));

        let admin = UserContext::new("admin").with_role(Role::SysAdmin);
        let student = UserContext::new("user-7").with_role_record(Role::Student, "stu-7");
        let manager = UserContext::new("manager").with_role_record(Role::HospitalManager, "hm-7");
        let supervisor = UserContext::new("supervisor").with_role_record(Role::Supervisor, "sup-0");

        group.bench_with_input(BenchmarkId::new("wildcard", student_count), &admin, |b, user| {
            b.to_async(&rt).iter(|| async {
                black_box(engine.has_permission(user, Resource::Student, Action::Read, "stu-7").await)
            });
        });

        group.bench_with_input(BenchmarkId::new("own_record", student_count), &student, |b, user| {
            b.to_async(&rt).iter(|| async {
                black_box(engine.has_permission(user, Resource::Student, Action::Read, "stu-7").await)
            });
        });

        group.bench_with_input(BenchmarkId::new("managed_hospital", student_count), &manager, |b, user| {
            b.to_async(&rt).iter(|| async {
                black_box(engine.has_permission(user, Resource::Student, Action::Read, "stu-7").await)
            });
        });

        group.bench_with_input(BenchmarkId::new("supervised_document", student_count), &supervisor, |b, user| {
            b.to_async(&rt).iter(|| async {
                black_box(engine.has_permission(user, Resource::Document, Action::Approve, "doc-7").await)
            });
        });
    }

    group.finish();
}

fn bench_filter_permitted(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let engine = PermissionEngine::standard(Arc::new(InMemoryRepository::new(create_fixture(1_000))));
    let manager = UserContext::new("manager").with_role_record(Role::HospitalManager, "hm-3");
    let ids: Vec<String> = (0..100).map(|i| format!("stu-{}", i)).collect();

    c.bench_function("filter_permitted_100", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                engine
                    .filter_permitted(&manager, Resource::Student, Action::Read, black_box(&ids))
                    .await,
            )
        });
    });
}

fn bench_identity_resolution(c: &mut Criterion) {
    let rt = Runtime::new().unwrap();
    let identities = IdentityResolver::new(
        Arc::new(InMemoryRepository::new(create_fixture(1_000))),
        IdentityCacheConfig::default(),
    );

    // Warm the cache
    rt.block_on(async {
        identities.resolve("user-42").await.unwrap();
    });

    c.bench_function("identity_cache_hit", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(identities.resolve(black_box("user-42")).await.unwrap())
        });
    });

    c.bench_function("identity_cache_cold", |b| {
        b.to_async(&rt).iter(|| async {
            identities.clear();
            black_box(identities.resolve(black_box("user-42")).await.unwrap())
        });
    });
}

criterion_group!(
    benches,
    bench_permission_check,
    bench_filter_permitted,
    bench_identity_resolution
);
criterion_main!(benches);
