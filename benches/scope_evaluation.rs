//! Scope Evaluation Benchmarks
//!
//! Measures `in_scope` over directories of increasing size, with and
//! without the caching wrapper.

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use mdm_objects::config::ScopeConfig;
use mdm_objects::scope::{
    CachedDirectory, MemoryDirectory, NetworkSegment, Scope, ScopeKey, ScopeSubject, TargetKind,
};

/// A directory with `size` computers, groups and segments
fn directory(size: u64) -> MemoryDirectory {
    let mut directory = MemoryDirectory::new()
        .with_ldap_group("Engineers", (0..size).map(|i| format!("user{}", i)));
    for i in 0..size {
        directory = directory
            .with_entity(ScopeKey::Computers, i, format!("mac-{}", i))
            .with_entity(ScopeKey::ComputerGroups, i, format!("group-{}", i));
        if let Ok(segment) = NetworkSegment::new(
            i,
            format!("segment-{}", i),
            &format!("10.{}.{}.0", i / 256, i % 256),
            &format!("10.{}.{}.255", i / 256, i % 256),
        ) {
            directory = directory.with_segment(segment);
        }
    }
    directory
}

fn scope_for(directory: &MemoryDirectory, size: u64) -> Scope {
    let mut scope = Scope::new(TargetKind::Computers, ScopeConfig::default());
    for i in (0..size).step_by(2) {
        scope.add_target(directory, ScopeKey::ComputerGroups, i).unwrap();
        scope.add_limitation(directory, ScopeKey::NetworkSegments, i).unwrap();
    }
    scope.add_limitation(directory, ScopeKey::LdapUserGroups, "Engineers").unwrap();
    for i in (1..size).step_by(2) {
        scope.add_exclusion(directory, ScopeKey::Computers, i).unwrap();
    }
    scope
}

fn subject(i: u64) -> ScopeSubject {
    ScopeSubject::new(i)
        .in_groups([i])
        .at_address(format!("10.{}.{}.17", i / 256, i % 256).parse().unwrap())
        .used_by(format!("user{}", i))
}

fn bench_in_scope(c: &mut Criterion) {
    let mut group = c.benchmark_group("in_scope");

    for size in [10u64, 100, 1000].iter() {
        let plain = directory(*size);
        let scope = scope_for(&plain, *size);
        let cached = CachedDirectory::new(directory(*size));
        let probe = subject((size / 2) & !1);

        group.bench_with_input(BenchmarkId::new("memory_directory", size), &probe, |b, probe| {
            b.iter(|| black_box(scope.in_scope(&plain, probe).unwrap()))
        });
        group.bench_with_input(BenchmarkId::new("cached_directory", size), &probe, |b, probe| {
            b.iter(|| black_box(scope.in_scope(&cached, probe).unwrap()))
        });
    }
    group.finish();
}

fn bench_mutation(c: &mut Criterion) {
    let mut group = c.benchmark_group("mutation");
    let directory = directory(100);

    group.bench_function("add_target_with_conflict_check", |b| {
        b.iter(|| {
            let mut scope = Scope::new(TargetKind::Computers, ScopeConfig::default());
            for i in 0..50u64 {
                scope.add_exclusion(&directory, ScopeKey::Computers, i + 50).unwrap();
                scope.add_target(&directory, ScopeKey::Computers, black_box(i)).unwrap();
            }
            black_box(scope)
        })
    });

    let scope = scope_for(&directory, 100);
    group.bench_function("to_xml", |b| b.iter(|| black_box(scope.to_xml().to_document())));
    group.finish();
}

criterion_group!(benches, bench_in_scope, bench_mutation);
criterion_main!(benches);
