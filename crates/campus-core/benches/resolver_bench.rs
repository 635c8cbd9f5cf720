//! # Resolver Benchmarks
//!
//! Performance benchmarks for campus-core resolution over growing snapshots.
//!
//! Run with: `cargo bench -p campus-core`

use campus_core::{
    AcademicYear, BatchRule, MentorAssignment, MentorAssignmentResolver, ResolutionPolicy,
    RollNumber, Scope, Semester, Snapshot, snapshot_checksum,
};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

fn scope(section: usize) -> Scope {
    Scope::new(
        "KMIT",
        "CSE",
        format!("S{section}"),
        Semester::new(3).expect("semester"),
        AcademicYear::starting(2025).expect("year"),
    )
}

/// A snapshot with `sections` sections, each split into two batches of 30.
fn create_snapshot(sections: usize) -> Snapshot {
    let mut rules = Vec::with_capacity(sections * 2);
    let mut assignments = Vec::with_capacity(sections * 2);
    for s in 0..sections {
        for (b, (start, end)) in [(1, 30), (31, 60)].into_iter().enumerate() {
            let batch = format!("B{}", b + 1);
            rules.push(BatchRule::new(
                format!("r{s}-{b}"),
                scope(s),
                batch.clone(),
                Some(start),
                Some(end),
            ));
            assignments.push(MentorAssignment::new(
                format!("a{s}-{b}"),
                format!("EMP{s}-{b}"),
                scope(s),
                batch,
            ));
        }
    }
    Snapshot::new(rules, assignments)
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_resolve_student(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_student_mentor");
    let resolver = MentorAssignmentResolver::new();

    for sections in [10, 100, 1000].iter() {
        let snapshot = create_snapshot(*sections);
        let target = scope(sections / 2);

        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            sections,
            |b, _| {
                b.iter(|| {
                    black_box(resolver.resolve_student_mentor(
                        &snapshot.rules,
                        &snapshot.assignments,
                        &target,
                        RollNumber(45),
                    ))
                });
            },
        );
    }

    group.finish();
}

fn bench_audit(c: &mut Criterion) {
    let mut group = c.benchmark_group("audit");
    let policy = ResolutionPolicy::default();

    for sections in [10, 100, 1000].iter() {
        let snapshot = create_snapshot(*sections);

        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            sections,
            |b, _| {
                b.iter(|| black_box(snapshot.audit(&policy)));
            },
        );
    }

    group.finish();
}

fn bench_checksum(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot_checksum");

    for sections in [10, 100, 1000].iter() {
        let snapshot = create_snapshot(*sections);

        group.bench_with_input(
            BenchmarkId::from_parameter(sections),
            sections,
            |b, _| {
                b.iter(|| black_box(snapshot_checksum(&snapshot)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_resolve_student, bench_audit, bench_checksum);

criterion_main!(benches);
