//! # Property-Based Tests
//!
//! Determinism and correctness invariants of term and batch resolution,
//! checked with proptest.

use campus_core::{
    AcademicTermResolver, AcademicYear, BatchRule, MentorAssignment, MentorAssignmentResolver,
    RollNumber, Scope, Semester, Snapshot, roll_from_student_id, snapshot_checksum,
};
use chrono::NaiveDate;
use proptest::prelude::*;

fn scope() -> Scope {
    Scope::new(
        "KMIT",
        "CSE",
        "A",
        Semester::new(1).expect("semester"),
        AcademicYear::starting(2025).expect("year"),
    )
}

/// `count` contiguous, non-overlapping batches of `width` rolls starting at 1.
fn partition(count: u32, width: u32) -> Vec<BatchRule> {
    (0..count)
        .map(|i| {
            BatchRule::new(
                format!("r{i}"),
                scope(),
                format!("B{}", i + 1),
                Some(i * width + 1),
                Some((i + 1) * width),
            )
        })
        .collect()
}

// =============================================================================
// PROPERTY TESTS
// =============================================================================

proptest! {
    /// Year-level stays in 1..=4 and the window is always [2l-1, 2l].
    #[test]
    fn window_invariant(
        admission in 1990i32..=2030,
        year in 1990i32..=2035,
        month in 1u32..=12,
    ) {
        prop_assume!(admission <= year);
        let reference = NaiveDate::from_ymd_opt(year, month, 1).expect("date");
        let window = AcademicTermResolver::resolve_window(admission, reference).expect("window");

        let level = window.year_level.value();
        prop_assert!((1..=4).contains(&level));
        prop_assert_eq!(window.valid_semesters[0].value(), 2 * level - 1);
        prop_assert_eq!(window.valid_semesters[1].value(), 2 * level);
    }

    /// Three or more full academic years elapsed always clamps to 4.
    #[test]
    fn clamp_to_fourth_year(admission in 1990i32..=2020, extra in 3i32..=20, month in 6u32..=12) {
        let reference = NaiveDate::from_ymd_opt(admission + extra, month, 15).expect("date");
        let level = AcademicTermResolver::resolve_year_level(admission, reference).expect("level");
        prop_assert_eq!(level.value(), 4);
    }

    /// A later reference date never lowers the year-level.
    #[test]
    fn year_level_is_monotonic(admission in 2000i32..=2024, days in 0i64..=2000, later in 0i64..=400) {
        let start = NaiveDate::from_ymd_opt(admission, 1, 1).expect("date");
        let earlier = start + chrono::Duration::days(days);
        let after = earlier + chrono::Duration::days(later);

        let a = AcademicTermResolver::resolve_year_level(admission, earlier).expect("level");
        let b = AcademicTermResolver::resolve_year_level(admission, after).expect("level");
        prop_assert!(a <= b);
    }

    /// In a non-overlapping partition every covered roll resolves to exactly its batch.
    #[test]
    fn partition_resolves_uniquely(count in 1u32..=6, width in 1u32..=40, roll in 1u32..=300) {
        let rules = partition(count, width);
        let resolver = MentorAssignmentResolver::new();
        let found = resolver
            .resolve_batch(&rules, &scope(), RollNumber(roll))
            .expect("no ambiguity in a partition");

        if roll <= count * width {
            let expected = format!("B{}", (roll - 1) / width + 1);
            prop_assert_eq!(found.map(|r| r.batch_name.as_str().to_string()), Some(expected));
        } else {
            prop_assert!(found.is_none());
        }
    }

    /// Identical snapshots give identical answers, call after call.
    #[test]
    fn resolution_is_idempotent(count in 1u32..=4, width in 5u32..=30, roll in 1u32..=120) {
        let rules = partition(count, width);
        let assignments: Vec<MentorAssignment> = (0..count)
            .map(|i| MentorAssignment::new(format!("a{i}"), format!("EMP{i:02}"), scope(), format!("B{}", i + 1)))
            .collect();
        let resolver = MentorAssignmentResolver::new();

        let first = resolver
            .resolve_student_mentor(&rules, &assignments, &scope(), RollNumber(roll))
            .expect("resolve")
            .map(|m| m.mentor_id().clone());
        let second = resolver
            .resolve_student_mentor(&rules, &assignments, &scope(), RollNumber(roll))
            .expect("resolve")
            .map(|m| m.mentor_id().clone());
        prop_assert_eq!(first, second);
    }

    /// The snapshot checksum does not depend on record order.
    #[test]
    fn checksum_is_order_independent(count in 1u32..=8, rotate in 0usize..8) {
        let rules = partition(count, 10);
        let mut rotated = rules.clone();
        rotated.rotate_left(rotate % rules.len());

        let a = snapshot_checksum(&Snapshot::new(rules, vec![])).expect("checksum");
        let b = snapshot_checksum(&Snapshot::new(rotated, vec![])).expect("checksum");
        prop_assert_eq!(a, b);
    }

    /// The roll number is the two-digit suffix, whatever precedes it.
    #[test]
    fn roll_is_two_digit_suffix(prefix in "[0-9A-Z]{0,10}", roll in 0u32..100) {
        let id = format!("{prefix}{roll:02}");
        prop_assert_eq!(roll_from_student_id(&id).expect("roll"), RollNumber(roll));
    }
}
