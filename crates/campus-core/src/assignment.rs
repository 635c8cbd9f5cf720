//! # Mentor Assignment Resolution
//!
//! Resolves the mentor responsible for a student and guards assignment
//! creation against the locking invariant.
//!
//! Resolution chain: roll number → `BatchRule` → batch name → active
//! `MentorAssignment` → mentor id.
//!
//! ## Locking
//!
//! A locked assignment is authoritative for its scope and batch for the rest
//! of the semester. The resolver never lets a newer unlocked record override
//! it, and `can_create_assignment` refuses new active records for the slot.
//! Enforcing the guard atomically is the persistence layer's job; the
//! resolver only decides.

use crate::batch::resolve_batch;
use crate::canonical::snapshot_checksum;
use crate::primitives::DEFAULT_MAX_ACTIVE_MENTORS_PER_SECTION;
use crate::{
    AcademicYear, AssignmentId, BatchName, BatchRule, CampusError, ConflictReason,
    MentorAssignment, MentorId, RollNumber, Scope, Scoped, Semester, Snapshot,
};
use serde::{Deserialize, Serialize};

// =============================================================================
// POLICY
// =============================================================================

/// How a single locked assignment relates to active unlocked ones in the same slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LockedPrecedence {
    /// An unlocked active record beside a locked one is an integrity fault.
    #[default]
    Strict,
    /// The locked record wins; unlocked siblings are ignored.
    PreferLocked,
}

/// Tunable resolution and creation rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResolutionPolicy {
    pub locked_precedence: LockedPrecedence,
    /// Active mentors allowed per scope; `None` or `0` disables the check.
    pub max_active_per_section: Option<usize>,
}

impl ResolutionPolicy {
    /// The enforced section capacity. A limit of 0 means unlimited.
    #[must_use]
    pub fn section_capacity(&self) -> Option<usize> {
        self.max_active_per_section.filter(|&limit| limit > 0)
    }
}

impl Default for ResolutionPolicy {
    fn default() -> Self {
        Self {
            locked_precedence: LockedPrecedence::Strict,
            max_active_per_section: Some(DEFAULT_MAX_ACTIVE_MENTORS_PER_SECTION),
        }
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// The records a student's mentor was resolved through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StudentMentor<'a> {
    pub rule: &'a BatchRule,
    pub assignment: &'a MentorAssignment,
}

impl StudentMentor<'_> {
    #[must_use]
    pub fn mentor_id(&self) -> &MentorId {
        &self.assignment.mentor_id
    }

    #[must_use]
    pub fn batch_name(&self) -> &BatchName {
        &self.rule.batch_name
    }
}

/// What a semester reset would do to a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResetPlan {
    /// Unlocked assignments the reset removes.
    pub removed: Vec<AssignmentId>,
    /// Locked assignments the reset must leave in place.
    pub retained_locked: Vec<AssignmentId>,
}

// =============================================================================
// RESOLVER
// =============================================================================

/// Stateless resolver over read-only snapshots.
#[derive(Debug, Clone, Copy, Default)]
pub struct MentorAssignmentResolver {
    policy: ResolutionPolicy,
}

impl MentorAssignmentResolver {
    /// Create a resolver with the default policy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a resolver with a custom policy.
    #[must_use]
    pub fn with_policy(policy: ResolutionPolicy) -> Self {
        Self { policy }
    }

    #[must_use]
    pub fn policy(&self) -> &ResolutionPolicy {
        &self.policy
    }

    /// Resolve the batch a roll number falls in.
    pub fn resolve_batch<'a>(
        &self,
        rules: &'a [BatchRule],
        scope: &Scope,
        roll: RollNumber,
    ) -> Result<Option<&'a BatchRule>, CampusError> {
        resolve_batch(rules, scope, roll)
    }

    /// Resolve the active assignment responsible for `batch` in `scope`.
    ///
    /// - No active candidate: `Ok(None)`
    /// - One candidate: that one
    /// - Several, exactly one locked: per `LockedPrecedence`
    /// - Otherwise: `CampusError::AmbiguousAssignment`
    pub fn resolve_mentor<'a>(
        &self,
        assignments: &'a [MentorAssignment],
        scope: &Scope,
        batch: &BatchName,
    ) -> Result<Option<&'a MentorAssignment>, CampusError> {
        self.pick_assignment(assignments, scope, batch, None)
    }

    /// Resolve a student's mentor: batch first, then assignment.
    ///
    /// `Ok(None)` if either stage finds nothing. Ambiguity from either stage
    /// is returned unchanged. Assignments that carry their own roll bounds
    /// only apply to rolls inside them.
    pub fn resolve_student_mentor<'a>(
        &self,
        rules: &'a [BatchRule],
        assignments: &'a [MentorAssignment],
        scope: &Scope,
        roll: RollNumber,
    ) -> Result<Option<StudentMentor<'a>>, CampusError> {
        let Some(rule) = resolve_batch(rules, scope, roll)? else {
            return Ok(None);
        };
        let assignment =
            self.pick_assignment(assignments, scope, &rule.batch_name, Some(roll))?;
        Ok(assignment.map(|assignment| StudentMentor { rule, assignment }))
    }

    fn pick_assignment<'a>(
        &self,
        assignments: &'a [MentorAssignment],
        scope: &Scope,
        batch: &BatchName,
        roll: Option<RollNumber>,
    ) -> Result<Option<&'a MentorAssignment>, CampusError> {
        let candidates: Vec<&MentorAssignment> = assignments
            .iter()
            .filter(|a| a.active_status && a.in_scope(scope) && a.batch_name == *batch)
            .filter(|a| roll.is_none_or(|r| a.roll_range().contains(r)))
            .collect();

        if let [only] = candidates.as_slice() {
            return Ok(Some(*only));
        }
        if candidates.is_empty() {
            return Ok(None);
        }

        let locked: Vec<&MentorAssignment> =
            candidates.iter().copied().filter(|a| a.is_locked()).collect();
        if let ([only], LockedPrecedence::PreferLocked) =
            (locked.as_slice(), self.policy.locked_precedence)
        {
            return Ok(Some(*only));
        }

        let reported = if locked.len() > 1 { &locked } else { &candidates };
        let mut assignment_ids: Vec<AssignmentId> =
            reported.iter().map(|a| a.id.clone()).collect();
        assignment_ids.sort();
        Err(CampusError::AmbiguousAssignment {
            batch: batch.clone(),
            assignment_ids,
        })
    }

    // =========================================================================
    // CREATION GUARDS
    // =========================================================================

    /// The active locked assignment occupying the candidate's slot, if any.
    #[must_use]
    pub fn locked_occupant<'a>(
        &self,
        existing: &'a [MentorAssignment],
        candidate: &MentorAssignment,
    ) -> Option<&'a MentorAssignment> {
        existing
            .iter()
            .filter(|e| e.active_status && e.is_locked() && e.same_slot(candidate))
            .min_by(|a, b| a.id.cmp(&b.id))
    }

    /// Whether `candidate` may be persisted next to `existing`.
    ///
    /// False only when the candidate is active and an active locked
    /// assignment already holds the identical scope and batch.
    #[must_use]
    pub fn can_create_assignment(
        &self,
        existing: &[MentorAssignment],
        candidate: &MentorAssignment,
    ) -> bool {
        !candidate.active_status || self.locked_occupant(existing, candidate).is_none()
    }

    /// Full pre-persistence check for a new assignment.
    ///
    /// Validates the candidate, then the lock guard, then section capacity.
    pub fn validate_new_assignment(
        &self,
        existing: &[MentorAssignment],
        candidate: &MentorAssignment,
    ) -> Result<(), CampusError> {
        candidate.validate()?;

        if let Some(occupant) = self
            .locked_occupant(existing, candidate)
            .filter(|_| candidate.active_status)
        {
            return Err(CampusError::Conflict(ConflictReason::LockedAssignment {
                assignment_id: occupant.id.clone(),
            }));
        }

        if let (true, Some(limit)) = (candidate.active_status, self.policy.section_capacity()) {
            let active = existing
                .iter()
                .filter(|e| e.active_status && e.scope == candidate.scope)
                .count();
            if active >= limit {
                return Err(CampusError::Conflict(ConflictReason::SectionCapacity {
                    limit,
                    active,
                }));
            }
        }

        Ok(())
    }

    /// Preview resetting all assignments of a college's semester.
    ///
    /// Locked assignments are immutable for their semester and are retained.
    #[must_use]
    pub fn plan_semester_reset(
        &self,
        assignments: &[MentorAssignment],
        college: &str,
        academic_year: AcademicYear,
        semester: Semester,
    ) -> ResetPlan {
        let mut plan = ResetPlan::default();
        for a in assignments.iter().filter(|a| {
            a.scope.college == college
                && a.scope.academic_year == academic_year
                && a.scope.semester == semester
        }) {
            if a.is_locked() {
                plan.retained_locked.push(a.id.clone());
            } else {
                plan.removed.push(a.id.clone());
            }
        }
        plan.removed.sort();
        plan.retained_locked.sort();
        plan
    }
}

// =============================================================================
// COMMIT GUARD
// =============================================================================

/// Commit-time check for the optimistic-concurrency write path.
///
/// The persistence layer plans a write against a snapshot, re-reads the
/// snapshot inside its transaction, and asks the guard before committing.
#[derive(Debug, Clone, Copy, Default)]
pub struct CommitGuard {
    resolver: MentorAssignmentResolver,
}

impl CommitGuard {
    #[must_use]
    pub fn new(policy: ResolutionPolicy) -> Self {
        Self {
            resolver: MentorAssignmentResolver::with_policy(policy),
        }
    }

    /// Reject the write if the snapshot moved, otherwise run the creation checks.
    ///
    /// `planned_checksum` is the checksum of the snapshot the caller decided
    /// on. A different checksum now means another writer got in first.
    pub fn check(
        &self,
        planned_checksum: u64,
        fresh: &Snapshot,
        candidate: &MentorAssignment,
    ) -> Result<(), CampusError> {
        let actual = snapshot_checksum(fresh)?;
        if actual != planned_checksum {
            return Err(CampusError::Conflict(ConflictReason::StaleSnapshot {
                expected: planned_checksum,
                actual,
            }));
        }
        self.resolver
            .validate_new_assignment(&fresh.assignments, candidate)
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn scope() -> Scope {
        Scope::new(
            "KMIT",
            "CSE",
            "A",
            Semester::new(3).unwrap(),
            AcademicYear::starting(2025).unwrap(),
        )
    }

    fn active(id: &str, mentor: &str, batch: &str) -> MentorAssignment {
        MentorAssignment::new(id, mentor, scope(), batch)
    }

    fn locked(id: &str, mentor: &str, batch: &str) -> MentorAssignment {
        active(id, mentor, batch).locked(Utc.with_ymd_and_hms(2025, 7, 15, 0, 0, 0).unwrap())
    }

    fn b(name: &str) -> BatchName {
        BatchName::new(name)
    }

    #[test]
    fn single_active_assignment_resolves() {
        let resolver = MentorAssignmentResolver::new();
        let assignments = vec![active("a1", "EMP01", "B1"), active("a2", "EMP02", "B2")];
        let found = resolver.resolve_mentor(&assignments, &scope(), &b("B2")).unwrap();
        assert_eq!(found.map(|a| a.mentor_id.as_str()), Some("EMP02"));
    }

    #[test]
    fn no_assignment_is_not_found() {
        let resolver = MentorAssignmentResolver::new();
        let assignments = vec![active("a1", "EMP01", "B1")];
        assert_eq!(
            resolver.resolve_mentor(&assignments, &scope(), &b("B2")).unwrap(),
            None
        );
    }

    #[test]
    fn inactive_assignments_are_ignored() {
        let resolver = MentorAssignmentResolver::new();
        let assignments = vec![
            active("a1", "EMP01", "B1").with_active(false),
            locked("a2", "EMP02", "B1"),
        ];
        let found = resolver.resolve_mentor(&assignments, &scope(), &b("B1")).unwrap();
        assert_eq!(found.map(|a| a.id.as_str()), Some("a2"));
    }

    #[test]
    fn locked_beside_unlocked_is_ambiguous_when_strict() {
        let resolver = MentorAssignmentResolver::new();
        let assignments = vec![active("a1", "EMP01", "B1"), locked("a2", "EMP02", "B1")];
        let err = resolver
            .resolve_mentor(&assignments, &scope(), &b("B1"))
            .unwrap_err();
        assert!(matches!(err, CampusError::AmbiguousAssignment { .. }));
    }

    #[test]
    fn locked_wins_when_preferred() {
        let resolver = MentorAssignmentResolver::with_policy(ResolutionPolicy {
            locked_precedence: LockedPrecedence::PreferLocked,
            ..ResolutionPolicy::default()
        });
        let assignments = vec![active("a1", "EMP01", "B1"), locked("a2", "EMP02", "B1")];
        let found = resolver.resolve_mentor(&assignments, &scope(), &b("B1")).unwrap();
        assert_eq!(found.map(|a| a.id.as_str()), Some("a2"));
    }

    #[test]
    fn two_locked_are_ambiguous_under_any_policy() {
        let resolver = MentorAssignmentResolver::with_policy(ResolutionPolicy {
            locked_precedence: LockedPrecedence::PreferLocked,
            ..ResolutionPolicy::default()
        });
        let assignments = vec![
            locked("a2", "EMP02", "B1"),
            locked("a1", "EMP01", "B1"),
            active("a3", "EMP03", "B1"),
        ];
        match resolver.resolve_mentor(&assignments, &scope(), &b("B1")) {
            Err(CampusError::AmbiguousAssignment { assignment_ids, .. }) => {
                assert_eq!(
                    assignment_ids,
                    vec![AssignmentId::new("a1"), AssignmentId::new("a2")]
                );
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn two_unlocked_are_ambiguous() {
        let resolver = MentorAssignmentResolver::with_policy(ResolutionPolicy {
            locked_precedence: LockedPrecedence::PreferLocked,
            ..ResolutionPolicy::default()
        });
        let assignments = vec![active("a1", "EMP01", "B1"), active("a2", "EMP02", "B1")];
        assert!(resolver.resolve_mentor(&assignments, &scope(), &b("B1")).is_err());
    }

    #[test]
    fn student_resolution_chains_rule_and_assignment() {
        let resolver = MentorAssignmentResolver::new();
        let rules = vec![
            BatchRule::new("r1", scope(), "B1", Some(1), Some(30)),
            BatchRule::new("r2", scope(), "B2", Some(31), Some(60)),
        ];
        let assignments = vec![active("a1", "EMP01", "B1"), active("a2", "EMP02", "B2")];

        let found = resolver
            .resolve_student_mentor(&rules, &assignments, &scope(), RollNumber(45))
            .unwrap()
            .unwrap();
        assert_eq!(found.mentor_id().as_str(), "EMP02");
        assert_eq!(found.batch_name().as_str(), "B2");
        assert_eq!(found.rule.id.as_str(), "r2");
    }

    #[test]
    fn student_resolution_short_circuits() {
        let resolver = MentorAssignmentResolver::new();
        let rules = vec![BatchRule::new("r1", scope(), "B1", Some(1), Some(30))];
        let assignments = vec![active("a1", "EMP01", "B2")];

        // No rule for roll 45.
        assert!(resolver
            .resolve_student_mentor(&rules, &assignments, &scope(), RollNumber(45))
            .unwrap()
            .is_none());
        // Rule found, but no assignment for B1.
        assert!(resolver
            .resolve_student_mentor(&rules, &assignments, &scope(), RollNumber(10))
            .unwrap()
            .is_none());
    }

    #[test]
    fn assignment_roll_bounds_narrow_student_resolution() {
        let resolver = MentorAssignmentResolver::new();
        let rules = vec![BatchRule::new("r1", scope(), "B1", Some(1), Some(60))];
        let mut first = active("a1", "EMP01", "B1");
        first.roll_start = Some(1);
        first.roll_end = Some(30);
        let mut second = active("a2", "EMP02", "B1");
        second.roll_start = Some(31);
        second.roll_end = Some(60);
        let assignments = vec![first, second];

        let found = resolver
            .resolve_student_mentor(&rules, &assignments, &scope(), RollNumber(40))
            .unwrap()
            .unwrap();
        assert_eq!(found.mentor_id().as_str(), "EMP02");
    }

    #[test]
    fn locked_slot_blocks_creation() {
        let resolver = MentorAssignmentResolver::new();
        let existing = vec![locked("a1", "EMP01", "B1")];

        assert!(!resolver.can_create_assignment(&existing, &active("n1", "EMP09", "B1")));
        assert!(resolver.can_create_assignment(&existing, &active("n2", "EMP09", "B2")));
        assert!(resolver.can_create_assignment(
            &existing,
            &active("n3", "EMP09", "B1").with_active(false)
        ));
    }

    #[test]
    fn unlocked_slot_allows_creation() {
        let resolver = MentorAssignmentResolver::new();
        let existing = vec![active("a1", "EMP01", "B1")];
        assert!(resolver.can_create_assignment(&existing, &active("n1", "EMP09", "B1")));
    }

    #[test]
    fn validate_reports_locked_conflict() {
        let resolver = MentorAssignmentResolver::new();
        let existing = vec![locked("a1", "EMP01", "B1")];
        let err = resolver
            .validate_new_assignment(&existing, &active("n1", "EMP09", "B1"))
            .unwrap_err();
        assert_eq!(
            err,
            CampusError::Conflict(ConflictReason::LockedAssignment {
                assignment_id: AssignmentId::new("a1")
            })
        );
    }

    #[test]
    fn validate_enforces_section_capacity() {
        let resolver = MentorAssignmentResolver::new();
        let existing = vec![active("a1", "EMP01", "B1"), active("a2", "EMP02", "B2")];
        let err = resolver
            .validate_new_assignment(&existing, &active("n1", "EMP03", "B3"))
            .unwrap_err();
        assert_eq!(
            err,
            CampusError::Conflict(ConflictReason::SectionCapacity {
                limit: 2,
                active: 2
            })
        );

        let unlimited = MentorAssignmentResolver::with_policy(ResolutionPolicy {
            max_active_per_section: None,
            ..ResolutionPolicy::default()
        });
        assert!(unlimited
            .validate_new_assignment(&existing, &active("n1", "EMP03", "B3"))
            .is_ok());
    }

    #[test]
    fn zero_capacity_means_unlimited() {
        let policy = ResolutionPolicy {
            max_active_per_section: Some(0),
            ..ResolutionPolicy::default()
        };
        assert_eq!(policy.section_capacity(), None);
        assert_eq!(ResolutionPolicy::default().section_capacity(), Some(2));

        let resolver = MentorAssignmentResolver::with_policy(policy);
        let existing = vec![active("a1", "EMP01", "B1"), active("a2", "EMP02", "B2")];
        assert!(resolver
            .validate_new_assignment(&existing, &active("n1", "EMP03", "B3"))
            .is_ok());
        assert!(resolver
            .validate_new_assignment(&[], &active("n1", "EMP03", "B3"))
            .is_ok());
    }

    #[test]
    fn validate_rejects_malformed_candidate() {
        let resolver = MentorAssignmentResolver::new();
        let mut candidate = active("n1", "", "B1");
        assert!(matches!(
            resolver.validate_new_assignment(&[], &candidate),
            Err(CampusError::InvalidInput(_))
        ));
        candidate.mentor_id = MentorId::new("EMP01");
        candidate.roll_start = Some(50);
        candidate.roll_end = Some(10);
        assert!(resolver.validate_new_assignment(&[], &candidate).is_err());
    }

    #[test]
    fn commit_check_detects_stale_snapshot() {
        let guard = CommitGuard::default();
        let planned = Snapshot::new(vec![], vec![active("a1", "EMP01", "B1")]);
        let planned_checksum = snapshot_checksum(&planned).unwrap();

        let mut fresh = planned.clone();
        fresh.assignments.push(locked("a9", "EMP07", "B2"));

        let candidate = active("n1", "EMP03", "B2");
        assert!(guard.check(planned_checksum, &planned, &candidate).is_ok());
        assert!(matches!(
            guard.check(planned_checksum, &fresh, &candidate),
            Err(CampusError::Conflict(ConflictReason::StaleSnapshot { .. }))
        ));
    }

    #[test]
    fn reset_plan_retains_locked() {
        let resolver = MentorAssignmentResolver::new();
        let mut other_semester = active("a4", "EMP04", "B1");
        other_semester.scope.semester = Semester::new(4).unwrap();
        let assignments = vec![
            active("a2", "EMP02", "B2"),
            locked("a1", "EMP01", "B1"),
            active("a3", "EMP03", "B1").with_active(false),
            other_semester,
        ];

        let plan = resolver.plan_semester_reset(
            &assignments,
            "KMIT",
            AcademicYear::starting(2025).unwrap(),
            Semester::new(3).unwrap(),
        );
        assert_eq!(
            plan.removed,
            vec![AssignmentId::new("a2"), AssignmentId::new("a3")]
        );
        assert_eq!(plan.retained_locked, vec![AssignmentId::new("a1")]);
    }
}
