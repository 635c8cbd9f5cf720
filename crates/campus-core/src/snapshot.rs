//! # Snapshot
//!
//! The read-only set of batch rules and mentor assignments a resolver call
//! works against, plus the integrity audit over it.
//!
//! The persistence layer owns the records. A `Snapshot` is a copy handed in
//! per call; nothing here caches or mutates it.

use crate::assignment::ResolutionPolicy;
use crate::batch::{RuleOverlap, overlapping_rules};
use crate::primitives::MAX_SNAPSHOT_RECORDS;
use crate::{AssignmentId, BatchName, BatchRule, CampusError, MentorAssignment, Scope};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Rules and assignments as read from the persistence layer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub rules: Vec<BatchRule>,
    #[serde(default)]
    pub assignments: Vec<MentorAssignment>,
}

impl Snapshot {
    #[must_use]
    pub fn new(rules: Vec<BatchRule>, assignments: Vec<MentorAssignment>) -> Self {
        Self { rules, assignments }
    }

    /// Total number of records.
    #[must_use]
    pub fn record_count(&self) -> usize {
        self.rules.len() + self.assignments.len()
    }

    /// Reject snapshots that cannot be resolved against at all.
    ///
    /// Checks the size limit, duplicate ids within each record kind, and
    /// per-record structure. Overlaps and lock faults are not rejected here;
    /// they surface as ambiguity at lookup time and in [`Snapshot::audit`].
    pub fn validate(&self) -> Result<(), CampusError> {
        if self.record_count() > MAX_SNAPSHOT_RECORDS {
            return Err(CampusError::InvalidInput(format!(
                "snapshot holds {} records, limit is {}",
                self.record_count(),
                MAX_SNAPSHOT_RECORDS
            )));
        }

        let mut rule_ids = BTreeSet::new();
        for rule in &self.rules {
            if !rule_ids.insert(&rule.id) {
                return Err(CampusError::InvalidInput(format!(
                    "duplicate rule id {}",
                    rule.id.as_str()
                )));
            }
            rule.validate()?;
        }

        let mut assignment_ids = BTreeSet::new();
        for assignment in &self.assignments {
            if !assignment_ids.insert(&assignment.id) {
                return Err(CampusError::InvalidInput(format!(
                    "duplicate assignment id {}",
                    assignment.id.as_str()
                )));
            }
            assignment.validate()?;
        }
        Ok(())
    }

    /// Scan the whole snapshot for integrity faults.
    ///
    /// Never fails: every fault is collected into the report.
    #[must_use]
    pub fn audit(&self, policy: &ResolutionPolicy) -> IntegrityReport {
        let malformed_rules = self
            .rules
            .iter()
            .filter_map(|r| {
                r.validate().err().map(|e| MalformedRecord {
                    id: r.id.as_str().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect();
        let malformed_assignments = self
            .assignments
            .iter()
            .filter_map(|a| {
                a.validate().err().map(|e| MalformedRecord {
                    id: a.id.as_str().to_string(),
                    reason: e.to_string(),
                })
            })
            .collect();

        let mut slots: BTreeMap<(&Scope, &BatchName), Vec<&MentorAssignment>> = BTreeMap::new();
        let mut per_scope: BTreeMap<&Scope, usize> = BTreeMap::new();
        for a in self.assignments.iter().filter(|a| a.active_status) {
            slots.entry((&a.scope, &a.batch_name)).or_default().push(a);
            *per_scope.entry(&a.scope).or_default() += 1;
        }

        let mut report = IntegrityReport {
            rule_overlaps: overlapping_rules(&self.rules),
            malformed_rules,
            malformed_assignments,
            ..IntegrityReport::default()
        };

        for ((scope, batch), group) in slots {
            if group.len() < 2 {
                continue;
            }
            let (locked, unlocked): (Vec<&MentorAssignment>, Vec<&MentorAssignment>) =
                group.into_iter().partition(|a| a.is_locked());
            let fault = |members: &[&MentorAssignment]| SlotFault {
                scope: scope.clone(),
                batch_name: batch.clone(),
                assignment_ids: sorted_ids(members),
            };

            match (locked.len(), unlocked.len()) {
                (0, _) => report.ambiguous_unlocked.push(fault(&unlocked)),
                (1, _) => report.unlocked_beside_locked.push(fault(&unlocked)),
                _ => report.duplicate_locked.push(fault(&locked)),
            }
        }

        if let Some(limit) = policy.section_capacity() {
            report.capacity_breaches = per_scope
                .into_iter()
                .filter(|(_, active)| *active > limit)
                .map(|(scope, active)| CapacityBreach {
                    scope: scope.clone(),
                    limit,
                    active,
                })
                .collect();
        }

        report
    }
}

fn sorted_ids(members: &[&MentorAssignment]) -> Vec<AssignmentId> {
    let mut ids: Vec<AssignmentId> = members.iter().map(|a| a.id.clone()).collect();
    ids.sort();
    ids
}

// =============================================================================
// INTEGRITY REPORT
// =============================================================================

/// A record that fails structural validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MalformedRecord {
    pub id: String,
    pub reason: String,
}

/// Active assignments sharing one scope and batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotFault {
    pub scope: Scope,
    pub batch_name: BatchName,
    pub assignment_ids: Vec<AssignmentId>,
}

/// A scope holding more active assignments than the policy allows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityBreach {
    pub scope: Scope,
    pub limit: usize,
    pub active: usize,
}

/// Everything wrong with a snapshot, in deterministic order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityReport {
    pub rule_overlaps: Vec<RuleOverlap>,
    pub malformed_rules: Vec<MalformedRecord>,
    pub malformed_assignments: Vec<MalformedRecord>,
    /// More than one locked assignment in a slot.
    pub duplicate_locked: Vec<SlotFault>,
    /// Active unlocked assignments next to a locked one (ids of the unlocked ones).
    pub unlocked_beside_locked: Vec<SlotFault>,
    /// Several active unlocked assignments and no locked one.
    pub ambiguous_unlocked: Vec<SlotFault>,
    pub capacity_breaches: Vec<CapacityBreach>,
}

impl IntegrityReport {
    /// Whether the snapshot has no faults at all.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.fault_count() == 0
    }

    /// Number of individual faults found.
    #[must_use]
    pub fn fault_count(&self) -> usize {
        self.rule_overlaps.len()
            + self.malformed_rules.len()
            + self.malformed_assignments.len()
            + self.duplicate_locked.len()
            + self.unlocked_beside_locked.len()
            + self.ambiguous_unlocked.len()
            + self.capacity_breaches.len()
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::assignment::LockedPrecedence;
    use crate::{AcademicYear, Semester};
    use chrono::{TimeZone, Utc};

    fn scope(section: &str) -> Scope {
        Scope::new(
            "KMIT",
            "CSE",
            section,
            Semester::new(3).unwrap(),
            AcademicYear::starting(2025).unwrap(),
        )
    }

    fn assignment(id: &str, section: &str, batch: &str) -> MentorAssignment {
        MentorAssignment::new(id, format!("EMP-{id}"), scope(section), batch)
    }

    fn lock(a: MentorAssignment) -> MentorAssignment {
        a.locked(Utc.with_ymd_and_hms(2025, 7, 1, 9, 0, 0).unwrap())
    }

    #[test]
    fn clean_snapshot_audits_clean() {
        let snapshot = Snapshot::new(
            vec![
                BatchRule::new("r1", scope("A"), "B1", Some(1), Some(30)),
                BatchRule::new("r2", scope("A"), "B2", Some(31), Some(60)),
            ],
            vec![assignment("a1", "A", "B1"), lock(assignment("a2", "A", "B2"))],
        );
        assert!(snapshot.validate().is_ok());
        let report = snapshot.audit(&ResolutionPolicy::default());
        assert!(report.is_clean(), "{report:?}");
    }

    #[test]
    fn validate_rejects_duplicate_ids() {
        let snapshot = Snapshot::new(
            vec![],
            vec![assignment("a1", "A", "B1"), assignment("a1", "B", "B1")],
        );
        assert!(matches!(
            snapshot.validate(),
            Err(CampusError::InvalidInput(_))
        ));
    }

    #[test]
    fn validate_rejects_inverted_ranges() {
        let snapshot = Snapshot::new(
            vec![BatchRule::new("r1", scope("A"), "B1", Some(30), Some(1))],
            vec![],
        );
        assert!(snapshot.validate().is_err());
    }

    #[test]
    fn audit_collects_every_fault_kind() {
        let snapshot = Snapshot::new(
            vec![
                BatchRule::new("r1", scope("A"), "B1", Some(1), Some(30)),
                BatchRule::new("r2", scope("A"), "B2", Some(20), Some(60)),
                BatchRule::new("r3", scope("B"), "B1", Some(9), Some(3)),
            ],
            vec![
                // Two locked in A/B1.
                lock(assignment("a1", "A", "B1")),
                lock(assignment("a2", "A", "B1")),
                // Unlocked next to locked in B/B1.
                lock(assignment("b1", "B", "B1")),
                assignment("b2", "B", "B1"),
                // Two unlocked in C/B1.
                assignment("c1", "C", "B1"),
                assignment("c2", "C", "B1"),
                // Inactive records never count.
                assignment("c3", "C", "B1").with_active(false),
            ],
        );

        let report = snapshot.audit(&ResolutionPolicy::default());
        assert_eq!(report.rule_overlaps.len(), 1);
        assert_eq!(report.malformed_rules.len(), 1);
        assert_eq!(report.malformed_rules[0].id, "r3");
        assert_eq!(report.duplicate_locked.len(), 1);
        assert_eq!(
            report.unlocked_beside_locked[0].assignment_ids,
            vec![AssignmentId::new("b2")]
        );
        assert_eq!(
            report.ambiguous_unlocked[0].assignment_ids,
            vec![AssignmentId::new("c1"), AssignmentId::new("c2")]
        );
        assert!(report.capacity_breaches.is_empty());
        assert!(!report.is_clean());
        assert_eq!(report.fault_count(), 5);
    }

    #[test]
    fn audit_reports_capacity_per_policy() {
        let snapshot = Snapshot::new(
            vec![],
            vec![
                assignment("a1", "A", "B1"),
                assignment("a2", "A", "B2"),
                assignment("a3", "A", "B3"),
            ],
        );

        let strict = snapshot.audit(&ResolutionPolicy::default());
        assert_eq!(strict.capacity_breaches.len(), 1);
        assert_eq!(strict.capacity_breaches[0].active, 3);

        let relaxed = snapshot.audit(&ResolutionPolicy {
            locked_precedence: LockedPrecedence::Strict,
            max_active_per_section: None,
        });
        assert!(relaxed.is_clean());
    }
}
