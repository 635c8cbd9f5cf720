//! # Batch Rules
//!
//! Roll number → batch name resolution, and overlap detection between rules
//! of the same scope.
//!
//! Overlapping rules are a data-integrity fault. They are surfaced as
//! `CampusError::AmbiguousRule` at lookup time and listed by the audit;
//! list order never decides between them.

use crate::{BatchRule, CampusError, RollNumber, RuleId, Scope, Scoped};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Two rules of one scope whose roll ranges intersect.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RuleOverlap {
    pub scope: Scope,
    pub first: RuleId,
    pub second: RuleId,
}

/// Find the rule that places `roll` in a batch within `scope`.
///
/// Returns `Ok(None)` when no rule covers the roll number and
/// `CampusError::AmbiguousRule` when more than one does.
pub fn resolve_batch<'a>(
    rules: &'a [BatchRule],
    scope: &Scope,
    roll: RollNumber,
) -> Result<Option<&'a BatchRule>, CampusError> {
    let matches: Vec<&BatchRule> = rules
        .iter()
        .filter(|rule| rule.in_scope(scope) && rule.roll_range().contains(roll))
        .collect();

    match matches.as_slice() {
        [] => Ok(None),
        [only] => Ok(Some(*only)),
        many => {
            let mut rule_ids: Vec<RuleId> = many.iter().map(|r| r.id.clone()).collect();
            rule_ids.sort();
            Err(CampusError::AmbiguousRule { roll, rule_ids })
        }
    }
}

/// List every pair of rules in the same scope whose ranges overlap.
///
/// Output is sorted, so identical snapshots give identical reports.
#[must_use]
pub fn overlapping_rules(rules: &[BatchRule]) -> Vec<RuleOverlap> {
    let mut by_scope: BTreeMap<&Scope, Vec<&BatchRule>> = BTreeMap::new();
    for rule in rules {
        by_scope.entry(&rule.scope).or_default().push(rule);
    }

    let mut overlaps = Vec::new();
    for (scope, group) in by_scope {
        for (i, a) in group.iter().enumerate() {
            for b in &group[i + 1..] {
                if a.roll_range().overlaps(&b.roll_range()) {
                    let (first, second) = if a.id <= b.id {
                        (a.id.clone(), b.id.clone())
                    } else {
                        (b.id.clone(), a.id.clone())
                    };
                    overlaps.push(RuleOverlap {
                        scope: scope.clone(),
                        first,
                        second,
                    });
                }
            }
        }
    }
    overlaps.sort();
    overlaps
}

// =============================================================================
// TESTS
// =============================================================================
