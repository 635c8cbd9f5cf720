//! # Core Type Definitions
//!
//! This module contains all core types for the Campus resolution engine:
//! - Record identifiers (`RuleId`, `AssignmentId`, `MentorId`, `BatchName`)
//! - Validated academic values (`Semester`, `YearLevel`, `AcademicYear`, `RollNumber`)
//! - Scoping (`Scope`, `RollRange`, the `Scoped` trait)
//! - Snapshot records (`BatchRule`, `MentorAssignment`)
//! - Error types (`CampusError`, `ConflictReason`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they key a `BTreeMap`/`BTreeSet`
//! - Validate on construction and on deserialization, never later

use crate::primitives::{
    ACADEMIC_YEAR_START_MONTH, MAX_ACADEMIC_YEAR_START, MAX_SEMESTER, MAX_YEAR_LEVEL,
    MIN_SEMESTER, MIN_YEAR_LEVEL, SEMESTERS_PER_YEAR,
};
use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// RECORD IDENTIFIERS
// =============================================================================

/// Identifier of a batch rule, as assigned by the persistence layer.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleId(pub String);

impl RuleId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Identifier of a mentor assignment record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AssignmentId(pub String);

impl AssignmentId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Employee id of a mentor (also the mentor's login id).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MentorId(pub String);

impl MentorId {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Name of a batch within a section, e.g. `B1`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchName(pub String);

impl BatchName {
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BatchName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// ACADEMIC VALUES
// =============================================================================

/// A semester number in `1..=8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Semester(u8);

impl Semester {
    /// Create a semester, rejecting values outside `1..=8`.
    pub fn new(value: u8) -> Result<Self, CampusError> {
        if (MIN_SEMESTER..=MAX_SEMESTER).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CampusError::InvalidInput(format!(
                "semester {} outside {}..={}",
                value, MIN_SEMESTER, MAX_SEMESTER
            )))
        }
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Whether this is the first (odd) semester of its year-level.
    #[must_use]
    pub const fn is_odd(self) -> bool {
        self.0 % 2 == 1
    }

    /// The year-level this semester belongs to: `(semester + 1) / 2`.
    #[must_use]
    pub const fn year_level(self) -> YearLevel {
        YearLevel((self.0 + 1) / SEMESTERS_PER_YEAR)
    }
}

impl TryFrom<u8> for Semester {
    type Error = CampusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Semester> for u8 {
    fn from(semester: Semester) -> Self {
        semester.0
    }
}

impl fmt::Display for Semester {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A student's ordinal academic year in `1..=4`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct YearLevel(u8);

impl YearLevel {
    /// Create a year-level, rejecting values outside `1..=4`.
    pub fn new(value: u8) -> Result<Self, CampusError> {
        if (MIN_YEAR_LEVEL..=MAX_YEAR_LEVEL).contains(&value) {
            Ok(Self(value))
        } else {
            Err(CampusError::InvalidInput(format!(
                "year level {} outside {}..={}",
                value, MIN_YEAR_LEVEL, MAX_YEAR_LEVEL
            )))
        }
    }

    /// Clamp an arbitrary signed count into `1..=4`.
    #[must_use]
    pub fn clamped(value: i64) -> Self {
        let clamped = value.clamp(i64::from(MIN_YEAR_LEVEL), i64::from(MAX_YEAR_LEVEL));
        Self(clamped as u8)
    }

    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// The fixed `[odd, even]` semester pair of this year-level.
    #[must_use]
    pub const fn semesters(self) -> [Semester; 2] {
        let even = self.0 * SEMESTERS_PER_YEAR;
        [Semester(even - 1), Semester(even)]
    }
}

impl TryFrom<u8> for YearLevel {
    type Error = CampusError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<YearLevel> for u8 {
    fn from(level: YearLevel) -> Self {
        level.0
    }
}

impl fmt::Display for YearLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An academic year running June through May, labelled `"2025-2026"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AcademicYear {
    start: i32,
}

impl AcademicYear {
    /// Create the academic year starting in June of `start`.
    pub fn starting(start: i32) -> Result<Self, CampusError> {
        if start <= 0 {
            return Err(CampusError::InvalidInput(format!(
                "academic year start {} is not a positive year",
                start
            )));
        }
        if start > MAX_ACADEMIC_YEAR_START {
            return Err(CampusError::InvalidInput(format!(
                "academic year start {} is after {}",
                start, MAX_ACADEMIC_YEAR_START
            )));
        }
        Ok(Self { start })
    }

    /// The academic year that contains `date`.
    ///
    /// June onwards belongs to the year starting that calendar year;
    /// January through May belongs to the one that started the year before.
    #[must_use]
    pub fn containing(date: NaiveDate) -> Self {
        let start = if date.month() >= ACADEMIC_YEAR_START_MONTH {
            date.year()
        } else {
            date.year() - 1
        };
        Self { start }
    }

    #[must_use]
    pub const fn start_year(self) -> i32 {
        self.start
    }

    #[must_use]
    pub const fn end_year(self) -> i32 {
        self.start + 1
    }
}

impl fmt::Display for AcademicYear {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start, self.start + 1)
    }
}

impl FromStr for AcademicYear {
    type Err = CampusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || CampusError::InvalidInput(format!("malformed academic year '{}'", s));

        let (first, second) = s.trim().split_once('-').ok_or_else(malformed)?;
        let start: i32 = first.trim().parse().map_err(|_| malformed())?;
        let end: i32 = second.trim().parse().map_err(|_| malformed())?;

        if start.checked_add(1) != Some(end) {
            return Err(CampusError::InvalidInput(format!(
                "academic year '{}' must span consecutive years",
                s
            )));
        }
        Self::starting(start)
    }
}

impl TryFrom<String> for AcademicYear {
    type Error = CampusError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AcademicYear> for String {
    fn from(year: AcademicYear) -> Self {
        year.to_string()
    }
}

/// A student's roll number within a section.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct RollNumber(pub u32);

impl RollNumber {
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    #[must_use]
    pub const fn value(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// SCOPE
// =============================================================================

/// The (college, course, section, semester, academic year) a record applies to.
///
/// Batch names are deliberately not part of the scope: several batches share
/// one scope and are told apart by roll range.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Scope {
    pub college: String,
    pub course: String,
    pub section: String,
    pub semester: Semester,
    pub academic_year: AcademicYear,
}

impl Scope {
    /// Create a new scope.
    #[must_use]
    pub fn new(
        college: impl Into<String>,
        course: impl Into<String>,
        section: impl Into<String>,
        semester: Semester,
        academic_year: AcademicYear,
    ) -> Self {
        Self {
            college: college.into(),
            course: course.into(),
            section: section.into(),
            semester,
            academic_year,
        }
    }

    /// Reject scopes with blank text components.
    pub fn validate(&self) -> Result<(), CampusError> {
        for (field, value) in [
            ("college", &self.college),
            ("course", &self.course),
            ("section", &self.section),
        ] {
            if value.trim().is_empty() {
                return Err(CampusError::InvalidInput(format!("{} is required", field)));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{} sem {} ({})",
            self.college, self.course, self.section, self.semester, self.academic_year
        )
    }
}

// =============================================================================
// ROLL RANGE
// =============================================================================

/// An inclusive roll-number range. A missing bound is open on that side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RollRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl RollRange {
    #[must_use]
    pub const fn new(start: Option<u32>, end: Option<u32>) -> Self {
        Self { start, end }
    }

    /// Range with no bounds: matches every roll number.
    #[must_use]
    pub const fn unbounded() -> Self {
        Self {
            start: None,
            end: None,
        }
    }

    /// Check the `start <= end` invariant (only when both are present).
    #[must_use]
    pub fn is_well_formed(&self) -> bool {
        match (self.start, self.end) {
            (Some(start), Some(end)) => start <= end,
            _ => true,
        }
    }

    /// Whether `roll` lies inside the range.
    #[must_use]
    pub fn contains(&self, roll: RollNumber) -> bool {
        self.start.is_none_or(|start| roll.0 >= start) && self.end.is_none_or(|end| roll.0 <= end)
    }

    /// Whether two ranges share at least one roll number.
    #[must_use]
    pub fn overlaps(&self, other: &RollRange) -> bool {
        let low = self.start.unwrap_or(0).max(other.start.unwrap_or(0));
        let high = self
            .end
            .unwrap_or(u32::MAX)
            .min(other.end.unwrap_or(u32::MAX));
        low <= high
    }
}

impl fmt::Display for RollRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{}..={}", s, e),
            (Some(s), None) => write!(f, "{}..", s),
            (None, Some(e)) => write!(f, "..={}", e),
            (None, None) => f.write_str(".."),
        }
    }
}

// =============================================================================
// SCOPED TRAIT
// =============================================================================

/// Records that belong to a scope and a batch and cover a roll range.
///
/// Both snapshot record kinds implement this, so matching and overlap
/// checks are written once.
pub trait Scoped {
    /// The scope this record applies to.
    fn scope(&self) -> &Scope;

    /// The batch this record names.
    fn batch_name(&self) -> &BatchName;

    /// The roll numbers this record covers.
    fn roll_range(&self) -> RollRange;

    /// Whether this record sits in `scope`.
    fn in_scope(&self, scope: &Scope) -> bool {
        self.scope() == scope
    }
}

// =============================================================================
// BATCH RULE
// =============================================================================

/// Maps a roll-number range within a scope to a batch name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRule {
    #[serde(alias = "_id")]
    pub id: RuleId,
    #[serde(flatten)]
    pub scope: Scope,
    pub batch_name: BatchName,
    #[serde(default)]
    pub roll_start: Option<u32>,
    #[serde(default)]
    pub roll_end: Option<u32>,
    #[serde(default)]
    pub lateral_entry: bool,
}

impl BatchRule {
    /// Create a rule with an explicit roll range.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        scope: Scope,
        batch_name: impl Into<String>,
        roll_start: Option<u32>,
        roll_end: Option<u32>,
    ) -> Self {
        Self {
            id: RuleId::new(id),
            scope,
            batch_name: BatchName::new(batch_name),
            roll_start,
            roll_end,
            lateral_entry: false,
        }
    }

    /// Structural validation of a single rule.
    pub fn validate(&self) -> Result<(), CampusError> {
        self.scope.validate()?;
        if self.batch_name.as_str().trim().is_empty() {
            return Err(CampusError::InvalidInput(
                "batch_name is required".to_string(),
            ));
        }
        if !self.roll_range().is_well_formed() {
            return Err(CampusError::InvalidInput(format!(
                "rule {} has roll_start > roll_end",
                self.id.as_str()
            )));
        }
        Ok(())
    }
}

impl Scoped for BatchRule {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn batch_name(&self) -> &BatchName {
        &self.batch_name
    }

    fn roll_range(&self) -> RollRange {
        RollRange::new(self.roll_start, self.roll_end)
    }
}

// =============================================================================
// MENTOR ASSIGNMENT
// =============================================================================

fn default_active() -> bool {
    true
}

/// Maps a batch within a scope to the mentor responsible for it.
///
/// Once `locked_at` is set the record is immutable for the rest of its
/// scope's semester.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MentorAssignment {
    #[serde(alias = "_id")]
    pub id: AssignmentId,
    pub mentor_id: MentorId,
    #[serde(flatten)]
    pub scope: Scope,
    pub batch_name: BatchName,
    #[serde(default)]
    pub roll_start: Option<u32>,
    #[serde(default)]
    pub roll_end: Option<u32>,
    #[serde(default)]
    pub lateral_entry: bool,
    #[serde(default = "default_active")]
    pub active_status: bool,
    #[serde(default)]
    pub locked_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub locked_by: Option<String>,
}

impl MentorAssignment {
    /// Create an active, unlocked assignment covering the whole batch.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        mentor_id: impl Into<String>,
        scope: Scope,
        batch_name: impl Into<String>,
    ) -> Self {
        Self {
            id: AssignmentId::new(id),
            mentor_id: MentorId::new(mentor_id),
            scope,
            batch_name: BatchName::new(batch_name),
            roll_start: None,
            roll_end: None,
            lateral_entry: false,
            active_status: true,
            locked_at: None,
            locked_by: None,
        }
    }

    /// Builder: mark as locked at `at`.
    #[must_use]
    pub fn locked(mut self, at: DateTime<Utc>) -> Self {
        self.locked_at = Some(at);
        self
    }

    /// Builder: set active status.
    #[must_use]
    pub fn with_active(mut self, active: bool) -> Self {
        self.active_status = active;
        self
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked_at.is_some()
    }

    /// Whether two assignments target the identical scope and batch.
    #[must_use]
    pub fn same_slot(&self, other: &MentorAssignment) -> bool {
        self.scope == other.scope && self.batch_name == other.batch_name
    }

    /// Structural validation of a single assignment.
    pub fn validate(&self) -> Result<(), CampusError> {
        self.scope.validate()?;
        if self.mentor_id.as_str().trim().is_empty() {
            return Err(CampusError::InvalidInput("mentor_id is required".to_string()));
        }
        if self.batch_name.as_str().trim().is_empty() {
            return Err(CampusError::InvalidInput(
                "batch_name is required".to_string(),
            ));
        }
        if !self.roll_range().is_well_formed() {
            return Err(CampusError::InvalidInput(format!(
                "assignment {} has roll_start > roll_end",
                self.id.as_str()
            )));
        }
        Ok(())
    }
}

impl Scoped for MentorAssignment {
    fn scope(&self) -> &Scope {
        &self.scope
    }

    fn batch_name(&self) -> &BatchName {
        &self.batch_name
    }

    fn roll_range(&self) -> RollRange {
        RollRange::new(self.roll_start, self.roll_end)
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Why a write was refused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ConflictReason {
    /// A locked assignment already occupies the scope and batch.
    LockedAssignment { assignment_id: AssignmentId },
    /// The section already has the maximum number of active mentors.
    SectionCapacity { limit: usize, active: usize },
    /// The snapshot changed between planning and commit.
    StaleSnapshot { expected: u64, actual: u64 },
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LockedAssignment { assignment_id } => write!(
                f,
                "locked assignment {} occupies this scope and batch",
                assignment_id.as_str()
            ),
            Self::SectionCapacity { limit, active } => write!(
                f,
                "section already has {} active mentors (limit {})",
                active, limit
            ),
            Self::StaleSnapshot { expected, actual } => write!(
                f,
                "snapshot changed since it was read (expected {:016x}, found {:016x})",
                expected, actual
            ),
        }
    }
}

/// Errors that can occur in the Campus resolution engine.
///
/// - "No mapping exists" is not an error: resolvers return `Ok(None)`
/// - Ambiguity is never settled by list order
/// - The CORE should never panic; all errors must be recoverable
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CampusError {
    /// Malformed or out-of-range input.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// More than one batch rule covers the roll number.
    #[error("Ambiguous batch rules for roll {roll}: {rule_ids:?}")]
    AmbiguousRule {
        roll: RollNumber,
        rule_ids: Vec<RuleId>,
    },

    /// More than one assignment could be authoritative for the batch.
    #[error("Ambiguous mentor assignments for batch {batch}: {assignment_ids:?}")]
    AmbiguousAssignment {
        batch: BatchName,
        assignment_ids: Vec<AssignmentId>,
    },

    /// The write would violate locking or capacity rules.
    #[error("Conflict: {0}")]
    Conflict(ConflictReason),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

impl CampusError {
    /// Stable machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidInput(_) => "invalid_input",
            Self::AmbiguousRule { .. } => "ambiguous_rule",
            Self::AmbiguousAssignment { .. } => "ambiguous_assignment",
            Self::Conflict(_) => "conflict",
            Self::SerializationError(_) => "serialization",
            Self::IoError(_) => "io",
        }
    }

    /// Whether the error reports bad data in the snapshot rather than bad input.
    #[must_use]
    pub fn is_integrity_fault(&self) -> bool {
        matches!(
            self,
            Self::AmbiguousRule { .. } | Self::AmbiguousAssignment { .. }
        )
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::panic)]
mod tests {
    use super::*;

    fn scope() -> Scope {
        Scope::new(
            "KMIT",
            "CSE",
            "A",
            Semester::new(3).unwrap(),
            AcademicYear::starting(2025).unwrap(),
        )
    }

    #[test]
    fn semester_bounds() {
        assert!(Semester::new(0).is_err());
        assert!(Semester::new(1).is_ok());
        assert!(Semester::new(8).is_ok());
        assert!(Semester::new(9).is_err());
    }

    #[test]
    fn semester_maps_to_year_level() {
        let levels: Vec<u8> = (1..=8)
            .map(|s| Semester::new(s).unwrap().year_level().value())
            .collect();
        assert_eq!(levels, vec![1, 1, 2, 2, 3, 3, 4, 4]);
    }

    #[test]
    fn year_level_clamps() {
        assert_eq!(YearLevel::clamped(-3).value(), 1);
        assert_eq!(YearLevel::clamped(2).value(), 2);
        assert_eq!(YearLevel::clamped(11).value(), 4);
    }

    #[test]
    fn academic_year_label_roundtrip() {
        let year: AcademicYear = "2025-2026".parse().unwrap();
        assert_eq!(year.start_year(), 2025);
        assert_eq!(year.end_year(), 2026);
        assert_eq!(year.to_string(), "2025-2026");
    }

    #[test]
    fn academic_year_rejects_gaps_and_garbage() {
        assert!("2025-2027".parse::<AcademicYear>().is_err());
        assert!("2025".parse::<AcademicYear>().is_err());
        assert!("abcd-efgh".parse::<AcademicYear>().is_err());
        assert!("0-1".parse::<AcademicYear>().is_err());
    }

    #[test]
    fn academic_year_rejects_out_of_range_start() {
        assert!(matches!(
            "2147483647-0".parse::<AcademicYear>(),
            Err(CampusError::InvalidInput(_))
        ));
        assert!("2147483647--2147483648".parse::<AcademicYear>().is_err());
        assert!("9999-10000".parse::<AcademicYear>().is_err());
        assert!(AcademicYear::starting(i32::MAX).is_err());
        assert_eq!(
            AcademicYear::starting(9998).unwrap().to_string(),
            "9998-9999"
        );
    }

    #[test]
    fn academic_year_containing_june_boundary() {
        let may = NaiveDate::from_ymd_opt(2025, 5, 31).unwrap();
        let june = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        assert_eq!(AcademicYear::containing(may).to_string(), "2024-2025");
        assert_eq!(AcademicYear::containing(june).to_string(), "2025-2026");
    }

    #[test]
    fn roll_range_open_bounds() {
        let range = RollRange::new(Some(31), None);
        assert!(!range.contains(RollNumber(30)));
        assert!(range.contains(RollNumber(31)));
        assert!(range.contains(RollNumber(9999)));
        assert!(RollRange::unbounded().contains(RollNumber(0)));
    }

    #[test]
    fn roll_range_overlap() {
        let a = RollRange::new(Some(1), Some(30));
        let b = RollRange::new(Some(31), Some(60));
        let c = RollRange::new(Some(15), Some(25));
        let open = RollRange::new(None, Some(1));

        assert!(!a.overlaps(&b));
        assert!(a.overlaps(&c));
        assert!(open.overlaps(&a));
        assert!(!open.overlaps(&b));
    }

    #[test]
    fn inverted_range_detected() {
        assert!(!RollRange::new(Some(10), Some(5)).is_well_formed());
        assert!(RollRange::new(Some(5), None).is_well_formed());
    }

    #[test]
    fn rule_validation() {
        let rule = BatchRule::new("r1", scope(), "B1", Some(40), Some(10));
        assert!(matches!(rule.validate(), Err(CampusError::InvalidInput(_))));

        let blank = BatchRule::new("r2", scope(), " ", Some(1), Some(10));
        assert!(blank.validate().is_err());

        let ok = BatchRule::new("r3", scope(), "B1", Some(1), Some(10));
        assert!(ok.validate().is_ok());
    }

    #[test]
    fn rule_deserializes_from_flat_json() {
        let json = r#"{
            "_id": "r1",
            "college": "KMIT",
            "course": "CSE",
            "section": "A",
            "semester": 3,
            "academic_year": "2025-2026",
            "batch_name": "B1",
            "roll_start": 1,
            "roll_end": 30
        }"#;
        let rule: BatchRule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id.as_str(), "r1");
        assert_eq!(rule.scope, scope());
        assert!(!rule.lateral_entry);
    }

    #[test]
    fn assignment_defaults_to_active() {
        let json = r#"{
            "id": "a1",
            "mentor_id": "EMP01",
            "college": "KMIT",
            "course": "CSE",
            "section": "A",
            "semester": 3,
            "academic_year": "2025-2026",
            "batch_name": "B1"
        }"#;
        let assignment: MentorAssignment = serde_json::from_str(json).unwrap();
        assert!(assignment.active_status);
        assert!(!assignment.is_locked());
    }

    #[test]
    fn out_of_range_semester_rejected_on_deserialize() {
        let json = r#"{
            "id": "a1",
            "mentor_id": "EMP01",
            "college": "KMIT",
            "course": "CSE",
            "section": "A",
            "semester": 12,
            "academic_year": "2025-2026",
            "batch_name": "B1"
        }"#;
        assert!(serde_json::from_str::<MentorAssignment>(json).is_err());
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(CampusError::InvalidInput(String::new()).kind(), "invalid_input");
        let ambiguous = CampusError::AmbiguousRule {
            roll: RollNumber(1),
            rule_ids: vec![],
        };
        assert_eq!(ambiguous.kind(), "ambiguous_rule");
        assert!(ambiguous.is_integrity_fault());
        assert!(!CampusError::Conflict(ConflictReason::SectionCapacity { limit: 2, active: 2 })
            .is_integrity_fault());
    }
}
